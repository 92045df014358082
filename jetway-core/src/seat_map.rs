use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SEATS_PER_ROW: u32 = 6;
const COLUMNS: [char; SEATS_PER_ROW as usize] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// A seat such as `12C`. Ordering is row-major, matching the seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatLabel {
    row: u32,
    column: u8,
}

impl SeatLabel {
    /// Label for the zero-based position in the seat map.
    pub fn from_position(position: u32) -> Self {
        Self {
            row: position / SEATS_PER_ROW + 1,
            column: (position % SEATS_PER_ROW) as u8,
        }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> char {
        COLUMNS[self.column as usize]
    }

    /// Zero-based position in the seat map.
    pub fn position(&self) -> u64 {
        (self.row as u64 - 1) * SEATS_PER_ROW as u64 + self.column as u64
    }

    /// Whether an airplane with `capacity` seats has this seat.
    pub fn fits(&self, capacity: u32) -> bool {
        self.position() < capacity as u64
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid seat label '{0}': expected a row number followed by a column A-F")]
pub struct InvalidSeatLabel(pub String);

impl FromStr for SeatLabel {
    type Err = InvalidSeatLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || InvalidSeatLabel(s.to_string());

        let column_char = trimmed.chars().last().ok_or_else(invalid)?.to_ascii_uppercase();
        let column = COLUMNS
            .iter()
            .position(|c| *c == column_char)
            .ok_or_else(invalid)? as u8;

        let digits = &trimmed[..trimmed.len() - 1];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Self { row, column })
    }
}

impl TryFrom<String> for SeatLabel {
    type Error = InvalidSeatLabel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatLabel> for String {
    fn from(label: SeatLabel) -> Self {
        label.to_string()
    }
}

/// The canonical seat sequence for an airplane: `capacity` labels, six per
/// row, row-major. A partial last row stops at the needed column.
pub fn seat_map(capacity: u32) -> Vec<SeatLabel> {
    (0..capacity).map(SeatLabel::from_position).collect()
}
