use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pii::Masked;
use crate::seat_map::SeatLabel;
use crate::{require_non_empty, CoreError, CoreResult};

/// Identity of one flight leg: (airline, flight number, departure).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LegKey {
    pub airline_name: String,
    pub flight_number: String,
    pub departure_at: DateTime<Utc>,
}

impl LegKey {
    pub fn new(airline_name: impl Into<String>, flight_number: impl Into<String>, departure_at: DateTime<Utc>) -> Self {
        Self {
            airline_name: airline_name.into(),
            flight_number: flight_number.into(),
            departure_at,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("airline_name", &self.airline_name)?;
        require_non_empty("flight_number", &self.flight_number)
    }
}

impl fmt::Display for LegKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {}", self.airline_name, self.flight_number, self.departure_at.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightStatus {
    #[serde(rename = "On-Time")]
    OnTime,
    Delayed,
    Canceled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::OnTime => "On-Time",
            FlightStatus::Delayed => "Delayed",
            FlightStatus::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On-Time" => Ok(FlightStatus::OnTime),
            "Delayed" => Ok(FlightStatus::Delayed),
            "Canceled" => Ok(FlightStatus::Canceled),
            other => Err(CoreError::ValidationError(format!("Unknown flight status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    #[serde(flatten)]
    pub key: LegKey,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub arrival_at: DateTime<Utc>,
    /// Minor currency units.
    pub base_price: i64,
    pub airplane_id: String,
    pub status: FlightStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airplane {
    pub airline_name: String,
    pub airplane_id: String,
    pub capacity: i32,
    pub manufacturer: String,
    pub age: i32,
}

impl Airplane {
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("airline_name", &self.airline_name)?;
        require_non_empty("airplane_id", &self.airplane_id)?;
        require_non_empty("manufacturer", &self.manufacturer)?;
        validate_capacity(self.capacity)?;
        if self.age < 0 {
            return Err(CoreError::ValidationError("age must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Largest seat count an airplane may be registered with.
pub const MAX_CAPACITY: i32 = 1_000;

/// Capacity as stored is a signed column; only 1..=MAX_CAPACITY make a seat map.
pub fn validate_capacity(capacity: i32) -> CoreResult<u32> {
    if !(1..=MAX_CAPACITY).contains(&capacity) {
        return Err(CoreError::ValidationError(format!(
            "capacity must be between 1 and {}, got {}",
            MAX_CAPACITY, capacity
        )));
    }
    u32::try_from(capacity).map_err(|_| CoreError::ValidationError(format!("invalid capacity {}", capacity)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub card_type: String,
    pub card_number: Masked<String>,
    pub card_expiration: NaiveDate,
    pub name_on_card: String,
}

impl PaymentInfo {
    /// Presence checks only; charging the card happens elsewhere.
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("card_type", &self.card_type)?;
        require_non_empty("card_number", self.card_number.expose())?;
        require_non_empty("name_on_card", &self.name_on_card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub customer_id: String,
    pub leg: LegKey,
    pub seat: SeatLabel,
    pub payment: PaymentInfo,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub customer_id: String,
    pub leg: LegKey,
    pub score: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
