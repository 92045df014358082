use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps sensitive payment data so it never shows up in Debug or log output.
///
/// Serialization still writes the real value; the store needs it verbatim.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Masked<String> {
    /// Last four characters, for receipts and manifests.
    pub fn last_four(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let start = chars.len().saturating_sub(4);
        chars[start..].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let card = Masked::new("4111111111111111".to_string());
        assert_eq!(format!("{:?}", card), "********");
        assert_eq!(card.to_string(), "********");
        assert_eq!(card.last_four(), "1111");
    }

    #[test]
    fn test_serializes_real_value() {
        let card = Masked::new("4111".to_string());
        assert_eq!(serde_json::to_string(&card).unwrap(), "\"4111\"");
        let back: Masked<String> = serde_json::from_str("\"4242\"").unwrap();
        assert_eq!(back.expose(), "4242");
    }
}
