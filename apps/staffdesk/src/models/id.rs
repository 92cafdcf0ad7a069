use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Opaque record identifier.
///
/// Collections written by older builds and remote backends disagree on whether
/// ids are numbers or strings. Both are accepted on the way in and always
/// written back out as strings, so callers only ever compare tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// A fresh id that does not depend on what is already in the collection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Empty, blank and zero ids mean "not yet stored".
    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty() && self.0 != "0"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of a raw JSON value, accepting strings and numbers.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::new(s.as_str())),
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct RecordIdVisitor;

impl<'de> Visitor<'de> for RecordIdVisitor {
    type Value = RecordId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
        Ok(RecordId::new(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
        Ok(RecordId(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
        Ok(RecordId(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RecordId, E> {
        Ok(RecordId(serde_json::Number::from_f64(v).map(|n| n.to_string()).unwrap_or_default()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RecordId, E> {
        Ok(RecordId::default())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RecordIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids_compare_equal() {
        let from_number: RecordId = serde_json::from_str("42").unwrap();
        let from_string: RecordId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"42\"");
    }

    #[test]
    fn test_unassigned_ids() {
        assert!(!RecordId::default().is_assigned());
        assert!(!RecordId::new("  ").is_assigned());
        assert!(!RecordId::from(0).is_assigned());
        assert!(RecordId::from(7).is_assigned());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert!(a.is_assigned());
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_json_skips_blank_and_null() {
        assert_eq!(RecordId::from_json(&serde_json::json!(null)), None);
        assert_eq!(RecordId::from_json(&serde_json::json!("")), None);
        assert_eq!(
            RecordId::from_json(&serde_json::json!(" 9 ")),
            Some(RecordId::from(9))
        );
    }
}
