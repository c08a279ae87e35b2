/// Serde helper functions for custom serialization/deserialization
use crate::core::limits::TIME_NEVER;
use crate::core::types::Timestamp;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a timestamp with the "never" marker as `null`
pub mod never_as_none {
    use super::*;

    pub fn serialize<S>(time: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if *time == TIME_NEVER {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(time)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Timestamp>::deserialize(deserializer)?.unwrap_or(TIME_NEVER))
    }
}

/// Skip serializing if Option is None
pub fn is_none<T>(value: &Option<T>) -> bool {
    value.is_none()
}

/// Skip serializing if value is false
pub fn is_false(value: &bool) -> bool {
    !value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamp {
        #[serde(with = "never_as_none")]
        at: Timestamp,
    }

    #[test]
    fn test_never_serializes_as_null() {
        let json = serde_json::to_string(&Stamp { at: TIME_NEVER }).unwrap();
        assert_eq!(json, r#"{"at":null}"#);
        let back: Stamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, TIME_NEVER);
    }

    #[test]
    fn test_real_time_kept() {
        let json = serde_json::to_string(&Stamp { at: 1234 }).unwrap();
        assert_eq!(json, r#"{"at":1234}"#);
    }

    #[test]
    fn test_skip_helpers() {
        assert!(is_false(&false));
        assert!(is_none::<u8>(&None));
    }
}
