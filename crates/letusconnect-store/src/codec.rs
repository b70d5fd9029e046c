//! Conversion between typed records and stored JSON documents.
//!
//! Generic JSON never leaves this crate: repositories hand typed records to
//! callers and use these helpers at the store boundary.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use letusconnect_core::error::{AppError, ErrorKind};
use letusconnect_core::result::AppResult;

/// Serialize a record into a document body.
pub fn encode<T: Serialize>(record: &T) -> AppResult<Value> {
    serde_json::to_value(record).map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, "Failed to encode document", e)
    })
}

/// Deserialize a document body into a record.
pub fn decode<T: DeserializeOwned>(collection: &str, id: &str, data: &Value) -> AppResult<T> {
    T::deserialize(data).map_err(|e| {
        AppError::with_source(
            ErrorKind::Serialization,
            format!("Malformed document {collection}/{id}"),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_malformed_document_names_location() {
        let err = decode::<Sample>("things", "t1", &json!({"name": 5})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(err.message.contains("things/t1"));
    }

    #[test]
    fn test_encode_then_decode() {
        let value = encode(&Sample { name: "a".into() }).unwrap();
        let back: Sample = decode("things", "t1", &value).unwrap();
        assert_eq!(back.name, "a");
    }
}
