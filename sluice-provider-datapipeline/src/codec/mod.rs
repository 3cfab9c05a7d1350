//! Attribute-bag ⇄ pipeline-object codec
//!
//! Translates between the provider's snake_case attribute blocks and the
//! remote API's pipeline objects: an `id`, a `name`, and an ordered list of
//! `key` / `stringValue | refValue` fields led by a `type` field.
//!
//! - `value` - Typed attribute bag
//! - `wire` - Pipeline object wire format and its structural validation
//! - `kind` - The closed set of object kinds
//! - `field_table` - Per-kind attribute ⇄ wire key tables
//! - `encoder` / `decoder` - The two directions

pub mod decoder;
pub mod encoder;
pub mod field_table;
pub mod kind;
pub mod value;
pub mod wire;

pub use decoder::{decode, decode_object, decode_typed};
pub use encoder::{Encoder, encode};
pub use field_table::{FieldSpec, SlotKind, ValueType};
pub use kind::ObjectKind;
pub use value::{AttrValue, AttributeBag};
pub use wire::{WireField, WireObject, WireSlot};

use serde::Deserialize;
use sluice_core::provider::ProviderError;

/// Errors raised while encoding or decoding pipeline objects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The assembled object violates the remote API's structural constraints
    #[error("Invalid pipeline object '{object_id}': {message}")]
    Validation { object_id: String, message: String },

    /// A wire field cannot be coerced to its declared attribute type
    #[error("Malformed field '{key}': '{value}' is not a valid {expected}")]
    MalformedField {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// An attribute holds a value of the wrong type
    #[error("Attribute '{key}': expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    /// An attribute is not part of the object kind's field table
    #[error("Unknown attribute '{key}' for {kind} objects")]
    UnknownAttribute { kind: ObjectKind, key: String },

    #[error("Unknown pipeline object type '{0}'")]
    UnknownObjectKind(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

impl From<CodecError> for ProviderError {
    fn from(err: CodecError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}

/// Exclusive bounds a float attribute must fall within to be emitted
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FloatBounds {
    pub min_exclusive: f64,
    pub max_exclusive: f64,
}

impl Default for FloatBounds {
    fn default() -> Self {
        // Sanity ceiling for spot bid prices (USD per hour)
        Self {
            min_exclusive: 0.0,
            max_exclusive: 20.0,
        }
    }
}

impl FloatBounds {
    pub fn contains(&self, value: f64) -> bool {
        value > self.min_exclusive && value < self.max_exclusive
    }
}

/// Encoding policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub spot_bid_price: FloatBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spot_bid_bounds() {
        let bounds = FloatBounds::default();
        assert!(bounds.contains(0.5));
        assert!(bounds.contains(19.99));
        assert!(!bounds.contains(0.0));
        assert!(!bounds.contains(20.0));
        assert!(!bounds.contains(-1.0));
    }

    #[test]
    fn codec_config_deserializes_partial_bounds() {
        let config: CodecConfig =
            serde_json::from_str(r#"{"spot_bid_price": {"max_exclusive": 50.0}}"#).unwrap();
        assert_eq!(config.spot_bid_price.min_exclusive, 0.0);
        assert_eq!(config.spot_bid_price.max_exclusive, 50.0);
    }

    #[test]
    fn errors_name_the_attribute() {
        let err = CodecError::MalformedField {
            key: "maximumRetries".to_string(),
            value: "not-a-number".to_string(),
            expected: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Malformed field 'maximumRetries': 'not-a-number' is not a valid integer"
        );

        let err = CodecError::UnknownAttribute {
            kind: ObjectKind::Schedule,
            key: "colour".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown attribute 'colour' for Schedule objects");
    }
}
