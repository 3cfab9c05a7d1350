//! Pipeline object wire format
//!
//! Mirrors the `PipelineObject` / `Field` records accepted and returned by
//! the remote API's definition endpoints.

use super::{CodecError, CodecResult};

const MAX_ID_LEN: usize = 1024;
const MAX_NAME_LEN: usize = 1024;
const MAX_KEY_LEN: usize = 256;
const MAX_REF_VALUE_LEN: usize = 256;
const MAX_STRING_VALUE_LEN: usize = 10240;

/// The populated value slot of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireSlot {
    /// Literal value (`stringValue`)
    String(String),
    /// Identifier of another pipeline object (`refValue`)
    Ref(String),
}

/// One `key` / value entry of a pipeline object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField {
    pub key: String,
    pub slot: WireSlot,
}

impl WireField {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slot: WireSlot::String(value.into()),
        }
    }

    pub fn reference(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slot: WireSlot::Ref(value.into()),
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.slot {
            WireSlot::String(s) => Some(s),
            WireSlot::Ref(_) => None,
        }
    }

    pub fn ref_value(&self) -> Option<&str> {
        match &self.slot {
            WireSlot::Ref(s) => Some(s),
            WireSlot::String(_) => None,
        }
    }

    /// The populated value, whichever slot holds it
    pub fn value(&self) -> &str {
        match &self.slot {
            WireSlot::String(s) | WireSlot::Ref(s) => s,
        }
    }
}

/// A pipeline object: identity plus an ordered field list led by `type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireObject {
    pub id: String,
    pub name: String,
    pub fields: Vec<WireField>,
}

impl WireObject {
    /// Check the structural constraints the remote API enforces
    pub fn validate(&self) -> CodecResult<()> {
        let fail = |message: String| CodecError::Validation {
            object_id: self.id.clone(),
            message,
        };

        check_len("id", &self.id, 1, MAX_ID_LEN).map_err(fail)?;
        check_len("name", &self.name, 1, MAX_NAME_LEN).map_err(fail)?;

        if self.fields.is_empty() {
            return Err(fail("at least one field is required".to_string()));
        }

        for field in &self.fields {
            check_len("field key", &field.key, 1, MAX_KEY_LEN).map_err(fail)?;
            match &field.slot {
                WireSlot::String(value) => {
                    check_len(&field.key, value, 0, MAX_STRING_VALUE_LEN).map_err(fail)?
                }
                WireSlot::Ref(value) => {
                    check_len(&field.key, value, 1, MAX_REF_VALUE_LEN).map_err(fail)?
                }
            }
        }

        Ok(())
    }

    /// Value of the leading `type` field, if present
    pub fn type_name(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == "type")
            .map(WireField::value)
    }
}

fn check_len(what: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        if min == 1 {
            Err(format!("{} must not be empty", what))
        } else {
            Err(format!("{} must be at least {} characters", what, min))
        }
    } else if len > max {
        Err(format!("{} must be at most {} characters, got {}", what, max, len))
    } else {
        Ok(())
    }
}
