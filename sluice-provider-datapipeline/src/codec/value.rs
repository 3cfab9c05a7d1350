//! Typed attribute bag

use std::collections::BTreeMap;

use sluice_core::resource::Value;

use super::{CodecError, CodecResult};

/// One attribute value of a pipeline object block
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    StringList(Vec<String>),
}

/// Attribute name -> value for one pipeline object
pub type AttributeBag = BTreeMap<String, AttrValue>;

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::String(_) => "String",
            AttrValue::Bool(_) => "Bool",
            AttrValue::Int(_) => "Int",
            AttrValue::Float(_) => "Float",
            AttrValue::StringList(_) => "StringList",
        }
    }

    /// Convert a configuration value; lists must hold only strings
    pub fn try_from_value(key: &str, value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(s) => Ok(AttrValue::String(s.clone())),
            Value::Bool(b) => Ok(AttrValue::Bool(*b)),
            Value::Int(i) => Ok(AttrValue::Int(*i)),
            Value::Float(f) => Ok(AttrValue::Float(*f)),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(CodecError::TypeMismatch {
                        key: key.to_string(),
                        expected: "List<String>",
                        got: other.type_name(),
                    }),
                })
                .collect::<CodecResult<Vec<_>>>()
                .map(AttrValue::StringList),
            Value::Map(_) => Err(CodecError::TypeMismatch {
                key: key.to_string(),
                expected: "scalar or List<String>",
                got: "Map",
            }),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            AttrValue::String(s) => Value::String(s),
            AttrValue::Bool(b) => Value::Bool(b),
            AttrValue::Int(i) => Value::Int(i),
            AttrValue::Float(f) => Value::Float(f),
            AttrValue::StringList(items) => {
                Value::List(items.into_iter().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}
