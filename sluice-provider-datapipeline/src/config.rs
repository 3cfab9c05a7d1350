//! Provider configuration

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use sluice_core::provider::{ProviderError, ProviderResult};
use sluice_core::resource::Value;
use sluice_core::retry::RetryConfig;
use sluice_core::waiter::WaitConfig;

use crate::codec::{CodecConfig, FloatBounds};

/// Provider options, read from the provider block
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// AWS region; the SDK's environment chain is used when unset
    pub region: Option<String>,

    /// Wall-clock limit for create operations (default: 600)
    pub create_timeout_secs: u64,

    /// Wall-clock limit for waiting on pipeline deletion (default: 600)
    pub delete_timeout_secs: u64,

    /// Interval between status polls (default: 5)
    pub poll_interval_secs: u64,

    /// How long transient API errors are retried (default: 120)
    pub retry_timeout_secs: u64,

    pub codec: CodecConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: None,
            create_timeout_secs: 600,
            delete_timeout_secs: 600,
            poll_interval_secs: 5,
            retry_timeout_secs: 120,
            codec: CodecConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Build from provider block attributes; unset attributes keep their defaults
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let defaults = Self::default();
        let bounds = defaults.codec.spot_bid_price;

        Ok(Self {
            region: get_string(attributes, "region")?
                .map(normalize_region)
                .or(defaults.region),
            create_timeout_secs: get_secs(attributes, "create_timeout_secs")?
                .unwrap_or(defaults.create_timeout_secs),
            delete_timeout_secs: get_secs(attributes, "delete_timeout_secs")?
                .unwrap_or(defaults.delete_timeout_secs),
            poll_interval_secs: get_secs(attributes, "poll_interval_secs")?
                .unwrap_or(defaults.poll_interval_secs),
            retry_timeout_secs: get_secs(attributes, "retry_timeout_secs")?
                .unwrap_or(defaults.retry_timeout_secs),
            codec: CodecConfig {
                spot_bid_price: FloatBounds {
                    min_exclusive: get_float(attributes, "spot_bid_price_min")?
                        .unwrap_or(bounds.min_exclusive),
                    max_exclusive: get_float(attributes, "spot_bid_price_max")?
                        .unwrap_or(bounds.max_exclusive),
                },
            },
        })
    }

    /// Build from a JSON document
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProviderError::new(format!("Invalid provider configuration: {}", e)))
    }

    pub fn create_wait(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_secs(self.create_timeout_secs),
            Duration::from_secs(self.poll_interval_secs),
        )
    }

    pub fn delete_wait(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_secs(self.delete_timeout_secs),
            Duration::from_secs(self.poll_interval_secs),
        )
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            timeout: Duration::from_secs(self.retry_timeout_secs),
            ..RetryConfig::default()
        }
    }
}

/// Normalize region value (e.g., "aws.Region.us_east_1" -> "us-east-1")
pub fn normalize_region(s: &str) -> String {
    let region_part = if s.contains('.') {
        s.split('.').next_back().unwrap_or(s)
    } else {
        s
    };
    region_part.replace('_', "-")
}

fn get_string<'a>(attributes: &'a HashMap<String, Value>, key: &str) -> ProviderResult<Option<&'a str>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(invalid(key, "a string", other)),
    }
}

fn get_secs(attributes: &HashMap<String, Value>, key: &str) -> ProviderResult<Option<u64>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::Int(n)) if *n > 0 => Ok(Some(*n as u64)),
        Some(other) => Err(invalid(key, "a positive integer", other)),
    }
}

fn get_float(attributes: &HashMap<String, Value>, key: &str) -> ProviderResult<Option<f64>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::Float(f)) => Ok(Some(*f)),
        Some(Value::Int(n)) => Ok(Some(*n as f64)),
        Some(other) => Err(invalid(key, "a number", other)),
    }
}

fn invalid(key: &str, expected: &str, got: &Value) -> ProviderError {
    ProviderError::new(format!(
        "Provider attribute '{}' must be {}, got {}",
        key,
        expected,
        got.type_name()
    ))
}
