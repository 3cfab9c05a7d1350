//! Remote API seam
//!
//! `PipelineApi` is the set of Data Pipeline calls the CRUD handlers need.
//! `SdkPipelineApi` implements it with the AWS SDK; tests use an in-memory
//! implementation.

mod sdk;

#[cfg(test)]
pub(crate) mod memory;

pub use sdk::SdkPipelineApi;

use std::collections::BTreeMap;

use async_trait::async_trait;
use sluice_core::provider::ProviderError;
use thiserror::Error;

use crate::codec::WireObject;

/// Errors returned by the remote API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The pipeline does not exist or has been deleted
    #[error("Pipeline not found: {0}")]
    NotFound(String),

    /// Network failure, throttling or a server-side error; safe to retry
    #[error("Transient error: {0}")]
    Transient(String),

    /// The service rejected the request
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The request could not be assembled
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        let transient = err.is_transient();
        let error = ProviderError::new(err.to_string()).with_cause(err);
        if transient { error.transient() } else { error }
    }
}

const NOT_FOUND_CODES: &[&str] = &["PipelineNotFoundException", "PipelineDeletedException"];
const TRANSIENT_CODES: &[&str] = &[
    "InternalServiceError",
    "ThrottlingException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
];

/// Classify a service error response
///
/// 5xx, 429 and throttling codes are transient; the remaining 4xx errors are
/// semantic and never retried.
pub fn classify_service_error(
    operation: &str,
    status: u16,
    code: Option<&str>,
    message: Option<&str>,
) -> ApiError {
    let code = code.unwrap_or("Unknown");
    let message = message.unwrap_or_default();

    if NOT_FOUND_CODES.contains(&code) {
        ApiError::NotFound(message.to_string())
    } else if status >= 500 || status == 429 || TRANSIENT_CODES.contains(&code) {
        ApiError::Transient(format!("{} failed with {} ({}): {}", operation, code, status, message))
    } else {
        ApiError::Service {
            code: code.to_string(),
            message: format!("{} failed: {}", operation, message),
        }
    }
}

/// Request for `create_pipeline`
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePipelineRequest {
    pub name: String,
    /// Idempotency token; retried creates with the same token return the same pipeline
    pub unique_id: String,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// A pipeline as returned by `describe_pipeline`
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDescription {
    pub pipeline_id: String,
    pub name: String,
    pub description: Option<String>,
    pub unique_id: Option<String>,
    /// Value of the `@pipelineState` field (e.g., PENDING, SCHEDULED)
    pub state: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// A parameter value of a pipeline definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    pub id: String,
    pub string_value: String,
}

/// A complete pipeline definition, replaced wholesale on every put
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineDefinition {
    pub objects: Vec<WireObject>,
    pub parameter_values: Vec<ParameterValue>,
}

/// Result of `put_pipeline_definition`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PutDefinitionOutcome {
    /// The service rejected the definition
    pub errored: bool,
    /// `<object id>: <message>` for each validation error
    pub validation_errors: Vec<String>,
}

/// Data Pipeline operations used by the provider
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Create a pipeline and return its id
    async fn create_pipeline(&self, request: &CreatePipelineRequest) -> ApiResult<String>;

    /// Describe a pipeline; `None` if it does not exist
    async fn describe_pipeline(&self, pipeline_id: &str)
    -> ApiResult<Option<PipelineDescription>>;

    async fn delete_pipeline(&self, pipeline_id: &str) -> ApiResult<()>;

    async fn add_tags(&self, pipeline_id: &str, tags: &BTreeMap<String, String>) -> ApiResult<()>;

    async fn remove_tags(&self, pipeline_id: &str, keys: &[String]) -> ApiResult<()>;

    /// Replace the pipeline's definition in one call
    async fn put_pipeline_definition(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
    ) -> ApiResult<PutDefinitionOutcome>;

    /// Get the pipeline's definition; `None` if the pipeline does not exist
    async fn get_pipeline_definition(
        &self,
        pipeline_id: &str,
    ) -> ApiResult<Option<PipelineDefinition>>;
}
