//! `PipelineApi` backed by the AWS SDK

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_datapipeline::Client as DataPipelineClient;
use aws_sdk_datapipeline::config::http::HttpResponse;
use aws_sdk_datapipeline::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_datapipeline::types::{
    Field, ParameterValue as SdkParameterValue, PipelineDescription as SdkPipelineDescription,
    PipelineObject, Tag,
};

use super::{
    ApiError, ApiResult, CreatePipelineRequest, ParameterValue, PipelineApi, PipelineDefinition,
    PipelineDescription, PutDefinitionOutcome, classify_service_error,
};
use crate::codec::{WireField, WireObject, WireSlot};

/// Data Pipeline client
pub struct SdkPipelineApi {
    client: DataPipelineClient,
}

impl SdkPipelineApi {
    /// Load credentials and configuration from the environment
    ///
    /// `region` overrides the region from the environment when set.
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self {
            client: DataPipelineClient::new(&config),
        }
    }
}

#[async_trait]
impl PipelineApi for SdkPipelineApi {
    async fn create_pipeline(&self, request: &CreatePipelineRequest) -> ApiResult<String> {
        let output = self
            .client
            .create_pipeline()
            .name(&request.name)
            .unique_id(&request.unique_id)
            .set_description(request.description.clone())
            .set_tags(Some(build_tags(&request.tags)?))
            .send()
            .await
            .map_err(|e| classify("CreatePipeline", e))?;

        Ok(output.pipeline_id().to_string())
    }

    async fn describe_pipeline(
        &self,
        pipeline_id: &str,
    ) -> ApiResult<Option<PipelineDescription>> {
        match self
            .client
            .describe_pipelines()
            .pipeline_ids(pipeline_id)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .pipeline_description_list()
                .first()
                .map(description_from_sdk)),
            Err(e) => match classify("DescribePipelines", e) {
                ApiError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> ApiResult<()> {
        self.client
            .delete_pipeline()
            .pipeline_id(pipeline_id)
            .send()
            .await
            .map_err(|e| classify("DeletePipeline", e))?;
        Ok(())
    }

    async fn add_tags(&self, pipeline_id: &str, tags: &BTreeMap<String, String>) -> ApiResult<()> {
        self.client
            .add_tags()
            .pipeline_id(pipeline_id)
            .set_tags(Some(build_tags(tags)?))
            .send()
            .await
            .map_err(|e| classify("AddTags", e))?;
        Ok(())
    }

    async fn remove_tags(&self, pipeline_id: &str, keys: &[String]) -> ApiResult<()> {
        self.client
            .remove_tags()
            .pipeline_id(pipeline_id)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .map_err(|e| classify("RemoveTags", e))?;
        Ok(())
    }

    async fn put_pipeline_definition(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
    ) -> ApiResult<PutDefinitionOutcome> {
        let objects = definition
            .objects
            .iter()
            .map(object_to_sdk)
            .collect::<ApiResult<Vec<_>>>()?;
        let parameter_values = definition
            .parameter_values
            .iter()
            .map(|p| {
                SdkParameterValue::builder()
                    .id(&p.id)
                    .string_value(&p.string_value)
                    .build()
                    .map_err(|e| ApiError::InvalidRequest(e.to_string()))
            })
            .collect::<ApiResult<Vec<_>>>()?;

        let output = self
            .client
            .put_pipeline_definition()
            .pipeline_id(pipeline_id)
            .set_pipeline_objects(Some(objects))
            .set_parameter_values(Some(parameter_values))
            .send()
            .await
            .map_err(|e| classify("PutPipelineDefinition", e))?;

        for warning in output.validation_warnings() {
            for message in warning.warnings() {
                log::warn!(
                    "Pipeline {} object {}: {}",
                    pipeline_id,
                    warning.id().unwrap_or("?"),
                    message
                );
            }
        }

        let validation_errors = output
            .validation_errors()
            .iter()
            .flat_map(|e| {
                let id = e.id().unwrap_or("?").to_string();
                e.errors().iter().map(move |m| format!("{}: {}", id, m))
            })
            .collect();

        Ok(PutDefinitionOutcome {
            errored: output.errored(),
            validation_errors,
        })
    }

    async fn get_pipeline_definition(
        &self,
        pipeline_id: &str,
    ) -> ApiResult<Option<PipelineDefinition>> {
        let output = match self
            .client
            .get_pipeline_definition()
            .pipeline_id(pipeline_id)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return match classify("GetPipelineDefinition", e) {
                    ApiError::NotFound(_) => Ok(None),
                    other => Err(other),
                };
            }
        };

        Ok(Some(PipelineDefinition {
            objects: output.pipeline_objects().iter().map(object_from_sdk).collect(),
            parameter_values: output
                .parameter_values()
                .iter()
                .map(|p| ParameterValue {
                    id: p.id().to_string(),
                    string_value: p.string_value().to_string(),
                })
                .collect(),
        }))
    }
}

// =============================================================================
// Conversion Helpers
// =============================================================================

fn classify<E>(operation: &str, err: SdkError<E, HttpResponse>) -> ApiError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service_err) => classify_service_error(
            operation,
            service_err.raw().status().as_u16(),
            service_err.err().code(),
            service_err.err().message(),
        ),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ApiError::Transient(format!("{} failed: {:?}", operation, err))
        }
        _ => ApiError::InvalidRequest(format!("{} failed: {:?}", operation, err)),
    }
}

fn build_tags(tags: &BTreeMap<String, String>) -> ApiResult<Vec<Tag>> {
    tags.iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| ApiError::InvalidRequest(e.to_string()))
        })
        .collect()
}

fn object_to_sdk(object: &WireObject) -> ApiResult<PipelineObject> {
    let fields = object
        .fields
        .iter()
        .map(|field| {
            let builder = Field::builder().key(&field.key);
            let builder = match &field.slot {
                WireSlot::String(value) => builder.string_value(value),
                WireSlot::Ref(value) => builder.ref_value(value),
            };
            builder
                .build()
                .map_err(|e| ApiError::InvalidRequest(e.to_string()))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    PipelineObject::builder()
        .id(&object.id)
        .name(&object.name)
        .set_fields(Some(fields))
        .build()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn field_from_sdk(field: &Field) -> WireField {
    match (field.ref_value(), field.string_value()) {
        (Some(reference), _) => WireField::reference(field.key(), reference),
        (None, value) => WireField::string(field.key(), value.unwrap_or_default()),
    }
}

fn object_from_sdk(object: &PipelineObject) -> WireObject {
    WireObject {
        id: object.id().to_string(),
        name: object.name().to_string(),
        fields: object.fields().iter().map(field_from_sdk).collect(),
    }
}

fn description_from_sdk(desc: &SdkPipelineDescription) -> PipelineDescription {
    let field = |key: &str| {
        desc.fields()
            .iter()
            .find(|f| f.key() == key)
            .and_then(|f| f.string_value())
            .map(str::to_string)
    };

    PipelineDescription {
        pipeline_id: desc.pipeline_id().to_string(),
        name: desc.name().to_string(),
        description: desc.description().map(str::to_string),
        unique_id: field("uniqueId"),
        state: field("@pipelineState"),
        tags: desc
            .tags()
            .iter()
            .map(|t| (t.key().to_string(), t.value().to_string()))
            .collect(),
    }
}
