//! Data Pipeline Provider
//!
//! CRUD handlers for pipelines and pipeline definitions.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sluice_core::mutex_kv::MutexKv;
use sluice_core::provider::{ProviderError, ProviderResult};
use sluice_core::resource::{Resource, ResourceId, State, Value};
use sluice_core::retry::retry_transient;
use sluice_core::waiter::{PollStatus, wait_until};

use crate::api::{ApiError, CreatePipelineRequest, PipelineApi, PipelineDescription, SdkPipelineApi};
use crate::codec::Encoder;
use crate::config::ProviderConfig;
use crate::definition::{attributes_from_definition, definition_from_attributes};
use crate::resources::{PIPELINE, PIPELINE_DEFINITION, schema_for};

/// Pipeline attributes that can only change by replacing the pipeline
const CREATE_ONLY_ATTRIBUTES: &[&str] = &["name", "unique_id", "description"];

/// AWS Data Pipeline Provider
pub struct DataPipelineProvider {
    api: Arc<dyn PipelineApi>,
    config: ProviderConfig,
    encoder: Encoder,
    /// Serializes definition writes per pipeline id
    locks: MutexKv,
}

impl DataPipelineProvider {
    /// Create a provider backed by the AWS SDK
    pub async fn new(config: ProviderConfig) -> Self {
        let api = SdkPipelineApi::new(config.region.as_deref()).await;
        Self::with_api(Arc::new(api), config)
    }

    /// Create a provider on top of any `PipelineApi`
    pub fn with_api(api: Arc<dyn PipelineApi>, config: ProviderConfig) -> Self {
        Self {
            api,
            encoder: Encoder::new(config.codec),
            config,
            locks: MutexKv::new(),
        }
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    pub async fn read_resource(
        &self,
        resource_type: &str,
        name: &str,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let id = ResourceId::new(resource_type, name);
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id));
        };

        match resource_type {
            PIPELINE => self.read_pipeline(id, identifier).await,
            PIPELINE_DEFINITION => self.read_definition(id, identifier).await,
            _ => Err(unknown_type(&id)),
        }
    }

    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        check_writable(&resource)?;
        validate(&resource)?;

        match resource.id.resource_type.as_str() {
            PIPELINE => self.create_pipeline(&resource).await,
            PIPELINE_DEFINITION => self.put_definition(&resource).await,
            _ => Err(unknown_type(&resource.id)),
        }
    }

    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        check_writable(&to)?;
        validate(&to)?;

        match id.resource_type.as_str() {
            PIPELINE => self.update_pipeline(&id, identifier, from, &to).await,
            PIPELINE_DEFINITION => self.put_definition(&to).await,
            _ => Err(unknown_type(&id)),
        }
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match id.resource_type.as_str() {
            PIPELINE => self.delete_pipeline(id, identifier).await,
            PIPELINE_DEFINITION => {
                // Definitions go away with their pipeline
                log::info!(
                    "Leaving definition of pipeline {} in place for {}",
                    identifier,
                    id.name
                );
                Ok(())
            }
            _ => Err(unknown_type(id)),
        }
    }

    // =========================================================================
    // Pipelines
    // =========================================================================

    async fn read_pipeline(&self, id: ResourceId, pipeline_id: &str) -> ProviderResult<State> {
        let description = self
            .api
            .describe_pipeline(pipeline_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        Ok(match description {
            Some(description) => {
                State::existing(id, pipeline_attributes(&description)).with_identifier(pipeline_id)
            }
            None => State::not_found(id),
        })
    }

    async fn create_pipeline(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let name = resource
            .get_string("name")
            .ok_or_else(|| ProviderError::new("name is required").for_resource(id.clone()))?;
        let request = CreatePipelineRequest {
            name: name.to_string(),
            unique_id: resource.get_string("unique_id").unwrap_or(name).to_string(),
            description: resource.get_string("description").map(str::to_string),
            tags: tags_of(&resource.attributes),
        };

        // The unique id makes retried creates idempotent
        let pipeline_id = retry_transient(&self.config.retry(), "CreatePipeline", || {
            let api = self.api.clone();
            let request = &request;
            async move { api.create_pipeline(request).await.map_err(ProviderError::from) }
        })
        .await
        .map_err(|e| e.for_resource(id.clone()))?;
        log::info!("Created pipeline {} for {}", pipeline_id, id.name);

        let what = format!("pipeline {} to become visible", pipeline_id);
        wait_until(&self.config.create_wait(), &what, || {
            let api = self.api.clone();
            let pipeline_id = pipeline_id.clone();
            async move {
                Ok(match api.describe_pipeline(&pipeline_id).await? {
                    Some(description) => PollStatus::Ready(description),
                    None => PollStatus::Pending,
                })
            }
        })
        .await
        .map(|description| {
            State::existing(id.clone(), pipeline_attributes(&description))
                .with_identifier(pipeline_id.clone())
        })
        .map_err(|e| e.for_resource(id.clone()))
    }

    async fn update_pipeline(
        &self,
        id: &ResourceId,
        pipeline_id: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        for key in CREATE_ONLY_ATTRIBUTES {
            let current = from.attributes.get(*key).and_then(Value::as_str);
            let desired = to.get_string(key);
            // unique_id defaults to the name on create
            let desired = if *key == "unique_id" {
                desired.or(to.get_string("name"))
            } else {
                desired
            };
            if current != desired {
                return Err(ProviderError::new(format!(
                    "Changing '{}' requires replacing the pipeline",
                    key
                ))
                .for_resource(id.clone()));
            }
        }

        let current = tags_of(&from.attributes);
        let desired = tags_of(&to.attributes);
        let (added, removed) = diff_tags(&current, &desired);

        if !added.is_empty() {
            log::debug!("Adding {} tag(s) to pipeline {}", added.len(), pipeline_id);
            self.api
                .add_tags(pipeline_id, &added)
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        }
        if !removed.is_empty() {
            log::debug!("Removing {} tag(s) from pipeline {}", removed.len(), pipeline_id);
            self.api
                .remove_tags(pipeline_id, &removed)
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        }

        self.read_pipeline(id.clone(), pipeline_id).await
    }

    async fn delete_pipeline(&self, id: &ResourceId, pipeline_id: &str) -> ProviderResult<()> {
        match self.api.delete_pipeline(pipeline_id).await {
            Ok(()) => log::info!("Deleting pipeline {} for {}", pipeline_id, id.name),
            Err(ApiError::NotFound(_)) => {
                log::info!("Pipeline {} is already gone", pipeline_id);
                return Ok(());
            }
            Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
        }

        let what = format!("pipeline {} to be deleted", pipeline_id);
        wait_until(&self.config.delete_wait(), &what, || {
            let api = self.api.clone();
            let pipeline_id = pipeline_id.to_string();
            async move {
                Ok(match api.describe_pipeline(&pipeline_id).await? {
                    Some(_) => PollStatus::Pending,
                    None => PollStatus::Ready(()),
                })
            }
        })
        .await
        .map_err(|e| e.for_resource(id.clone()))
    }

    // =========================================================================
    // Pipeline Definitions
    // =========================================================================

    async fn read_definition(&self, id: ResourceId, pipeline_id: &str) -> ProviderResult<State> {
        let definition = self
            .api
            .get_pipeline_definition(pipeline_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let Some(definition) = definition else {
            return Ok(State::not_found(id));
        };

        let mut attributes =
            attributes_from_definition(&definition).map_err(|e| e.for_resource(id.clone()))?;
        attributes.insert("pipeline_id".to_string(), Value::String(pipeline_id.to_string()));
        Ok(State::existing(id, attributes).with_identifier(pipeline_id))
    }

    /// Replace the whole definition of a pipeline in one call
    async fn put_definition(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let pipeline_id = resource
            .get_string("pipeline_id")
            .ok_or_else(|| ProviderError::new("pipeline_id is required").for_resource(id.clone()))?;
        let definition = definition_from_attributes(&self.encoder, &resource.attributes)
            .map_err(|e| e.for_resource(id.clone()))?;

        let guard = self.locks.lock(pipeline_id).await;
        let outcome = retry_transient(&self.config.retry(), "PutPipelineDefinition", || {
            let api = self.api.clone();
            let definition = &definition;
            async move {
                api.put_pipeline_definition(pipeline_id, definition)
                    .await
                    .map_err(ProviderError::from)
            }
        })
        .await
        .map_err(|e| e.for_resource(id.clone()))?;
        drop(guard);

        if outcome.errored {
            return Err(ProviderError::new(format!(
                "Pipeline definition was rejected: {}",
                outcome.validation_errors.join("; ")
            ))
            .for_resource(id.clone()));
        }
        log::info!(
            "Put {} object(s) to pipeline {} for {}",
            definition.objects.len(),
            pipeline_id,
            id.name
        );

        let mut attributes = resource.attributes.clone();
        attributes.insert("pipeline_id".to_string(), Value::String(pipeline_id.to_string()));
        Ok(State::existing(id.clone(), attributes).with_identifier(pipeline_id))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn unknown_type(id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
        .for_resource(id.clone())
}

fn check_writable(resource: &Resource) -> ProviderResult<()> {
    if resource.is_data_source() {
        return Err(ProviderError::new("Data sources cannot be created or updated")
            .for_resource(resource.id.clone()));
    }
    Ok(())
}

fn validate(resource: &Resource) -> ProviderResult<()> {
    let schema = schema_for(&resource.id.resource_type).ok_or_else(|| unknown_type(&resource.id))?;
    schema.validate(&resource.attributes).map_err(|errors| {
        let messages: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
        ProviderError::new(messages.join("; ")).for_resource(resource.id.clone())
    })
}

fn pipeline_attributes(description: &PipelineDescription) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    attributes.insert("name".to_string(), Value::String(description.name.clone()));
    attributes.insert(
        "pipeline_id".to_string(),
        Value::String(description.pipeline_id.clone()),
    );
    if let Some(unique_id) = &description.unique_id {
        attributes.insert("unique_id".to_string(), Value::String(unique_id.clone()));
    }
    if let Some(state) = &description.state {
        attributes.insert("state".to_string(), Value::String(state.clone()));
    }
    if let Some(text) = &description.description {
        attributes.insert("description".to_string(), Value::String(text.clone()));
    }
    if !description.tags.is_empty() {
        let tags = description
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        attributes.insert("tags".to_string(), Value::Map(tags));
    }
    attributes
}

fn tags_of(attributes: &HashMap<String, Value>) -> BTreeMap<String, String> {
    match attributes.get("tags") {
        Some(Value::Map(tags)) => tags
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Tags to add or overwrite, and keys to remove
fn diff_tags(
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, Vec<String>) {
    let added = desired
        .iter()
        .filter(|(k, v)| current.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let removed = current
        .keys()
        .filter(|k| !desired.contains_key(*k))
        .cloned()
        .collect();
    (added, removed)
}
