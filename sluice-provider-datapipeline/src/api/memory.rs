//! In-memory `PipelineApi` for tests

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ApiError, ApiResult, CreatePipelineRequest, PipelineApi, PipelineDefinition,
    PipelineDescription, PutDefinitionOutcome,
};

#[derive(Debug, Clone)]
struct StoredPipeline {
    description: PipelineDescription,
    definition: Option<PipelineDefinition>,
    /// Describe calls that still report the pipeline after deletion
    lingering_describes: u32,
    deleted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    pipelines: HashMap<String, StoredPipeline>,
    next_id: u32,
    /// Errors returned by the next `put_pipeline_definition` calls, in order
    put_failures: VecDeque<ApiError>,
    put_calls: u32,
    /// Validation errors reported by every put when non-empty
    reject_with: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryPipelineApi {
    inner: Mutex<Inner>,
    /// Describe calls that keep reporting a deleted pipeline
    pub delete_lag: u32,
}

impl MemoryPipelineApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_lag(mut self, polls: u32) -> Self {
        self.delete_lag = polls;
        self
    }

    pub fn fail_next_put(&self, err: ApiError) {
        self.inner.lock().unwrap().put_failures.push_back(err);
    }

    pub fn reject_definitions(&self, errors: Vec<String>) {
        self.inner.lock().unwrap().reject_with = errors;
    }

    pub fn put_calls(&self) -> u32 {
        self.inner.lock().unwrap().put_calls
    }

    pub fn definition(&self, pipeline_id: &str) -> Option<PipelineDefinition> {
        self.inner
            .lock()
            .unwrap()
            .pipelines
            .get(pipeline_id)
            .and_then(|p| p.definition.clone())
    }

    pub fn insert_definition(&self, pipeline_id: &str, definition: PipelineDefinition) {
        if let Some(p) = self.inner.lock().unwrap().pipelines.get_mut(pipeline_id) {
            p.definition = Some(definition);
        }
    }

    pub fn tags(&self, pipeline_id: &str) -> BTreeMap<String, String> {
        self.inner
            .lock()
            .unwrap()
            .pipelines
            .get(pipeline_id)
            .map(|p| p.description.tags.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PipelineApi for MemoryPipelineApi {
    async fn create_pipeline(&self, request: &CreatePipelineRequest) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();

        // Same unique id returns the existing pipeline
        if let Some((id, _)) = inner.pipelines.iter().find(|(_, p)| {
            !p.deleted && p.description.unique_id.as_deref() == Some(request.unique_id.as_str())
        }) {
            return Ok(id.clone());
        }

        inner.next_id += 1;
        let pipeline_id = format!("df-{:013}", inner.next_id);
        inner.pipelines.insert(
            pipeline_id.clone(),
            StoredPipeline {
                description: PipelineDescription {
                    pipeline_id: pipeline_id.clone(),
                    name: request.name.clone(),
                    description: request.description.clone(),
                    unique_id: Some(request.unique_id.clone()),
                    state: Some("PENDING".to_string()),
                    tags: request.tags.clone(),
                },
                definition: None,
                lingering_describes: 0,
                deleted: false,
            },
        );
        Ok(pipeline_id)
    }

    async fn describe_pipeline(
        &self,
        pipeline_id: &str,
    ) -> ApiResult<Option<PipelineDescription>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(pipeline) = inner.pipelines.get_mut(pipeline_id) else {
            return Ok(None);
        };
        if pipeline.deleted {
            if pipeline.lingering_describes == 0 {
                return Ok(None);
            }
            pipeline.lingering_describes -= 1;
        }
        Ok(Some(pipeline.description.clone()))
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.pipelines.get_mut(pipeline_id) {
            Some(p) if !p.deleted => {
                p.deleted = true;
                p.lingering_describes = self.delete_lag;
                Ok(())
            }
            _ => Err(ApiError::NotFound(pipeline_id.to_string())),
        }
    }

    async fn add_tags(&self, pipeline_id: &str, tags: &BTreeMap<String, String>) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let pipeline = inner
            .pipelines
            .get_mut(pipeline_id)
            .ok_or_else(|| ApiError::NotFound(pipeline_id.to_string()))?;
        pipeline.description.tags.extend(tags.clone());
        Ok(())
    }

    async fn remove_tags(&self, pipeline_id: &str, keys: &[String]) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let pipeline = inner
            .pipelines
            .get_mut(pipeline_id)
            .ok_or_else(|| ApiError::NotFound(pipeline_id.to_string()))?;
        for key in keys {
            pipeline.description.tags.remove(key);
        }
        Ok(())
    }

    async fn put_pipeline_definition(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
    ) -> ApiResult<PutDefinitionOutcome> {
        let mut inner = self.inner.lock().unwrap();
        inner.put_calls += 1;
        if let Some(err) = inner.put_failures.pop_front() {
            return Err(err);
        }
        if !inner.reject_with.is_empty() {
            return Ok(PutDefinitionOutcome {
                errored: true,
                validation_errors: inner.reject_with.clone(),
            });
        }

        let pipeline = inner
            .pipelines
            .get_mut(pipeline_id)
            .filter(|p| !p.deleted)
            .ok_or_else(|| ApiError::NotFound(pipeline_id.to_string()))?;
        pipeline.definition = Some(definition.clone());
        Ok(PutDefinitionOutcome::default())
    }

    async fn get_pipeline_definition(
        &self,
        pipeline_id: &str,
    ) -> ApiResult<Option<PipelineDefinition>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .pipelines
            .get(pipeline_id)
            .filter(|p| !p.deleted)
            .map(|p| p.definition.clone().unwrap_or_default()))
    }
}
