//! Sluice AWS Data Pipeline Provider
//!
//! Manages Data Pipeline pipelines and their definitions.
//!
//! ## Module Structure
//!
//! - `codec` - Attribute bag ⇄ pipeline object translation
//! - `api` - Remote API seam and its AWS SDK implementation
//! - `config` - Provider configuration
//! - `resources` - Resource type definitions and schemas
//! - `definition` - Definition resource attributes ⇄ pipeline objects
//! - `provider` - DataPipelineProvider implementation

pub mod api;
pub mod codec;
pub mod config;
pub mod definition;
pub mod provider;
pub mod resources;

// Re-export main types
pub use codec::{CodecConfig, CodecError, Encoder, ObjectKind, decode, encode};
pub use config::{ProviderConfig, normalize_region};
pub use provider::DataPipelineProvider;

use sluice_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use sluice_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for DataPipelineProvider {
    fn name(&self) -> &'static str {
        "datapipeline"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            self.read_resource(&id.resource_type, &id.name, identifier.as_deref())
                .await
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, &from, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
