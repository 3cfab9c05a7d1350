//! Resource type definitions for AWS Data Pipeline
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - The attribute schemas checked before any remote call

use sluice_core::provider::ResourceType;
use sluice_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::codec::ObjectKind;

pub const PIPELINE: &str = "datapipeline.pipeline";
pub const PIPELINE_DEFINITION: &str = "datapipeline.pipeline_definition";

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(PipelineType, PIPELINE, pipeline_schema);
define_resource_type!(
    PipelineDefinitionType,
    PIPELINE_DEFINITION,
    pipeline_definition_schema
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(PipelineType), Box::new(PipelineDefinitionType)]
}

/// Schema for a resource type name
pub fn schema_for(resource_type: &str) -> Option<ResourceSchema> {
    match resource_type {
        PIPELINE => Some(pipeline_schema()),
        PIPELINE_DEFINITION => Some(pipeline_definition_schema()),
        _ => None,
    }
}

// =============================================================================
// Schemas
// =============================================================================

pub fn pipeline_schema() -> ResourceSchema {
    ResourceSchema::new(PIPELINE)
        .with_description("A Data Pipeline. Its definition is managed separately.")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Display name of the pipeline.")
                .with_provider_name("name"),
        )
        .attribute(
            AttributeSchema::new("unique_id", AttributeType::String)
                .with_description("Idempotency token for creation. Defaults to the name.")
                .with_provider_name("uniqueId"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_provider_name("description"),
        )
        .attribute(
            AttributeSchema::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
                .with_provider_name("tags"),
        )
        .attribute(
            AttributeSchema::new("pipeline_id", AttributeType::String)
                .with_description(" (read-only)")
                .with_provider_name("pipelineId"),
        )
        .attribute(
            AttributeSchema::new("state", AttributeType::String)
                .with_description("Scheduling state, e.g. PENDING or SCHEDULED (read-only)")
                .with_provider_name("@pipelineState"),
        )
}

pub fn pipeline_definition_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(PIPELINE_DEFINITION)
        .with_description("The complete set of objects of one pipeline, replaced on every update.")
        .attribute(
            AttributeSchema::new("pipeline_id", AttributeType::String)
                .required()
                .with_provider_name("pipelineId"),
        )
        .attribute(
            AttributeSchema::new(
                "parameter_value",
                AttributeType::List(Box::new(AttributeType::Block)),
            )
            .with_description("Values for the definition's parameters.")
            .with_provider_name("parameterValues"),
        );

    for kind in ObjectKind::ALL {
        let attr_type = if kind.is_singleton() {
            AttributeType::Block
        } else {
            AttributeType::List(Box::new(AttributeType::Block))
        };
        schema = schema.attribute(
            AttributeSchema::new(kind.block_name(), attr_type)
                .with_description(format!("{} pipeline objects.", kind)),
        );
    }

    schema
}
