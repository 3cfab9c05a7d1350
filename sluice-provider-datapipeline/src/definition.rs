//! Pipeline definition resource attributes ⇄ pipeline objects
//!
//! A definition resource carries one block per object: a single `default`
//! block plus lists of `ec2_resource`, `schedule`, ... blocks, and a list of
//! `parameter_value` blocks.

use std::collections::{HashMap, HashSet};

use sluice_core::provider::{ProviderError, ProviderResult};
use sluice_core::resource::Value;

use crate::api::{ParameterValue, PipelineDefinition};
use crate::codec::{
    AttrValue, AttributeBag, CodecError, Encoder, ObjectKind, WireObject, decode_object,
};

const PARAMETER_VALUE: &str = "parameter_value";
const PIPELINE_ID: &str = "pipeline_id";

/// Encode every object block of a definition resource
///
/// The Default object comes first, then the other kinds in
/// `ObjectKind::ALL` order, each list in declared order. The result replaces
/// the remote definition wholesale, so unrecognised blocks are errors.
pub fn definition_from_attributes(
    encoder: &Encoder,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<PipelineDefinition> {
    check_known_attributes(attributes)?;

    let mut objects = Vec::new();

    for kind in ObjectKind::ALL {
        let Some(value) = attributes.get(kind.block_name()) else {
            continue;
        };
        match (kind.is_singleton(), value) {
            (true, Value::Map(block)) => {
                objects.push(encode_block(encoder, kind, block)?);
            }
            (false, Value::List(blocks)) => {
                for (index, block) in blocks.iter().enumerate() {
                    let Value::Map(block) = block else {
                        return Err(ProviderError::new(format!(
                            "{}[{}] must be a block, got {}",
                            kind.block_name(),
                            index,
                            block.type_name()
                        )));
                    };
                    objects.push(encode_block(encoder, kind, block)?);
                }
            }
            (_, other) => {
                return Err(ProviderError::new(format!(
                    "'{}' must be {}, got {}",
                    kind.block_name(),
                    if kind.is_singleton() { "a block" } else { "a list of blocks" },
                    other.type_name()
                )));
            }
        }
    }

    check_unique_ids(&objects)?;
    let parameter_values = parameter_values_from_attributes(attributes)?;
    if objects.is_empty() {
        return Err(ProviderError::new(
            "Pipeline definition must declare at least one object",
        ));
    }

    Ok(PipelineDefinition {
        objects,
        parameter_values,
    })
}

/// Decode a definition back into resource attributes
///
/// Objects of kinds this provider does not model are skipped.
pub fn attributes_from_definition(
    definition: &PipelineDefinition,
) -> ProviderResult<HashMap<String, Value>> {
    let mut attributes = HashMap::new();

    for object in &definition.objects {
        let (kind, bag) = match decode_object(object) {
            Ok(decoded) => decoded,
            Err(CodecError::UnknownObjectKind(type_name)) => {
                log::warn!(
                    "Skipping pipeline object '{}' of unsupported type '{}'",
                    object.id,
                    type_name
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let block = Value::Map(
            bag.into_iter()
                .map(|(key, value)| (key, value.into_value()))
                .collect(),
        );
        if kind.is_singleton() {
            attributes.insert(kind.block_name().to_string(), block);
        } else if let Value::List(blocks) = attributes
            .entry(kind.block_name().to_string())
            .or_insert_with(|| Value::List(Vec::new()))
        {
            blocks.push(block);
        }
    }

    if !definition.parameter_values.is_empty() {
        let values = definition
            .parameter_values
            .iter()
            .map(|p| {
                Value::Map(HashMap::from([
                    ("id".to_string(), Value::String(p.id.clone())),
                    ("string_value".to_string(), Value::String(p.string_value.clone())),
                ]))
            })
            .collect();
        attributes.insert(PARAMETER_VALUE.to_string(), Value::List(values));
    }

    Ok(attributes)
}

fn encode_block(
    encoder: &Encoder,
    kind: ObjectKind,
    block: &HashMap<String, Value>,
) -> ProviderResult<WireObject> {
    let bag = block
        .iter()
        .map(|(key, value)| Ok((key.clone(), AttrValue::try_from_value(key, value)?)))
        .collect::<Result<AttributeBag, CodecError>>()?;
    Ok(encoder.encode(kind, &bag)?)
}

fn check_known_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<()> {
    let mut unknown: Vec<_> = attributes
        .keys()
        .filter(|key| {
            key.as_str() != PIPELINE_ID
                && key.as_str() != PARAMETER_VALUE
                && !ObjectKind::ALL.iter().any(|k| k.block_name() == key.as_str())
        })
        .map(String::as_str)
        .collect();
    unknown.sort_unstable();

    match unknown.first() {
        None => Ok(()),
        Some(key) => Err(ProviderError::new(format!(
            "Unknown pipeline definition attribute '{}'",
            key
        ))),
    }
}

fn check_unique_ids(objects: &[WireObject]) -> ProviderResult<()> {
    let mut seen = HashSet::new();
    for object in objects {
        if !seen.insert(object.id.as_str()) {
            return Err(ProviderError::new(format!(
                "Duplicate pipeline object id '{}'",
                object.id
            )));
        }
    }
    Ok(())
}

fn parameter_values_from_attributes(
    attributes: &HashMap<String, Value>,
) -> ProviderResult<Vec<ParameterValue>> {
    let Some(value) = attributes.get(PARAMETER_VALUE) else {
        return Ok(Vec::new());
    };
    let Value::List(blocks) = value else {
        return Err(ProviderError::new(format!(
            "'{}' must be a list of blocks, got {}",
            PARAMETER_VALUE,
            value.type_name()
        )));
    };

    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let field = |key: &str| match block {
                Value::Map(map) => map.get(key).and_then(Value::as_str),
                _ => None,
            };
            match (field("id"), field("string_value")) {
                (Some(id), Some(string_value)) if !id.is_empty() => Ok(ParameterValue {
                    id: id.to_string(),
                    string_value: string_value.to_string(),
                }),
                _ => Err(ProviderError::new(format!(
                    "{}[{}] requires string attributes 'id' and 'string_value'",
                    PARAMETER_VALUE, index
                ))),
            }
        })
        .collect()
}
