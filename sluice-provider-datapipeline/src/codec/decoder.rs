//! Pipeline object -> attribute bag

use super::field_table::{self, FieldSpec, ValueType};
use super::{AttrValue, AttributeBag, CodecError, CodecResult, ObjectKind, WireField, WireObject};

/// Decode a field list into an attribute bag
pub fn decode(fields: &[WireField]) -> CodecResult<AttributeBag> {
    decode_typed(fields).map(|(_, bag)| bag)
}

/// Decode a field list, also returning the kind named by its `type` field
///
/// Keys missing from the kind's field table are ignored so that fields added
/// to the remote API later do not break reads.
pub fn decode_typed(fields: &[WireField]) -> CodecResult<(ObjectKind, AttributeBag)> {
    let type_field = fields
        .iter()
        .find(|f| f.key == "type")
        .ok_or_else(|| CodecError::MalformedField {
            key: "type".to_string(),
            value: String::new(),
            expected: "object type",
        })?;
    let kind: ObjectKind = type_field.value().parse()?;
    let table = kind.field_table();

    let mut bag = AttributeBag::new();
    for field in fields {
        let Some(spec) = field_table::by_wire_key(table, &field.key) else {
            if field.key != "type" {
                log::debug!("Ignoring unknown {} field '{}'", kind, field.key);
            }
            continue;
        };
        decode_field(spec, field, &mut bag)?;
    }

    Ok((kind, bag))
}

/// Decode a whole object; `id` and `name` are restored into the bag for
/// every kind except the fixed-identity Default object
pub fn decode_object(object: &WireObject) -> CodecResult<(ObjectKind, AttributeBag)> {
    let (kind, mut bag) = decode_typed(&object.fields)?;
    if !kind.is_singleton() {
        bag.insert("id".to_string(), AttrValue::String(object.id.clone()));
        bag.insert("name".to_string(), AttrValue::String(object.name.clone()));
    }
    Ok((kind, bag))
}

fn decode_field(spec: &FieldSpec, field: &WireField, bag: &mut AttributeBag) -> CodecResult<()> {
    let raw = field.value();
    let malformed = |expected: &'static str| CodecError::MalformedField {
        key: field.key.clone(),
        value: raw.to_string(),
        expected,
    };

    let value = match spec.value_type {
        ValueType::String => AttrValue::String(raw.to_string()),
        ValueType::Bool => match raw {
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            _ => return Err(malformed("boolean")),
        },
        ValueType::Int => AttrValue::Int(raw.parse().map_err(|_| malformed("integer"))?),
        ValueType::Float => AttrValue::Float(
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| malformed("number"))?,
        ),
        ValueType::StringList => {
            match bag
                .entry(spec.attribute.to_string())
                .or_insert_with(|| AttrValue::StringList(Vec::new()))
            {
                AttrValue::StringList(items) => items.push(raw.to_string()),
                // Only list rows ever insert under a list attribute
                other => *other = AttrValue::StringList(vec![raw.to_string()]),
            }
            return Ok(());
        }
    };

    bag.insert(spec.attribute.to_string(), value);
    Ok(())
}
