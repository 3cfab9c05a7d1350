//! Attribute bag -> pipeline object

use super::field_table::{self, FieldSpec, SlotKind, ValueType};
use super::{
    AttrValue, AttributeBag, CodecConfig, CodecError, CodecResult, FloatBounds, ObjectKind,
    WireField, WireObject,
};

/// Identity of the singleton Default object
pub const DEFAULT_OBJECT_ID: &str = "Default";

/// Encodes attribute bags using a fixed policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    config: CodecConfig,
}

/// Encode with the default policy
pub fn encode(kind: ObjectKind, bag: &AttributeBag) -> CodecResult<WireObject> {
    Encoder::default().encode(kind, bag)
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Build the complete pipeline object for `bag`
    ///
    /// Fields follow the kind's field table order after the leading `type`
    /// field. Nothing is returned unless the whole object is valid.
    pub fn encode(&self, kind: ObjectKind, bag: &AttributeBag) -> CodecResult<WireObject> {
        let table = kind.field_table();

        for key in bag.keys() {
            if !is_identity_key(key) && field_table::by_attribute(table, key).is_none() {
                return Err(CodecError::UnknownAttribute {
                    kind,
                    key: key.clone(),
                });
            }
        }

        let (id, name) = if kind.is_singleton() {
            (DEFAULT_OBJECT_ID.to_string(), DEFAULT_OBJECT_ID.to_string())
        } else {
            (identity(bag, "id")?, identity(bag, "name")?)
        };

        let mut fields = vec![WireField::string("type", kind.as_str())];
        for spec in table {
            if let Some(value) = bag.get(spec.attribute) {
                self.encode_field(spec, value, &id, &mut fields)?;
            }
        }

        let object = WireObject { id, name, fields };
        object.validate()?;
        Ok(object)
    }

    fn encode_field(
        &self,
        spec: &FieldSpec,
        value: &AttrValue,
        object_id: &str,
        out: &mut Vec<WireField>,
    ) -> CodecResult<()> {
        let field = |v: String| match spec.slot {
            SlotKind::String => WireField::string(spec.wire_key, v),
            SlotKind::Ref => WireField::reference(spec.wire_key, v),
        };

        match (spec.value_type, value) {
            (ValueType::String, AttrValue::String(s)) => {
                if !s.is_empty() {
                    out.push(field(s.clone()));
                }
            }
            // false is meaningful, so booleans are never skipped
            (ValueType::Bool, AttrValue::Bool(b)) => out.push(field(b.to_string())),
            (ValueType::Int, AttrValue::Int(i)) => {
                if *i != 0 {
                    out.push(field(i.to_string()));
                }
            }
            (ValueType::Float, AttrValue::Float(f)) => {
                self.push_float(spec, *f, object_id, out, field)?
            }
            (ValueType::Float, AttrValue::Int(i)) => {
                self.push_float(spec, *i as f64, object_id, out, field)?
            }
            (ValueType::StringList, AttrValue::StringList(items)) => {
                out.extend(items.iter().cloned().map(field));
            }
            (expected, got) => {
                return Err(CodecError::TypeMismatch {
                    key: spec.attribute.to_string(),
                    expected: expected.name(),
                    got: got.type_name(),
                });
            }
        }
        Ok(())
    }

    fn push_float(
        &self,
        spec: &FieldSpec,
        value: f64,
        object_id: &str,
        out: &mut Vec<WireField>,
        field: impl Fn(String) -> WireField,
    ) -> CodecResult<()> {
        if value == 0.0 {
            return Ok(());
        }
        if let Some(bounds) = self.bounds_for(spec)
            && !bounds.contains(value)
        {
            return Err(CodecError::Validation {
                object_id: object_id.to_string(),
                message: format!(
                    "{} must be greater than {} and less than {}, got {}",
                    spec.attribute, bounds.min_exclusive, bounds.max_exclusive, value
                ),
            });
        }
        out.push(field(value.to_string()));
        Ok(())
    }

    fn bounds_for(&self, spec: &FieldSpec) -> Option<FloatBounds> {
        match spec.attribute {
            "spot_bid_price" => Some(self.config.spot_bid_price),
            _ => None,
        }
    }
}

pub(crate) fn is_identity_key(key: &str) -> bool {
    key == "id" || key == "name"
}

fn identity(bag: &AttributeBag, key: &str) -> CodecResult<String> {
    match bag.get(key) {
        Some(AttrValue::String(s)) => Ok(s.clone()),
        // Left empty so validation reports the missing identity
        None => Ok(String::new()),
        Some(other) => Err(CodecError::TypeMismatch {
            key: key.to_string(),
            expected: "String",
            got: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireSlot;

    fn bag(entries: &[(&str, AttrValue)]) -> AttributeBag {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn default_object_end_to_end() {
        let bag = bag(&[
            ("schedule_type", "cron".into()),
            ("failure_and_rerun_mode", "CASCADE".into()),
            ("pipeline_log_uri", "s3://bucket/prefix/".into()),
            ("role", "arn:aws:iam::123456789012:role/test-role".into()),
            (
                "resource_role",
                "arn:aws:iam::123456789012:role/test-resource-role".into(),
            ),
            ("schedule", "myDefaultSchedule".into()),
        ]);

        let object = encode(ObjectKind::Default, &bag).unwrap();

        assert_eq!(object.id, "Default");
        assert_eq!(object.name, "Default");
        assert_eq!(
            object.fields,
            vec![
                WireField::string("type", "Default"),
                WireField::string("scheduleType", "cron"),
                WireField::string("failureAndRerunMode", "CASCADE"),
                WireField::string("pipelineLogUri", "s3://bucket/prefix/"),
                WireField::string("role", "arn:aws:iam::123456789012:role/test-role"),
                WireField::string(
                    "resourceRole",
                    "arn:aws:iam::123456789012:role/test-resource-role"
                ),
                WireField::reference("schedule", "myDefaultSchedule"),
            ]
        );
    }

    #[test]
    fn default_identity_ignores_bag() {
        let bag = bag(&[
            ("id", "Custom".into()),
            ("name", "Custom".into()),
            ("role", "DataPipelineDefaultRole".into()),
        ]);
        let object = encode(ObjectKind::Default, &bag).unwrap();
        assert_eq!(object.id, "Default");
        assert_eq!(object.name, "Default");
    }

    #[test]
    fn reference_and_literal_slots() {
        let bag = bag(&[
            ("schedule", "myDefaultSchedule".into()),
            ("role", "DataPipelineDefaultRole".into()),
        ]);
        let object = encode(ObjectKind::Default, &bag).unwrap();

        let schedule = object.fields.iter().find(|f| f.key == "schedule").unwrap();
        assert_eq!(schedule.slot, WireSlot::Ref("myDefaultSchedule".to_string()));
        assert_eq!(schedule.string_value(), None);

        let role = object.fields.iter().find(|f| f.key == "role").unwrap();
        assert_eq!(role.string_value(), Some("DataPipelineDefaultRole"));
        assert_eq!(role.ref_value(), None);
    }

    #[test]
    fn zero_values_are_skipped_except_bools() {
        let bag = bag(&[
            ("id", "MyEC2Resource".into()),
            ("name", "MyEC2Resource".into()),
            ("instance_type", "".into()),
            ("maximum_retries", AttrValue::Int(0)),
            ("spot_bid_price", AttrValue::Float(0.0)),
            ("security_group_ids", AttrValue::StringList(vec![])),
            ("associate_public_ip_address", AttrValue::Bool(false)),
        ]);
        let object = encode(ObjectKind::Ec2Resource, &bag).unwrap();

        assert_eq!(
            object.fields,
            vec![
                WireField::string("type", "Ec2Resource"),
                WireField::string("associatePublicIpAddress", "false"),
            ]
        );
    }

    #[test]
    fn lists_emit_one_field_per_element() {
        let bag = bag(&[
            ("id", "MyEC2Resource".into()),
            ("name", "MyEC2Resource".into()),
            (
                "security_group_ids",
                AttrValue::StringList(vec![
                    "sg-1".to_string(),
                    "sg-2".to_string(),
                    "sg-3".to_string(),
                ]),
            ),
        ]);
        let object = encode(ObjectKind::Ec2Resource, &bag).unwrap();

        let values: Vec<_> = object
            .fields
            .iter()
            .filter(|f| f.key == "securityGroupIds")
            .filter_map(WireField::string_value)
            .collect();
        assert_eq!(values, vec!["sg-1", "sg-2", "sg-3"]);
    }

    #[test]
    fn scalars_are_coerced_to_strings() {
        let bag = bag(&[
            ("id", "MyEC2Resource".into()),
            ("name", "MyEC2Resource".into()),
            ("maximum_retries", AttrValue::Int(3)),
            ("spot_bid_price", AttrValue::Float(0.25)),
            ("use_on_demand_on_last_attempt", AttrValue::Bool(true)),
        ]);
        let object = encode(ObjectKind::Ec2Resource, &bag).unwrap();

        assert_eq!(
            &object.fields[1..],
            &[
                WireField::string("spotBidPrice", "0.25"),
                WireField::string("useOnDemandOnLastAttempt", "true"),
                WireField::string("maximumRetries", "3"),
            ]
        );
    }

    #[test]
    fn spot_bid_price_out_of_bounds_fails() {
        let bag = bag(&[
            ("id", "MyEC2Resource".into()),
            ("name", "MyEC2Resource".into()),
            ("spot_bid_price", AttrValue::Float(25.0)),
        ]);
        let err = encode(ObjectKind::Ec2Resource, &bag).unwrap_err();
        assert_eq!(
            err,
            CodecError::Validation {
                object_id: "MyEC2Resource".to_string(),
                message: "spot_bid_price must be greater than 0 and less than 20, got 25"
                    .to_string(),
            }
        );

        let relaxed = Encoder::new(CodecConfig {
            spot_bid_price: FloatBounds {
                min_exclusive: 0.0,
                max_exclusive: 100.0,
            },
        });
        let object = relaxed.encode(ObjectKind::Ec2Resource, &bag).unwrap();
        assert_eq!(object.fields[1], WireField::string("spotBidPrice", "25"));
    }

    #[test]
    fn wrong_value_type_is_an_error() {
        let bag = bag(&[("role", AttrValue::Int(3))]);
        let err = encode(ObjectKind::Default, &bag).unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                key: "role".to_string(),
                expected: "String",
                got: "Int",
            }
        );
    }

    #[test]
    fn unknown_attribute_is_an_error() {
        let bag = bag(&[("period", "1 day".into())]);
        let err = encode(ObjectKind::Default, &bag).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownAttribute {
                kind: ObjectKind::Default,
                key: "period".to_string(),
            }
        );
    }

    #[test]
    fn missing_identity_fails_validation() {
        let bag = bag(&[("period", "1 day".into())]);
        let err = encode(ObjectKind::Schedule, &bag).unwrap_err();
        assert_eq!(
            err,
            CodecError::Validation {
                object_id: String::new(),
                message: "id must not be empty".to_string(),
            }
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let bag = bag(&[
            ("id", "MySchedule".into()),
            ("name", "Every day".into()),
            ("start_date_time", "2024-01-01T00:00:00".into()),
            ("period", "1 day".into()),
            ("occurrences", AttrValue::Int(7)),
        ]);
        let first = encode(ObjectKind::Schedule, &bag).unwrap();
        let second = encode(ObjectKind::Schedule, &bag).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, "Every day");
        let keys: Vec<_> = first.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["type", "period", "startDateTime", "occurrences"]);
    }
}
