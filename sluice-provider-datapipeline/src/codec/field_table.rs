//! Field tables: attribute name ⇄ wire key, per object kind
//!
//! Each row fixes the wire key, the value slot and the attribute type of one
//! attribute. Rows are emitted in declaration order. Adding an attribute
//! means adding a row here and nothing else.
//!
//! `type`, `id` and `name` are not rows: the encoder derives them from the
//! object kind and the bag's identity keys.

/// Which value slot a field uses on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// `stringValue`
    String,
    /// `refValue`, the id of another pipeline object
    Ref,
}

/// Attribute type on the bag side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Float,
    /// Repeated wire key, one field per element
    StringList,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "String",
            ValueType::Bool => "Bool",
            ValueType::Int => "Int",
            ValueType::Float => "Float",
            ValueType::StringList => "StringList",
        }
    }
}

/// One field table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub attribute: &'static str,
    pub wire_key: &'static str,
    pub slot: SlotKind,
    pub value_type: ValueType,
}

const fn string(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::String,
        value_type: ValueType::String,
    }
}

const fn boolean(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::String,
        value_type: ValueType::Bool,
    }
}

const fn int(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::String,
        value_type: ValueType::Int,
    }
}

const fn float(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::String,
        value_type: ValueType::Float,
    }
}

const fn string_list(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::String,
        value_type: ValueType::StringList,
    }
}

const fn reference(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::Ref,
        value_type: ValueType::String,
    }
}

const fn reference_list(attribute: &'static str, wire_key: &'static str) -> FieldSpec {
    FieldSpec {
        attribute,
        wire_key,
        slot: SlotKind::Ref,
        value_type: ValueType::StringList,
    }
}

// =============================================================================
// Tables
// =============================================================================

pub const DEFAULT_FIELDS: &[FieldSpec] = &[
    string("schedule_type", "scheduleType"),
    string("failure_and_rerun_mode", "failureAndRerunMode"),
    string("pipeline_log_uri", "pipelineLogUri"),
    string("role", "role"),
    string("resource_role", "resourceRole"),
    reference("schedule", "schedule"),
];

pub const EC2_RESOURCE_FIELDS: &[FieldSpec] = &[
    string("instance_type", "instanceType"),
    string("image_id", "imageId"),
    string("key_pair", "keyPair"),
    string("subnet_id", "subnetId"),
    string_list("security_group_ids", "securityGroupIds"),
    string_list("security_groups", "securityGroups"),
    boolean("associate_public_ip_address", "associatePublicIpAddress"),
    string("terminate_after", "terminateAfter"),
    string("role", "role"),
    string("resource_role", "resourceRole"),
    string("region", "region"),
    string("availability_zone", "availabilityZone"),
    float("spot_bid_price", "spotBidPrice"),
    boolean("use_on_demand_on_last_attempt", "useOnDemandOnLastAttempt"),
    int("maximum_retries", "maximumRetries"),
    string("action_on_task_failure", "actionOnTaskFailure"),
    string("action_on_resource_failure", "actionOnResourceFailure"),
    string("worker_group", "workerGroup"),
    string("pipeline_log_uri", "pipelineLogUri"),
    reference("http_proxy", "httpProxy"),
    reference("schedule", "schedule"),
];

pub const RDS_DATABASE_FIELDS: &[FieldSpec] = &[
    string("rds_instance_id", "rdsInstanceId"),
    string("database_name", "databaseName"),
    string("username", "username"),
    // A leading '*' asks the service to store the value encrypted
    string("password", "*password"),
    string("region", "region"),
    string("jdbc_driver_jar_uri", "jdbcDriverJarUri"),
    string_list("jdbc_properties", "jdbcProperties"),
];

pub const S3_DATA_NODE_FIELDS: &[FieldSpec] = &[
    string("directory_path", "directoryPath"),
    string("file_path", "filePath"),
    string("manifest_file_path", "manifestFilePath"),
    string("compression", "compression"),
    string("s3_encryption_type", "s3EncryptionType"),
    reference("data_format", "dataFormat"),
    int("maximum_retries", "maximumRetries"),
    string("failure_and_rerun_mode", "failureAndRerunMode"),
    string("late_after_timeout", "lateAfterTimeout"),
    string("worker_group", "workerGroup"),
    reference_list("precondition", "precondition"),
    reference_list("on_fail", "onFail"),
    reference_list("on_success", "onSuccess"),
    reference("schedule", "schedule"),
];

pub const SQL_DATA_NODE_FIELDS: &[FieldSpec] = &[
    string("table", "table"),
    reference("database", "database"),
    string("select_query", "selectQuery"),
    string("insert_query", "insertQuery"),
    string("create_table_sql", "createTableSql"),
    int("maximum_retries", "maximumRetries"),
    string("failure_and_rerun_mode", "failureAndRerunMode"),
    string("worker_group", "workerGroup"),
    reference_list("precondition", "precondition"),
    reference("schedule", "schedule"),
];

pub const SCHEDULE_FIELDS: &[FieldSpec] = &[
    string("period", "period"),
    string("start_at", "startAt"),
    string("start_date_time", "startDateTime"),
    string("end_date_time", "endDateTime"),
    int("occurrences", "occurrences"),
    reference("parent", "parent"),
];

/// Look up a row by attribute name
pub fn by_attribute<'a>(table: &'a [FieldSpec], attribute: &str) -> Option<&'a FieldSpec> {
    table.iter().find(|spec| spec.attribute == attribute)
}

/// Look up a row by wire key
pub fn by_wire_key<'a>(table: &'a [FieldSpec], wire_key: &str) -> Option<&'a FieldSpec> {
    table.iter().find(|spec| spec.wire_key == wire_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ObjectKind;
    use std::collections::HashSet;

    #[test]
    fn tables_have_unique_keys() {
        for kind in ObjectKind::ALL {
            let table = kind.field_table();
            let attributes: HashSet<_> = table.iter().map(|s| s.attribute).collect();
            let wire_keys: HashSet<_> = table.iter().map(|s| s.wire_key).collect();
            assert_eq!(attributes.len(), table.len(), "{} attributes", kind);
            assert_eq!(wire_keys.len(), table.len(), "{} wire keys", kind);
        }
    }

    #[test]
    fn identity_keys_are_not_rows() {
        for kind in ObjectKind::ALL {
            for reserved in ["type", "id", "name"] {
                assert!(by_attribute(kind.field_table(), reserved).is_none());
                assert!(by_wire_key(kind.field_table(), reserved).is_none());
            }
        }
    }

    #[test]
    fn cross_object_references_use_ref_slot() {
        for kind in ObjectKind::ALL {
            if let Some(spec) = by_attribute(kind.field_table(), "schedule") {
                assert_eq!(spec.slot, SlotKind::Ref, "{} schedule", kind);
            }
        }
        let role = by_attribute(DEFAULT_FIELDS, "role").unwrap();
        assert_eq!(role.slot, SlotKind::String);
    }

    #[test]
    fn lookups() {
        let spec = by_wire_key(EC2_RESOURCE_FIELDS, "securityGroupIds").unwrap();
        assert_eq!(spec.attribute, "security_group_ids");
        assert_eq!(spec.value_type, ValueType::StringList);

        let spec = by_attribute(RDS_DATABASE_FIELDS, "password").unwrap();
        assert_eq!(spec.wire_key, "*password");
    }
}
