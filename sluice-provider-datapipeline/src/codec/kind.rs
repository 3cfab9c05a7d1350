//! Pipeline object kinds supported by the codec

use std::fmt;
use std::str::FromStr;

use super::CodecError;
use super::field_table::{self, FieldSpec};

/// The `type` of a pipeline object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Default,
    Ec2Resource,
    RdsDatabase,
    S3DataNode,
    SqlDataNode,
    Schedule,
}

impl ObjectKind {
    /// All kinds, in the order their blocks are emitted
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Default,
        ObjectKind::Ec2Resource,
        ObjectKind::RdsDatabase,
        ObjectKind::S3DataNode,
        ObjectKind::SqlDataNode,
        ObjectKind::Schedule,
    ];

    /// Wire value of the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Default => "Default",
            ObjectKind::Ec2Resource => "Ec2Resource",
            ObjectKind::RdsDatabase => "RdsDatabase",
            ObjectKind::S3DataNode => "S3DataNode",
            ObjectKind::SqlDataNode => "SqlDataNode",
            ObjectKind::Schedule => "Schedule",
        }
    }

    /// Configuration block name (e.g., "ec2_resource")
    pub fn block_name(&self) -> &'static str {
        match self {
            ObjectKind::Default => "default",
            ObjectKind::Ec2Resource => "ec2_resource",
            ObjectKind::RdsDatabase => "rds_database",
            ObjectKind::S3DataNode => "s3_data_node",
            ObjectKind::SqlDataNode => "sql_data_node",
            ObjectKind::Schedule => "schedule",
        }
    }

    pub fn field_table(&self) -> &'static [FieldSpec] {
        match self {
            ObjectKind::Default => field_table::DEFAULT_FIELDS,
            ObjectKind::Ec2Resource => field_table::EC2_RESOURCE_FIELDS,
            ObjectKind::RdsDatabase => field_table::RDS_DATABASE_FIELDS,
            ObjectKind::S3DataNode => field_table::S3_DATA_NODE_FIELDS,
            ObjectKind::SqlDataNode => field_table::SQL_DATA_NODE_FIELDS,
            ObjectKind::Schedule => field_table::SCHEDULE_FIELDS,
        }
    }

    /// The Default object has a fixed identity and appears at most once
    pub fn is_singleton(&self) -> bool {
        matches!(self, ObjectKind::Default)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::UnknownObjectKind(s.to_string()))
    }
}
