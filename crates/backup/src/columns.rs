//! Column catalog and row projection.
//!
//! The host owns column typing; this module only tells it which columns
//! exist, what they hold and what each row's values are. Timestamps are
//! RFC 3339 strings and nested objects stay JSON objects. Columns only the
//! describe shape carries are `null` on listed rows.

use crate::models::RecoveryPoint;
use derive_more::Display;
use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use vaultrow_hydrate::{REGION, Row};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    #[display("string")]
    String,
    #[display("int")]
    Int,
    #[display("bool")]
    Bool,
    #[display("timestamp")]
    Timestamp,
    #[display("json")]
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnType, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
        }
    }
}

pub const COLUMNS: &[Column] = &[
    Column::new(
        "backup_vault_name",
        ColumnType::String,
        "The name of a logical container where backups are stored.",
    ),
    Column::new(
        "recovery_point_arn",
        ColumnType::String,
        "An ARN that uniquely identifies a recovery point.",
    ),
    Column::new(
        "resource_type",
        ColumnType::String,
        "The type of Amazon Web Services resource to save as a recovery point.",
    ),
    Column::new(
        "status",
        ColumnType::String,
        "A status code specifying the state of the recovery point.",
    ),
    Column::new("backup_size_in_bytes", ColumnType::Int, "The size, in bytes, of a backup."),
    Column::new(
        "backup_vault_arn",
        ColumnType::String,
        "An ARN that uniquely identifies a backup vault.",
    ),
    Column::new(
        "creation_date",
        ColumnType::Timestamp,
        "The date and time that a recovery point is created.",
    ),
    Column::new(
        "completion_date",
        ColumnType::Timestamp,
        "The date and time that a job to create a recovery point is completed.",
    ),
    Column::new(
        "encryption_key_arn",
        ColumnType::String,
        "The server-side encryption key used to protect your backups.",
    ),
    Column::new(
        "iam_role_arn",
        ColumnType::String,
        "Specifies the IAM role ARN used to create the target recovery point.",
    ),
    Column::new(
        "is_encrypted",
        ColumnType::Bool,
        "TRUE if the recovery point is encrypted, FALSE if it is not.",
    ),
    Column::new(
        "last_restore_time",
        ColumnType::Timestamp,
        "The date and time that a recovery point was last restored.",
    ),
    Column::new(
        "resource_arn",
        ColumnType::String,
        "An ARN that uniquely identifies a saved resource.",
    ),
    Column::new(
        "source_backup_vault_arn",
        ColumnType::String,
        "An ARN that uniquely identifies the source vault where the resource was originally backed up in.",
    ),
    Column::new(
        "status_message",
        ColumnType::String,
        "A status message explaining the reason for the recovery point deletion failure.",
    ),
    Column::new(
        "storage_class",
        ColumnType::String,
        "Specifies the storage class of the recovery point. Valid values are WARM or COLD.",
    ),
    Column::new(
        "calculated_lifecycle",
        ColumnType::Json,
        "An object containing DeleteAt and MoveToColdStorageAt timestamps.",
    ),
    Column::new(
        "created_by",
        ColumnType::Json,
        "The backup plan and rule that created the recovery point (BackupPlanArn, BackupPlanId, BackupPlanVersion, BackupRuleId).",
    ),
    Column::new(
        "lifecycle",
        ColumnType::Json,
        "When a protected resource is transitioned to cold storage and when it expires.",
    ),
    Column::new(REGION, ColumnType::String, "The region the resource is located in."),
    Column::new("title", ColumnType::String, "Title of the resource."),
    Column::new("akas", ColumnType::Json, "Array of globally unique identifier strings (also known as) for the resource."),
];

pub fn column(name: &str) -> Option<&'static Column> {
    COLUMNS.iter().find(|column| column.name == name)
}

fn string(value: Option<impl ToString>) -> Value {
    value.map_or(Value::Null, |value| Value::String(value.to_string()))
}

fn timestamp(value: Option<OffsetDateTime>) -> Value {
    // Rfc3339 only rejects years outside 0..=9999, which the provider never sends.
    value.and_then(|value| value.format(&Rfc3339).ok()).map_or(Value::Null, Value::String)
}

fn json(column: &str, value: Option<&impl Serialize>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::warn!(column, error = %err, "Unable to serialize column value");
        Value::Null
    })
}

/// Every column of `row`, keyed by column name.
pub fn column_values(row: &Row<RecoveryPoint>) -> Map<String, Value> {
    let point = row.item.summary();
    let mut values = Map::new();
    values.insert("backup_vault_name".into(), Value::String(point.backup_vault_name.clone()));
    values.insert("recovery_point_arn".into(), Value::String(point.recovery_point_arn.clone()));
    values.insert("resource_type".into(), string(point.resource_type.as_ref()));
    values.insert("status".into(), string(point.status.as_ref()));
    values.insert("backup_size_in_bytes".into(), point.backup_size_in_bytes.map_or(Value::Null, Value::from));
    values.insert("backup_vault_arn".into(), string(point.backup_vault_arn.as_ref()));
    values.insert("creation_date".into(), timestamp(point.creation_date));
    values.insert("completion_date".into(), timestamp(point.completion_date));
    values.insert("encryption_key_arn".into(), string(point.encryption_key_arn.as_ref()));
    values.insert("iam_role_arn".into(), string(point.iam_role_arn.as_ref()));
    values.insert("is_encrypted".into(), Value::Bool(point.is_encrypted));
    values.insert("last_restore_time".into(), timestamp(point.last_restore_time));
    values.insert("resource_arn".into(), string(point.resource_arn.as_ref()));
    values.insert("source_backup_vault_arn".into(), string(point.source_backup_vault_arn.as_ref()));
    values.insert("status_message".into(), string(point.status_message.as_ref()));
    values.insert("storage_class".into(), string(row.item.storage_class()));
    values.insert("calculated_lifecycle".into(), json("calculated_lifecycle", point.calculated_lifecycle.as_ref()));
    values.insert("created_by".into(), json("created_by", point.created_by.as_ref()));
    values.insert("lifecycle".into(), json("lifecycle", point.lifecycle.as_ref()));
    values.insert(REGION.into(), string(row.scope.region()));
    values.insert("title".into(), Value::String(row.title.clone()));
    values.insert("akas".into(), Value::from(row.akas.clone()));
    values
}

/// Column access on materialized recovery point rows.
pub trait RowExt {
    fn values(&self) -> Map<String, Value>;

    /// A single column, `None` for names not in [`COLUMNS`].
    fn value(&self, name: &str) -> Option<Value>;
}

impl RowExt for Row<RecoveryPoint> {
    fn values(&self) -> Map<String, Value> {
        column_values(self)
    }

    fn value(&self, name: &str) -> Option<Value> {
        column_values(self).remove(name)
    }
}
