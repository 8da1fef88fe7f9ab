//! Recovery point domain models.
//!
//! Two shapes come back from the provider: the listing shape
//! ([`RecoveryPointSummary`]) and the describe shape
//! ([`RecoveryPointDetail`]), which carries every listed attribute plus the
//! storage class.

use derive_more::Display;
use serde::Serialize;
use time::OffsetDateTime;
use vaultrow_hydrate::error::{ErrorKind, Result, Violation};

/// A backup vault: the parent of its recovery points.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display("vault {name}")]
pub struct Vault {
    pub name: String,
    pub arn: Option<String>,
    pub creation_date: Option<OffsetDateTime>,
}

impl Vault {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: None,
            creation_date: None,
        }
    }
}

/// Identity of a recovery point: both halves are required by the describe call.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{recovery_point_arn} in {backup_vault_name}")]
pub struct RecoveryPointKey {
    backup_vault_name: String,
    recovery_point_arn: String,
}

impl RecoveryPointKey {
    /// Build a key, rejecting empty fields.
    #[track_caller]
    pub fn new(backup_vault_name: impl Into<String>, recovery_point_arn: impl Into<String>) -> Result<Self> {
        let backup_vault_name = backup_vault_name.into();
        let recovery_point_arn = recovery_point_arn.into();
        if backup_vault_name.trim().is_empty() {
            return Err(ErrorKind::contract(Violation::MissingKey("backup_vault_name")));
        }
        if recovery_point_arn.trim().is_empty() {
            return Err(ErrorKind::contract(Violation::MissingKey("recovery_point_arn")));
        }
        Ok(Self {
            backup_vault_name,
            recovery_point_arn,
        })
    }

    pub fn backup_vault_name(&self) -> &str {
        &self.backup_vault_name
    }

    pub fn recovery_point_arn(&self) -> &str {
        &self.recovery_point_arn
    }
}

/// Provider status code, with unknown codes carried verbatim.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum RecoveryPointStatus {
    #[display("COMPLETED")]
    Completed,
    #[display("PARTIAL")]
    Partial,
    #[display("DELETING")]
    Deleting,
    #[display("EXPIRED")]
    Expired,
    #[display("AVAILABLE")]
    Available,
    #[display("STOPPED")]
    Stopped,
    #[display("CREATING")]
    Creating,
    #[display("{_0}")]
    Other(String),
}

impl From<&str> for RecoveryPointStatus {
    fn from(value: &str) -> Self {
        match value {
            "COMPLETED" => Self::Completed,
            "PARTIAL" => Self::Partial,
            "DELETING" => Self::Deleting,
            "EXPIRED" => Self::Expired,
            "AVAILABLE" => Self::Available,
            "STOPPED" => Self::Stopped,
            "CREATING" => Self::Creating,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum StorageClass {
    #[display("WARM")]
    Warm,
    #[display("COLD")]
    Cold,
    #[display("DELETED")]
    Deleted,
    #[display("{_0}")]
    Other(String),
}

impl From<&str> for StorageClass {
    fn from(value: &str) -> Self {
        match value {
            "WARM" => Self::Warm,
            "COLD" => Self::Cold,
            "DELETED" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Retention settings as configured on the backup rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lifecycle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_to_cold_storage_after_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_after_days: Option<i64>,
}

/// Concrete transition dates the provider computed from the [`Lifecycle`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalculatedLifecycle {
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub move_to_cold_storage_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub delete_at: Option<OffsetDateTime>,
}

/// The backup plan and rule that produced a recovery point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecoveryPointCreator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_plan_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_plan_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_rule_id: Option<String>,
}

/// A recovery point as returned by the vault listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryPointSummary {
    pub backup_vault_name: String,
    pub recovery_point_arn: String,
    pub resource_type: Option<String>,
    pub status: Option<RecoveryPointStatus>,
    pub backup_size_in_bytes: Option<i64>,
    pub backup_vault_arn: Option<String>,
    pub creation_date: Option<OffsetDateTime>,
    pub completion_date: Option<OffsetDateTime>,
    pub encryption_key_arn: Option<String>,
    pub iam_role_arn: Option<String>,
    pub is_encrypted: bool,
    pub last_restore_time: Option<OffsetDateTime>,
    pub resource_arn: Option<String>,
    pub source_backup_vault_arn: Option<String>,
    pub status_message: Option<String>,
    pub calculated_lifecycle: Option<CalculatedLifecycle>,
    pub created_by: Option<RecoveryPointCreator>,
    pub lifecycle: Option<Lifecycle>,
}

impl RecoveryPointSummary {
    pub fn new(backup_vault_name: impl Into<String>, recovery_point_arn: impl Into<String>) -> Self {
        Self {
            backup_vault_name: backup_vault_name.into(),
            recovery_point_arn: recovery_point_arn.into(),
            ..Self::default()
        }
    }
}

/// A recovery point as returned by the describe call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryPointDetail {
    pub summary: RecoveryPointSummary,
    pub storage_class: Option<StorageClass>,
}

/// Whichever shape the pipeline produced for a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryPoint {
    Listed(RecoveryPointSummary),
    Described(RecoveryPointDetail),
}

impl RecoveryPoint {
    pub fn summary(&self) -> &RecoveryPointSummary {
        match self {
            Self::Listed(summary) => summary,
            Self::Described(detail) => &detail.summary,
        }
    }

    pub fn arn(&self) -> &str {
        &self.summary().recovery_point_arn
    }

    pub fn is_described(&self) -> bool {
        matches!(self, Self::Described(_))
    }

    /// Only the describe shape knows the storage class.
    pub fn storage_class(&self) -> Option<&StorageClass> {
        match self {
            Self::Listed(_) => None,
            Self::Described(detail) => detail.storage_class.as_ref(),
        }
    }

    pub fn key(&self) -> Result<RecoveryPointKey> {
        let summary = self.summary();
        RecoveryPointKey::new(&summary.backup_vault_name, &summary.recovery_point_arn)
    }
}
