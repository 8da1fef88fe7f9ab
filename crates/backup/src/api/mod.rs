//! The upstream seam of the recovery point table.
//!
//! [`BackupApi`] is one call per provider operation, one page per call.
//! [`Sessions`] opens a regional handle; the table asks for one per scope.

#[cfg(feature = "aws")]
mod aws;
#[cfg(any(test, feature = "mock"))]
mod mock;

#[cfg(feature = "aws")]
pub use self::aws::{AwsBackupApi, AwsSessions, Credentials};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockBackupApi, MockSessions, recovery_point};
use crate::models::{RecoveryPointDetail, RecoveryPointKey, RecoveryPointSummary, Vault};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use vaultrow_hydrate::{Cursor, Page, UpstreamResult};

pub type ApiHandle = Arc<dyn BackupApi + Send + Sync>;

/// Regional access to the backup service.
///
/// Implementations translate provider failures into
/// [`UpstreamError`](vaultrow_hydrate::UpstreamError)s with a parsed code and
/// never retry on their own behalf beyond what the client already does.
#[async_trait]
pub trait BackupApi: fmt::Debug + Send + Sync {
    fn region(&self) -> &str;

    async fn list_backup_vaults(&self, cursor: Option<Cursor>) -> UpstreamResult<Page<Vault>>;

    async fn list_recovery_points(
        &self,
        vault: &Vault,
        cursor: Option<Cursor>,
    ) -> UpstreamResult<Page<RecoveryPointSummary>>;

    async fn describe_recovery_point(&self, key: &RecoveryPointKey) -> UpstreamResult<RecoveryPointDetail>;
}

/// Opens an [`ApiHandle`] for a region.
#[async_trait]
pub trait Sessions: Send + Sync {
    async fn open(&self, region: &str) -> UpstreamResult<ApiHandle>;
}
