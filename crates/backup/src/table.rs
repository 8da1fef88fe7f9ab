//! The `aws_backup_recovery_point` table.

use crate::api::{ApiHandle, Sessions};
use crate::models::{RecoveryPoint, RecoveryPointKey, Vault};
use async_trait::async_trait;
use vaultrow_config::Config;
use vaultrow_hydrate::error::Result;
use vaultrow_hydrate::{
    Cursor, Derived, ErrorCode, IgnoreRules, Operation, Page, Query, Scope, Table, UpstreamError, UpstreamResult,
};

pub const TABLE_NAME: &str = "aws_backup_recovery_point";

/// Recovery points of every backup vault, one scope per region.
///
/// Vaults are the parent stage. A lookup needs both the vault name and the
/// recovery point ARN. `NotFound` and `AccessDenied` on a lookup drop the
/// row; `NotFound` on a vault's listing means the vault vanished after it
/// was enumerated and ends that vault quietly.
pub struct RecoveryPointTable<S> {
    sessions: S,
    rules: IgnoreRules,
}

impl<S: Sessions> RecoveryPointTable<S> {
    pub fn new(sessions: S) -> Self {
        Self {
            sessions,
            rules: IgnoreRules::new()
                .ignore(Operation::Get, [ErrorCode::NotFound, ErrorCode::AccessDenied])
                .ignore(Operation::ListChildren, [ErrorCode::NotFound]),
        }
    }

    /// A query over the configured regions with the configured options.
    pub fn query(&self, config: &Config) -> Query<'_, Self> {
        Query::new(self, config.matrix().expand()).options(config.query_options())
    }
}

#[async_trait]
impl<S: Sessions> Table for RecoveryPointTable<S> {
    type Session = ApiHandle;
    type Parent = Vault;
    type Item = RecoveryPoint;
    type Key = RecoveryPointKey;

    fn name(&self) -> &str {
        TABLE_NAME
    }

    fn ignore_rules(&self) -> &IgnoreRules {
        &self.rules
    }

    async fn connect(&self, scope: &Scope) -> UpstreamResult<ApiHandle> {
        let Some(region) = scope.region() else {
            exn::bail!(UpstreamError::new(ErrorCode::InvalidRequest, format!("{scope} has no region")));
        };
        self.sessions.open(region).await
    }

    async fn list_parents(&self, session: &ApiHandle, cursor: Option<Cursor>) -> UpstreamResult<Page<Vault>> {
        session.list_backup_vaults(cursor).await
    }

    async fn list_children(
        &self,
        session: &ApiHandle,
        parent: &Vault,
        cursor: Option<Cursor>,
    ) -> UpstreamResult<Page<RecoveryPoint>> {
        let page = session.list_recovery_points(parent, cursor).await?;
        Ok(page.map(RecoveryPoint::Listed))
    }

    async fn get(&self, session: &ApiHandle, key: &RecoveryPointKey) -> UpstreamResult<RecoveryPoint> {
        let detail = session.describe_recovery_point(key).await?;
        Ok(RecoveryPoint::Described(detail))
    }

    fn key_of(&self, item: &RecoveryPoint) -> Result<RecoveryPointKey> {
        item.key()
    }

    fn derive(&self, item: &RecoveryPoint) -> Result<Derived> {
        Derived::from_arns(item.arn(), item.summary().resource_arn.as_deref())
    }
}
