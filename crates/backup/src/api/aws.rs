//! AWS Backup adapter.
//!
//! One [`Client`] per region, built from host-supplied credentials. Each
//! [`BackupApi`] call is exactly one SDK request; the SDK's standard retry
//! policy (exponential back-off) is the only retrying that happens here.
//!
//! Provider exception names are parsed into an [`ErrorCode`] once, in
//! [`upstream_error`]. Dispatch failures and timeouts never reach the service
//! and become [`ErrorCode::Connectivity`].

use super::{ApiHandle, BackupApi, Sessions};
use crate::models::{
    CalculatedLifecycle, Lifecycle, RecoveryPointCreator, RecoveryPointDetail, RecoveryPointKey,
    RecoveryPointSummary, StorageClass, Vault,
};
use async_trait::async_trait;
use aws_sdk_backup::Client;
use aws_sdk_backup::config::{BehaviorVersion, Region, retry::RetryConfig};
use aws_sdk_backup::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_backup::primitives::DateTime;
use aws_sdk_backup::types;
use exn::ResultExt;
use std::sync::Arc;
use time::OffsetDateTime;
use vaultrow_config::AwsSettings;
use vaultrow_hydrate::{Cursor, ErrorCode, Page, UpstreamError, UpstreamResult};

pub use aws_sdk_backup::config::Credentials;

/// Both SDK shapes expose the shared attributes through identically named
/// getters; this fills a [`RecoveryPointSummary`] from either.
macro_rules! summary {
    ($src:expr, $vault:expr) => {{
        let src = &$src;
        (|| -> UpstreamResult<RecoveryPointSummary> {
            Ok(RecoveryPointSummary {
                backup_vault_name: src.backup_vault_name().unwrap_or($vault).to_string(),
                recovery_point_arn: src.recovery_point_arn().unwrap_or_default().to_string(),
                resource_type: src.resource_type().map(str::to_string),
                status: src.status().map(|status| status.as_str().into()),
                backup_size_in_bytes: src.backup_size_in_bytes(),
                backup_vault_arn: src.backup_vault_arn().map(str::to_string),
                creation_date: datetime(src.creation_date())?,
                completion_date: datetime(src.completion_date())?,
                encryption_key_arn: src.encryption_key_arn().map(str::to_string),
                iam_role_arn: src.iam_role_arn().map(str::to_string),
                is_encrypted: src.is_encrypted(),
                last_restore_time: datetime(src.last_restore_time())?,
                resource_arn: src.resource_arn().map(str::to_string),
                source_backup_vault_arn: src.source_backup_vault_arn().map(str::to_string),
                status_message: src.status_message().map(str::to_string),
                calculated_lifecycle: src.calculated_lifecycle().map(calculated_lifecycle).transpose()?,
                created_by: src.created_by().map(creator),
                lifecycle: src.lifecycle().map(lifecycle),
            })
        })()
    }};
}

/// Opens an [`AwsBackupApi`] per region.
///
/// # Examples
///
/// ```no_run
/// use vaultrow_backup::api::{AwsSessions, Credentials};
/// use vaultrow_config::AwsSettings;
///
/// let credentials = Credentials::new("key_id", "key_secret", None, None, "vaultrow");
/// let sessions = AwsSessions::new(credentials, AwsSettings::default());
/// ```
#[derive(Debug, Clone)]
pub struct AwsSessions {
    credentials: Credentials,
    settings: AwsSettings,
}

impl AwsSessions {
    pub fn new(credentials: Credentials, settings: AwsSettings) -> Self {
        Self { credentials, settings }
    }

    /// Build the SDK client for `region`. No network traffic happens here.
    pub fn client(&self, region: &str) -> Client {
        let mut config_builder = aws_sdk_backup::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(self.credentials.clone())
            .region(Region::new(region.to_string()))
            .retry_config(RetryConfig::standard().with_max_attempts(self.settings.max_attempts.max(1)));
        if let Some(endpoint_url) = &self.settings.endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Client::from_conf(config_builder.build())
    }
}

#[async_trait]
impl Sessions for AwsSessions {
    async fn open(&self, region: &str) -> UpstreamResult<ApiHandle> {
        tracing::trace!(region, endpoint = ?self.settings.endpoint, "Opening backup client");
        let api = AwsBackupApi::from_client(self.client(region), region).max_results(self.settings.max_results);
        Ok(Arc::new(api))
    }
}

/// [`BackupApi`] over an `aws_sdk_backup` [`Client`].
#[derive(Debug, Clone)]
pub struct AwsBackupApi {
    client: Client,
    region: String,
    max_results: Option<i32>,
}

impl AwsBackupApi {
    pub fn from_client(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
            max_results: None,
        }
    }

    /// Page size requested from listings; the service default when `None`.
    pub fn max_results(mut self, max_results: Option<i32>) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl BackupApi for AwsBackupApi {
    fn region(&self) -> &str {
        &self.region
    }

    async fn list_backup_vaults(&self, cursor: Option<Cursor>) -> UpstreamResult<Page<Vault>> {
        let output = self
            .client
            .list_backup_vaults()
            .set_next_token(cursor.map(|c| c.as_str().to_string()))
            .set_max_results(self.max_results)
            .send()
            .await
            .map_err(|err| upstream_error("ListBackupVaults", err))?;
        let mut vaults = Vec::with_capacity(output.backup_vault_list().len());
        for member in output.backup_vault_list() {
            let Some(name) = member.backup_vault_name().filter(|name| !name.is_empty()) else {
                tracing::warn!(region = %self.region, arn = ?member.backup_vault_arn(), "Skipping unnamed backup vault");
                continue;
            };
            vaults.push(Vault {
                name: name.to_string(),
                arn: member.backup_vault_arn().map(str::to_string),
                creation_date: datetime(member.creation_date())?,
            });
        }
        Ok(Page::new(vaults, output.next_token().map(Cursor::new)))
    }

    async fn list_recovery_points(
        &self,
        vault: &Vault,
        cursor: Option<Cursor>,
    ) -> UpstreamResult<Page<RecoveryPointSummary>> {
        let output = self
            .client
            .list_recovery_points_by_backup_vault()
            .backup_vault_name(&vault.name)
            .set_next_token(cursor.map(|c| c.as_str().to_string()))
            .set_max_results(self.max_results)
            .send()
            .await
            .map_err(|err| upstream_error("ListRecoveryPointsByBackupVault", err))?;
        let points = output
            .recovery_points()
            .iter()
            .map(|point| summary!(point, &vault.name))
            .collect::<UpstreamResult<Vec<_>>>()?;
        Ok(Page::new(points, output.next_token().map(Cursor::new)))
    }

    async fn describe_recovery_point(&self, key: &RecoveryPointKey) -> UpstreamResult<RecoveryPointDetail> {
        let output = self
            .client
            .describe_recovery_point()
            .backup_vault_name(key.backup_vault_name())
            .recovery_point_arn(key.recovery_point_arn())
            .send()
            .await
            .map_err(|err| upstream_error("DescribeRecoveryPoint", err))?;
        Ok(RecoveryPointDetail {
            summary: summary!(output, key.backup_vault_name())?,
            storage_class: output.storage_class().map(|class| StorageClass::from(class.as_str())),
        })
    }
}

/// Convert AWS DateTime to OffsetDateTime.
fn datetime(dt: Option<&DateTime>) -> UpstreamResult<Option<OffsetDateTime>> {
    dt.map(|dt| {
        OffsetDateTime::from_unix_timestamp_nanos(dt.as_nanos())
            .or_raise(|| UpstreamError::new(ErrorCode::Other("DateTimeOutOfRange".to_string()), dt.to_string()))
    })
    .transpose()
}

fn calculated_lifecycle(src: &types::CalculatedLifecycle) -> UpstreamResult<CalculatedLifecycle> {
    Ok(CalculatedLifecycle {
        move_to_cold_storage_at: datetime(src.move_to_cold_storage_at())?,
        delete_at: datetime(src.delete_at())?,
    })
}

fn lifecycle(src: &types::Lifecycle) -> Lifecycle {
    Lifecycle {
        move_to_cold_storage_after_days: src.move_to_cold_storage_after_days(),
        delete_after_days: src.delete_after_days(),
    }
}

fn creator(src: &types::RecoveryPointCreator) -> RecoveryPointCreator {
    RecoveryPointCreator {
        backup_plan_arn: src.backup_plan_arn().map(str::to_string),
        backup_plan_id: src.backup_plan_id().map(str::to_string),
        backup_plan_version: src.backup_plan_version().map(str::to_string),
        backup_rule_id: src.backup_rule_id().map(str::to_string),
    }
}

/// Translate an SDK failure into an [`UpstreamError`].
fn upstream_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> exn::Exn<UpstreamError>
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorCode::Connectivity,
        _ => err.code().map_or_else(|| ErrorCode::Other("Unknown".to_string()), ErrorCode::from_code),
    };
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    tracing::trace!(operation, %code, "Upstream call failed");
    exn::Exn::from(UpstreamError::new(code, format!("{operation}: {message}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_backup::error::ErrorMetadata;
    use aws_sdk_backup::operation::describe_recovery_point::{DescribeRecoveryPointError, DescribeRecoveryPointOutput};
    use aws_sdk_backup::operation::list_backup_vaults::ListBackupVaultsOutput;
    use aws_sdk_backup::operation::list_recovery_points_by_backup_vault::{
        ListRecoveryPointsByBackupVaultError, ListRecoveryPointsByBackupVaultOutput,
    };
    use aws_sdk_backup::types::{BackupVaultListMember, RecoveryPointByBackupVault, RecoveryPointStatus};
    use aws_smithy_mocks::{RuleMode, mock, mock_client};

    const ARN: &str = "arn:aws:backup:us-east-1:111122223333:recovery-point:/nightly/abcd-1234";

    fn point(id: &str) -> RecoveryPointByBackupVault {
        RecoveryPointByBackupVault::builder()
            .recovery_point_arn(format!("arn:aws:backup:us-east-1:111122223333:recovery-point:/nightly/{id}"))
            .backup_vault_name("nightly")
            .status(RecoveryPointStatus::Completed)
            .backup_size_in_bytes(1024)
            .creation_date(DateTime::from_secs(1_700_000_000))
            .build()
    }

    #[tokio::test]
    async fn test_list_backup_vaults_follows_next_token() {
        let first = mock!(Client::list_backup_vaults)
            .match_requests(|req| req.next_token().is_none())
            .then_output(|| {
                ListBackupVaultsOutput::builder()
                    .backup_vault_list(BackupVaultListMember::builder().backup_vault_name("nightly").build())
                    .backup_vault_list(BackupVaultListMember::builder().build())
                    .next_token("page-2")
                    .build()
            });
        let second = mock!(Client::list_backup_vaults)
            .match_requests(|req| req.next_token() == Some("page-2"))
            .then_output(|| {
                ListBackupVaultsOutput::builder()
                    .backup_vault_list(BackupVaultListMember::builder().backup_vault_name("weekly").build())
                    .build()
            });
        let client = mock_client!(aws_sdk_backup, RuleMode::MatchAny, [&first, &second]);
        let api = AwsBackupApi::from_client(client, "us-east-1");

        let page = api.list_backup_vaults(None).await.unwrap();
        // The unnamed vault is skipped.
        assert_eq!(page.items, vec![Vault::new("nightly")]);
        assert_eq!(page.next, Some(Cursor::new("page-2")));
        let page = api.list_backup_vaults(page.next).await.unwrap();
        assert_eq!(page.items, vec![Vault::new("weekly")]);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_list_recovery_points_converts_listing_shape() {
        let rule = mock!(Client::list_recovery_points_by_backup_vault)
            .match_requests(|req| req.backup_vault_name() == Some("nightly"))
            .then_output(|| {
                ListRecoveryPointsByBackupVaultOutput::builder()
                    .recovery_points(point("abcd-1234"))
                    .recovery_points(point("efgh-5678"))
                    .next_token("more")
                    .build()
            });
        let client = mock_client!(aws_sdk_backup, RuleMode::MatchAny, [&rule]);
        let api = AwsBackupApi::from_client(client, "us-east-1");

        let page = api.list_recovery_points(&Vault::new("nightly"), None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next, Some(Cursor::new("more")));
        let first = &page.items[0];
        assert_eq!(first.recovery_point_arn, ARN);
        assert_eq!(first.backup_vault_name, "nightly");
        assert_eq!(first.status, Some(crate::models::RecoveryPointStatus::Completed));
        assert_eq!(first.backup_size_in_bytes, Some(1024));
        assert_eq!(first.creation_date, Some(OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()));
        assert!(!first.is_encrypted);
    }

    #[tokio::test]
    async fn test_listing_error_code_is_parsed() {
        let rule = mock!(Client::list_recovery_points_by_backup_vault).then_error(|| {
            ListRecoveryPointsByBackupVaultError::generic(
                ErrorMetadata::builder()
                    .code("ResourceNotFoundException")
                    .message("Backup vault nightly does not exist")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_backup, RuleMode::MatchAny, [&rule]);
        let api = AwsBackupApi::from_client(client, "us-east-1");

        let err = api.list_recovery_points(&Vault::new("nightly"), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_describe_recovery_point_carries_storage_class() {
        let rule = mock!(Client::describe_recovery_point)
            .match_requests(|req| req.recovery_point_arn() == Some(ARN))
            .then_output(|| {
                DescribeRecoveryPointOutput::builder()
                    .recovery_point_arn(ARN)
                    .storage_class(aws_sdk_backup::types::StorageClass::Cold)
                    .build()
            });
        let client = mock_client!(aws_sdk_backup, RuleMode::MatchAny, [&rule]);
        let api = AwsBackupApi::from_client(client, "us-east-1");

        let key = RecoveryPointKey::new("nightly", ARN).unwrap();
        let detail = api.describe_recovery_point(&key).await.unwrap();
        assert_eq!(detail.storage_class, Some(StorageClass::Cold));
        // Missing vault name in the response falls back to the key's.
        assert_eq!(detail.summary.backup_vault_name, "nightly");
    }

    #[tokio::test]
    async fn test_describe_access_denied() {
        let rule = mock!(Client::describe_recovery_point).then_error(|| {
            DescribeRecoveryPointError::generic(ErrorMetadata::builder().code("AccessDeniedException").build())
        });
        let client = mock_client!(aws_sdk_backup, RuleMode::MatchAny, [&rule]);
        let api = AwsBackupApi::from_client(client, "us-east-1");

        let key = RecoveryPointKey::new("nightly", ARN).unwrap();
        let err = api.describe_recovery_point(&key).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessDenied);
    }
}
