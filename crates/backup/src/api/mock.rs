//! In-memory backup service for testing.

use super::{ApiHandle, BackupApi, Sessions};
use crate::models::{RecoveryPointDetail, RecoveryPointKey, RecoveryPointSummary, StorageClass, Vault};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vaultrow_hydrate::{Cursor, ErrorCode, Page, UpstreamError, UpstreamResult};

const DEFAULT_PAGE_SIZE: usize = 2;
const ACCOUNT: &str = "111122223333";

/// A completed, unencrypted recovery point in `vault`.
pub fn recovery_point(region: &str, vault: &str, id: &str) -> RecoveryPointDetail {
    let mut summary = RecoveryPointSummary::new(vault, format!("arn:aws:backup:{region}:{ACCOUNT}:recovery-point:/{vault}/{id}"));
    summary.backup_vault_arn = Some(format!("arn:aws:backup:{region}:{ACCOUNT}:backup-vault:{vault}"));
    summary.resource_arn = Some(format!("arn:aws:ec2:{region}:{ACCOUNT}:volume/vol-{id}"));
    summary.resource_type = Some("EBS".to_string());
    summary.status = Some("COMPLETED".into());
    RecoveryPointDetail {
        summary,
        storage_class: Some(StorageClass::Warm),
    }
}

/// In-memory backup service for one region.
///
/// Listings are served `page_size` entries at a time with the offset as the
/// cursor, so a handful of fixtures is enough to exercise pagination. Every
/// call is counted.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "mock")] {
/// use vaultrow_backup::api::{MockBackupApi, recovery_point};
/// use vaultrow_hydrate::ErrorCode;
///
/// let api = MockBackupApi::new("eu-west-1")
///     .page_size(1)
///     .vault("nightly", [recovery_point("eu-west-1", "nightly", "a")])
///     .fail_listing("audit", ErrorCode::AccessDenied);
/// assert_eq!(api.describe_calls(), 0);
/// # }
/// ```
#[derive(Debug)]
pub struct MockBackupApi {
    region: String,
    page_size: usize,
    vaults: Vec<(Vault, Vec<RecoveryPointDetail>)>,
    vault_listing_failure: Option<ErrorCode>,
    listing_failures: HashMap<String, ErrorCode>,
    describe_failures: HashMap<String, ErrorCode>,
    vault_calls: AtomicUsize,
    listing_calls: AtomicUsize,
    describe_calls: AtomicUsize,
}

impl MockBackupApi {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            page_size: DEFAULT_PAGE_SIZE,
            vaults: Vec::new(),
            vault_listing_failure: None,
            listing_failures: HashMap::new(),
            describe_failures: HashMap::new(),
            vault_calls: AtomicUsize::new(0),
            listing_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
        }
    }

    /// Entries per listing page (at least one).
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn vault(mut self, name: &str, points: impl IntoIterator<Item = RecoveryPointDetail>) -> Self {
        let mut vault = Vault::new(name);
        vault.arn = Some(format!("arn:aws:backup:{}:{ACCOUNT}:backup-vault:{name}", self.region));
        self.vaults.push((vault, points.into_iter().collect()));
        self
    }

    /// Fail every `ListBackupVaults` call.
    pub fn fail_vault_listing(mut self, code: ErrorCode) -> Self {
        self.vault_listing_failure = Some(code);
        self
    }

    /// Fail every `ListRecoveryPointsByBackupVault` call for `vault`.
    pub fn fail_listing(mut self, vault: &str, code: ErrorCode) -> Self {
        self.listing_failures.insert(vault.to_string(), code);
        self
    }

    /// Fail every `DescribeRecoveryPoint` call for `arn`.
    pub fn fail_describe(mut self, arn: &str, code: ErrorCode) -> Self {
        self.describe_failures.insert(arn.to_string(), code);
        self
    }

    pub fn vault_calls(&self) -> usize {
        self.vault_calls.load(Ordering::SeqCst)
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    fn page<T: Clone>(&self, entries: &[T], cursor: Option<Cursor>) -> UpstreamResult<Page<T>> {
        let offset = match cursor {
            Some(cursor) => cursor
                .as_str()
                .parse::<usize>()
                .map_err(|_| exn::Exn::from(UpstreamError::new(ErrorCode::InvalidRequest, "invalid next token")))?,
            None => 0,
        };
        let end = (offset + self.page_size).min(entries.len());
        let items = entries.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
        let next = (end < entries.len()).then(|| Cursor::new(end.to_string()));
        Ok(Page::new(items, next))
    }
}

fn fail<T>(code: &ErrorCode, message: &str) -> UpstreamResult<T> {
    Err(exn::Exn::from(UpstreamError::new(code.clone(), message)))
}

#[async_trait]
impl BackupApi for MockBackupApi {
    fn region(&self) -> &str {
        &self.region
    }

    async fn list_backup_vaults(&self, cursor: Option<Cursor>) -> UpstreamResult<Page<Vault>> {
        self.vault_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = &self.vault_listing_failure {
            return fail(code, "injected vault listing failure");
        }
        let vaults: Vec<Vault> = self.vaults.iter().map(|(vault, _)| vault.clone()).collect();
        self.page(&vaults, cursor)
    }

    async fn list_recovery_points(
        &self,
        vault: &Vault,
        cursor: Option<Cursor>,
    ) -> UpstreamResult<Page<RecoveryPointSummary>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.listing_failures.get(&vault.name) {
            return fail(code, "injected listing failure");
        }
        let Some((_, points)) = self.vaults.iter().find(|(v, _)| v.name == vault.name) else {
            return fail(&ErrorCode::NotFound, "backup vault does not exist");
        };
        let summaries: Vec<RecoveryPointSummary> = points.iter().map(|point| point.summary.clone()).collect();
        self.page(&summaries, cursor)
    }

    async fn describe_recovery_point(&self, key: &RecoveryPointKey) -> UpstreamResult<RecoveryPointDetail> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.describe_failures.get(key.recovery_point_arn()) {
            return fail(code, "injected describe failure");
        }
        self.vaults
            .iter()
            .filter(|(vault, _)| vault.name == key.backup_vault_name())
            .flat_map(|(_, points)| points)
            .find(|point| point.summary.recovery_point_arn == key.recovery_point_arn())
            .cloned()
            .ok_or_else(|| exn::Exn::from(UpstreamError::new(ErrorCode::NotFound, "recovery point does not exist")))
    }
}

/// Hands out [`MockBackupApi`]s by region.
///
/// Regions never registered fail to open with a connectivity error.
#[derive(Debug, Default)]
pub struct MockSessions {
    regions: HashMap<String, Result<ApiHandle, ErrorCode>>,
}

impl MockSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `api` under its own region. Keep a clone to read its counters.
    pub fn with(mut self, api: Arc<MockBackupApi>) -> Self {
        self.regions.insert(api.region().to_string(), Ok(api));
        self
    }

    /// Opening `region` fails with `code`.
    pub fn unreachable(mut self, region: &str, code: ErrorCode) -> Self {
        self.regions.insert(region.to_string(), Err(code));
        self
    }
}

#[async_trait]
impl Sessions for MockSessions {
    async fn open(&self, region: &str) -> UpstreamResult<ApiHandle> {
        match self.regions.get(region) {
            Some(Ok(api)) => Ok(Arc::clone(api)),
            Some(Err(code)) => fail(code, "injected session failure"),
            None => fail(&ErrorCode::Connectivity, "no endpoint for region"),
        }
    }
}
