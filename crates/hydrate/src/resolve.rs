//! Point lookups.

use crate::classify::{Disposition, Operation};
use crate::error::{ErrorKind, Result, Violation};
use crate::scope::Scope;
use crate::table::Table;
use tokio_util::sync::CancellationToken;

/// Point Resolver: fetch exactly one item by key, bypassing enumeration.
///
/// Returns `None` when the lookup failed with an ignorable error, or when the
/// query was cancelled before the request was issued. A returned item always
/// carries the identity that was asked for.
pub async fn resolve<T: Table>(
    table: &T,
    scope: &Scope,
    session: &T::Session,
    key: &T::Key,
    cancel: &CancellationToken,
) -> Option<Result<T::Item>> {
    if cancel.is_cancelled() {
        tracing::debug!(table = table.name(), %scope, %key, "Lookup cancelled before request");
        return None;
    }
    tracing::trace!(table = table.name(), %scope, %key, "Resolving key");
    let error = match table.get(session, key).await {
        Ok(item) => return Some(check_identity(table, key, item)),
        Err(error) => error,
    };
    match table.ignore_rules().classify(Operation::Get, &error.code) {
        Disposition::Ignore => {
            tracing::debug!(table = table.name(), %scope, %key, error = %*error, "Ignoring lookup error");
            None
        },
        disposition => {
            tracing::warn!(table = table.name(), %scope, %key, %disposition, error = %*error, "Lookup failed");
            Some(Err(error.raise(ErrorKind::Get {
                table: table.name().to_string(),
                scope: scope.clone(),
                key: key.to_string(),
                disposition,
            })))
        },
    }
}

fn check_identity<T: Table>(table: &T, key: &T::Key, item: T::Item) -> Result<T::Item> {
    let actual = table.key_of(&item)?;
    if actual != *key {
        return Err(ErrorKind::contract(Violation::IdentityMismatch {
            expected: key.to_string(),
            actual: actual.to_string(),
        }));
    }
    Ok(item)
}
