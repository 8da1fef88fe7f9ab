//! Parent enumeration.

use crate::classify::Operation;
use crate::error::{ErrorKind, Result};
use crate::pagination::{paginate, surface};
use crate::scope::Scope;
use crate::table::Table;
use async_stream::stream;
use futures::Stream;
use tokio_util::sync::CancellationToken;

/// Lazily list every parent of a table within one scope.
///
/// Restarting means calling this again; no position is remembered between
/// calls. Parents are yielded as their page arrives, so the child stage can
/// start on the first parent before the second page of parents is requested.
pub fn parents<'a, T: Table>(
    table: &'a T,
    scope: &'a Scope,
    session: &'a T::Session,
    cancel: &'a CancellationToken,
) -> impl Stream<Item = Result<T::Parent>> + Send + 'a {
    stream! {
        let pages = paginate(cancel, move |cursor| {
            tracing::trace!(table = table.name(), %scope, cursor = ?cursor, "Listing parents");
            table.list_parents(session, cursor)
        });
        for await parent in pages {
            match parent {
                Ok(parent) => yield Ok(parent),
                Err(failure) => {
                    let Some(disposition) = surface(table, Operation::ListParents, &failure) else {
                        tracing::debug!(table = table.name(), %scope, error = %*failure.error, "Ignoring parent listing error");
                        continue;
                    };
                    tracing::warn!(table = table.name(), %scope, %disposition, error = %*failure.error, "Parent listing failed");
                    yield Err(failure.error.raise(ErrorKind::ListParents {
                        table: table.name().to_string(),
                        scope: scope.clone(),
                        cursor: failure.cursor,
                        disposition,
                    }));
                },
            }
        }
    }
}
