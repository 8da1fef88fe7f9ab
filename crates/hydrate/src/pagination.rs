//! Cursor-driven pagination.

use crate::classify::{Disposition, Operation};
use crate::error::{ErrorKind, Result};
use crate::scope::Scope;
use crate::table::Table;
use crate::upstream::{Cursor, Page, UpstreamError, UpstreamResult};
use async_stream::stream;
use futures::Stream;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Cursor state of one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    /// Another request is due; `None` requests the first page.
    HasMore(Option<Cursor>),
    Exhausted,
}

/// A page request that failed, with the cursor it was issued at.
#[derive(Debug)]
pub struct PageFailure {
    pub cursor: Option<Cursor>,
    pub error: exn::Exn<UpstreamError>,
}

/// Drive a paginated upstream call to exhaustion.
///
/// Each item is yielded as soon as its page arrives, and the next page is
/// only requested once the consumer has pulled every item of the current
/// one. The stream ends after the page without a continuation cursor, after
/// the first failed request (yielded as a [`PageFailure`]), or, silently, when
/// `cancel` fires before a request is issued.
///
/// # Examples
///
/// ```
/// use futures::StreamExt;
/// use tokio_util::sync::CancellationToken;
/// use vaultrow_hydrate::{Cursor, Page, paginate};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let items: Vec<_> = paginate(&cancel, |cursor: Option<Cursor>| async move {
///     Ok(match cursor {
///         None => Page::new(vec![1, 2], Some(Cursor::new("2"))),
///         Some(_) => Page::last(vec![3]),
///     })
/// })
/// .map(|item| item.unwrap())
/// .collect()
/// .await;
/// assert_eq!(items, vec![1, 2, 3]);
/// # }
/// ```
pub fn paginate<'a, T, F, Fut>(
    cancel: &'a CancellationToken,
    mut fetch: F,
) -> impl Stream<Item = std::result::Result<T, PageFailure>> + Send + 'a
where
    T: Send + 'a,
    F: FnMut(Option<Cursor>) -> Fut + Send + 'a,
    Fut: Future<Output = UpstreamResult<Page<T>>> + Send + 'a,
{
    stream! {
        let mut state = CursorState::HasMore(None);
        loop {
            let cursor = match std::mem::replace(&mut state, CursorState::Exhausted) {
                CursorState::HasMore(cursor) => cursor,
                CursorState::Exhausted => break,
            };
            if cancel.is_cancelled() {
                tracing::debug!(cursor = ?cursor, "Listing cancelled before next page request");
                break;
            }
            let Page { items, next } = match fetch(cursor.clone()).await {
                Ok(page) => page,
                Err(error) => {
                    yield Err(PageFailure { cursor, error });
                    break;
                },
            };
            tracing::trace!(items = items.len(), last = next.is_none(), "Received page");
            if let Some(next) = next {
                state = CursorState::HasMore(Some(next));
            }
            for item in items {
                yield Ok(item);
            }
        }
    }
}

/// Classify a failed page request for a table-level listing.
///
/// Returns `None` when the failure is ignorable for `operation`, otherwise
/// the disposition to attach to the surfaced error.
pub(crate) fn surface<T: Table>(table: &T, operation: Operation, failure: &PageFailure) -> Option<Disposition> {
    match table.ignore_rules().classify(operation, &failure.error.code) {
        Disposition::Ignore => None,
        disposition => Some(disposition),
    }
}

/// Paginated Lister: all children of one parent within one scope.
///
/// Upstream failures abort only this listing. Ignorable failures end it
/// quietly, anything else is yielded once as an error and ends it.
pub fn list<'a, T: Table>(
    table: &'a T,
    scope: &'a Scope,
    session: &'a T::Session,
    parent: &'a T::Parent,
    cancel: &'a CancellationToken,
) -> impl Stream<Item = Result<T::Item>> + Send + 'a {
    stream! {
        let pages = paginate(cancel, move |cursor| {
            tracing::trace!(table = table.name(), %scope, %parent, cursor = ?cursor, "Listing children");
            table.list_children(session, parent, cursor)
        });
        for await item in pages {
            match item {
                Ok(item) => yield Ok(item),
                Err(failure) => {
                    let Some(disposition) = surface(table, Operation::ListChildren, &failure) else {
                        tracing::debug!(table = table.name(), %scope, %parent, error = %*failure.error, "Ignoring child listing error");
                        continue;
                    };
                    tracing::warn!(table = table.name(), %scope, %parent, %disposition, error = %*failure.error, "Child listing failed");
                    yield Err(failure.error.raise(ErrorKind::ListChildren {
                        table: table.name().to_string(),
                        scope: scope.clone(),
                        parent: parent.to_string(),
                        cursor: failure.cursor,
                        disposition,
                    }));
                },
            }
        }
    }
}
