//! Query execution.
//!
//! A [`Query`] fans one [`Request`] out across its scopes. Each scope opens
//! its own session and then either walks parents and their children (scan)
//! or resolves a single key (lookup). Scopes run concurrently and never share
//! state, so a failing scope only ever costs its own rows.

use crate::classify::Operation;
use crate::error::{ErrorKind, Result};
use crate::pagination::list;
use crate::parent::parents;
use crate::resolve::resolve;
use crate::scope::Scope;
use crate::sink::{QueryOutcome, Row, drain};
use crate::table::Table;
use crate::transform::materialize;
use async_stream::stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

/// Default number of scopes enumerated at the same time.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Rows (or surfaced errors) in arrival order.
pub type RowStream<'a, I> = BoxStream<'a, Result<Row<I>>>;

/// What the host asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<K> {
    /// Enumerate every row in every scope.
    Scan,
    /// Fetch one row by key in every scope.
    Lookup(K),
}

/// Execution knobs for a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Scopes enumerated concurrently (at least one).
    pub concurrency: usize,
    /// Resolve every listed item through the point lookup before emitting it.
    pub hydrate_details: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            hydrate_details: false,
        }
    }
}

/// A single execution of a table against a set of scopes.
///
/// # Examples
///
/// ```no_run
/// use futures::StreamExt;
/// use vaultrow_hydrate::{Matrix, Query, Request, Table};
///
/// # async fn example<T: Table>(table: &T) {
/// let scopes = Matrix::regions(["us-east-1", "eu-west-1"]).expand();
/// let mut rows = Query::new(table, scopes).concurrency(2).stream(Request::Scan);
/// while let Some(row) = rows.next().await {
///     match row {
///         Ok(row) => println!("{} ({})", row.title, row.scope),
///         Err(err) => eprintln!("{err:?}"),
///     }
/// }
/// # }
/// ```
pub struct Query<'a, T: Table> {
    table: &'a T,
    scopes: Vec<Scope>,
    cancel: CancellationToken,
    options: QueryOptions,
}

impl<'a, T: Table> Query<'a, T> {
    pub fn new(table: &'a T, scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            table,
            scopes: scopes.into_iter().collect(),
            cancel: CancellationToken::new(),
            options: QueryOptions::default(),
        }
    }

    /// Token the host cancels to stop the query.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    pub fn hydrate_details(mut self, hydrate_details: bool) -> Self {
        self.options.hydrate_details = hydrate_details;
        self
    }

    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Execute the request, yielding rows and surfaced errors as they occur.
    pub fn stream(self, request: Request<T::Key>) -> RowStream<'a, T::Item> {
        let Self {
            table,
            scopes,
            cancel,
            options,
        } = self;
        tracing::debug!(table = table.name(), scopes = scopes.len(), ?options, "Starting query");
        futures::stream::iter(scopes)
            .map(move |scope| scope_stream(table, scope, request.clone(), cancel.clone(), options).boxed())
            .flatten_unordered(options.concurrency.max(1))
            .boxed()
    }

    /// Execute the request and collect everything it produced.
    pub async fn collect(self, request: Request<T::Key>) -> QueryOutcome<T::Item> {
        let mut outcome = QueryOutcome::default();
        drain(self.stream(request), &mut outcome).await;
        outcome
    }
}

fn scope_stream<'a, T: Table>(
    table: &'a T,
    scope: Scope,
    request: Request<T::Key>,
    cancel: CancellationToken,
    options: QueryOptions,
) -> impl Stream<Item = Result<Row<T::Item>>> + Send + 'a {
    stream! {
        if cancel.is_cancelled() {
            return;
        }
        tracing::trace!(table = table.name(), %scope, "Opening session");
        let session = match table.connect(&scope).await {
            Ok(session) => session,
            Err(err) => {
                // Never ignorable, but still classified as retryable or fatal.
                let disposition = table.ignore_rules().classify(Operation::Connect, &err.code);
                tracing::warn!(table = table.name(), %scope, %disposition, error = %*err, "Session setup failed");
                yield Err(err.raise(ErrorKind::Session {
                    table: table.name().to_string(),
                    scope: scope.clone(),
                    disposition,
                }));
                return;
            },
        };
        match request {
            Request::Scan => {
                for await row in scan(table, &scope, &session, &cancel, options) {
                    yield row;
                }
            },
            Request::Lookup(key) => {
                if let Some(item) = resolve(table, &scope, &session, &key, &cancel).await {
                    yield item
                        .and_then(|item| materialize(table, &scope, item))
                        .map_err(|err| ErrorKind::row(err, table.name(), &scope, None));
                }
            },
        }
        tracing::debug!(table = table.name(), %scope, "Scope finished");
    }
}

/// Parent stage feeding the child stage, one parent at a time.
fn scan<'a, T: Table>(
    table: &'a T,
    scope: &'a Scope,
    session: &'a T::Session,
    cancel: &'a CancellationToken,
    options: QueryOptions,
) -> impl Stream<Item = Result<Row<T::Item>>> + Send + 'a {
    stream! {
        for await parent in parents(table, scope, session, cancel) {
            let parent = match parent {
                Ok(parent) => parent,
                Err(err) => {
                    yield Err(err);
                    continue;
                },
            };
            let mut emitted = 0usize;
            for await item in list(table, scope, session, &parent, cancel) {
                let item = match item {
                    Ok(item) => item,
                    Err(err) => {
                        yield Err(err);
                        continue;
                    },
                };
                if !options.hydrate_details {
                    emitted += 1;
                    yield materialize(table, scope, item)
                        .map_err(|err| ErrorKind::row(err, table.name(), scope, Some(parent.to_string())));
                    continue;
                }
                let key = match table.key_of(&item) {
                    Ok(key) => key,
                    Err(err) => {
                        yield Err(ErrorKind::row(err, table.name(), scope, Some(parent.to_string())));
                        continue;
                    },
                };
                if let Some(detail) = resolve(table, scope, session, &key, cancel).await {
                    emitted += 1;
                    yield detail
                        .and_then(|detail| materialize(table, scope, detail))
                        .map_err(|err| ErrorKind::row(err, table.name(), scope, Some(parent.to_string())));
                }
            }
            tracing::debug!(table = table.name(), %scope, %parent, rows = emitted, "Parent exhausted");
        }
    }
}
