//! Row stream boundary towards the host.

use crate::error::{Error, Result};
use crate::scope::Scope;
use futures::{Stream, StreamExt};

/// A fully materialized row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<I> {
    /// Scope the row was fetched in.
    pub scope: Scope,
    pub item: I,
    pub title: String,
    pub akas: Vec<String>,
}

/// Consumer of a query's output.
///
/// Rows and errors arrive in stream order: FIFO within one scope, arbitrary
/// interleaving across scopes.
pub trait RowSink<I> {
    fn accept(&mut self, row: Row<I>);
    fn reject(&mut self, error: Error);
}

/// Everything a query produced, rows and surfaced errors side by side.
#[derive(Debug)]
pub struct QueryOutcome<I> {
    pub rows: Vec<Row<I>>,
    pub errors: Vec<Error>,
}

impl<I> Default for QueryOutcome<I> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<I> QueryOutcome<I> {
    /// `true` when no scope, parent or key surfaced an error.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// `true` when at least one surfaced error may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        self.errors.iter().any(|err| err.is_retryable())
    }
}

impl<I> RowSink<I> for QueryOutcome<I> {
    fn accept(&mut self, row: Row<I>) {
        self.rows.push(row);
    }

    fn reject(&mut self, error: Error) {
        self.errors.push(error);
    }
}

/// Forward a row stream into a sink, returning how many rows were accepted.
pub async fn drain<I, S>(stream: impl Stream<Item = Result<Row<I>>>, sink: &mut S) -> usize
where
    S: RowSink<I>,
{
    let mut stream = std::pin::pin!(stream);
    let mut accepted = 0;
    while let Some(next) = stream.next().await {
        match next {
            Ok(row) => {
                accepted += 1;
                sink.accept(row);
            },
            Err(err) => sink.reject(err),
        }
    }
    accepted
}
