//! Resource hydration pipeline.
//!
//! Turns provider listing APIs into row streams for a tabular query host:
//! scopes are expanded from a [`Matrix`], each scope opens its own session,
//! parents are enumerated lazily, child listings are paginated to exhaustion
//! and every item passes through the transform stage before it becomes a
//! [`Row`]. Point lookups share the same path from the session onwards.
//!
//! A concrete table only implements [`Table`]: one upstream call per method.

mod classify;
pub mod error;
mod pagination;
mod parent;
mod query;
mod resolve;
mod scope;
mod sink;
mod table;
#[cfg(test)]
mod testing;
mod transform;
mod upstream;

pub use crate::classify::{Disposition, IgnoreRules, Operation};
pub use crate::pagination::{PageFailure, list, paginate};
pub use crate::parent::parents;
pub use crate::query::{DEFAULT_CONCURRENCY, Query, QueryOptions, Request, RowStream};
pub use crate::resolve::resolve;
pub use crate::scope::{Matrix, REGION, Scope};
pub use crate::sink::{QueryOutcome, Row, RowSink, drain};
pub use crate::table::{Root, Table};
pub use crate::transform::{Derived, akas_from_arn, title_from_arn};
pub use crate::upstream::{Cursor, ErrorCode, Page, UpstreamError, UpstreamResult};
