//! Table definition trait.

use crate::classify::IgnoreRules;
use crate::error::Result;
use crate::scope::Scope;
use crate::transform::Derived;
use crate::upstream::{Cursor, Page, UpstreamResult};
use async_trait::async_trait;
use derive_more::Display;

/// Parent type for tables without a parent stage.
///
/// Such tables answer [`Table::list_parents`] with `Page::last(vec![Root])`,
/// so the child listing runs exactly once per scope.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq)]
#[display("root")]
pub struct Root;

/// A provider resource exposed as rows.
///
/// Implementations only describe single upstream calls; the [`Query`]
/// engine owns fan-out across scopes, pagination, cancellation, error
/// classification and the transform stage.
///
/// [`Query`]: crate::Query
///
/// # Upstream calls
/// Every `async` method maps to exactly one upstream request. List methods
/// return one [`Page`] per call and are driven to exhaustion by the engine;
/// they must not loop over cursors themselves.
#[async_trait]
pub trait Table: Send + Sync {
    /// Per-scope upstream client handle. Read-only once opened.
    type Session: Send + Sync + 'static;
    /// Coarse container scoping the child listing.
    type Parent: std::fmt::Display + Send + Sync + 'static;
    /// Row entity, in whichever upstream shape produced it.
    type Item: Send + Sync + 'static;
    /// Unique key accepted by the point lookup path.
    type Key: std::fmt::Display + PartialEq + Clone + Send + Sync + 'static;

    /// Table name (used for logging and error messages).
    fn name(&self) -> &str;

    /// Which upstream failures drop rows instead of failing.
    fn ignore_rules(&self) -> &IgnoreRules;

    /// Open the upstream session for one scope.
    async fn connect(&self, scope: &Scope) -> UpstreamResult<Self::Session>;

    /// Fetch one page of parents.
    async fn list_parents(&self, session: &Self::Session, cursor: Option<Cursor>) -> UpstreamResult<Page<Self::Parent>>;

    /// Fetch one page of children for a parent.
    async fn list_children(
        &self,
        session: &Self::Session,
        parent: &Self::Parent,
        cursor: Option<Cursor>,
    ) -> UpstreamResult<Page<Self::Item>>;

    /// Fetch exactly one item by key.
    async fn get(&self, session: &Self::Session, key: &Self::Key) -> UpstreamResult<Self::Item>;

    /// Extract the identity of an item.
    ///
    /// Fails with a [`Violation::MissingKey`](crate::error::Violation::MissingKey)
    /// contract error when the upstream record lacks an identity field.
    fn key_of(&self, item: &Self::Item) -> Result<Self::Key>;

    /// Compute display-only columns. Must not perform I/O.
    fn derive(&self, item: &Self::Item) -> Result<Derived>;
}
