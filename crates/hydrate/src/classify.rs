//! Error classification.
//!
//! Which upstream failures merely drop a row, and which surface to the host,
//! is declared per table as an [`IgnoreRules`] table keyed by
//! `(Operation, ErrorCode)`.

use crate::upstream::ErrorCode;
use derive_more::Display;

/// Upstream call kinds issued by the pipeline.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    #[display("connect")]
    Connect,
    #[display("list parents")]
    ListParents,
    #[display("list children")]
    ListChildren,
    #[display("get")]
    Get,
}

/// What the pipeline does with a failed upstream call.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Omit the affected row(s) and carry on.
    #[display("ignorable")]
    Ignore,
    /// Surface to the host; retrying may succeed.
    #[display("retryable")]
    Retryable,
    /// Surface to the host; retrying will not help.
    #[display("fatal")]
    Fatal,
}

/// Table of ignorable `(operation, code)` pairs.
///
/// Session setup ([`Operation::Connect`]) is never ignorable: a credential
/// failure there must fail the scope.
///
/// # Examples
///
/// ```
/// use vaultrow_hydrate::{Disposition, ErrorCode, IgnoreRules, Operation};
///
/// let rules = IgnoreRules::new().ignore(Operation::Get, [ErrorCode::NotFound, ErrorCode::AccessDenied]);
/// assert_eq!(rules.classify(Operation::Get, &ErrorCode::NotFound), Disposition::Ignore);
/// assert_eq!(rules.classify(Operation::ListChildren, &ErrorCode::NotFound), Disposition::Fatal);
/// assert_eq!(rules.classify(Operation::Get, &ErrorCode::Throttling), Disposition::Retryable);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    rules: Vec<(Operation, ErrorCode)>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `codes` as ignorable for `operation`.
    pub fn ignore(mut self, operation: Operation, codes: impl IntoIterator<Item = ErrorCode>) -> Self {
        if operation == Operation::Connect {
            tracing::warn!("Ignore rules for session setup are not honoured; skipping");
            return self;
        }
        for code in codes {
            if !self.is_ignorable(operation, &code) {
                self.rules.push((operation, code));
            }
        }
        self
    }

    pub fn is_ignorable(&self, operation: Operation, code: &ErrorCode) -> bool {
        self.rules.iter().any(|(op, c)| *op == operation && c == code)
    }

    pub fn classify(&self, operation: Operation, code: &ErrorCode) -> Disposition {
        if self.is_ignorable(operation, code) {
            Disposition::Ignore
        } else if code.is_transient() {
            Disposition::Retryable
        } else {
            Disposition::Fatal
        }
    }
}
