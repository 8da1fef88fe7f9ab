//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Upstream failures are raised as the
//! child of one of these kinds, so the top of the tree names the table and
//! the scope/parent/cursor/key that failed while the upstream code stays
//! available underneath.

use crate::classify::Disposition;
use crate::scope::Scope;
use crate::upstream::Cursor;
use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Upstream data or caller input that breaks the table's contract.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Violation {
    /// ARN without a `/`-delimited segment to derive a title from.
    #[display("malformed ARN `{_0}`")]
    MalformedArn(String),
    /// A mandatory key field was absent or empty.
    #[display("missing key field `{_0}`")]
    MissingKey(&'static str),
    /// A point lookup returned a record with a different identity.
    #[display("lookup for {expected} returned {actual}")]
    IdentityMismatch { expected: String, actual: String },
}

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The upstream session for a scope could not be opened.
    #[display("{table}: unable to open session for {scope}")]
    Session {
        table: String,
        scope: Scope,
        disposition: Disposition,
    },
    /// Parent enumeration stopped early.
    #[display("{table}: listing parents in {scope} failed{}", at(cursor))]
    ListParents {
        table: String,
        scope: Scope,
        cursor: Option<Cursor>,
        disposition: Disposition,
    },
    /// Child listing for one parent stopped early.
    #[display("{table}: listing {parent} in {scope} failed{}", at(cursor))]
    ListChildren {
        table: String,
        scope: Scope,
        parent: String,
        cursor: Option<Cursor>,
        disposition: Disposition,
    },
    /// Point lookup failed.
    #[display("{table}: get {key} in {scope} failed")]
    Get {
        table: String,
        scope: Scope,
        key: String,
        disposition: Disposition,
    },
    /// A single row broke the contract; other rows are unaffected.
    #[display("{table}: row in {scope}{} violates contract: {violation}", under(parent))]
    Row {
        table: String,
        scope: Scope,
        parent: Option<String>,
        violation: Violation,
    },
    /// Never retryable; indicates a bug upstream or in the caller.
    #[display("contract violation: {_0}")]
    Contract(#[error(not(source))] Violation),
}

fn at(cursor: &Option<Cursor>) -> String {
    match cursor {
        Some(cursor) => format!(" at cursor `{cursor}`"),
        None => String::new(),
    }
}

fn under(parent: &Option<String>) -> String {
    match parent {
        Some(parent) => format!(" under {parent}"),
        None => String::new(),
    }
}

impl ErrorKind {
    #[track_caller]
    pub fn contract(violation: Violation) -> Error {
        exn::Exn::from(Self::Contract(violation))
    }

    /// Raise a bare contract violation as [`ErrorKind::Row`] with the
    /// context it happened in. Other kinds already carry their context and
    /// pass through untouched.
    #[track_caller]
    pub fn row(err: Error, table: &str, scope: &Scope, parent: Option<String>) -> Error {
        let violation = match &*err {
            ErrorKind::Contract(violation) => Some(violation.clone()),
            _ => None,
        };
        let Some(violation) = violation else {
            return err;
        };
        err.raise(Self::Row {
            table: table.to_string(),
            scope: scope.clone(),
            parent,
            violation,
        })
    }

    /// The violated contract, for [`ErrorKind::Row`] and [`ErrorKind::Contract`].
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Row { violation, .. } | Self::Contract(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Session { disposition, .. }
            | Self::ListParents { disposition, .. }
            | Self::ListChildren { disposition, .. }
            | Self::Get { disposition, .. } => *disposition,
            Self::Row { .. } | Self::Contract(_) => Disposition::Fatal,
        }
    }

    /// The scope the failure happened in, if any.
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            Self::Session { scope, .. }
            | Self::ListParents { scope, .. }
            | Self::ListChildren { scope, .. }
            | Self::Get { scope, .. }
            | Self::Row { scope, .. } => Some(scope),
            Self::Contract(_) => None,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::Retryable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let kind = ErrorKind::ListChildren {
            table: "aws_backup_recovery_point".to_string(),
            scope: Scope::for_region("us-east-1"),
            parent: "vault my-vault".to_string(),
            cursor: Some(Cursor::new("abc")),
            disposition: Disposition::Retryable,
        };
        assert_eq!(
            kind.to_string(),
            "aws_backup_recovery_point: listing vault my-vault in region=us-east-1 failed at cursor `abc`"
        );
        let kind = ErrorKind::ListParents {
            table: "t".to_string(),
            scope: Scope::for_region("eu-west-1"),
            cursor: None,
            disposition: Disposition::Fatal,
        };
        assert_eq!(kind.to_string(), "t: listing parents in region=eu-west-1 failed");
        let kind = ErrorKind::Contract(Violation::MissingKey("backup_vault_name"));
        assert_eq!(kind.to_string(), "contract violation: missing key field `backup_vault_name`");
    }

    #[test]
    fn error_kind_retryable() {
        let get = |disposition| ErrorKind::Get {
            table: "t".to_string(),
            scope: Scope::for_region("us-east-1"),
            key: "k".to_string(),
            disposition,
        };
        assert!(get(Disposition::Retryable).is_retryable());
        assert!(!get(Disposition::Fatal).is_retryable());
        assert!(!ErrorKind::Contract(Violation::MalformedArn("x".to_string())).is_retryable());
    }

    #[test]
    fn error_deref_to_kind() {
        let err = ErrorKind::contract(Violation::MalformedArn("arn".to_string()));
        // Exn<E> implements Deref<Target = E>
        assert!(matches!(&*err, ErrorKind::Contract(Violation::MalformedArn(_))));
        assert_eq!(err.disposition(), Disposition::Fatal);
        assert!(err.scope().is_none());
    }

    #[test]
    fn error_row_carries_context() {
        let scope = Scope::for_region("us-east-1");
        let err = ErrorKind::contract(Violation::MissingKey("parent"));
        let err = ErrorKind::row(err, "t", &scope, Some("vault nightly".to_string()));
        assert_eq!(
            err.to_string(),
            "t: row in region=us-east-1 under vault nightly violates contract: missing key field `parent`"
        );
        assert_eq!(err.scope(), Some(&scope));
        assert_eq!(err.violation(), Some(&Violation::MissingKey("parent")));
        assert_eq!(err.disposition(), Disposition::Fatal);
        assert!(!err.is_retryable());
    }

    #[test]
    fn error_row_keeps_contextual_kinds() {
        let scope = Scope::for_region("us-east-1");
        let get = exn::Exn::from(ErrorKind::Get {
            table: "t".to_string(),
            scope: scope.clone(),
            key: "k".to_string(),
            disposition: Disposition::Retryable,
        });
        let err = ErrorKind::row(get, "t", &scope, None);
        assert!(matches!(&*err, ErrorKind::Get { .. }));
        assert!(err.violation().is_none());
    }
}
