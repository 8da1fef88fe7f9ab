//! Derived display columns.
//!
//! Everything here is computed from data that has already been fetched; no
//! function in this module performs upstream calls.

use crate::error::{ErrorKind, Result, Violation};
use crate::scope::Scope;
use crate::sink::Row;
use crate::table::Table;

/// Display-only columns overlaid on every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub title: String,
    /// Alternate identifiers (AKAs).
    pub akas: Vec<String>,
}

impl Derived {
    /// Title taken from `arn`, AKAs from the ARN of the resource it stands
    /// for. Items without a resource ARN have no AKAs.
    pub fn from_arns(arn: &str, resource_arn: Option<&str>) -> Result<Self> {
        Ok(Self {
            title: title_from_arn(arn)?,
            akas: resource_arn.map(akas_from_arn).unwrap_or_default(),
        })
    }

    /// Title and AKAs both taken from one ARN.
    pub fn from_arn(arn: &str) -> Result<Self> {
        Self::from_arns(arn, Some(arn))
    }
}

/// Title taken from the ARN path segment right after the first `/`.
///
/// Only an ARN without any `/` is rejected; an empty segment is an empty
/// title.
///
/// # Examples
///
/// ```
/// use vaultrow_hydrate::title_from_arn;
///
/// let arn = "arn:aws:backup:us-east-1:111122223333:recovery-point:/my-vault/abcd-1234";
/// assert_eq!(title_from_arn(arn).unwrap(), "my-vault");
/// assert_eq!(title_from_arn("arn:aws:ec2:us-east-1::snapshot/snap-0abc").unwrap(), "snap-0abc");
/// assert_eq!(title_from_arn("arn:aws:backup:us-east-1:111122223333:recovery-point:/").unwrap(), "");
/// assert!(title_from_arn("arn:aws:backup:us-east-1:111122223333:recovery-point:0F1E").is_err());
/// ```
pub fn title_from_arn(arn: &str) -> Result<String> {
    match arn.split('/').nth(1) {
        Some(segment) => Ok(segment.to_string()),
        None => Err(ErrorKind::contract(Violation::MalformedArn(arn.to_string()))),
    }
}

/// Single-element AKA list for an ARN.
pub fn akas_from_arn(arn: &str) -> Vec<String> {
    vec![arn.trim().to_string()]
}

/// Run the transform stage on a fetched item.
///
/// Also enforces that every materialized row carries a complete identity.
pub(crate) fn materialize<T: Table>(table: &T, scope: &Scope, item: T::Item) -> Result<Row<T::Item>> {
    table.key_of(&item)?;
    let Derived { title, akas } = table.derive(&item)?;
    Ok(Row {
        scope: scope.clone(),
        item,
        title,
        akas,
    })
}
