//! Scope expansion.
//!
//! A [`Matrix`] declares the independent dimensions a table is enumerated
//! over (regions, accounts, ...). [`Matrix::expand`] turns it into the list of
//! [`Scope`]s, one execution context per combination of dimension values.

use std::fmt;

/// Name of the region dimension.
pub const REGION: &str = "region";

/// One independent execution context.
///
/// Holds the `(dimension, value)` pairs in declaration order. Scopes share no
/// state with each other; the pipeline opens one upstream session per scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    values: Vec<(String, String)>,
}

impl Scope {
    /// Scope for a single region.
    pub fn for_region(region: impl Into<String>) -> Self {
        Self::default().with(REGION, region)
    }

    /// Add (or replace) a dimension value.
    pub fn with(mut self, dimension: impl Into<String>, value: impl Into<String>) -> Self {
        let dimension = dimension.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == dimension) {
            Some(slot) => slot.1 = value,
            None => self.values.push((dimension, value)),
        }
        self
    }

    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.values.iter().find(|(name, _)| name == dimension).map(|(_, value)| value.as_str())
    }

    pub fn region(&self) -> Option<&str> {
        self.get(REGION)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return f.write_str("global");
        }
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Declared scope dimensions for a table.
///
/// # Examples
///
/// ```
/// use vaultrow_hydrate::Matrix;
///
/// let scopes = Matrix::regions(["us-east-1", "eu-west-1", "us-east-1"])
///     .dimension("account", ["111122223333"])
///     .expand();
/// assert_eq!(scopes.len(), 2);
/// assert_eq!(scopes[1].to_string(), "region=eu-west-1, account=111122223333");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    dimensions: Vec<(String, Vec<String>)>,
}

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrix over a single region dimension.
    pub fn regions(regions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new().dimension(REGION, regions)
    }

    /// Declare a dimension. Duplicate values are dropped (first occurrence
    /// wins); redeclaring a dimension replaces its values in place.
    pub fn dimension(mut self, name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let name = name.into();
        let mut unique: Vec<String> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        match self.dimensions.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = unique,
            None => self.dimensions.push((name, unique)),
        }
        self
    }

    /// Cartesian product of all dimensions.
    ///
    /// A matrix with no dimensions yields a single, global scope. A dimension
    /// with no values yields no scopes at all.
    pub fn expand(&self) -> Vec<Scope> {
        let mut scopes = vec![Scope::default()];
        for (name, values) in &self.dimensions {
            scopes = scopes
                .iter()
                .flat_map(|scope| values.iter().map(move |value| scope.clone().with(name.as_str(), value.as_str())))
                .collect();
        }
        scopes
    }
}
