//! In-memory table for pipeline tests.

use crate::classify::{IgnoreRules, Operation};
use crate::error::{ErrorKind, Result, Violation};
use crate::scope::Scope;
use crate::table::Table;
use crate::transform::Derived;
use crate::upstream::{Cursor, ErrorCode, Page, UpstreamError, UpstreamResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) const ARN_PREFIX: &str = "arn:aws:backup:us-east-1:111122223333:recovery-point:";

type Listing = std::result::Result<Vec<FakeItem>, ErrorCode>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeItem {
    pub parent: String,
    pub arn: String,
    pub detailed: bool,
}

pub(crate) fn item(parent: &str, id: &str) -> FakeItem {
    FakeItem {
        parent: parent.to_string(),
        arn: format!("{ARN_PREFIX}/{parent}/{id}"),
        detailed: false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeKey {
    pub parent: String,
    pub arn: String,
}

impl fmt::Display for FakeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.parent, self.arn)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeParent {
    name: String,
    pages: Vec<Listing>,
}

impl fmt::Display for FakeParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parent {}", self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeScope {
    connect_error: Option<ErrorCode>,
    parents: Vec<FakeParent>,
    parents_fail_at: Option<(usize, ErrorCode)>,
}

impl FakeScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable(code: ErrorCode) -> Self {
        Self {
            connect_error: Some(code),
            ..Self::default()
        }
    }

    pub fn parent(mut self, name: &str, pages: Vec<Listing>) -> Self {
        self.parents.push(FakeParent {
            name: name.to_string(),
            pages,
        });
        self
    }

    /// Fail the parent listing when page `index` is requested.
    pub fn parents_fail_at(mut self, index: usize, code: ErrorCode) -> Self {
        self.parents_fail_at = Some((index, code));
        self
    }
}

/// One parent per page; one child page per entry in `FakeParent::pages`.
pub(crate) struct FakeTable {
    rules: IgnoreRules,
    scopes: HashMap<String, FakeScope>,
    get_errors: HashMap<String, ErrorCode>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl FakeTable {
    pub fn new() -> Self {
        Self {
            rules: IgnoreRules::new()
                .ignore(Operation::Get, [ErrorCode::NotFound, ErrorCode::AccessDenied])
                .ignore(Operation::ListChildren, [ErrorCode::NotFound]),
            scopes: HashMap::new(),
            get_errors: HashMap::new(),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn scope(mut self, region: &str, scope: FakeScope) -> Self {
        self.scopes.insert(region.to_string(), scope);
        self
    }

    pub fn get_error(mut self, arn: &str, code: ErrorCode) -> Self {
        self.get_errors.insert(arn.to_string(), code);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn data(&self, region: &str) -> UpstreamResult<&FakeScope> {
        self.scopes
            .get(region)
            .ok_or_else(|| exn::Exn::from(UpstreamError::new(ErrorCode::Connectivity, "unknown region")))
    }
}

fn fail<T>(code: ErrorCode) -> UpstreamResult<T> {
    Err(exn::Exn::from(UpstreamError::new(code, "injected")))
}

fn index(cursor: Option<Cursor>) -> usize {
    cursor.map(|c| c.as_str().parse().unwrap()).unwrap_or(0)
}

fn next_cursor(index: usize, len: usize) -> Option<Cursor> {
    (index + 1 < len).then(|| Cursor::new((index + 1).to_string()))
}

#[async_trait]
impl Table for FakeTable {
    type Session = String;
    type Parent = FakeParent;
    type Item = FakeItem;
    type Key = FakeKey;

    fn name(&self) -> &str {
        "fake"
    }

    fn ignore_rules(&self) -> &IgnoreRules {
        &self.rules
    }

    async fn connect(&self, scope: &Scope) -> UpstreamResult<String> {
        let region = scope.region().unwrap_or_default().to_string();
        match &self.data(&region)?.connect_error {
            Some(code) => fail(code.clone()),
            None => Ok(region),
        }
    }

    async fn list_parents(&self, session: &String, cursor: Option<Cursor>) -> UpstreamResult<Page<FakeParent>> {
        let data = self.data(session)?;
        let index = index(cursor);
        if let Some((at, code)) = &data.parents_fail_at
            && *at == index
        {
            return fail(code.clone());
        }
        let parents: Vec<FakeParent> = data.parents.get(index).cloned().into_iter().collect();
        Ok(Page::new(parents, next_cursor(index, data.parents.len())))
    }

    async fn list_children(
        &self,
        _session: &String,
        parent: &FakeParent,
        cursor: Option<Cursor>,
    ) -> UpstreamResult<Page<FakeItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let index = index(cursor);
        match parent.pages.get(index) {
            None => Ok(Page::last(vec![])),
            Some(Err(code)) => fail(code.clone()),
            Some(Ok(items)) => Ok(Page::new(items.clone(), next_cursor(index, parent.pages.len()))),
        }
    }

    async fn get(&self, session: &String, key: &FakeKey) -> UpstreamResult<FakeItem> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.get_errors.get(&key.arn) {
            return fail(code.clone());
        }
        self.data(session)?
            .parents
            .iter()
            .filter(|parent| parent.name == key.parent)
            .flat_map(|parent| parent.pages.iter().flatten().flatten())
            .find(|item| item.arn == key.arn)
            .map(|item| FakeItem {
                detailed: true,
                ..item.clone()
            })
            .ok_or_else(|| exn::Exn::from(UpstreamError::new(ErrorCode::NotFound, "no such item")))
    }

    fn key_of(&self, item: &FakeItem) -> Result<FakeKey> {
        if item.parent.is_empty() {
            return Err(ErrorKind::contract(Violation::MissingKey("parent")));
        }
        if item.arn.is_empty() {
            return Err(ErrorKind::contract(Violation::MissingKey("arn")));
        }
        Ok(FakeKey {
            parent: item.parent.clone(),
            arn: item.arn.clone(),
        })
    }

    fn derive(&self, item: &FakeItem) -> Result<Derived> {
        Derived::from_arn(&item.arn)
    }
}
