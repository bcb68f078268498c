//! Storage for completed result trees.
//!
//! The engine never touches a store itself. Whatever serves past results
//! (a web listing, a CLI report) goes through [`ResultStore`], usually via the
//! [`Results`] facade.

use crate::error::{StoreError, StoreResult};
use crate::result::TestResult;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overview of a stored run, as shown in a listing of past results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Opaque identifier chosen by the store
    pub id: String,
    pub started: DateTime<Utc>,
    pub dur: Duration,
    /// Leaf tests in the run
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_result(id: impl Into<String>, result: &TestResult) -> Self {
        let stats = result.sum_test_stats();
        Self {
            id: id.into(),
            started: result.started,
            dur: result.dur,
            total: stats.total,
            passed: stats.passed,
            failed: stats.failed,
        }
    }

    /// Start time truncated to whole seconds.
    pub fn truncated_timestamp(&self) -> DateTime<Utc> {
        self.started
            .duration_trunc(TimeDelta::seconds(1))
            .unwrap_or(self.started)
    }
}

/// Something that can save and retrieve result trees
pub trait ResultStore: Send {
    /// List stored runs on a 1-based `page`. The store picks the page size.
    /// The flag reports whether a later page has more results.
    fn enumerate(&self, page: usize) -> StoreResult<(Vec<Summary>, bool)>;

    /// Fetch a stored run. Unknown ids are [`StoreError::NotFound`].
    fn load(&self, id: &str) -> StoreResult<TestResult>;

    /// Store a run and return its new identifier.
    fn save(&mut self, result: TestResult) -> StoreResult<String>;
}

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Process-local store with no persistence.
///
/// Ids are `"0"`, `"1"`, ... in save order, and listings come back in that
/// same order.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    results: Vec<TestResult>,
    page_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page size of 0 is treated as 1.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            results: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ResultStore for InMemoryStore {
    fn enumerate(&self, page: usize) -> StoreResult<(Vec<Summary>, bool)> {
        if page == 0 {
            return Err(StoreError::InvalidPage(page));
        }

        let start = (page - 1).saturating_mul(self.page_size);
        let summaries: Vec<Summary> = self
            .results
            .iter()
            .enumerate()
            .skip(start)
            .take(self.page_size)
            .map(|(id, result)| Summary::from_result(id.to_string(), result))
            .collect();
        let more = start.saturating_add(self.page_size) < self.results.len();
        Ok((summaries, more))
    }

    fn load(&self, id: &str) -> StoreResult<TestResult> {
        id.parse::<usize>()
            .ok()
            .and_then(|index| self.results.get(index))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn save(&mut self, result: TestResult) -> StoreResult<String> {
        let id = self.results.len().to_string();
        self.results.push(result);
        log::debug!("saved result {}", id);
        Ok(id)
    }
}

/// Holds the configured store, if any.
///
/// Every operation fails with [`StoreError::NoStore`] until a store is set.
#[derive(Default)]
pub struct Results {
    store: Option<Box<dyn ResultStore>>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: impl ResultStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
        }
    }

    pub fn set_store(&mut self, store: impl ResultStore + 'static) {
        self.store = Some(Box::new(store));
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn save_result(&mut self, result: TestResult) -> StoreResult<String> {
        self.store.as_mut().ok_or(StoreError::NoStore)?.save(result)
    }

    pub fn load_result(&self, id: &str) -> StoreResult<TestResult> {
        self.store.as_ref().ok_or(StoreError::NoStore)?.load(id)
    }

    pub fn enumerate(&self, page: usize) -> StoreResult<(Vec<Summary>, bool)> {
        self.store.as_ref().ok_or(StoreError::NoStore)?.enumerate(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn run_named(name: &str) -> TestResult {
        TestResult {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_truncated_timestamp() {
        let started = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 45)
            .unwrap()
            .checked_add_signed(TimeDelta::milliseconds(750))
            .unwrap();
        let summary = Summary {
            id: "0".to_string(),
            started,
            dur: Duration::ZERO,
            total: 0,
            passed: 0,
            failed: 0,
        };
        assert_eq!(
            summary.truncated_timestamp(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap()
        );
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        assert_eq!(InMemoryStore::with_page_size(0).page_size(), 1);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.save(run_named("a")).unwrap(), "0");
        assert_eq!(store.save(run_named("b")).unwrap(), "1");
        assert_eq!(store.load("1").unwrap().name, "b");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_page_zero_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(store.enumerate(0), Err(StoreError::InvalidPage(0))));
    }

    #[test]
    fn test_facade_without_store() {
        let mut results = Results::new();
        assert!(!results.has_store());
        assert!(matches!(
            results.save_result(run_named("x")),
            Err(StoreError::NoStore)
        ));
        assert!(matches!(results.load_result("0"), Err(StoreError::NoStore)));
        assert!(matches!(results.enumerate(1), Err(StoreError::NoStore)));
    }
}
