//! Result tree produced by a run.
//!
//! A run yields a synthetic root whose children are suites, whose children are
//! tests, whose children are subtests. Nodes are built bottom-up as tests
//! finish and are not changed once attached to a parent, with one exception:
//! hook failures reported after a test completes (after-test, after-suite)
//! mark the already-built test node failed and append their messages.
//!
//! Suite nodes are built with [`TestResult::with_outcome`]: they carry their
//! hooks' messages, but pass or fail on their tests alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Severity of a recorded message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// A message logged by a test or hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    pub text: String,
    pub level: Level,
}

impl Msg {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: Level::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: Level::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Pass/fail state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Passed,
    Failed,
}

impl Outcome {
    /// Derive the outcome of a node from everything that can fail it.
    pub fn from_parts(marked_failed: bool, msgs: &[Msg], subtests: &[TestResult]) -> Self {
        if marked_failed || msgs.iter().any(Msg::is_error) || subtests.iter().any(TestResult::failed)
        {
            Outcome::Failed
        } else {
            Outcome::Passed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Leaf counts below a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl std::ops::Add for TestStats {
    type Output = TestStats;

    fn add(self, rhs: TestStats) -> TestStats {
        TestStats {
            total: self.total + rhs.total,
            passed: self.passed + rhs.passed,
            failed: self.failed + rhs.failed,
        }
    }
}

impl std::iter::Sum for TestStats {
    fn sum<I: Iterator<Item = TestStats>>(iter: I) -> TestStats {
        iter.fold(TestStats::default(), |acc, s| acc + s)
    }
}

/// One node of the result tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestResult {
    /// Suite the node belongs to (empty for the root)
    pub suite: String,
    /// Sanitized name; subtests are named `parent/child`
    pub name: String,
    pub msgs: Vec<Msg>,
    #[serde(rename = "result")]
    pub outcome: Outcome,
    pub started: DateTime<Utc>,
    pub dur: Duration,
    pub subtests: Vec<TestResult>,
}

impl TestResult {
    /// Build a node, deriving its outcome from the failed flag, messages and children.
    pub fn new(
        suite: impl Into<String>,
        name: impl Into<String>,
        marked_failed: bool,
        msgs: Vec<Msg>,
        started: DateTime<Utc>,
        dur: Duration,
        subtests: Vec<TestResult>,
    ) -> Self {
        let outcome = Outcome::from_parts(marked_failed, &msgs, &subtests);
        Self::with_outcome(suite, name, outcome, msgs, started, dur, subtests)
    }

    /// Build a node whose outcome is decided by the caller. Messages are kept
    /// as given and do not affect the outcome.
    pub fn with_outcome(
        suite: impl Into<String>,
        name: impl Into<String>,
        outcome: Outcome,
        msgs: Vec<Msg>,
        started: DateTime<Utc>,
        dur: Duration,
        subtests: Vec<TestResult>,
    ) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            msgs,
            outcome,
            started,
            dur,
            subtests,
        }
    }

    /// A test that was failed without its body ever running.
    pub fn not_run(suite: impl Into<String>, name: impl Into<String>, msgs: Vec<Msg>) -> Self {
        Self::new(suite, name, true, msgs, Utc::now(), Duration::ZERO, Vec::new())
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    pub fn is_leaf(&self) -> bool {
        self.subtests.is_empty()
    }

    /// Mark this node failed and append the messages explaining why.
    pub fn fail_with(&mut self, msgs: impl IntoIterator<Item = Msg>) {
        self.outcome = Outcome::Failed;
        self.msgs.extend(msgs);
    }

    /// Count leaves below this node. A leaf counts itself once.
    pub fn sum_test_stats(&self) -> TestStats {
        if self.is_leaf() {
            return TestStats {
                total: 1,
                passed: usize::from(self.passed()),
                failed: usize::from(self.failed()),
            };
        }
        self.subtests.iter().map(TestResult::sum_test_stats).sum()
    }

    /// Minimal set of failing nodes, none an ancestor of another.
    ///
    /// A node whose leaves all failed is reported as a whole rather than leaf
    /// by leaf. A failed node whose descendants report nothing (it failed on
    /// its own account) is reported itself.
    pub fn find_failing_tests(&self) -> Vec<&TestResult> {
        if self.passed() {
            return Vec::new();
        }
        if self.sum_test_stats().passed == 0 {
            return vec![self];
        }

        let found: Vec<&TestResult> = self
            .subtests
            .iter()
            .flat_map(TestResult::find_failing_tests)
            .collect();
        if found.is_empty() {
            vec![self]
        } else {
            found
        }
    }

    /// Depth-first search for a node by name, this node included.
    pub fn find(&self, name: &str) -> Option<&TestResult> {
        if self.name == name {
            return Some(self);
        }
        self.subtests.iter().find_map(|s| s.find(name))
    }

    /// Serialize the tree as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, outcome: Outcome) -> TestResult {
        TestResult {
            name: name.to_string(),
            outcome,
            ..Default::default()
        }
    }

    #[test]
    fn test_outcome_from_error_message() {
        let msgs = vec![Msg::info("hello"), Msg::error("boom")];
        assert_eq!(Outcome::from_parts(false, &msgs, &[]), Outcome::Failed);
        assert_eq!(Outcome::from_parts(false, &msgs[..1], &[]), Outcome::Passed);
    }

    #[test]
    fn test_outcome_from_failed_child() {
        let children = vec![leaf("a", Outcome::Passed), leaf("b", Outcome::Failed)];
        assert_eq!(Outcome::from_parts(false, &[], &children), Outcome::Failed);
    }

    #[test]
    fn test_leaf_stats() {
        assert_eq!(
            leaf("x", Outcome::Failed).sum_test_stats(),
            TestStats {
                total: 1,
                passed: 0,
                failed: 1
            }
        );
    }

    #[test]
    fn test_self_failed_parent_is_reported() {
        let parent = TestResult {
            name: "parent".to_string(),
            outcome: Outcome::Failed,
            subtests: vec![leaf("parent/a", Outcome::Passed)],
            ..Default::default()
        };

        let failing = parent.find_failing_tests();
        assert_eq!(failing.len(), 1);
        assert_eq!(failing[0].name, "parent");
    }

    #[test]
    fn test_fail_with_appends() {
        let mut node = leaf("x", Outcome::Passed);
        node.msgs.push(Msg::info("ran"));
        node.fail_with([Msg::error("after test: boom")]);

        assert!(node.failed());
        assert_eq!(node.msgs.len(), 2);
    }

    #[test]
    fn test_json_uses_result_key() {
        let json = leaf("x", Outcome::Failed).to_json().unwrap();
        assert!(json.contains("\"result\": \"failed\""));
    }
}
