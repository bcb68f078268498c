//! Aggregation over result trees

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::{fixture, rstest};
use trellis_engine::{Msg, Outcome, TestResult, TestStats};

fn node(name: &str, outcome: Outcome, subtests: Vec<TestResult>) -> TestResult {
    TestResult {
        name: name.to_string(),
        outcome,
        subtests,
        ..Default::default()
    }
}

fn leaf(name: &str, outcome: Outcome) -> TestResult {
    node(name, outcome, Vec::new())
}

#[fixture]
fn canonical() -> TestResult {
    use Outcome::{Failed, Passed};
    node(
        "root",
        Failed,
        vec![
            node(
                "tree 1",
                Failed,
                vec![leaf("tree 1 leaf 1", Failed), leaf("tree 1 leaf 2", Passed)],
            ),
            node(
                "tree 2",
                Failed,
                vec![
                    node(
                        "tree 2 intermediate 1",
                        Failed,
                        vec![
                            leaf("tree 2 intermediate 1 leaf 1", Failed),
                            leaf("tree 2 intermediate 1 leaf 2", Failed),
                        ],
                    ),
                    node(
                        "tree 2 intermediate 2",
                        Passed,
                        vec![
                            leaf("tree 2 intermediate 2 leaf 1", Passed),
                            leaf("tree 2 intermediate 2 leaf 2", Passed),
                        ],
                    ),
                ],
            ),
            leaf("tree 3", Passed),
            leaf("tree 4", Failed),
            node(
                "tree 5",
                Passed,
                vec![leaf("tree 5 leaf 1", Passed), leaf("tree 5 leaf 2", Passed)],
            ),
        ],
    )
}

fn stats(total: usize, passed: usize, failed: usize) -> TestStats {
    TestStats {
        total,
        passed,
        failed,
    }
}

// ============================================================================
// Canonical Tree
// ============================================================================

#[rstest]
#[case::full_tree("root", stats(10, 6, 4))]
#[case::tree_2("tree 2", stats(4, 2, 2))]
#[case::tree_3("tree 3", stats(1, 1, 0))]
#[case::tree_4("tree 4", stats(1, 0, 1))]
fn test_sum_test_stats(canonical: TestResult, #[case] name: &str, #[case] expected: TestStats) {
    assert_eq!(canonical.find(name).unwrap().sum_test_stats(), expected);
}

#[rstest]
#[case::full_tree("root", &["tree 1 leaf 1", "tree 2 intermediate 1", "tree 4"])]
#[case::tree_3("tree 3", &[])]
#[case::tree_4("tree 4", &["tree 4"])]
#[case::tree_5("tree 5", &[])]
#[case::all_leaves_failed("tree 2 intermediate 1", &["tree 2 intermediate 1"])]
fn test_find_failing_tests(canonical: TestResult, #[case] name: &str, #[case] expected: &[&str]) {
    let mut found: Vec<&str> = canonical
        .find(name)
        .unwrap()
        .find_failing_tests()
        .into_iter()
        .map(|r| r.name.as_str())
        .collect();
    found.sort_unstable();
    assert_eq!(found, expected);
}

#[rstest]
fn test_json_round_trip(canonical: TestResult) {
    let json = canonical.to_json().unwrap();
    let parsed: TestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, canonical);
}

#[test]
fn test_error_message_fails_node() {
    let result = TestResult::new(
        "pkg",
        "t",
        false,
        vec![Msg::error("x")],
        Default::default(),
        Default::default(),
        Vec::new(),
    );
    assert!(result.failed());
}

// ============================================================================
// Properties
// ============================================================================

/// Trees built the way the engine builds them: a node fails if it was marked
/// failed or any child failed.
fn arb_tree() -> impl Strategy<Value = TestResult> {
    let leaf = any::<bool>().prop_map(|failed| {
        TestResult::new("s", "leaf", failed, Vec::new(), Default::default(), Default::default(), Vec::new())
    });
    leaf.prop_recursive(4, 64, 5, |inner| {
        (any::<bool>(), prop::collection::vec(inner, 1..5)).prop_map(|(failed, children)| {
            TestResult::new("s", "node", failed, Vec::new(), Default::default(), Default::default(), children)
        })
    })
}

fn is_ancestor(ancestor: &TestResult, node: &TestResult) -> bool {
    ancestor
        .subtests
        .iter()
        .any(|child| std::ptr::eq(child, node) || is_ancestor(child, node))
}

proptest! {
    #[test]
    fn prop_stats_partition_total(tree in arb_tree()) {
        fn check(node: &TestResult) -> Result<(), TestCaseError> {
            let s = node.sum_test_stats();
            prop_assert_eq!(s.total, s.passed + s.failed);
            prop_assert!(s.total >= 1);
            for child in &node.subtests {
                check(child)?;
            }
            Ok(())
        }
        check(&tree)?;
    }

    #[test]
    fn prop_failing_set_is_minimal(tree in arb_tree()) {
        let failing = tree.find_failing_tests();
        prop_assert_eq!(failing.is_empty(), tree.passed());
        for (i, a) in failing.iter().enumerate() {
            prop_assert!(a.failed());
            for (j, b) in failing.iter().enumerate() {
                if i != j {
                    prop_assert!(!is_ancestor(a, b));
                }
            }
        }
    }
}
