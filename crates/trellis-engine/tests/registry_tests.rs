//! Registration misuse

use trellis_engine::{HookKind, Registry};

#[test]
#[should_panic(expected = "test same already exists in suite pkg")]
fn test_duplicate_test_name_panics() {
    let mut registry = Registry::new();
    registry.register_test("pkg", "same", |_| {});
    registry.register_test("pkg", "same", |_| {});
}

#[test]
#[should_panic(expected = "test a_b already exists in suite pkg")]
fn test_names_colliding_after_sanitizing_panic() {
    let mut registry = Registry::new();
    registry.suite("pkg").test("a/b", |_| {}).test("a\\b", |_| {});
}

#[test]
#[should_panic(expected = "before suite hook already registered for suite pkg")]
fn test_duplicate_before_suite_panics() {
    let mut registry = Registry::new();
    registry.suite("pkg").before_suite(|_| {}).before_suite(|_| {});
}

#[test]
#[should_panic(expected = "after suite hook already registered for suite pkg")]
fn test_duplicate_after_suite_panics() {
    let mut registry = Registry::new();
    registry.register_hook("pkg", HookKind::AfterSuite, |_| {});
    registry.register_hook("pkg", HookKind::AfterSuite, |_| {});
}

#[test]
fn test_each_hook_kind_once_per_suite() {
    let mut registry = Registry::new();
    registry
        .suite("pkg")
        .before_suite(|_| {})
        .after_suite(|_| {})
        .before_test(|_| {})
        .after_test(|_| {});
    registry.suite("other").before_suite(|_| {});

    let suite = registry.get("pkg").unwrap();
    for kind in [
        HookKind::BeforeSuite,
        HookKind::AfterSuite,
        HookKind::BeforeTest,
        HookKind::AfterTest,
    ] {
        assert!(suite.hook(kind).is_some(), "{} missing", kind);
    }
    assert!(suite.is_empty());
}
