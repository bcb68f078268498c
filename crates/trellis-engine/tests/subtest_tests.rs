//! Subtest rendezvous, fail_now and panic containment

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use trellis_engine::{Registry, TestResult};

fn run_single<F>(f: F) -> TestResult
where
    F: Fn(&mut dyn trellis_engine::TestingT) + Send + Sync + 'static,
{
    let mut registry = Registry::new();
    registry.register_test("pkg", "parent", f);
    let mut root = registry.run();
    let mut suite = root.subtests.remove(0);
    suite.subtests.remove(0)
}

fn names(result: &TestResult) -> Vec<&str> {
    result.subtests.iter().map(|s| s.name.as_str()).collect()
}

// ============================================================================
// Rendezvous
// ============================================================================

#[test]
fn test_failing_subtest_fails_parent() {
    let result = run_single(|t| {
        t.subtest("child", |t| t.error("child broke"));
    });

    assert!(result.failed());
    assert!(result.msgs.is_empty());
    assert!(result.subtests[0].failed());
}

#[test]
fn test_run_reports_child_outcome() {
    let result = run_single(|t| {
        let ok = t.subtest("ok", |_| {});
        let bad = t.subtest("bad", |t| t.fail());
        t.logf(format_args!("ok={} bad={}", ok, bad));
    });

    assert_eq!(result.msgs[0].text, "ok=true bad=false");
}

#[test]
fn test_subtests_recorded_in_call_order() {
    let result = run_single(|t| {
        for name in ["zeta", "alpha", "mid"] {
            t.subtest(name, |_| {});
        }
    });

    assert_eq!(names(&result), vec!["parent/zeta", "parent/alpha", "parent/mid"]);
}

#[test]
fn test_nested_subtests() {
    let result = run_single(|t| {
        t.subtest("a", |t| {
            t.subtest("b", |t| {
                t.subtest("c", |t| t.log("deep"));
            });
        });
    });

    let c = result.find("parent/a/b/c").unwrap();
    assert_eq!(c.msgs[0].text, "deep");
    assert_eq!(result.sum_test_stats().total, 1);
    assert!(result.passed());
}

#[test]
fn test_subtest_names_are_sanitized() {
    let result = run_single(|t| {
        t.subtest("with/slash", |_| {});
        t.subtest("tab\there", |_| {});
    });

    assert_eq!(names(&result), vec!["parent/with_slash", "parent/tab here"]);
}

#[test]
fn test_context_name_is_full_path() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    run_single(move |t| {
        sink.lock().unwrap().push(t.name().to_string());
        let sink = Arc::clone(&sink);
        t.subtest("child", move |t| sink.lock().unwrap().push(t.name().to_string()));
    });

    assert_eq!(*seen.lock().unwrap(), vec!["parent", "parent/child"]);
}

#[test]
fn test_parent_blocks_until_child_done() {
    let child_done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&child_done);
    let result = run_single(move |t| {
        let flag_in_child = Arc::clone(&flag);
        t.subtest("slow", move |_| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            flag_in_child.store(true, Ordering::SeqCst);
        });
        if !flag.load(Ordering::SeqCst) {
            t.error("returned before child finished");
        }
    });

    assert!(result.passed(), "{:?}", result.msgs);
    assert!(child_done.load(Ordering::SeqCst));
}

// ============================================================================
// fail_now and panics
// ============================================================================

#[test]
fn test_fail_now_stops_body_and_runs_drops() {
    struct Cleanup(Arc<AtomicBool>);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let cleaned = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cleaned);
    let result = run_single(move |t| {
        let _guard = Cleanup(Arc::clone(&flag));
        t.log("before");
        if !t.failed() {
            t.fail_now();
        }
        t.log("after");
    });

    assert!(result.failed());
    let texts: Vec<_> = result.msgs.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["before"]);
    assert!(cleaned.load(Ordering::SeqCst));
}

#[test]
fn test_fail_now_in_child_leaves_parent_running() {
    let result = run_single(|t| {
        t.subtest("stops", |t| {
            if !t.failed() {
                t.fatalf(format_args!("stopping at {}", 1));
            }
            t.log("unreachable");
        });
        t.log("parent continues");
        t.subtest("sibling", |_| {});
    });

    assert_eq!(names(&result), vec!["parent/stops", "parent/sibling"]);
    let stops = &result.subtests[0];
    assert_eq!(stops.msgs.len(), 1);
    assert_eq!(stops.msgs[0].text, "stopping at 1");
    assert!(result.subtests[1].passed());
    assert_eq!(result.msgs[0].text, "parent continues");
}

#[test]
fn test_panic_in_subtest_is_contained() {
    let result = run_single(|t| {
        t.subtest("explodes", |_| panic!("index out of range"));
        t.log("still running");
    });

    let child = &result.subtests[0];
    assert!(child.failed());
    assert_eq!(child.msgs[0].text, "panic: index out of range");
    assert_eq!(result.msgs[0].text, "still running");
}

#[test]
fn test_panic_after_subtests_keeps_children() {
    let result = run_single(|t| {
        t.subtest("first", |_| {});
        panic!("late failure");
    });

    assert!(result.failed());
    assert_eq!(result.subtests.len(), 1);
    assert!(result.subtests[0].passed());
    assert_eq!(result.msgs[0].text, "panic: late failure");
}

#[test]
fn test_duration_covers_subtests() {
    let result = run_single(|t| {
        t.subtest("sleepy", |_| std::thread::sleep(std::time::Duration::from_millis(15)));
    });

    assert!(result.dur >= result.subtests[0].dur);
    assert!(result.dur >= std::time::Duration::from_millis(15));
}
