//! Suites bundled with the runner.
//!
//! `fib` checks a small Fibonacci implementation, `lifecycle` exercises hooks
//! and nested subtests, and `failures` (opt-in) shows how each kind of
//! failure lands in the result tree.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trellis_engine::{each, Registry, TestingT};

/// n-th Fibonacci number, with fib(0) = 0
pub fn fib(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let (mut i, mut j) = (0u64, 1u64);
    for _ in 2..=n {
        (i, j) = (j, i + j);
    }
    j
}

/// Registry holding the bundled suites
pub fn registry(with_failures: bool) -> Registry {
    let mut registry = Registry::new();
    register_fib(&mut registry);
    register_lifecycle(&mut registry);
    if with_failures {
        register_failures(&mut registry);
    }
    registry
}

fn register_fib(registry: &mut Registry) {
    registry
        .suite("fib")
        .test("70th Fibonacci number", |t| {
            let f = fib(70);
            if f != 190_392_490_709_135 {
                t.errorf(format_args!("fib(70) = {}", f));
            }
        })
        .test("Fibonacci number", |t| {
            const EXPECTED: [u64; 11] = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
            each(t, 0..=10u64, |t, &n| {
                let f = fib(n);
                if f != EXPECTED[n as usize] {
                    t.errorf(format_args!(
                        "fib({}) = {}, want {}",
                        n, f, EXPECTED[n as usize]
                    ));
                }
            });
        });
}

/// Key/value fixture shared by the lifecycle suite's tests
type Fixture = Arc<Mutex<BTreeMap<String, i64>>>;

fn register_lifecycle(registry: &mut Registry) {
    let fixture = Fixture::default();
    let tests_run = Arc::new(AtomicUsize::new(0));

    let seed = Arc::clone(&fixture);
    let reset = Arc::clone(&fixture);
    let check = Arc::clone(&fixture);
    let teardown = Arc::clone(&fixture);
    let counted = Arc::clone(&tests_run);
    let reported = Arc::clone(&tests_run);
    let lookups = Arc::clone(&fixture);

    registry
        .suite("lifecycle")
        .before_suite(move |t| {
            let mut data = seed.lock().unwrap_or_else(|e| e.into_inner());
            data.insert("alice".to_string(), 30);
            data.insert("bob".to_string(), 25);
            t.logf(format_args!("seeded {} records", data.len()));
        })
        .before_test(move |_| {
            let mut data = reset.lock().unwrap_or_else(|e| e.into_inner());
            data.remove("scratch");
        })
        .after_test(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            let data = check.lock().unwrap_or_else(|e| e.into_inner());
            if data.len() > 3 {
                panic!("test left {} records behind", data.len());
            }
        })
        .after_suite(move |t| {
            teardown.lock().unwrap_or_else(|e| e.into_inner()).clear();
            t.logf(format_args!("{} tests finished", reported.load(Ordering::SeqCst)));
        })
        .test("lookups", move |t| {
            for name in ["alice", "bob"] {
                let data = Arc::clone(&lookups);
                t.subtest(name, move |t| {
                    let age = data
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .get(t_key(t))
                        .copied();
                    match age {
                        Some(age) => t.logf(format_args!("age {}", age)),
                        None => t.fatal("record missing"),
                    }
                });
            }
        })
        .test("scratch writes", {
            let fixture = Arc::clone(&fixture);
            move |t: &mut dyn TestingT| {
                fixture
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert("scratch".to_string(), 1);
                nested(t, 3);
            }
        });
}

/// Last path segment of the running test's name
fn t_key<'a>(t: &'a dyn TestingT) -> &'a str {
    t.name().rsplit('/').next().unwrap_or_default()
}

/// Spawn a chain of `depth` nested subtests.
fn nested(t: &mut dyn TestingT, depth: usize) {
    if depth == 0 {
        t.log("reached the bottom");
        return;
    }
    t.subtest(&format!("level {}", depth), move |t| nested(t, depth - 1));
}

fn register_failures(registry: &mut Registry) {
    registry
        .suite("failures")
        .after_test(|t| {
            if t.name().starts_with("teardown") {
                panic!("temporary directory still exists");
            }
        })
        .test("assertion", |t| {
            t.log("comparing");
            t.errorf(format_args!("expected {}, got {}", 4, 5));
        })
        .test("fail now", |t| {
            t.subtest("stops early", |t| {
                t.fatal("cannot continue");
            });
            t.subtest("keeps going", |t| t.log("sibling still ran"));
        })
        .test("panic", |t| {
            let ports: Vec<u16> = Vec::new();
            t.log("binding");
            t.logf(format_args!("listening on {}", ports[0]));
        })
        .test("teardown leak", |t| t.log("body passed"));
}
