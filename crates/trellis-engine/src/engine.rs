//! Execution engine.
//!
//! Per suite: before-suite, then each test in name order (wrapped in
//! before-test/after-test), then after-suite. Every test body, subtest body
//! and hook runs on its own thread so that a panic or `fail_now` only unwinds
//! that unit. Nothing a test or hook does escapes the suite loop.

use crate::context::{TestContext, Tester};
use crate::registry::{HookKind, Registry, Suite, TestCase};
use crate::rendezvous;
use crate::sanitize::sanitize_name;
use crate::result::{Msg, Outcome, TestResult};
use crate::unwind::{self, Unwound};
use chrono::Utc;
use rayon::prelude::*;
use std::thread;
use std::time::Instant;
use trellis_config::Config;

/// Engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of suites run at the same time. 1 runs suites one after another.
    pub suite_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suite_concurrency: 1,
        }
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            suite_concurrency: config.suite_concurrency(),
        }
    }
}

/// Runs registered suites and builds the result tree
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every suite in `registry`.
    ///
    /// Returns a synthetic root whose children are one node per suite, in
    /// suite-identifier order regardless of how many suites ran at once.
    pub fn run(&self, registry: &Registry) -> TestResult {
        let started = Utc::now();
        let start = Instant::now();

        let suites: Vec<&Suite> = registry.suites().collect();
        log::info!(
            "running {} tests in {} suites",
            registry.test_count(),
            suites.len()
        );
        let results = self.run_suites(&suites);

        TestResult::new(
            "",
            "",
            false,
            Vec::new(),
            started,
            start.elapsed(),
            results,
        )
    }

    fn run_suites(&self, suites: &[&Suite]) -> Vec<TestResult> {
        let workers = self.config.suite_concurrency.max(1);
        if workers == 1 || suites.len() < 2 {
            return suites.iter().map(|suite| run_suite(suite)).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("trellis-suite-{}", i))
            .build()
        {
            Ok(pool) => pool.install(|| suites.par_iter().map(|suite| run_suite(suite)).collect()),
            Err(e) => {
                log::warn!("could not start suite pool, running suites sequentially: {}", e);
                suites.iter().map(|suite| run_suite(suite)).collect()
            }
        }
    }
}

/// Messages from one hook invocation, and whether it panicked
struct HookRun {
    msgs: Vec<Msg>,
    failed: bool,
}

fn run_suite(suite: &Suite) -> TestResult {
    let started = Utc::now();
    let start = Instant::now();
    log::debug!("suite {} starting", suite.id());

    let mut suite_msgs = Vec::new();

    let before_suite = suite
        .hook(HookKind::BeforeSuite)
        .map(|hook| run_hook(HookKind::BeforeSuite, hook, suite.id()));
    let before_suite_failure = match before_suite {
        Some(run) if run.failed => {
            suite_msgs.extend(run.msgs.iter().cloned());
            Some(run.msgs)
        }
        Some(run) => {
            suite_msgs.extend(run.msgs);
            None
        }
        None => None,
    };

    let mut tests: Vec<TestResult> = suite
        .tests()
        .map(|case| match &before_suite_failure {
            Some(msgs) => TestResult::not_run(suite.id(), case.name(), msgs.clone()),
            None => run_case(suite, case),
        })
        .collect();

    let mut after_suite_failed = false;
    if let Some(hook) = suite.hook(HookKind::AfterSuite) {
        let run = run_hook(HookKind::AfterSuite, hook, suite.id());
        // A before-suite failure already failed every test; it keeps the attribution.
        if run.failed && before_suite_failure.is_none() {
            for test in &mut tests {
                test.fail_with(run.msgs.iter().cloned());
            }
        }
        after_suite_failed = run.failed;
        suite_msgs.extend(run.msgs);
    }

    // Hook messages are kept on the suite node but only tests decide its
    // outcome. A suite without tests fails only if one of its hooks panicked.
    let hook_failed = before_suite_failure.is_some() || after_suite_failed;
    let test_failed = tests.iter().any(TestResult::failed);
    let outcome = if test_failed || (tests.is_empty() && hook_failed) {
        Outcome::Failed
    } else {
        Outcome::Passed
    };

    let result = TestResult::with_outcome(
        suite.id(),
        suite.id(),
        outcome,
        suite_msgs,
        started,
        start.elapsed(),
        tests,
    );
    log::debug!("suite {} {} in {:.2?}", suite.id(), result.outcome, result.dur);
    result
}

/// Run one top-level test between its before-test and after-test hooks.
///
/// Messages from a hook that completed are attached to the test at info
/// level. A failing hook's messages keep their level and fail the test.
fn run_case(suite: &Suite, case: &TestCase) -> TestResult {
    let before_test = suite
        .hook(HookKind::BeforeTest)
        .map(|hook| run_hook(HookKind::BeforeTest, hook, case.name()));

    let mut result = match before_test {
        Some(run) if run.failed => TestResult::not_run(suite.id(), case.name(), run.msgs),
        Some(run) => {
            let mut result = run_test(suite.id(), case.name().to_string(), case.tester());
            let mut msgs: Vec<Msg> = as_info(run.msgs).collect();
            msgs.append(&mut result.msgs);
            result.msgs = msgs;
            result
        }
        None => run_test(suite.id(), case.name().to_string(), case.tester()),
    };

    if let Some(hook) = suite.hook(HookKind::AfterTest) {
        let run = run_hook(HookKind::AfterTest, hook, case.name());
        if run.failed {
            result.fail_with(run.msgs);
        } else {
            result.msgs.extend(as_info(run.msgs));
        }
    }

    result
}

/// Hook messages as informational notes on a test that did not fail because of them.
fn as_info(msgs: Vec<Msg>) -> impl Iterator<Item = Msg> {
    msgs.into_iter().map(|msg| Msg::info(msg.text))
}

/// Run one hook invocation on its own thread with a fresh hook context.
fn run_hook(kind: HookKind, hook: &Tester, scope: &str) -> HookRun {
    let mut ctx = TestContext::for_hook(format!("{} ({})", scope, kind));

    let outcome = thread::scope(|s| {
        let handle = thread::Builder::new()
            .name(format!("{}: {}", kind, sanitize_name(scope)))
            .spawn_scoped(s, || unwind::catch(|| hook.call(&mut ctx)));
        match handle {
            Ok(handle) => handle
                .join()
                .unwrap_or_else(|payload| Unwound::Panicked(unwind::panic_message(payload.as_ref()))),
            Err(e) => Unwound::Panicked(format!("could not start hook thread: {}", e)),
        }
    });

    let mut msgs = ctx.into_msgs();
    let failed = match outcome {
        Unwound::Completed => false,
        Unwound::Aborted => {
            msgs.push(Msg::error(format!("{}: fail_now", kind)));
            true
        }
        Unwound::Panicked(msg) => {
            msgs.push(Msg::error(format!("{}: {}", kind, msg)));
            true
        }
    };
    if failed {
        log::warn!("{} hook failed for {}", kind, scope);
    }

    HookRun { msgs, failed }
}

/// Run a test or subtest body and every subtest it requests.
///
/// The body runs on one thread while a supervising thread services its
/// subtest requests, running each child through this same function. The
/// result is assembled once the body has returned (normally, via `fail_now`,
/// or by panicking) and every requested subtest has a result.
pub(crate) fn run_test(suite: &str, name: String, tester: &Tester) -> TestResult {
    log::debug!("test {} starting", name);
    let (client, server) = rendezvous::channel();
    let mut ctx = TestContext::for_test(name.clone(), client);

    let started = Utc::now();
    let start = Instant::now();

    let parent = name.as_str();
    let (body, subtests) = thread::scope(|s| {
        // Dropping either closure unspawned drops its rendezvous half, so the
        // other side never waits forever.
        let supervisor = thread::Builder::new()
            .name(format!("{} (subtests)", parent))
            .spawn_scoped(s, move || {
                server.serve(|request| {
                    let child = format!("{}/{}", parent, request.name);
                    run_test(suite, child, &request.tester)
                })
            });
        let body = thread::Builder::new()
            .name(parent.to_string())
            .spawn_scoped(s, move || {
                ctx.run_body(tester);
                ctx
            });

        let body = match body {
            Ok(handle) => handle
                .join()
                .map_err(|payload| unwind::panic_message(payload.as_ref())),
            Err(e) => Err(format!("could not start test thread: {}", e)),
        };
        let subtests = match supervisor {
            Ok(handle) => handle
                .join()
                .map_err(|payload| unwind::panic_message(payload.as_ref())),
            Err(e) => Err(format!("could not start subtest supervisor: {}", e)),
        };
        (body, subtests)
    });
    let dur = start.elapsed();

    let (mut failed, mut msgs) = match body {
        Ok(ctx) => (ctx.is_marked_failed(), ctx.into_msgs()),
        Err(reason) => (true, vec![Msg::error(reason)]),
    };
    let subtests = subtests.unwrap_or_else(|reason| {
        failed = true;
        msgs.push(Msg::error(reason));
        Vec::new()
    });

    let result = TestResult::new(suite, name, failed, msgs, started, dur, subtests);
    log::debug!("test {} {} in {:.2?}", result.name, result.outcome, dur);
    result
}
