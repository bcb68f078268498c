//! Running a registry under another test runner.
//!
//! Instead of building a result tree, [`run_under_host`] hands each test to a
//! [`HostFramework`], which reports failures its own way. Hook ordering is the
//! same as [`Engine::run`](crate::engine::Engine::run), but hook panics are
//! not turned into result messages. A before-test or body panic is re-raised
//! into the host once after-test has run. A suite hook panic is re-raised to
//! the caller once the suite is done.

use crate::context::{Tester, TestingT};
use crate::registry::{HookKind, Registry, Suite};
use crate::result::Msg;
use crate::sanitize::sanitize_name;
use crate::unwind::{self, Unwound};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// An external test runner
pub trait HostFramework {
    /// Context handed to before-suite and after-suite hooks.
    fn context(&mut self) -> &mut dyn TestingT;

    /// Run `f` as a named test of the host and return whether it passed.
    fn run(&mut self, name: &str, f: &mut dyn FnMut(&mut dyn TestingT)) -> bool;
}

/// Run every suite in `registry` under `host`.
///
/// # Panics
/// Re-raises a before-suite panic (or, failing that, an after-suite panic)
/// after the suite that raised it has finished. Suites after it do not run.
pub fn run_under_host(registry: &Registry, host: &mut dyn HostFramework) {
    for suite in registry.suites() {
        log::debug!("suite {} starting under host", suite.id());
        let before = suite
            .hook(HookKind::BeforeSuite)
            .and_then(|hook| call_held(HookKind::BeforeSuite, hook, host.context()));

        if before.is_none() {
            run_tests(suite, host);
        }

        let after = suite
            .hook(HookKind::AfterSuite)
            .and_then(|hook| call_held(HookKind::AfterSuite, hook, host.context()));

        if let Some(msg) = before.or(after) {
            panic!("{}", msg);
        }
    }
}

fn run_tests(suite: &Suite, host: &mut dyn HostFramework) {
    let before_test = suite.hook(HookKind::BeforeTest);
    let after_test = suite.hook(HookKind::AfterTest);

    for case in suite.tests() {
        host.run(case.name(), &mut |t| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                if let Some(hook) = before_test {
                    hook.call(t);
                }
                case.tester().call(t);
            }));
            if let Some(hook) = after_test {
                hook.call(t);
            }
            if let Err(payload) = outcome {
                panic::resume_unwind(payload);
            }
        });
    }
}

/// Call a suite hook, returning its formatted panic instead of unwinding.
fn call_held(kind: HookKind, hook: &Tester, t: &mut dyn TestingT) -> Option<String> {
    match unwind::catch(|| hook.call(t)) {
        Unwound::Completed => None,
        Unwound::Aborted => Some(format!("{}: fail_now", kind)),
        Unwound::Panicked(msg) => {
            log::warn!("{} hook panicked: {}", kind, msg);
            Some(format!("{}: {}", kind, msg))
        }
    }
}

/// Host that runs everything on the calling thread and prints go-test style
/// `--- PASS` / `--- FAIL` lines.
///
/// Intended for driving a registry from a single `#[test]` function:
///
/// ```no_run
/// # use trellis_engine::{host::LibtestHost, Registry};
/// # let registry = Registry::new();
/// let mut host = LibtestHost::new();
/// trellis_engine::run_under_host(&registry, &mut host);
/// host.finish();
/// ```
pub struct LibtestHost {
    suite: HostContext,
    failures: Vec<String>,
    passed: usize,
}

impl LibtestHost {
    pub fn new() -> Self {
        Self {
            suite: HostContext::new("suite hooks".to_string(), 0),
            failures: Vec::new(),
            passed: 0,
        }
    }

    /// Names of failed host tests, in run order
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    /// # Panics
    /// Panics listing the failed tests if any test, or a suite hook via its
    /// context, failed.
    pub fn finish(self) {
        let mut failures = self.failures;
        if self.suite.failed {
            failures.push(self.suite.name);
        }
        if !failures.is_empty() {
            panic!("{} test(s) failed: {}", failures.len(), failures.join(", "));
        }
    }
}

impl Default for LibtestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostFramework for LibtestHost {
    fn context(&mut self) -> &mut dyn TestingT {
        &mut self.suite
    }

    fn run(&mut self, name: &str, f: &mut dyn FnMut(&mut dyn TestingT)) -> bool {
        let mut ctx = HostContext::new(sanitize_name(name), 0);
        let passed = ctx.run_reported(f);
        if passed {
            self.passed += 1;
        } else {
            self.failures.push(ctx.name);
        }
        passed
    }
}

/// [`TestingT`] used by [`LibtestHost`]. Subtests run inline and are
/// reported indented under their parent.
#[derive(Default)]
struct HostContext {
    name: String,
    depth: usize,
    failed: bool,
    msgs: Vec<Msg>,
}

impl HostContext {
    fn new(name: String, depth: usize) -> Self {
        Self {
            name,
            depth,
            ..Default::default()
        }
    }

    fn run_reported(&mut self, f: &mut dyn FnMut(&mut dyn TestingT)) -> bool {
        let start = Instant::now();
        if let Unwound::Panicked(msg) = unwind::catch(|| f(&mut *self)) {
            self.error(&format!("panic: {}", msg));
        }

        let indent = "    ".repeat(self.depth);
        let status = if self.failed { "FAIL" } else { "PASS" };
        println!(
            "{}--- {}: {} ({:.2}s)",
            indent,
            status,
            self.name,
            start.elapsed().as_secs_f64()
        );
        for msg in &self.msgs {
            println!("{}    {}", indent, msg.text);
        }
        !self.failed
    }
}

impl TestingT for HostContext {
    fn fail(&mut self) {
        self.failed = true;
    }

    fn fail_now(&mut self) -> ! {
        self.fail();
        unwind::abort()
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn log(&mut self, msg: &str) {
        self.msgs.push(Msg::info(msg));
    }

    fn error(&mut self, msg: &str) {
        self.msgs.push(Msg::error(msg));
        self.fail();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, name: &str, tester: Tester) -> bool {
        let mut child = HostContext::new(
            format!("{}/{}", self.name, sanitize_name(name)),
            self.depth + 1,
        );
        let passed = child.run_reported(&mut |t| tester.call(t));
        if !passed {
            self.fail();
        }
        passed
    }
}
