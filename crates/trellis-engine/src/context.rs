//! Execution context handed to tests and hooks.

use crate::rendezvous::{RendezvousClient, SubtestRequest};
use crate::result::Msg;
use crate::sanitize::sanitize_name;
use crate::unwind;
use std::fmt;
use std::sync::Arc;

/// What a test or hook can do to the run while it executes.
///
/// Tests report failure through this object, never through a return value.
/// Hooks report failure by panicking; `fail`/`error` calls made from a hook
/// only contribute messages.
pub trait TestingT {
    /// Mark the current test failed and keep going.
    fn fail(&mut self);

    /// Mark the current test failed and stop it immediately.
    ///
    /// Only the current test's body is unwound; drops in its scope still run.
    fn fail_now(&mut self) -> !;

    /// Whether the current test has been marked failed.
    fn failed(&self) -> bool;

    /// Record an info-level message.
    fn log(&mut self, msg: &str);

    /// Record an error-level message and mark the test failed.
    fn error(&mut self, msg: &str);

    /// Sanitized display name of the current test.
    fn name(&self) -> &str;

    /// Run `tester` as a named subtest and wait for it. Returns whether it passed.
    fn run(&mut self, name: &str, tester: Tester) -> bool;

    /// Record an error-level message and stop the test.
    fn fatal(&mut self, msg: &str) -> ! {
        self.error(msg);
        self.fail_now()
    }

    fn logf(&mut self, args: fmt::Arguments<'_>) {
        self.log(&args.to_string());
    }

    fn errorf(&mut self, args: fmt::Arguments<'_>) {
        self.error(&args.to_string());
    }

    fn fatalf(&mut self, args: fmt::Arguments<'_>) -> ! {
        self.fatal(&args.to_string())
    }
}

impl dyn TestingT + '_ {
    /// Closure-friendly form of [`TestingT::run`].
    pub fn subtest<F>(&mut self, name: &str, f: F) -> bool
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.run(name, Tester::new(f))
    }
}

/// A test body or hook
#[derive(Clone)]
pub struct Tester(Arc<dyn Fn(&mut dyn TestingT) + Send + Sync>);

impl Tester {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, t: &mut dyn TestingT) {
        (self.0)(t)
    }
}

impl fmt::Debug for Tester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tester(..)")
    }
}

/// The engine's [`TestingT`].
///
/// Test contexts carry the client half of a subtest rendezvous; hook contexts
/// do not, and cannot spawn subtests or use `fail_now`.
pub struct TestContext {
    name: String,
    failed: bool,
    msgs: Vec<Msg>,
    rendezvous: Option<RendezvousClient>,
}

impl TestContext {
    pub(crate) fn for_test(name: String, rendezvous: RendezvousClient) -> Self {
        Self {
            name,
            failed: false,
            msgs: Vec::new(),
            rendezvous: Some(rendezvous),
        }
    }

    pub(crate) fn for_hook(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failed: false,
            msgs: Vec::new(),
            rendezvous: None,
        }
    }

    /// Run a test body, converting panics into error messages. The subtest
    /// channel is closed once the body is done, however it finished.
    pub(crate) fn run_body(&mut self, tester: &Tester) {
        match unwind::catch(|| tester.call(self)) {
            unwind::Unwound::Completed | unwind::Unwound::Aborted => {}
            unwind::Unwound::Panicked(msg) => self.error(&format!("panic: {}", msg)),
        }
        self.rendezvous = None;
    }

    pub(crate) fn is_marked_failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn into_msgs(self) -> Vec<Msg> {
        self.msgs
    }

    pub fn msgs(&self) -> &[Msg] {
        &self.msgs
    }
}

impl TestingT for TestContext {
    fn fail(&mut self) {
        self.failed = true;
    }

    fn fail_now(&mut self) -> ! {
        self.fail();
        if self.rendezvous.is_some() {
            unwind::abort()
        } else {
            panic!("fail_now called from a before/after hook in {}", self.name)
        }
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
        let Some(rendezvous) = self.rendezvous.as_ref() else {
            panic!(
                "cannot run subtest {:?} from {}: subtests can only be run from tests, not before/after hooks",
                name, self.name
            );
        };

        let request = SubtestRequest {
            name: sanitize_name(name),
            tester,
        };
        match rendezvous.request(request) {
            Ok(passed) => passed,
            Err(e) => {
                self.error(&format!("subtest {}: {}", name, e));
                false
            }
        }
    }
}
