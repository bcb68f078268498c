//! Process-wide registry for code that registers from many places.
//!
//! Everything here forwards to one lazily created [`Registry`] behind a mutex.
//! Code that can pass a registry around should use [`Registry`] directly.

use crate::context::{Tester, TestingT};
use crate::engine::{Engine, EngineConfig};
use crate::registry::{HookKind, Registry};
use crate::result::TestResult;
use std::sync::{Mutex, MutexGuard, OnceLock};

static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();

fn lock() -> MutexGuard<'static, Registry> {
    let registry = REGISTRY.get_or_init(|| Mutex::new(Registry::new()));
    // A panic while holding the lock cannot leave the registry half-written:
    // every mutation is a single map insert.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Register a test in the process-wide registry.
///
/// # Panics
/// Panics if the suite already has a test with the same sanitized name.
pub fn register_test<F>(suite_id: &str, name: &str, f: F)
where
    F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
{
    let result = lock().try_register_test(suite_id, name, Tester::new(f));
    if let Err(e) = result {
        panic!("{}", e);
    }
}

fn register_hook<F>(suite_id: &str, kind: HookKind, f: F)
where
    F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
{
    let result = lock().try_register_hook(suite_id, kind, Tester::new(f));
    if let Err(e) = result {
        panic!("{}", e);
    }
}

pub fn before_suite<F>(suite_id: &str, f: F)
where
    F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
{
    register_hook(suite_id, HookKind::BeforeSuite, f);
}

pub fn after_suite<F>(suite_id: &str, f: F)
where
    F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
{
    register_hook(suite_id, HookKind::AfterSuite, f);
}

pub fn before_test<F>(suite_id: &str, f: F)
where
    F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
{
    register_hook(suite_id, HookKind::BeforeTest, f);
}

pub fn after_test<F>(suite_id: &str, f: F)
where
    F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
{
    register_hook(suite_id, HookKind::AfterTest, f);
}

/// Copy of everything registered so far.
pub fn snapshot() -> Registry {
    lock().clone()
}

/// Run everything registered so far with the default engine settings.
pub fn run() -> TestResult {
    run_with(EngineConfig::default())
}

/// Run everything registered so far. Registration is not blocked while the
/// run is in progress; late registrations are picked up by the next run.
pub fn run_with(config: EngineConfig) -> TestResult {
    let registry = snapshot();
    Engine::new(config).run(&registry)
}

/// Drop every registration.
pub fn reset() {
    *lock() = Registry::new();
}
