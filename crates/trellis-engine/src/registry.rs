//! Suite and test registration.
//!
//! Suites are keyed by an identifier chosen by the caller (typically a module
//! path) and created on first use. Tests within a suite are keyed by their
//! sanitized name. Both maps iterate in lexicographic order, which is the
//! order the engine runs them in.

use crate::context::{Tester, TestingT};
use crate::engine::Engine;
use crate::error::{RegistryError, RegistryResult};
use crate::result::TestResult;
use crate::sanitize::sanitize_name;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle hook slots available on a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeSuite,
    AfterSuite,
    BeforeTest,
    AfterTest,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::BeforeSuite => "before suite",
            HookKind::AfterSuite => "after suite",
            HookKind::BeforeTest => "before test",
            HookKind::AfterTest => "after test",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered test
#[derive(Debug, Clone)]
pub struct TestCase {
    suite: String,
    name: String,
    tester: Tester,
}

impl TestCase {
    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tester(&self) -> &Tester {
        &self.tester
    }
}

/// A named group of tests sharing lifecycle hooks
#[derive(Debug, Clone, Default)]
pub struct Suite {
    id: String,
    tests: BTreeMap<String, TestCase>,
    before_suite: Option<Tester>,
    after_suite: Option<Tester>,
    before_test: Option<Tester>,
    after_test: Option<Tester>,
}

impl Suite {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tests in lexicographic order of their sanitized names
    pub fn tests(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.values()
    }

    pub fn test(&self, name: &str) -> Option<&TestCase> {
        self.tests.get(name)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn hook(&self, kind: HookKind) -> Option<&Tester> {
        self.slot(kind).as_ref()
    }

    fn slot(&self, kind: HookKind) -> &Option<Tester> {
        match kind {
            HookKind::BeforeSuite => &self.before_suite,
            HookKind::AfterSuite => &self.after_suite,
            HookKind::BeforeTest => &self.before_test,
            HookKind::AfterTest => &self.after_test,
        }
    }

    fn slot_mut(&mut self, kind: HookKind) -> &mut Option<Tester> {
        match kind {
            HookKind::BeforeSuite => &mut self.before_suite,
            HookKind::AfterSuite => &mut self.after_suite,
            HookKind::BeforeTest => &mut self.before_test,
            HookKind::AfterTest => &mut self.after_test,
        }
    }
}

/// Table of every registered suite.
///
/// Mutated during registration only; [`Engine::run`] reads it. Cloning is
/// cheap since testers are reference counted.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    suites: BTreeMap<String, Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test, failing if the sanitized name is already taken in the suite.
    pub fn try_register_test(
        &mut self,
        suite_id: &str,
        name: &str,
        tester: Tester,
    ) -> RegistryResult<()> {
        let name = sanitize_name(name);
        let suite = self.suite_entry(suite_id);
        if suite.tests.contains_key(&name) {
            return Err(RegistryError::DuplicateTest {
                suite: suite_id.to_string(),
                name,
            });
        }

        suite.tests.insert(
            name.clone(),
            TestCase {
                suite: suite_id.to_string(),
                name,
                tester,
            },
        );
        Ok(())
    }

    /// Register a hook, failing if the suite already has one of this kind.
    pub fn try_register_hook(
        &mut self,
        suite_id: &str,
        kind: HookKind,
        hook: Tester,
    ) -> RegistryResult<()> {
        let slot = self.suite_entry(suite_id).slot_mut(kind);
        if slot.is_some() {
            return Err(RegistryError::DuplicateHook {
                suite: suite_id.to_string(),
                kind,
            });
        }
        *slot = Some(hook);
        Ok(())
    }

    /// Register a test.
    ///
    /// # Panics
    /// Panics if the suite already has a test with the same sanitized name.
    pub fn register_test<F>(&mut self, suite_id: &str, name: &str, f: F)
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        if let Err(e) = self.try_register_test(suite_id, name, Tester::new(f)) {
            panic!("{}", e);
        }
    }

    /// Register a lifecycle hook.
    ///
    /// # Panics
    /// Panics if the suite already has a hook of this kind.
    pub fn register_hook<F>(&mut self, suite_id: &str, kind: HookKind, f: F)
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        if let Err(e) = self.try_register_hook(suite_id, kind, Tester::new(f)) {
            panic!("{}", e);
        }
    }

    /// Builder for registering several things against one suite.
    pub fn suite(&mut self, suite_id: &str) -> SuiteBuilder<'_> {
        SuiteBuilder {
            registry: self,
            id: suite_id.to_string(),
        }
    }

    /// Suites in lexicographic order of their identifiers
    pub fn suites(&self) -> impl Iterator<Item = &Suite> {
        self.suites.values()
    }

    pub fn get(&self, suite_id: &str) -> Option<&Suite> {
        self.suites.get(suite_id)
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Total number of registered tests across all suites
    pub fn test_count(&self) -> usize {
        self.suites.values().map(Suite::len).sum()
    }

    /// Run every suite with the default engine configuration.
    pub fn run(&self) -> TestResult {
        Engine::default().run(self)
    }

    fn suite_entry(&mut self, suite_id: &str) -> &mut Suite {
        self.suites
            .entry(suite_id.to_string())
            .or_insert_with(|| Suite::new(suite_id))
    }
}

/// Registers tests and hooks against a single suite.
///
/// Every method panics on the same misuse as the corresponding
/// [`Registry`] method.
pub struct SuiteBuilder<'r> {
    registry: &'r mut Registry,
    id: String,
}

impl SuiteBuilder<'_> {
    pub fn test<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.registry.register_test(&self.id, name, f);
        self
    }

    pub fn before_suite<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.hook(HookKind::BeforeSuite, f)
    }

    pub fn after_suite<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.hook(HookKind::AfterSuite, f)
    }

    pub fn before_test<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.hook(HookKind::BeforeTest, f)
    }

    pub fn after_test<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.hook(HookKind::AfterTest, f)
    }

    fn hook<F>(&mut self, kind: HookKind, f: F) -> &mut Self
    where
        F: Fn(&mut dyn TestingT) + Send + Sync + 'static,
    {
        self.registry.register_hook(&self.id, kind, f);
        self
    }
}
