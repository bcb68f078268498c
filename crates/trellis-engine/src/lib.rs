//! Trellis - hierarchical test orchestration
//!
//! This library provides:
//! - Registration of suites, tests and lifecycle hooks
//! - A test context for failure signaling, logging and nested subtests
//! - An engine that runs suites in isolation and builds a result tree
//! - Aggregation over result trees and a store interface for past runs

/// Trellis engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod context;
pub mod engine;
pub mod error;
pub mod global;
pub mod helper;
pub mod host;
pub mod registry;
pub mod result;
pub mod sanitize;
pub mod store;

mod rendezvous;
mod unwind;

// Re-export commonly used types
pub use context::{TestContext, Tester, TestingT};
pub use engine::{Engine, EngineConfig};
pub use error::{RegistryError, RegistryResult, StoreError, StoreResult};
pub use helper::each;
pub use host::{run_under_host, HostFramework, LibtestHost};
pub use registry::{HookKind, Registry, Suite, SuiteBuilder, TestCase};
pub use result::{Level, Msg, Outcome, TestResult, TestStats};
pub use sanitize::sanitize_name;
pub use store::{InMemoryStore, ResultStore, Results, Summary, DEFAULT_PAGE_SIZE};
