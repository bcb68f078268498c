//! Bundled suites and terminal reporting for the runner.

pub mod demo;
pub mod reporter;

pub use reporter::TestReporter;
