//! Engine error types
use crate::registry::HookKind;
use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Misuse detected while registering suites. These describe a broken suite
/// definition, not a test outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("test {name} already exists in suite {suite}")]
    DuplicateTest { suite: String, name: String },

    #[error("{kind} hook already registered for suite {suite}")]
    DuplicateHook { suite: String, kind: HookKind },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors at the result-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no result store configured")]
    NoStore,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(usize),

    #[error("result store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error from any displayable cause
    pub fn backend(error: impl ToString) -> Self {
        Self::Backend(error.to_string())
    }

    /// Whether this error means the requested id does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
