//! Error types for searchpool operations
//!
//! This module defines the error types used throughout searchpool. Caller
//! contract violations are a distinct, non-retried category: they indicate
//! bugs in the calling code and fail immediately. Close failures of
//! individual searchers are recovered locally by the provider and never
//! surface through this type during retirement.

use thiserror::Error;

/// Main error type for all searchpool operations
#[derive(Debug, Error)]
pub enum SearchPoolError {
    /// Caller broke the provider usage contract (fatal, never retried)
    #[error("contract violation in {operation}: {reason}")]
    ContractViolation { operation: String, reason: String },

    /// An individual searcher failed to close
    #[error("searcher close failed: {0}")]
    SearcherClose(String),

    /// The searcher factory could not produce the handle sequence
    #[error("searcher factory error: {0}")]
    Factory(String),

    /// The notification sink rejected a queue publish
    #[error("queue error: {0}")]
    Queue(String),

    /// IO operations failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchPoolError {
    /// Create a contract violation error for the given operation
    pub fn contract_violation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a searcher close error
    pub fn searcher_close(reason: impl Into<String>) -> Self {
        Self::SearcherClose(reason.into())
    }

    /// Create a factory error
    pub fn factory(reason: impl Into<String>) -> Self {
        Self::Factory(reason.into())
    }

    /// Create a queue error
    pub fn queue(reason: impl Into<String>) -> Self {
        Self::Queue(reason.into())
    }

    /// True for caller contract violations, which must never be retried
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}
