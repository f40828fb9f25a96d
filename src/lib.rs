//! Searchpool - shared search-index readers and scoped index-queue settings
//!
//! Searchpool coordinates a small, fixed pool of expensive-to-create search
//! handles ("searchers") across many concurrent executions. A
//! [`SearcherProvider`] guarantees that a searcher is never closed while any
//! execution still uses it, and that searchers are closed exactly once, as
//! soon as the provider is both marked for retirement and idle. A
//! [`SearcherProviderManager`] owns provider lifecycle across index reopens
//! and can sweep providers that went idle without ever being retired.
//!
//! The companion queue layer lets a unit of work attach scoped metadata to
//! queued indexing tasks: [`queue_settings`] temporarily overrides queue
//! priority or notification suppression on an [`ExecutionContext`], and
//! [`QueueTask`] resolves those overrides when publishing to a [`QueueSink`].
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use searchpool::{ExecutionId, SearchPoolError, Searcher, SearcherProvider};
//!
//! struct StubSearcher;
//!
//! impl Searcher for StubSearcher {
//!     fn close(&self) -> Result<(), SearchPoolError> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), SearchPoolError> {
//! let provider = Arc::new(SearcherProvider::new(vec![
//!     Arc::new(StubSearcher) as Arc<dyn Searcher>,
//!     Arc::new(StubSearcher) as Arc<dyn Searcher>,
//! ]));
//!
//! let execution = ExecutionId::new();
//! let connection = provider.connect_scoped(execution)?;
//! assert_eq!(connection.searchers()?.len(), 2);
//! drop(connection);
//!
//! // Retirement is deferred until the last consumer departs.
//! provider.mark_to_close();
//! assert!(provider.is_closed());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod execution;
pub mod identifiers;
pub mod provider_manager;
pub mod queue_settings;
pub mod queue_task;
pub mod searcher;
pub mod searcher_provider;

#[cfg(test)]
pub mod test_utils;

pub use error::SearchPoolError;
pub use execution::ExecutionContext;
pub use identifiers::{CursorId, DocumentId, ExecutionId};
pub use provider_manager::{SearcherProviderManager, SweeperHandle};
pub use queue_settings::IndexQueuePriority;
pub use queue_task::{EntityRef, QueueEventData, QueueEventKind, QueueSink, QueueTask};
pub use searcher::{Searcher, SearcherFactory};
pub use searcher_provider::{SearcherConnection, SearcherProvider};
