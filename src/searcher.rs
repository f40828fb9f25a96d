//! Collaborator traits for the searcher pool
//!
//! The pool never creates or uses searchers itself: a [`SearcherFactory`]
//! supplies the fixed handle sequence at provider construction, and the only
//! operation the pool performs on a [`Searcher`] is closing it during
//! retirement. How searches run against a handle, and what its results look
//! like, is entirely the caller's business.

use crate::error::SearchPoolError;
use std::sync::Arc;

/// An opaque, expensive-to-create search handle
///
/// Implementations are shared read-only between all connected executions.
/// `close` is called at most once by the owning provider; implementations do
/// not need to guard against repeated closes from the pool.
pub trait Searcher: Send + Sync {
    /// Release the underlying index resources
    fn close(&self) -> Result<(), SearchPoolError>;
}

impl std::fmt::Debug for dyn Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Searcher")
    }
}

/// Supplies the fixed searcher sequence for a new provider
pub trait SearcherFactory: Send + Sync {
    /// Create the full set of searchers backing one provider generation
    ///
    /// Called once per provider; typically one searcher per index directory.
    fn create_searchers(&self) -> Result<Vec<Arc<dyn Searcher>>, SearchPoolError>;
}

impl<T: SearcherFactory + ?Sized> SearcherFactory for Arc<T> {
    fn create_searchers(&self) -> Result<Vec<Arc<dyn Searcher>>, SearchPoolError> {
        (**self).create_searchers()
    }
}
