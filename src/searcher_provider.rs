//! Reference-counted sharing of search handles across executions
//!
//! A [`SearcherProvider`] is the single point of truth for whether a set of
//! shared searchers may still be used, and for closing them exactly once, as
//! soon as safe, after retirement is requested. Executions `connect` before
//! reading the handle slice and `disconnect` when done; result cursors
//! borrowed from the handles are registered so the provider can tell when it
//! is truly idle.
//!
//! Retirement follows a mark-then-drain protocol: [`SearcherProvider::mark_to_close`]
//! is a monotonic request, and the actual close happens when the last
//! connected execution departs and the last borrowed cursor is released. No
//! operation ever blocks waiting for another execution; `connect` either
//! succeeds immediately or fails fast once retirement was requested.
//!
//! All bookkeeping lives behind one mutex, so every read-then-write
//! transition (including the idleness check before a close) is a single
//! critical section and the close runs at most once no matter how many
//! executions race into it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use searchpool::{CursorId, ExecutionId, SearcherProvider};
//!
//! # fn demo(provider: Arc<SearcherProvider>) -> Result<(), searchpool::SearchPoolError> {
//! let execution = ExecutionId::new();
//! provider.connect(execution)?;
//! let searchers = provider.searchers(execution)?;
//!
//! let cursor = CursorId::new();
//! provider.borrow_cursor(execution, cursor)?;
//! // ... iterate results obtained from the searchers ...
//! provider.release_cursor(execution, cursor);
//! provider.disconnect(execution);
//! # Ok(())
//! # }
//! ```

use crate::error::SearchPoolError;
use crate::identifiers::{CursorId, ExecutionId};
use crate::searcher::Searcher;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Shared guard around a fixed sequence of search handles
///
/// The handle sequence is created once at construction and owned collectively
/// until closed; no single execution owns it. The handles themselves are only
/// ever closed, never mutated, by the provider.
pub struct SearcherProvider {
    /// Searchers backing this provider, one per index; never mutated
    searchers: Vec<Arc<dyn Searcher>>,
    /// All lifecycle bookkeeping, guarded by a single lock
    state: Mutex<ProviderState>,
}

#[derive(Debug)]
struct ProviderState {
    /// Executions currently permitted to read the searchers
    connected: FxHashSet<ExecutionId>,
    /// In-flight cursors per execution, tracked for idle detection
    cursors: FxHashMap<ExecutionId, FxHashSet<CursorId>>,
    /// Monotonic retirement request; once true it never reverts
    marked_to_close: bool,
    /// Searchers have been released; set exactly once
    closed: bool,
    /// Instant the provider last became idle while not yet marked
    idle_since: Option<Instant>,
}

impl SearcherProvider {
    /// Create a provider around an already-created searcher sequence
    pub fn new(searchers: Vec<Arc<dyn Searcher>>) -> Self {
        debug!("create searcher provider with {} searchers", searchers.len());
        Self {
            searchers,
            state: Mutex::new(ProviderState {
                connected: FxHashSet::default(),
                cursors: FxHashMap::default(),
                marked_to_close: false,
                closed: false,
                idle_since: Some(Instant::now()),
            }),
        }
    }

    /// Connect the calling execution to this provider
    ///
    /// Idempotent per execution. Fails fast with a contract violation once
    /// [`mark_to_close`](Self::mark_to_close) was called. An execution may
    /// still win a connect just before another marks the provider to close;
    /// that is tolerated because the close is deferred until the provider is
    /// truly idle, never forced.
    pub fn connect(&self, execution: ExecutionId) -> Result<(), SearchPoolError> {
        let mut state = self.state.lock();
        if state.connected.contains(&execution) {
            return Ok(());
        }
        if state.marked_to_close {
            return Err(SearchPoolError::contract_violation(
                "connect",
                "provider is already marked to close",
            ));
        }
        debug!("connect execution [{}] to searcher provider", execution);
        state.connected.insert(execution);
        state.idle_since = None;
        Ok(())
    }

    /// Connect and return a guard that disconnects on every exit path
    ///
    /// The guard releases all cursors the execution still holds and then
    /// disconnects when dropped, including during panic unwinding. Prefer
    /// this over a bare [`connect`](Self::connect) unless the connection
    /// outlives the current scope.
    pub fn connect_scoped(
        self: &Arc<Self>,
        execution: ExecutionId,
    ) -> Result<SearcherConnection, SearchPoolError> {
        self.connect(execution)?;
        Ok(SearcherConnection {
            provider: Arc::clone(self),
            execution,
        })
    }

    /// Access the shared searcher slice
    ///
    /// Only valid while the provider is open and the calling execution is
    /// connected; anything else is caller misuse and fails fast.
    pub fn searchers(&self, execution: ExecutionId) -> Result<&[Arc<dyn Searcher>], SearchPoolError> {
        let state = self.state.lock();
        if state.closed {
            return Err(SearchPoolError::contract_violation(
                "searchers",
                "provider is closed",
            ));
        }
        if !state.connected.contains(&execution) {
            return Err(SearchPoolError::contract_violation(
                "searchers",
                "execution must connect before reading searchers",
            ));
        }
        Ok(&self.searchers)
    }

    /// Whether the given execution is currently connected
    pub fn is_connected(&self, execution: ExecutionId) -> bool {
        self.state.lock().connected.contains(&execution)
    }

    /// Disconnect the calling execution
    ///
    /// No-op for executions that never connected. If membership actually
    /// changed, the provider re-checks idleness and closes when it is both
    /// marked and idle. Close failures of individual searchers are logged,
    /// never surfaced here.
    pub fn disconnect(&self, execution: ExecutionId) {
        let mut state = self.state.lock();
        if state.connected.remove(&execution) {
            debug!(
                "disconnect execution [{}] from searcher provider, marked_to_close [{}]",
                execution, state.marked_to_close
            );
            self.close_if_idle(&mut state);
        }
    }

    /// Record a cursor borrowed from the searchers by this execution
    pub fn borrow_cursor(
        &self,
        execution: ExecutionId,
        cursor: CursorId,
    ) -> Result<(), SearchPoolError> {
        let mut state = self.state.lock();
        if !state.connected.contains(&execution) {
            return Err(SearchPoolError::contract_violation(
                "borrow_cursor",
                "cursor borrowed by an execution that is not connected",
            ));
        }
        state.cursors.entry(execution).or_default().insert(cursor);
        Ok(())
    }

    /// Release one borrowed cursor
    ///
    /// Dropping the execution's last cursor removes its map entry and
    /// re-checks whether the provider can close.
    pub fn release_cursor(&self, execution: ExecutionId, cursor: CursorId) {
        let mut state = self.state.lock();
        let Some(borrowed) = state.cursors.get_mut(&execution) else {
            return;
        };
        if borrowed.remove(&cursor) {
            if borrowed.is_empty() {
                state.cursors.remove(&execution);
            }
            self.close_if_idle(&mut state);
        }
    }

    /// Release every cursor the execution still holds
    pub fn release_all_cursors(&self, execution: ExecutionId) {
        let mut state = self.state.lock();
        if state.cursors.remove(&execution).is_some() {
            self.close_if_idle(&mut state);
        }
    }

    /// Whether the execution still holds borrowed cursors
    pub fn has_cursors(&self, execution: ExecutionId) -> bool {
        self.state.lock().cursors.contains_key(&execution)
    }

    /// Request retirement; the close happens once the provider is idle
    ///
    /// Idempotent: the retirement side effect runs at most once. After this
    /// call no new execution can connect; already-connected executions keep
    /// working until they disconnect.
    pub fn mark_to_close(&self) {
        let mut state = self.state.lock();
        if !state.marked_to_close {
            state.marked_to_close = true;
            debug!("mark searcher provider to close");
            self.close_if_idle(&mut state);
        }
    }

    /// Whether retirement has been requested
    pub fn is_marked_to_close(&self) -> bool {
        self.state.lock().marked_to_close
    }

    /// Whether the searchers have been released
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// No connected executions and no outstanding borrowed cursors
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.connected.is_empty() && state.cursors.is_empty()
    }

    /// Instant since which the provider has sat idle without a retirement
    /// request, if it currently does
    ///
    /// Consumed by the manager's sweeper to force-retire forgotten providers.
    pub(crate) fn idle_since(&self) -> Option<Instant> {
        let state = self.state.lock();
        if state.marked_to_close || state.closed {
            None
        } else {
            state.idle_since
        }
    }

    /// Close the searchers if retirement was requested and nobody uses them.
    /// Must run under the state lock; the only place searchers are released.
    fn close_if_idle(&self, state: &mut ProviderState) {
        if !state.connected.is_empty() || !state.cursors.is_empty() {
            return;
        }
        if state.marked_to_close {
            Self::close_searchers(&self.searchers, state);
        } else if state.idle_since.is_none() {
            state.idle_since = Some(Instant::now());
        }
    }

    /// Release all searchers exactly once
    ///
    /// A failing searcher is logged and the remainder still closed; `closed`
    /// is set once the attempt was made, so the handles are never touched
    /// again.
    fn close_searchers(searchers: &[Arc<dyn Searcher>], state: &mut ProviderState) {
        if state.closed {
            return;
        }
        debug!("closing {} searchers", searchers.len());
        for (index, searcher) in searchers.iter().enumerate() {
            if let Err(error) = searcher.close() {
                warn!("failed to close searcher [{}]: {}", index, error);
            }
        }
        state.closed = true;
    }
}

impl Drop for SearcherProvider {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.closed {
            warn!("searcher provider dropped while open, closing searchers as backstop");
            Self::close_searchers(&self.searchers, state);
        }
    }
}

impl std::fmt::Debug for SearcherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SearcherProvider")
            .field("searchers", &self.searchers.len())
            .field("connected", &state.connected.len())
            .field("cursor_executions", &state.cursors.len())
            .field("marked_to_close", &state.marked_to_close)
            .field("closed", &state.closed)
            .finish()
    }
}

/// RAII connection to a [`SearcherProvider`]
///
/// Releases the execution's cursors and disconnects when dropped, on every
/// exit path including panic unwinding.
#[derive(Debug)]
pub struct SearcherConnection {
    provider: Arc<SearcherProvider>,
    execution: ExecutionId,
}

impl SearcherConnection {
    /// The execution this connection belongs to
    pub fn execution(&self) -> ExecutionId {
        self.execution
    }

    /// Access the shared searcher slice through this connection
    pub fn searchers(&self) -> Result<&[Arc<dyn Searcher>], SearchPoolError> {
        self.provider.searchers(self.execution)
    }

    /// Record a cursor borrowed by this connection's execution
    pub fn borrow_cursor(&self, cursor: CursorId) -> Result<(), SearchPoolError> {
        self.provider.borrow_cursor(self.execution, cursor)
    }

    /// Release one borrowed cursor before the connection ends
    pub fn release_cursor(&self, cursor: CursorId) {
        self.provider.release_cursor(self.execution, cursor)
    }
}

impl Drop for SearcherConnection {
    fn drop(&mut self) {
        self.provider.release_all_cursors(self.execution);
        self.provider.disconnect(self.execution);
    }
}
