//! Provider lifecycle across index generations
//!
//! A [`SearcherProviderManager`] owns the [`SearcherFactory`] and hands out
//! the current [`SearcherProvider`]. When the underlying index is reopened,
//! [`refresh`](SearcherProviderManager::refresh) builds a fresh provider and
//! marks the previous one to close; consumers already connected to the old
//! generation keep their searchers until they depart, while new consumers
//! land on the new generation.
//!
//! The manager also carries the explicit replacement for a finalizer-based
//! safety net: [`sweep`](SearcherProviderManager::sweep) force-retires a
//! provider that has sat idle without ever being marked to close for longer
//! than a grace period, and [`start_sweeper`](SearcherProviderManager::start_sweeper)
//! runs that sweep periodically on a background thread.

use crate::error::SearchPoolError;
use crate::searcher::SearcherFactory;
use crate::searcher_provider::SearcherProvider;
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Creates, hands out and retires searcher providers
pub struct SearcherProviderManager {
    factory: Box<dyn SearcherFactory>,
    state: Mutex<ManagerState>,
}

#[derive(Default)]
struct ManagerState {
    /// Provider new consumers connect to, created lazily
    current: Option<Arc<SearcherProvider>>,
    /// Marked-to-close generations still draining their consumers
    retired: Vec<Weak<SearcherProvider>>,
}

impl SearcherProviderManager {
    /// Create a manager around the given searcher factory
    pub fn new(factory: Box<dyn SearcherFactory>) -> Self {
        Self {
            factory,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// The provider new consumers should connect to
    ///
    /// Created from the factory on first use, and recreated if the current
    /// one was retired in the meantime (e.g. by a sweep).
    pub fn current_provider(&self) -> Result<Arc<SearcherProvider>, SearchPoolError> {
        let mut state = self.state.lock();
        if let Some(provider) = &state.current {
            if !provider.is_marked_to_close() {
                return Ok(Arc::clone(provider));
            }
        }
        let provider = self.create_provider()?;
        state.current = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Swap in a fresh provider generation
    ///
    /// The previous provider is marked to close and closes once its last
    /// consumer departs. Returns the new provider.
    pub fn refresh(&self) -> Result<Arc<SearcherProvider>, SearchPoolError> {
        let provider = self.create_provider()?;
        let mut state = self.state.lock();
        if let Some(old) = state.current.take() {
            debug!("refresh searcher provider, retiring previous generation");
            old.mark_to_close();
            if !old.is_closed() {
                state.retired.push(Arc::downgrade(&old));
            }
        }
        state.current = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Mark every live provider to close
    ///
    /// Providers still in use close once they drain; idle ones close here.
    pub fn close_all(&self) {
        let mut state = self.state.lock();
        if let Some(current) = state.current.take() {
            current.mark_to_close();
            if !current.is_closed() {
                state.retired.push(Arc::downgrade(&current));
            }
        }
        state.retired.retain(|weak| match weak.upgrade() {
            Some(provider) => {
                provider.mark_to_close();
                !provider.is_closed()
            }
            None => false,
        });
    }

    /// Retire the current provider if it sat idle, unmarked, beyond `grace`
    ///
    /// Explicit replacement for a finalizer safety net: a provider whose
    /// consumers all departed but that nobody retired would otherwise hold
    /// its searchers open indefinitely. Returns the number of providers
    /// swept (0 or 1). Also prunes fully closed retired generations.
    pub fn sweep(&self, grace: Duration) -> usize {
        let mut state = self.state.lock();
        state
            .retired
            .retain(|weak| weak.upgrade().is_some_and(|provider| !provider.is_closed()));

        let expired = state
            .current
            .as_ref()
            .and_then(|provider| provider.idle_since())
            .is_some_and(|idle_since| idle_since.elapsed() >= grace);
        if !expired {
            return 0;
        }

        match state.current.take() {
            Some(provider) => {
                warn!(
                    "sweeping searcher provider idle beyond {:?} without retirement",
                    grace
                );
                provider.mark_to_close();
                if !provider.is_closed() {
                    state.retired.push(Arc::downgrade(&provider));
                }
                1
            }
            None => 0,
        }
    }

    /// Number of retired generations still draining
    pub fn retired_count(&self) -> usize {
        self.state
            .lock()
            .retired
            .iter()
            .filter(|weak| weak.upgrade().is_some_and(|provider| !provider.is_closed()))
            .count()
    }

    /// Run [`sweep`](Self::sweep) every `interval` on a background thread
    ///
    /// The returned handle stops the thread on `shutdown()` or drop.
    pub fn start_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        grace: Duration,
    ) -> Result<SweeperHandle, SearchPoolError> {
        let manager = Arc::clone(self);
        let signal = Arc::new(SweeperSignal {
            stop: Mutex::new(false),
            wakeup: Condvar::new(),
        });
        let thread_signal = Arc::clone(&signal);

        let handle = std::thread::Builder::new()
            .name("searchpool-sweeper".to_string())
            .spawn(move || loop {
                {
                    let mut stop = thread_signal.stop.lock();
                    if *stop {
                        break;
                    }
                    let _ = thread_signal.wakeup.wait_for(&mut stop, interval);
                    if *stop {
                        break;
                    }
                }
                let swept = manager.sweep(grace);
                if swept > 0 {
                    debug!("sweeper retired {} idle provider(s)", swept);
                }
            })?;

        Ok(SweeperHandle {
            signal,
            handle: Some(handle),
        })
    }
}

impl SearcherProviderManager {
    fn create_provider(&self) -> Result<Arc<SearcherProvider>, SearchPoolError> {
        let searchers = self.factory.create_searchers()?;
        if searchers.is_empty() {
            return Err(SearchPoolError::factory("factory produced no searchers"));
        }
        Ok(Arc::new(SearcherProvider::new(searchers)))
    }
}

impl std::fmt::Debug for SearcherProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SearcherProviderManager")
            .field("has_current", &state.current.is_some())
            .field("retired", &state.retired.len())
            .finish()
    }
}

struct SweeperSignal {
    stop: Mutex<bool>,
    wakeup: Condvar,
}

/// Handle to a running background sweeper thread
pub struct SweeperHandle {
    signal: Arc<SweeperSignal>,
    handle: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper thread and wait for it to finish
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        {
            let mut stop = self.signal.stop.lock();
            *stop = true;
        }
        self.signal.wakeup.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SweeperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweeperHandle")
            .field("running", &self.handle.is_some())
            .finish()
    }
}
