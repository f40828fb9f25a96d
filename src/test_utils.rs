//! Shared test utilities for searchpool unit tests
//!
//! Integration tests under `tests/` cannot reach this module and carry their
//! own copies in `tests/common.rs`.

use crate::error::SearchPoolError;
use crate::queue_task::{EntityRef, QueueEventData, QueueEventKind, QueueSink};
use crate::searcher::{Searcher, SearcherFactory};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Observes how often a group of test searchers was closed
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Arc<AtomicUsize>);

impl CloseCounter {
    /// Total successful closes across the observed searchers
    pub fn closes(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct CountingSearcher {
    counter: Arc<AtomicUsize>,
    fail: bool,
}

impl Searcher for CountingSearcher {
    fn close(&self) -> Result<(), SearchPoolError> {
        if self.fail {
            return Err(SearchPoolError::searcher_close("test searcher refuses to close"));
        }
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build `count` searchers sharing one close counter
pub fn closing_searchers(count: usize) -> (Vec<Arc<dyn Searcher>>, CloseCounter) {
    let counter = CloseCounter::default();
    let searchers = (0..count)
        .map(|_| {
            Arc::new(CountingSearcher {
                counter: Arc::clone(&counter.0),
                fail: false,
            }) as Arc<dyn Searcher>
        })
        .collect();
    (searchers, counter)
}

/// A searcher whose close always fails; the counter never increments
pub fn failing_searcher() -> (Arc<dyn Searcher>, CloseCounter) {
    let counter = CloseCounter::default();
    let searcher = Arc::new(CountingSearcher {
        counter: Arc::clone(&counter.0),
        fail: true,
    });
    (searcher, counter)
}

/// Factory producing counted searcher generations
#[derive(Debug)]
pub struct CountingFactory {
    per_provider: usize,
    creations: AtomicUsize,
    generations: Mutex<Vec<CloseCounter>>,
}

impl CountingFactory {
    pub fn new(per_provider: usize) -> Arc<Self> {
        Arc::new(Self {
            per_provider,
            creations: AtomicUsize::new(0),
            generations: Mutex::new(Vec::new()),
        })
    }

    /// How many provider generations were created so far
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Successful close count of the nth created generation
    pub fn generation_closes(&self, generation: usize) -> usize {
        self.generations
            .lock()
            .get(generation)
            .map(CloseCounter::closes)
            .unwrap_or(0)
    }
}

impl SearcherFactory for CountingFactory {
    fn create_searchers(&self) -> Result<Vec<Arc<dyn Searcher>>, SearchPoolError> {
        let (searchers, counter) = closing_searchers(self.per_provider);
        self.generations.lock().push(counter);
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(searchers)
    }
}

/// Queue sink capturing published events, optionally rejecting them
#[derive(Debug, Default)]
pub struct RecordingSink {
    reject: bool,
    events: Mutex<Vec<(QueueEventKind, EntityRef, QueueEventData)>>,
}

impl RecordingSink {
    /// A sink that rejects every publish with a queue error
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Events published so far
    pub fn events(&self) -> Vec<(QueueEventKind, EntityRef, QueueEventData)> {
        self.events.lock().clone()
    }
}

impl QueueSink for RecordingSink {
    fn notify(
        &self,
        kind: QueueEventKind,
        entity: &EntityRef,
        data: QueueEventData,
    ) -> Result<(), SearchPoolError> {
        if self.reject {
            return Err(SearchPoolError::queue("test sink rejects publishes"));
        }
        self.events.lock().push((kind, entity.clone(), data));
        Ok(())
    }
}
