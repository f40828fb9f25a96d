//! Common test utilities for integration tests
//!
//! This module provides shared utilities for integration tests that cannot
//! access the main crate's test_utils module.

use searchpool::{
    EntityRef, QueueEventData, QueueEventKind, QueueSink, SearchPoolError, Searcher,
    SearcherFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Observes how often a group of test searchers was closed
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Arc<AtomicUsize>);

#[allow(dead_code)]
impl CloseCounter {
    pub fn closes(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct CountingSearcher {
    counter: Arc<AtomicUsize>,
}

impl Searcher for CountingSearcher {
    fn close(&self) -> Result<(), SearchPoolError> {
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build `count` searchers sharing one close counter
#[allow(dead_code)]
pub fn closing_searchers(count: usize) -> (Vec<Arc<dyn Searcher>>, CloseCounter) {
    let counter = CloseCounter::default();
    let searchers = (0..count)
        .map(|_| {
            Arc::new(CountingSearcher {
                counter: Arc::clone(&counter.0),
            }) as Arc<dyn Searcher>
        })
        .collect();
    (searchers, counter)
}

/// Factory producing counted searcher generations
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct CountingFactory {
    per_provider: usize,
    creations: AtomicUsize,
    generations: Mutex<Vec<CloseCounter>>,
}

#[allow(dead_code)]
impl CountingFactory {
    pub fn new(per_provider: usize) -> Arc<Self> {
        Arc::new(Self {
            per_provider,
            creations: AtomicUsize::new(0),
            generations: Mutex::new(Vec::new()),
        })
    }

    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    pub fn generation_closes(&self, generation: usize) -> usize {
        self.generations
            .lock()
            .expect("generations lock poisoned")
            .get(generation)
            .map(CloseCounter::closes)
            .unwrap_or(0)
    }
}

impl SearcherFactory for CountingFactory {
    fn create_searchers(&self) -> Result<Vec<Arc<dyn Searcher>>, SearchPoolError> {
        let (searchers, counter) = closing_searchers(self.per_provider);
        self.generations
            .lock()
            .expect("generations lock poisoned")
            .push(counter);
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(searchers)
    }
}

/// Queue sink capturing published events
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingSink {
    events: Mutex<Vec<(QueueEventKind, EntityRef, QueueEventData)>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<(QueueEventKind, EntityRef, QueueEventData)> {
        self.events.lock().expect("events lock poisoned").clone()
    }
}

impl QueueSink for RecordingSink {
    fn notify(
        &self,
        kind: QueueEventKind,
        entity: &EntityRef,
        data: QueueEventData,
    ) -> Result<(), SearchPoolError> {
        self.events
            .lock()
            .expect("events lock poisoned")
            .push((kind, entity.clone(), data));
        Ok(())
    }
}
