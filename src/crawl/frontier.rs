//! Frontier: the pending-work queue plus dedup set for one crawl run
//!
//! The frontier is shared between the discovery producer (enqueuing seeds)
//! and the run controller (dequeuing work and enqueuing child links). Every
//! URL string that was ever offered stays in the visited set for the run's
//! lifetime, so a URL can be enqueued at most once per run.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Normalized URL (fragment stripped, absolute)
    pub url: String,

    /// Link distance from the seed that led here
    pub depth: u32,

    /// Domain this item was reached through; links on the fetched page are
    /// classified internal/external against it
    pub origin_domain: String,
}

impl WorkItem {
    pub fn new(url: impl Into<String>, depth: u32, origin_domain: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth,
            origin_domain: origin_domain.into(),
        }
    }
}

#[derive(Default)]
struct FrontierInner {
    queue: VecDeque<WorkItem>,
    visited: HashSet<String>,
    total_enqueued: u64,
}

/// Thread-safe FIFO work queue with at-most-once enqueue per URL
///
/// The visited-set membership check and the append are atomic under one
/// lock, so concurrent producers cannot double-enqueue a URL.
#[derive(Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues the item unless its URL was already offered this run
    ///
    /// Returns whether the item was newly added.
    pub fn try_enqueue(&self, item: WorkItem) -> bool {
        let mut inner = self.inner.lock().expect("frontier lock poisoned");
        if !inner.visited.insert(item.url.clone()) {
            return false;
        }
        inner.queue.push_back(item);
        inner.total_enqueued += 1;
        true
    }

    /// Removes and returns the head item, if any
    pub fn dequeue(&self) -> Option<WorkItem> {
        self.inner
            .lock()
            .expect("frontier lock poisoned")
            .queue
            .pop_front()
    }

    /// Current pending count
    pub fn len(&self) -> usize {
        self.inner.lock().expect("frontier lock poisoned").queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total items ever accepted this run (pending and processed)
    ///
    /// Zero after discovery finishes means the run found no sources at all.
    pub fn total_enqueued(&self) -> u64 {
        self.inner
            .lock()
            .expect("frontier lock poisoned")
            .total_enqueued
    }
}
