//! Discovery producer: streams seed URLs into the frontier
//!
//! The producer runs as a background task alongside the fetch workers, so
//! crawling starts as soon as the first seed arrives rather than after the
//! full discovery pass. Whatever way the discovery capability exits
//! (exhausted, cancelled, or errored), the handle's done flag flips exactly
//! once, so the controller is never left waiting for a producer that died.

use crate::crawl::capabilities::Discovery;
use crate::crawl::frontier::{Frontier, WorkItem};
use crate::url::{extract_domain, normalize_url};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle to a running (or already finished) discovery producer
pub struct ProducerHandle {
    done: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ProducerHandle {
    /// A producer that has nothing to do (direct-crawl mode)
    pub fn finished() -> Self {
        Self {
            done: Arc::new(AtomicBool::new(true)),
            task: None,
        }
    }

    /// Whether discovery has signaled completion
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Waits for the producer task to exit
    ///
    /// With the stop flag set this returns within one discovery step.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Discovery producer task panicked: {}", e);
            }
        }
    }
}

/// Offers a discovered URL to the frontier as a depth-0 seed
///
/// Malformed or non-http(s) URLs are dropped; duplicates are silently
/// ignored by the frontier.
pub fn enqueue_seed(frontier: &Frontier, raw_url: &str) -> bool {
    let url = match normalize_url(raw_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Dropping discovered URL {}: {}", raw_url, e);
            return false;
        }
    };

    let domain = match extract_domain(&url) {
        Some(domain) => domain,
        None => return false,
    };

    frontier.try_enqueue(WorkItem::new(url.as_str(), 0, domain))
}

/// Flips the done flag when the producer task exits, panics included
struct DoneGuard(Arc<AtomicBool>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Spawns the discovery producer task
///
/// Discovery errors are logged, not propagated: already-enqueued seeds keep
/// crawling, and the done flag still flips.
pub fn spawn_producer(
    discovery: Arc<dyn Discovery>,
    query: String,
    max_results: usize,
    frontier: Arc<Frontier>,
    stop: Arc<AtomicBool>,
) -> ProducerHandle {
    let done = Arc::new(AtomicBool::new(false));
    let done_signal = Arc::clone(&done);

    let task = tokio::spawn(async move {
        let _guard = DoneGuard(done_signal);
        let seed_frontier = Arc::clone(&frontier);
        let on_result = move |url: String| {
            if enqueue_seed(&seed_frontier, &url) {
                tracing::debug!("Discovered seed: {}", url);
            }
        };
        let should_stop = move || stop.load(Ordering::Relaxed);

        let outcome = discovery
            .search(&query, max_results, &on_result, &should_stop)
            .await;

        match outcome {
            Ok(()) => tracing::info!(
                "Discovery finished, {} URLs accepted so far",
                frontier.total_enqueued()
            ),
            Err(e) => tracing::warn!("Discovery failed: {}", e),
        }
    });

    ProducerHandle {
        done,
        task: Some(task),
    }
}
