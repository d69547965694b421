//! Per-document scheduling of detection passes.
//!
//! Each document has at most one pending or running pass. Scheduling a new
//! one aborts the previous task instead of queueing behind it, and every pass
//! carries a generation number so a result that lost the race is never
//! published.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tower_lsp::lsp_types::Url;
use tracing::debug;

/// Default delay between the last trigger and the pass.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct DetectionQueue {
    debounce: Duration,
    generation: AtomicU64,
    tasks: Mutex<HashMap<Url, Pending>>,
}

impl DetectionQueue {
    pub fn new(debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            debounce,
            generation: AtomicU64::new(0),
            tasks: Mutex::new(HashMap::new()),
        })
    }

    /// Run `job` for `uri` after the debounce delay, superseding any pass
    /// already pending or running for it. The job receives its generation.
    pub fn schedule<F, Fut>(self: &Arc<Self>, uri: Url, job: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let debounce = self.debounce;
        let queue = Arc::clone(self);
        let key = uri.clone();

        // Held across spawn so a finishing task cannot race the insert.
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let handle = tokio::spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            job(generation).await;
            queue.finish(&key, generation);
        });

        if let Some(previous) = tasks.insert(uri, Pending { generation, handle }) {
            debug!(superseded = previous.generation, by = generation, "detection pass superseded");
            previous.handle.abort();
        }
        generation
    }

    /// Whether `generation` is still the latest pass scheduled for `uri`.
    pub fn is_current(&self, uri: &Url, generation: u64) -> bool {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.get(uri).is_some_and(|p| p.generation == generation)
    }

    /// Abort the pass for `uri`, if any.
    pub fn cancel(&self, uri: &Url) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = tasks.remove(uri) {
            pending.handle.abort();
        }
    }

    /// Abort every pass.
    pub fn cancel_all(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for (_, pending) in tasks.drain() {
            pending.handle.abort();
        }
    }

    /// Number of documents with a pending or running pass.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn finish(&self, uri: &Url, generation: u64) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if tasks.get(uri).is_some_and(|p| p.generation == generation) {
            tasks.remove(uri);
        }
    }
}
