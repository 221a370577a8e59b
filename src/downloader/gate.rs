//! Resizable bound on simultaneously running transfers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// A counting gate whose capacity can be changed at runtime.
///
/// The underlying semaphore is created on first use and replaced wholesale
/// by [`resize`](ConcurrencyGate::resize). Permits taken from a replaced
/// semaphore stay valid until dropped; callers still waiting on it are woken
/// and queue again on the replacement.
#[derive(Debug, Default)]
pub struct ConcurrencyGate {
    semaphore: Mutex<Option<Arc<Semaphore>>>,
    held: Arc<AtomicUsize>,
}

/// A slot in the gate. Dropping it releases the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    held: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.held.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self, limit: usize) -> Arc<Semaphore> {
        let mut slot = self.semaphore.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slot.get_or_insert_with(|| {
            debug!("Creating concurrency gate with {} slots", limit);
            Arc::new(Semaphore::new(limit))
        }))
    }

    /// Waits for a free slot.
    ///
    /// `limit` is only used if the gate does not exist yet.
    pub async fn acquire(&self, limit: usize) -> GatePermit {
        loop {
            let semaphore = self.current(limit);
            // Fails only when a resize closed this semaphore.
            if let Ok(permit) = semaphore.acquire_owned().await {
                self.held.fetch_add(1, Ordering::SeqCst);
                return GatePermit {
                    _permit: permit,
                    held: Arc::clone(&self.held),
                };
            }
        }
    }

    /// Gives a slot back.
    pub fn release(&self, permit: GatePermit) {
        drop(permit);
    }

    /// Replaces the gate with one of `limit` slots.
    ///
    /// Does nothing if the gate has not been created yet; it will be created
    /// with whatever limit is in effect at first use.
    pub fn resize(&self, limit: usize) {
        let mut slot = self.semaphore.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = slot.as_mut() {
            current.close();
            *current = Arc::new(Semaphore::new(limit));
            debug!("Concurrency gate resized to {} slots", limit);
        }
    }

    /// Number of permits currently held, across old and new gates.
    pub fn active(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}
