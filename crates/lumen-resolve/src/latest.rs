use std::sync::atomic::{AtomicU64, Ordering};

use lumen_core::RequestId;

/// Tracks the most recently accepted resolution request.
///
/// A single last-write-wins slot: no queue, no history. If two requests
/// race, whichever `register` lands last is the sole survivor, and any
/// attempt still running for an earlier id observes `is_latest == false`
/// at its next check. Superseded requests are never notified; they poll.
#[derive(Debug, Default)]
pub struct LatestRequest {
    next: AtomicU64,
    latest: AtomicU64,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh id and register it as the latest request.
    pub fn begin(&self) -> RequestId {
        // Ids start at 1; the zero slot means "no request yet".
        let id = RequestId::new(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.register(id);
        id
    }

    pub fn register(&self, id: RequestId) {
        self.latest.store(id.get(), Ordering::SeqCst);
    }

    pub fn is_latest(&self, id: RequestId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.get()
    }
}
