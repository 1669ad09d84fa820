use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use lumen_core::RequestId;

/// Resolver configuration.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Wall-clock budget for one resolution request, retries included.
    pub budget: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_millis(1000),
        }
    }
}

/// Per-request context: identity, cooperative cancellation, deadline.
///
/// Intentionally small and `Clone` so it can be passed into background
/// work. The resolver polls the token and the deadline at the top of every
/// attempt; nothing is interrupted mid-call.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: RequestId,
    cancel: CancellationToken,
    deadline: Instant,
}

impl RequestContext {
    pub fn new(request_id: RequestId, cancel: CancellationToken, deadline: Instant) -> Self {
        Self {
            request_id,
            cancel,
            deadline,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Token embedders can cancel to abandon the request explicitly, in
    /// addition to supersession by a newer request.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Remaining time budget until the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
