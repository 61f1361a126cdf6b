//! Pending wait registration owned by the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::delivery::{Event, Slot, Waiter, pair};

/// Fallback horizon for durations that overflow the clock (~30 years).
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after`, capped at [`FAR_FUTURE`] so the sum never overflows.
pub(crate) fn deadline(now: Instant, after: Duration) -> Instant {
    now + after.min(FAR_FUTURE)
}

/// A listener waiting for one event on `key`.
///
/// Never mutated after creation; it is consumed by [`Listener::resolve`].
#[derive(Debug)]
pub(crate) struct Listener<T> {
    pub(crate) key: Arc<str>,
    pub(crate) expires_at: Instant,
    slot: Slot<T>,
}

impl<T> Listener<T> {
    /// Creates a listener expiring `ttl` after `now`, and the waiter it will fill.
    pub(crate) fn new(key: Arc<str>, ttl: Duration, now: Instant) -> (Self, Waiter<T>) {
        let (slot, waiter) = pair(Arc::clone(&key));
        let listener = Self {
            key,
            expires_at: deadline(now, ttl),
            slot,
        };
        (listener, waiter)
    }

    /// Whether the TTL has elapsed at `now`.
    #[inline]
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    /// Completes the waiter with `event`.
    ///
    /// Returns `false` if the waiter was already dropped.
    pub(crate) fn resolve(self, event: Event<T>) -> bool {
        self.slot.fill(event)
    }
}
