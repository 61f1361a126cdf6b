//! # Activity records emitted by the loop.
//!
//! The [`ActivityKind`] enum classifies what happened inside the dispatcher:
//! - **Listener events**: registration and the three ways a listener resolves
//! - **Routing events**: an event arrived and was (or was not) matched
//! - **Shutdown events**: termination requested and completed
//! - **Subscriber events**: problems inside the fan-out workers
//!
//! The [`Activity`] struct carries additional metadata such as timestamps,
//! the key involved, counts and TTLs.
//!
//! ## Ordering guarantees
//! Each record has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when records are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use waitloop::{Activity, ActivityKind};
//!
//! let a = Activity::new(ActivityKind::ListenerRegistered)
//!     .with_key("bob")
//!     .with_ttl(Duration::from_secs(15));
//!
//! assert_eq!(a.kind, ActivityKind::ListenerRegistered);
//! assert_eq!(a.key.as_deref(), Some("bob"));
//! assert_eq!(a.ttl_ms, Some(15_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for activity ordering.
static ACTIVITY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of loop activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    // === Listener events ===
    /// A listener was appended to its key's queue.
    ///
    /// Sets:
    /// - `key`: awaited key
    /// - `ttl_ms`: listener TTL (ms)
    ListenerRegistered,

    /// A listener received a sent event.
    ///
    /// Sets:
    /// - `key`: matched key
    ListenerDelivered,

    /// A listener was already expired when its event arrived.
    ///
    /// It does not receive the event and stays queued until the sweep times it out.
    ///
    /// Sets:
    /// - `key`: matched key
    ListenerSkipped,

    /// The waiter was gone by the time its listener resolved.
    ///
    /// Sets:
    /// - `key`: listener key
    /// - `reason`: label of the resolution that was discarded
    ListenerAbandoned,

    /// The sweep expired a listener and resolved it with a timeout.
    ///
    /// Sets:
    /// - `key`: listener key
    ListenerTimedOut,

    // === Routing events ===
    /// An event was taken off the inbound queue and matched against listeners.
    ///
    /// Sets:
    /// - `key`: event key
    /// - `count`: listeners that received it
    EventRouted,

    /// An event arrived for a key nobody waits on.
    ///
    /// Sets:
    /// - `key`: event key
    EventUnmatched,

    /// Periodic sweep finished.
    ///
    /// Sets:
    /// - `count`: listeners expired by this pass
    SweepCompleted,

    // === Shutdown events ===
    /// Shutdown started: `terminate()` was called, or every handle was dropped.
    ///
    /// Sets:
    /// - `reason`: `"handles_dropped"` on the drop path (unset after `terminate()`)
    TerminateRequested,

    /// The dispatcher flushed every pending listener and stopped.
    ///
    /// Sets:
    /// - `count`: listeners resolved with a termination error
    LoopTerminated,

    /// A `wait` or `send` arrived after termination.
    ///
    /// Sets:
    /// - `key`: key of the rejected call
    /// - `reason`: `"wait"` or `"send"`
    RejectedAfterTermination,

    // === Subscriber events ===
    /// A subscriber started or stopped missing records.
    ///
    /// Published once when a subscriber's queue first rejects a record, and once
    /// more when it accepts records again.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: `"full"` or `"closed"` on the first miss, `"recovered"` afterwards
    /// - `key`: key of the first missed record, if it had one
    /// - `count`: records missed so far (1 on the first miss)
    SubscriberOverflow,

    /// Subscriber panicked while processing a record.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    /// - `key`: key of the record being handled, if it had one
    SubscriberPanicked,
}

/// Loop activity with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`ActivityKind`]
#[derive(Clone, Debug)]
pub struct Activity {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Activity classification.
    pub kind: ActivityKind,

    /// Key involved, if applicable.
    pub key: Option<Arc<str>>,
    /// Number of listeners affected.
    pub count: Option<usize>,
    /// Listener TTL in milliseconds (compact).
    pub ttl_ms: Option<u32>,
    /// Human-readable reason (error labels, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Subscriber name (subscriber events only).
    pub subscriber: Option<&'static str>,
}

impl Activity {
    /// Creates a new record of the given kind with current timestamp and next sequence number.
    pub fn new(kind: ActivityKind) -> Self {
        Self {
            seq: ACTIVITY_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            count: None,
            ttl_ms: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Attaches a key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a listener count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a TTL (stored as milliseconds, saturating).
    #[inline]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let ms = u32::try_from(ttl.as_millis()).unwrap_or(u32::MAX);
        self.ttl_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow record about `missed` records.
    pub(crate) fn subscriber_overflow(
        subscriber: &'static str,
        reason: &'static str,
        missed: usize,
    ) -> Self {
        let mut a = Activity::new(ActivityKind::SubscriberOverflow)
            .with_reason(reason)
            .with_count(missed);
        a.subscriber = Some(subscriber);
        a
    }

    /// Creates a subscriber panic record.
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut a = Activity::new(ActivityKind::SubscriberPanicked).with_reason(info);
        a.subscriber = Some(subscriber);
        a
    }

    /// Overflow reports are never themselves reported as missed.
    #[inline]
    pub(crate) fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, ActivityKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Activity::new(ActivityKind::EventRouted);
        let b = Activity::new(ActivityKind::EventRouted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_ttl_saturates() {
        let a = Activity::new(ActivityKind::ListenerRegistered).with_ttl(Duration::MAX);
        assert_eq!(a.ttl_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_records() {
        let a = Activity::subscriber_overflow("audit", "full", 1);
        assert!(a.is_subscriber_overflow());
        assert_eq!(a.subscriber, Some("audit"));
        assert_eq!(a.reason.as_deref(), Some("full"));
        assert_eq!(a.count, Some(1));

        let p = Activity::subscriber_panicked("audit", "boom".to_string());
        assert_eq!(p.kind, ActivityKind::SubscriberPanicked);
        assert!(!p.is_subscriber_overflow());
    }
}
