//! # Activity bus.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from the dispatcher and from the loop handles.
//!
//! ## Architecture
//! ```text
//! Publishers:                         Subscriber (one):
//!   Dispatcher ──┐
//!   Loop handle ─┼──► Bus ──────► activity_listener ────► SubscriberSet
//!   Workers ─────┘  (broadcast)     (spawned by LoopBuilder)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent records for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: records are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::record::Activity;

/// Broadcast channel for loop activity.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub(crate) struct Bus {
    tx: broadcast::Sender<Activity>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Activity>(capacity);
        Self { tx }
    }

    /// Publishes a record to all active receivers.
    ///
    /// If there are no receivers, the record is dropped.
    pub(crate) fn publish(&self, activity: Activity) {
        let _ = self.tx.send(activity);
    }

    /// Creates a new receiver that will observe subsequent records.
    ///
    /// A receiver only gets records **sent after** it subscribes.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Activity> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityKind;

    #[tokio::test]
    async fn test_subscriber_sees_later_records_only() {
        let bus = Bus::new(0);
        bus.publish(Activity::new(ActivityKind::EventUnmatched));

        let mut rx = bus.subscribe();
        bus.publish(Activity::new(ActivityKind::SweepCompleted).with_count(2));

        let got = rx.recv().await.expect("record");
        assert_eq!(got.kind, ActivityKind::SweepCompleted);
        assert_eq!(got.count, Some(2));
    }
}
