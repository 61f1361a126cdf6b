//! # Activity fan-out to subscribers.
//!
//! [`SubscriberSet`] gives every subscriber its own bounded queue and worker
//! task, so a slow subscriber only ever delays itself and never the loop.
//!
//! ```text
//! emit(activity) ──► [queue: LogWriter] ──► worker ──► on_activity()
//!               └──► [queue: Custom]    ──► worker ──► on_activity()
//!                        │ full / closed
//!                        ▼
//!              SubscriberOverflow "full" (first miss, with key)
//!              ... records missed ...
//!              SubscriberOverflow "recovered" (count = total missed)
//! ```
//!
//! ## Rules
//! - Each subscriber sees records in publish order, minus the ones it missed.
//! - A run of misses is reported twice per subscriber, not once per record,
//!   so a stuck subscriber cannot flood the bus.
//! - A panic in `on_activity` is caught and published as `SubscriberPanicked`;
//!   the worker carries on with the next record.
//!
//! **Warning**: panics are caught through `AssertUnwindSafe`. A subscriber that
//! panics while holding a lock can leave its own state poisoned.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::activity::{Activity, Bus};
use crate::subscribers::Subscribe;

struct Queue {
    name: &'static str,
    sender: mpsc::Sender<Arc<Activity>>,
    /// Records missed since the subscriber last accepted one.
    missed: usize,
}

/// Per-subscriber queues and their worker tasks.
pub(crate) struct SubscriberSet {
    queues: Vec<Queue>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called within a tokio runtime.
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut queues = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let (sender, rx) = mpsc::channel(sub.queue_capacity().max(1));
            queues.push(Queue {
                name: sub.name(),
                sender,
                missed: 0,
            });
            workers.push(tokio::spawn(drive(sub, rx, bus.clone())));
        }
        Self {
            queues,
            workers,
            bus,
        }
    }

    /// Hands `activity` to every subscriber queue without waiting.
    pub(crate) fn emit(&mut self, activity: Activity) {
        let reportable = !activity.is_subscriber_overflow();
        let activity = Arc::new(activity);

        for queue in &mut self.queues {
            let reason = match queue.sender.try_send(Arc::clone(&activity)) {
                Ok(()) => {
                    if queue.missed > 0 {
                        self.bus.publish(Activity::subscriber_overflow(
                            queue.name,
                            "recovered",
                            queue.missed,
                        ));
                        queue.missed = 0;
                    }
                    continue;
                }
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            if !reportable {
                continue;
            }
            queue.missed += 1;
            if queue.missed == 1 {
                let mut report = Activity::subscriber_overflow(queue.name, reason, 1);
                report.key = activity.key.clone();
                self.bus.publish(report);
            }
        }
    }

    /// Closes every queue and waits for the workers to drain what is left.
    pub(crate) async fn shutdown(self) {
        drop(self.queues);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Feeds one subscriber until its queue closes.
async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Activity>>, bus: Bus) {
    while let Some(activity) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_activity(&activity))
            .catch_unwind()
            .await;
        if let Err(payload) = handled {
            let mut report = Activity::subscriber_panicked(sub.name(), panic_message(&*payload));
            report.key = activity.key.clone();
            bus.publish(report);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<ActivityKind>>);

    impl Collect {
        fn seen(&self) -> Vec<ActivityKind> {
            self.0.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_activity(&self, a: &Activity) {
            self.0.lock().expect("lock").push(a.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    struct Boom;

    #[async_trait]
    impl Subscribe for Boom {
        async fn on_activity(&self, _a: &Activity) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "boom"
        }
    }

    #[tokio::test]
    async fn test_fan_out_keeps_order_per_subscriber() {
        let collect = Arc::new(Collect::default());
        let mut set = SubscriberSet::new(vec![collect.clone() as Arc<dyn Subscribe>], Bus::new(16));

        set.emit(Activity::new(ActivityKind::ListenerRegistered));
        for _ in 0..10 {
            if collect.seen().len() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        set.emit(Activity::new(ActivityKind::ListenerDelivered));
        set.shutdown().await;

        assert_eq!(
            collect.seen(),
            vec![ActivityKind::ListenerRegistered, ActivityKind::ListenerDelivered]
        );
    }

    #[tokio::test]
    async fn test_missed_records_are_reported_once_per_run() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let collect = Arc::new(Collect::default());
        let mut set = SubscriberSet::new(vec![collect.clone() as Arc<dyn Subscribe>], bus);

        // The worker has not run yet: the first record fills the queue.
        set.emit(Activity::new(ActivityKind::ListenerRegistered).with_key("bob"));
        set.emit(Activity::new(ActivityKind::ListenerDelivered).with_key("bob"));
        set.emit(Activity::new(ActivityKind::EventRouted).with_key("alice"));

        let first = rx.try_recv().expect("first miss");
        assert_eq!(first.kind, ActivityKind::SubscriberOverflow);
        assert_eq!(first.subscriber, Some("collect"));
        assert_eq!(first.reason.as_deref(), Some("full"));
        assert_eq!(first.key.as_deref(), Some("bob"));
        assert_eq!(first.count, Some(1));
        assert!(rx.try_recv().is_err());

        for _ in 0..10 {
            if collect.seen().len() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        set.emit(Activity::new(ActivityKind::SweepCompleted));

        let recovered = rx.try_recv().expect("recovery");
        assert_eq!(recovered.reason.as_deref(), Some("recovered"));
        assert_eq!(recovered.count, Some(2));

        set.shutdown().await;
        assert_eq!(
            collect.seen(),
            vec![ActivityKind::ListenerRegistered, ActivityKind::SweepCompleted]
        );
    }

    #[tokio::test]
    async fn test_panic_is_reported_with_key() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let mut set = SubscriberSet::new(vec![Arc::new(Boom) as Arc<dyn Subscribe>], bus);

        set.emit(Activity::new(ActivityKind::EventUnmatched).with_key("bob"));
        set.shutdown().await;

        let got = rx.recv().await.expect("panic record");
        assert_eq!(got.kind, ActivityKind::SubscriberPanicked);
        assert_eq!(got.subscriber, Some("boom"));
        assert_eq!(got.reason.as_deref(), Some("boom"));
        assert_eq!(got.key.as_deref(), Some("bob"));
    }
}
