use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{config::Config, handle::Loop};
use crate::{
    activity::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Loop`] with optional activity subscribers.
pub struct LoopBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl LoopBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets activity subscribers.
    ///
    /// Subscribers receive loop activity (registrations, deliveries,
    /// timeouts, shutdown) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the loop and starts its dispatcher.
    ///
    /// Initializes, in order:
    /// - the activity bus
    /// - the dispatcher task
    /// - subscriber workers and their listener, if any subscribers were given
    ///
    /// Must be called within a tokio runtime.
    pub fn build<T: Clone + Send + 'static>(self) -> Loop<T> {
        let cfg = self.cfg.normalized();
        let bus = Bus::new(cfg.bus_capacity);
        let lp = Loop::spawn(&cfg, bus.clone());

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            activity_listener(&bus, subs, lp.stopped_token());
        }
        lp
    }
}

/// Forwards bus records to the subscriber set until the loop has stopped.
fn activity_listener(bus: &Bus, mut subs: SubscriberSet, stopped: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(activity) => subs.emit(activity),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = stopped.cancelled() => break,
            }
        }
        subs.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, ActivityKind};
    use crate::delivery::Event;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Record(Mutex<Vec<ActivityKind>>);

    #[async_trait]
    impl Subscribe for Record {
        async fn on_activity(&self, a: &Activity) {
            self.0.lock().expect("lock").push(a.kind);
        }
    }

    #[tokio::test]
    async fn test_subscribers_observe_loop_activity() {
        let record = Arc::new(Record::default());
        let lp: Loop = LoopBuilder::new(Config::default())
            .with_subscribers(vec![record.clone() as Arc<dyn Subscribe>])
            .build();

        let waiter = lp.wait("bob").await;
        lp.send(Event::new("bob")).await;
        assert!(waiter.await.is_ok());

        lp.terminate();
        lp.closed().await;

        let mut seen = Vec::new();
        for _ in 0..200 {
            seen = record.0.lock().expect("lock").clone();
            if seen.contains(&ActivityKind::LoopTerminated) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(seen.contains(&ActivityKind::LoopTerminated));
        assert!(seen.contains(&ActivityKind::ListenerRegistered));
        assert!(seen.contains(&ActivityKind::ListenerDelivered));
        assert!(seen.contains(&ActivityKind::EventRouted));
    }
}
