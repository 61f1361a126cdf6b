//! # Dispatcher: the single task that owns all listener state.
//!
//! Every mutation of the key → listeners map happens here. Callers only reach
//! it through the bounded inbound queues and the termination token, so the
//! map needs no lock.
//!
//! ## Event sources
//! ```text
//!                ┌──────────────────────────────────────────────┐
//!  terminate() ─►│ token.cancelled()    ─► shutdown(), exit     │
//!  interval    ─►│ sweep.tick()         ─► sweep(now)           │
//!  wait()      ─►│ registrations.recv() ─► register(listener)   │
//!  send()      ─►│ events.recv()        ─► route(event, now)    │
//!                └──────────────────────────────────────────────┘
//!                     select! (biased, top to bottom)
//! ```
//!
//! ## Rules
//! - Termination is checked first, then the sweep tick, then registrations,
//!   then events. A `wait` that returned before a `send` was issued is always
//!   registered before that event is routed.
//! - The tick is ready at most once per interval, so it runs even under a
//!   steady stream of registrations and events. Sweep intervals longer than
//!   ~30 years are capped.
//! - Routing takes the whole sequence for a key. Unexpired listeners receive a
//!   clone of the event; expired ones are skipped and put back for the sweep
//!   to time out, so each listener is still resolved exactly once.
//! - Delivery writes into a one-shot slot and never waits for the reader.
//! - Keys with no pending listeners are removed from the map.
//! - Closed inbound queues (every handle dropped) shut down like `terminate()`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::listener::{FAR_FUTURE, Listener, deadline};
use crate::activity::{Activity, ActivityKind, Bus};
use crate::delivery::Event;

/// Owner of the listener map; runs as one spawned task.
pub(crate) struct Dispatcher<T> {
    listeners: HashMap<Arc<str>, Vec<Listener<T>>>,
    terminated: bool,
    registrations: mpsc::Receiver<Listener<T>>,
    events: mpsc::Receiver<Event<T>>,
    token: CancellationToken,
    stopped: CancellationToken,
    sweep_interval: Duration,
    bus: Bus,
}

impl<T: Clone> Dispatcher<T> {
    pub(crate) fn new(
        registrations: mpsc::Receiver<Listener<T>>,
        events: mpsc::Receiver<Event<T>>,
        token: CancellationToken,
        stopped: CancellationToken,
        sweep_interval: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            listeners: HashMap::new(),
            terminated: false,
            registrations,
            events,
            token,
            stopped,
            sweep_interval,
            bus,
        }
    }

    /// Processes inbound work until terminated, then flushes and signals `stopped`.
    ///
    /// `stopped` (and the termination token) are cancelled on every exit path,
    /// unwinding included, so `Loop::closed` cannot hang.
    pub(crate) async fn run(mut self) {
        let _stopped = self.stopped.clone().drop_guard();
        let _terminated = self.token.clone().drop_guard();

        let period = self.sweep_interval.min(FAR_FUTURE);
        let mut sweep = time::interval_at(deadline(Instant::now(), period), period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handles_dropped = loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break false,
                _ = sweep.tick() => self.sweep(Instant::now()),
                reg = self.registrations.recv() => match reg {
                    Some(listener) => self.register(listener),
                    None => break true,
                },
                ev = self.events.recv() => match ev {
                    Some(event) => self.route(event, Instant::now()),
                    None => break true,
                },
            }
        };

        if handles_dropped {
            self.bus.publish(
                Activity::new(ActivityKind::TerminateRequested).with_reason("handles_dropped"),
            );
        }
        self.shutdown();
    }

    /// Appends a listener to its key's sequence.
    fn register(&mut self, listener: Listener<T>) {
        if self.terminated {
            resolve(&self.bus, listener, Event::terminated);
            return;
        }
        self.bus.publish(
            Activity::new(ActivityKind::ListenerRegistered)
                .with_key(Arc::clone(&listener.key))
                .with_ttl(listener.expires_at.saturating_duration_since(Instant::now())),
        );
        self.listeners
            .entry(Arc::clone(&listener.key))
            .or_default()
            .push(listener);
    }

    /// Delivers `event` to every unexpired listener on its key.
    fn route(&mut self, event: Event<T>, now: Instant) {
        if self.terminated {
            return;
        }
        let Some(pending) = self.listeners.remove(&event.key) else {
            self.bus
                .publish(Activity::new(ActivityKind::EventUnmatched).with_key(Arc::clone(&event.key)));
            return;
        };

        let mut delivered = 0usize;
        let mut expired = Vec::new();
        for listener in pending {
            if listener.is_expired(now) {
                self.bus.publish(
                    Activity::new(ActivityKind::ListenerSkipped).with_key(Arc::clone(&listener.key)),
                );
                expired.push(listener);
                continue;
            }
            let key = Arc::clone(&listener.key);
            if listener.resolve(event.clone()) {
                delivered += 1;
                self.bus
                    .publish(Activity::new(ActivityKind::ListenerDelivered).with_key(key));
            } else {
                self.bus.publish(
                    Activity::new(ActivityKind::ListenerAbandoned)
                        .with_key(key)
                        .with_reason("delivered"),
                );
            }
        }
        if !expired.is_empty() {
            self.listeners.insert(Arc::clone(&event.key), expired);
        }

        self.bus.publish(
            Activity::new(ActivityKind::EventRouted)
                .with_key(event.key)
                .with_count(delivered),
        );
    }

    /// Removes every expired listener and resolves it with a timeout.
    fn sweep(&mut self, now: Instant) {
        if self.terminated {
            return;
        }
        let mut expired = Vec::new();
        self.listeners.retain(|_, pending| {
            let (gone, live): (Vec<_>, Vec<_>) = std::mem::take(pending)
                .into_iter()
                .partition(|l| l.is_expired(now));
            *pending = live;
            expired.extend(gone);
            !pending.is_empty()
        });

        let count = expired.len();
        for listener in expired {
            self.bus.publish(
                Activity::new(ActivityKind::ListenerTimedOut).with_key(Arc::clone(&listener.key)),
            );
            resolve(&self.bus, listener, Event::timed_out);
        }
        self.bus
            .publish(Activity::new(ActivityKind::SweepCompleted).with_count(count));
    }

    /// Stops accepting work and resolves everything still pending as terminated.
    ///
    /// Registrations already queued are flushed too; queued events are discarded.
    fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.registrations.close();
        self.events.close();

        let mut flushed = 0usize;
        while let Ok(listener) = self.registrations.try_recv() {
            resolve(&self.bus, listener, Event::terminated);
            flushed += 1;
        }
        while self.events.try_recv().is_ok() {}

        for (_, pending) in self.listeners.drain() {
            for listener in pending {
                resolve(&self.bus, listener, Event::terminated);
                flushed += 1;
            }
        }

        self.bus
            .publish(Activity::new(ActivityKind::LoopTerminated).with_count(flushed));
    }
}

/// Resolves `listener` with a synthetic event built from its key.
fn resolve<T>(bus: &Bus, listener: Listener<T>, make: fn(Arc<str>) -> Event<T>) {
    let key = Arc::clone(&listener.key);
    let event = make(Arc::clone(&key));
    let label = event.error.map_or("delivered", |e| e.as_label());
    if !listener.resolve(event) {
        bus.publish(
            Activity::new(ActivityKind::ListenerAbandoned)
                .with_key(key)
                .with_reason(label),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::Waiter;
    use crate::error::WaitError;

    const SWEEP: Duration = Duration::from_secs(5);

    struct Harness {
        dispatcher: Dispatcher<u32>,
        _reg_tx: mpsc::Sender<Listener<u32>>,
        _ev_tx: mpsc::Sender<Event<u32>>,
    }

    fn harness() -> Harness {
        let (reg_tx, reg_rx) = mpsc::channel(8);
        let (ev_tx, ev_rx) = mpsc::channel(8);
        let dispatcher = Dispatcher::new(
            reg_rx,
            ev_rx,
            CancellationToken::new(),
            CancellationToken::new(),
            SWEEP,
            Bus::new(64),
        );
        Harness {
            dispatcher,
            _reg_tx: reg_tx,
            _ev_tx: ev_tx,
        }
    }

    fn listen(d: &mut Dispatcher<u32>, key: &str, ttl: Duration, now: Instant) -> Waiter<u32> {
        let (listener, waiter) = Listener::new(Arc::from(key), ttl, now);
        d.register(listener);
        waiter
    }

    #[test]
    fn test_route_delivers_to_all_listeners_on_key() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        let mut a = listen(d, "bob", Duration::from_secs(60), now);
        let mut b = listen(d, "bob", Duration::from_secs(60), now);

        d.route(Event::with_data("bob", 9), now);

        assert_eq!(a.try_take().and_then(|e| e.data), Some(9));
        assert_eq!(b.try_take().and_then(|e| e.data), Some(9));
        assert!(d.listeners.is_empty());
    }

    #[test]
    fn test_route_is_key_isolated() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        let mut bob = listen(d, "bob", Duration::from_secs(60), now);
        let mut alice = listen(d, "alice", Duration::from_secs(60), now);

        d.route(Event::new("bob"), now);

        assert!(bob.try_take().is_some());
        assert!(alice.try_take().is_none());
        assert_eq!(d.listeners.len(), 1);
        assert!(d.listeners.contains_key("alice"));
    }

    #[test]
    fn test_registration_order_is_kept_per_key() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        let _first = listen(d, "bob", Duration::from_secs(1), now);
        let _second = listen(d, "bob", Duration::from_secs(2), now);
        let _third = listen(d, "bob", Duration::from_secs(3), now);

        let order: Vec<Instant> = d.listeners["bob"].iter().map(|l| l.expires_at).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn test_route_skips_expired_and_leaves_them_for_sweep() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        let mut stale = listen(d, "bob", Duration::from_millis(1), now);
        let mut fresh = listen(d, "bob", Duration::from_secs(60), now);

        let later = now + Duration::from_millis(5);
        d.route(Event::with_data("bob", 1), later);

        assert_eq!(fresh.try_take().and_then(|e| e.data), Some(1));
        assert!(stale.try_take().is_none());
        assert_eq!(d.listeners["bob"].len(), 1);

        d.sweep(later);
        let ev = stale.try_take().expect("timed out");
        assert_eq!(ev.error, Some(WaitError::TimedOut));
        assert_eq!(ev.data, None);
        assert!(d.listeners.is_empty());
    }

    #[test]
    fn test_sweep_expires_only_elapsed_and_prunes_keys() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        let mut short = listen(d, "bob", Duration::from_secs(1), now);
        let mut long = listen(d, "bob", Duration::from_secs(100), now);
        let mut other = listen(d, "alice", Duration::from_secs(1), now);

        d.sweep(now + Duration::from_secs(2));

        assert_eq!(short.try_take().and_then(|e| e.error), Some(WaitError::TimedOut));
        assert_eq!(other.try_take().and_then(|e| e.error), Some(WaitError::TimedOut));
        assert!(long.try_take().is_none());
        assert!(!d.listeners.contains_key("alice"));
        assert_eq!(d.listeners["bob"].len(), 1);
    }

    #[test]
    fn test_sweep_removes_consecutive_expired_listeners() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        let mut waiters: Vec<_> = (0..4)
            .map(|_| listen(d, "bob", Duration::from_millis(1), now))
            .collect();

        d.sweep(now + Duration::from_secs(1));

        for w in &mut waiters {
            assert_eq!(w.try_take().and_then(|e| e.error), Some(WaitError::TimedOut));
        }
        assert!(d.listeners.is_empty());
    }

    #[test]
    fn test_shutdown_flushes_pending_and_queued_registrations() {
        let (reg_tx, reg_rx) = mpsc::channel(8);
        let (_ev_tx, ev_rx) = mpsc::channel::<Event<u32>>(8);
        let mut d = Dispatcher::new(
            reg_rx,
            ev_rx,
            CancellationToken::new(),
            CancellationToken::new(),
            SWEEP,
            Bus::new(64),
        );
        let now = Instant::now();
        let mut registered = listen(&mut d, "bob", Duration::from_secs(60), now);

        let (queued, mut queued_waiter) = Listener::new(Arc::from("alice"), Duration::from_secs(60), now);
        reg_tx.try_send(queued).expect("queue has room");

        d.shutdown();

        assert_eq!(
            registered.try_take().and_then(|e| e.error),
            Some(WaitError::Terminated)
        );
        assert_eq!(
            queued_waiter.try_take().and_then(|e| e.error),
            Some(WaitError::Terminated)
        );
        assert!(d.listeners.is_empty());
        assert!(reg_tx.is_closed());
    }

    #[test]
    fn test_after_shutdown_nothing_is_retained() {
        let mut h = harness();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        d.shutdown();

        let mut late = listen(d, "bob", Duration::from_secs(60), now);
        d.route(Event::new("bob"), now);

        assert_eq!(late.try_take().and_then(|e| e.error), Some(WaitError::Terminated));
        assert!(d.listeners.is_empty());
    }

    #[test]
    fn test_abandoned_waiter_does_not_disturb_others() {
        let mut h = harness();
        let mut rx = h.dispatcher.bus.subscribe();
        let d = &mut h.dispatcher;
        let now = Instant::now();
        drop(listen(d, "bob", Duration::from_secs(60), now));
        let mut kept = listen(d, "bob", Duration::from_secs(60), now);

        d.route(Event::with_data("bob", 3), now);
        assert_eq!(kept.try_take().and_then(|e| e.data), Some(3));

        let mut kinds = Vec::new();
        while let Ok(a) = rx.try_recv() {
            kinds.push(a.kind);
        }
        assert!(kinds.contains(&ActivityKind::ListenerAbandoned));
        assert!(kinds.contains(&ActivityKind::ListenerDelivered));
    }
}
