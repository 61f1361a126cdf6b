//! # Loop: the public handle to a dispatcher.
//!
//! A [`Loop`] is cheap to clone and safe to use from any number of tasks.
//! It never touches listener state itself; it only enqueues registrations and
//! events for the dispatcher task and flips the termination token.
//!
//! ## Lifecycle
//! ```text
//! Loop::new() / Loop::with_config() / LoopBuilder::build()
//!     └─► spawn Dispatcher::run()
//!
//! wait(key)      ─► registrations queue ─► Waiter ◄── event / TimedOut / Terminated
//! send(event)    ─► events queue
//! terminate()    ─► token.cancel() ─► dispatcher flushes ─► closed() resolves
//! drop(all)      ─► queues close   ─► same as terminate()
//! ```
//!
//! ## Queue policy
//! `wait` and `send` wait for space when their bounded queue is full. Once the
//! loop is terminated they return immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::builder::LoopBuilder;
use super::config::Config;
use super::dispatcher::Dispatcher;
use super::listener::Listener;
use crate::activity::{Activity, ActivityKind, Bus};
use crate::delivery::{Event, Waiter};

struct Inner<T> {
    registrations: mpsc::Sender<Listener<T>>,
    events: mpsc::Sender<Event<T>>,
    token: CancellationToken,
    stopped: CancellationToken,
    default_ttl: Duration,
    bus: Bus,
}

/// Handle to a keyed one-shot wait/notify dispatcher.
///
/// `T` is the payload type carried by [`Event::data`]; it is cloned once per
/// listener an event satisfies.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use waitloop::{Event, Loop, WaitError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let lp: Loop<String> = Loop::new();
///
/// let a = lp.wait("order-17").await;
/// let b = lp.wait("order-17").await;
/// lp.send(Event::with_data("order-17", "shipped".to_string())).await;
///
/// assert_eq!(a.await.into_result(), Ok(Some("shipped".to_string())));
/// assert_eq!(b.await.into_result(), Ok(Some("shipped".to_string())));
///
/// lp.terminate();
/// let late = lp.wait("order-18").await;
/// assert_eq!(late.await.error, Some(WaitError::Terminated));
/// # }
/// ```
pub struct Loop<T = ()> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Loop<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Loop<T> {
    /// Creates a loop with the default [`Config`].
    ///
    /// Must be called within a tokio runtime. Every call creates an
    /// independent loop.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a loop from `cfg`; zero fields take their defaults.
    pub fn with_config(cfg: Config) -> Self {
        LoopBuilder::new(cfg).build()
    }

    /// Spawns the dispatcher for an already normalized config.
    pub(crate) fn spawn(cfg: &Config, bus: Bus) -> Self {
        let (reg_tx, reg_rx) = mpsc::channel(cfg.registration_capacity_or_default());
        let (ev_tx, ev_rx) = mpsc::channel(cfg.event_capacity_or_default());
        let token = CancellationToken::new();
        let stopped = CancellationToken::new();

        let dispatcher = Dispatcher::new(
            reg_rx,
            ev_rx,
            token.clone(),
            stopped.clone(),
            cfg.sweep_interval_or_default(),
            bus.clone(),
        );
        tokio::spawn(dispatcher.run());

        Self {
            inner: Arc::new(Inner {
                registrations: reg_tx,
                events: ev_tx,
                token,
                stopped,
                default_ttl: cfg.default_ttl_or_default(),
                bus,
            }),
        }
    }

    /// Registers interest in `key` with the loop's default TTL.
    pub async fn wait(&self, key: impl Into<Arc<str>>) -> Waiter<T> {
        self.wait_ttl(key, self.inner.default_ttl).await
    }

    /// Registers interest in `key`, expiring after `ttl`.
    ///
    /// The waiter resolves with the first event sent for `key`, or with
    /// [`WaitError::TimedOut`](crate::WaitError::TimedOut) at most one sweep
    /// interval after `ttl` elapsed. On a terminated loop the waiter is
    /// already resolved with [`WaitError::Terminated`](crate::WaitError::Terminated).
    pub async fn wait_ttl(&self, key: impl Into<Arc<str>>, ttl: Duration) -> Waiter<T> {
        let key = key.into();
        if self.is_terminated() {
            self.reject(&key, "wait");
            return Waiter::resolved(Event::terminated(key));
        }

        let (listener, waiter) = Listener::new(key, ttl, Instant::now());
        // A closed queue hands the listener back; dropping it resolves the waiter as terminated.
        let _ = self.inner.registrations.send(listener).await;
        waiter
    }

    /// Enqueues `event` for delivery to every waiter on its key.
    ///
    /// No-op once the loop is terminated. Any `error` set on the event is
    /// cleared: only the loop produces error events.
    pub async fn send(&self, mut event: Event<T>) {
        if self.is_terminated() {
            self.reject(&event.key, "send");
            return;
        }
        event.error = None;
        let _ = self.inner.events.send(event).await;
    }

    /// Signals shutdown.
    ///
    /// Every pending waiter resolves with
    /// [`WaitError::Terminated`](crate::WaitError::Terminated). Only the first
    /// call publishes [`ActivityKind::TerminateRequested`]; later calls do nothing.
    pub fn terminate(&self) {
        if self.inner.token.is_cancelled() {
            return;
        }
        self.inner
            .bus
            .publish(Activity::new(ActivityKind::TerminateRequested));
        self.inner.token.cancel();
    }

    /// Whether the loop stopped accepting work: [`terminate`](Self::terminate)
    /// was called, or the dispatcher exited on its own.
    pub fn is_terminated(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes once the dispatcher has stopped and resolved every pending waiter.
    pub async fn closed(&self) {
        self.inner.stopped.cancelled().await;
    }

    /// Subscribes to this loop's activity stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Activity> {
        self.inner.bus.subscribe()
    }

    pub(crate) fn stopped_token(&self) -> CancellationToken {
        self.inner.stopped.clone()
    }

    fn reject(&self, key: &Arc<str>, op: &'static str) {
        self.inner.bus.publish(
            Activity::new(ActivityKind::RejectedAfterTermination)
                .with_key(Arc::clone(key))
                .with_reason(op),
        );
    }
}

impl<T: Clone + Send + 'static> Default for Loop<T> {
    fn default() -> Self {
        Self::new()
    }
}
