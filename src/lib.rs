//! # waitloop
//!
//! **waitloop** is a keyed, one-shot wait/notify primitive for tokio.
//!
//! Callers register interest in a future event identified by a string key,
//! optionally with a time-to-live, and later receive that event (or a
//! timeout/termination error) asynchronously. Useful for request/response
//! correlation, rendezvous between independent producers and consumers, or
//! any completion identified by a key.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   wait("bob")          wait("bob")          send(Event{"bob"})      terminate()
//!        │                    │                      │                     │
//!        ▼                    ▼                      ▼                     ▼
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │  Loop (cloneable handle)                                                    │
//! │  - registrations: mpsc (Config::registration_capacity)                      │
//! │  - events:        mpsc (Config::event_capacity)                             │
//! │  - token:         CancellationToken                                         │
//! └──────┬───────────────────────────┬───────────────────────────┬──────────────┘
//!        ▼                           ▼                           ▼
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (single task, owns HashMap<key, Vec<Listener>>)                 │
//! │  select! { cancelled │ registration │ event │ sweep tick }                  │
//! └──────┬──────────────────────────────────────────────────────────────┬───────┘
//!        │ Slot::fill(Event)  (one-shot, never blocks)                  │
//!        ▼                                                              ▼
//!   Waiter ──► Event { key, data, error: None | TimedOut | Terminated } Bus ──► SubscriberSet
//! ```
//!
//! ### Lifecycle of a listener
//! ```text
//! wait(key, ttl) ──► queued ──► registered
//!   ├─► send(key) before expiry ─► delivered (error = None)
//!   ├─► ttl elapsed, sweep runs ─► TimedOut
//!   └─► terminate() / all handles dropped ─► Terminated
//! ```
//! Each listener resolves exactly once.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits               |
//! |-------------------|--------------------------------------------------------------|----------------------------------|
//! | **Loop**          | Register waits, send events, terminate.                      | [`Loop`], [`LoopBuilder`]        |
//! | **Delivery**      | One-shot future per wait, resolving to one event.            | [`Waiter`], [`Event`]            |
//! | **Errors**        | Synthetic outcomes delivered inside events.                  | [`WaitError`]                    |
//! | **Activity**      | Observe registrations, deliveries, timeouts, shutdown.       | [`Activity`], [`Subscribe`]      |
//! | **Configuration** | Queue sizes, default TTL, sweep interval.                    | [`Config`]                       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use waitloop::{Config, Event, Loop, WaitError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let lp: Loop<u32> = Loop::with_config(Config {
//!         default_ttl: Duration::from_secs(15),
//!         ..Config::default()
//!     });
//!
//!     let reply = lp.wait("req-1").await;
//!     lp.send(Event::with_data("req-1", 200)).await;
//!     assert_eq!(reply.await.into_result(), Ok(Some(200)));
//!
//!     let pending = lp.wait("req-2").await;
//!     lp.terminate();
//!     assert_eq!(pending.await.error, Some(WaitError::Terminated));
//!     lp.closed().await;
//! }
//! ```

mod activity;
mod core;
mod delivery;
mod error;
mod subscribers;

// ---- Public re-exports ----

pub use activity::{Activity, ActivityKind};
pub use core::{
    Config, DEFAULT_BUS_CAPACITY, DEFAULT_EVENT_CAPACITY, DEFAULT_REGISTRATION_CAPACITY,
    DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, Loop, LoopBuilder,
};
pub use delivery::{Event, Waiter};
pub use error::WaitError;
pub use subscribers::Subscribe;

// Optional: expose a simple built-in activity printer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
