//! Loop activity: record types and broadcast bus.
//!
//! This module groups the activity **data model** and the **bus** used to
//! publish/subscribe to what the dispatcher does: registrations, deliveries,
//! expirations and shutdown.
//!
//! ## Contents
//! - [`ActivityKind`], [`Activity`] classification and metadata
//! - `Bus` thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the dispatcher task, `Loop` handles (post-termination rejects),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the activity listener spawned by `LoopBuilder`, which fans
//!   out to the `SubscriberSet`.

mod bus;
mod record;

pub(crate) use bus::Bus;
pub use record::{Activity, ActivityKind};
