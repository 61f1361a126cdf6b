//! Delivery: the event payload and the single-use endpoint it travels through.
//!
//! ## Contents
//! - [`Event`] payload routed by key (or a synthetic timeout/termination)
//! - [`Waiter`] future returned by `wait`, resolving exactly once
//! - `Slot` (crate-private) write side held by the dispatcher

mod event;
mod waiter;

pub use event::Event;
pub use waiter::Waiter;

pub(crate) use waiter::{Slot, pair};
