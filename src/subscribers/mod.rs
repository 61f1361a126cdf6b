//! # Activity subscribers.
//!
//! This module provides the [`Subscribe`] trait, the per-subscriber fan-out
//! used by `LoopBuilder` and (with the `logging` feature) the built-in `LogWriter`.
//!
//! ## Architecture
//! ```text
//! Dispatcher ── publish(Activity) ──► Bus ──► activity listener ──► SubscriberSet::emit
//!                                                                      │
//!                                                         ┌────────────┼────────────┐
//!                                                         ▼            ▼            ▼
//!                                                     LogWriter     Metrics      Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::SubscriberSet;
pub use subscribe::Subscribe;
