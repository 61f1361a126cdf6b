//! Loop core: dispatcher, handle and configuration.
//!
//! The public API from this module is [`Loop`], [`LoopBuilder`] and [`Config`].
//!
//! Internal modules:
//! - [`dispatcher`]: the single task owning listener state (register, route, sweep, shutdown);
//! - [`listener`]: a pending registration and its expiry;
//! - [`handle`]: the cloneable front-end that enqueues work for the dispatcher;
//! - [`builder`]: wires bus, subscribers and dispatcher together.

mod builder;
mod config;
mod dispatcher;
mod handle;
mod listener;

pub use builder::LoopBuilder;
pub use config::{
    Config, DEFAULT_BUS_CAPACITY, DEFAULT_EVENT_CAPACITY, DEFAULT_REGISTRATION_CAPACITY,
    DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL,
};
pub use handle::Loop;
