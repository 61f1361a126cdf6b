//! # Loop configuration.
//!
//! Provides [`Config`], the settings a [`Loop`](crate::Loop) is built from.
//!
//! ## Sentinel values
//! Every field treats `0` as "use the default", so a partially filled config
//! (or `Config { default_ttl: ..., ..Config::zeroed() }`) behaves the same as
//! one with the defaults spelled out. Use the `*_or_default` accessors or
//! [`Config::normalized`] rather than reading fields directly.

use std::time::Duration;

/// Default inbound event queue size.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
/// Default inbound registration queue size.
pub const DEFAULT_REGISTRATION_CAPACITY: usize = 1024;
/// Default listener TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// Default interval between expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);
/// Default activity bus ring buffer size.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Configuration for a wait loop.
///
/// ## Field semantics
/// - `event_capacity`: bounded buffer for incoming events (`0` → 1024)
/// - `registration_capacity`: bounded buffer for new listeners (`0` → 1024)
/// - `default_ttl`: expiry applied by [`Loop::wait`](crate::Loop::wait) (`0s` → 1h)
/// - `sweep_interval`: how often expired listeners are pruned (`0s` → 5s)
/// - `bus_capacity`: activity bus ring buffer (`0` → 1024)
///
/// ## Notes
/// When a queue is full, `wait`/`send` wait for space. The defaults are sized
/// so that this does not happen under normal load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Size of the buffer for incoming events.
    pub event_capacity: usize,

    /// Size of the buffer for new listener registrations.
    pub registration_capacity: usize,

    /// Expiration applied to listeners registered without an explicit TTL.
    pub default_ttl: Duration,

    /// Interval at which expired listeners are swept and notified.
    ///
    /// A listener resolves with a timeout at most one interval after its TTL.
    pub sweep_interval: Duration,

    /// Capacity of the activity bus.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` records skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// A config with every field at its sentinel (all defaults).
    pub const fn zeroed() -> Self {
        Self {
            event_capacity: 0,
            registration_capacity: 0,
            default_ttl: Duration::ZERO,
            sweep_interval: Duration::ZERO,
            bus_capacity: 0,
        }
    }

    /// Event queue capacity, with `0` mapped to the default.
    #[inline]
    pub fn event_capacity_or_default(&self) -> usize {
        match self.event_capacity {
            0 => DEFAULT_EVENT_CAPACITY,
            n => n,
        }
    }

    /// Registration queue capacity, with `0` mapped to the default.
    #[inline]
    pub fn registration_capacity_or_default(&self) -> usize {
        match self.registration_capacity {
            0 => DEFAULT_REGISTRATION_CAPACITY,
            n => n,
        }
    }

    /// Default TTL, with zero mapped to one hour.
    #[inline]
    pub fn default_ttl_or_default(&self) -> Duration {
        if self.default_ttl.is_zero() {
            DEFAULT_TTL
        } else {
            self.default_ttl
        }
    }

    /// Sweep interval, with zero mapped to five seconds.
    #[inline]
    pub fn sweep_interval_or_default(&self) -> Duration {
        if self.sweep_interval.is_zero() {
            DEFAULT_SWEEP_INTERVAL
        } else {
            self.sweep_interval
        }
    }

    /// Bus capacity, with `0` mapped to the default.
    #[inline]
    pub fn bus_capacity_or_default(&self) -> usize {
        match self.bus_capacity {
            0 => DEFAULT_BUS_CAPACITY,
            n => n,
        }
    }

    /// Returns a copy with every sentinel replaced by its default.
    pub fn normalized(&self) -> Self {
        Self {
            event_capacity: self.event_capacity_or_default(),
            registration_capacity: self.registration_capacity_or_default(),
            default_ttl: self.default_ttl_or_default(),
            sweep_interval: self.sweep_interval_or_default(),
            bus_capacity: self.bus_capacity_or_default(),
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `event_capacity = 1024`
    /// - `registration_capacity = 1024`
    /// - `default_ttl = 1h`
    /// - `sweep_interval = 5s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            registration_capacity: DEFAULT_REGISTRATION_CAPACITY,
            default_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}
