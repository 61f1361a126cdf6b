//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom handlers into the
//! loop's activity stream. Each subscriber is driven by a dedicated worker
//! fed by its own bounded queue.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block
//!   the dispatcher nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, records for that
//!   subscriber are **dropped**; a `SubscriberOverflow` record marks the first
//!   miss and another one the recovery.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use waitloop::{Activity, ActivityKind, Subscribe};
//!
//! #[derive(Default)]
//! struct TimeoutCounter(AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for TimeoutCounter {
//!     async fn on_activity(&self, a: &Activity) {
//!         if a.kind == ActivityKind::ListenerTimedOut {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "timeout_counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::activity::Activity;

/// Contract for activity subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single activity record.
    async fn on_activity(&self, activity: &Activity);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
