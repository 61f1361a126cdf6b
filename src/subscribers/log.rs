//! # LogWriter: simple activity printer
//!
//! A minimal subscriber that prints incoming [`Activity`] records to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [registered] key="bob" ttl_ms=15000
//! [routed] key="bob" delivered=1
//! [delivered] key="bob"
//! [timed-out] key="alice"
//! [sweep] expired=1
//! [terminate-requested]
//! [terminated] flushed=2
//! ```

use async_trait::async_trait;

use crate::activity::{Activity, ActivityKind};
use crate::subscribers::Subscribe;

/// Activity writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_activity(&self, a: &Activity) {
        let key = a.key.as_deref().unwrap_or("");
        match a.kind {
            ActivityKind::ListenerRegistered => {
                println!("[registered] key={key:?} ttl_ms={:?}", a.ttl_ms);
            }
            ActivityKind::ListenerDelivered => {
                println!("[delivered] key={key:?}");
            }
            ActivityKind::ListenerSkipped => {
                println!("[skipped-expired] key={key:?}");
            }
            ActivityKind::ListenerAbandoned => {
                println!("[abandoned] key={key:?} resolution={:?}", a.reason);
            }
            ActivityKind::ListenerTimedOut => {
                println!("[timed-out] key={key:?}");
            }
            ActivityKind::EventRouted => {
                println!("[routed] key={key:?} delivered={:?}", a.count);
            }
            ActivityKind::EventUnmatched => {
                println!("[unmatched] key={key:?}");
            }
            ActivityKind::SweepCompleted => {
                // Quiet unless something expired.
                if a.count.unwrap_or(0) > 0 {
                    println!("[sweep] expired={:?}", a.count);
                }
            }
            ActivityKind::TerminateRequested => match a.reason.as_deref() {
                Some(reason) => println!("[terminate-requested] reason={reason}"),
                None => println!("[terminate-requested]"),
            },
            ActivityKind::LoopTerminated => {
                println!("[terminated] flushed={:?}", a.count);
            }
            ActivityKind::RejectedAfterTermination => {
                println!("[rejected] key={key:?} op={:?}", a.reason);
            }
            ActivityKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={} reason={} key={key:?} missed={:?}",
                    a.subscriber.unwrap_or("unknown"),
                    a.reason.as_deref().unwrap_or("unknown"),
                    a.count,
                );
            }
            ActivityKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    a.subscriber.unwrap_or("unknown"),
                    a.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
