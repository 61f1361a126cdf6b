//! # Single-use delivery endpoint.
//!
//! [`Waiter`] is the read side of a listener: a future that resolves to
//! exactly one [`Event`]. The write side ([`Slot`]) lives inside the
//! dispatcher and is consumed when it fills the waiter.
//!
//! ## Rules
//! - **Exactly once**: a `Slot` is moved into [`Slot::fill`], so no listener can be written twice.
//! - **No reader required**: filling never blocks, even if nobody polls the waiter yet.
//! - **Never hangs**: if the slot is dropped unfilled (loop gone), the waiter resolves
//!   with [`WaitError::Terminated`](crate::WaitError::Terminated).
//! - **Fused**: once the event is taken, further polls stay pending and `try_take` returns `None`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::FusedFuture;
use tokio::sync::oneshot;

use super::event::Event;

/// Creates a connected slot/waiter pair for `key`.
pub(crate) fn pair<T>(key: Arc<str>) -> (Slot<T>, Waiter<T>) {
    let (tx, rx) = oneshot::channel();
    let waiter = Waiter {
        key,
        rx,
        done: false,
    };
    (Slot { tx }, waiter)
}

/// Write side of a delivery endpoint.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    tx: oneshot::Sender<Event<T>>,
}

impl<T> Slot<T> {
    /// Fills the waiter with `event`.
    ///
    /// Returns `false` if the waiter was dropped before delivery.
    pub(crate) fn fill(self, event: Event<T>) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Future resolving to the one [`Event`] a wait receives.
///
/// Returned by [`Loop::wait`](crate::Loop::wait) and
/// [`Loop::wait_ttl`](crate::Loop::wait_ttl).
///
/// ## Example
/// ```rust
/// use waitloop::{Event, Loop};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let lp: Loop<&'static str> = Loop::new();
/// let waiter = lp.wait("bob").await;
/// lp.send(Event::with_data("bob", "goodbye")).await;
///
/// let ev = waiter.await;
/// assert_eq!(ev.into_result(), Ok(Some("goodbye")));
/// # }
/// ```
#[derive(Debug)]
#[must_use = "a waiter does nothing unless awaited"]
pub struct Waiter<T = ()> {
    key: Arc<str>,
    rx: oneshot::Receiver<Event<T>>,
    done: bool,
}

impl<T> Waiter<T> {
    /// Creates a waiter that is already resolved with `event`.
    pub(crate) fn resolved(event: Event<T>) -> Self {
        let (slot, waiter) = pair(Arc::clone(&event.key));
        slot.fill(event);
        waiter
    }

    /// Key this waiter is registered on.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Takes the event if it has already arrived, without waiting.
    ///
    /// Returns `None` while the wait is still pending, and after the event
    /// was taken (by this method or by awaiting).
    pub fn try_take(&mut self) -> Option<Event<T>> {
        if self.done {
            return None;
        }
        let event = match self.rx.try_recv() {
            Ok(event) => event,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Event::terminated(Arc::clone(&self.key)),
        };
        self.done = true;
        Some(event)
    }
}

impl<T> Future for Waiter<T> {
    type Output = Event<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.done {
            return Poll::Pending;
        }
        let event = match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(event)) => event,
            Poll::Ready(Err(_)) => Event::terminated(Arc::clone(&self.key)),
        };
        self.done = true;
        Poll::Ready(event)
    }
}

impl<T> FusedFuture for Waiter<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaitError;

    #[tokio::test]
    async fn test_fill_resolves_waiter() {
        let (slot, waiter) = pair::<u32>(Arc::from("bob"));
        assert!(slot.fill(Event::with_data("bob", 7)));

        let ev = waiter.await;
        assert_eq!(ev.into_result(), Ok(Some(7)));
    }

    #[tokio::test]
    async fn test_dropped_slot_resolves_terminated() {
        let (slot, waiter) = pair::<()>(Arc::from("bob"));
        drop(slot);

        let ev = waiter.await;
        assert_eq!(&*ev.key, "bob");
        assert_eq!(ev.error, Some(WaitError::Terminated));
    }

    #[test]
    fn test_fill_after_waiter_dropped_reports_abandoned() {
        let (slot, waiter) = pair::<()>(Arc::from("bob"));
        drop(waiter);
        assert!(!slot.fill(Event::new("bob")));
    }

    #[test]
    fn test_try_take_yields_once() {
        let (slot, mut waiter) = pair::<()>(Arc::from("bob"));
        assert!(waiter.try_take().is_none());
        assert!(!waiter.is_terminated());

        slot.fill(Event::new("bob"));
        assert!(waiter.try_take().is_some_and(|ev| ev.is_ok()));
        assert!(waiter.is_terminated());
        assert!(waiter.try_take().is_none());
    }

    #[test]
    fn test_resolved_is_immediately_available() {
        let mut waiter = Waiter::<()>::resolved(Event::terminated(Arc::from("bob")));
        assert_eq!(waiter.key(), "bob");
        let ev = waiter.try_take();
        assert_eq!(ev.and_then(|e| e.error), Some(WaitError::Terminated));
    }
}
