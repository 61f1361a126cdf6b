//! # Events routed from senders to waiters.
//!
//! An [`Event`] is what a producer hands to [`Loop::send`](crate::Loop::send)
//! and what a [`Waiter`](crate::Waiter) eventually resolves to. User-sent
//! events never carry an error; the loop builds the synthetic ones
//! ([`WaitError::TimedOut`], [`WaitError::Terminated`]) itself.
//!
//! ## Example
//! ```rust
//! use waitloop::{Event, WaitError};
//!
//! let ev = Event::with_data("bob", 42u32);
//! assert_eq!(&*ev.key, "bob");
//! assert!(ev.is_ok());
//! assert_eq!(ev.into_result(), Ok(Some(42)));
//!
//! let bare: Event = Event::new("alice");
//! assert_eq!(bare.into_result(), Ok(None));
//! ```

use std::sync::Arc;

use crate::error::WaitError;

/// Notification payload correlated to waiters by `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T = ()> {
    /// Key identifying which waiters this event satisfies.
    pub key: Arc<str>,
    /// Opaque payload, carried through unchanged.
    pub data: Option<T>,
    /// Set only on events the loop generates itself.
    pub error: Option<WaitError>,
}

impl<T> Event<T> {
    /// Creates an event without payload.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self {
            key: key.into(),
            data: None,
            error: None,
        }
    }

    /// Creates an event carrying `data`.
    pub fn with_data(key: impl Into<Arc<str>>, data: T) -> Self {
        Self {
            key: key.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Returns `true` if this is a real event (no timeout/termination).
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into the payload, or the error that resolved the wait.
    pub fn into_result(self) -> Result<Option<T>, WaitError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }

    #[inline]
    pub(crate) fn timed_out(key: Arc<str>) -> Self {
        Self {
            key,
            data: None,
            error: Some(WaitError::TimedOut),
        }
    }

    #[inline]
    pub(crate) fn terminated(key: Arc<str>) -> Self {
        Self {
            key,
            data: None,
            error: Some(WaitError::Terminated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_events_carry_no_data() {
        let ev: Event<u8> = Event::timed_out(Arc::from("k"));
        assert!(!ev.is_ok());
        assert_eq!(ev.data, None);
        assert_eq!(ev.into_result(), Err(WaitError::TimedOut));

        let ev: Event<u8> = Event::terminated(Arc::from("k"));
        assert_eq!(ev.into_result(), Err(WaitError::Terminated));
    }
}
