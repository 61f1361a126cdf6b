//! Error types delivered to waiters.
//!
//! The dispatcher never returns errors from its public operations. Instead,
//! the two ways a wait can end without a real event are carried inside the
//! delivered [`Event`](crate::Event) as a [`WaitError`]:
//!
//! - [`WaitError::TimedOut`]: the listener's TTL elapsed before a matching event arrived.
//! - [`WaitError::Terminated`]: the loop was shut down before or while the listener was pending.
//!
//! Both variants provide helper methods (`as_label`, `as_message`) for logs/metrics.

use thiserror::Error;

/// # Reasons a wait resolved without a real event.
///
/// These are synthetic: the dispatcher generates them itself and hands them
/// to the waiter as [`Event::error`](crate::Event::error).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitError {
    /// The listener's TTL elapsed before a matching event was sent.
    #[error("wait timed out")]
    TimedOut,

    /// The loop was terminated before an event came through.
    #[error("loop was terminated")]
    Terminated,
}

impl WaitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use waitloop::WaitError;
    ///
    /// assert_eq!(WaitError::TimedOut.as_label(), "wait_timed_out");
    /// assert_eq!(WaitError::Terminated.as_label(), "loop_terminated");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WaitError::TimedOut => "wait_timed_out",
            WaitError::Terminated => "loop_terminated",
        }
    }

    /// Returns a longer, human-readable explanation for end users.
    ///
    /// Unlike the `Display` text, it says what happened to the listener.
    ///
    /// # Example
    /// ```
    /// use waitloop::WaitError;
    ///
    /// assert_eq!(
    ///     WaitError::TimedOut.as_message(),
    ///     "listener ttl elapsed before a matching event"
    /// );
    /// ```
    pub fn as_message(&self) -> String {
        match self {
            WaitError::TimedOut => "listener ttl elapsed before a matching event".to_string(),
            WaitError::Terminated => "loop terminated while listener was pending".to_string(),
        }
    }

    /// Indicates whether the wait could succeed if registered again.
    ///
    /// A timed-out wait may be retried against the same loop; a terminated
    /// loop resolves every new wait immediately with [`WaitError::Terminated`].
    ///
    /// # Example
    /// ```
    /// use waitloop::WaitError;
    ///
    /// assert!(WaitError::TimedOut.is_retryable());
    /// assert!(!WaitError::Terminated.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, WaitError::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_loop_wording() {
        assert_eq!(WaitError::TimedOut.to_string(), "wait timed out");
        assert_eq!(WaitError::Terminated.to_string(), "loop was terminated");
    }

    #[test]
    fn test_labels_are_distinct() {
        assert_ne!(WaitError::TimedOut.as_label(), WaitError::Terminated.as_label());
    }
}
