//! Delivery of composed messages.
//!
//! A [`MailTransport`] hands a [`Message`] to a provider. Sends may run in
//! the background; `must_wait` asks the transport to block the caller
//! (within its [`WaitPolicy`]) until the provider answered.

mod sendgrid;

pub use sendgrid::{SENDGRID_ENDPOINT, SendGridClient};

use crate::error::SendError;
use crate::types::Message;
use std::time::Duration;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Sends messages through a provider.
pub trait MailTransport: Send + Sync {
    /// Sends `message`.
    ///
    /// With `must_wait` the call returns once the provider answered or the
    /// wait policy ran out. Without it, or when the wait runs out, a send
    /// still in flight is reported as `Ok(())` and keeps running.
    ///
    /// # Errors
    ///
    /// Returns the failure reason when the send completed unsuccessfully
    /// before the caller stopped waiting.
    fn send(&self, message: &Message, must_wait: bool) -> Result<(), SendError>;
}

/// How long a caller blocks for a background send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Maximum number of polls.
    pub max_attempts: u32,
    /// Sleep between polls.
    pub interval: Duration,
}

impl WaitPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound of the time spent waiting.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// Polls `pending` until it resolves or the policy runs out.
    ///
    /// Giving up does not cancel the send: the task keeps running and its
    /// outcome is dropped.
    pub(crate) fn wait(
        &self,
        pending: &mut oneshot::Receiver<Result<(), SendError>>,
        must_wait: bool,
    ) -> Result<(), SendError> {
        let mut attempts = 0;

        loop {
            match pending.try_recv() {
                Ok(outcome) => return outcome,
                Err(TryRecvError::Closed) => return Err(SendError::Interrupted),
                Err(TryRecvError::Empty) => {}
            }

            if !must_wait || attempts >= self.max_attempts {
                break;
            }
            attempts += 1;
            std::thread::sleep(self.interval);
        }

        if must_wait {
            tracing::warn!(
                attempts,
                ceiling = ?self.ceiling(),
                "Send still pending after wait, continuing in background"
            );
        } else {
            tracing::debug!("Send continues in background");
        }
        Ok(())
    }
}

impl Default for WaitPolicy {
    /// 200 polls, 100 ms apart (about 20 seconds).
    fn default() -> Self {
        Self::new(200, Duration::from_millis(100))
    }
}
