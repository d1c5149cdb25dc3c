//! Rate-limited, best-effort report dispatch.

use std::sync::Arc;

use crate::error::NotificationError;
use crate::ratelimit::{RateLimitDenial, RateLimiter};
use crate::traits::{Notification, NotificationGateway};

/// What happened to a dispatched report.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    /// Refused by the rate limiter; nothing was sent.
    Suppressed(RateLimitDenial),
    /// The gateway failed; the rate-limit record was rolled back.
    Failed(NotificationError),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }
}

/// Sends reports through a gateway, subject to a [`RateLimiter`].
///
/// Dispatch never fails from the caller's point of view: suppression and
/// delivery errors are logged and returned as a [`DispatchOutcome`].
pub struct Notifier {
    gateway: Arc<dyn NotificationGateway>,
    limiter: Arc<RateLimiter>,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn NotificationGateway>, limiter: Arc<RateLimiter>) -> Self {
        Self { gateway, limiter }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn dispatch(&self, notification: &Notification) -> DispatchOutcome {
        let kind = notification.kind();
        let permit = match self.limiter.try_acquire(kind) {
            Ok(permit) => permit,
            Err(denial) => {
                tracing::info!(%kind, "notification suppressed: {denial}");
                return DispatchOutcome::Suppressed(denial);
            }
        };

        match self.gateway.deliver(notification).await {
            Ok(()) => {
                tracing::info!(
                    %kind,
                    gateway = self.gateway.name(),
                    id = %notification.id,
                    "notification sent"
                );
                DispatchOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(
                    %kind,
                    gateway = self.gateway.name(),
                    "failed to send notification: {e}"
                );
                self.limiter.release(permit);
                DispatchOutcome::Failed(e)
            }
        }
    }
}
