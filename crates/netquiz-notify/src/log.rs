//! Gateway that only writes reports to the log.

use async_trait::async_trait;

use netquiz_core::error::NotificationError;
use netquiz_core::traits::{Notification, NotificationGateway};

use crate::template::render_params;

/// Logs every report at `info` instead of sending it anywhere.
#[derive(Debug, Clone, Default)]
pub struct LogGateway {
    recipient: String,
}

impl LogGateway {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl NotificationGateway for LogGateway {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let params = render_params(notification, &self.recipient);
        tracing::info!(
            kind = %notification.kind(),
            candidate = %params.candidate_name,
            id = %notification.id,
            "{}",
            params.message
        );
        tracing::debug!("detailed results:{}", params.detailed_results);
        Ok(())
    }
}
