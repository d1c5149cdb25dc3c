//! EmailJS-compatible HTTP gateway.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use netquiz_core::error::NotificationError;
use netquiz_core::traits::{Notification, NotificationGateway, NotificationKind};

use crate::template::{render_params, TemplateParams};

pub const DEFAULT_BASE_URL: &str = "https://api.emailjs.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and routing for the EmailJS REST API.
#[derive(Clone)]
pub struct EmailJsSettings {
    pub service_id: String,
    pub completion_template_id: String,
    pub termination_template_id: String,
    pub public_key: String,
    pub recipient_email: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

/// Sends reports through the EmailJS `email/send` endpoint.
pub struct EmailJsGateway {
    settings: EmailJsSettings,
    base_url: String,
    client: reqwest::Client,
}

impl EmailJsGateway {
    pub fn new(settings: EmailJsSettings) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| {
                NotificationError::Misconfigured(format!("failed to build HTTP client: {e}"))
            })?;

        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    fn template_id(&self, kind: NotificationKind) -> &str {
        match kind {
            NotificationKind::Completion => &self.settings.completion_template_id,
            NotificationKind::Termination => &self.settings.termination_template_id,
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams,
}

#[async_trait]
impl NotificationGateway for EmailJsGateway {
    fn name(&self) -> &str {
        "emailjs"
    }

    #[instrument(skip(self, notification), fields(kind = %notification.kind(), id = %notification.id))]
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.settings.public_key.trim().is_empty() {
            return Err(NotificationError::Misconfigured(
                "EmailJS public key is not set".into(),
            ));
        }

        let body = SendRequest {
            service_id: &self.settings.service_id,
            template_id: self.template_id(notification.kind()),
            user_id: &self.settings.public_key,
            template_params: render_params(notification, &self.settings.recipient_email),
        };

        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", self.base_url))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout(self.settings.timeout_secs)
                } else {
                    NotificationError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(NotificationError::RateLimited);
        }
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status, message });
        }

        tracing::debug!(status, "EmailJS accepted report");
        Ok(())
    }
}
