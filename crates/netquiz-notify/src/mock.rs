//! Mock gateway for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use netquiz_core::error::NotificationError;
use netquiz_core::traits::{Notification, NotificationGateway};

/// A gateway that records deliveries instead of sending them.
///
/// Can be told to reject every report with a fixed HTTP status.
#[derive(Default)]
pub struct MockGateway {
    /// Reject every delivery with this status, if set.
    fail_with_status: Option<u16>,
    /// Number of delivery attempts.
    call_count: AtomicU32,
    /// Successfully delivered reports.
    delivered: Mutex<Vec<Notification>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that rejects every report with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    /// Get the number of delivery attempts.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get every successfully delivered report.
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(status) = self.fail_with_status {
            return Err(NotificationError::Rejected {
                status,
                message: "mock rejection".into(),
            });
        }

        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
