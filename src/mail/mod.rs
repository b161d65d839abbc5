//! Notification dispatch module
//!
//! Abstraction over the external email-sending service invoked as a side
//! effect of workflow state transitions. Every send is best-effort from the
//! orchestrators' point of view; failures are logged, never surfaced to the
//! caller.

pub mod default;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use default::HttpNotificationDispatcher;

/// A notification to be rendered and delivered by the mail service.
///
/// The variant names double as the wire `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// New-member welcome sent after a registration is approved
    WelcomeApproved {
        recipient_email: String,
        first_name: String,
        organization_name: String,
    },
    /// Confirmation sent to the new primary contact after a reassignment
    ProfileUpdateApproved {
        recipient_email: String,
        organization_name: String,
    },
}

impl Notification {
    /// Recipient address for logging and test assertions.
    pub fn recipient(&self) -> &str {
        match self {
            Notification::WelcomeApproved {
                recipient_email, ..
            } => recipient_email,
            Notification::ProfileUpdateApproved {
                recipient_email, ..
            } => recipient_email,
        }
    }
}

/// Errors returned by the notification dispatcher.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail service returned status {status}")]
    UpstreamStatus { status: u16 },
    #[error("{0}")]
    Unexpected(String),
}

/// Interface to the external email capability.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), MailError>;
}

#[cfg(test)]
pub mod mock {
    //! Recording dispatcher used by workflow tests.

    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct MockNotificationDispatcher {
        sent: Mutex<Vec<Notification>>,
        fail_next: Mutex<bool>,
    }

    impl MockNotificationDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent send fail.
        pub fn arm_failure(&self) {
            *self.fail_next.lock().unwrap() = true;
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationDispatcher for MockNotificationDispatcher {
        async fn send(&self, notification: &Notification) -> Result<(), MailError> {
            if *self.fail_next.lock().unwrap() {
                return Err(MailError::Unexpected("send armed to fail".to_string()));
            }

            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_wire_discriminator() {
        let notification = Notification::WelcomeApproved {
            recipient_email: "new@school.edu".to_string(),
            first_name: "Pat".to_string(),
            organization_name: "Acme College".to_string(),
        };

        let wire = serde_json::to_value(&notification).unwrap();
        assert_eq!(wire["type"], "welcome_approved");
        assert_eq!(wire["recipient_email"], "new@school.edu");

        let notification = Notification::ProfileUpdateApproved {
            recipient_email: "cio@school.edu".to_string(),
            organization_name: "Acme College".to_string(),
        };
        let wire = serde_json::to_value(&notification).unwrap();
        assert_eq!(wire["type"], "profile_update_approved");
    }

    #[test]
    fn test_notification_recipient() {
        let notification: Notification = serde_json::from_value(json!({
            "type": "profile_update_approved",
            "recipient_email": "cio@school.edu",
            "organization_name": "Acme College"
        }))
        .unwrap();

        assert_eq!(notification.recipient(), "cio@school.edu");
    }
}
