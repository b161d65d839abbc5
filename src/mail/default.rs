//! HTTP dispatcher posting notifications to the mail service endpoint.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{MailError, Notification, NotificationDispatcher};

/// Dispatcher that posts the serialized notification (with its `type`
/// discriminator) to the configured mail service.
#[derive(Debug, Clone)]
pub struct HttpNotificationDispatcher {
    client: Client,
    endpoint: Url,
    service_key: String,
}

impl HttpNotificationDispatcher {
    pub fn new(endpoint: Url, service_key: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            service_key,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), MailError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.service_key)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        tracing::debug!(
            recipient = notification.recipient(),
            "Notification dispatched"
        );
        Ok(())
    }
}
