//! Outbound message dispatch for scheduled handoffs.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MessagingConfig;
use crate::ConciergeError;

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub destination: String,
    pub body: String,
}

/// Service trait for delivering messages to an external contact.
#[async_trait]
pub trait MessagingService: Send + Sync {
    async fn dispatch(&self, message: OutboundMessage) -> Result<(), ConciergeError>;

    fn is_available(&self) -> bool;
}

/// HTTP dispatcher posting JSON to a configured endpoint.
pub struct HttpMessagingService {
    config: Option<MessagingConfig>,
    http: reqwest::Client,
}

impl HttpMessagingService {
    pub fn new(config: Option<MessagingConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingService for HttpMessagingService {
    async fn dispatch(&self, message: OutboundMessage) -> Result<(), ConciergeError> {
        let config = self.config.as_ref().ok_or_else(|| {
            ConciergeError::Unavailable("messaging backend is not configured".to_string())
        })?;

        let mut http_req = self.http.post(&config.endpoint).json(&message);
        if let Some(ref key) = config.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ConciergeError::Messaging(format!("dispatch request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ConciergeError::Messaging(format!(
                "dispatch error {status}: {body_text}"
            )));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.config.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_dispatch_is_unavailable() {
        let service = HttpMessagingService::new(None);
        assert!(!service.is_available());
        let err = service
            .dispatch(OutboundMessage {
                destination: "maria".to_string(),
                body: "hello".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ConciergeError::Unavailable(_)));
    }
}
