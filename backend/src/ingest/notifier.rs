//! Webhook notifications sent when a job finishes.

use crate::ingest::error::NotifyError;
use common::model::notification::NotificationMessage;
use log::{debug, error};

pub const SUCCESS_TEXT: &str =
    "Seu arquivo foi processado com sucesso! Estou pronto para responder as suas perguntas.";
pub const FAILURE_TEXT: &str = "Ocorreu um erro ao processar seu arquivo";

/// Posts [`NotificationMessage`]s as JSON to a single webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// A `None` url is accepted here and reported by [`WebhookNotifier::send`].
    pub fn new(client: reqwest::Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    /// Sends one notification. Nothing is retried; the caller decides what an
    /// error means.
    pub async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let url = self.url.as_deref().ok_or(NotifyError::MissingUrl)?;
        let response = self.client.post(url).json(message).send().await?;
        let status = response.status();

        if !status.is_success() {
            error!("Webhook returned {} for chat_id={}", status, message.chat_id);
            return Err(NotifyError::Status(status));
        }

        debug!("Notification delivered to chat_id={}", message.chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "texto": SUCCESS_TEXT,
                "chat_id": "42",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(reqwest::Client::new(), Some(format!("{}/hook", server.uri())));
        notifier
            .send(&NotificationMessage::new("42", SUCCESS_TEXT))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(reqwest::Client::new(), Some(server.uri()));
        let err = notifier
            .send(&NotificationMessage::new("42", FAILURE_TEXT))
            .await
            .unwrap_err();
        match err {
            NotifyError::Status(status) => assert_eq!(status.as_u16(), 503),
            other => panic!("expected Status error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_url_is_an_error() {
        let notifier = WebhookNotifier::new(reqwest::Client::new(), None);
        let err = notifier
            .send(&NotificationMessage::new("42", FAILURE_TEXT))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::MissingUrl));
    }
}
