//! Cliente HTTP para a Send API da Graph API

use crate::error::{GraphError, Result};
use crate::types::{SendRequest, SendResponse};
use reqwest::{Client as HttpClient, Response};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_VERSION: &str = "v18.0";

/// Cliente para a Graph API
///
/// Messenger e Instagram usam o mesmo endpoint `/me/messages`, autenticado pelo
/// token da página conectada. O token é por empresa, por isso é passado a cada
/// chamada e não guardado no cliente.
#[derive(Clone)]
pub struct GraphClient {
    http_client: HttpClient,
    base_url: String,
    version: String,
}

impl GraphClient {
    /// Cria um novo cliente (timeout total 30s, connect 5s)
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GraphError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into().trim_matches('/').to_string(),
        })
    }

    /// Envia uma mensagem para um usuário (PSID / IGSID)
    pub async fn send_message(&self, page_access_token: &str, request: &SendRequest) -> Result<SendResponse> {
        if page_access_token.is_empty() {
            return Err(GraphError::ConfigError("Page access token is empty".to_string()));
        }

        let url = format!("{}/{}/me/messages", self.base_url, self.version);

        tracing::debug!("POST {} (recipient {})", url, request.recipient.id);

        let response = self
            .http_client
            .post(&url)
            .query(&[("access_token", page_access_token)])
            .json(request)
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        Ok(response.json().await?)
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Graph API error ({}): {}", status_code, error_body);

        // Formato: { "error": { "message", "type", "code", "fbtrace_id" } }
        let (code, message) = match serde_json::from_str::<Value>(&error_body) {
            Ok(json) => {
                let error = json.get("error");
                let code = error.and_then(|e| e.get("code")).and_then(Value::as_i64);
                let message = error
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(error_body);
                (code, message)
            }
            Err(_) => (None, error_body),
        };

        Err(GraphError::ApiError {
            status: status_code,
            code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttachmentType, OutgoingMessage};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_text_message() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v18.0/me/messages")
                    .query_param("access_token", "page-token")
                    .json_body(json!({
                        "recipient": { "id": "psid-1" },
                        "messaging_type": "RESPONSE",
                        "message": { "text": "Oi!" }
                    }));
                then.status(200).json_body(json!({ "recipient_id": "psid-1", "message_id": "m_abc" }));
            })
            .await;

        let client = GraphClient::new(server.base_url(), "v18.0").unwrap();
        let response = client
            .send_message("page-token", &SendRequest::response("psid-1", OutgoingMessage::text("Oi!")))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.message_id, "m_abc");
    }

    #[tokio::test]
    async fn test_send_attachment_message() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v18.0/me/messages").json_body(json!({
                    "recipient": { "id": "ig-1" },
                    "messaging_type": "RESPONSE",
                    "message": {
                        "attachment": {
                            "type": "image",
                            "payload": { "url": "https://cdn.example.com/a.png", "is_reusable": true }
                        }
                    }
                }));
                then.status(200).json_body(json!({ "recipient_id": "ig-1", "message_id": "m_img" }));
            })
            .await;

        let client = GraphClient::new(server.base_url(), "v18.0").unwrap();
        let message = OutgoingMessage::attachment(AttachmentType::Image, "https://cdn.example.com/a.png");
        let response = client
            .send_message("token", &SendRequest::response("ig-1", message))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.message_id, "m_img");
    }

    #[tokio::test]
    async fn test_graph_error_is_parsed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v18.0/me/messages");
                then.status(400).json_body(json!({
                    "error": { "message": "(#100) No matching user found", "type": "OAuthException", "code": 100 }
                }));
            })
            .await;

        let client = GraphClient::new(server.base_url(), "v18.0").unwrap();
        let err = client
            .send_message("token", &SendRequest::response("nobody", OutgoingMessage::text("x")))
            .await
            .unwrap_err();

        match err {
            GraphError::ApiError { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(100));
                assert!(message.contains("No matching user"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected_before_request() {
        let client = GraphClient::new("http://127.0.0.1:9", "v18.0").unwrap();
        let err = client
            .send_message("", &SendRequest::response("x", OutgoingMessage::text("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::ConfigError(_)));
    }
}
