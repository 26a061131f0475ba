//! Cliente HTTP para a Evolution API

use crate::error::{EvolutionError, Result};
use crate::types::{SendAudioRequest, SendMediaRequest, SendMessageResponse, SendTextRequest};
use reqwest::{Client as HttpClient, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Cliente para a Evolution API
///
/// Autentica com o header `apikey` (chave global do servidor Evolution).
/// Todas as rotas de envio são escopadas pelo nome da instância.
#[derive(Clone)]
pub struct EvolutionClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl EvolutionClient {
    /// Cria um novo cliente
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, api_key, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(EvolutionError::ConfigError("Evolution API base URL is empty".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| EvolutionError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Envia mensagem de texto
    pub async fn send_text(&self, instance: &str, request: &SendTextRequest) -> Result<SendMessageResponse> {
        self.post_json(&format!("/message/sendText/{}", instance), request).await
    }

    /// Envia imagem, vídeo ou documento a partir de uma URL
    pub async fn send_media(&self, instance: &str, request: &SendMediaRequest) -> Result<SendMessageResponse> {
        self.post_json(&format!("/message/sendMedia/{}", instance), request).await
    }

    /// Envia áudio como mensagem de voz
    pub async fn send_audio(&self, instance: &str, request: &SendAudioRequest) -> Result<SendMessageResponse> {
        self.post_json(&format!("/message/sendWhatsAppAudio/{}", instance), request).await
    }

    async fn post_json<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<SendMessageResponse> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        let parsed: SendMessageResponse = response.json().await?;

        if parsed.message_id().is_none() {
            return Err(EvolutionError::MissingMessageId);
        }

        Ok(parsed)
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Evolution API error ({}): {}", status_code, error_body);

        // A Evolution responde { status, error, response: { message: [...] } }
        let message = match serde_json::from_str::<Value>(&error_body) {
            Ok(json) => json
                .pointer("/response/message")
                .map(|m| match m {
                    Value::Array(items) => items
                        .iter()
                        .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                        .collect::<Vec<_>>()
                        .join("; "),
                    other => other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
                })
                .or_else(|| json.get("error").and_then(|v| v.as_str()).map(str::to_string))
                .unwrap_or(error_body),
            Err(_) => error_body,
        };

        Err(EvolutionError::ApiError {
            status: status_code,
            message,
        })
    }

    /// Obtém a URL base
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
