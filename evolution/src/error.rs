//! Tipos de erro para o crate evolution

use thiserror::Error;

/// Erros do cliente da Evolution API
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Erro de requisição HTTP (conexão, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API (status code não-2xx)
    #[error("Evolution API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Resposta sem o id da mensagem enviada
    #[error("Evolution API response without message id")]
    MissingMessageId,
}

impl EvolutionError {
    /// Indica se vale a pena tentar de novo (429, 5xx, falha de conexão)
    pub fn is_transient(&self) -> bool {
        match self {
            // Timeout ou falha no meio da requisição pode já ter entregue a mensagem
            EvolutionError::HttpError(e) => e.is_connect(),
            EvolutionError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, EvolutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        let rate_limited = EvolutionError::ApiError { status: 429, message: "slow down".into() };
        let unavailable = EvolutionError::ApiError { status: 503, message: "down".into() };
        let bad_request = EvolutionError::ApiError { status: 400, message: "invalid number".into() };

        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!EvolutionError::MissingMessageId.is_transient());
    }
}
