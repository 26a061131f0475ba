//! Tipos de erro para o crate meta_graph

use thiserror::Error;

/// Códigos da Graph API que indicam limite de taxa ou indisponibilidade temporária
const TRANSIENT_GRAPH_CODES: &[i64] = &[1, 2, 4, 17, 32, 341, 613];

/// Erros do cliente da Graph API
#[derive(Debug, Error)]
pub enum GraphError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro retornado pela Graph API
    #[error("Graph API error (status {status}, code {code:?}): {message}")]
    ApiError {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GraphError {
    /// Indica se vale a pena tentar de novo
    pub fn is_transient(&self) -> bool {
        match self {
            // Timeout ou falha no meio da requisição pode já ter entregue a mensagem
            GraphError::HttpError(e) => e.is_connect(),
            GraphError::ApiError { status, code, .. } => {
                *status == 429
                    || *status >= 500
                    || code.map_or(false, |c| TRANSIENT_GRAPH_CODES.contains(&c))
            }
            _ => false,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_codes_are_transient() {
        let throttled = GraphError::ApiError { status: 400, code: Some(613), message: "Calls to this api have exceeded the rate limit".into() };
        let invalid_token = GraphError::ApiError { status: 400, code: Some(190), message: "Invalid OAuth access token".into() };
        let outage = GraphError::ApiError { status: 500, code: None, message: "".into() };

        assert!(throttled.is_transient());
        assert!(!invalid_token.is_transient());
        assert!(outage.is_transient());
    }
}
