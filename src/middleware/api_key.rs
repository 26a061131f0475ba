/// Middleware de autenticação das rotas de envio
///
/// Valida o header `X-Api-Key` contra `security.api_key` (env `API_KEY`).

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::utils::security::secret_matches;
use crate::AppState;

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// # Respostas
///
/// - segue para o handler quando a chave confere
/// - **401**: chave ausente ou inválida
/// - **503**: chave não configurada em produção
///
/// Em desenvolvimento, sem chave configurada, o acesso é liberado com warning.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let expected_key = state.settings.security.api_key.as_deref().filter(|k| !k.is_empty());
    let is_production = state.settings.is_production();

    match (expected_key, provided_key, is_production) {
        // Caso 1: chave configurada e correta
        (Some(expected), provided, _) if secret_matches(expected, provided) => {
            tracing::debug!("✅ API access granted");
            Ok(next.run(request).await)
        }

        // Caso 2: chave configurada mas incorreta/ausente
        (Some(_), provided, _) => {
            tracing::warn!(
                "❌ API access denied - Invalid or missing {}: {:?}",
                API_KEY_HEADER,
                provided.map(|_| "<redacted>")
            );
            Err(unauthorized_response())
        }

        // Caso 3: sem chave em DESENVOLVIMENTO - permite com warning
        (None, _, false) => {
            tracing::warn!("⚠️  API_KEY not configured - Allowing access in development mode");
            Ok(next.run(request).await)
        }

        // Caso 4: sem chave em PRODUÇÃO - bloqueia
        (None, _, true) => {
            tracing::error!("🚨 API_KEY not configured in production! Blocking access.");
            Err(service_unavailable_response())
        }
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "status": 401,
            "message": "Missing or invalid X-Api-Key header"
        })),
    )
        .into_response()
}

fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service Unavailable",
            "status": 503,
            "message": "API_KEY not configured on server"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::MemoryStore;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(api_key: Option<&str>, environment: &str) -> Router {
        let mut settings = Settings::default();
        settings.security.api_key = api_key.map(str::to_string);
        settings.server.environment = environment.to_string();
        let state = Arc::new(AppState::new(settings, Arc::new(MemoryStore::new())));

        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
            .with_state(state)
    }

    async fn status_for(app: Router, key: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().uri("/protected");
        if let Some(key) = key {
            request = request.header(API_KEY_HEADER, key);
        }
        app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_configured_key() {
        assert_eq!(status_for(app(Some("s3cret"), "production"), Some("s3cret")).await, StatusCode::OK);
        assert_eq!(status_for(app(Some("s3cret"), "production"), Some("nope")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(app(Some("s3cret"), "development"), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_key_depends_on_environment() {
        assert_eq!(status_for(app(None, "development"), None).await, StatusCode::OK);
        assert_eq!(status_for(app(None, "production"), None).await, StatusCode::SERVICE_UNAVAILABLE);
    }
}
