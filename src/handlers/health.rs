use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

const SERVICE_NAME: &str = "omnichat-gateway";

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Pronto quando o store responde
pub async fn ready_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    log_health_check();

    let (ready, database) = match state.store.ping().await {
        Ok(()) => (true, json!({ "status": "connected" })),
        Err(e) => {
            log_error(&format!("❌ Store indisponível: {}", e));
            (false, json!({ "status": "disconnected" }))
        }
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "ready": ready,
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "dependencies": { "database": database }
        })),
    )
}

/// Integrações configuradas (sem segredos)
pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let settings = &state.settings;
    let configured = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
    let storage = if configured(&settings.database.url) { "postgres" } else { "memory" };

    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": settings.server.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "storage": storage,
        "integrations": {
            "evolution": {
                "configured": settings.evolution_configured(),
                "webhook_token_configured": configured(&settings.evolution.webhook_token)
            },
            "meta": {
                "graph_version": settings.meta.graph_version,
                "app_secret_configured": configured(&settings.meta.app_secret),
                "verify_token_configured": configured(&settings.meta.verify_token)
            }
        },
        "routing": {
            "channels": state.send_router.channels()
        },
        "delivery": {
            "max_attempts": settings.delivery.max_attempts,
            "initial_backoff_ms": settings.delivery.initial_backoff_ms
        },
        "api_key_configured": configured(&settings.security.api_key)
    }))
}
