use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use crate::models::{AccountRef, EvolutionEnvelope};
use crate::services::{normalize_event_name, normalize_evolution};
use crate::utils::logging::*;
use crate::utils::security::secret_matches;
use crate::utils::{truncate_safe, AppError};
use crate::AppState;

const ENDPOINT: &str = "/webhooks/evolution";

/// POST /webhooks/evolution
pub async fn handle_evolution_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    process_evolution_webhook(&state, &headers, &body, None).await
}

/// POST /webhooks/evolution/{event} (modo "webhook by events" da Evolution)
pub async fn handle_evolution_webhook_by_event(
    State(state): State<Arc<AppState>>,
    Path(event): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    process_evolution_webhook(&state, &headers, &body, Some(event)).await
}

async fn process_evolution_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    path_event: Option<String>,
) -> Result<Json<Value>, AppError> {
    let start_time = Instant::now();
    log_request_received(ENDPOINT, "POST");

    tracing::debug!("Evolution payload: {}", truncate_safe(&String::from_utf8_lossy(body), 2_000));

    let expected_token = state.settings.evolution.webhook_token.as_deref().filter(|t| !t.is_empty());
    let header_token = headers.get("apikey").and_then(|v| v.to_str().ok());

    // Header presente: autentica antes de olhar o corpo
    if let (Some(expected), Some(provided)) = (expected_token, header_token) {
        if !secret_matches(expected, Some(provided)) {
            return Err(invalid_token());
        }
    }
    let body_token_required = expected_token.is_some() && header_token.is_none();

    let mut raw: Value = match serde_json::from_slice(body) {
        Ok(raw) => raw,
        Err(_) if body_token_required => return Err(invalid_token()),
        Err(e) => {
            log_validation_error("payload", &format!("Invalid JSON: {}", e));
            return Err(AppError::ValidationError(format!("Invalid JSON payload: {}", e)));
        }
    };

    if let Some(expected) = expected_token.filter(|_| body_token_required) {
        if !secret_matches(expected, raw.get("apikey").and_then(Value::as_str)) {
            return Err(invalid_token());
        }
    }

    // No modo por eventos o nome também vem na URL
    if let (Some(event), Some(object)) = (path_event, raw.as_object_mut()) {
        object.entry("event").or_insert_with(|| Value::String(event.trim_matches('/').to_string()));
    }

    let envelope: EvolutionEnvelope = serde_json::from_value(raw).map_err(|e| {
        log_validation_error("payload", &format!("Invalid envelope: {}", e));
        AppError::ValidationError(format!("Invalid Evolution payload: {}", e))
    })?;

    let event_name = normalize_event_name(&envelope.event);
    log_webhook_event("evolution", &event_name, &envelope.instance);

    let account = AccountRef::EvolutionInstance(envelope.instance.clone());
    let mut outcomes = Vec::new();
    for event in normalize_evolution(&envelope) {
        outcomes.push(state.ingestion.apply(&account, event).await?);
    }

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed(ENDPOINT, 200, processing_time);

    Ok(Json(json!({
        "success": true,
        "event": event_name,
        "instance": envelope.instance,
        "outcomes": outcomes,
        "processing_time_ms": processing_time
    })))
}

fn invalid_token() -> AppError {
    log_warning("❌ Webhook Evolution com apikey inválida");
    AppError::Unauthorized("invalid webhook token".to_string())
}
