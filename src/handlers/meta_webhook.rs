use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use meta_graph::webhooks::{verify_signature, verify_subscription, WebhookPayload};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use crate::models::AccountRef;
use crate::services::normalize_meta;
use crate::utils::logging::*;
use crate::utils::AppError;
use crate::AppState;

const ENDPOINT: &str = "/webhooks/meta";

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhooks/meta - handshake de inscrição
pub async fn verify_meta_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubscriptionQuery>,
) -> Result<String, StatusCode> {
    log_request_received(ENDPOINT, "GET");

    let expected = state.settings.meta.verify_token.as_deref().unwrap_or_default();
    if verify_subscription(query.mode.as_deref(), query.verify_token.as_deref(), expected) {
        log_info("✅ Webhook Meta verificado");
        Ok(query.challenge.unwrap_or_default())
    } else {
        log_warning("❌ Handshake do webhook Meta recusado");
        Err(StatusCode::FORBIDDEN)
    }
}

/// POST /webhooks/meta - mensagens e recibos do Messenger / Instagram
pub async fn handle_meta_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let start_time = Instant::now();
    log_request_received(ENDPOINT, "POST");

    match state.settings.meta.app_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => {
            let signature = headers.get("X-Hub-Signature-256").and_then(|v| v.to_str().ok());
            if !verify_signature(secret, signature, &body) {
                log_warning("❌ Assinatura inválida do webhook Meta!");
                return Err(AppError::Unauthorized("invalid X-Hub-Signature-256".to_string()));
            }
        }
        None if state.settings.is_production() => {
            log_error("🚨 META_APP_SECRET not configured in production! Rejecting webhook.");
            return Err(AppError::Unauthorized("webhook signature cannot be verified".to_string()));
        }
        None => log_warning("⚠️  META_APP_SECRET not configured - skipping signature check"),
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        log_validation_error("payload", &format!("Invalid JSON: {}", e));
        AppError::ValidationError(format!("Invalid Meta payload: {}", e))
    })?;

    let mut outcomes = Vec::new();
    for (account_id, event) in normalize_meta(&payload) {
        log_webhook_event("meta", &payload.object, &account_id);
        outcomes.push(state.ingestion.apply(&AccountRef::MetaAccount(account_id), event).await?);
    }

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed(ENDPOINT, 200, processing_time);

    Ok(Json(json!({
        "success": true,
        "object": payload.object,
        "outcomes": outcomes,
        "processing_time_ms": processing_time
    })))
}
