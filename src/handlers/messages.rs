use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{SendMessageRequest, SendMessageResponse};
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::AppState;

/// POST /send-message
pub async fn send_message(State(state): State<Arc<AppState>>, body: Bytes) -> AppResult<Json<SendMessageResponse>> {
    let start_time = Instant::now();
    log_request_received("/send-message", "POST");

    let request: SendMessageRequest = serde_json::from_slice(&body).map_err(|e| {
        log_validation_error("body", &e.to_string());
        AppError::ValidationError(format!("Invalid request body: {}", e))
    })?;

    let response = state.send_router.send(request).await?;

    log_request_processed("/send-message", 200, start_time.elapsed().as_millis() as u64);
    Ok(Json(response))
}

/// POST /conversations/{id}/read
pub async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    log_request_received("/conversations/:id/read", "POST");

    let conversation = state
        .store
        .mark_conversation_read(conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("conversation {}", conversation_id)))?;

    Ok(Json(json!({
        "success": true,
        "conversationId": conversation.id,
        "unreadCount": conversation.unread_count
    })))
}
