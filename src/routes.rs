use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::middleware::require_api_key;
use crate::AppState;

/// Monta o router completo do gateway
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))
        // Webhooks (validação própria)
        .route("/webhooks/evolution", post(handle_evolution_webhook))
        .route("/webhooks/evolution/*event", post(handle_evolution_webhook_by_event))
        .route("/webhooks/meta", get(verify_meta_webhook).post(handle_meta_webhook));

    // Rotas de envio protegidas com X-Api-Key
    let protected_routes = Router::new()
        .route("/send-message", post(send_message))
        .route("/conversations/:id/read", post(mark_conversation_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
