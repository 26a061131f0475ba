use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_webhook_event(provider: &str, event: &str, account: &str) {
    info!("📥 Webhook {} recebido: evento '{}' (conta: {})", provider, event, account);
}

pub fn log_webhook_ignored(provider: &str, reason: &str) {
    debug!("Webhook {} ignorado: {}", provider, reason);
}

pub fn log_message_stored(conversation_id: &str, external_id: Option<&str>, direction: &str) {
    info!("💬 Mensagem {} gravada na conversa {} (external_id: {:?})",
          direction, conversation_id, external_id);
}

pub fn log_duplicate_message(external_id: &str) {
    info!("♻️ Mensagem duplicada ignorada: {}", external_id);
}

pub fn log_provider_send(provider: &str, conversation_id: &str) {
    info!("📤 Enviando mensagem via {} (conversa {})", provider, conversation_id);
}

pub fn log_provider_error(provider: &str, attempt: u32, error: &str) {
    error!("{} API error (tentativa {}): {}", provider, attempt, error);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Omnichat gateway starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
