/// Middleware layer para o Axum router
///
/// - Autenticação por `X-Api-Key` nas rotas de envio

pub mod api_key;

pub use api_key::{require_api_key, API_KEY_HEADER};
