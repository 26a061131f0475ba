// Biblioteca do gateway omnichat
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use services::{IngestionService, SendRouter};
use store::InboxStore;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn InboxStore>,
    pub ingestion: IngestionService,
    pub send_router: SendRouter,
}

impl AppState {
    /// Estado sem provedores de envio; use [`AppState::with_send_router`] para registrá-los
    pub fn new(settings: config::Settings, store: Arc<dyn InboxStore>) -> Self {
        Self {
            ingestion: IngestionService::new(store.clone()),
            send_router: SendRouter::new(store.clone()),
            settings,
            store,
        }
    }

    pub fn with_send_router(mut self, send_router: SendRouter) -> Self {
        self.send_router = send_router;
        self
    }
}

pub use routes::build_router;
