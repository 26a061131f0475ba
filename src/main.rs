/// Omnichat gateway
///
/// - Webhooks da Evolution API (WhatsApp) e da Meta (Messenger / Instagram)
///   normalizados e gravados no inbox (empresa -> contato -> conversa -> mensagem)
/// - `POST /send-message` roteia a resposta para o provedor do canal da conversa

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use omnichat_gateway::config::Settings;
use omnichat_gateway::services::SendRouter;
use omnichat_gateway::store::{InboxStore, MemoryStore, PgStore};
use omnichat_gateway::utils::logging::*;
use omnichat_gateway::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar variáveis de ambiente do .env (opcional)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new()?;
    log_config_loaded(&settings.server.environment);

    let store = init_store(&settings).await?;
    let send_router = SendRouter::from_settings(&settings, store.clone())?;
    log_info(&format!("📡 Canais de envio: {:?}", send_router.channels()));

    let port = settings.server.port;
    let bind_address = format!("{}:{}", settings.server.host, port);
    let app_state = Arc::new(AppState::new(settings, store).with_send_router(send_router));
    let app = build_router(app_state);

    log_server_startup(port);
    let listener = TcpListener::bind(&bind_address).await?;
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Postgres quando `database.url` está definido; memória caso contrário
async fn init_store(settings: &Settings) -> anyhow::Result<Arc<dyn InboxStore>> {
    match settings.database.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            let store = PgStore::connect(url, settings.database.max_connections).await?;
            if settings.database.run_migrations {
                store.migrate().await?;
                log_info("✅ Migrations aplicadas");
            }
            log_info("✅ Postgres conectado");
            Ok(Arc::new(store))
        }
        None if settings.is_production() => {
            anyhow::bail!("DATABASE_URL is required in production")
        }
        None => {
            log_warning("⚠️  DATABASE_URL not configured - using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Failed to install SIGTERM handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
