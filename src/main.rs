mod config;
mod db;
mod error;
mod ids;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use tokio::signal;

use crate::config::{ServerConfig, StoreBackend};
use crate::services::session::{IdentityProvider, PgSessions, StaticSessions};
use crate::store::RecordStore;
use crate::store::memory::MemoryStore;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env().expect("invalid configuration");

    let (store, identity): (Arc<dyn RecordStore>, Arc<dyn IdentityProvider>) = match &config.backend {
        StoreBackend::Postgres(pg) => {
            let pool = db::init_pool(pg).await.expect("database init failed");
            (Arc::new(PgStore::new(pool.clone())), Arc::new(PgSessions::new(pool)))
        }
        StoreBackend::Memory(mem) => {
            let store = MemoryStore::new();
            for game_id in &mem.seed_games {
                store.seed_game(game_id.clone()).await;
            }
            tracing::warn!(
                games = mem.seed_games.len(),
                sessions = mem.sessions.len(),
                "memory backend in use; data is lost on restart"
            );
            (Arc::new(store), Arc::new(StaticSessions::new(mem.sessions.clone())))
        }
    };

    let backend = store.backend();
    let state = state::AppState::new(store, identity, config.tx_policy);
    let app = routes::app(state, &config);

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, backend, "cyoa server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
