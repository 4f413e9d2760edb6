//! Chat relay server binary.
//!
//! Loads configuration from `CHAT_RELAY__*` environment variables, connects
//! to Redis, and serves the WebSocket, history and health routes until
//! Ctrl-C is received.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::adapters::http::{relay_router, HistoryAppState};
use chat_relay::adapters::websocket::WebSocketState;
use chat_relay::adapters::{RedisHistoryStore, RedisMessageBus};
use chat_relay::application::{ConnectionHandler, GetHistoryHandler, PresenceRegistry};
use chat_relay::config::AppConfig;
use chat_relay::ports::{HistoryStore, MessageBus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let client = redis::Client::open(config.redis.url.as_str())?;
    let conn = tokio::time::timeout(
        config.redis.timeout(),
        client.get_multiplexed_tokio_connection(),
    )
    .await
    .map_err(|_| "timed out connecting to Redis")??;
    info!(timeout_secs = config.redis.timeout_secs, "Connected to Redis");

    let bus: Arc<dyn MessageBus> = Arc::new(RedisMessageBus::new(client, conn.clone()));
    let history: Arc<dyn HistoryStore> = Arc::new(RedisHistoryStore::new(conn));
    let presence = Arc::new(PresenceRegistry::new());

    let connections = Arc::new(
        ConnectionHandler::new(bus, Arc::clone(&history), presence)
            .with_relay_timeout(config.redis.timeout()),
    );
    let get_history = Arc::new(GetHistoryHandler::new(
        history,
        config.chat.history_length,
    ));

    let app = relay_router(
        WebSocketState::new(connections),
        HistoryAppState::new(get_history),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        environment = ?config.server.environment,
        history_length = config.chat.history_length,
        "Chat relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chat relay stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
