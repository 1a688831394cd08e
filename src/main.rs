mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use config::Config;
use db::{DBClient, InboxStore, MemoryStore};
use dotenv::dotenv;
use routes::create_router;
use service::{
    bridge::{DisabledBridge, WhatsAppBridge, WppConnectBridge},
    realtime::RealtimeHub,
    sync_service::ChatSyncService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn InboxStore>,
    pub hub: Arc<RealtimeHub>,
    pub bridge: Arc<dyn WhatsAppBridge>,
    pub sync_service: ChatSyncService,
}

impl AppState {
    pub fn new(env: Config, db_client: Arc<dyn InboxStore>, bridge: Arc<dyn WhatsAppBridge>) -> Self {
        let hub = Arc::new(RealtimeHub::new());
        let sync_service = ChatSyncService::new(db_client.clone(), hub.clone(), bridge.clone());

        AppState {
            env,
            db_client,
            hub,
            bridge,
            sync_service,
        }
    }
}

async fn connect_store(config: &Config) -> Arc<dyn InboxStore> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
        return Arc::new(MemoryStore::new());
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!(error = ?err, "Failed to connect to the database");
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);
    if let Err(err) = db_client.migrate().await {
        tracing::error!(error = %err, "Failed to run database migrations");
        std::process::exit(1);
    }

    Arc::new(db_client)
}

fn build_bridge(config: &Config) -> Arc<dyn WhatsAppBridge> {
    let Some(bridge_url) = &config.bridge_url else {
        tracing::warn!("BRIDGE_URL not set, outbound WhatsApp messages will be skipped");
        return Arc::new(DisabledBridge);
    };

    match WppConnectBridge::new(
        bridge_url,
        &config.bridge_session,
        config.bridge_token.clone(),
        Duration::from_secs(config.bridge_timeout_secs),
    ) {
        Ok(bridge) => {
            tracing::info!(url = %bridge_url, session = %config.bridge_session, "WhatsApp bridge configured");
            Arc::new(bridge)
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to build the bridge client, outbound sends disabled");
            Arc::new(DisabledBridge)
        }
    }
}

fn build_cors(config: &Config) -> CorsLayer {
    let allow_origin = if config.cors_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(middleware::AUTH_TOKEN_HEADER),
        ])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client = connect_store(&config).await;
    let bridge = build_bridge(&config);
    let app_state = Arc::new(AppState::new(config.clone(), db_client, bridge));

    let app = create_router(app_state).layer(build_cors(&config));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(port = config.port, error = %err, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!(error = %err, "Server error");
    }
}
