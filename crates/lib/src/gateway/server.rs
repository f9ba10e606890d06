//! Gateway HTTP server: state, routes, and process wiring.

use crate::channels::{InboundRequest, LineChannel, MessageProvider};
use crate::config::{self, Config};
use crate::error::RelayError;
use crate::gateway::protocol::{
    ListMessagesQuery, ListMessagesResponse, SendMessageRequest, StatusBody,
};
use crate::service::MessageService;
use crate::store::{MemoryStore, MessageStore, SqliteStore};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway: immutable config plus the orchestrator.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub service: MessageService,
}

impl GatewayState {
    pub fn new(config: Config, service: MessageService) -> Self {
        Self {
            config: Arc::new(config),
            service,
        }
    }
}

/// All gateway routes over the given state.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/messages", get(list_messages).post(send_message))
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Open the configured store: SQLite when a database URL resolves, otherwise in memory.
async fn open_store(config: &Config) -> Result<Arc<dyn MessageStore>> {
    match config::resolve_database_url(config) {
        Some(url) => {
            let store = SqliteStore::connect(&url, config.store.max_connections)
                .await
                .with_context(|| format!("opening message store at {}", url))?;
            log::info!("message store: sqlite ({})", url);
            Ok(Arc::new(store))
        }
        None => {
            log::info!("message store: in-memory (no database configured)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Requires LINE channel secret and token (config or env). Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let Some(secret) = config::resolve_line_secret(&config) else {
        anyhow::bail!(
            "LINE channel secret not configured (set channels.line.channelSecret or LINE_CHANNEL_SECRET)"
        );
    };
    let Some(token) = config::resolve_line_token(&config) else {
        anyhow::bail!(
            "LINE channel token not configured (set channels.line.channelToken or LINE_CHANNEL_TOKEN)"
        );
    };

    let store = open_store(&config).await?;
    let provider: Arc<dyn MessageProvider> = Arc::new(LineChannel::new(
        secret,
        token,
        config.channels.line.api_base.clone(),
    ));
    let service = MessageService::new(store, provider, config.store.context_timeout());
    log::info!(
        "message service ready (provider: {}, store timeout: {:?})",
        service.provider_id(),
        service.context_timeout()
    );

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let app = router(GatewayState::new(config, service));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "provider": state.service.provider_id(),
        "port": state.config.gateway.port,
    }))
}

/// GET /messages?user_id=..&offset=..&limit=..: one page of stored messages.
async fn list_messages(
    State(state): State<GatewayState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListMessagesResponse>, RelayError> {
    let Query(pairs) = query.map_err(|e| RelayError::Validation(e.body_text()))?;
    let q = ListMessagesQuery::from_pairs(pairs).inspect_err(|e| {
        log::debug!("list messages: rejected query: {}", e);
    })?;
    let page = state
        .service
        .find_by_user(q.offset, q.limit, &q.user_ids)
        .await
        .inspect_err(|e| log::warn!("list messages failed: {}", e))?;
    Ok(Json(ListMessagesResponse::new(q.offset, q.limit, page)))
}

/// POST /messages: broadcast `{ "message": ... }` to every channel subscriber.
async fn send_message(
    State(state): State<GatewayState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusBody>), RelayError> {
    let Json(req) = body.map_err(|e| RelayError::Validation(e.body_text()))?;
    let text = req.into_text()?;
    state
        .service
        .broadcast(&text)
        .await
        .inspect_err(|e| log::warn!("broadcast failed: {}", e))?;
    Ok((StatusCode::CREATED, Json(StatusBody::ok())))
}

/// POST /webhook: decode the provider payload, then store it. Any failure is a 500.
async fn webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<StatusBody>), RelayError> {
    let body = body
        .map_err(|e| RelayError::MalformedPayload(e.body_text()))
        .inspect_err(|e| log::warn!("webhook body rejected: {}", e))?;
    let req = InboundRequest::new(headers, body);
    let msg = state
        .service
        .decode_inbound(&req)
        .map_err(|e| match e {
            RelayError::Validation(m) => RelayError::MalformedPayload(m),
            other => other,
        })
        .inspect_err(|e| log::warn!("webhook decode failed: {}", e))?;
    let stored = state
        .service
        .insert(msg)
        .await
        .inspect_err(|e| log::warn!("webhook insert failed: {}", e))?;
    log::info!("stored message {} from {}", stored.id, stored.user_id);
    Ok((StatusCode::CREATED, Json(StatusBody::ok())))
}
