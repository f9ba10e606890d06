//! Shared helpers for gateway integration tests: spawn the router on an
//! ephemeral port, a counting/failing store, and a stand-in LINE API.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use relay_lib::channels::LineChannel;
use relay_lib::config::Config;
use relay_lib::error::RelayError;
use relay_lib::gateway::{router, GatewayState};
use relay_lib::message::{Message, NewMessage, Page};
use relay_lib::service::{MessageService, DEFAULT_CONTEXT_TIMEOUT};
use relay_lib::store::{MemoryStore, MessageStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "test-channel-secret";
pub const TOKEN: &str = "test-channel-token";

/// Serve the gateway router on 127.0.0.1:0; returns its base URL.
pub async fn spawn_gateway(state: GatewayState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });
    format!("http://{}", addr)
}

/// Gateway over `store` with a LINE channel pointed at `line_api_base`.
pub async fn spawn_with(store: Arc<dyn MessageStore>, line_api_base: Option<String>) -> String {
    spawn_with_timeout(store, line_api_base, DEFAULT_CONTEXT_TIMEOUT).await
}

/// Like [`spawn_with`] with an explicit store deadline.
pub async fn spawn_with_timeout(
    store: Arc<dyn MessageStore>,
    line_api_base: Option<String>,
    context_timeout: Duration,
) -> String {
    let provider = Arc::new(line_channel(line_api_base));
    let service = MessageService::new(store, provider, context_timeout);
    spawn_gateway(GatewayState::new(Config::default(), service)).await
}

pub fn line_channel(api_base: Option<String>) -> LineChannel {
    LineChannel::new(SECRET.to_string(), TOKEN.to_string(), api_base)
}

/// LINE webhook body with one text message event per (user, text) pair.
pub fn webhook_body(events: &[(&str, &str)]) -> String {
    let events: Vec<serde_json::Value> = events
        .iter()
        .enumerate()
        .map(|(i, (user, text))| {
            serde_json::json!({
                "type": "message",
                "replyToken": format!("reply-{}", i),
                "timestamp": 1_700_000_000_000u64 + i as u64,
                "source": { "type": "user", "userId": user },
                "message": { "type": "text", "id": i.to_string(), "text": text }
            })
        })
        .collect();
    serde_json::json!({ "destination": "Ubot", "events": events }).to_string()
}

/// POST a webhook body signed with the test secret.
pub async fn post_signed_webhook(base: &str, body: String) -> reqwest::Response {
    let signature = line_channel(None).sign(body.as_bytes()).expect("sign");
    reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .header("X-Line-Signature", signature)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("send webhook")
}

/// Store wrapper that counts inserts and can be told to fail or stall them.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub inserts: AtomicUsize,
    pub fail_insert: Option<String>,
    pub delay: Option<Duration>,
}

impl CountingStore {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_insert: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Every call sleeps for `delay` before touching the inner store.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    async fn stall(&self) {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageStore for CountingStore {
    async fn insert(&self, msg: NewMessage) -> Result<Message, RelayError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if let Some(ref e) = self.fail_insert {
            return Err(RelayError::Persistence(e.clone()));
        }
        self.inner.insert(msg).await
    }

    async fn find_by_user(
        &self,
        offset: u64,
        limit: u64,
        user_ids: &[String],
    ) -> Result<Page, RelayError> {
        self.stall().await;
        self.inner.find_by_user(offset, limit, user_ids).await
    }
}

/// Request captured by the stand-in LINE API.
#[derive(Debug, Clone)]
pub struct CapturedBroadcast {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct FakeLineState {
    captured: Arc<Mutex<Vec<CapturedBroadcast>>>,
    reply: (StatusCode, serde_json::Value),
}

async fn fake_broadcast(
    State(state): State<FakeLineState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .captured
        .lock()
        .expect("captured lock")
        .push(CapturedBroadcast {
            authorization,
            body,
        });
    (state.reply.0, Json(state.reply.1.clone()))
}

/// Start a stand-in for `POST /v2/bot/message/broadcast` that answers with
/// `status` and `reply`. Returns its base URL and the captured requests.
pub async fn spawn_fake_line_api(
    status: StatusCode,
    reply: serde_json::Value,
) -> (String, Arc<Mutex<Vec<CapturedBroadcast>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = FakeLineState {
        captured: captured.clone(),
        reply: (status, reply),
    };
    let app = Router::new()
        .route("/v2/bot/message/broadcast", post(fake_broadcast))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), captured)
}
