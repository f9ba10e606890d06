//! GET /messages: pagination envelope, user filters, and query validation.

mod common;

use common::{spawn_with, spawn_with_timeout, CountingStore};
use relay_lib::message::NewMessage;
use relay_lib::store::{MemoryStore, MessageStore};
use std::sync::Arc;
use std::time::Duration;

async fn seeded(users: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (i, u) in users.iter().enumerate() {
        store
            .insert(NewMessage::new(*u, format!("message {}", i)).expect("valid message"))
            .await
            .expect("insert");
    }
    store
}

async fn get_json(url: &str) -> (u16, serde_json::Value) {
    let resp = reqwest::get(url).await.expect("GET");
    let status = resp.status().as_u16();
    let body = resp.json().await.expect("JSON body");
    (status, body)
}

#[tokio::test]
async fn empty_store_returns_empty_array() {
    let base = spawn_with(Arc::new(MemoryStore::new()), None).await;
    let (status, body) = get_json(&format!("{}/messages", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["has_next"], false);
}

#[tokio::test]
async fn lists_messages_with_wire_fields() {
    let base = spawn_with(seeded(&["user 1", "user 2"]).await, None).await;
    let (status, body) = get_json(&format!("{}/messages", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["has_next"], false);
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 2);
    let first = &data[0];
    assert_eq!(first["user_id"], "user 1");
    assert_eq!(first["message"], "message 0");
    assert!(first["updated_at"].is_null());
    assert!(!first["id"].as_str().unwrap_or_default().is_empty());
    assert!(first["created_at"].is_string());
}

#[tokio::test]
async fn filters_by_two_user_ids() {
    let base = spawn_with(seeded(&["user1", "user2", "user3"]).await, None).await;
    let (status, body) = get_json(&format!(
        "{}/messages?user_id=user1&user_id=user2&offset=0&limit=20",
        base
    ))
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["has_next"], false);
    let users: Vec<&str> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|m| m["user_id"].as_str())
        .collect();
    assert_eq!(users, vec!["user1", "user2"]);
}

#[tokio::test]
async fn pagination_boundary() {
    let users: Vec<&str> = std::iter::repeat("u").take(25).collect();
    let base = spawn_with(seeded(&users).await, None).await;

    let (_, first) = get_json(&format!("{}/messages?offset=0&limit=20", base)).await;
    assert_eq!(first["total_count"], 25);
    assert_eq!(first["data"].as_array().map(Vec::len), Some(20));
    assert_eq!(first["has_next"], true);

    let (_, last) = get_json(&format!("{}/messages?offset=20&limit=20", base)).await;
    assert_eq!(last["total_count"], 25);
    assert_eq!(last["offset"], 20);
    assert_eq!(last["data"].as_array().map(Vec::len), Some(5));
    assert_eq!(last["has_next"], false);
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let base = spawn_with(seeded(&["a", "b", "a"]).await, None).await;
    let url = format!("{}/messages?user_id=a&limit=1", base);
    let (_, first) = get_json(&url).await;
    let (_, second) = get_json(&url).await;
    assert_eq!(first, second);
    assert_eq!(first["has_next"], true);
}

#[tokio::test]
async fn non_integer_offset_is_bad_request() {
    let base = spawn_with(Arc::new(CountingStore::default()), None).await;
    let (status, body) = get_json(&format!("{}/messages?offset=abc", base)).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "offset must be a non-negative integer, got \"abc\""
    );
}

#[tokio::test]
async fn non_integer_limit_is_bad_request() {
    let base = spawn_with(Arc::new(MemoryStore::new()), None).await;
    let (status, body) = get_json(&format!("{}/messages?limit=1.5", base)).await;
    assert_eq!(status, 400);
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("limit must be a non-negative integer"));
}

#[tokio::test]
async fn slow_store_read_is_deadline_error() {
    let store = Arc::new(CountingStore::slow(Duration::from_secs(5)));
    let base = spawn_with_timeout(store, None, Duration::from_millis(50)).await;
    let (status, body) = get_json(&format!("{}/messages", base)).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "deadline exceeded after 50ms");
}
