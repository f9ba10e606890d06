//! LINE channel: verifies and decodes webhook events, broadcasts via the Messaging API.

use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::channels::inbound::InboundRequest;
use crate::channels::provider::MessageProvider;
use crate::error::RelayError;
use crate::message::NewMessage;

const LINE_API_BASE: &str = "https://api.line.me";

/// Header carrying base64(HMAC-SHA256(channel secret, body)).
pub const LINE_SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

/// Webhook POST body.
#[derive(Debug, Deserialize)]
pub struct LineWebhook {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<LineEvent>,
}

#[derive(Debug, Deserialize)]
pub struct LineEvent {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub message: Option<LineMessage>,
    #[serde(default)]
    pub source: Option<LineSource>,
}

#[derive(Debug, Deserialize)]
pub struct LineMessage {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSource {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl LineEvent {
    /// (user id, text) when this is a text message event from an identified user.
    pub fn text_message(&self) -> Option<(&str, &str)> {
        if self.typ != "message" {
            return None;
        }
        let message = self.message.as_ref().filter(|m| m.typ == "text")?;
        let text = message.text.as_deref()?;
        let user_id = self
            .source
            .as_ref()
            .and_then(|s| s.user_id.as_deref())
            .filter(|u| !u.is_empty())?;
        Some((user_id, text))
    }
}

/// LINE Messaging API connector.
pub struct LineChannel {
    id: String,
    channel_secret: String,
    channel_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl LineChannel {
    /// `api_base` overrides `https://api.line.me` (tests, proxies).
    pub fn new(channel_secret: String, channel_token: String, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| LINE_API_BASE.to_string());
        Self {
            id: "line".to_string(),
            channel_secret,
            channel_token,
            api_base,
            client: reqwest::Client::new(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// base64 HMAC-SHA256 of `body` under the channel secret, as LINE sends it.
    pub fn sign(&self, body: &[u8]) -> Result<String, RelayError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256, RelayError> {
        HmacSha256::new_from_slice(self.channel_secret.as_bytes())
            .map_err(|e| RelayError::MalformedPayload(format!("invalid channel secret: {}", e)))
    }

    fn verify_signature(&self, req: &InboundRequest) -> Result<(), RelayError> {
        let provided = req
            .header(LINE_SIGNATURE_HEADER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::MalformedPayload("missing webhook signature".to_string()))?;
        let provided = base64::engine::general_purpose::STANDARD
            .decode(provided)
            .map_err(|_| RelayError::MalformedPayload("invalid signature".to_string()))?;
        let mut mac = self.mac()?;
        mac.update(&req.body);
        mac.verify_slice(&provided)
            .map_err(|_| RelayError::MalformedPayload("invalid signature".to_string()))
    }
}

#[async_trait]
impl MessageProvider for LineChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn decode_inbound(&self, req: &InboundRequest) -> Result<NewMessage, RelayError> {
        self.verify_signature(req)?;
        let webhook: LineWebhook = serde_json::from_slice(&req.body)
            .map_err(|e| RelayError::MalformedPayload(format!("invalid webhook payload: {}", e)))?;
        // Last text event wins when a delivery batches several.
        let (user_id, text) = webhook
            .events
            .iter()
            .filter_map(|e| {
                let found = e.text_message();
                if found.is_none() {
                    log::debug!("line: skipping {} event", e.typ);
                }
                found
            })
            .last()
            .ok_or_else(|| {
                RelayError::MalformedPayload("no text message event in webhook payload".to_string())
            })?;
        NewMessage::new(user_id, text).map_err(|e| RelayError::MalformedPayload(e.to_string()))
    }

    async fn send_broadcast(&self, text: &str) -> Result<(), RelayError> {
        let url = format!("{}/v2/bot/message/broadcast", self.api_base);
        let body = serde_json::json!({
            "messages": [{ "type": "text", "text": text }]
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.channel_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Delivery(format!("broadcast request failed: {}", e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RelayError::Delivery(format!("broadcast failed: {} {}", status, body)));
        }
        Ok(())
    }
}
