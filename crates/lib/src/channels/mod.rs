//! Chat-platform providers.
//!
//! A [`MessageProvider`] turns a platform webhook into a [`crate::message::NewMessage`]
//! and sends outbound broadcasts. [`LineChannel`] talks to the LINE Messaging API.

mod inbound;
mod line;
mod provider;

pub use inbound::InboundRequest;
pub use line::{LineChannel, LineEvent, LineWebhook, LINE_SIGNATURE_HEADER};
pub use provider::MessageProvider;
