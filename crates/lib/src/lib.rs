//! Relay core library: LINE webhook ingestion, message persistence, paginated
//! reads, and broadcast, served over a small HTTP gateway.

pub mod channels;
pub mod config;
pub mod error;
pub mod gateway;
pub mod init;
pub mod message;
pub mod service;
pub mod store;
