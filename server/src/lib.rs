//! Hookrelay Server
//!
//! Relays inbound webhooks to Telegram chats through per-webhook message
//! templates, and captures sample payloads for template authoring.

pub mod api;
pub mod auth;
pub mod capture;
pub mod config;
pub mod db;
pub mod request_log;
pub mod stats;
pub mod webhooks;
