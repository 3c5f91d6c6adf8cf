//! taxi-api: HTTP API for the taxi support bot
//!
//! Exposes the support agent over REST (`/chat`, `/history`) alongside
//! health endpoints, and hosts any extra routes such as the WhatsApp
//! webhook on the same listener.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, build_app, start_server};
