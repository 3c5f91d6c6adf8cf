//! taxi-whatsapp: WhatsApp channel for the taxi support bot
//!
//! Receives customer messages through the Meta WhatsApp Cloud API
//! webhook and sends the support agent's replies back.

pub mod cloud;
pub mod error;
pub mod handler;
pub mod webhook;

pub use cloud::{CloudApiClient, ReplySender};
pub use error::{Result, WhatsAppError};
pub use handler::{AckStatus, WebhookAck, WhatsAppState, router};
pub use webhook::{InboundMessage, WebhookPayload, extract_messages};
