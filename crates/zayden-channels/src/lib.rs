//! # zayden-channels
//!
//! Messaging platform integrations for Zayden. WhatsApp is the only channel;
//! it turns protocol messages into [`zayden_core::envelope::Envelope`]s and
//! carries replies back.

pub mod whatsapp;

pub use whatsapp::WhatsAppChannel;
