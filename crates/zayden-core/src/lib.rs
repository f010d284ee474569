//! # zayden-core
//!
//! Core types, message normalization, command parsing, permission
//! classification, configuration, and error handling for the Zayden bot.

pub mod busy;
pub mod command;
pub mod config;
pub mod envelope;
pub mod error;
pub mod group;
pub mod message;
pub mod normalize;
pub mod permissions;
pub mod phone;
pub mod traits;
