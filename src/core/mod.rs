//! Core translation engine module

pub mod chat;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod pricing;
pub mod prompt;
pub mod store;
pub mod usage;
