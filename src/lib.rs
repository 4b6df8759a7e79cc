//! ChatGPT Translator - document translation through a chat-completion API
//!
//! This library builds translation prompts from a domain and style, sends
//! them to an OpenAI-compatible endpoint, writes results back into a document
//! host while preserving formatting, and keeps persistent usage statistics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod document;
pub mod processors;
pub mod server;

// Re-export key types for convenience
pub use core::{
    chat::ChatSession,
    client::ChatClient,
    config::TranslatorConfig,
    errors::TranslationError,
    models::{Domain, Style, TokenCounts, TranslationRequest, TranslationResult},
    usage::{UsageStats, UsageTracker},
};

pub use document::{memory::Document, DocumentHost, FontAttributes};
pub use processors::selection::{DocumentTranslator, TranslationSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
