//! eloquent-client: LanguageTool HTTP client.
//!
//! Implements `CheckService` and `LanguageService` from `eloquent-core`
//! against a LanguageTool-compatible server's `/v2/check` and
//! `/v2/languages` endpoints.

pub mod client;
pub mod config;
pub mod error;
mod wire;

pub use client::LanguageToolClient;
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError};
