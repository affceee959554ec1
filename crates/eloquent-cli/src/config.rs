use std::time::Duration;

use clap::Args;
use eloquent_client::{ClientConfig, ConfigError};
use eloquent_core::{EditorConfig, RetryPolicy};

/// Connection settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of the LanguageTool server
    #[arg(
        long,
        global = true,
        env = "ELOQUENT_SERVER_URL",
        default_value = ClientConfig::DEFAULT_SERVER
    )]
    pub server: String,

    /// Check request timeout, in seconds
    #[arg(long, global = true, env = "ELOQUENT_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// How many times to ask for the language list while the server starts
    #[arg(long, global = true, default_value_t = RetryPolicy::LANGUAGE_POLL.max_attempts)]
    pub language_attempts: u32,
}

impl ServerArgs {
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::for_server(&self.server)?;
        if let Some(secs) = self.timeout {
            config.check_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn language_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.language_attempts,
            ..RetryPolicy::LANGUAGE_POLL
        }
    }

    pub fn editor_config(&self, language: &str) -> EditorConfig {
        EditorConfig {
            default_language: language.into(),
            language_retry: self.language_retry(),
            ..EditorConfig::default()
        }
    }
}
