use miette::Diagnostic;
use thiserror::Error;

/// Invalid client configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid server URL {url:?}: {message}")]
    #[diagnostic(
        code(eloquent::config::url),
        help("expected something like http://127.0.0.1:8081")
    )]
    UrlParse { url: String, message: String },

    #[error("{var} must be a whole number of seconds, got {value:?}")]
    #[diagnostic(code(eloquent::config::timeout))]
    InvalidTimeout { var: &'static str, value: String },
}

/// Errors constructing a [`LanguageToolClient`](crate::LanguageToolClient).
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client")]
    #[diagnostic(code(eloquent::client::build))]
    Build {
        #[source]
        source: reqwest::Error,
    },
}
