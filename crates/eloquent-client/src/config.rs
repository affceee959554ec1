use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Where the LanguageTool-compatible server lives and how long to wait on it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Always ends in `/` so endpoint paths join under it.
    pub base_url: Url,
    pub check_timeout: Duration,
    pub languages_timeout: Duration,
}

impl ClientConfig {
    /// Default server: a local LanguageTool on its usual port.
    pub const DEFAULT_SERVER: &'static str = "http://127.0.0.1:8081";
    pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_LANGUAGES_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            check_timeout: Self::DEFAULT_CHECK_TIMEOUT,
            languages_timeout: Self::DEFAULT_LANGUAGES_TIMEOUT,
        }
    }

    /// Parse a server URL string.
    pub fn for_server(url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(url).map_err(|e| ConfigError::UrlParse {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(base_url))
    }

    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `ELOQUENT_SERVER_URL`: server base URL (default: http://127.0.0.1:8081)
    /// - `ELOQUENT_TIMEOUT_SECS`: check request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server = lookup("ELOQUENT_SERVER_URL").unwrap_or_else(|| Self::DEFAULT_SERVER.to_string());
        let mut config = Self::for_server(&server)?;

        if let Some(value) = lookup("ELOQUENT_TIMEOUT_SECS") {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout {
                    var: "ELOQUENT_TIMEOUT_SECS",
                    value,
                })?;
            config.check_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url.join(path).map_err(|e| ConfigError::UrlParse {
            url: format!("{}{path}", self.base_url),
            message: e.to_string(),
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
