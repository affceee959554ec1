use std::future::Future;

use eloquent_core::{CheckError, CheckService, Language, LanguageService, Span};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::wire::{CheckResponse, Utf16Map};

/// Client for a LanguageTool-compatible `/v2` HTTP API.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    http: reqwest::Client,
    config: ClientConfig,
    check_url: Url,
    languages_url: Url,
}

impl LanguageToolClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("eloquent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ClientError::Build { source })?;
        Ok(Self {
            check_url: config.endpoint("v2/check")?,
            languages_url: config.endpoint("v2/languages")?,
            http,
            config,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl CheckService for LanguageToolClient {
    fn check(
        &self,
        text: &str,
        language: &str,
    ) -> impl Future<Output = Result<Vec<Span>, CheckError>> + Send {
        // Blank text never reaches the server.
        let request = (!text.trim().is_empty()).then(|| {
            self.http
                .post(self.check_url.clone())
                .timeout(self.config.check_timeout)
                .form(&[("text", text), ("language", language)])
        });
        let offsets = Utf16Map::new(text);
        let language = language.to_string();

        async move {
            let Some(request) = request else {
                debug!("blank text, skipping check request");
                return Ok(Vec::new());
            };
            let response: CheckResponse = send_json(request).await?;
            debug!(%language, matches = response.matches.len(), "check response");
            Ok(response
                .matches
                .into_iter()
                .map(|m| m.into_span(&offsets))
                .collect())
        }
    }
}

impl LanguageService for LanguageToolClient {
    fn languages(&self) -> impl Future<Output = Result<Vec<Language>, CheckError>> + Send {
        let request = self
            .http
            .get(self.languages_url.clone())
            .timeout(self.config.languages_timeout);
        send_json(request)
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CheckError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "checker returned an error status");
        return Err(CheckError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response.json().await.map_err(transport_error)
}

fn transport_error(e: reqwest::Error) -> CheckError {
    if e.is_decode() {
        CheckError::Decode {
            message: e.to_string(),
        }
    } else if e.is_timeout() {
        CheckError::Network {
            message: "request timed out".to_string(),
        }
    } else {
        CheckError::Network {
            message: e.to_string(),
        }
    }
}
