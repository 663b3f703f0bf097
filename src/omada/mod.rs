//! Omada controller OpenAPI client.
//!
//! Gateway for the controller endpoints used by the collector:
//! - `auth`: login → authorization code → access token
//! - `sites`: site enumeration
//! - `connections`: past-connection pages
//!
//! Every response shares the envelope `{errorCode, msg, result}`; a non-zero
//! `errorCode` is reported as [`CallError::Controller`] even on HTTP 200.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CallError;

mod auth;
mod connections;
mod sites;

pub use auth::AuthSession;
pub use connections::{ConnectionPage, PAST_CONNECTION_PAGE_SIZE};
pub use sites::SITE_PAGE_SIZE;

// ---

/// Per-request timeout applied to every controller call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    msg: Option<String>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    /// Reject controller-level failures, yielding the optional result.
    fn into_result(self) -> Result<Option<T>, CallError> {
        if self.error_code != 0 {
            return Err(CallError::Controller {
                code: self.error_code,
                msg: self.msg.unwrap_or_default(),
            });
        }
        Ok(self.result)
    }
}

/// Paged list payload, `result.data`.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// HTTP client bound to one deployment's base URL.
#[derive(Debug, Clone)]
pub struct OmadaClient {
    base_url: String,
    http: reqwest::Client,
}

impl OmadaClient {
    /// Create a client for `base_url` with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        // ---
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(base_url, http))
    }

    /// Use a pre-built HTTP client.
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorization_header(access_token: &str) -> String {
        format!("AccessToken={}", access_token)
    }

    /// Send a request and unwrap the controller envelope.
    async fn send<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, CallError> {
        // ---
        let response = request.send().await?.error_for_status()?;
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_result()
    }
}
