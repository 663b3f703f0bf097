//! Error taxonomy for the collector.
//!
//! `Configuration` is fatal and stops the process before any deployment is
//! touched. Every other variant is recovered at the deployment boundary in
//! [`crate::pipeline`].

use std::fmt;

/// The authorization handshake step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    Login,
    AuthorizationCode,
    AccessToken,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthStep::Login => "login",
            AuthStep::AuthorizationCode => "authorization code",
            AuthStep::AccessToken => "access token",
        };
        f.write_str(name)
    }
}

/// Why a single controller call failed.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("controller returned errorCode {code}: {msg}")]
    Controller { code: i64, msg: String },

    #[error("response missing field '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authorization failed at {step} step: {source}")]
    Authorization {
        step: AuthStep,
        #[source]
        source: CallError,
    },

    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: CallError,
    },

    #[error("failed to write {count} points: {reason}")]
    Sink { count: usize, reason: String },
}

impl PipelineError {
    pub(crate) fn auth(step: AuthStep) -> impl FnOnce(CallError) -> Self {
        move |source| PipelineError::Authorization { step, source }
    }

    pub(crate) fn fetch(what: &'static str) -> impl FnOnce(CallError) -> Self {
        move |source| PipelineError::Fetch { what, source }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
