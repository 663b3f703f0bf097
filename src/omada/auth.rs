//! Authorization handshake against one controller deployment.
//!
//! The three calls run strictly in order; each consumes the value produced
//! by the previous one. Tokens live only for the current pass over the
//! deployment and are never persisted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::OmadaClient;
use crate::error::{AuthStep, CallError, PipelineError, Result};

// ---

/// Result of a successful login, consumed by the code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub csrf_token: String,
    pub session_id: String,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct TokenBody<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResult {
    access_token: String,
}

impl OmadaClient {
    /// Run the full handshake and return the bearer access token.
    pub async fn authorize(
        &self,
        email: &str,
        password: &str,
        client_id: &str,
        client_secret: &str,
        omadac_id: &str,
    ) -> Result<String> {
        // ---
        let session = self
            .login(email, password, client_id, omadac_id)
            .await
            .map_err(PipelineError::auth(AuthStep::Login))?;
        debug!("Login succeeded");

        let code = self
            .authorization_code(&session, client_id, omadac_id)
            .await
            .map_err(PipelineError::auth(AuthStep::AuthorizationCode))?;
        debug!("Authorization code received");

        let token = self
            .access_token(&code, client_id, client_secret)
            .await
            .map_err(PipelineError::auth(AuthStep::AccessToken))?;
        debug!("Access token received");

        Ok(token)
    }

    /// Step 1: exchange account credentials for a CSRF token and session id.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client_id: &str,
        omadac_id: &str,
    ) -> Result<AuthSession, CallError> {
        // ---
        let request = self
            .http
            .post(self.url("/openapi/authorize/login"))
            .query(&[("client_id", client_id), ("omadac_id", omadac_id)])
            .json(&LoginBody {
                username: email,
                password,
            });

        Self::send::<AuthSession>(request)
            .await?
            .ok_or(CallError::MissingField("result"))
    }

    /// Step 2: exchange the login session for a short-lived authorization code.
    pub async fn authorization_code(
        &self,
        session: &AuthSession,
        client_id: &str,
        omadac_id: &str,
    ) -> Result<String, CallError> {
        // ---
        let request = self
            .http
            .post(self.url("/openapi/authorize/code"))
            .query(&[
                ("client_id", client_id),
                ("omadac_id", omadac_id),
                ("response_type", "code"),
            ])
            .header("Csrf-Token", &session.csrf_token)
            .header(
                reqwest::header::COOKIE,
                format!("TPOMADA_SESSIONID={}", session.session_id),
            );

        Self::send::<String>(request)
            .await?
            .ok_or(CallError::MissingField("result"))
    }

    /// Step 3: exchange the authorization code for a bearer access token.
    pub async fn access_token(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, CallError> {
        // ---
        let request = self
            .http
            .post(self.url("/openapi/authorize/token"))
            .query(&[("grant_type", "authorization_code"), ("code", code)])
            .json(&TokenBody {
                client_id,
                client_secret,
            });

        Self::send::<TokenResult>(request)
            .await?
            .map(|t| t.access_token)
            .ok_or(CallError::MissingField("result.accessToken"))
    }
}
