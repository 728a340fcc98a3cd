use http::Method;
use tokio::time::{sleep, Duration};

use crate::auth::credentials::Credentials;
use crate::auth::token::{AccessToken, TokenResponse};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::utils::diagnostics::SharedDiagnostics;

/// Client-credentials grant against `{api_url}/tokens`.
///
/// Owns the bearer token attached to every authenticated request.
#[derive(Debug)]
pub struct TokenManager {
    credentials: Credentials,
    token_url: String,
    /// 403 retries per acquisition
    throttle_retries: u32,
    throttle_backoff: Duration,
    token: Option<AccessToken>,
    acquisitions: u32,
    diagnostics: SharedDiagnostics,
}

impl TokenManager {
    pub fn new(
        credentials: Credentials,
        api_url: &str,
        throttle_retries: u32,
        throttle_backoff: Duration,
        diagnostics: SharedDiagnostics,
    ) -> Self {
        Self {
            credentials,
            token_url: format!("{}/tokens", api_url),
            throttle_retries,
            throttle_backoff,
            token: None,
            acquisitions: 0,
            diagnostics,
        }
    }

    /// Attach a token obtained elsewhere (e.g. by another client instance).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(AccessToken::provided(token.into()));
        self
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.value.as_str())
    }

    /// `bearer <token>` once a token is held
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(AccessToken::authorization)
    }

    /// Number of successful grant round trips made so far.
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions
    }

    pub async fn acquire_token(&mut self, transport: &Transport) -> Result<TokenResponse> {
        if !self.credentials.is_complete() {
            return Err(Error::Auth(
                "API KEY, CLIENT ID and CLIENT SECRET are required to acquire a token".to_string(),
            ));
        }

        let params = vec![("grant_type".to_string(), "client_credentials".to_string())];
        let basic = self.credentials.basic_authorization();
        let mut remaining = self.throttle_retries;

        loop {
            let response = transport
                .send(Method::POST, &self.token_url, &params, Some(&basic))
                .await
                .map_err(|e| Error::Auth(format!("Error getting token: {}", e)))?;

            if response.status.as_u16() == 403 {
                if remaining == 0 {
                    let msg = format!(
                        "Error getting token: throttled after {} retries. Code: 403 Message: {}",
                        self.throttle_retries, response.body
                    );
                    self.diagnostics.error(&msg);
                    return Err(Error::Auth(msg));
                }
                remaining -= 1;
                self.diagnostics.warn(&format!(
                    "Token endpoint throttled (403), sleeping {:?} ({} retries left)",
                    self.throttle_backoff, remaining
                ));
                sleep(self.throttle_backoff).await;
                continue;
            }

            if !response.is_success() {
                let msg = format!(
                    "Error getting token. Code: {} Message: {}",
                    response.status.as_u16(),
                    response.body
                );
                self.diagnostics.error(&msg);
                return Err(Error::Auth(msg));
            }

            let token_response: TokenResponse = serde_json::from_str(&response.body)
                .map_err(|e| Error::Auth(format!("Malformed token response: {}", e)))?;

            self.token = Some(AccessToken::from_response(&token_response));
            self.acquisitions += 1;
            self.diagnostics.debug(&format!("Access token acquired: {}", token_response.access_token));
            return Ok(token_response);
        }
    }
}
