use http::Method;

use crate::auth::TokenManager;
use crate::error::{Error, Result};
use crate::query::classify::Outcome;
use crate::transport::{HttpResponse, Transport};
use crate::utils::diagnostics::SharedDiagnostics;

/// Mutable per-client state: transport plus the current bearer token.
///
/// Every request goes through [`Session::execute`], which attaches the token,
/// classifies the response and recovers from 401 in place.
#[derive(Debug)]
pub struct Session {
    transport: Transport,
    tokens: Option<TokenManager>,
    api_url: String,
    /// consecutive token refreshes allowed for a single request
    reauth_limit: u32,
}

impl Session {
    pub fn new(transport: Transport, tokens: Option<TokenManager>, api_url: String, reauth_limit: u32) -> Self {
        Self {
            transport,
            tokens,
            api_url,
            reauth_limit: reauth_limit.max(1),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn dataset_url(&self, dataset: &str) -> String {
        format!("{}/{}", self.api_url, dataset)
    }

    pub fn diagnostics(&self) -> &SharedDiagnostics {
        self.transport.diagnostics()
    }

    pub fn tokens(&self) -> Option<&TokenManager> {
        self.tokens.as_ref()
    }

    pub async fn refresh_token(&mut self) -> Result<crate::auth::TokenResponse> {
        match self.tokens.as_mut() {
            Some(tokens) => tokens.acquire_token(&self.transport).await,
            None => Err(Error::Auth("this API version does not use access tokens".to_string())),
        }
    }

    /// Send a request and classify the response until it succeeds or fails
    /// for good. A 401 triggers a token refresh and an identical replay.
    pub async fn execute<T, F>(
        &mut self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        dataset: &str,
        classify: F,
    ) -> Result<T>
    where
        F: Fn(&HttpResponse, &str) -> Outcome<T>,
    {
        let mut refreshes = 0;
        loop {
            let authorization = self.tokens.as_ref().and_then(TokenManager::authorization);
            let response = self
                .transport
                .send(method.clone(), url, params, authorization.as_deref())
                .await?;

            match classify(&response, dataset) {
                Outcome::Success(value) => return Ok(value),
                Outcome::Fatal(e) => {
                    self.diagnostics().error(&e.to_string());
                    return Err(e);
                }
                Outcome::Reauthenticate => {
                    self.reauthenticate(&response, refreshes).await?;
                    refreshes += 1;
                }
            }
        }
    }

    async fn reauthenticate(&mut self, response: &HttpResponse, refreshes: u32) -> Result<()> {
        let Some(tokens) = self.tokens.as_mut() else {
            let msg = format!("Unauthorized: {}", response.body);
            self.transport.diagnostics().error(&msg);
            return Err(Error::Auth(msg));
        };
        if refreshes >= self.reauth_limit {
            let msg = format!(
                "request still unauthorized after {} token refreshes: {}",
                refreshes, response.body
            );
            self.transport.diagnostics().error(&msg);
            return Err(Error::Auth(msg));
        }
        self.transport
            .diagnostics()
            .warn("Access token expired. Acquiring a new one...");
        tokens.acquire_token(&self.transport).await?;
        Ok(())
    }
}
