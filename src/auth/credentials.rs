use base64::Engine;
use std::fmt;

use crate::config::settings::ClientConfig;
use crate::error::{Error, Result};

/// Identity sent with every request. Immutable once built.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Api key is always required; client id and secret only when
    /// `require_client` is set (token-based API).
    pub fn from_config(config: &ClientConfig, require_client: bool) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Auth("API KEY is required".to_string()));
        }
        let client_id = config.client_id.clone().unwrap_or_default();
        let client_secret = config.client_secret.clone().unwrap_or_default();
        if require_client && (client_id.is_empty() || client_secret.is_empty()) {
            return Err(Error::Auth("CLIENT ID and CLIENT SECRET are required".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            client_id,
            client_secret,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// `Basic base64(client_id:client_secret)`
    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}
