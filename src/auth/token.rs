use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bearer token currently attached to requests.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub acquired_at: DateTime<Utc>,
    /// unknown for tokens handed in at construction
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn provided(value: String) -> Self {
        Self { value, acquired_at: Utc::now(), expires_at: None }
    }

    pub fn from_response(response: &TokenResponse) -> Self {
        let acquired_at = Utc::now();
        let expires_at = response
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|ttl| acquired_at.checked_add_signed(ttl));
        Self { value: response.access_token.clone(), acquired_at, expires_at }
    }

    /// Expiry as announced by the server. The client still refreshes
    /// reactively on 401; this is for introspection only.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Utc::now() >= exp).unwrap_or(false)
    }

    pub fn authorization(&self) -> String {
        format!("bearer {}", self.value)
    }
}
