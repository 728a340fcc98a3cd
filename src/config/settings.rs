use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::utils::constants::*;
use crate::utils::logging::LogLevel;

/// ================================
/// API surface generation
/// ================================
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// api key only, page-number pagination
    V1,
    /// client credentials + bearer tokens, link pagination
    #[default]
    V2,
}

impl ApiVersion {
    pub fn path(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "/v1/direct-access",
            ApiVersion::V2 => "/v2/direct-access",
        }
    }

    pub fn uses_tokens(&self) -> bool {
        matches!(self, ApiVersion::V2)
    }
}

/// ================================
/// Client configuration
/// ================================
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,

    /// max retry attempts, shared by the transport (5xx) and the token
    /// endpoint throttling loop (403)
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// exponential backoff multiplier, in seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_throttle_backoff_secs")]
    pub throttle_backoff_secs: u64,

    /// pre-obtained token, skips the acquisition round trip at construction
    #[serde(default)]
    pub access_token: Option<String>,

    /// TLS certificate verification
    #[serde(default = "default_verify")]
    pub verify: bool,
    /// scheme ("http", "https", "all") -> proxy URL
    #[serde(default)]
    pub proxies: HashMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_version: ApiVersion,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client_id: None,
            client_secret: None,
            retries: DEFAULT_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
            throttle_backoff_secs: DEFAULT_THROTTLE_BACKOFF_SECS,
            access_token: None,
            verify: true,
            proxies: HashMap::new(),
            timeout_secs: None,
            log_level: LogLevel::default(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_version: ApiVersion::default(),
        }
    }

    /// Read credentials from `DIRECTACCESS_*` environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut config = Self::new(var(ENV_API_KEY).unwrap_or_default());
        config.client_id = var(ENV_CLIENT_ID);
        config.client_secret = var(ENV_CLIENT_SECRET);
        config.access_token = var(ENV_TOKEN);
        config
    }

    pub fn with_client_credentials(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    pub fn with_retries(mut self, retries: u32, backoff_factor: f64) -> Self {
        self.retries = retries;
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn with_throttle_backoff_secs(mut self, secs: u64) -> Self {
        self.throttle_backoff_secs = secs;
        self
    }

    pub fn with_proxy(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.proxies.insert(scheme.into(), url.into());
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// `{base_url}/v2/direct-access` (or the v1 path)
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.api_version.path())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("retries", &self.retries)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_backoff_secs", &self.max_backoff_secs)
            .field("throttle_backoff_secs", &self.throttle_backoff_secs)
            .field("access_token", &redact(&self.access_token))
            .field("verify", &self.verify)
            .field("proxies", &self.proxies)
            .field("timeout_secs", &self.timeout_secs)
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_backoff_factor() -> f64 {
    DEFAULT_BACKOFF_FACTOR
}

fn default_max_backoff_secs() -> u64 {
    DEFAULT_MAX_BACKOFF_SECS
}

fn default_throttle_backoff_secs() -> u64 {
    DEFAULT_THROTTLE_BACKOFF_SECS
}

fn default_verify() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}
