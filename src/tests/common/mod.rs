// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::Level;

use crate::utils::diagnostics::{Diagnostics, SharedDiagnostics};
use crate::utils::logging::LogLevel;
use crate::{ApiVersion, ClientConfig};

pub const API_KEY: &str = "test-api-key";
pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const V2_PATH: &str = "/v2/direct-access";
pub const V1_PATH: &str = "/v1/direct-access";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Token-based client pointed at a local server, no backoff sleeps.
pub fn v2_config(base_url: &str) -> ClientConfig {
    ClientConfig::new(API_KEY)
        .with_client_credentials(CLIENT_ID, CLIENT_SECRET)
        .with_base_url(base_url)
        .with_retries(2, 0.0)
        .with_throttle_backoff_secs(0)
        .with_log_level(LogLevel::DEBUG)
}

pub fn v1_config(base_url: &str) -> ClientConfig {
    ClientConfig::new(API_KEY)
        .with_base_url(base_url)
        .with_api_version(ApiVersion::V1)
        .with_retries(2, 0.0)
        .with_log_level(LogLevel::DEBUG)
}

/// `Basic base64(id:secret)` as the token endpoint expects it.
pub fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", CLIENT_ID, CLIENT_SECRET)))
}

pub fn token_body(token: &str) -> serde_json::Value {
    json!({"access_token": token, "token_type": "bearer", "expires_in": 3600})
}

pub fn rig(id: u32) -> serde_json::Value {
    json!({"RigID": id, "RigName": format!("rig-{}", id), "DeletedDate": null})
}

pub fn rigs(ids: std::ops::RangeInclusive<u32>) -> serde_json::Value {
    serde_json::Value::Array(ids.map(rig).collect())
}

/// Keeps every message so tests can assert on what the client reported.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn shared() -> (Arc<Self>, SharedDiagnostics) {
        let diag = Arc::new(Self::default());
        (diag.clone(), diag)
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn log(&self, level: Level, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}
