//! # Direct Access client
//!
//! Fetches dataset records from the Direct Access REST API as a lazily
//! produced sequence, handling pagination, client-credentials tokens,
//! 401 refresh, 403 throttling on the token endpoint, 5xx retries and
//! chunking of oversized `in(...)` filters.
//!
//! Modules:
//! - `config`: client configuration, YAML loading and validation
//! - `auth`: credentials and the client-credentials token manager
//! - `transport`: shared HTTP session with retry policy
//! - `query`: filter options, chunking, classification, pagination
//! - `export`: delimited text export of a record stream

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod query;
pub mod resilience;
pub mod session;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::client::{DirectAccess, SchemaDialect};
pub use crate::config::settings::{ApiVersion, ClientConfig};
pub use crate::error::{Error, Result};
pub use crate::query::{in_list, QueryOptions, Record, RecordStream};
pub use crate::utils::diagnostics::{Diagnostics, SharedDiagnostics, TracingDiagnostics};
pub use crate::utils::logging::LogLevel;
