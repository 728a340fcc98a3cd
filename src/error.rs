//! Error taxonomy for the Direct Access client.

use thiserror::Error;

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or rejected credentials, or the token endpoint kept failing
    /// after the retry budget ran out.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The dataset name is not known to the API (404).
    #[error("invalid dataset provided: {0}")]
    Dataset(String),

    /// Bad filter parameters (400), unexpected status, malformed body, or a
    /// transport failure that outlived its retries.
    #[error("query failed: {message}")]
    Query {
        status: Option<u16>,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn query(message: impl Into<String>) -> Self {
        Error::Query { status: None, message: message.into() }
    }

    pub(crate) fn query_status(status: u16, body: &str) -> Self {
        Error::Query {
            status: Some(status),
            message: format!("Non-200 response: {} {}", status, body),
        }
    }

    /// HTTP status attached to the failure, when the server sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Query { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_dataset_error(&self) -> bool {
        matches!(self, Error::Dataset(_))
    }

    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::Query { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_status_carries_status_and_body() {
        let err = Error::query_status(418, "teapot");
        assert_eq!(err.status(), Some(418));
        assert!(err.is_query_error());
        assert_eq!(err.to_string(), "query failed: Non-200 response: 418 teapot");
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::Auth("no key".into()).is_auth_error());
        assert!(Error::Dataset("nope".into()).is_dataset_error());
        assert!(!Error::Dataset("nope".into()).is_query_error());
        assert_eq!(Error::Auth("x".into()).status(), None);
    }
}
