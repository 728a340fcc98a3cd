use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use reqwest::{Client, Proxy};

use crate::config::settings::ClientConfig;
use crate::error::{Error, Result};
use crate::resilience::retry::{Attempt, RetrySettings};
use crate::utils::constants::{API_KEY_HEADER, USER_AGENT};
use crate::utils::diagnostics::SharedDiagnostics;

/// Statuses absorbed by the retry policy.
const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Fully read response: status, headers and body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every line of a repeatable header, joined with ", ".
    pub fn header_joined(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    retry: RetrySettings,
    diagnostics: SharedDiagnostics,
}

impl Transport {
    pub fn new(config: &ClientConfig, diagnostics: SharedDiagnostics) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
            .map_err(|e| Error::Config(e.to_string()))?;
        let value = HeaderValue::from_str(&config.api_key)
            .map_err(|_| Error::Auth("API KEY contains characters not allowed in a header".to_string()))?;
        headers.insert(name, value);

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!config.verify);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        for (scheme, url) in &config.proxies {
            let proxy = match scheme.as_str() {
                "http" => Proxy::http(url),
                "https" => Proxy::https(url),
                _ => Proxy::all(url),
            }
            .map_err(|e| Error::Config(format!("proxies.{}: {}", scheme, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: RetrySettings {
                retries: config.retries,
                backoff_factor: config.backoff_factor,
                max_delay_ms: config.max_backoff_secs.saturating_mul(1000),
            },
            diagnostics,
        })
    }

    pub fn diagnostics(&self) -> &SharedDiagnostics {
        &self.diagnostics
    }

    /// Send one logical request.
    ///
    /// GET/HEAD requests are retried on connection failures and 5xx statuses;
    /// once retries run out the failure is a `Query` error. Every other status
    /// is returned to the caller for classification.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        authorization: Option<&str>,
    ) -> Result<HttpResponse> {
        let idempotent = is_idempotent(&method);
        self.diagnostics.debug(&format!("{} {} {:?}", method, url, params));

        self.retry
            .run_with_retry(&self.diagnostics, || {
                let mut request = self.client.request(method.clone(), url);
                if !params.is_empty() {
                    request = request.query(params);
                }
                if let Some(auth) = authorization {
                    request = request.header(http::header::AUTHORIZATION, auth);
                }
                if method == Method::POST {
                    request = request.header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                }
                async move {
                    let response = match request.send().await {
                        Ok(r) => r,
                        Err(e) => {
                            let err = Error::query(format!("request to {} failed: {}", url, e));
                            return if idempotent && (e.is_connect() || e.is_timeout()) {
                                Attempt::Retry(err)
                            } else {
                                Attempt::Fatal(err)
                            };
                        }
                    };

                    let status = response.status();
                    let headers = response.headers().clone();
                    let body = match response.text().await {
                        Ok(b) => b,
                        Err(e) => {
                            return Attempt::Fatal(Error::query(format!("failed to read response body: {}", e)))
                        }
                    };

                    if idempotent && RETRY_STATUSES.contains(&status.as_u16()) {
                        return Attempt::Retry(Error::query_status(status.as_u16(), &body));
                    }
                    Attempt::Done(HttpResponse { status, headers, body })
                }
            })
            .await
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_safe_verbs_are_retried() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::HEAD));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::PATCH));
    }

    #[test]
    fn rejects_api_key_that_cannot_be_a_header() {
        let config = ClientConfig::new("bad\nkey");
        let diag = crate::utils::diagnostics::TracingDiagnostics::shared(Default::default());
        let err = Transport::new(&config, diag).unwrap_err();
        assert!(err.is_auth_error());
    }
}
