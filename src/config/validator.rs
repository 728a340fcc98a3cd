//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Covers base URL, proxy, retry and timeout invariants
//!
//! `validate_client_config` leaves credentials alone so missing ones surface
//! as authentication failures when the client is built. Config files go
//! through `validate_config_file`, which checks them as well.

use reqwest::Url;

use crate::config::settings::ClientConfig;

const PROXY_SCHEMES: [&str; 3] = ["http", "https", "all"];

/// Returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_client_config(cfg: &ClientConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_base_url(&cfg.base_url, &mut errors);
    validate_retry(cfg, &mut errors);
    validate_proxies(cfg, &mut errors);

    if cfg.timeout_secs == Some(0) {
        errors.push("timeout_secs: must be > 0 when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Everything `validate_client_config` checks, plus credentials.
pub fn validate_config_file(cfg: &ClientConfig) -> Result<(), Vec<String>> {
    let mut errors = validate_client_config(cfg).err().unwrap_or_default();
    validate_credentials(cfg, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_credentials(cfg: &ClientConfig, errors: &mut Vec<String>) {
    if cfg.api_key.trim().is_empty() {
        errors.push("api_key: must not be empty".to_string());
    }
    let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
    if cfg.api_version.uses_tokens() && (missing(&cfg.client_id) || missing(&cfg.client_secret)) {
        errors.push("client_id/client_secret: required by the v2 API".to_string());
    }
}

fn validate_base_url(base_url: &str, errors: &mut Vec<String>) {
    match Url::parse(base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "base_url: unsupported scheme '{}' in '{}'",
            url.scheme(),
            base_url
        )),
        Err(e) => errors.push(format!("base_url: '{}' is not a valid URL: {}", base_url, e)),
    }
}

fn validate_retry(cfg: &ClientConfig, errors: &mut Vec<String>) {
    if !cfg.backoff_factor.is_finite() || cfg.backoff_factor < 0.0 {
        errors.push(format!(
            "backoff_factor: must be a non-negative number, got {}",
            cfg.backoff_factor
        ));
    }
    // invariant: the cap applies to every computed delay
    if cfg.max_backoff_secs == 0 && cfg.backoff_factor > 0.0 {
        errors.push("max_backoff_secs: must be > 0 when backoff_factor is set".to_string());
    }
}

fn validate_proxies(cfg: &ClientConfig, errors: &mut Vec<String>) {
    for (scheme, proxy) in &cfg.proxies {
        if !PROXY_SCHEMES.contains(&scheme.as_str()) {
            errors.push(format!(
                "proxies.{}: unknown scheme, expected one of {:?}",
                scheme, PROXY_SCHEMES
            ));
        }
        if let Err(e) = Url::parse(proxy) {
            errors.push(format!("proxies.{}: '{}' is not a valid URL: {}", scheme, proxy, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_client_config(&ClientConfig::new("key")).is_ok());
    }

    #[test]
    fn collects_every_issue() {
        let mut cfg = ClientConfig::new("key")
            .with_base_url("ftp://example.com")
            .with_proxy("socks", "not a url")
            .with_retries(3, -1.0);
        cfg.timeout_secs = Some(0);

        let errors = validate_client_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.iter().any(|e| e.starts_with("base_url")));
        assert!(errors.iter().any(|e| e.starts_with("backoff_factor")));
        assert!(errors.iter().any(|e| e.contains("unknown scheme")));
        assert!(errors.iter().any(|e| e.contains("not a valid URL")));
        assert!(errors.iter().any(|e| e.starts_with("timeout_secs")));
    }

    #[test]
    fn config_files_need_credentials() {
        let errors = validate_config_file(&ClientConfig::new(" ")).unwrap_err();
        assert_eq!(errors.len(), 2, "{:?}", errors);

        let v1 = ClientConfig::new("key").with_api_version(crate::config::settings::ApiVersion::V1);
        assert!(validate_config_file(&v1).is_ok());
        assert!(validate_config_file(&ClientConfig::new("key").with_client_credentials("id", "secret")).is_ok());
    }
}
