use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

use crate::config::settings::ClientConfig;
use crate::config::validator;
use crate::error::{Error, Result};

/// Load and validate config from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read '{}': {}", path.display(), e)))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ClientConfig> {
    let expanded = expand_env_vars(content)?;
    let config: ClientConfig = serde_yaml::from_str(&expanded)
        .inspect_err(|e| error!("parse config error: {}", e))
        .map_err(|e| Error::Config(format!("invalid config format: {}", e)))?;

    debug!("validating config ...");
    validator::validate_config_file(&config).map_err(|errors| Error::Config(errors.join("; ")))?;
    Ok(config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values.
fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}")
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::ApiVersion;
    use crate::utils::logging::LogLevel;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn expands_env_and_defaults() {
        std::env::set_var("DA_TEST_API_KEY", "from-env");
        std::env::remove_var("DA_TEST_MISSING");
        let yaml = r#"
api_key: ${DA_TEST_API_KEY}
client_id: ${DA_TEST_MISSING:fallback-id}
client_secret: secret
retries: 2
backoff_factor: 0.5
log_level: debug
api_version: v1
proxies:
  https: http://proxy.local:3128
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.client_id.as_deref(), Some("fallback-id"));
        assert_eq!(config.retries, 2);
        assert_eq!(config.backoff_factor, 0.5);
        assert_eq!(config.log_level, LogLevel::DEBUG);
        assert_eq!(config.api_version, ApiVersion::V1);
        assert_eq!(config.proxies.get("https").map(String::as_str), Some("http://proxy.local:3128"));
        // untouched defaults
        assert!(config.verify);
        assert_eq!(config.throttle_backoff_secs, 60);
        std::env::remove_var("DA_TEST_API_KEY");
    }

    #[test]
    fn rejects_invalid_values_with_config_error() {
        let err = parse_config("api_key: k\nbase_url: nope\n").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("base_url")), "{}", err);

        let err = parse_config("api_key: k\n").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("client_id")), "{}", err);

        let err = parse_config("api_key: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.starts_with("invalid config format")));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key: file-key\nclient_id: id\nclient_secret: secret\nverify: false").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.api_key, "file-key");
        assert!(!config.verify);

        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
