use regex::Regex;

use crate::error::{Error, Result};

/// Extract the `rel="next"` target from an RFC 8288 `Link` header value.
pub fn next_link(header: &str) -> Result<Option<String>> {
    let entry = Regex::new(r"<(?P<url>[^>]*)>(?P<params>[^<]*)").map_err(|e| Error::query(e.to_string()))?;
    let rel = Regex::new(r#"(?i)rel\s*=\s*(?:"([^"]*)"|([^;,\s]+))"#).map_err(|e| Error::query(e.to_string()))?;

    for caps in entry.captures_iter(header) {
        let params = caps.name("params").map(|m| m.as_str()).unwrap_or("");
        let is_next = rel.captures_iter(params).any(|r| {
            r.get(1)
                .or_else(|| r.get(2))
                .map(|v| v.as_str().split_whitespace().any(|t| t.eq_ignore_ascii_case("next")))
                .unwrap_or(false)
        });
        if is_next {
            return Ok(caps.name("url").map(|m| m.as_str().to_string()));
        }
    }
    Ok(None)
}

/// Absolute links are used as is; relative ones hang off the versioned API URL.
pub fn resolve_link(api_url: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{}{}", api_url.trim_end_matches('/'), link)
    } else {
        format!("{}/{}", api_url.trim_end_matches('/'), link)
    }
}
