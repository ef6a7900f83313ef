use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Gosub/1.0 (X11; Linux x86_64) Gecko/20250802 GosubBrowser/1.0";

/// Configuration shared by the requests created from it and by [`ReqwestTransport`](crate::net::ReqwestTransport).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XhrConfig {
    /// Base URL relative request URLs are resolved against. Without one, only absolute URLs can be opened.
    pub base_url: Option<Url>,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Timeout (in milliseconds) new requests start with. 0 means no timeout.
    pub default_timeout_ms: u64,
    /// Keep a cookie jar for credentialed requests
    pub cookies: bool,
}

impl Default for XhrConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_timeout_ms: 0,
            cookies: true,
        }
    }
}

impl XhrConfig {
    /// Loads a configuration from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let config = XhrConfig::from_json(r#"{ "base_url": "https://example.com/app/", "default_timeout_ms": 250 }"#).unwrap();

        assert_eq!(config.base_url.as_ref().map(Url::as_str), Some("https://example.com/app/"));
        assert_eq!(config.default_timeout_ms, 250);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.cookies);
    }

    #[test]
    fn from_json_rejects_invalid_base_url() {
        assert!(XhrConfig::from_json(r#"{ "base_url": "not a url" }"#).is_err());
    }
}
