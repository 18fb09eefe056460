//! Environment-derived server configuration
//!
//! All settings are read once at startup and validated before the server
//! binds; nothing else in the process consults the environment. The checks
//! mirror what the service needs to run at all: endpoint credentials, the
//! capture API location, a way to authenticate against it, and a delivery
//! receiver.

use docshape_core::{CaptureConfig, Error, Result};
use url::Url;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fully validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Username protecting the conversion endpoint
    pub basic_auth_username: String,
    /// Password protecting the conversion endpoint
    pub basic_auth_password: String,
    /// Pre-issued capture API token, tried before logging in
    pub capture_token: Option<String>,
    /// Capture API and delivery connection settings
    pub capture: CaptureConfig,
    /// Listen address
    pub bind_address: String,
}

impl ServerConfig {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first variable that is
    /// missing or invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let (basic_auth_username, basic_auth_password) =
            match (get("BASIC_AUTH_USERNAME"), get("BASIC_AUTH_PASSWORD")) {
                (Some(username), Some(password)) => (username, password),
                _ => {
                    return Err(Error::Configuration {
                        message: "BASIC_AUTH_USERNAME and BASIC_AUTH_PASSWORD must be set \
                                  as environment variables"
                            .to_string(),
                    })
                }
            };

        let base_url = parse_url("CAPTURE_BASE_URL", get("CAPTURE_BASE_URL"))?;
        let delivery_url = parse_url("DELIVERY_URL", get("DELIVERY_URL"))?;

        let capture_token = get("CAPTURE_TOKEN");
        let username = get("CAPTURE_USERNAME");
        let password = get("CAPTURE_PASSWORD");
        if capture_token.is_none() && (username.is_none() || password.is_none()) {
            return Err(Error::Configuration {
                message: "Cannot authenticate requests to the capture API. Either \
                          CAPTURE_TOKEN or CAPTURE_USERNAME and CAPTURE_PASSWORD must \
                          be defined"
                    .to_string(),
            });
        }

        let timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| Error::Configuration {
                message: format!("HTTP_TIMEOUT_SECS must be a number of seconds, got {:?}", raw),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            basic_auth_username,
            basic_auth_password,
            capture_token,
            capture: CaptureConfig {
                base_url,
                delivery_url,
                username,
                password,
                timeout_secs,
            },
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        })
    }
}

fn parse_url(name: &str, value: Option<String>) -> Result<Url> {
    let value = value.ok_or_else(|| Error::Configuration {
        message: format!("{} variable is not set", name),
    })?;
    Url::parse(&value).map_err(|e| Error::Configuration {
        message: format!("{} is not a valid URL: {}", name, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("BASIC_AUTH_USERNAME", "user"),
        ("BASIC_AUTH_PASSWORD", "pass"),
        ("CAPTURE_BASE_URL", "https://acme.example/api/v1"),
        ("DELIVERY_URL", "https://bin.example/post"),
        ("CAPTURE_TOKEN", "token-1"),
    ];

    #[test]
    fn test_complete_configuration_with_defaults() {
        let config = ServerConfig::from_lookup(lookup(COMPLETE)).expect("config should load");
        assert_eq!(config.basic_auth_username, "user");
        assert_eq!(config.capture_token.as_deref(), Some("token-1"));
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.capture.timeout_secs, 30);
        assert_eq!(
            config.capture.base_url.as_str(),
            "https://acme.example/api/v1"
        );
    }

    #[test]
    fn test_missing_basic_auth_rejected() {
        let vars = &[
            ("CAPTURE_BASE_URL", "https://acme.example/api/v1"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_TOKEN", "token-1"),
        ];
        let err = ServerConfig::from_lookup(lookup(vars)).expect_err("should fail");
        assert!(err.to_string().contains("BASIC_AUTH_USERNAME"));
    }

    #[test]
    fn test_missing_base_url_rejected() {
        let vars = &[
            ("BASIC_AUTH_USERNAME", "user"),
            ("BASIC_AUTH_PASSWORD", "pass"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_TOKEN", "token-1"),
        ];
        let err = ServerConfig::from_lookup(lookup(vars)).expect_err("should fail");
        assert!(err.to_string().contains("CAPTURE_BASE_URL"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let vars = &[
            ("BASIC_AUTH_USERNAME", "user"),
            ("BASIC_AUTH_PASSWORD", "pass"),
            ("CAPTURE_BASE_URL", "not a url"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_TOKEN", "token-1"),
        ];
        let err = ServerConfig::from_lookup(lookup(vars)).expect_err("should fail");
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn test_token_or_login_credentials_required() {
        let vars = &[
            ("BASIC_AUTH_USERNAME", "user"),
            ("BASIC_AUTH_PASSWORD", "pass"),
            ("CAPTURE_BASE_URL", "https://acme.example/api/v1"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_USERNAME", "robot"),
        ];
        let err = ServerConfig::from_lookup(lookup(vars)).expect_err("should fail");
        assert!(err.to_string().contains("Cannot authenticate"));
    }

    #[test]
    fn test_login_credentials_instead_of_token() {
        let vars = &[
            ("BASIC_AUTH_USERNAME", "user"),
            ("BASIC_AUTH_PASSWORD", "pass"),
            ("CAPTURE_BASE_URL", "https://acme.example/api/v1"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_USERNAME", "robot"),
            ("CAPTURE_PASSWORD", "secret"),
        ];
        let config = ServerConfig::from_lookup(lookup(vars)).expect("config should load");
        assert!(config.capture_token.is_none());
        assert_eq!(config.capture.username.as_deref(), Some("robot"));
    }

    #[test]
    fn test_overrides_respected() {
        let vars = &[
            ("BASIC_AUTH_USERNAME", "user"),
            ("BASIC_AUTH_PASSWORD", "pass"),
            ("CAPTURE_BASE_URL", "https://acme.example/api/v1"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_TOKEN", "token-1"),
            ("BIND_ADDRESS", "127.0.0.1:9090"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ];
        let config = ServerConfig::from_lookup(lookup(vars)).expect("config should load");
        assert_eq!(config.bind_address, "127.0.0.1:9090");
        assert_eq!(config.capture.timeout_secs, 5);
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let vars = &[
            ("BASIC_AUTH_USERNAME", "user"),
            ("BASIC_AUTH_PASSWORD", "pass"),
            ("CAPTURE_BASE_URL", "https://acme.example/api/v1"),
            ("DELIVERY_URL", "https://bin.example/post"),
            ("CAPTURE_TOKEN", "token-1"),
            ("HTTP_TIMEOUT_SECS", "soon"),
        ];
        let err = ServerConfig::from_lookup(lookup(vars)).expect_err("should fail");
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"));
    }
}
