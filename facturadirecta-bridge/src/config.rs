//! Bridge configuration and API credentials.
//!
//! [`BridgeConfig`] is read from TOML and controls batch behaviour and the HTTP client.
//! [`Credentials`] are supplied by the host per run and never written anywhere: their
//! `Debug` output is redacted and the token only ever leaves the process inside the
//! `Authorization` header.

use std::{env, fmt, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{BridgeError, Result},
    transport::HttpConfig,
};

/// Default API domain; each account is served from a subdomain of it.
pub const DEFAULT_API_DOMAIN: &str = "facturadirecta.com";

/// Environment variable read by [`Credentials::from_env`] for the account name.
pub const ACCOUNT_ENV: &str = "FACTURADIRECTA_ACCOUNT";

/// Environment variable read by [`Credentials::from_env`] for the API token.
pub const TOKEN_ENV: &str = "FACTURADIRECTA_API_TOKEN";

/// Root bridge configuration.
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::BridgeConfig;
///
/// let config = BridgeConfig::from_toml(
///     r#"
///     continue_on_fail = true
///
///     [http]
///     timeout_secs = 45
///     "#,
/// )
/// .unwrap();
///
/// assert!(config.continue_on_fail);
/// assert_eq!(config.api_domain, "facturadirecta.com");
/// assert_eq!(config.http.timeout_secs, 45);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Turn item failures into error records instead of aborting the batch.
    #[serde(default)]
    pub continue_on_fail: bool,

    /// Domain below which `{account}.{domain}` is addressed.
    #[serde(default = "default_api_domain")]
    pub api_domain: String,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            continue_on_fail: false,
            api_domain: default_api_domain(),
            http: HttpConfig::default(),
        }
    }
}

fn default_api_domain() -> String {
    DEFAULT_API_DOMAIN.to_owned()
}

impl BridgeConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if TOML parsing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| BridgeError::Config(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if the file cannot be read or is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BridgeError::Config(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// This method checks for:
    /// - HTTP timeouts within their bounds
    /// - `api_domain` being a bare host name (no scheme, port or path)
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if any validation fails.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        validate_api_domain(&self.api_domain)
    }
}

fn validate_api_domain(domain: &str) -> Result<()> {
    let invalid = || BridgeError::Config(format!("api_domain '{domain}' is not a host name"));

    if domain.is_empty()
        || domain.contains(['/', ':', '@', '?', '#'])
        || domain.contains(char::is_whitespace)
    {
        return Err(invalid());
    }

    let url = Url::parse(&format!("https://account.{domain}/")).map_err(|_| invalid())?;
    let expected = format!("account.{}", domain.to_ascii_lowercase());
    if url.host_str() != Some(expected.as_str()) {
        return Err(invalid());
    }
    Ok(())
}

/// FacturaDirecta API credentials.
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::Credentials;
///
/// let credentials = Credentials::new("acme", "secret-token");
/// assert!(credentials.validate().is_ok());
/// assert!(!format!("{credentials:?}").contains("secret-token"));
/// ```
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Account subdomain (`{account}.facturadirecta.com`).
    pub account_name: String,
    /// API token, sent as the Basic auth user name.
    pub api_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Creates credentials.
    pub fn new(account_name: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self { account_name: account_name.into(), api_token: api_token.into() }
    }

    /// Reads credentials from [`ACCOUNT_ENV`] and [`TOKEN_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidCredentials`] if either variable is unset or the
    /// values fail [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            env::var(name).map_err(|_| {
                BridgeError::InvalidCredentials(format!("environment variable {name} is not set"))
            })
        };
        let credentials = Self::new(read(ACCOUNT_ENV)?, read(TOKEN_ENV)?);
        credentials.validate()?;
        Ok(credentials)
    }

    /// Validates the credentials before any URL is built from them.
    ///
    /// The account name must be a single DNS label: 1-63 ASCII letters, digits or
    /// hyphens, not starting or ending with a hyphen. The token must be non-empty and
    /// free of control characters.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidCredentials`]; the message never includes the token.
    pub fn validate(&self) -> Result<()> {
        let account = self.account_name.as_str();
        let valid_label = (1..=63).contains(&account.len())
            && account.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !account.starts_with('-')
            && !account.ends_with('-');
        if !valid_label {
            return Err(BridgeError::InvalidCredentials(format!(
                "account name '{account}' is not a valid subdomain"
            )));
        }

        if self.api_token.is_empty() {
            return Err(BridgeError::InvalidCredentials("API token is empty".to_owned()));
        }
        if self.api_token.chars().any(char::is_control) {
            return Err(BridgeError::InvalidCredentials(
                "API token contains control characters".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(!config.continue_on_fail);
        assert_eq!(config.api_domain, DEFAULT_API_DOMAIN);
        assert_eq!(config.http, HttpConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(BridgeConfig::from_toml("").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            continue_on_fail = true
            api_domain = "sandbox.facturadirecta.com"

            [http]
            timeout_secs = 60
            connect_timeout_secs = 5
            pool_max_idle_per_host = 4
        "#;

        let config = BridgeConfig::from_toml(toml).unwrap();
        assert!(config.continue_on_fail);
        assert_eq!(config.api_domain, "sandbox.facturadirecta.com");
        assert_eq!(config.http.timeout_secs, 60);
        assert_eq!(config.http.connect_timeout_secs, 5);
        assert_eq!(config.http.pool_max_idle_per_host, 4);
    }

    #[test]
    fn test_invalid_toml() {
        let err = BridgeConfig::from_toml("continue_on_fail = ").unwrap_err();
        assert!(
            matches!(err, BridgeError::Config(ref msg) if msg.starts_with("invalid TOML config"))
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(BridgeConfig::from_toml("retries = 3").is_err());
    }

    #[test]
    fn test_http_bounds_validated() {
        let err = BridgeConfig::from_toml("[http]\ntimeout_secs = 301").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_api_domain_validation() {
        let rejected =
            ["", "https://facturadirecta.com", "facturadirecta.com/api", "host:8443", "a b"];
        for domain in rejected {
            assert!(validate_api_domain(domain).is_err(), "{domain}");
        }
        for domain in ["facturadirecta.com", "sandbox.facturadirecta.com", "Example.ORG"] {
            assert!(validate_api_domain(domain).is_ok(), "{domain}");
        }
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("fd-bridge-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "continue_on_fail = true").unwrap();
        drop(file);

        let config = BridgeConfig::from_file(&path).unwrap();
        assert!(config.continue_on_fail);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_missing_file() {
        let err = BridgeConfig::from_file("/nonexistent/bridge.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = Credentials::new("acme", "super-secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("acme"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_credentials_deserialize_camel_case() {
        let credentials: Credentials =
            serde_json::from_str(r#"{"accountName": "acme", "apiToken": "t0k"}"#).unwrap();
        assert_eq!(credentials.account_name, "acme");
        assert_eq!(credentials.api_token, "t0k");
    }

    #[test]
    fn test_account_name_validation() {
        let longest = "a".repeat(63);
        let too_long = "a".repeat(64);

        for account in ["acme", "acme-2", "A1", longest.as_str()] {
            assert!(Credentials::new(account, "t").validate().is_ok(), "{account}");
        }
        let rejected =
            ["", "-acme", "acme-", "acme.evil.com", "acme/x", "ac me", too_long.as_str()];
        for account in rejected {
            let err = Credentials::new(account, "t").validate().unwrap_err();
            assert!(matches!(err, BridgeError::InvalidCredentials(_)), "{account}");
        }
    }

    #[test]
    fn test_token_validation_never_echoes_token() {
        let err = Credentials::new("acme", "").validate().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidCredentials(_)));

        let err = Credentials::new("acme", "bad\ntoken").validate().unwrap_err();
        assert!(!err.to_string().contains("bad"));
    }
}
