use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    /// Host for authenticated endpoints
    pub base_url: Option<String>,
    /// Host for public endpoints
    pub public_base_url: Option<String>,
    /// Affiliate code attached to submitted orders
    pub affiliate_code: Option<String>,
    /// Per-request timeout; the transport default applies when unset
    pub timeout_seconds: Option<u64>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("public_base_url", &self.public_base_url)?;
        state.serialize_field("affiliate_code", &self.affiliate_code)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            #[serde(default)]
            api_key: String,
            #[serde(default)]
            secret_key: String,
            base_url: Option<String>,
            public_base_url: Option<String>,
            affiliate_code: Option<String>,
            timeout_seconds: Option<u64>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            base_url: helper.base_url,
            public_base_url: helper.public_base_url,
            affiliate_code: helper.affiliate_code,
            timeout_seconds: helper.timeout_seconds,
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url: None,
            public_base_url: None,
            affiliate_code: None,
            timeout_seconds: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `BITFINEX_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY` (e.g., `BITFINEX_SECRET_KEY`)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_PUBLIC_BASE_URL` (optional)
    /// - `{PREFIX}_AFFILIATE_CODE` (optional)
    /// - `{PREFIX}_TIMEOUT_SECONDS` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let timeout_var = format!("{}_TIMEOUT_SECONDS", prefix);
        let timeout_seconds = match env::var(&timeout_var) {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!("{} must be a whole number of seconds", timeout_var))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url: env::var(format!("{}_BASE_URL", prefix)).ok(),
            public_base_url: env::var(format!("{}_PUBLIC_BASE_URL", prefix)).ok(),
            affiliate_code: env::var(format!("{}_AFFILIATE_CODE", prefix)).ok(),
            timeout_seconds,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // No file; fall through to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Configuration for public endpoints only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Set custom base URL for authenticated endpoints
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set custom base URL for public endpoints
    #[must_use]
    pub fn public_base_url(mut self, public_base_url: String) -> Self {
        self.public_base_url = Some(public_base_url);
        self
    }

    #[must_use]
    pub fn affiliate_code(mut self, code: String) -> Self {
        self.affiliate_code = Some(code);
        self
    }

    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_redacts_credentials() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string())
            .affiliate_code("aff".to_string());
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["api_key"], "[REDACTED]");
        assert_eq!(json["secret_key"], "[REDACTED]");
        assert_eq!(json["affiliate_code"], "aff");
    }

    #[test]
    fn test_read_only_has_no_credentials() {
        assert!(!ExchangeConfig::read_only().has_credentials());
        assert!(ExchangeConfig::new("k".to_string(), "s".to_string()).has_credentials());
    }

    #[test]
    fn test_deserialize_without_credentials() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"base_url":"http://localhost:9000"}"#).unwrap();
        assert!(!config.has_credentials());
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
    }
}
