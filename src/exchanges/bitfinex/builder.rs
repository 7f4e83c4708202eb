use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{BitfinexSigner, ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::bitfinex::client::BitfinexClient;
use std::sync::Arc;
use tracing::debug;

/// Host serving public market data
pub const DEFAULT_PUBLIC_URL: &str = "https://api-pub.bitfinex.com";
/// Host serving authenticated endpoints
pub const DEFAULT_AUTH_URL: &str = "https://api.bitfinex.com";

/// Create a Bitfinex client over reqwest.
///
/// Without credentials the client can still call every public endpoint;
/// authenticated calls fail with an authentication error before anything
/// is sent.
pub fn build_client(config: ExchangeConfig) -> Result<BitfinexClient<ReqwestRest>, ExchangeError> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());
    let public_base_url = config
        .public_base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string());

    let mut rest_config = RestClientConfig::new(base_url, "bitfinex".to_string())
        .with_public_base_url(public_base_url);
    if let Some(timeout) = config.timeout_seconds {
        rest_config = rest_config.with_timeout(timeout);
    }

    let mut rest_builder = RestClientBuilder::new(rest_config);

    if config.has_credentials() {
        let signer = Arc::new(BitfinexSigner::from_secret(
            config.api_key().to_string(),
            config.secret_key.clone(),
        ));
        rest_builder = rest_builder.with_signer(signer);
    } else {
        debug!("No credentials configured, authenticated endpoints are unavailable");
    }

    let rest = rest_builder.build()?;
    let client = BitfinexClient::new(rest);
    Ok(match config.affiliate_code {
        Some(code) => client.with_affiliate_code(code),
        None => client,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hosts() {
        let client = build_client(ExchangeConfig::read_only()).unwrap();
        let config = client.rest().config();
        assert_eq!(config.base_url, DEFAULT_AUTH_URL);
        assert_eq!(config.public_base_url, DEFAULT_PUBLIC_URL);
        assert!(!client.rest().can_sign());
        assert_eq!(client.affiliate_code(), None);
    }

    #[test]
    fn test_config_overrides() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string())
            .base_url("http://localhost:9000".to_string())
            .affiliate_code("ref".to_string())
            .timeout_seconds(5);
        let client = build_client(config).unwrap();

        let rest_config = client.rest().config();
        assert_eq!(rest_config.base_url, "http://localhost:9000");
        assert_eq!(rest_config.public_base_url, DEFAULT_PUBLIC_URL);
        assert_eq!(rest_config.timeout_seconds, 5);
        assert!(client.rest().can_sign());
        assert_eq!(client.affiliate_code(), Some("ref"));
    }
}
