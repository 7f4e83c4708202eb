/// Transport kernel
///
/// The kernel holds the transport and authentication plumbing the endpoint
/// layer calls into. It knows nothing about record shapes.
///
/// ## Transport
/// - `RestClient`: the "perform request" capability
/// - `ReqwestRest`: reqwest implementation with upstream error detection
///
/// ## Authentication
/// - `Signer`: pluggable request signing
/// - `BitfinexSigner`: HMAC-SHA384 over path, nonce and body
/// - `NonceGenerator`: strictly increasing, process-wide nonces
///
/// ## Basic usage
/// ```rust,no_run
/// use bfx_rest::core::kernel::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new(
///     "https://api.bitfinex.com".to_string(),
///     "bitfinex".to_string(),
/// );
/// let signer = Arc::new(BitfinexSigner::new("api_key".to_string(), "secret".to_string()));
/// let rest = RestClientBuilder::new(rest_config).with_signer(signer).build()?;
///
/// let wallets = rest.post("/v2/auth/r/wallets", &serde_json::json!({}), true).await?;
/// println!("{}", wallets);
/// # Ok(())
/// # }
/// ```
pub mod rest;
pub mod signer;

pub use rest::{upstream_error, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{BitfinexSigner, NonceGenerator, SignatureResult, Signer};
