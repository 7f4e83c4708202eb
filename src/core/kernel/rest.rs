use crate::core::config::ConfigError;
use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{NonceGenerator, Signer};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, trace, warn};

/// REST client trait for making HTTP requests
///
/// This is the single transport capability the endpoint layer consumes.
/// Implementations send the request, sign it when asked to, and return the
/// response body as JSON. A body carrying the upstream error tuple must be
/// surfaced as [`ExchangeError::ApiError`] whatever the HTTP status.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Perform a request
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - The API endpoint path, e.g. `/v2/tickers`
    /// * `query_params` - Query parameters as key-value pairs
    /// * `body` - Optional JSON body
    /// * `authenticated` - Whether to sign the request
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;

    /// Make a GET request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.request(Method::GET, endpoint, query_params, None, authenticated)
            .await
    }

    /// Make a POST request
    async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.request(Method::POST, endpoint, &[], Some(body), authenticated)
            .await
    }
}

/// Recognize the upstream structured error convention.
///
/// Errors arrive as `["error", CODE, MESSAGE]`; rate-limit and gateway errors
/// sometimes arrive as `{"error": MESSAGE}` instead, in which case
/// `fallback_code` (the HTTP status) is used.
pub fn upstream_error(value: &Value, fallback_code: i64) -> Option<ExchangeError> {
    match value {
        Value::Array(items) if items.first().and_then(Value::as_str) == Some("error") => {
            Some(ExchangeError::ApiError {
                code: items.get(1).and_then(Value::as_i64).unwrap_or(fallback_code),
                message: items
                    .get(2)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                raw: value.clone(),
            })
        }
        Value::Object(fields) if fields.contains_key("error") => {
            let message = fields
                .get("message")
                .or_else(|| fields.get("error"))
                .map(|m| m.as_str().map_or_else(|| m.to_string(), ToString::to_string))
                .unwrap_or_default();

            Some(ExchangeError::ApiError {
                code: fields
                    .get("code")
                    .and_then(Value::as_i64)
                    .unwrap_or(fallback_code),
                message,
                raw: value.clone(),
            })
        }
        _ => None,
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for authenticated endpoints
    pub base_url: String,
    /// Base URL for public endpoints
    pub public_base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    /// Create a new configuration; public endpoints use the same host until
    /// [`with_public_base_url`](Self::with_public_base_url) says otherwise.
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            public_base_url: base_url.clone(),
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("bfx-rest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_public_base_url(mut self, public_base_url: String) -> Self {
        self.public_base_url = public_base_url;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    nonce: &'static NonceGenerator,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            nonce: NonceGenerator::process(),
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            nonce: self.nonce,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    nonce: &'static NonceGenerator,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    fn build_url(&self, endpoint: &str, authenticated: bool) -> String {
        let base = if authenticated {
            &self.config.base_url
        } else {
            &self.config.public_base_url
        };
        format!("{}{}", base.trim_end_matches('/'), endpoint)
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        parse_response(status, &response_text)
    }
}

fn parse_response(status: StatusCode, body: &str) -> Result<Value, ExchangeError> {
    let status_code = i64::from(status.as_u16());

    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            if let Some(err) = upstream_error(&value, status_code) {
                warn!(status = %status, "Upstream error: {}", err);
                return Err(err);
            }
            if status.is_success() {
                Ok(value)
            } else {
                Err(ExchangeError::ApiError {
                    code: status_code,
                    message: body.to_string(),
                    raw: value,
                })
            }
        }
        Err(e) if status.is_success() => Err(ExchangeError::JsonError(e)),
        Err(_) => Err(ExchangeError::ApiError {
            code: status_code,
            message: body.to_string(),
            raw: Value::String(body.to_string()),
        }),
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        let url = self.build_url(endpoint, authenticated);
        let mut request = self.client.request(method, &url);

        if !query_params.is_empty() {
            request = request.query(query_params);
        }

        if authenticated {
            let signer = self.signer.as_ref().ok_or_else(|| {
                ExchangeError::AuthError(
                    "Authentication required but no signer provided".to_string(),
                )
            })?;

            // Authenticated calls always carry a JSON body, `{}` at minimum
            let body_bytes = match body {
                Some(body) => serde_json::to_vec(body)?,
                None => b"{}".to_vec(),
            };
            let nonce = self.nonce.next();
            let headers = signer.sign_request(endpoint, nonce, &body_bytes)?;

            for (key, value) in headers {
                request = request.header(&key, &value);
            }
            request = request
                .header("Content-Type", "application/json")
                .body(body_bytes);
        } else if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_error_tuple_is_upstream_error() {
        let raw = json!(["error", 10020, "limit: invalid"]);
        match upstream_error(&raw, 500) {
            Some(ExchangeError::ApiError { code, message, .. }) => {
                assert_eq!(code, 10020);
                assert_eq!(message, "limit: invalid");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_object_uses_status_code() {
        let raw = json!({"error": "ERR_RATE_LIMIT"});
        match upstream_error(&raw, 429) {
            Some(ExchangeError::ApiError { code, message, .. }) => {
                assert_eq!(code, 429);
                assert_eq!(message, "ERR_RATE_LIMIT");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_regular_payloads_pass_through() {
        assert!(upstream_error(&json!([["tBTCUSD", 1, 2]]), 200).is_none());
        assert!(upstream_error(&json!(["error-ish", 1]), 200).is_none());
        assert!(upstream_error(&json!(null), 200).is_none());
    }

    #[test]
    fn test_error_tuple_wins_over_success_status() {
        let err = parse_response(StatusCode::OK, r#"["error",10001,"symbol: invalid"]"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_non_json_failure_is_upstream_error() {
        let err = parse_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        match err {
            ExchangeError::ApiError { code, .. } => assert_eq!(code, 502),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_success_body_is_json_error() {
        let err = parse_response(StatusCode::OK, "[1,").unwrap_err();
        assert!(matches!(err, ExchangeError::JsonError(_)));
    }

    #[tokio::test]
    async fn test_authenticated_request_without_signer_fails_before_sending() {
        let config = RestClientConfig::new("http://127.0.0.1:9".to_string(), "bitfinex".to_string());
        let rest = RestClientBuilder::new(config).build().unwrap();
        assert!(!rest.can_sign());

        let err = rest.post("/v2/auth/r/wallets", &json!({}), true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_public_and_authenticated_hosts() {
        let config = RestClientConfig::new("https://api.bitfinex.com/".to_string(), "bitfinex".to_string())
            .with_public_base_url("https://api-pub.bitfinex.com".to_string());
        let rest = RestClientBuilder::new(config).build().unwrap();

        assert_eq!(
            rest.build_url("/v2/tickers", false),
            "https://api-pub.bitfinex.com/v2/tickers"
        );
        assert_eq!(
            rest.build_url("/v2/auth/r/wallets", true),
            "https://api.bitfinex.com/v2/auth/r/wallets"
        );
    }
}
