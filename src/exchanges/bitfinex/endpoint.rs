use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::schema::FromSlot;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// A normalized request, ready to be handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub authenticated: bool,
}

impl RequestSpec {
    /// Public GET
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: false,
        }
    }

    /// Public POST (calculation endpoints)
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(path)
        }
    }

    /// Authenticated POST; every authenticated endpoint is a POST
    pub fn auth(path: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            ..Self::post(path)
        }
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Query parameter lookup, mostly for tests
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn describe(&self) -> Value {
        json!({
            "method": self.method.as_str(),
            "path": self.path,
            "query": self.query.iter().map(|(k, v)| (k.to_string(), Value::String(v.clone()))).collect::<serde_json::Map<_, _>>(),
            "body": self.body,
        })
    }
}

/// One upstream endpoint: how to build its request from validated input and
/// how to decode its response.
pub trait Endpoint: Serialize + Send + Sync {
    /// Call name attached to every error this endpoint raises
    const NAME: &'static str;

    type Output: Send;

    /// Validate the input, apply defaults and build the request
    fn request(&self) -> Result<RequestSpec, ExchangeError>;

    /// Decode the raw response
    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError>;
}

/// Decode `raw` as `T`, naming `decoder` in the error
pub fn decode_as<T: FromSlot>(decoder: &'static str, raw: &Value) -> Result<T, ExchangeError> {
    T::from_slot(raw).map_err(|e| ExchangeError::decode(decoder, raw, e))
}

/// Run one call: validate, send, decode. Failures are wrapped once with the
/// call name and the best input available at the point of failure.
#[instrument(skip_all, fields(call = E::NAME))]
pub async fn execute<R, E>(rest: &R, endpoint: &E) -> Result<E::Output, ExchangeError>
where
    R: RestClient + ?Sized,
    E: Endpoint,
{
    let spec = endpoint
        .request()
        .map_err(|e| e.in_call(E::NAME, serde_json::to_value(endpoint).ok()))?;

    debug!(method = %spec.method, path = %spec.path, "Sending request");

    let query: Vec<(&str, &str)> = spec.query.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let raw = rest
        .request(
            spec.method.clone(),
            &spec.path,
            &query,
            spec.body.as_ref(),
            spec.authenticated,
        )
        .await
        .map_err(|e| e.in_call(E::NAME, Some(spec.describe())))?;

    endpoint.decode(&raw).map_err(|e| {
        debug!("Decode failed: {}", e);
        e.in_call(E::NAME, Some(spec.describe()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_spec_builders() {
        let spec = RequestSpec::get("/v2/trades/tBTCUSD/hist")
            .query("limit", 120)
            .query_opt("start", None::<i64>)
            .query_opt("sort", Some("-1"));

        assert_eq!(spec.method, Method::GET);
        assert!(!spec.authenticated);
        assert_eq!(spec.query_value("limit"), Some("120"));
        assert_eq!(spec.query_value("start"), None);
        assert_eq!(spec.query_value("sort"), Some("-1"));

        let auth = RequestSpec::auth("/v2/auth/r/wallets");
        assert_eq!(auth.method, Method::POST);
        assert!(auth.authenticated);
    }

    #[test]
    fn test_describe_includes_query_and_body() {
        let spec = RequestSpec::auth("/v2/auth/r/ledgers/USD/hist")
            .body(json!({"limit": 25}));
        let described = spec.describe();

        assert_eq!(described["path"], "/v2/auth/r/ledgers/USD/hist");
        assert_eq!(described["body"]["limit"], 25);
        assert_eq!(described["method"], "POST");
    }
}
