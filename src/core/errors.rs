use crate::core::schema::SchemaError;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The upstream answered with its `["error", code, message]` tuple
    #[error("API error: {code} - {message}")]
    ApiError {
        code: i64,
        message: String,
        raw: Value,
    },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    /// The upstream payload did not match the record shape a decoder expects
    #[error("Failed to decode {decoder}: {source}")]
    DecodeError {
        decoder: &'static str,
        raw: Value,
        #[source]
        source: SchemaError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    /// Context attached once by the public call that failed
    #[error("{call} failed: {source}")]
    CallFailed {
        call: &'static str,
        input: Option<Value>,
        #[source]
        source: Box<ExchangeError>,
    },

    #[error("Other error: {0}")]
    Other(String),
}

/// Coarse classification of an [`ExchangeError`], independent of call context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    SchemaValidation,
    Upstream,
    Transport,
    Authentication,
    Configuration,
    Other,
}

impl ExchangeError {
    pub fn decode(decoder: &'static str, raw: &Value, source: SchemaError) -> Self {
        Self::DecodeError {
            decoder,
            raw: raw.clone(),
            source,
        }
    }

    /// Wrap the error with the name and normalized input of the failing call
    pub fn in_call(self, call: &'static str, input: Option<Value>) -> Self {
        Self::CallFailed {
            call,
            input,
            source: Box::new(self),
        }
    }

    /// The innermost error, with every call context peeled off
    pub fn root(&self) -> &Self {
        match self {
            Self::CallFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::InvalidParameters(_) => ErrorKind::InputValidation,
            Self::DecodeError { .. } | Self::JsonError(_) => ErrorKind::SchemaValidation,
            Self::ApiError { .. } => ErrorKind::Upstream,
            Self::HttpError(_) | Self::NetworkError(_) => ErrorKind::Transport,
            Self::AuthError(_) => ErrorKind::Authentication,
            Self::ConfigError(_) => ErrorKind::Configuration,
            Self::Other(_) | Self::CallFailed { .. } => ErrorKind::Other,
        }
    }

    /// Name of the outermost call this error was raised from, if any
    pub fn call(&self) -> Option<&'static str> {
        match self {
            Self::CallFailed { call, .. } => Some(*call),
            _ => None,
        }
    }

    /// Normalized input of the outermost failing call
    pub fn input(&self) -> Option<&Value> {
        match self {
            Self::CallFailed { input, .. } => input.as_ref(),
            _ => None,
        }
    }

    /// The raw upstream payload that caused the failure, when one was received
    pub fn raw_response(&self) -> Option<&Value> {
        match self.root() {
            Self::ApiError { raw, .. } | Self::DecodeError { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self.root() {
            Self::DecodeError { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_input_validation(&self) -> bool {
        self.kind() == ErrorKind::InputValidation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Expected;
    use serde_json::json;

    #[test]
    fn test_call_context_wraps_without_losing_root() {
        let raw = json!(["error", 10020, "limit: invalid"]);
        let err = ExchangeError::ApiError {
            code: 10020,
            message: "limit: invalid".to_string(),
            raw: raw.clone(),
        }
        .in_call("candles", Some(json!({"limit": 5})));

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.call(), Some("candles"));
        assert_eq!(err.input(), Some(&json!({"limit": 5})));
        assert_eq!(err.raw_response(), Some(&raw));
        assert!(err.to_string().starts_with("candles failed"));
    }

    #[test]
    fn test_decode_error_exposes_schema_detail() {
        let raw = json!([1, "x"]);
        let source = SchemaError::new(Expected::Number, &json!("x")).field("close");
        let err = ExchangeError::decode("Candle", &raw, source).in_call("candles", None);

        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert_eq!(err.schema_error().map(|e| e.path.as_str()), Some("$.close"));
        assert_eq!(err.raw_response(), Some(&raw));
    }
}
