//! Endpoint inputs.
//!
//! Each parameter struct deserializes from caller JSON, validates itself and
//! applies its defaults in [`Endpoint::request`](super::endpoint::Endpoint::request);
//! nothing downstream fills in values.

pub mod account;
pub mod funding;
pub mod market;
pub mod trading;

pub use account::*;
pub use funding::*;
pub use market::*;
pub use trading::*;

use crate::core::errors::ExchangeError;
use crate::core::schema::to_millis;
use crate::core::types::{Instrument, Sort, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use super::endpoint::RequestSpec;

/// Default currency for endpoints that take one
pub const DEFAULT_CURRENCY: &str = "USD";

pub(crate) fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Default and maximum `limit` of one history endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default: u32,
    pub max: u32,
}

impl Limits {
    pub const fn new(default: u32, max: u32) -> Self {
        Self { default, max }
    }
}

/// Time window, page size and ordering shared by history endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Inclusive lower bound, epoch milliseconds on the wire
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub start: Option<Timestamp>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub end: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

impl QueryWindow {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Validate against the endpoint's limits and fill in defaults
    pub fn resolve(&self, limits: Limits) -> Result<ResolvedWindow, ExchangeError> {
        let limit = self.limit.unwrap_or(limits.default);
        if limit == 0 || limit > limits.max {
            return Err(ExchangeError::InvalidParameters(format!(
                "limit must be between 1 and {}, got {}",
                limits.max, limit
            )));
        }

        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            if start > end {
                return Err(ExchangeError::InvalidParameters(format!(
                    "start ({}) is after end ({})",
                    start, end
                )));
            }
        }

        Ok(ResolvedWindow {
            start: self.start.as_ref().map(to_millis),
            end: self.end.as_ref().map(to_millis),
            limit,
            sort: self.sort.unwrap_or_default(),
        })
    }
}

/// A validated window with defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub limit: u32,
    pub sort: Sort,
}

impl ResolvedWindow {
    /// As query parameters, for public endpoints
    pub fn apply(&self, spec: RequestSpec) -> RequestSpec {
        spec.query_opt("start", self.start)
            .query_opt("end", self.end)
            .query("limit", self.limit)
            .query("sort", self.sort.as_param())
    }

    /// As body fields, for authenticated endpoints
    pub fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        if let Some(start) = self.start {
            body.insert("start".to_string(), json!(start));
        }
        if let Some(end) = self.end {
            body.insert("end".to_string(), json!(end));
        }
        body.insert("limit".to_string(), json!(self.limit));
        body.insert("sort".to_string(), json!(self.sort.as_number()));
        body
    }
}

/// Candle and leaderboard timeframes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "3h")]
    ThreeHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "14D")]
    FourteenDays,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Timeframe {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::ThreeHours => "3h",
            Self::SixHours => "6h",
            Self::TwelveHours => "12h",
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::FourteenDays => "14D",
            Self::OneMonth => "1M",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a bare currency code and return it
pub(crate) fn currency_code(code: &str) -> Result<&str, ExchangeError> {
    Instrument::currency(code).resolve()?;
    Ok(code)
}

pub(crate) fn require_nonzero(name: &str, value: f64) -> Result<(), ExchangeError> {
    if value.is_finite() && value != 0.0 {
        Ok(())
    } else {
        Err(ExchangeError::InvalidParameters(format!(
            "{} must be a non-zero number, got {}",
            name, value
        )))
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> Result<(), ExchangeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ExchangeError::InvalidParameters(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

/// Funding periods are whole days between 2 and 120
pub(crate) fn validate_period(period: u32) -> Result<(), ExchangeError> {
    if (2..=120).contains(&period) {
        Ok(())
    } else {
        Err(ExchangeError::InvalidParameters(format!(
            "period must be between 2 and 120 days, got {}",
            period
        )))
    }
}

/// Join an optional symbol onto a path: `/v2/auth/r/orders` + `tBTCUSD`
pub(crate) fn with_symbol(base: &str, symbol: Option<&str>) -> String {
    match symbol {
        Some(symbol) => format!("{}/{}", base, symbol),
        None => base.to_string(),
    }
}
