use crate::core::errors::ExchangeError;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::core::schema::Timestamp;

pub const DAYS_PER_YEAR: i64 = 365;

/// Decimal places kept by every derived rate
pub const RATE_DECIMALS: u32 = 8;

/// Instrument family encoded in the first character of an upstream symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// `t` prefix, e.g. `tBTCUSD`
    Trading,
    /// `f` prefix, e.g. `fUSD`
    Funding,
}

impl SymbolKind {
    pub const fn prefix(self) -> char {
        match self {
            Self::Trading => 't',
            Self::Funding => 'f',
        }
    }

    /// Classify an upstream symbol by its prefix
    pub fn of(symbol: &str) -> Option<Self> {
        match symbol.chars().next() {
            Some('t') => Some(Self::Trading),
            Some('f') => Some(Self::Funding),
            _ => None,
        }
    }

    /// Build the upstream symbol for a bare pair or currency code
    pub fn symbol(self, code: &str) -> String {
        format!("{}{}", self.prefix(), code)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trading => write!(f, "trading pair"),
            Self::Funding => write!(f, "funding currency"),
        }
    }
}

/// Bare pair or currency code of an upstream symbol (`tBTCUSD` -> `BTCUSD`).
/// Symbols without a `t`/`f` prefix are returned unchanged.
pub fn strip_symbol_prefix(symbol: &str) -> &str {
    match SymbolKind::of(symbol) {
        Some(_) => &symbol[1..],
        None => symbol,
    }
}

fn validate_code(code: &str, what: &str) -> Result<(), ExchangeError> {
    let well_formed = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == ':');

    if well_formed {
        Ok(())
    } else {
        Err(ExchangeError::InvalidParameters(format!(
            "Invalid {} code: {:?}",
            what, code
        )))
    }
}

/// One way of naming an instrument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Trading pair code without prefix, e.g. `BTCUSD`
    Pair(String),
    /// Funding currency code without prefix, e.g. `USD`
    Currency(String),
    /// Full upstream symbol, e.g. `tBTCUSD` or `fUSD`
    Symbol(String),
}

impl Instrument {
    pub fn pair(code: impl Into<String>) -> Self {
        Self::Pair(code.into())
    }

    pub fn currency(code: impl Into<String>) -> Self {
        Self::Currency(code.into())
    }

    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::Symbol(symbol.into())
    }

    /// Validate the instrument and build its upstream symbol
    pub fn resolve(&self) -> Result<(SymbolKind, String), ExchangeError> {
        match self {
            Self::Pair(code) => {
                validate_code(code, "pair")?;
                Ok((SymbolKind::Trading, SymbolKind::Trading.symbol(code)))
            }
            Self::Currency(code) => {
                validate_code(code, "currency")?;
                Ok((SymbolKind::Funding, SymbolKind::Funding.symbol(code)))
            }
            Self::Symbol(symbol) => {
                let kind = SymbolKind::of(symbol).ok_or_else(|| {
                    ExchangeError::InvalidParameters(format!(
                        "Symbol {:?} must start with 't' or 'f'",
                        symbol
                    ))
                })?;
                validate_code(strip_symbol_prefix(symbol), "symbol")?;
                Ok((kind, symbol.clone()))
            }
        }
    }

    /// Resolve, rejecting instrument kinds the endpoint does not serve
    pub fn resolve_for(&self, allowed: &[SymbolKind]) -> Result<(SymbolKind, String), ExchangeError> {
        let (kind, symbol) = self.resolve()?;
        if allowed.contains(&kind) {
            Ok((kind, symbol))
        } else {
            Err(ExchangeError::InvalidParameters(format!(
                "{} is a {}, which this endpoint does not accept",
                symbol, kind
            )))
        }
    }
}

/// Loosely typed instrument input, as a caller might supply it in JSON.
/// Exactly one of the three selectors must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl InstrumentSelector {
    pub fn instrument(&self) -> Result<Instrument, ExchangeError> {
        match (&self.pair, &self.currency, &self.symbol) {
            (Some(pair), None, None) => Ok(Instrument::Pair(pair.clone())),
            (None, Some(currency), None) => Ok(Instrument::Currency(currency.clone())),
            (None, None, Some(symbol)) => Ok(Instrument::Symbol(symbol.clone())),
            (None, None, None) => Err(ExchangeError::InvalidParameters(
                "One of pair, currency or symbol is required".to_string(),
            )),
            _ => Err(ExchangeError::InvalidParameters(
                "Only one of pair, currency or symbol may be given".to_string(),
            )),
        }
    }

    pub fn resolve_for(&self, allowed: &[SymbolKind]) -> Result<(SymbolKind, String), ExchangeError> {
        self.instrument()?.resolve_for(allowed)
    }

    pub fn is_empty(&self) -> bool {
        self.pair.is_none() && self.currency.is_none() && self.symbol.is_none()
    }

    /// Upstream symbol for endpoints where the instrument is an optional
    /// filter. An empty selector means every instrument.
    pub fn resolve_optional_for(&self, allowed: &[SymbolKind]) -> Result<Option<String>, ExchangeError> {
        if self.is_empty() {
            return Ok(None);
        }
        self.resolve_for(allowed).map(|(_, symbol)| Some(symbol))
    }
}

impl From<Instrument> for InstrumentSelector {
    fn from(instrument: Instrument) -> Self {
        match instrument {
            Instrument::Pair(pair) => Self {
                pair: Some(pair),
                ..Self::default()
            },
            Instrument::Currency(currency) => Self {
                currency: Some(currency),
                ..Self::default()
            },
            Instrument::Symbol(symbol) => Self {
                symbol: Some(symbol),
                ..Self::default()
            },
        }
    }
}

/// Result ordering for history endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    /// Oldest first
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

impl Sort {
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Ascending => "1",
            Self::Descending => "-1",
        }
    }

    /// Numeric form used in authenticated request bodies
    pub const fn as_number(self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

fn scale_rate(rate: f64, factor: Decimal) -> Option<f64> {
    Decimal::from_f64(rate)?
        .checked_mul(factor)?
        .round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// Daily rate as a percentage: `rate × 100`
pub fn daily_percent(daily_rate: f64) -> Option<f64> {
    scale_rate(daily_rate, Decimal::ONE_HUNDRED)
}

/// Annualized daily rate as a percentage: `rate × 365 × 100`
pub fn annual_percent(daily_rate: f64) -> Option<f64> {
    scale_rate(
        daily_rate,
        Decimal::from(DAYS_PER_YEAR) * Decimal::ONE_HUNDRED,
    )
}

/// Daily rate from a rate quoted in 365ths of a day: `rate × 365`
pub fn per365_daily(rate_365ths: f64) -> Option<f64> {
    scale_rate(rate_365ths, Decimal::from(DAYS_PER_YEAR))
}

/// Yearly rate from a rate quoted in 365ths of a day: `rate × 365 × 365`
pub fn per365_annual(rate_365ths: f64) -> Option<f64> {
    scale_rate(
        rate_365ths,
        Decimal::from(DAYS_PER_YEAR * DAYS_PER_YEAR),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_prefix_is_stripped_once() {
        assert_eq!(strip_symbol_prefix("tBTCUSD"), "BTCUSD");
        assert_eq!(strip_symbol_prefix("fUSD"), "USD");
        assert_eq!(strip_symbol_prefix("tTESTBTC:TESTUSD"), "TESTBTC:TESTUSD");
        assert_eq!(strip_symbol_prefix("BTCUSD"), "BTCUSD");
        assert_eq!(strip_symbol_prefix(""), "");
    }

    #[test]
    fn test_instrument_builds_prefixed_symbol() {
        assert_eq!(
            Instrument::pair("BTCUSD").resolve().unwrap(),
            (SymbolKind::Trading, "tBTCUSD".to_string())
        );
        assert_eq!(
            Instrument::currency("USD").resolve().unwrap(),
            (SymbolKind::Funding, "fUSD".to_string())
        );
        assert_eq!(
            Instrument::symbol("fUST").resolve().unwrap(),
            (SymbolKind::Funding, "fUST".to_string())
        );
    }

    #[test]
    fn test_malformed_instruments_are_rejected() {
        assert!(Instrument::pair("").resolve().is_err());
        assert!(Instrument::pair("tBTCUSD").resolve().is_err());
        assert!(Instrument::symbol("BTCUSD").resolve().is_err());
        assert!(Instrument::symbol("t").resolve().is_err());
        assert!(Instrument::pair("BTCUSD")
            .resolve_for(&[SymbolKind::Funding])
            .is_err());
    }

    #[test]
    fn test_selector_requires_exactly_one() {
        let both = InstrumentSelector {
            pair: Some("BTCUSD".into()),
            currency: Some("USD".into()),
            symbol: None,
        };
        assert!(both.instrument().unwrap_err().is_input_validation());
        assert!(InstrumentSelector::default()
            .instrument()
            .unwrap_err()
            .is_input_validation());

        let selector = InstrumentSelector::from(Instrument::currency("USD"));
        assert_eq!(selector.instrument().unwrap(), Instrument::currency("USD"));
    }

    #[test]
    fn test_optional_selector() {
        assert_eq!(
            InstrumentSelector::default()
                .resolve_optional_for(&[SymbolKind::Trading])
                .unwrap(),
            None
        );
        assert_eq!(
            InstrumentSelector::from(Instrument::pair("ETHUSD"))
                .resolve_optional_for(&[SymbolKind::Trading])
                .unwrap()
                .as_deref(),
            Some("tETHUSD")
        );
        assert!(InstrumentSelector::from(Instrument::currency("USD"))
            .resolve_optional_for(&[SymbolKind::Trading])
            .is_err());
    }

    #[test]
    fn test_daily_rate_derivations() {
        assert_eq!(daily_percent(0.0001), Some(0.01));
        assert_eq!(annual_percent(0.0001), Some(3.65));
    }

    #[test]
    fn test_per365_rate_derivations() {
        assert_eq!(per365_daily(0.000_000_9), Some(0.000_328_5));
        assert_eq!(per365_annual(0.000_000_9), Some(0.119_902_5));
    }

    #[test]
    fn test_rate_midpoints_round_half_up() {
        // 3.65e-7 and 1.33225e-4 sit exactly between two 8-decimal values
        assert_eq!(per365_daily(0.000_000_001), Some(0.000_000_37));
        assert_eq!(per365_annual(0.000_000_001), Some(0.000_133_23));
        assert_eq!(annual_percent(0.000_000_000_01), Some(0.000_000_37));
        assert_eq!(daily_percent(-0.000_000_000_15), Some(-0.000_000_02));
    }

    #[test]
    fn test_sort_param() {
        assert_eq!(Sort::default().as_param(), "-1");
        assert_eq!(Sort::Ascending.as_param(), "1");
    }
}
