//! Public market data endpoints

use super::{
    currency_code, default_currency, require_nonzero, validate_period, Limits, QueryWindow,
    Timeframe,
};
use crate::core::errors::ExchangeError;
use crate::core::schema::Positional;
use crate::core::types::{Instrument, InstrumentSelector, SymbolKind};
use crate::exchanges::bitfinex::conf::{ConfigRequest, ConfigValues};
use crate::exchanges::bitfinex::endpoint::{decode_as, Endpoint, RequestSpec};
use crate::exchanges::bitfinex::types::{
    decode_book, decode_liquidations, AveragePrice, BookEntry, Candle, DerivativeStatus,
    FundingStat, FxRate, GeoIp, LeaderboardEntry, Liquidation, PlatformStatus, PublicTrade,
    StatValue, Ticker, TickerHistory,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::IpAddr;

const BOTH: &[SymbolKind] = &[SymbolKind::Trading, SymbolKind::Funding];
const TRADING: &[SymbolKind] = &[SymbolKind::Trading];
const FUNDING: &[SymbolKind] = &[SymbolKind::Funding];

/// Geolocation lookup path
pub const GEO_IP_PATH: &str = "/v2/ext/geo/ip";

fn symbols_param(selectors: &[InstrumentSelector], allowed: &[SymbolKind]) -> Result<String, ExchangeError> {
    if selectors.is_empty() {
        return Ok("ALL".to_string());
    }
    let symbols = selectors
        .iter()
        .map(|s| s.resolve_for(allowed).map(|(_, symbol)| symbol))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(symbols.join(","))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStatusRequest;

impl Endpoint for PlatformStatusRequest {
    const NAME: &'static str = "platform_status";
    type Output = PlatformStatus;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::get("/v2/platform/status"))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(PlatformStatus::NAME, raw)
    }
}

/// Ticker of one trading pair or funding currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
}

impl TickerParams {
    pub fn new(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            instrument: instrument.into(),
        }
    }
}

impl Endpoint for TickerParams {
    const NAME: &'static str = "ticker";
    /// `None` when upstream does not list the symbol
    type Output = Option<Ticker>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(BOTH)?;
        Ok(RequestSpec::get("/v2/tickers").query("symbols", symbol))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        let tickers: Vec<Ticker> = decode_as(Ticker::NAME, raw)?;
        Ok(tickers.into_iter().next())
    }
}

/// Tickers of several instruments; no instruments means all of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickersParams {
    #[serde(default)]
    pub instruments: Vec<InstrumentSelector>,
}

impl TickersParams {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of(instruments: impl IntoIterator<Item = impl Into<InstrumentSelector>>) -> Self {
        Self {
            instruments: instruments.into_iter().map(Into::into).collect(),
        }
    }
}

impl Endpoint for TickersParams {
    const NAME: &'static str = "tickers";
    type Output = Vec<Ticker>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::get("/v2/tickers").query("symbols", symbols_param(&self.instruments, BOTH)?))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Ticker::NAME, raw)
    }
}

/// Historical best bid/ask, trading pairs only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickersHistoryParams {
    #[serde(default)]
    pub instruments: Vec<InstrumentSelector>,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl TickersHistoryParams {
    pub const LIMITS: Limits = Limits::new(100, 250);
}

impl Endpoint for TickersHistoryParams {
    const NAME: &'static str = "tickers_history";
    type Output = Vec<TickerHistory>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let symbols = symbols_param(&self.instruments, TRADING)?;
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get("/v2/tickers/hist").query("symbols", symbols)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(TickerHistory::NAME, raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradesParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl TradesParams {
    pub const LIMITS: Limits = Limits::new(120, 10_000);

    pub fn new(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            instrument: instrument.into(),
            window: QueryWindow::default(),
        }
    }

    #[must_use]
    pub fn window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }
}

impl Endpoint for TradesParams {
    const NAME: &'static str = "trades";
    type Output = Vec<PublicTrade>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(BOTH)?;
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get(format!("/v2/trades/{}/hist", symbol))))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(PublicTrade::NAME, raw)
    }
}

/// Aggregation level of an order book; `R0` is the raw book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookPrecision {
    #[default]
    P0,
    P1,
    P2,
    P3,
    P4,
    R0,
}

impl BookPrecision {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::R0 => "R0",
        }
    }

    pub const fn is_raw(self) -> bool {
        matches!(self, Self::R0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(default)]
    pub precision: BookPrecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u32>,
}

impl BookParams {
    pub const DEFAULT_LEN: u32 = 25;
    pub const ALLOWED_LENS: &'static [u32] = &[1, 25, 100];

    pub fn new(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn precision(mut self, precision: BookPrecision) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub fn length(mut self, len: u32) -> Self {
        self.len = Some(len);
        self
    }
}

impl Endpoint for BookParams {
    const NAME: &'static str = "book";
    type Output = Vec<BookEntry>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(BOTH)?;
        let len = self.len.unwrap_or(Self::DEFAULT_LEN);
        if !Self::ALLOWED_LENS.contains(&len) {
            return Err(ExchangeError::InvalidParameters(format!(
                "book len must be one of {:?}, got {}",
                Self::ALLOWED_LENS,
                len
            )));
        }
        Ok(RequestSpec::get(format!("/v2/book/{}/{}", symbol, self.precision.as_str())).query("len", len))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_book(raw, self.precision.is_raw())
            .map_err(|e| ExchangeError::decode(BookEntry::NAME, raw, e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandlesParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(default)]
    pub timeframe: Timeframe,
    /// Funding period in days; required for funding currencies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl CandlesParams {
    pub const LIMITS: Limits = Limits::new(100, 10_000);

    pub fn new(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    #[must_use]
    pub fn period(mut self, period: u32) -> Self {
        self.period = Some(period);
        self
    }

    #[must_use]
    pub fn window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }

    /// Upstream candle key, e.g. `trade:1m:tBTCUSD` or `trade:1h:fUSD:p30`
    pub fn key(&self) -> Result<String, ExchangeError> {
        let (kind, symbol) = self.instrument.resolve_for(BOTH)?;
        match (kind, self.period) {
            (SymbolKind::Trading, None) => Ok(format!("trade:{}:{}", self.timeframe, symbol)),
            (SymbolKind::Trading, Some(_)) => Err(ExchangeError::InvalidParameters(
                "period only applies to funding candles".to_string(),
            )),
            (SymbolKind::Funding, Some(period)) => {
                validate_period(period)?;
                Ok(format!("trade:{}:{}:p{}", self.timeframe, symbol, period))
            }
            (SymbolKind::Funding, None) => Err(ExchangeError::InvalidParameters(
                "period is required for funding candles".to_string(),
            )),
        }
    }
}

impl Endpoint for CandlesParams {
    const NAME: &'static str = "candles";
    type Output = Vec<Candle>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let key = self.key()?;
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get(format!("/v2/candles/{}/hist", key))))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Candle::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

/// Platform statistics series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsParams {
    /// Full stats key, e.g. `pos.size:1m:tBTCUSD:long`
    pub key: String,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl StatsParams {
    pub const LIMITS: Limits = Limits::new(100, 10_000);

    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            window: QueryWindow::default(),
        }
    }

    /// Total open position size on one side of a pair
    pub fn position_size(pair: &str, side: PositionSide) -> Self {
        Self::new(format!(
            "pos.size:1m:{}:{}",
            SymbolKind::Trading.symbol(pair),
            side.as_str()
        ))
    }

    /// Active funding for a currency
    pub fn funding_size(currency: &str) -> Self {
        Self::new(format!("funding.size:1m:{}", SymbolKind::Funding.symbol(currency)))
    }

    /// Funding used in positions
    pub fn credits_size(currency: &str) -> Self {
        Self::new(format!("credits.size:1m:{}", SymbolKind::Funding.symbol(currency)))
    }

    /// Funding used in positions on one pair
    pub fn credits_size_for_pair(currency: &str, pair: &str) -> Self {
        Self::new(format!(
            "credits.size.sym:1m:{}:{}",
            SymbolKind::Funding.symbol(currency),
            SymbolKind::Trading.symbol(pair)
        ))
    }

    #[must_use]
    pub fn window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }
}

impl Endpoint for StatsParams {
    const NAME: &'static str = "stats";
    type Output = Vec<StatValue>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let well_formed = self.key.contains(':')
            && !self.key.contains('/')
            && !self.key.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(ExchangeError::InvalidParameters(format!(
                "Malformed stats key: {:?}",
                self.key
            )));
        }
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get(format!("/v2/stats1/{}/hist", self.key))))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(StatValue::NAME, raw)
    }
}

/// Derivative status; no keys means all of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeStatusParams {
    /// Upstream keys, e.g. `tBTCF0:USTF0`
    #[serde(default)]
    pub keys: Vec<String>,
}

impl Endpoint for DerivativeStatusParams {
    const NAME: &'static str = "derivative_status";
    type Output = Vec<DerivativeStatus>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        if self.keys.is_empty() {
            return Ok(RequestSpec::get("/v2/status/deriv").query("keys", "ALL"));
        }
        for key in &self.keys {
            Instrument::symbol(key.clone()).resolve_for(TRADING)?;
        }
        Ok(RequestSpec::get("/v2/status/deriv").query("keys", self.keys.join(",")))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(DerivativeStatus::NAME, raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationsParams {
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl LiquidationsParams {
    pub const LIMITS: Limits = Limits::new(100, 10_000);
}

impl Endpoint for LiquidationsParams {
    const NAME: &'static str = "liquidations";
    type Output = Vec<Liquidation>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get("/v2/liquidations/hist")))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_liquidations(raw).map_err(|e| ExchangeError::decode(Liquidation::NAME, raw, e))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKey {
    /// Unrealized profit change
    PluDiff,
    /// Unrealized profit
    Plu,
    /// Realized profit
    Plr,
    #[default]
    Vol,
}

impl LeaderboardKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PluDiff => "plu_diff",
            Self::Plu => "plu",
            Self::Plr => "plr",
            Self::Vol => "vol",
        }
    }
}

fn default_leaderboard_timeframe() -> Timeframe {
    Timeframe::OneWeek
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardParams {
    #[serde(default)]
    pub key: LeaderboardKey,
    #[serde(default = "default_leaderboard_timeframe")]
    pub timeframe: Timeframe,
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl LeaderboardParams {
    pub const LIMITS: Limits = Limits::new(125, 10_000);
    pub const TIMEFRAMES: &'static [Timeframe] =
        &[Timeframe::ThreeHours, Timeframe::OneWeek, Timeframe::OneMonth];

    pub fn new(key: LeaderboardKey, instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            key,
            timeframe: default_leaderboard_timeframe(),
            instrument: instrument.into(),
            window: QueryWindow::default(),
        }
    }

    #[must_use]
    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }
}

impl Endpoint for LeaderboardParams {
    const NAME: &'static str = "leaderboard";
    type Output = Vec<LeaderboardEntry>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        if !Self::TIMEFRAMES.contains(&self.timeframe) {
            return Err(ExchangeError::InvalidParameters(format!(
                "leaderboard timeframe must be 3h, 1W or 1M, got {}",
                self.timeframe
            )));
        }
        let (_, symbol) = self.instrument.resolve_for(TRADING)?;
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get(format!(
            "/v2/rankings/{}:{}:{}/hist",
            self.key.as_str(),
            self.timeframe,
            symbol
        ))))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(LeaderboardEntry::NAME, raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingStatsParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl FundingStatsParams {
    pub const LIMITS: Limits = Limits::new(10, 250);

    pub fn new(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            instrument: instrument.into(),
            window: QueryWindow::default(),
        }
    }
}

impl Endpoint for FundingStatsParams {
    const NAME: &'static str = "funding_stats";
    type Output = Vec<FundingStat>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(FUNDING)?;
        let window = self.window.resolve(Self::LIMITS)?;
        Ok(window.apply(RequestSpec::get(format!("/v2/funding/stats/{}/hist", symbol))))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(FundingStat::NAME, raw)
    }
}

/// Average execution price (pairs) or rate (funding) for an amount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragePriceParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    /// Positive to buy / lend, negative to sell / borrow
    pub amount: f64,
    /// Funding period in days, funding only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    /// Ignore offers with a rate above this, funding only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<f64>,
}

impl AveragePriceParams {
    pub fn new(instrument: impl Into<InstrumentSelector>, amount: f64) -> Self {
        Self {
            instrument: instrument.into(),
            amount,
            ..Self::default()
        }
    }
}

impl Endpoint for AveragePriceParams {
    const NAME: &'static str = "average_price";
    type Output = AveragePrice;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (kind, symbol) = self.instrument.resolve_for(BOTH)?;
        require_nonzero("amount", self.amount)?;

        if kind == SymbolKind::Trading && (self.period.is_some() || self.rate_limit.is_some()) {
            return Err(ExchangeError::InvalidParameters(
                "period and rate_limit only apply to funding currencies".to_string(),
            ));
        }
        if let Some(period) = self.period {
            validate_period(period)?;
        }

        Ok(RequestSpec::post("/v2/calc/trade/avg")
            .query("symbol", symbol)
            .query("amount", self.amount)
            .query_opt("period", self.period)
            .query_opt("rate_limit", self.rate_limit))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(AveragePrice::NAME, raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRateParams {
    pub ccy1: String,
    #[serde(default = "default_currency")]
    pub ccy2: String,
}

impl FxRateParams {
    pub fn new(ccy1: impl Into<String>, ccy2: impl Into<String>) -> Self {
        Self {
            ccy1: ccy1.into(),
            ccy2: ccy2.into(),
        }
    }

    /// Rate of `ccy1` in the default currency
    pub fn to_default(ccy1: impl Into<String>) -> Self {
        Self::new(ccy1, default_currency())
    }
}

impl Endpoint for FxRateParams {
    const NAME: &'static str = "fx_rate";
    type Output = FxRate;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let ccy1 = currency_code(&self.ccy1)?;
        let ccy2 = currency_code(&self.ccy2)?;
        Ok(RequestSpec::post("/v2/calc/fx").body(json!({ "ccy1": ccy1, "ccy2": ccy2 })))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(FxRate::NAME, raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigParams {
    #[serde(default)]
    pub keys: ConfigRequest,
}

impl ConfigParams {
    pub fn new(keys: impl Into<ConfigRequest>) -> Self {
        Self { keys: keys.into() }
    }
}

impl Endpoint for ConfigParams {
    const NAME: &'static str = "config";
    type Output = ConfigValues;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        self.keys.validate()?;
        Ok(RequestSpec::get(format!("/v2/conf/{}", self.keys.path_segment())))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        ConfigValues::zip(&self.keys, raw).map_err(|e| ExchangeError::decode(ConfigValues::NAME, raw, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoIpParams {
    pub ip: String,
}

impl GeoIpParams {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

impl Endpoint for GeoIpParams {
    const NAME: &'static str = "geo_ip";
    type Output = GeoIp;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let ip: IpAddr = self
            .ip
            .trim()
            .parse()
            .map_err(|_| ExchangeError::InvalidParameters(format!("Invalid IP address: {:?}", self.ip)))?;
        Ok(RequestSpec::get(GEO_IP_PATH).query("ip", ip))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(GeoIp::NAME, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_request_uses_prefixed_symbol() {
        let spec = TickerParams::new(Instrument::pair("BTCUSD")).request().unwrap();
        assert_eq!(spec.path, "/v2/tickers");
        assert_eq!(spec.query_value("symbols"), Some("tBTCUSD"));
    }

    #[test]
    fn test_tickers_default_to_all() {
        let spec = TickersParams::all().request().unwrap();
        assert_eq!(spec.query_value("symbols"), Some("ALL"));

        let spec = TickersParams::of([Instrument::pair("BTCUSD"), Instrument::currency("USD")])
            .request()
            .unwrap();
        assert_eq!(spec.query_value("symbols"), Some("tBTCUSD,fUSD"));
    }

    #[test]
    fn test_tickers_history_rejects_funding() {
        let params = TickersHistoryParams {
            instruments: vec![Instrument::currency("USD").into()],
            ..Default::default()
        };
        assert!(params.request().unwrap_err().is_input_validation());
    }

    #[test]
    fn test_trades_defaults() {
        let spec = TradesParams::new(Instrument::currency("USD")).request().unwrap();
        assert_eq!(spec.path, "/v2/trades/fUSD/hist");
        assert_eq!(spec.query_value("limit"), Some("120"));
        assert_eq!(spec.query_value("sort"), Some("-1"));
    }

    #[test]
    fn test_trades_mutual_exclusion_from_json() {
        let params: TradesParams =
            serde_json::from_value(json!({"pair": "BTCUSD", "currency": "USD"})).unwrap();
        assert!(params.request().unwrap_err().is_input_validation());
    }

    #[test]
    fn test_book_defaults_and_length_check() {
        let spec = BookParams::new(Instrument::pair("ETHUSD")).request().unwrap();
        assert_eq!(spec.path, "/v2/book/tETHUSD/P0");
        assert_eq!(spec.query_value("len"), Some("25"));

        assert!(BookParams::new(Instrument::pair("ETHUSD"))
            .length(50)
            .request()
            .is_err());
    }

    #[test]
    fn test_candle_keys() {
        let trading = CandlesParams::new(Instrument::pair("BTCUSD"));
        assert_eq!(trading.key().unwrap(), "trade:1m:tBTCUSD");

        let funding = CandlesParams::new(Instrument::currency("USD"))
            .timeframe(Timeframe::OneHour)
            .period(30);
        assert_eq!(funding.key().unwrap(), "trade:1h:fUSD:p30");

        assert!(CandlesParams::new(Instrument::currency("USD")).key().is_err());
        assert!(CandlesParams::new(Instrument::pair("BTCUSD")).period(30).key().is_err());
    }

    #[test]
    fn test_stats_key_helpers() {
        assert_eq!(
            StatsParams::position_size("BTCUSD", PositionSide::Long).key,
            "pos.size:1m:tBTCUSD:long"
        );
        assert_eq!(
            StatsParams::credits_size_for_pair("USD", "BTCUSD").key,
            "credits.size.sym:1m:fUSD:tBTCUSD"
        );
        assert!(StatsParams::new("bad key").request().is_err());
    }

    #[test]
    fn test_leaderboard_path_and_timeframes() {
        let params = LeaderboardParams::new(LeaderboardKey::PluDiff, Instrument::symbol("tGLOBAL:USD"));
        let spec = params.request().unwrap();
        assert_eq!(spec.path, "/v2/rankings/plu_diff:1W:tGLOBAL:USD/hist");

        let invalid = LeaderboardParams::new(LeaderboardKey::Vol, Instrument::pair("BTCUSD"))
            .timeframe(Timeframe::OneMinute);
        assert!(invalid.request().is_err());
    }

    #[test]
    fn test_average_price_funding_only_options() {
        let mut params = AveragePriceParams::new(Instrument::pair("BTCUSD"), 1.5);
        params.period = Some(30);
        assert!(params.request().is_err());

        let mut params = AveragePriceParams::new(Instrument::currency("USD"), 1000.0);
        params.period = Some(30);
        let spec = params.request().unwrap();
        assert_eq!(spec.query_value("symbol"), Some("fUSD"));
        assert_eq!(spec.query_value("period"), Some("30"));

        assert!(AveragePriceParams::new(Instrument::pair("BTCUSD"), 0.0)
            .request()
            .is_err());
    }

    #[test]
    fn test_fx_rate_default_currency() {
        let params: FxRateParams = serde_json::from_value(json!({"ccy1": "EUR"})).unwrap();
        let spec = params.request().unwrap();
        assert_eq!(spec.body, Some(json!({"ccy1": "EUR", "ccy2": "USD"})));
    }

    #[test]
    fn test_geo_ip_validates_address() {
        assert!(GeoIpParams::new("not-an-ip").request().is_err());
        let spec = GeoIpParams::new("8.8.8.8").request().unwrap();
        assert_eq!(spec.query_value("ip"), Some("8.8.8.8"));
    }

    #[test]
    fn test_config_keys_default_to_all() {
        let params: ConfigParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.keys, ConfigRequest::All);

        let spec = params.request().unwrap();
        assert!(spec.path.starts_with("/v2/conf/pub:map:currency:sym,"));
        assert!(spec.path.ends_with(",pub:fees"));
        assert_eq!(
            spec.path.trim_start_matches("/v2/conf/").split(',').count(),
            crate::exchanges::bitfinex::ConfigKey::ALL.len()
        );
    }
}
