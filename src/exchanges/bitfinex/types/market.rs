//! Public market data records

use crate::core::schema::{
    positional, Expected, FromSlot, Positional, Record, SchemaError, Timestamp,
};
use crate::core::types::{
    annual_percent, daily_percent, per365_annual, per365_daily, strip_symbol_prefix,
};
use serde::Serialize;
use serde_json::Value;

positional! {
    /// `[OPERATIVE]`, `1` when the platform is up
    pub struct PlatformStatus {
        operative: bool = 0,
    }
}

positional! {
    pub struct TradingTicker {
        symbol: String = 0,
        bid: f64 = 1,
        bid_size: f64 = 2,
        ask: f64 = 3,
        ask_size: f64 = 4,
        daily_change: f64 = 5,
        daily_change_relative: f64 = 6,
        last_price: f64 = 7,
        volume: f64 = 8,
        high: f64 = 9,
        low: f64 = 10,
    }
}

impl TradingTicker {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }
}

positional! {
    /// Funding ticker. Rates are daily rates.
    pub struct FundingTicker {
        symbol: String = 0,
        frr: f64 = 1,
        bid: f64 = 2,
        bid_period: i64 = 3,
        bid_size: f64 = 4,
        ask: f64 = 5,
        ask_period: i64 = 6,
        ask_size: f64 = 7,
        daily_change: f64 = 8,
        daily_change_relative: f64 = 9,
        last_price: f64 = 10,
        volume: f64 = 11,
        high: f64 = 12,
        low: f64 = 13,
        frr_amount_available: f64 = 16,
    }
}

impl FundingTicker {
    pub fn currency(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }

    pub fn frr_daily_percent(&self) -> Option<f64> {
        self.frr.and_then(daily_percent)
    }

    pub fn frr_annual_percent(&self) -> Option<f64> {
        self.frr.and_then(annual_percent)
    }
}

/// A ticker from `/v2/tickers`. Upstream does not tag the two shapes; they
/// are told apart by slot count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Ticker {
    Trading(TradingTicker),
    Funding(FundingTicker),
}

impl Ticker {
    pub const NAME: &'static str = "Ticker";
    const LENGTHS: &'static [usize] = &[11, 17];

    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Trading(t) => t.symbol.as_deref(),
            Self::Funding(t) => t.symbol.as_deref(),
        }
    }

    pub fn last_price(&self) -> Option<f64> {
        match self {
            Self::Trading(t) => t.last_price,
            Self::Funding(t) => t.last_price,
        }
    }
}

impl FromSlot for Ticker {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        match record.expect_length(Self::LENGTHS)? {
            11 => TradingTicker::from_record(&record).map(Self::Trading),
            _ => FundingTicker::from_record(&record).map(Self::Funding),
        }
    }
}

positional! {
    /// Historical top-of-book snapshot, trading pairs only
    pub struct TickerHistory {
        symbol: String = 0,
        bid: f64 = 1,
        ask: f64 = 3,
        mts: Timestamp = 12,
    }
}

impl TickerHistory {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }
}

positional! {
    /// `[ID, MTS, AMOUNT, PRICE]`; negative amount is a sell
    pub struct TradingTrade {
        id: i64 = 0,
        mts: Timestamp = 1,
        amount: f64 = 2,
        price: f64 = 3,
    }
}

positional! {
    /// `[ID, MTS, AMOUNT, RATE, PERIOD]`
    pub struct FundingTrade {
        id: i64 = 0,
        mts: Timestamp = 1,
        amount: f64 = 2,
        rate: f64 = 3,
        period: i64 = 4,
    }
}

impl FundingTrade {
    pub fn daily_percent(&self) -> Option<f64> {
        self.rate.and_then(daily_percent)
    }

    pub fn annual_percent(&self) -> Option<f64> {
        self.rate.and_then(annual_percent)
    }
}

/// A public trade, told apart by slot count (4 for pairs, 5 for funding)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PublicTrade {
    Trading(TradingTrade),
    Funding(FundingTrade),
}

impl PublicTrade {
    pub const NAME: &'static str = "PublicTrade";
    const LENGTHS: &'static [usize] = &[4, 5];

    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Trading(t) => t.amount,
            Self::Funding(t) => t.amount,
        }
    }

    pub fn is_buy(&self) -> Option<bool> {
        self.amount().map(|amount| amount > 0.0)
    }
}

impl FromSlot for PublicTrade {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        match record.expect_length(Self::LENGTHS)? {
            4 => TradingTrade::from_record(&record).map(Self::Trading),
            _ => FundingTrade::from_record(&record).map(Self::Funding),
        }
    }
}

positional! {
    pub struct PairBookEntry {
        price: f64 = 0,
        count: i64 = 1,
        amount: f64 = 2,
    }
}

positional! {
    pub struct FundingBookEntry {
        rate: f64 = 0,
        period: i64 = 1,
        count: i64 = 2,
        amount: f64 = 3,
    }
}

positional! {
    pub struct RawPairBookEntry {
        order_id: i64 = 0,
        price: f64 = 1,
        amount: f64 = 2,
    }
}

positional! {
    pub struct RawFundingBookEntry {
        offer_id: i64 = 0,
        period: i64 = 1,
        rate: f64 = 2,
        amount: f64 = 3,
    }
}

/// One order book level. Aggregated and raw books share slot counts, so the
/// requested precision picks the family and the slot count picks pair or
/// funding within it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookEntry {
    Pair(PairBookEntry),
    Funding(FundingBookEntry),
    RawPair(RawPairBookEntry),
    RawFunding(RawFundingBookEntry),
}

impl BookEntry {
    pub const NAME: &'static str = "BookEntry";
    const LENGTHS: &'static [usize] = &[3, 4];

    pub fn decode(value: &Value, raw_book: bool) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        let len = record.expect_length(Self::LENGTHS)?;
        match (raw_book, len) {
            (false, 3) => PairBookEntry::from_record(&record).map(Self::Pair),
            (false, _) => FundingBookEntry::from_record(&record).map(Self::Funding),
            (true, 3) => RawPairBookEntry::from_record(&record).map(Self::RawPair),
            (true, _) => RawFundingBookEntry::from_record(&record).map(Self::RawFunding),
        }
    }

    /// Signed size. Positive is a bid on pair books and a lending offer on funding books.
    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Pair(e) => e.amount,
            Self::Funding(e) => e.amount,
            Self::RawPair(e) => e.amount,
            Self::RawFunding(e) => e.amount,
        }
    }
}

pub fn decode_book(raw: &Value, raw_book: bool) -> Result<Vec<BookEntry>, SchemaError> {
    let items = raw
        .as_array()
        .ok_or_else(|| SchemaError::new(Expected::Array, raw))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| BookEntry::decode(item, raw_book).map_err(|e| e.index(i)))
        .collect()
}

positional! {
    pub struct Candle {
        mts: Timestamp = 0,
        open: f64 = 1,
        close: f64 = 2,
        high: f64 = 3,
        low: f64 = 4,
        volume: f64 = 5,
    }
}

positional! {
    pub struct StatValue {
        mts: Timestamp = 0,
        value: f64 = 1,
    }
}

positional! {
    /// Derivative status, keyed like `tBTCF0:USTF0`
    pub struct DerivativeStatus {
        key: String = 0,
        mts: Timestamp = 1,
        deriv_price: f64 = 3,
        spot_price: f64 = 4,
        insurance_fund_balance: f64 = 6,
        next_funding_at: Timestamp = 8,
        next_funding_accrued: f64 = 9,
        next_funding_step: i64 = 10,
        current_funding: f64 = 12,
        mark_price: f64 = 15,
        open_interest: f64 = 18,
        clamp_min: f64 = 22,
        clamp_max: f64 = 23,
    }
}

impl DerivativeStatus {
    pub fn pair(&self) -> Option<&str> {
        self.key.as_deref().map(strip_symbol_prefix)
    }
}

positional! {
    /// Inner record of a liquidation entry, starting with the `"pos"` marker
    pub struct Liquidation {
        position_id: i64 = 1,
        mts: Timestamp = 2,
        symbol: String = 4,
        amount: f64 = 5,
        base_price: f64 = 6,
        is_match: bool = 8,
        is_market_sold: bool = 9,
        price_acquired: f64 = 11,
    }
}

impl Liquidation {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }
}

/// Liquidations arrive as `[[["pos", ...]], ...]`: each entry wraps its
/// record in a one-element array.
pub fn decode_liquidations(raw: &Value) -> Result<Vec<Liquidation>, SchemaError> {
    let entries = raw
        .as_array()
        .ok_or_else(|| SchemaError::new(Expected::Array, raw))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| decode_liquidation_entry(entry).map_err(|e| e.index(i)))
        .collect()
}

fn decode_liquidation_entry(entry: &Value) -> Result<Liquidation, SchemaError> {
    let outer = Record::new(entry)?;
    let record = Record::new(outer.slot(0)).map_err(|e| e.index(0))?;
    record.expect_literal(0, "pos").map_err(|e| e.index(0))?;
    Liquidation::from_record(&record).map_err(|e| e.index(0))
}

positional! {
    pub struct LeaderboardEntry {
        mts: Timestamp = 0,
        username: String = 2,
        ranking: i64 = 3,
        value: f64 = 6,
        twitter_handle: String = 9,
    }
}

positional! {
    /// Funding statistics. `frr` is quoted in 365ths of a day.
    pub struct FundingStat {
        mts: Timestamp = 0,
        frr: f64 = 3,
        avg_period: f64 = 4,
        funding_amount: f64 = 7,
        funding_amount_used: f64 = 8,
        funding_below_threshold: f64 = 11,
    }
}

impl FundingStat {
    pub fn frr_daily(&self) -> Option<f64> {
        self.frr.and_then(per365_daily)
    }

    pub fn frr_annual(&self) -> Option<f64> {
        self.frr.and_then(per365_annual)
    }
}

positional! {
    /// Average execution price (pairs) or rate (funding) for a given amount
    pub struct AveragePrice {
        average: f64 = 0,
        amount: f64 = 1,
    }
}

positional! {
    pub struct FxRate {
        rate: f64 = 0,
    }
}

positional! {
    pub struct GeoLocation {
        range_start: i64 = 0,
        range_end: i64 = 1,
        country: String = 2,
        region: String = 3,
        eu: bool = 4,
        timezone: String = 5,
        city: String = 6,
        coordinates: Vec<f64> = 7,
        metro: i64 = 8,
        area: i64 = 9,
    }
}

positional! {
    /// `[IP, [LOCATION...]]`
    pub struct GeoIp {
        ip: String = 0,
        location: GeoLocation = 1,
    }
}

impl GeoLocation {
    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.as_ref().and_then(|c| c.first().copied())
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.as_ref().and_then(|c| c.get(1).copied())
    }
}
