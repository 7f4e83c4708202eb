//! Authenticated order and position endpoints

use super::{require_nonzero, require_positive, with_symbol, Limits, QueryWindow};
use crate::core::errors::ExchangeError;
use crate::core::schema::Positional;
use crate::core::types::{InstrumentSelector, SymbolKind, Timestamp};
use crate::exchanges::bitfinex::endpoint::{decode_as, Endpoint, RequestSpec};
use crate::exchanges::bitfinex::types::{Notification, Order, Position, UserTrade};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const TRADING: &[SymbolKind] = &[SymbolKind::Trading];

/// Active orders, or order history when `history` is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersParams {
    /// Optional pair filter
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    /// Only these order ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<QueryWindow>,
}

impl OrdersParams {
    pub const HISTORY_LIMITS: Limits = Limits::new(25, 2500);

    pub fn active() -> Self {
        Self::default()
    }

    pub fn history(window: QueryWindow) -> Self {
        Self {
            history: Some(window),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn instrument(mut self, instrument: impl Into<InstrumentSelector>) -> Self {
        self.instrument = instrument.into();
        self
    }

    #[must_use]
    pub fn ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = ids;
        self
    }
}

impl Endpoint for OrdersParams {
    const NAME: &'static str = "orders";
    type Output = Vec<Order>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let symbol = self.instrument.resolve_optional_for(TRADING)?;
        let base = with_symbol("/v2/auth/r/orders", symbol.as_deref());

        let (path, mut body) = match &self.history {
            Some(window) => (format!("{}/hist", base), window.resolve(Self::HISTORY_LIMITS)?.body()),
            None => (base, Map::new()),
        };
        if !self.ids.is_empty() {
            body.insert("id".to_string(), json!(self.ids));
        }
        Ok(RequestSpec::auth(path).body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Order::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionsRequest;

impl Endpoint for PositionsRequest {
    const NAME: &'static str = "positions";
    type Output = Vec<Position>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::auth("/v2/auth/r/positions"))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Position::NAME, raw)
    }
}

/// Executions on the account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTradesParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl UserTradesParams {
    pub const LIMITS: Limits = Limits::new(25, 2500);

    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn instrument(mut self, instrument: impl Into<InstrumentSelector>) -> Self {
        self.instrument = instrument.into();
        self
    }

    #[must_use]
    pub fn window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }
}

impl Endpoint for UserTradesParams {
    const NAME: &'static str = "user_trades";
    type Output = Vec<UserTrade>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let symbol = self.instrument.resolve_optional_for(TRADING)?;
        let body = self.window.resolve(Self::LIMITS)?.body();
        let path = format!("{}/hist", with_symbol("/v2/auth/r/trades", symbol.as_deref()));
        Ok(RequestSpec::auth(path).body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(UserTrade::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "LIMIT")]
    Limit,
    #[serde(rename = "MARKET")]
    Market,
    #[serde(rename = "STOP")]
    Stop,
    #[serde(rename = "STOP LIMIT")]
    StopLimit,
    #[serde(rename = "TRAILING STOP")]
    TrailingStop,
    #[serde(rename = "FOK")]
    FillOrKill,
    #[serde(rename = "IOC")]
    ImmediateOrCancel,
    #[serde(rename = "EXCHANGE LIMIT")]
    ExchangeLimit,
    #[serde(rename = "EXCHANGE MARKET")]
    ExchangeMarket,
    #[serde(rename = "EXCHANGE STOP")]
    ExchangeStop,
    #[serde(rename = "EXCHANGE STOP LIMIT")]
    ExchangeStopLimit,
    #[serde(rename = "EXCHANGE TRAILING STOP")]
    ExchangeTrailingStop,
    #[serde(rename = "EXCHANGE FOK")]
    ExchangeFillOrKill,
    #[serde(rename = "EXCHANGE IOC")]
    ExchangeImmediateOrCancel,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
            Self::Stop => "STOP",
            Self::StopLimit => "STOP LIMIT",
            Self::TrailingStop => "TRAILING STOP",
            Self::FillOrKill => "FOK",
            Self::ImmediateOrCancel => "IOC",
            Self::ExchangeLimit => "EXCHANGE LIMIT",
            Self::ExchangeMarket => "EXCHANGE MARKET",
            Self::ExchangeStop => "EXCHANGE STOP",
            Self::ExchangeStopLimit => "EXCHANGE STOP LIMIT",
            Self::ExchangeTrailingStop => "EXCHANGE TRAILING STOP",
            Self::ExchangeFillOrKill => "EXCHANGE FOK",
            Self::ExchangeImmediateOrCancel => "EXCHANGE IOC",
        }
    }

    pub const fn requires_price(self) -> bool {
        !matches!(
            self,
            Self::Market | Self::ExchangeMarket | Self::TrailingStop | Self::ExchangeTrailingStop
        )
    }

    pub const fn is_trailing(self) -> bool {
        matches!(self, Self::TrailingStop | Self::ExchangeTrailingStop)
    }

    pub const fn is_stop_limit(self) -> bool {
        matches!(self, Self::StopLimit | Self::ExchangeStopLimit)
    }
}

/// Upstream's `tif` format
const TIF_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOrderParams {
    pub order_type: OrderType,
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    /// Positive to buy, negative to sell
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_trailing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_aux_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
    /// Leverage for derivative pairs, 1 to 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lev: Option<u32>,
    /// Auto-cancel time
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub tif: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl SubmitOrderParams {
    pub fn new(order_type: OrderType, instrument: impl Into<InstrumentSelector>, amount: f64) -> Self {
        Self {
            order_type,
            instrument: instrument.into(),
            amount,
            price: None,
            price_trailing: None,
            price_aux_limit: None,
            cid: None,
            gid: None,
            flags: None,
            lev: None,
            tif: None,
            meta: None,
        }
    }

    pub fn limit(instrument: impl Into<InstrumentSelector>, amount: f64, price: f64) -> Self {
        Self::new(OrderType::ExchangeLimit, instrument, amount).price(price)
    }

    pub fn market(instrument: impl Into<InstrumentSelector>, amount: f64) -> Self {
        Self::new(OrderType::ExchangeMarket, instrument, amount)
    }

    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn cid(mut self, cid: i64) -> Self {
        self.cid = Some(cid);
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: i64) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Set `meta.aff_code` unless the caller already set one
    #[must_use]
    pub fn with_affiliate_code(mut self, code: &str) -> Self {
        self.meta
            .get_or_insert_with(Map::new)
            .entry("aff_code")
            .or_insert_with(|| json!(code));
        self
    }

    fn validate(&self) -> Result<String, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(TRADING)?;
        require_nonzero("amount", self.amount)?;

        match self.price {
            Some(price) => require_positive("price", price)?,
            None if self.order_type.requires_price() => {
                return Err(ExchangeError::InvalidParameters(format!(
                    "{} orders require a price",
                    self.order_type.as_str()
                )))
            }
            None => {}
        }

        if self.order_type.is_trailing() {
            let trailing = self.price_trailing.ok_or_else(|| {
                ExchangeError::InvalidParameters("Trailing stop orders require price_trailing".to_string())
            })?;
            require_positive("price_trailing", trailing)?;
        }
        if self.order_type.is_stop_limit() {
            let aux = self.price_aux_limit.ok_or_else(|| {
                ExchangeError::InvalidParameters("Stop limit orders require price_aux_limit".to_string())
            })?;
            require_positive("price_aux_limit", aux)?;
        }
        if let Some(lev) = self.lev {
            if !(1..=100).contains(&lev) {
                return Err(ExchangeError::InvalidParameters(format!(
                    "lev must be between 1 and 100, got {}",
                    lev
                )));
            }
        }

        Ok(symbol)
    }
}

impl Endpoint for SubmitOrderParams {
    const NAME: &'static str = "submit_order";
    type Output = Notification<Vec<Order>>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let symbol = self.validate()?;

        // Upstream takes decimal amounts and prices as strings
        let mut body = Map::new();
        body.insert("type".to_string(), json!(self.order_type.as_str()));
        body.insert("symbol".to_string(), json!(symbol));
        body.insert("amount".to_string(), json!(self.amount.to_string()));
        if let Some(price) = self.price {
            body.insert("price".to_string(), json!(price.to_string()));
        }
        if let Some(trailing) = self.price_trailing {
            body.insert("price_trailing".to_string(), json!(trailing.to_string()));
        }
        if let Some(aux) = self.price_aux_limit {
            body.insert("price_aux_limit".to_string(), json!(aux.to_string()));
        }
        if let Some(cid) = self.cid {
            body.insert("cid".to_string(), json!(cid));
        }
        if let Some(gid) = self.gid {
            body.insert("gid".to_string(), json!(gid));
        }
        if let Some(flags) = self.flags {
            body.insert("flags".to_string(), json!(flags));
        }
        if let Some(lev) = self.lev {
            body.insert("lev".to_string(), json!(lev));
        }
        if let Some(tif) = &self.tif {
            body.insert("tif".to_string(), json!(tif.format(TIF_FORMAT).to_string()));
        }
        if let Some(meta) = &self.meta {
            body.insert("meta".to_string(), Value::Object(meta.clone()));
        }

        Ok(RequestSpec::auth("/v2/auth/w/order/submit").body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Notification::<Vec<Order>>::NAME, raw)
    }
}

/// Cancel by order id, or by client id plus the UTC date it was placed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid_date: Option<NaiveDate>,
}

impl CancelOrderParams {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_cid(cid: i64, cid_date: NaiveDate) -> Self {
        Self {
            cid: Some(cid),
            cid_date: Some(cid_date),
            ..Self::default()
        }
    }
}

impl Endpoint for CancelOrderParams {
    const NAME: &'static str = "cancel_order";
    type Output = Notification<Order>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let body = match (self.id, self.cid, self.cid_date) {
            (Some(id), None, None) => json!({ "id": id }),
            (None, Some(cid), Some(date)) => json!({
                "cid": cid,
                "cid_date": date.format("%Y-%m-%d").to_string(),
            }),
            (None, Some(_), None) => {
                return Err(ExchangeError::InvalidParameters(
                    "cid requires cid_date".to_string(),
                ))
            }
            (None, None, _) => {
                return Err(ExchangeError::InvalidParameters(
                    "One of id or cid is required".to_string(),
                ))
            }
            (Some(_), _, _) => {
                return Err(ExchangeError::InvalidParameters(
                    "Only one of id or cid may be given".to_string(),
                ))
            }
        };
        Ok(RequestSpec::auth("/v2/auth/w/order/cancel").body(body))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Notification::<Order>::NAME, raw)
    }
}
