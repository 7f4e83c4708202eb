//! Authenticated funding endpoints

use super::{
    currency_code, default_currency, require_nonzero, require_positive, validate_period,
    with_symbol, Limits, QueryWindow,
};
use crate::core::errors::ExchangeError;
use crate::core::schema::{decode_nullable, Positional};
use crate::core::types::{InstrumentSelector, SymbolKind};
use crate::exchanges::bitfinex::endpoint::{decode_as, Endpoint, RequestSpec};
use crate::exchanges::bitfinex::types::{
    AccountFundingTrade, AutoRenewStatus, FundingCredit, FundingInfo, FundingLoan, FundingOffer,
    Notification,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const FUNDING: &[SymbolKind] = &[SymbolKind::Funding];

/// Request for one of the funding listings that come in an active and a
/// history flavour
fn funding_listing(
    base: &str,
    instrument: &InstrumentSelector,
    history: Option<&QueryWindow>,
    limits: Limits,
) -> Result<RequestSpec, ExchangeError> {
    let symbol = instrument.resolve_optional_for(FUNDING)?;
    let base = with_symbol(base, symbol.as_deref());
    match history {
        Some(window) => {
            let body = window.resolve(limits)?.body();
            Ok(RequestSpec::auth(format!("{}/hist", base)).body(Value::Object(body)))
        }
        None => Ok(RequestSpec::auth(base)),
    }
}

macro_rules! funding_listing_params {
    ($(#[$meta:meta])* $name:ident, $call:literal, $path:literal, $record:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Optional currency filter
            #[serde(flatten)]
            pub instrument: InstrumentSelector,
            /// Set for history instead of active records
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub history: Option<QueryWindow>,
        }

        impl $name {
            pub const HISTORY_LIMITS: Limits = Limits::new(25, 500);

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
        }

        impl Endpoint for $name {
            const NAME: &'static str = $call;
            type Output = Vec<$record>;

            fn request(&self) -> Result<RequestSpec, ExchangeError> {
                funding_listing($path, &self.instrument, self.history.as_ref(), Self::HISTORY_LIMITS)
            }

            fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
                decode_as(<$record>::NAME, raw)
            }
        }
    };
}

funding_listing_params!(
    /// Funding offers on the book, or their history
    FundingOffersParams,
    "funding_offers",
    "/v2/auth/r/funding/offers",
    FundingOffer
);

funding_listing_params!(
    /// Funding not used in positions
    FundingLoansParams,
    "funding_loans",
    "/v2/auth/r/funding/loans",
    FundingLoan
);

funding_listing_params!(
    /// Funding used in positions
    FundingCreditsParams,
    "funding_credits",
    "/v2/auth/r/funding/credits",
    FundingCredit
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTradesParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl FundingTradesParams {
    pub const LIMITS: Limits = Limits::new(25, 500);
}

impl Endpoint for FundingTradesParams {
    const NAME: &'static str = "funding_trades";
    type Output = Vec<AccountFundingTrade>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let symbol = self.instrument.resolve_optional_for(FUNDING)?;
        let body = self.window.resolve(Self::LIMITS)?.body();
        let path = format!("{}/hist", with_symbol("/v2/auth/r/funding/trades", symbol.as_deref()));
        Ok(RequestSpec::auth(path).body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(AccountFundingTrade::NAME, raw)
    }
}

/// Yields and durations for one funding currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingInfoParams {
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
}

impl FundingInfoParams {
    pub fn new(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            instrument: instrument.into(),
        }
    }
}

impl Endpoint for FundingInfoParams {
    const NAME: &'static str = "funding_info";
    type Output = FundingInfo;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(FUNDING)?;
        Ok(RequestSpec::auth(format!("/v2/auth/r/info/funding/{}", symbol)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(FundingInfo::NAME, raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRenewStatusParams {
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for AutoRenewStatusParams {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

impl AutoRenewStatusParams {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl Endpoint for AutoRenewStatusParams {
    const NAME: &'static str = "auto_renew_status";
    /// `None` when auto-renew is off for the currency
    type Output = Option<AutoRenewStatus>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let currency = currency_code(&self.currency)?;
        Ok(RequestSpec::auth("/v2/auth/r/funding/auto/status").body(json!({ "currency": currency })))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_nullable(raw).map_err(|e| ExchangeError::decode(AutoRenewStatus::NAME, raw, e))
    }
}

/// Turn auto-renew on or off. When enabling, unset amount means the whole
/// balance and unset rate means FRR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAutoRenewParams {
    #[serde(default = "default_currency")]
    pub currency: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
}

impl SetAutoRenewParams {
    pub fn enable(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            enabled: true,
            amount: None,
            rate: None,
            period: None,
        }
    }

    pub fn disable(currency: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::enable(currency)
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    #[must_use]
    pub fn period(mut self, period: u32) -> Self {
        self.period = Some(period);
        self
    }
}

impl Endpoint for SetAutoRenewParams {
    const NAME: &'static str = "set_auto_renew";
    type Output = Notification<AutoRenewStatus>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let currency = currency_code(&self.currency)?;

        let mut body = Map::new();
        body.insert("status".to_string(), json!(i32::from(self.enabled)));
        body.insert("currency".to_string(), json!(currency));

        if self.enabled {
            if let Some(amount) = self.amount {
                require_positive("amount", amount)?;
                body.insert("amount".to_string(), json!(amount.to_string()));
            }
            if let Some(rate) = self.rate {
                if !rate.is_finite() || rate < 0.0 {
                    return Err(ExchangeError::InvalidParameters(format!(
                        "rate must not be negative, got {}",
                        rate
                    )));
                }
                body.insert("rate".to_string(), json!(rate.to_string()));
            }
            if let Some(period) = self.period {
                validate_period(period)?;
                body.insert("period".to_string(), json!(period));
            }
        } else if self.amount.is_some() || self.rate.is_some() || self.period.is_some() {
            return Err(ExchangeError::InvalidParameters(
                "amount, rate and period only apply when enabling auto-renew".to_string(),
            ));
        }

        Ok(RequestSpec::auth("/v2/auth/w/funding/auto").body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Notification::<AutoRenewStatus>::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundingOfferType {
    #[default]
    #[serde(rename = "LIMIT")]
    Limit,
    /// Variable rate relative to FRR
    #[serde(rename = "FRRDELTAVAR")]
    FrrDeltaVariable,
    /// Fixed rate relative to FRR
    #[serde(rename = "FRRDELTAFIX")]
    FrrDeltaFixed,
}

impl FundingOfferType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::FrrDeltaVariable => "FRRDELTAVAR",
            Self::FrrDeltaFixed => "FRRDELTAFIX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitFundingOfferParams {
    #[serde(default)]
    pub offer_type: FundingOfferType,
    #[serde(flatten)]
    pub instrument: InstrumentSelector,
    /// Positive to lend, negative to borrow
    pub amount: f64,
    /// Daily rate, or the FRR delta for FRR offers
    pub rate: f64,
    pub period: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
}

impl SubmitFundingOfferParams {
    pub fn limit(instrument: impl Into<InstrumentSelector>, amount: f64, rate: f64, period: u32) -> Self {
        Self {
            offer_type: FundingOfferType::Limit,
            instrument: instrument.into(),
            amount,
            rate,
            period,
            flags: None,
        }
    }
}

impl Endpoint for SubmitFundingOfferParams {
    const NAME: &'static str = "submit_funding_offer";
    type Output = Notification<FundingOffer>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let (_, symbol) = self.instrument.resolve_for(FUNDING)?;
        require_nonzero("amount", self.amount)?;
        validate_period(self.period)?;
        if self.offer_type == FundingOfferType::Limit {
            require_positive("rate", self.rate)?;
        }

        let mut body = Map::new();
        body.insert("type".to_string(), json!(self.offer_type.as_str()));
        body.insert("symbol".to_string(), json!(symbol));
        body.insert("amount".to_string(), json!(self.amount.to_string()));
        body.insert("rate".to_string(), json!(self.rate.to_string()));
        body.insert("period".to_string(), json!(self.period));
        if let Some(flags) = self.flags {
            body.insert("flags".to_string(), json!(flags));
        }

        Ok(RequestSpec::auth("/v2/auth/w/funding/offer/submit").body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Notification::<FundingOffer>::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelFundingOfferParams {
    pub id: i64,
}

impl Endpoint for CancelFundingOfferParams {
    const NAME: &'static str = "cancel_funding_offer";
    type Output = Notification<FundingOffer>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::auth("/v2/auth/w/funding/offer/cancel").body(json!({ "id": self.id })))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Notification::<FundingOffer>::NAME, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Instrument;

    #[test]
    fn test_funding_listing_paths() {
        assert_eq!(
            FundingOffersParams::active().request().unwrap().path,
            "/v2/auth/r/funding/offers"
        );
        let spec = FundingCreditsParams::history(QueryWindow::new().limit(500))
            .instrument(Instrument::currency("USD"))
            .request()
            .unwrap();
        assert_eq!(spec.path, "/v2/auth/r/funding/credits/fUSD/hist");
        assert_eq!(spec.body.unwrap()["limit"], 500);

        assert!(FundingLoansParams::history(QueryWindow::new().limit(501))
            .request()
            .is_err());
        assert!(FundingLoansParams::active()
            .instrument(Instrument::pair("BTCUSD"))
            .request()
            .is_err());
    }

    #[test]
    fn test_auto_renew_status_default_currency() {
        let params: AutoRenewStatusParams = serde_json::from_value(json!({})).unwrap();
        let spec = params.request().unwrap();
        assert_eq!(spec.body, Some(json!({"currency": "USD"})));
    }

    #[test]
    fn test_auto_renew_status_nullable() {
        let params = AutoRenewStatusParams::default();
        assert_eq!(params.decode(&json!(null)).unwrap(), None);
        assert_eq!(params.decode(&json!([])).unwrap(), None);
        assert!(params.decode(&json!(["USD", 2, 0.0001, 0])).unwrap().is_some());
        assert!(params.decode(&json!(["USD", "two"])).is_err());
    }

    #[test]
    fn test_set_auto_renew_body() {
        let spec = SetAutoRenewParams::enable("USD").rate(0.0002).period(30).request().unwrap();
        assert_eq!(
            spec.body,
            Some(json!({"status": 1, "currency": "USD", "rate": "0.0002", "period": 30}))
        );

        let off = SetAutoRenewParams::disable("USD").request().unwrap();
        assert_eq!(off.body, Some(json!({"status": 0, "currency": "USD"})));

        assert!(SetAutoRenewParams::disable("USD").period(30).request().is_err());
        assert!(SetAutoRenewParams::enable("USD").period(1).request().is_err());
    }

    #[test]
    fn test_submit_funding_offer() {
        let spec = SubmitFundingOfferParams::limit(Instrument::currency("USD"), 1000.0, 0.0002, 2)
            .request()
            .unwrap();
        let body = spec.body.unwrap();
        assert_eq!(body["type"], "LIMIT");
        assert_eq!(body["symbol"], "fUSD");
        assert_eq!(body["amount"], "1000");
        assert_eq!(body["period"], 2);

        assert!(SubmitFundingOfferParams::limit(Instrument::currency("USD"), 1000.0, 0.0002, 121)
            .request()
            .is_err());
    }
}
