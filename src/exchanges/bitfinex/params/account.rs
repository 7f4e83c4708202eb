//! Authenticated account endpoints

use super::{currency_code, with_symbol, Limits, QueryWindow};
use crate::core::errors::ExchangeError;
use crate::core::schema::Positional;
use crate::core::types::{InstrumentSelector, SymbolKind};
use crate::exchanges::bitfinex::endpoint::{decode_as, Endpoint, RequestSpec};
use crate::exchanges::bitfinex::types::{
    BaseMarginInfo, KeyPermissions, LedgerEntry, MarginInfo, Movement, SymbolMarginInfo, UserInfo,
    Wallet,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletsRequest;

impl Endpoint for WalletsRequest {
    const NAME: &'static str = "wallets";
    type Output = Vec<Wallet>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::auth("/v2/auth/r/wallets"))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Wallet::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoRequest;

impl Endpoint for UserInfoRequest {
    const NAME: &'static str = "user_info";
    type Output = UserInfo;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::auth("/v2/auth/r/info/user"))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(UserInfo::NAME, raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPermissionsRequest;

impl Endpoint for KeyPermissionsRequest {
    const NAME: &'static str = "key_permissions";
    type Output = KeyPermissions;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        Ok(RequestSpec::auth("/v2/auth/r/permissions"))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(KeyPermissions::NAME, raw)
    }
}

/// Ledger history, optionally narrowed to one currency and category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgersParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Upstream ledger category code, e.g. `28` for margin funding payments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl LedgersParams {
    pub const LIMITS: Limits = Limits::new(25, 2500);

    pub fn currency(currency: impl Into<String>) -> Self {
        Self {
            currency: Some(currency.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category(mut self, category: i64) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }
}

impl Endpoint for LedgersParams {
    const NAME: &'static str = "ledgers";
    type Output = Vec<LedgerEntry>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let currency = self.currency.as_deref().map(currency_code).transpose()?;
        let mut body = self.window.resolve(Self::LIMITS)?.body();
        if let Some(category) = self.category {
            body.insert("category".to_string(), json!(category));
        }
        let path = format!("{}/hist", with_symbol("/v2/auth/r/ledgers", currency));
        Ok(RequestSpec::auth(path).body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(LedgerEntry::NAME, raw)
    }
}

/// Deposit and withdrawal history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub window: QueryWindow,
}

impl MovementsParams {
    pub const LIMITS: Limits = Limits::new(25, 250);

    pub fn currency(currency: impl Into<String>) -> Self {
        Self {
            currency: Some(currency.into()),
            ..Self::default()
        }
    }
}

impl Endpoint for MovementsParams {
    const NAME: &'static str = "movements";
    type Output = Vec<Movement>;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let currency = self.currency.as_deref().map(currency_code).transpose()?;
        let body = self.window.resolve(Self::LIMITS)?.body();
        let path = format!("{}/hist", with_symbol("/v2/auth/r/movements", currency));
        Ok(RequestSpec::auth(path).body(Value::Object(body)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        decode_as(Movement::NAME, raw)
    }
}

/// Which margin figures to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginScope {
    /// Account-wide figures
    #[default]
    Base,
    /// One trading pair
    Symbol(InstrumentSelector),
    /// Every trading pair
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginInfoParams {
    #[serde(default)]
    pub scope: MarginScope,
}

impl MarginInfoParams {
    pub fn base() -> Self {
        Self::default()
    }

    pub fn symbol(instrument: impl Into<InstrumentSelector>) -> Self {
        Self {
            scope: MarginScope::Symbol(instrument.into()),
        }
    }

    pub fn all() -> Self {
        Self {
            scope: MarginScope::All,
        }
    }
}

impl Endpoint for MarginInfoParams {
    const NAME: &'static str = "margin_info";
    type Output = MarginInfo;

    fn request(&self) -> Result<RequestSpec, ExchangeError> {
        let key = match &self.scope {
            MarginScope::Base => "base".to_string(),
            MarginScope::Symbol(selector) => selector.resolve_for(&[SymbolKind::Trading])?.1,
            MarginScope::All => "sym_all".to_string(),
        };
        Ok(RequestSpec::auth(format!("/v2/auth/r/info/margin/{}", key)))
    }

    fn decode(&self, raw: &Value) -> Result<Self::Output, ExchangeError> {
        match self.scope {
            MarginScope::Base => decode_as::<BaseMarginInfo>(MarginInfo::NAME, raw).map(MarginInfo::Base),
            MarginScope::Symbol(_) => {
                decode_as::<SymbolMarginInfo>(MarginInfo::NAME, raw).map(MarginInfo::Symbol)
            }
            MarginScope::All => decode_as::<Vec<SymbolMarginInfo>>(MarginInfo::NAME, raw)
                .map(|symbols| MarginInfo::All { symbols }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Instrument;

    #[test]
    fn test_ledgers_request() {
        let spec = LedgersParams::currency("USD").category(28).request().unwrap();
        assert!(spec.authenticated);
        assert_eq!(spec.path, "/v2/auth/r/ledgers/USD/hist");
        let body = spec.body.unwrap();
        assert_eq!(body["category"], 28);
        assert_eq!(body["limit"], 25);

        let all = LedgersParams::default().request().unwrap();
        assert_eq!(all.path, "/v2/auth/r/ledgers/hist");
    }

    #[test]
    fn test_ledgers_limit_max() {
        let params = LedgersParams::default().window(QueryWindow::new().limit(2501));
        assert!(params.request().unwrap_err().is_input_validation());
    }

    #[test]
    fn test_movements_rejects_bad_currency() {
        assert!(MovementsParams::currency("usd").request().is_err());
    }

    #[test]
    fn test_margin_scope_paths() {
        assert_eq!(MarginInfoParams::base().request().unwrap().path, "/v2/auth/r/info/margin/base");
        assert_eq!(
            MarginInfoParams::symbol(Instrument::pair("BTCUSD")).request().unwrap().path,
            "/v2/auth/r/info/margin/tBTCUSD"
        );
        assert_eq!(MarginInfoParams::all().request().unwrap().path, "/v2/auth/r/info/margin/sym_all");
        assert!(MarginInfoParams::symbol(Instrument::currency("USD")).request().is_err());
    }

    #[test]
    fn test_margin_decode_follows_scope() {
        let raw = json!([["sym", "tBTCUSD", [1, 2, 3, 4]], ["sym", "tETHUSD", [5, 6, 7, 8]]]);
        match MarginInfoParams::all().decode(&raw).unwrap() {
            MarginInfo::All { symbols } => assert_eq!(symbols[1].pair(), Some("ETHUSD")),
            other => panic!("unexpected {:?}", other),
        }

        let err = MarginInfoParams::base().decode(&raw).unwrap_err();
        assert_eq!(err.kind(), crate::core::errors::ErrorKind::SchemaValidation);
    }
}
