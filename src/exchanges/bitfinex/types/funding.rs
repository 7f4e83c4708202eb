//! Funding book records. All `rate` fields are daily rates.

use crate::core::schema::{positional, FromSlot, Record, SchemaError, Timestamp};
use crate::core::types::{annual_percent, daily_percent, strip_symbol_prefix};
use serde::Serialize;
use serde_json::Value;

positional! {
    pub struct FundingOffer {
        id: i64 = 0,
        symbol: String = 1,
        created_at: Timestamp = 2,
        updated_at: Timestamp = 3,
        amount: f64 = 4,
        amount_orig: f64 = 5,
        offer_type: String = 6,
        flags: Value = 9,
        status: String = 10,
        rate: f64 = 14,
        period: i64 = 15,
        notify: bool = 16,
        hidden: bool = 17,
        renew: bool = 19,
    }
}

positional! {
    /// Funding taken (negative side) or provided, not tied to a position
    pub struct FundingLoan {
        id: i64 = 0,
        symbol: String = 1,
        side: i64 = 2,
        created_at: Timestamp = 3,
        updated_at: Timestamp = 4,
        amount: f64 = 5,
        flags: Value = 6,
        status: String = 7,
        rate_type: String = 8,
        rate: f64 = 11,
        period: i64 = 12,
        opened_at: Timestamp = 13,
        last_payout_at: Timestamp = 14,
        notify: bool = 15,
        hidden: bool = 16,
        renew: bool = 18,
        no_close: bool = 20,
    }
}

positional! {
    /// Funding used in a margin position
    pub struct FundingCredit {
        id: i64 = 0,
        symbol: String = 1,
        side: i64 = 2,
        created_at: Timestamp = 3,
        updated_at: Timestamp = 4,
        amount: f64 = 5,
        flags: Value = 6,
        status: String = 7,
        rate_type: String = 8,
        rate: f64 = 11,
        period: i64 = 12,
        opened_at: Timestamp = 13,
        last_payout_at: Timestamp = 14,
        notify: bool = 15,
        hidden: bool = 16,
        renew: bool = 18,
        no_close: bool = 20,
        position_pair: String = 21,
    }
}

positional! {
    /// A funding execution on the account
    pub struct AccountFundingTrade {
        id: i64 = 0,
        symbol: String = 1,
        mts: Timestamp = 2,
        offer_id: i64 = 3,
        amount: f64 = 4,
        rate: f64 = 5,
        period: i64 = 6,
    }
}

// Same derived views for every record carrying a funding symbol and a daily rate
macro_rules! daily_rate_views {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                pub fn currency(&self) -> Option<&str> {
                    self.symbol.as_deref().map(strip_symbol_prefix)
                }

                pub fn daily_percent(&self) -> Option<f64> {
                    self.rate.and_then(daily_percent)
                }

                pub fn annual_percent(&self) -> Option<f64> {
                    self.rate.and_then(annual_percent)
                }
            }
        )*
    };
}

daily_rate_views!(FundingOffer, FundingLoan, FundingCredit, AccountFundingTrade);

impl FundingCredit {
    pub fn position_pair_code(&self) -> Option<&str> {
        self.position_pair.as_deref().map(strip_symbol_prefix)
    }
}

positional! {
    pub struct FundingInfoValues {
        yield_loan: f64 = 0,
        yield_lend: f64 = 1,
        duration_loan: f64 = 2,
        duration_lend: f64 = 3,
    }
}

/// `["sym", SYMBOL, [YIELD_LOAN, YIELD_LEND, DURATION_LOAN, DURATION_LEND]]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingInfo {
    pub symbol: Option<String>,
    pub values: Option<FundingInfoValues>,
}

impl FundingInfo {
    pub const NAME: &'static str = "FundingInfo";

    pub fn currency(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }
}

impl FromSlot for FundingInfo {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        record.expect_literal(0, "sym")?;
        Ok(Self {
            symbol: record.field(1, "symbol")?,
            values: record.field(2, "values")?,
        })
    }
}

positional! {
    /// Auto-renew settings for one currency
    pub struct AutoRenewStatus {
        currency: String = 0,
        period: i64 = 1,
        rate: f64 = 2,
        threshold: f64 = 3,
    }
}
