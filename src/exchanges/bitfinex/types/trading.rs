//! Orders, positions, account trades and the notification envelope returned
//! by write endpoints.

use crate::core::schema::{positional, FromSlot, Record, SchemaError, Timestamp};
use crate::core::types::strip_symbol_prefix;
use serde::Serialize;
use serde_json::Value;

positional! {
    pub struct Order {
        id: i64 = 0,
        gid: i64 = 1,
        cid: i64 = 2,
        symbol: String = 3,
        created_at: Timestamp = 4,
        updated_at: Timestamp = 5,
        /// Remaining amount; negative for sells
        amount: f64 = 6,
        amount_orig: f64 = 7,
        order_type: String = 8,
        type_prev: String = 9,
        tif_at: Timestamp = 10,
        flags: Value = 12,
        status: String = 13,
        price: f64 = 16,
        price_avg: f64 = 17,
        price_trailing: f64 = 18,
        price_aux_limit: f64 = 19,
        notify: bool = 23,
        hidden: bool = 24,
        placed_id: i64 = 25,
        routing: String = 28,
        meta: Value = 31,
    }
}

impl Order {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }

    pub fn is_buy(&self) -> Option<bool> {
        self.amount_orig.or(self.amount).map(|amount| amount > 0.0)
    }

    /// Filled amount, from the original and remaining amounts
    pub fn filled(&self) -> Option<f64> {
        Some(self.amount_orig? - self.amount?)
    }
}

positional! {
    pub struct Position {
        symbol: String = 0,
        status: String = 1,
        amount: f64 = 2,
        base_price: f64 = 3,
        margin_funding: f64 = 4,
        margin_funding_type: i64 = 5,
        pl: f64 = 6,
        pl_perc: f64 = 7,
        price_liq: f64 = 8,
        leverage: f64 = 9,
        position_id: i64 = 11,
        created_at: Timestamp = 12,
        updated_at: Timestamp = 13,
        position_type: i64 = 15,
        collateral: f64 = 17,
        collateral_min: f64 = 18,
        meta: Value = 19,
    }
}

impl Position {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }

    pub fn is_long(&self) -> Option<bool> {
        self.amount.map(|amount| amount > 0.0)
    }
}

positional! {
    /// An execution on the account
    pub struct UserTrade {
        id: i64 = 0,
        symbol: String = 1,
        mts: Timestamp = 2,
        order_id: i64 = 3,
        exec_amount: f64 = 4,
        exec_price: f64 = 5,
        order_type: String = 6,
        order_price: f64 = 7,
        /// `1` for maker, `-1` for taker
        maker: i64 = 8,
        fee: f64 = 9,
        fee_currency: String = 10,
        cid: i64 = 11,
    }
}

impl UserTrade {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }

    pub fn is_maker(&self) -> Option<bool> {
        self.maker.map(|maker| maker == 1)
    }
}

/// `[MTS, TYPE, MESSAGE_ID, _, DATA, CODE, STATUS, TEXT]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification<T> {
    pub mts: Option<Timestamp>,
    pub notification_type: Option<String>,
    pub message_id: Option<i64>,
    pub data: Option<T>,
    pub code: Option<i64>,
    pub status: Option<String>,
    pub text: Option<String>,
}

impl<T> Notification<T> {
    pub const NAME: &'static str = "Notification";

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("SUCCESS")
    }
}

impl<T: FromSlot> FromSlot for Notification<T> {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        Ok(Self {
            mts: record.field(0, "mts")?,
            notification_type: record.field(1, "notification_type")?,
            message_id: record.field(2, "message_id")?,
            data: record.field(4, "data")?,
            code: record.field(5, "code")?,
            status: record.field(6, "status")?,
            text: record.field(7, "text")?,
        })
    }
}
