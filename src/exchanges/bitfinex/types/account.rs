//! Authenticated account records: wallets, user profile, ledgers, movements,
//! key permissions and margin.

use crate::core::schema::{
    positional, Expected, FromSlot, Positional, Record, SchemaError, Timestamp,
};
use crate::core::types::strip_symbol_prefix;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

positional! {
    pub struct Wallet {
        wallet_type: String = 0,
        currency: String = 1,
        balance: f64 = 2,
        unsettled_interest: f64 = 3,
        available_balance: f64 = 4,
        last_change: String = 5,
        last_change_details: Value = 6,
    }
}

positional! {
    /// Flat part of the user info record
    pub struct UserProfile {
        id: i64 = 0,
        email: String = 1,
        username: String = 2,
        created_at: Timestamp = 3,
        timezone: String = 7,
        locale: String = 8,
        company: String = 9,
        subaccount_type: String = 12,
        ppt_enabled: bool = 21,
        merchant_enabled: bool = 22,
        competition_enabled: bool = 23,
        two_factor_modes: Vec<String> = 26,
        is_securities_master: bool = 28,
        securities_enabled: bool = 29,
        allow_disable_ctx_switch: bool = 38,
        ctx_switch_disabled: bool = 39,
        last_login_at: Timestamp = 44,
        compl_countries: Vec<String> = 49,
        compl_countries_resid: Vec<String> = 50,
        compl_account_type: String = 51,
        is_merchant_enterprise: bool = 54,
    }
}

positional! {
    /// Verification fields, read from the same flat record
    pub struct Verification {
        verified: bool = 4,
        level: i64 = 5,
        email_verified: bool = 10,
        is_securities_investor_accredited: bool = 30,
        is_securities_el_salvador: bool = 31,
        level_submitted: i64 = 47,
    }
}

positional! {
    /// Master account fields, read from the same flat record
    pub struct MasterAccount {
        created_at: Timestamp = 14,
        group_id: i64 = 15,
        master_account_id: i64 = 16,
        inherits_verification: bool = 17,
        is_group_master: bool = 18,
        group_withdraw_enabled: bool = 19,
    }
}

/// User info: one flat upstream record regrouped into nested sections
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub verification: Verification,
    pub master_account: MasterAccount,
}

impl UserInfo {
    pub const NAME: &'static str = "UserInfo";
}

impl FromSlot for UserInfo {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        Ok(Self {
            profile: UserProfile::from_record(&record)?,
            verification: Verification::from_record(&record)
                .map_err(|e| e.field("verification"))?,
            master_account: MasterAccount::from_record(&record)
                .map_err(|e| e.field("master_account"))?,
        })
    }
}

positional! {
    pub struct LedgerEntry {
        id: i64 = 0,
        currency: String = 1,
        mts: Timestamp = 3,
        amount: f64 = 5,
        balance: f64 = 6,
        description: String = 8,
    }
}

impl LedgerEntry {
    /// Wallet named at the end of the description, e.g.
    /// `"... on wallet exchange"` -> `exchange`
    pub fn wallet(&self) -> Option<&str> {
        self.description
            .as_deref()
            .and_then(|d| d.rsplit_once("on wallet "))
            .map(|(_, wallet)| wallet.trim())
            .filter(|wallet| !wallet.is_empty())
    }
}

positional! {
    /// Deposit or withdrawal
    pub struct Movement {
        id: i64 = 0,
        currency: String = 1,
        currency_name: String = 2,
        started_at: Timestamp = 5,
        updated_at: Timestamp = 6,
        status: String = 9,
        amount: f64 = 12,
        fees: f64 = 13,
        destination_address: String = 16,
        transaction_id: String = 20,
        note: String = 21,
    }
}

impl Movement {
    pub fn is_deposit(&self) -> Option<bool> {
        self.amount.map(|amount| amount > 0.0)
    }
}

positional! {
    /// `[SCOPE, READ, WRITE]`
    pub struct PermissionEntry {
        scope: String = 0,
        read: bool = 1,
        write: bool = 2,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub read: Option<bool>,
    pub write: Option<bool>,
}

/// API key permissions keyed by scope (`account`, `orders`, `wallets`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KeyPermissions(pub BTreeMap<String, Permission>);

impl KeyPermissions {
    pub const NAME: &'static str = "KeyPermissions";

    pub fn get(&self, scope: &str) -> Option<&Permission> {
        self.0.get(scope)
    }

    pub fn can_read(&self, scope: &str) -> bool {
        self.get(scope).and_then(|p| p.read).unwrap_or(false)
    }

    pub fn can_write(&self, scope: &str) -> bool {
        self.get(scope).and_then(|p| p.write).unwrap_or(false)
    }
}

impl FromSlot for KeyPermissions {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let entries = Vec::<PermissionEntry>::from_slot(value)?;
        let mut map = BTreeMap::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let scope = entry.scope.ok_or_else(|| {
                SchemaError::new(Expected::String, &Value::Null)
                    .field("scope")
                    .index(i)
            })?;
            map.insert(
                scope,
                Permission {
                    read: entry.read,
                    write: entry.write,
                },
            );
        }
        Ok(Self(map))
    }
}

positional! {
    pub struct BaseMarginValues {
        user_pl: f64 = 0,
        user_swaps: f64 = 1,
        margin_balance: f64 = 2,
        margin_net: f64 = 3,
        margin_min: f64 = 4,
    }
}

positional! {
    pub struct SymbolMarginValues {
        tradable_balance: f64 = 0,
        gross_balance: f64 = 1,
        buy: f64 = 2,
        sell: f64 = 3,
    }
}

/// `["base", [USER_PL, USER_SWAPS, MARGIN_BALANCE, MARGIN_NET, MARGIN_MIN]]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseMarginInfo {
    pub values: Option<BaseMarginValues>,
}

impl FromSlot for BaseMarginInfo {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        record.expect_literal(0, "base")?;
        Ok(Self {
            values: record.field(1, "values")?,
        })
    }
}

/// `["sym", SYMBOL, [TRADABLE_BALANCE, GROSS_BALANCE, BUY, SELL]]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMarginInfo {
    pub symbol: Option<String>,
    pub values: Option<SymbolMarginValues>,
}

impl SymbolMarginInfo {
    pub fn pair(&self) -> Option<&str> {
        self.symbol.as_deref().map(strip_symbol_prefix)
    }
}

impl FromSlot for SymbolMarginInfo {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let record = Record::new(value)?;
        record.expect_literal(0, "sym")?;
        Ok(Self {
            symbol: record.field(1, "symbol")?,
            values: record.field(2, "values")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MarginInfo {
    Base(BaseMarginInfo),
    Symbol(SymbolMarginInfo),
    All { symbols: Vec<SymbolMarginInfo> },
}

impl MarginInfo {
    pub const NAME: &'static str = "MarginInfo";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_info_payload() -> Value {
        let mut slots = vec![Value::Null; 55];
        slots[0] = json!(123);
        slots[1] = json!("trader@example.com");
        slots[2] = json!("trader");
        slots[3] = json!(1_600_000_000_000_i64);
        slots[4] = json!(1);
        slots[5] = json!(2);
        slots[7] = json!("Europe/Zurich");
        slots[14] = json!(1_500_000_000_000_i64);
        slots[16] = json!(99);
        slots[26] = json!(["u2f", "otp"]);
        slots[44] = json!(1_700_000_000_000_i64);
        Value::Array(slots)
    }

    #[test]
    fn test_user_info_groups_nested_sections() {
        let info = UserInfo::from_slot(&user_info_payload()).unwrap();
        assert_eq!(info.profile.id, Some(123));
        assert_eq!(info.profile.two_factor_modes.as_ref().map(Vec::len), Some(2));
        assert_eq!(info.verification.verified, Some(true));
        assert_eq!(info.verification.level, Some(2));
        assert_eq!(info.master_account.master_account_id, Some(99));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["email"], "trader@example.com");
        assert_eq!(json["verification"]["level"], 2);
        assert_eq!(json["master_account"]["master_account_id"], 99);
    }

    #[test]
    fn test_user_info_nested_error_path() {
        let mut payload = user_info_payload();
        payload[5] = json!("gold");
        let err = UserInfo::from_slot(&payload).unwrap_err();
        assert_eq!(err.path, "$.verification.level");
        assert_eq!(err.expected, Expected::Integer);
    }

    #[test]
    fn test_ledger_wallet_from_description() {
        let entry = LedgerEntry::decode(&json!([
            2_531_822_314_i64, "USD", null, 1_573_521_810_000_i64, null, 0.01644445,
            0.01644445, null, "Margin Funding Payment on wallet funding"
        ]))
        .unwrap();
        assert_eq!(entry.wallet(), Some("funding"));

        let bare = LedgerEntry::decode(&json!([1, "USD", null, null, null, 1, 1, null, "Deposit"])).unwrap();
        assert_eq!(bare.wallet(), None);
    }

    #[test]
    fn test_key_permissions_map() {
        let permissions =
            KeyPermissions::from_slot(&json!([["account", 0, 0], ["orders", 1, 0], ["wallets", 1, 1]]))
                .unwrap();
        assert!(permissions.can_read("orders"));
        assert!(!permissions.can_write("orders"));
        assert!(permissions.can_write("wallets"));
        assert!(!permissions.can_read("history"));

        let err = KeyPermissions::from_slot(&json!([["account", 0, 0], [null, 1, 1]])).unwrap_err();
        assert_eq!(err.path, "$[1].scope");
    }

    #[test]
    fn test_margin_info_shapes() {
        let base = BaseMarginInfo::from_slot(&json!(["base", [-13.01, 0, 49331.7, 49318.7, 27]])).unwrap();
        assert_eq!(base.values.unwrap().margin_min, Some(27.0));

        let sym = SymbolMarginInfo::from_slot(&json!(["sym", "tBTCUSD", [0.5, 0.6, 1.2, 1.1]])).unwrap();
        assert_eq!(sym.pair(), Some("BTCUSD"));
        assert_eq!(sym.values.unwrap().sell, Some(1.1));

        let err = SymbolMarginInfo::from_slot(&json!(["base", [1, 2, 3, 4, 5]])).unwrap_err();
        assert_eq!(err.expected, Expected::Literal("sym"));
        assert_eq!(err.path, "$[0]");
    }

    #[test]
    fn test_wallet_serializes_only_mapped_fields() {
        let wallet = Wallet::decode(&json!(["exchange", "UST", 19788.6529257, 0, 19788.6529257, null, null])).unwrap();
        let json = serde_json::to_value(&wallet).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), Wallet::FIELDS.len());
        assert_eq!(json["available_balance"], 19788.6529257);
    }

    #[test]
    fn test_movement_slots() {
        let mut slots = vec![Value::Null; 22];
        slots[0] = json!(13_105_603);
        slots[1] = json!("ETH");
        slots[2] = json!("ETHEREUM");
        slots[5] = json!(1_569_348_774_000_i64);
        slots[6] = json!(1_569_348_775_000_i64);
        slots[9] = json!("COMPLETED");
        slots[12] = json!(-0.26300954);
        slots[13] = json!(-0.00135);
        slots[16] = json!("0x8d2e...");
        slots[20] = json!("0x3ad0...");
        slots[21] = json!("cold storage");

        let movement = Movement::decode(&Value::Array(slots)).unwrap();
        assert_eq!(movement.id, Some(13_105_603));
        assert_eq!(movement.currency.as_deref(), Some("ETH"));
        assert_eq!(movement.currency_name.as_deref(), Some("ETHEREUM"));
        assert_eq!(movement.started_at.map(|t| t.timestamp_millis()), Some(1_569_348_774_000));
        assert_eq!(movement.updated_at.map(|t| t.timestamp_millis()), Some(1_569_348_775_000));
        assert_eq!(movement.status.as_deref(), Some("COMPLETED"));
        assert_eq!(movement.amount, Some(-0.26300954));
        assert_eq!(movement.fees, Some(-0.00135));
        assert_eq!(movement.destination_address.as_deref(), Some("0x8d2e..."));
        assert_eq!(movement.transaction_id.as_deref(), Some("0x3ad0..."));
        assert_eq!(movement.note.as_deref(), Some("cold storage"));
        assert_eq!(movement.is_deposit(), Some(false));

        let short = Movement::decode(&json!([13_105_603, "ETH", "ETHEREUM"])).unwrap();
        assert_eq!(short.currency_name.as_deref(), Some("ETHEREUM"));
        assert_eq!(short.started_at, None);
        assert_eq!(short.amount, None);
        assert_eq!(short.is_deposit(), None);

        let err = Movement::decode(&json!([
            1, "ETH", null, null, null, null, null, null, null, "COMPLETED", null, null, "n/a"
        ]))
        .unwrap_err();
        assert_eq!(err.path, "$.amount");
        assert_eq!(err.expected, Expected::Number);
    }
}
