//! Platform configuration keys served by `/v2/conf`.
//!
//! Upstream answers a comma-joined key list with a bare array of values in
//! the same order, so the values are zipped back onto the requested keys.

use crate::core::errors::ExchangeError;
use crate::core::schema::{Expected, SchemaError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

macro_rules! config_keys {
    ($( $(#[$meta:meta])* $variant:ident => $key:literal ),* $(,)?) => {
        /// Every configuration key this client knows about
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ConfigKey {
            $( $(#[$meta])* $variant, )*
        }

        impl ConfigKey {
            pub const ALL: &'static [ConfigKey] = &[ $( ConfigKey::$variant, )* ];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $( ConfigKey::$variant => $key, )*
                }
            }
        }
    };
}

config_keys! {
    CurrencySymbols => "pub:map:currency:sym",
    CurrencyLabels => "pub:map:currency:label",
    CurrencyUnits => "pub:map:currency:unit",
    /// Underlying currency of derivative tokens
    CurrencyUnderlying => "pub:map:currency:undl",
    CurrencyPools => "pub:map:currency:pool",
    CurrencyExplorers => "pub:map:currency:explorer",
    CurrencyTxFees => "pub:map:currency:tx:fee",
    CurrencySecurities => "pub:map:currency:security",
    CurrencyWithdrawalFx => "pub:map:currency:wfx",
    TxMethods => "pub:map:tx:method",
    TxMethodPools => "pub:map:tx:method:pool",
    ExchangePairs => "pub:list:pair:exchange",
    MarginPairs => "pub:list:pair:margin",
    FuturesPairs => "pub:list:pair:futures",
    SecuritiesPairs => "pub:list:pair:securities",
    Currencies => "pub:list:currency",
    MarginCurrencies => "pub:list:currency:margin",
    /// Currencies accepted as derivatives collateral
    FuturesCurrencies => "pub:list:currency:futures",
    PaperCurrencies => "pub:list:currency:paper",
    SecuritiesCurrencies => "pub:list:currency:securities",
    AccreditedSecuritiesCurrencies => "pub:list:currency:securities:accredited",
    PortfolioSecuritiesCurrencies => "pub:list:currency:securities:portfolio",
    StableCurrencies => "pub:list:currency:stable",
    ViewOnlyCurrencies => "pub:list:currency:viewonly",
    Competitions => "pub:list:competitions",
    Features => "pub:list:features",
    PairInfo => "pub:info:pair",
    FuturesPairInfo => "pub:info:pair:futures",
    TxStatus => "pub:info:tx:status",
    MarginSpec => "pub:spec:margin",
    Fees => "pub:fees",
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ExchangeError::InvalidParameters(format!("Unknown config key: {:?}", s)))
    }
}

impl Serialize for ConfigKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConfigKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which keys to fetch. Omitted means every known key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigRequest {
    /// Every key in [`ConfigKey::ALL`]
    #[default]
    All,
    One(ConfigKey),
    Many(Vec<ConfigKey>),
}

impl ConfigRequest {
    pub fn keys(&self) -> &[ConfigKey] {
        match self {
            Self::All => ConfigKey::ALL,
            Self::One(key) => std::slice::from_ref(key),
            Self::Many(keys) => keys,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.keys().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "At least one config key is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Path segment: the keys joined with commas
    pub fn path_segment(&self) -> String {
        self.keys()
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl From<ConfigKey> for ConfigRequest {
    fn from(key: ConfigKey) -> Self {
        Self::One(key)
    }
}

impl From<Vec<ConfigKey>> for ConfigRequest {
    fn from(keys: Vec<ConfigKey>) -> Self {
        Self::Many(keys)
    }
}

/// Decoded configuration. A single requested key yields its bare value;
/// otherwise values are keyed by config key in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValues {
    One(Value),
    Many(Map<String, Value>),
}

impl ConfigValues {
    pub const NAME: &'static str = "ConfigValues";

    pub fn get(&self, key: ConfigKey) -> Option<&Value> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(map) => map.get(key.as_str()),
        }
    }

    /// Zip upstream's parallel value array onto the requested keys. Only the
    /// lengths are checked; values stay untyped.
    pub fn zip(request: &ConfigRequest, raw: &Value) -> Result<Self, SchemaError> {
        let values = raw
            .as_array()
            .ok_or_else(|| SchemaError::new(Expected::Array, raw))?;
        let keys = request.keys();

        if values.len() != keys.len() {
            return Err(SchemaError::new(Expected::Count(keys.len()), raw));
        }

        if let ConfigRequest::One(_) = request {
            return Ok(Self::One(values[0].clone()));
        }

        Ok(Self::Many(
            keys.iter()
                .zip(values)
                .map(|(key, value)| (key.as_str().to_string(), value.clone()))
                .collect(),
        ))
    }
}
