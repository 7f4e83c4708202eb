//! Positional record decoding
//!
//! Most upstream records are bare JSON arrays whose fields are identified only
//! by index. A record shape is declared once with [`positional!`], which emits
//! the struct, its constant `FIELDS` index table and the decoding impl. All
//! coercion rules live in the [`FromSlot`] impls of this module.
//!
//! Slots past the end of an array read as `null`, so fields appended upstream
//! over time decode as `None` on older payloads. A slot that is present but
//! holds the wrong primitive is a hard [`SchemaError`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type Timestamp = DateTime<Utc>;

static NULL: Value = Value::Null;

/// The kind of value a schema expected at a given path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    String,
    Number,
    Integer,
    Boolean,
    Timestamp,
    Array,
    Object,
    /// An array whose length is one of the listed values
    Length(&'static [usize]),
    /// An array of exactly this many elements, known only at runtime
    Count(usize),
    Literal(&'static str),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp in epoch milliseconds"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Length(lengths) => {
                let lengths = lengths
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(f, "array of length {}", lengths)
            }
            Self::Count(count) => write!(f, "array of {} values", count),
            Self::Literal(literal) => write!(f, "literal {:?}", literal),
        }
    }
}

/// A value did not match its declared shape.
///
/// `path` is rooted at `$` (the decoded payload) and grows as the error
/// propagates outwards, e.g. `$[2].rate` or `$.location.country`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected} at {path}, received {received}")]
pub struct SchemaError {
    pub path: String,
    pub expected: Expected,
    pub received: Value,
}

impl SchemaError {
    pub fn new(expected: Expected, received: &Value) -> Self {
        Self {
            path: "$".to_string(),
            expected,
            received: received.clone(),
        }
    }

    fn within(mut self, segment: &str) -> Self {
        self.path.insert_str(1, segment);
        self
    }

    /// Prefix the path with a named field
    pub fn field(self, name: &str) -> Self {
        self.within(&format!(".{}", name))
    }

    /// Prefix the path with an array index
    pub fn index(self, index: usize) -> Self {
        self.within(&format!("[{}]", index))
    }
}

/// Conversion of one raw slot into a typed value
pub trait FromSlot: Sized {
    fn from_slot(value: &Value) -> Result<Self, SchemaError>;
}

impl FromSlot for String {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(SchemaError::new(Expected::String, other)),
        }
    }
}

impl FromSlot for f64 {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<Self>().ok().filter(|v| v.is_finite()),
            _ => None,
        };
        parsed.ok_or_else(|| SchemaError::new(Expected::Number, value))
    }
}

impl FromSlot for i64 {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15)
                    .map(|f| f as Self)
            }),
            Value::String(s) => s.trim().parse::<Self>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| SchemaError::new(Expected::Integer, value))
    }
}

/// Upstream never sends native booleans for flags; `0` is false and any other
/// number is true (`1`, and `-1` where a field is signed).
impl FromSlot for bool {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|f| f != 0.0),
            Value::String(s) => match s.trim() {
                "0" | "false" => Some(false),
                "1" | "true" => Some(true),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| SchemaError::new(Expected::Boolean, value))
    }
}

impl FromSlot for Timestamp {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        i64::from_slot(value)
            .ok()
            .and_then(from_millis)
            .ok_or_else(|| SchemaError::new(Expected::Timestamp, value))
    }
}

/// Arbitrary JSON, for fields upstream has not pinned down
impl FromSlot for Value {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        Ok(value.clone())
    }
}

impl<T: FromSlot> FromSlot for Option<T> {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_slot(other).map(Some),
        }
    }
}

impl<T: FromSlot> FromSlot for Vec<T> {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let items = value
            .as_array()
            .ok_or_else(|| SchemaError::new(Expected::Array, value))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_slot(item).map_err(|e| e.index(i)))
            .collect()
    }
}

impl<T: FromSlot> FromSlot for BTreeMap<String, T> {
    fn from_slot(value: &Value) -> Result<Self, SchemaError> {
        let entries = value
            .as_object()
            .ok_or_else(|| SchemaError::new(Expected::Object, value))?;

        entries
            .iter()
            .map(|(k, v)| T::from_slot(v).map(|t| (k.clone(), t)).map_err(|e| e.field(k)))
            .collect()
    }
}

pub fn from_millis(millis: i64) -> Option<Timestamp> {
    Utc.timestamp_millis_opt(millis).single()
}

pub fn to_millis(timestamp: &Timestamp) -> i64 {
    timestamp.timestamp_millis()
}

/// Read-only view over one positional record
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    slots: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn new(raw: &'a Value) -> Result<Self, SchemaError> {
        raw.as_array()
            .map(|slots| Self { slots })
            .ok_or_else(|| SchemaError::new(Expected::Array, raw))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The raw slot at `index`, or `null` past the end of the record
    pub fn slot(&self, index: usize) -> &'a Value {
        self.slots.get(index).unwrap_or(&NULL)
    }

    pub fn field<T: FromSlot>(&self, index: usize, name: &str) -> Result<T, SchemaError> {
        T::from_slot(self.slot(index)).map_err(|e| e.field(name))
    }

    /// Require a literal marker string at `index` (e.g. `"pos"`, `"sym"`)
    pub fn expect_literal(&self, index: usize, literal: &'static str) -> Result<(), SchemaError> {
        match self.slot(index) {
            Value::String(s) if s == literal => Ok(()),
            other => Err(SchemaError::new(Expected::Literal(literal), other).index(index)),
        }
    }

    /// Require the record length to be one of `allowed`; used for shapes that
    /// upstream distinguishes only by slot count.
    pub fn expect_length(&self, allowed: &'static [usize]) -> Result<usize, SchemaError> {
        let len = self.len();
        if allowed.contains(&len) {
            Ok(len)
        } else {
            Err(SchemaError::new(
                Expected::Length(allowed),
                &Value::Array(self.slots.to_vec()),
            ))
        }
    }
}

/// A record shape with a fixed index table
pub trait Positional: Sized {
    const NAME: &'static str;
    /// `(field name, slot index)` for every declared field
    const FIELDS: &'static [(&'static str, usize)];

    fn from_record(record: &Record<'_>) -> Result<Self, SchemaError>;

    fn decode(raw: &Value) -> Result<Self, SchemaError> {
        Self::from_record(&Record::new(raw)?)
    }

    fn index_of(field: &str) -> Option<usize> {
        Self::FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, index)| *index)
    }
}

/// Decode an array of records, preserving upstream order. One bad element
/// fails the whole batch.
pub fn decode_batch<T: FromSlot>(raw: &Value) -> Result<Vec<T>, SchemaError> {
    Vec::<T>::from_slot(raw)
}

/// Decode a result upstream may signal as absent with `null` or `[]`
pub fn decode_nullable<T: FromSlot>(raw: &Value) -> Result<Option<T>, SchemaError> {
    match raw {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        other => T::from_slot(other).map(Some),
    }
}

/// Declare a positional record: a struct whose fields are all nullable,
/// plus its `(name, index)` table and decoder.
macro_rules! positional {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty = $index:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: Option<$ty>,
            )*
        }

        impl $crate::core::schema::Positional for $name {
            const NAME: &'static str = stringify!($name);
            const FIELDS: &'static [(&'static str, usize)] = &[
                $( (stringify!($field), $index), )*
            ];

            fn from_record(
                record: &$crate::core::schema::Record<'_>,
            ) -> Result<Self, $crate::core::schema::SchemaError> {
                Ok(Self {
                    $( $field: record.field($index, stringify!($field))?, )*
                })
            }
        }

        impl $crate::core::schema::FromSlot for $name {
            fn from_slot(
                value: &serde_json::Value,
            ) -> Result<Self, $crate::core::schema::SchemaError> {
                <Self as $crate::core::schema::Positional>::decode(value)
            }
        }
    };
}

pub(crate) use positional;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    positional! {
        struct Sample {
            id: i64 = 0,
            price: f64 = 2,
            active: bool = 3,
            at: Timestamp = 5,
        }
    }

    #[test]
    fn test_numeric_string_coerces_to_number() {
        assert_eq!(f64::from_slot(&json!("1.25")).unwrap(), 1.25);
        assert_eq!(i64::from_slot(&json!("42")).unwrap(), 42);
        assert_eq!(i64::from_slot(&json!(42.0)).unwrap(), 42);
        assert!(f64::from_slot(&json!("abc")).is_err());
        assert!(i64::from_slot(&json!(1.5)).is_err());
    }

    #[test]
    fn test_boolean_coercion() {
        assert!(!bool::from_slot(&json!(0)).unwrap());
        assert!(bool::from_slot(&json!(1)).unwrap());
        assert!(bool::from_slot(&json!(-1)).unwrap());
        assert!(bool::from_slot(&json!("1")).unwrap());
        assert!(bool::from_slot(&json!(true)).unwrap());
        let err = bool::from_slot(&json!("yes")).unwrap_err();
        assert_eq!(err.expected, Expected::Boolean);
    }

    #[test]
    fn test_timestamp_round_trip_through_millis() {
        let ts = Timestamp::from_slot(&json!(1_700_000_000_123_i64)).unwrap();
        assert_eq!(to_millis(&ts), 1_700_000_000_123);
        assert!(Timestamp::from_slot(&json!("soon")).is_err());
    }

    #[test]
    fn test_missing_trailing_slots_read_as_null() {
        let record = Sample::decode(&json!([7, null, "3.5"])).unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.price, Some(3.5));
        assert_eq!(record.active, None);
        assert_eq!(record.at, None);
    }

    #[test]
    fn test_wrong_type_reports_path_and_value() {
        let err = Sample::decode(&json!([7, null, "cheap"])).unwrap_err();
        assert_eq!(err.path, "$.price");
        assert_eq!(err.expected, Expected::Number);
        assert_eq!(err.received, json!("cheap"));
    }

    #[test]
    fn test_batch_errors_carry_element_index() {
        let err = decode_batch::<Sample>(&json!([[1], [2, null, {}]])).unwrap_err();
        assert_eq!(err.path, "$[1].price");
        assert!(decode_batch::<Sample>(&json!({"not": "an array"})).is_err());
    }

    #[test]
    fn test_fields_table_is_declared_order() {
        assert_eq!(Sample::index_of("at"), Some(5));
        assert_eq!(Sample::index_of("reserved"), None);
        assert_eq!(Sample::FIELDS.len(), 4);
    }

    #[test]
    fn test_nullable_result() {
        assert_eq!(decode_nullable::<Sample>(&json!(null)).unwrap(), None);
        assert_eq!(decode_nullable::<Sample>(&json!([])).unwrap(), None);
        assert!(decode_nullable::<Sample>(&json!([1])).unwrap().is_some());
    }

    #[test]
    fn test_expect_length_and_literal() {
        let raw = json!(["pos", 1, 2]);
        let record = Record::new(&raw).unwrap();
        assert!(record.expect_literal(0, "pos").is_ok());
        assert!(record.expect_literal(0, "sym").is_err());
        assert_eq!(record.expect_length(&[3, 4]).unwrap(), 3);
        let err = record.expect_length(&[11, 17]).unwrap_err();
        assert_eq!(err.expected.to_string(), "array of length 11 or 17");
    }
}
