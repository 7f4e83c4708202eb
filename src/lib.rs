//! Typed client for the Bitfinex v2 REST API.
//!
//! Upstream answers almost every call with bare positional arrays. Each
//! endpoint here pairs a validated parameter struct with a decoder that maps
//! those arrays onto named, typed records.
//!
//! ```rust,no_run
//! use bfx_rest::core::types::Instrument;
//! use bfx_rest::exchanges::bitfinex::params::TickerParams;
//! use bfx_rest::{build_client, ExchangeConfig};
//!
//! # async fn example() -> Result<(), bfx_rest::ExchangeError> {
//! let client = build_client(ExchangeConfig::read_only())?;
//! let ticker = client.ticker(&TickerParams::new(Instrument::pair("BTCUSD"))).await?;
//! println!("{:?}", ticker.and_then(|t| t.last_price()));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod exchanges;

pub use crate::core::config::ExchangeConfig;
pub use crate::core::errors::{ErrorKind, ExchangeError};
pub use crate::core::schema::{Expected, SchemaError};
pub use crate::core::types::*;
pub use crate::exchanges::bitfinex::{build_client, BitfinexClient, Endpoint};
