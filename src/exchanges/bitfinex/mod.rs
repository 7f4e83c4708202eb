pub mod builder;
pub mod client;
pub mod conf;
pub mod endpoint;
pub mod params;
pub mod types;

pub use builder::{build_client, DEFAULT_AUTH_URL, DEFAULT_PUBLIC_URL};
pub use client::BitfinexClient;
pub use conf::{ConfigKey, ConfigRequest, ConfigValues};
pub use endpoint::{Endpoint, RequestSpec};
