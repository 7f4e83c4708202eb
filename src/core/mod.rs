pub mod config;
pub mod errors;
pub mod kernel;
pub mod schema;
pub mod types;
