//! Decoded record shapes

pub mod account;
pub mod funding;
pub mod market;
pub mod trading;

pub use account::*;
pub use funding::*;
pub use market::*;
pub use trading::*;
