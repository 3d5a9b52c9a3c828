#![allow(clippy::missing_errors_doc)]
#![allow(clippy::wildcard_imports)]

pub mod crates;
pub mod error;
pub mod registry;
pub mod select;
pub mod slippage;
pub mod token;

pub use alloy_primitives::{Address, Bytes, I256, U256};
