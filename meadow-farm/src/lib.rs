//! # Meadow Farm
//!
//! The transaction workflow engine for the Meadow protocol: composes an
//! ordered chain of on-chain operations into a single atomic farm call,
//! threading an amount through the chain for forward and reverse
//! estimation and resolving step-to-step data dependencies through the
//! clipboard.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meadow_farm::prelude::*;
//! use meadow_core::registry;
//!
//! # async fn example(client: Arc<dyn FarmClient>) -> Result<(), FarmError> {
//! let addresses = registry::ProtocolAddresses::default();
//! let recipient = addresses.farm;
//!
//! let mut farm = FarmWorkflow::new(Arc::clone(&client), "swap");
//! farm.add(
//!   meadow_farm::presets::eth_to_mead(client, &addresses, recipient),
//!   StepOptions::default(),
//! )?;
//!
//! let eth = TokenValue::from_human("1".parse().unwrap(), 18)?;
//! let mead_out = farm.estimate(eth.clone()).await?;
//! println!("1 ETH -> {mead_out} MEAD");
//!
//! farm
//!   .execute(eth, ExecuteOptions::with_slippage("0.5".parse().unwrap()))
//!   .await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod actions;
pub mod call;
pub mod client;
pub mod clipboard;
pub mod context;
pub mod error;
pub mod prelude;
pub mod presets;
pub mod step;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod workflow;
