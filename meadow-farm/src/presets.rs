//! Preset step sequences for common routes. Each preset expands into a
//! group of generators that flattens into the workflow in order.

use std::sync::Arc;

use alloy_primitives::Address;
use meadow_core::registry::{self, ProtocolAddresses};

use crate::actions::{UnwrapEth, WellSwap, WrapEth};
use crate::call::{FarmFromMode, FarmToMode};
use crate::client::FarmClient;
use crate::step::StepInput;

/// Ether in, MEAD out: wrap, then swap through the MEAD:WETH well.
#[must_use]
pub fn eth_to_mead(
  client: Arc<dyn FarmClient>,
  addresses: &ProtocolAddresses,
  recipient: Address,
) -> StepInput {
  StepInput::group(vec![
    StepInput::step(WrapEth::new(Arc::clone(&client), FarmToMode::Internal)),
    StepInput::step(WellSwap::new(
      client,
      addresses.mead_weth_well,
      registry::weth(),
      registry::mead().token,
      recipient,
    )),
  ])
}

/// MEAD in, ether out: swap through the well, then unwrap.
#[must_use]
pub fn mead_to_eth(
  client: Arc<dyn FarmClient>,
  addresses: &ProtocolAddresses,
  recipient: Address,
) -> StepInput {
  StepInput::group(vec![
    StepInput::step(WellSwap::new(
      Arc::clone(&client),
      addresses.mead_weth_well,
      registry::mead().token,
      registry::weth(),
      recipient,
    )),
    StepInput::step(UnwrapEth::new(client, FarmFromMode::Internal)),
  ])
}
