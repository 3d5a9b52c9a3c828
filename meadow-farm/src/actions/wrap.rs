use std::sync::Arc;

use async_trait::async_trait;
use meadow_core::token::TokenValue;

use crate::call::{FarmCall, FarmFromMode, FarmToMode};
use crate::client::FarmClient;
use crate::context::RunContext;
use crate::error::FarmError;
use crate::step::{Step, StepGenerator};

/// Wraps the ether sent with the transaction into WETH.
pub struct WrapEth {
  client: Arc<dyn FarmClient>,
  to_mode: FarmToMode,
}

impl WrapEth {
  #[must_use]
  pub fn new(client: Arc<dyn FarmClient>, to_mode: FarmToMode) -> WrapEth {
    WrapEth { client, to_mode }
  }
}

#[async_trait]
impl StepGenerator for WrapEth {
  fn name(&self) -> &str {
    "wrapEth"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let client = Arc::clone(&self.client);
    let to_mode = self.to_mode;
    let amount = amount_in.clone();
    let step = Step::new(
      "wrapEth",
      amount_in.clone(),
      Box::new(move |_context: &RunContext| {
        let call_data = client.encode_wrap_eth(amount.raw(), to_mode);
        Ok(
          FarmCall::new(client.farm_address(), call_data)
            .with_value(amount.raw()),
        )
      }),
    )
    .with_value(amount_in.raw());
    Ok(step)
  }
}

/// Unwraps WETH back to ether.
pub struct UnwrapEth {
  client: Arc<dyn FarmClient>,
  from_mode: FarmFromMode,
}

impl UnwrapEth {
  #[must_use]
  pub fn new(client: Arc<dyn FarmClient>, from_mode: FarmFromMode) -> UnwrapEth {
    UnwrapEth { client, from_mode }
  }
}

#[async_trait]
impl StepGenerator for UnwrapEth {
  fn name(&self) -> &str {
    "unwrapEth"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let client = Arc::clone(&self.client);
    let from_mode = self.from_mode;
    let amount = amount_in.clone();
    Ok(Step::new(
      "unwrapEth",
      amount_in,
      Box::new(move |_context: &RunContext| {
        let call_data = client.encode_unwrap_eth(amount.raw(), from_mode);
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    ))
  }
}
