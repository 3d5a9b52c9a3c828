use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use meadow_core::slippage::apply_slippage;
use meadow_core::token::{Token, TokenValue};

use crate::call::FarmCall;
use crate::client::FarmClient;
use crate::context::{RunContext, RunMode};
use crate::error::FarmError;
use crate::step::{Step, StepGenerator};

/// Swaps `token_in` for `token_out` through a constant-function well.
///
/// Forward estimation quotes the well's output for the running amount;
/// reversed estimation quotes the input required for the desired output.
/// At prepare time the minimum output is the forward quote scaled down by
/// the run's slippage tolerance.
pub struct WellSwap {
  client: Arc<dyn FarmClient>,
  well: Address,
  token_in: Token,
  token_out: Token,
  recipient: Address,
}

impl WellSwap {
  #[must_use]
  pub fn new(
    client: Arc<dyn FarmClient>,
    well: Address,
    token_in: Token,
    token_out: Token,
    recipient: Address,
  ) -> WellSwap {
    WellSwap {
      client,
      well,
      token_in,
      token_out,
      recipient,
    }
  }

  /// Builds the step. `thread` is the value handed to the next generator:
  /// the output when estimating forward, the required input when reversed.
  fn build_step(
    &self,
    amount_in: TokenValue,
    amount_out: TokenValue,
    thread: TokenValue,
  ) -> Step {
    let client = Arc::clone(&self.client);
    let well = self.well;
    let token_in = self.token_in.address;
    let token_out = self.token_out.address;
    let recipient = self.recipient;
    let out_decimals = self.token_out.decimals;
    Step::new(
      "wellSwap",
      thread,
      Box::new(move |context: &RunContext| {
        let min_out = apply_slippage(&amount_out, context.slippage()?)?;
        let call_data = client.encode_well_swap(
          well,
          token_in,
          token_out,
          amount_in.raw(),
          min_out.raw(),
          recipient,
        );
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    )
    .with_decode_result(Box::new(move |raw: &Bytes| {
      decode_amount_word(raw, out_decimals)
    }))
  }
}

#[async_trait]
impl StepGenerator for WellSwap {
  fn name(&self) -> &str {
    "wellSwap"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    context: &RunContext,
  ) -> Result<Step, FarmError> {
    if context.run_mode == RunMode::EstimateReversed {
      let desired_out = amount_in;
      let required_in = self
        .client
        .quote_swap_in(self.well, &self.token_in, &self.token_out, &desired_out)
        .await
        .map_err(|source| FarmError::Quote {
          step: self.name().to_string(),
          source,
        })?;
      Ok(self.build_step(required_in.clone(), desired_out, required_in))
    } else {
      let amount_out = self
        .client
        .quote_swap_out(self.well, &self.token_in, &self.token_out, &amount_in)
        .await
        .map_err(|source| FarmError::Quote {
          step: self.name().to_string(),
          source,
        })?;
      Ok(self.build_step(amount_in, amount_out.clone(), amount_out))
    }
  }
}

/// Reads the leading 32-byte word of return data as a raw amount.
fn decode_amount_word(
  raw: &Bytes,
  decimals: u8,
) -> Result<TokenValue, FarmError> {
  if raw.len() < 32 {
    return Err(FarmError::Build(format!(
      "return data too short to decode: {} bytes",
      raw.len()
    )));
  }
  Ok(TokenValue::new(U256::from_be_slice(&raw[..32]), decimals))
}
