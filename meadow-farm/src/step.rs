//! Steps and the generators that build them.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;
use meadow_core::token::TokenValue;

use crate::call::FarmCall;
use crate::context::RunContext;
use crate::error::FarmError;

pub type PrepareFn =
  Box<dyn Fn(&RunContext) -> Result<FarmCall, FarmError> + Send + Sync>;
pub type DecodeFn =
  Box<dyn Fn(&Bytes) -> Result<String, FarmError> + Send + Sync>;
pub type DecodeResultFn =
  Box<dyn Fn(&Bytes) -> Result<TokenValue, FarmError> + Send + Sync>;

/// One realized unit of a workflow run: the estimated output plus the
/// closures needed to turn the step into an encoded call later.
///
/// Steps are created fresh by every run and never outlive it. In a reversed
/// estimate, `amount_out` carries the computed *input* required to hit the
/// desired output, since that is the value threaded to the next generator.
pub struct Step {
  pub name: String,
  pub amount_out: TokenValue,
  /// Ether this step forwards with its call.
  pub value: U256,
  prepare: PrepareFn,
  decode: Option<DecodeFn>,
  decode_result: Option<DecodeResultFn>,
}

impl Step {
  #[must_use]
  pub fn new(name: &str, amount_out: TokenValue, prepare: PrepareFn) -> Step {
    Step {
      name: name.to_string(),
      amount_out,
      value: U256::ZERO,
      prepare,
      decode: None,
      decode_result: None,
    }
  }

  #[must_use]
  pub fn with_value(mut self, value: U256) -> Step {
    self.value = value;
    self
  }

  #[must_use]
  pub fn with_decode(mut self, decode: DecodeFn) -> Step {
    self.decode = Some(decode);
    self
  }

  #[must_use]
  pub fn with_decode_result(mut self, decode: DecodeResultFn) -> Step {
    self.decode_result = Some(decode);
    self
  }

  /// Builds the step's final call. Idempotent and side-effect free; fails
  /// if required run data (e.g. slippage) is missing from the context.
  pub fn prepare(&self, context: &RunContext) -> Result<FarmCall, FarmError> {
    (self.prepare)(context)
  }

  /// Renders this step's call data back into a human-readable form, when
  /// the step carries a decoder. A diagnostic hook; most steps leave it
  /// unset.
  pub fn decode(&self, call_data: &Bytes) -> Option<Result<String, FarmError>> {
    self.decode.as_ref().map(|decode| decode(call_data))
  }

  /// Decodes this step's raw return bytes into an amount, when the step
  /// knows how.
  pub fn decode_result(
    &self,
    raw: &Bytes,
  ) -> Option<Result<TokenValue, FarmError>> {
    self.decode_result.as_ref().map(|decode| decode(raw))
  }
}

impl fmt::Debug for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Step")
      .field("name", &self.name)
      .field("amount_out", &self.amount_out)
      .field("value", &self.value)
      .finish_non_exhaustive()
  }
}

/// A unit of work that, given the running amount and the shared context,
/// produces a [`Step`].
///
/// Generators receive the amount flowing *into* them in forward modes and
/// the amount expected *out* of them in [`RunMode::EstimateReversed`], in
/// which case they must compute the required input or fail with
/// [`FarmError::UnsupportedDirection`] — a wrong reverse quote is worse
/// than a loud failure.
///
/// [`RunMode::EstimateReversed`]: crate::context::RunMode::EstimateReversed
#[async_trait]
pub trait StepGenerator: Send + Sync {
  fn name(&self) -> &str;

  async fn run(
    &self,
    amount_in: TokenValue,
    context: &RunContext,
  ) -> Result<Step, FarmError>;
}

/// Options governing how one generator participates in a workflow.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
  /// Binds the built step to a caller-chosen name for later lookup.
  pub tag: Option<String>,
  /// Build this step only for execute/static runs, not plain estimates.
  pub only_execute: bool,
  /// Leave this generator out of the run entirely.
  pub skip: bool,
}

impl StepOptions {
  #[must_use]
  pub fn tagged(tag: &str) -> StepOptions {
    StepOptions {
      tag: Some(tag.to_string()),
      ..StepOptions::default()
    }
  }
}

/// Generator input accepted by [`FarmWorkflow::add`]: a single generator or
/// an arbitrarily nested group, flattened in insertion order.
///
/// [`FarmWorkflow::add`]: crate::workflow::FarmWorkflow::add
#[derive(Clone)]
pub enum StepInput {
  Single(Arc<dyn StepGenerator>),
  Group(Vec<StepInput>),
}

impl StepInput {
  #[must_use]
  pub fn step<G: StepGenerator + 'static>(generator: G) -> StepInput {
    StepInput::Single(Arc::new(generator))
  }

  #[must_use]
  pub fn group(items: Vec<StepInput>) -> StepInput {
    StepInput::Group(items)
  }

  pub(crate) fn flatten(self, out: &mut Vec<Arc<dyn StepGenerator>>) {
    match self {
      StepInput::Single(generator) => out.push(generator),
      StepInput::Group(items) => {
        for item in items {
          item.flatten(out);
        }
      }
    }
  }
}

impl From<Vec<StepInput>> for StepInput {
  fn from(items: Vec<StepInput>) -> StepInput {
    StepInput::Group(items)
  }
}

impl From<Arc<dyn StepGenerator>> for StepInput {
  fn from(generator: Arc<dyn StepGenerator>) -> StepInput {
    StepInput::Single(generator)
  }
}
