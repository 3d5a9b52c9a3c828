//! The farm workflow: an ordered chain of step generators compiled into
//! one atomic multicall.

use std::sync::Arc;

use alloy_primitives::U256;
use itertools::Itertools;
use meadow_core::token::TokenValue;
use rust_decimal::Decimal;
use tracing::debug;

use crate::call::{FarmBatch, TxHash};
use crate::client::FarmClient;
use crate::context::{RunContext, RunData, RunMode};
use crate::error::FarmError;
use crate::step::{StepGenerator, StepInput, StepOptions};

/// Options for runs that build a full transaction.
///
/// Slippage is optional at the type level because not every chain of steps
/// encodes a minimum output; a step that does need it fails its `prepare`
/// with [`FarmError::SlippageMissing`], aborting before submission.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
  /// Percent slippage tolerance applied to minimum-output encodings.
  pub slippage: Option<Decimal>,
}

impl ExecuteOptions {
  #[must_use]
  pub fn with_slippage(slippage: Decimal) -> ExecuteOptions {
    ExecuteOptions {
      slippage: Some(slippage),
    }
  }
}

/// One decoded entry of a `call_static` simulation.
#[derive(Debug)]
pub struct StepResult {
  pub name: String,
  pub raw: alloy_primitives::Bytes,
  /// Present when the step knows how to read an amount out of its return
  /// data.
  pub amount: Option<TokenValue>,
}

/// An ordered container of step generators.
///
/// Estimation threads a running amount through the chain strictly in
/// sequence; execution re-runs the forward pass, prepares every step into a
/// call, and submits the batch once. Each run builds a private
/// [`RunContext`], so a workflow can be reused for sequential runs;
/// concurrent runs of one instance are not supported.
pub struct FarmWorkflow {
  client: Arc<dyn FarmClient>,
  name: String,
  generators: Vec<(Arc<dyn StepGenerator>, StepOptions)>,
}

impl FarmWorkflow {
  #[must_use]
  pub fn new(client: Arc<dyn FarmClient>, name: &str) -> FarmWorkflow {
    FarmWorkflow {
      client,
      name: name.to_string(),
      generators: Vec::new(),
    }
  }

  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[must_use]
  pub fn client(&self) -> Arc<dyn FarmClient> {
    Arc::clone(&self.client)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.generators.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.generators.is_empty()
  }

  #[must_use]
  pub fn generators(&self) -> Vec<Arc<dyn StepGenerator>> {
    self
      .generators
      .iter()
      .map(|(generator, _)| Arc::clone(generator))
      .collect()
  }

  /// Appends generators in insertion order, flattening nested groups. The
  /// options apply to every flattened element, which is why an explicit tag
  /// is only accepted for a single generator.
  ///
  /// # Errors
  /// - [`FarmError::DuplicateTag`] when the tag is already claimed
  /// - [`FarmError::Build`] when a tag targets a multi-generator group
  pub fn add(
    &mut self,
    input: impl Into<StepInput>,
    options: StepOptions,
  ) -> Result<&mut FarmWorkflow, FarmError> {
    let mut flattened = Vec::new();
    input.into().flatten(&mut flattened);
    if let Some(tag) = &options.tag {
      if flattened.len() > 1 {
        return Err(FarmError::Build(format!(
          "tag {tag} cannot target a group of {} generators",
          flattened.len()
        )));
      }
      let taken = self
        .generators
        .iter()
        .any(|(_, existing)| existing.tag.as_deref() == Some(tag.as_str()));
      if taken {
        return Err(FarmError::DuplicateTag(tag.clone()));
      }
    }
    for generator in flattened {
      debug!(
        workflow = %self.name,
        step = generator.name(),
        "add step generator"
      );
      self.generators.push((generator, options.clone()));
    }
    Ok(self)
  }

  /// Appends one generator.
  pub fn add_step<G: StepGenerator + 'static>(
    &mut self,
    generator: G,
    options: StepOptions,
  ) -> Result<&mut FarmWorkflow, FarmError> {
    self.add(StepInput::step(generator), options)
  }

  /// Estimates the workflow's output for `amount_in`, running generators in
  /// forward order. Never prepares or submits anything.
  pub async fn estimate(
    &self,
    amount_in: TokenValue,
  ) -> Result<TokenValue, FarmError> {
    let mut context = RunContext::new(RunMode::Estimate, RunData::default());
    self.build_steps(amount_in, &mut context).await
  }

  /// Estimates the input required for the workflow to yield `amount_out`,
  /// running generators in reverse order. Fails whole if any generator has
  /// no inverse; a partial reverse estimate would misprice the transaction.
  pub async fn estimate_reversed(
    &self,
    amount_out: TokenValue,
  ) -> Result<TokenValue, FarmError> {
    let mut context =
      RunContext::new(RunMode::EstimateReversed, RunData::default());
    self.build_steps(amount_out, &mut context).await
  }

  /// Builds and submits the workflow as one atomic transaction: a forward
  /// pass to finalize every step's amounts, then `prepare` on each step in
  /// order. Any preparation failure aborts before anything is submitted.
  pub async fn execute(
    &self,
    amount_in: TokenValue,
    options: ExecuteOptions,
  ) -> Result<TxHash, FarmError> {
    let batch = self
      .build_batch(amount_in, RunMode::Execute, &options)
      .await?;
    debug!(workflow = %self.name, calls = batch.len(), "submit farm batch");
    self
      .client
      .submit_farm(&batch)
      .await
      .map_err(FarmError::Submit)
  }

  /// Simulates the fully built workflow and decodes each step's return.
  pub async fn call_static(
    &self,
    amount_in: TokenValue,
    options: ExecuteOptions,
  ) -> Result<Vec<StepResult>, FarmError> {
    let mut context = RunContext::new(
      RunMode::CallStatic,
      RunData {
        slippage: options.slippage,
      },
    );
    self.build_steps(amount_in, &mut context).await?;
    let batch = self.prepare_batch(&context)?;
    let returns = self
      .client
      .call_static_farm(&batch)
      .await
      .map_err(FarmError::Submit)?;
    if returns.len() != context.steps.len() {
      return Err(FarmError::Build(format!(
        "farm returned {} results for {} steps",
        returns.len(),
        context.steps.len()
      )));
    }
    context
      .steps
      .iter()
      .zip_eq(returns)
      .map(|(step, raw)| {
        let amount = step.decode_result(&raw).transpose()?;
        Ok(StepResult {
          name: step.name.clone(),
          raw,
          amount,
        })
      })
      .collect()
  }

  /// Gas estimate for the fully built workflow.
  pub async fn estimate_gas(
    &self,
    amount_in: TokenValue,
    options: ExecuteOptions,
  ) -> Result<u64, FarmError> {
    let batch = self
      .build_batch(amount_in, RunMode::EstimateGas, &options)
      .await?;
    self
      .client
      .estimate_farm_gas(&batch)
      .await
      .map_err(FarmError::Submit)
  }

  async fn build_batch(
    &self,
    amount_in: TokenValue,
    run_mode: RunMode,
    options: &ExecuteOptions,
  ) -> Result<FarmBatch, FarmError> {
    let mut context = RunContext::new(
      run_mode,
      RunData {
        slippage: options.slippage,
      },
    );
    self.build_steps(amount_in, &mut context).await?;
    self.prepare_batch(&context)
  }

  /// Runs the generator chain, threading the running amount. Forward order
  /// for all modes except [`RunMode::EstimateReversed`], which walks the
  /// chain backwards with the desired output. Strictly sequential: step
  /// `i + 1` may depend on step `i`'s output, so nothing runs ahead.
  async fn build_steps(
    &self,
    amount: TokenValue,
    context: &mut RunContext,
  ) -> Result<TokenValue, FarmError> {
    let order: Vec<usize> = if context.run_mode.is_reversed() {
      (0..self.generators.len()).rev().collect()
    } else {
      (0..self.generators.len()).collect()
    };

    let mut next = amount;
    for position in order {
      let (generator, options) = &self.generators[position];
      let skipped = options.skip
        || (options.only_execute && !context.run_mode.is_static());
      if skipped {
        debug!(
          workflow = %self.name,
          step = generator.name(),
          "skip step generator"
        );
        continue;
      }

      let index = context.current_index();
      let step = generator.run(next.clone(), context).await?;
      debug!(
        workflow = %self.name,
        step = %step.name,
        index,
        amount_out = %step.amount_out,
        "built step"
      );
      next = step.amount_out.clone();
      let auto_tag = step.name.clone();
      context.steps.push(step);
      match &options.tag {
        Some(tag) => context.register_tag(tag.clone(), index)?,
        None => context.register_auto_tag(&auto_tag, index),
      }
    }
    Ok(next)
  }

  /// Prepares every built step into its final call, verifying that
  /// clipboard pastes only reach backwards, and sums the ether value. All
  /// steps must prepare successfully before anything can be submitted.
  fn prepare_batch(&self, context: &RunContext) -> Result<FarmBatch, FarmError> {
    if context.steps.is_empty() {
      return Err(FarmError::Build(
        "workflow has no steps to prepare".to_string(),
      ));
    }
    let mut calls = Vec::with_capacity(context.steps.len());
    let mut value = U256::ZERO;
    for (index, step) in context.steps.iter().enumerate() {
      let call = step.prepare(context)?;
      if let Some(paste) = call
        .clipboard
        .pastes
        .iter()
        .find(|paste| paste.copy_step >= index)
      {
        return Err(FarmError::ForwardReference {
          step: step.name.clone(),
          from: index,
          to: paste.copy_step,
        });
      }
      value = value
        .checked_add(call.value)
        .ok_or_else(|| FarmError::Build("batch value overflow".to_string()))?;
      calls.push(call);
    }
    Ok(FarmBatch { calls, value })
  }
}
