//! Per-run state threaded through step generators.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::FarmError;
use crate::step::Step;

/// How a workflow run was invoked. Static modes require the transaction to
/// be fully built; estimation modes may skip execute-only steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
  Estimate,
  EstimateReversed,
  Execute,
  CallStatic,
  EstimateGas,
}

impl RunMode {
  #[must_use]
  pub fn is_static(self) -> bool {
    matches!(
      self,
      RunMode::Execute | RunMode::CallStatic | RunMode::EstimateGas
    )
  }

  #[must_use]
  pub fn is_reversed(self) -> bool {
    self == RunMode::EstimateReversed
  }
}

/// Caller-supplied data injected into every generator of a run.
#[derive(Debug, Clone, Default)]
pub struct RunData {
  /// Percent slippage tolerance; `0.5` means 0.5%.
  pub slippage: Option<Decimal>,
}

/// Mutable state shared by reference across the steps of exactly one run.
///
/// A fresh context is built for every `estimate`/`estimate_reversed`/
/// `execute` call and discarded afterwards. It is not reentrant: a context
/// must never be shared between concurrent runs.
#[derive(Debug)]
pub struct RunContext {
  pub run_mode: RunMode,
  /// Steps built so far, in execution order. Generators may look backward
  /// through these to find an earlier step's output.
  pub steps: Vec<Step>,
  pub data: RunData,
  tag_map: HashMap<String, usize>,
}

impl RunContext {
  #[must_use]
  pub fn new(run_mode: RunMode, data: RunData) -> RunContext {
    RunContext {
      run_mode,
      steps: Vec::new(),
      data,
      tag_map: HashMap::new(),
    }
  }

  /// The index the step currently being built will occupy.
  #[must_use]
  pub fn current_index(&self) -> usize {
    self.steps.len()
  }

  #[must_use]
  pub fn previous_step(&self) -> Option<&Step> {
    self.steps.last()
  }

  /// Looks up the step index bound to `tag`.
  pub fn find_tag(&self, tag: &str) -> Result<usize, FarmError> {
    self
      .tag_map
      .get(tag)
      .copied()
      .ok_or_else(|| FarmError::TagNotFound(tag.to_string()))
  }

  /// Non-failing tag lookup, for optimization paths with a fallback.
  #[must_use]
  pub fn tag(&self, tag: &str) -> Option<usize> {
    self.tag_map.get(tag).copied()
  }

  /// Binds `tag` to a built step. Explicit tags are unique per run.
  pub(crate) fn register_tag(
    &mut self,
    tag: String,
    index: usize,
  ) -> Result<(), FarmError> {
    if self.tag_map.contains_key(&tag) {
      return Err(FarmError::DuplicateTag(tag));
    }
    if index >= self.steps.len() {
      return Err(FarmError::Build(format!(
        "tag {tag} points at unbuilt step {index}"
      )));
    }
    self.tag_map.insert(tag, index);
    Ok(())
  }

  /// Binds a step's own name as a tag unless that name is already taken.
  /// First registration wins; explicit tags are never displaced.
  pub(crate) fn register_auto_tag(&mut self, name: &str, index: usize) {
    if !self.tag_map.contains_key(name) && index < self.steps.len() {
      self.tag_map.insert(name.to_string(), index);
    }
  }

  /// The run's slippage tolerance, required by `prepare()` paths that
  /// encode minimum outputs.
  pub fn slippage(&self) -> Result<Decimal, FarmError> {
    self.data.slippage.ok_or(FarmError::SlippageMissing)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use alloy_primitives::{Address, U256};
  use meadow_core::token::TokenValue;

  use crate::call::FarmCall;

  fn push_step(context: &mut RunContext, name: &str) {
    context.steps.push(Step::new(
      name,
      TokenValue::new(U256::ZERO, 6),
      Box::new(|_| Ok(FarmCall::new(Address::ZERO, Default::default()))),
    ));
  }

  #[test]
  fn explicit_tags_resolve_and_collide() {
    let mut context = RunContext::new(RunMode::Estimate, RunData::default());
    push_step(&mut context, "a");
    context.register_tag("first".to_string(), 0).unwrap();
    assert_eq!(0, context.find_tag("first").unwrap());
    assert!(matches!(
      context.register_tag("first".to_string(), 0),
      Err(FarmError::DuplicateTag(_))
    ));
  }

  #[test]
  fn unknown_tag_is_an_error() {
    let context = RunContext::new(RunMode::Estimate, RunData::default());
    assert!(matches!(
      context.find_tag("missing"),
      Err(FarmError::TagNotFound(_))
    ));
    assert_eq!(None, context.tag("missing"));
  }

  #[test]
  fn tags_cannot_point_at_unbuilt_steps() {
    let mut context = RunContext::new(RunMode::Estimate, RunData::default());
    assert!(matches!(
      context.register_tag("early".to_string(), 0),
      Err(FarmError::Build(_))
    ));
  }

  #[test]
  fn auto_tags_never_displace() {
    let mut context = RunContext::new(RunMode::Estimate, RunData::default());
    push_step(&mut context, "swap");
    push_step(&mut context, "swap");
    context.register_auto_tag("swap", 0);
    context.register_auto_tag("swap", 1);
    assert_eq!(0, context.find_tag("swap").unwrap());
  }

  #[test]
  fn slippage_is_required_when_read() {
    let context = RunContext::new(RunMode::Execute, RunData::default());
    assert!(matches!(context.slippage(), Err(FarmError::SlippageMissing)));
  }
}
