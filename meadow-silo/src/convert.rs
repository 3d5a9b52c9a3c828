//! Converts deposits between whitelisted tokens without leaving the silo.

use std::sync::Arc;

use meadow_core::registry::SiloToken;
use meadow_core::select::{
  pick_crates, sort_crates_by_bdv_ratio, sort_crates_by_stem, CrateSelection,
  SortDirection,
};
use meadow_core::token::TokenValue;
use meadow_farm::actions::ConvertDeposits;
use meadow_farm::call::TxHash;
use meadow_farm::client::FarmClient;
use meadow_farm::error::FarmError;
use meadow_farm::step::{StepInput, StepOptions};
use meadow_farm::workflow::{ExecuteOptions, FarmWorkflow};
use tracing::debug;

use crate::balance::TokenSiloBalance;

/// Builds the farm workflow for a silo conversion.
///
/// Crate ordering differs by direction. Converting into the LP token takes
/// the oldest crates first: grown stalk carries across the convert, and
/// moving the oldest seeds into the higher-seed LP side compounds fastest.
/// Converting out of LP takes the crates with the lowest bdv-per-amount
/// ratio first, since those gain the most from re-valuation.
pub struct ConvertFarmStep {
  client: Arc<dyn FarmClient>,
  balance: TokenSiloBalance,
  inputs: Vec<StepInput>,
  selection: Option<CrateSelection>,
  workflow: Option<FarmWorkflow>,
}

impl ConvertFarmStep {
  #[must_use]
  pub fn new(
    client: Arc<dyn FarmClient>,
    balance: TokenSiloBalance,
  ) -> ConvertFarmStep {
    ConvertFarmStep {
      client,
      balance,
      inputs: Vec::new(),
      selection: None,
      workflow: None,
    }
  }

  /// Validates the conversion path, picks crates for `amount`, and
  /// assembles the workflow. Rebuilding replaces any previous
  /// configuration.
  pub fn build(
    &mut self,
    target: &SiloToken,
    amount: &TokenValue,
    current_season: i64,
  ) -> Result<&mut ConvertFarmStep, FarmError> {
    self.clear();
    let source = &self.balance.token;
    if source.token.address == target.token.address {
      return Err(FarmError::Build(
        "cannot convert between the same token".to_string(),
      ));
    }
    if source.is_lp == target.is_lp {
      return Err(FarmError::Build(format!(
        "no conversion path from {} to {}",
        source.token, target.token
      )));
    }
    if amount.is_zero() {
      return Err(FarmError::Build(
        "conversion amount must be positive".to_string(),
      ));
    }
    self.balance.verify()?;

    let mut crates = self.balance.deposits.clone();
    if target.is_lp {
      sort_crates_by_stem(&mut crates, SortDirection::Ascending);
    } else {
      sort_crates_by_bdv_ratio(&mut crates, SortDirection::Ascending);
    }
    let selection = pick_crates(&crates, amount, current_season)?;
    debug!(
      from = %source.token,
      to = %target.token,
      crates = selection.crates.len(),
      "picked conversion crates"
    );

    let convert = ConvertDeposits::new(
      Arc::clone(&self.client),
      source.token.clone(),
      target.token.clone(),
      selection.stems(),
      selection.amounts(),
    )?;
    self.inputs = vec![StepInput::step(convert)];

    let mut workflow = FarmWorkflow::new(Arc::clone(&self.client), "siloConvert");
    for input in self.inputs.iter().cloned() {
      workflow.add(input, StepOptions::default())?;
    }
    self.selection = Some(selection);
    self.workflow = Some(workflow);
    Ok(self)
  }

  fn clear(&mut self) {
    self.inputs.clear();
    self.selection = None;
    self.workflow = None;
  }

  #[must_use]
  pub fn farm_input(&self) -> Vec<StepInput> {
    self.inputs.clone()
  }

  #[must_use]
  pub fn selection(&self) -> Option<&CrateSelection> {
    self.selection.as_ref()
  }

  pub fn workflow(&self) -> Result<&FarmWorkflow, FarmError> {
    self
      .workflow
      .as_ref()
      .ok_or_else(|| FarmError::Build("convert step not built".to_string()))
  }

  pub async fn estimate(
    &self,
    amount_in: TokenValue,
  ) -> Result<TokenValue, FarmError> {
    self.workflow()?.estimate(amount_in).await
  }

  pub async fn execute(
    &self,
    amount_in: TokenValue,
    options: ExecuteOptions,
  ) -> Result<TxHash, FarmError> {
    self.workflow()?.execute(amount_in, options).await
  }

  pub async fn estimate_gas(
    &self,
    amount_in: TokenValue,
    options: ExecuteOptions,
  ) -> Result<u64, FarmError> {
    self.workflow()?.estimate_gas(amount_in, options).await
  }
}
