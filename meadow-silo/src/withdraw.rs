//! Withdraws a target amount from a holder's silo deposits.

use std::sync::Arc;

use alloy_primitives::Address;
use meadow_core::select::{
  pick_crates, sort_crates_by_stem, CrateSelection, SortDirection,
};
use meadow_core::token::TokenValue;
use meadow_farm::actions::{Mow, WithdrawDeposits};
use meadow_farm::call::{FarmToMode, TxHash};
use meadow_farm::client::FarmClient;
use meadow_farm::error::FarmError;
use meadow_farm::step::{StepInput, StepOptions};
use meadow_farm::workflow::{ExecuteOptions, FarmWorkflow};
use tracing::debug;

use crate::balance::TokenSiloBalance;

/// Builds the farm workflow for a silo withdrawal.
///
/// Crates are consumed most-recent-first: the newest deposits have accrued
/// the least stalk, so taking them first preserves the holder's matured
/// positions. Selection happens off-chain here; the resulting crate list is
/// encoded verbatim into the withdraw call.
pub struct WithdrawFarmStep {
  client: Arc<dyn FarmClient>,
  account: Address,
  balance: TokenSiloBalance,
  inputs: Vec<StepInput>,
  selection: Option<CrateSelection>,
  workflow: Option<FarmWorkflow>,
}

impl WithdrawFarmStep {
  #[must_use]
  pub fn new(
    client: Arc<dyn FarmClient>,
    account: Address,
    balance: TokenSiloBalance,
  ) -> WithdrawFarmStep {
    WithdrawFarmStep {
      client,
      account,
      balance,
      inputs: Vec::new(),
      selection: None,
      workflow: None,
    }
  }

  /// Picks crates for `amount` and assembles the workflow: a mow to settle
  /// grown stalk, then the withdrawal itself. Rebuilding replaces any
  /// previous configuration.
  pub fn build(
    &mut self,
    amount: &TokenValue,
    to_mode: FarmToMode,
    current_season: i64,
  ) -> Result<&mut WithdrawFarmStep, FarmError> {
    self.clear();
    if amount.is_zero() {
      return Err(FarmError::Build(
        "withdrawal amount must be positive".to_string(),
      ));
    }
    self.balance.verify()?;

    let mut crates = self.balance.deposits.clone();
    sort_crates_by_stem(&mut crates, SortDirection::Descending);
    let selection = pick_crates(&crates, amount, current_season)?;
    debug!(
      token = %self.balance.token.token,
      crates = selection.crates.len(),
      forfeited_stalk = %selection.delta_stalk,
      "picked withdrawal crates"
    );

    let token = self.balance.token.token.clone();
    let withdraw = WithdrawDeposits::new(
      Arc::clone(&self.client),
      token.clone(),
      selection.stems(),
      selection.amounts(),
      to_mode,
    )?;
    self.inputs = vec![
      StepInput::step(Mow::new(Arc::clone(&self.client), self.account, token)),
      StepInput::step(withdraw),
    ];

    let mut workflow = FarmWorkflow::new(Arc::clone(&self.client), "siloWithdraw");
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

  /// The generators this step contributes, for embedding into a larger
  /// farm workflow.
  #[must_use]
  pub fn farm_input(&self) -> Vec<StepInput> {
    self.inputs.clone()
  }

  /// The crate accounting computed by the last `build`.
  #[must_use]
  pub fn selection(&self) -> Option<&CrateSelection> {
    self.selection.as_ref()
  }

  pub fn workflow(&self) -> Result<&FarmWorkflow, FarmError> {
    self
      .workflow
      .as_ref()
      .ok_or_else(|| FarmError::Build("withdraw step not built".to_string()))
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
