//! Re-values a holder's deposits at their current bdv.

use std::sync::Arc;

use alloy_primitives::Address;
use meadow_core::token::TokenValue;
use meadow_farm::actions::{EnrootDeposits, Mow};
use meadow_farm::call::TxHash;
use meadow_farm::client::FarmClient;
use meadow_farm::error::FarmError;
use meadow_farm::step::{StepInput, StepOptions};
use meadow_farm::workflow::{ExecuteOptions, FarmWorkflow};

use crate::balance::TokenSiloBalance;

/// Builds the farm workflow that enroots every crate of a balance: a mow
/// to settle grown stalk, then the re-valuation across the full crate
/// list. Unlike withdrawals there is nothing to select; enrooting a subset
/// would leave the rest mispriced.
pub struct EnrootFarmStep {
  client: Arc<dyn FarmClient>,
  account: Address,
  balance: TokenSiloBalance,
  inputs: Vec<StepInput>,
  workflow: Option<FarmWorkflow>,
}

impl EnrootFarmStep {
  #[must_use]
  pub fn new(
    client: Arc<dyn FarmClient>,
    account: Address,
    balance: TokenSiloBalance,
  ) -> EnrootFarmStep {
    EnrootFarmStep {
      client,
      account,
      balance,
      inputs: Vec::new(),
      workflow: None,
    }
  }

  pub fn build(&mut self) -> Result<&mut EnrootFarmStep, FarmError> {
    self.inputs.clear();
    self.workflow = None;
    if self.balance.deposits.is_empty() {
      return Err(FarmError::Build("no deposits to enroot".to_string()));
    }
    self.balance.verify()?;

    let token = self.balance.token.token.clone();
    let stems = self.balance.deposits.iter().map(|c| c.stem).collect();
    let amounts = self
      .balance
      .deposits
      .iter()
      .map(|c| c.amount.raw())
      .collect();
    let enroot =
      EnrootDeposits::new(Arc::clone(&self.client), token.clone(), stems, amounts)?;
    self.inputs = vec![
      StepInput::step(Mow::new(Arc::clone(&self.client), self.account, token)),
      StepInput::step(enroot),
    ];

    let mut workflow = FarmWorkflow::new(Arc::clone(&self.client), "siloEnroot");
    for input in self.inputs.iter().cloned() {
      workflow.add(input, StepOptions::default())?;
    }
    self.workflow = Some(workflow);
    Ok(self)
  }

  #[must_use]
  pub fn farm_input(&self) -> Vec<StepInput> {
    self.inputs.clone()
  }

  pub fn workflow(&self) -> Result<&FarmWorkflow, FarmError> {
    self
      .workflow
      .as_ref()
      .ok_or_else(|| FarmError::Build("enroot step not built".to_string()))
  }

  pub async fn execute(
    &self,
    options: ExecuteOptions,
  ) -> Result<TxHash, FarmError> {
    let amount = self.balance.amount.clone();
    self.workflow()?.execute(amount, options).await
  }

  pub async fn estimate(&self) -> Result<TokenValue, FarmError> {
    let amount = self.balance.amount.clone();
    self.workflow()?.estimate(amount).await
  }

  pub async fn estimate_gas(
    &self,
    options: ExecuteOptions,
  ) -> Result<u64, FarmError> {
    let amount = self.balance.amount.clone();
    self.workflow()?.estimate_gas(amount, options).await
  }
}
