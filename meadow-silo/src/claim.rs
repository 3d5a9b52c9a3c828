//! Claims matured withdrawals, optionally forwarding them to a recipient.

use std::sync::Arc;

use alloy_primitives::Address;
use meadow_core::registry::SiloToken;
use meadow_core::token::TokenValue;
use meadow_farm::actions::{ClaimWithdrawals, TransferToken};
use meadow_farm::call::{FarmFromMode, FarmToMode, TxHash};
use meadow_farm::client::FarmClient;
use meadow_farm::error::FarmError;
use meadow_farm::step::{StepInput, StepOptions};
use meadow_farm::workflow::{ExecuteOptions, FarmWorkflow};

const CLAIM_TAG: &str = "claim";

/// Builds the farm workflow that claims a token's matured withdrawals.
///
/// Without a recipient the claim lands in the holder's external balance.
/// With one, the claim is kept internal and a transfer follows it; the
/// transfer pastes its amount from the claim's return data, so whatever
/// actually matured is forwarded even if it drifted from the estimate.
pub struct ClaimFarmStep {
  client: Arc<dyn FarmClient>,
  token: SiloToken,
  inputs: Vec<StepInput>,
  workflow: Option<FarmWorkflow>,
}

impl ClaimFarmStep {
  #[must_use]
  pub fn new(client: Arc<dyn FarmClient>, token: SiloToken) -> ClaimFarmStep {
    ClaimFarmStep {
      client,
      token,
      inputs: Vec::new(),
      workflow: None,
    }
  }

  pub fn build(
    &mut self,
    seasons: Vec<i64>,
    recipient: Option<Address>,
  ) -> Result<&mut ClaimFarmStep, FarmError> {
    self.inputs.clear();
    self.workflow = None;

    let to_mode = if recipient.is_some() {
      FarmToMode::Internal
    } else {
      FarmToMode::External
    };
    let claim = ClaimWithdrawals::new(
      Arc::clone(&self.client),
      self.token.token.clone(),
      seasons,
      to_mode,
    )?;

    let mut workflow = FarmWorkflow::new(Arc::clone(&self.client), "siloClaim");
    workflow.add(StepInput::step(claim), StepOptions::tagged(CLAIM_TAG))?;
    if let Some(recipient) = recipient {
      let transfer = TransferToken::new(
        Arc::clone(&self.client),
        self.token.token.clone(),
        recipient,
        FarmFromMode::Internal,
        FarmToMode::External,
      )
      .copy_amount_from(CLAIM_TAG);
      workflow.add(StepInput::step(transfer), StepOptions::default())?;
    }
    self.inputs = workflow
      .generators()
      .into_iter()
      .map(StepInput::Single)
      .collect();
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
      .ok_or_else(|| FarmError::Build("claim step not built".to_string()))
  }

  pub async fn estimate(
    &self,
    claimable: TokenValue,
  ) -> Result<TokenValue, FarmError> {
    self.workflow()?.estimate(claimable).await
  }

  pub async fn execute(
    &self,
    claimable: TokenValue,
    options: ExecuteOptions,
  ) -> Result<TxHash, FarmError> {
    self.workflow()?.execute(claimable, options).await
  }

  pub async fn estimate_gas(
    &self,
    claimable: TokenValue,
    options: ExecuteOptions,
  ) -> Result<u64, FarmError> {
    self.workflow()?.estimate_gas(claimable, options).await
  }
}
