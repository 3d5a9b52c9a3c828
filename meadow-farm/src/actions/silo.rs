//! Silo actions: operations over previously selected deposit crates.
//!
//! These generators encode crate lists decided by the selection layer; they
//! do not pick crates themselves.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use meadow_core::slippage::apply_slippage;
use meadow_core::token::{Token, TokenValue};

use crate::call::{FarmCall, FarmToMode};
use crate::client::FarmClient;
use crate::context::{RunContext, RunMode};
use crate::error::FarmError;
use crate::step::{Step, StepGenerator};

fn check_crate_args(
  stems: &[i64],
  amounts: &[U256],
) -> Result<(), FarmError> {
  if stems.is_empty() {
    return Err(FarmError::Build("no crates to operate on".to_string()));
  }
  if stems.len() != amounts.len() {
    return Err(FarmError::Build(format!(
      "{} stems but {} amounts",
      stems.len(),
      amounts.len()
    )));
  }
  Ok(())
}

/// Withdraws the given crate amounts from the silo. The step emits the
/// withdrawal total, regardless of the amount flowing in, and is its own
/// inverse for reversed estimation.
pub struct WithdrawDeposits {
  client: Arc<dyn FarmClient>,
  token: Token,
  stems: Vec<i64>,
  amounts: Vec<U256>,
  total: TokenValue,
  to_mode: FarmToMode,
}

impl WithdrawDeposits {
  pub fn new(
    client: Arc<dyn FarmClient>,
    token: Token,
    stems: Vec<i64>,
    amounts: Vec<U256>,
    to_mode: FarmToMode,
  ) -> Result<WithdrawDeposits, FarmError> {
    check_crate_args(&stems, &amounts)?;
    let mut raw_total = U256::ZERO;
    for amount in &amounts {
      raw_total = raw_total
        .checked_add(*amount)
        .ok_or_else(|| FarmError::Build("withdrawal overflow".to_string()))?;
    }
    let total = TokenValue::new(raw_total, token.decimals);
    Ok(WithdrawDeposits {
      client,
      token,
      stems,
      amounts,
      total,
      to_mode,
    })
  }
}

#[async_trait]
impl StepGenerator for WithdrawDeposits {
  fn name(&self) -> &str {
    "withdrawDeposits"
  }

  async fn run(
    &self,
    _amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let client = Arc::clone(&self.client);
    let token = self.token.address;
    let stems = self.stems.clone();
    let amounts = self.amounts.clone();
    let to_mode = self.to_mode;
    Ok(Step::new(
      "withdrawDeposits",
      self.total.clone(),
      Box::new(move |_context: &RunContext| {
        let call_data =
          client.encode_withdraw_deposits(token, &stems, &amounts, to_mode);
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    ))
  }
}

/// Converts deposited crates from one whitelisted token to another in
/// place. Forward estimation quotes the conversion output; there is no
/// closed-form inverse, so reversed estimation fails loudly.
pub struct ConvertDeposits {
  client: Arc<dyn FarmClient>,
  from: Token,
  to: Token,
  stems: Vec<i64>,
  amounts: Vec<U256>,
}

impl ConvertDeposits {
  pub fn new(
    client: Arc<dyn FarmClient>,
    from: Token,
    to: Token,
    stems: Vec<i64>,
    amounts: Vec<U256>,
  ) -> Result<ConvertDeposits, FarmError> {
    check_crate_args(&stems, &amounts)?;
    Ok(ConvertDeposits {
      client,
      from,
      to,
      stems,
      amounts,
    })
  }
}

#[async_trait]
impl StepGenerator for ConvertDeposits {
  fn name(&self) -> &str {
    "convertDeposits"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    context: &RunContext,
  ) -> Result<Step, FarmError> {
    if context.run_mode == RunMode::EstimateReversed {
      return Err(FarmError::UnsupportedDirection {
        step: self.name().to_string(),
      });
    }
    let amount_out = self
      .client
      .quote_convert_out(&self.from, &self.to, &amount_in)
      .await
      .map_err(|source| FarmError::Quote {
        step: self.name().to_string(),
        source,
      })?;

    let client = Arc::clone(&self.client);
    let from = self.from.address;
    let to = self.to.address;
    let stems = self.stems.clone();
    let amounts = self.amounts.clone();
    let quoted_out = amount_out.clone();
    Ok(Step::new(
      "convertDeposits",
      amount_out,
      Box::new(move |context: &RunContext| {
        let min_out = apply_slippage(&quoted_out, context.slippage()?)?;
        let call_data = client.encode_convert(
          from,
          to,
          amount_in.raw(),
          min_out.raw(),
          &stems,
          &amounts,
        );
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    ))
  }
}

/// Re-values unripe crates at their current bdv, restoring forfeited stalk
/// and seeds. Amount passthrough.
pub struct EnrootDeposits {
  client: Arc<dyn FarmClient>,
  token: Token,
  stems: Vec<i64>,
  amounts: Vec<U256>,
}

impl EnrootDeposits {
  pub fn new(
    client: Arc<dyn FarmClient>,
    token: Token,
    stems: Vec<i64>,
    amounts: Vec<U256>,
  ) -> Result<EnrootDeposits, FarmError> {
    check_crate_args(&stems, &amounts)?;
    Ok(EnrootDeposits {
      client,
      token,
      stems,
      amounts,
    })
  }
}

#[async_trait]
impl StepGenerator for EnrootDeposits {
  fn name(&self) -> &str {
    "enrootDeposits"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let client = Arc::clone(&self.client);
    let token = self.token.address;
    let stems = self.stems.clone();
    let amounts = self.amounts.clone();
    Ok(Step::new(
      "enrootDeposits",
      amount_in,
      Box::new(move |_context: &RunContext| {
        let call_data =
          client.encode_enroot_deposits(token, &stems, &amounts);
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    ))
  }
}

/// Settles grown stalk for an account's token before other silo
/// operations. Amount passthrough.
pub struct Mow {
  client: Arc<dyn FarmClient>,
  account: Address,
  token: Token,
}

impl Mow {
  #[must_use]
  pub fn new(client: Arc<dyn FarmClient>, account: Address, token: Token) -> Mow {
    Mow {
      client,
      account,
      token,
    }
  }
}

#[async_trait]
impl StepGenerator for Mow {
  fn name(&self) -> &str {
    "mow"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let client = Arc::clone(&self.client);
    let account = self.account;
    let token = self.token.address;
    Ok(Step::new(
      "mow",
      amount_in,
      Box::new(move |_context: &RunContext| {
        let call_data = client.encode_mow(account, token);
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    ))
  }
}

/// Claims the given matured withdrawal seasons into the chosen balance.
/// Amount passthrough.
pub struct ClaimWithdrawals {
  client: Arc<dyn FarmClient>,
  token: Token,
  seasons: Vec<i64>,
  to_mode: FarmToMode,
}

impl ClaimWithdrawals {
  pub fn new(
    client: Arc<dyn FarmClient>,
    token: Token,
    seasons: Vec<i64>,
    to_mode: FarmToMode,
  ) -> Result<ClaimWithdrawals, FarmError> {
    if seasons.is_empty() {
      return Err(FarmError::Build(
        "no withdrawal seasons to claim".to_string(),
      ));
    }
    Ok(ClaimWithdrawals {
      client,
      token,
      seasons,
      to_mode,
    })
  }
}

#[async_trait]
impl StepGenerator for ClaimWithdrawals {
  fn name(&self) -> &str {
    "claimWithdrawals"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let client = Arc::clone(&self.client);
    let token = self.token.address;
    let seasons = self.seasons.clone();
    let to_mode = self.to_mode;
    Ok(Step::new(
      "claimWithdrawals",
      amount_in,
      Box::new(move |_context: &RunContext| {
        let call_data =
          client.encode_claim_withdrawals(token, &seasons, to_mode);
        Ok(FarmCall::new(client.farm_address(), call_data))
      }),
    ))
  }
}
