//! In-memory farm client for engine and strategy tests.
//!
//! Quotes follow a linear rate table keyed by token pair, encodings are
//! human-readable byte strings so assertions can grep for arguments, and
//! every submitted batch is recorded.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, B256, U256, U512};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use meadow_core::token::{Token, TokenValue};

use crate::call::{FarmBatch, FarmFromMode, FarmToMode, TxHash};
use crate::client::{CallEncoder, FarmClient};

const MOCK_GAS: u64 = 650_000;

#[derive(Debug, Clone, Copy)]
struct Rate {
  numerator: U256,
  denominator: U256,
}

pub struct MockFarmClient {
  farm: Address,
  rates: HashMap<(Address, Address), Rate>,
  fail_quotes: bool,
  fail_submit: bool,
  submitted: Mutex<Vec<FarmBatch>>,
}

impl MockFarmClient {
  #[must_use]
  pub fn new() -> MockFarmClient {
    MockFarmClient {
      farm: Address::repeat_byte(0xfa),
      rates: HashMap::new(),
      fail_quotes: false,
      fail_submit: false,
      submitted: Mutex::new(Vec::new()),
    }
  }

  /// Quotes for `token_in -> token_out` become
  /// `raw_out = raw_in * numerator / denominator`.
  #[must_use]
  pub fn with_rate(
    mut self,
    token_in: &Token,
    token_out: &Token,
    numerator: u64,
    denominator: u64,
  ) -> MockFarmClient {
    self.rates.insert(
      (token_in.address, token_out.address),
      Rate {
        numerator: U256::from(numerator),
        denominator: U256::from(denominator),
      },
    );
    self
  }

  /// Makes every quote method fail, simulating reverting simulations.
  #[must_use]
  pub fn failing_quotes(mut self) -> MockFarmClient {
    self.fail_quotes = true;
    self
  }

  /// Makes `submit_farm` fail after recording nothing.
  #[must_use]
  pub fn failing_submit(mut self) -> MockFarmClient {
    self.fail_submit = true;
    self
  }

  /// Batches successfully submitted so far.
  #[must_use]
  pub fn submissions(&self) -> Vec<FarmBatch> {
    self.submitted.lock().expect("mock lock").clone()
  }

  fn rate(&self, token_in: &Token, token_out: &Token) -> Result<Rate> {
    if self.fail_quotes {
      return Err(anyhow!("simulation reverted"));
    }
    self
      .rates
      .get(&(token_in.address, token_out.address))
      .copied()
      .ok_or_else(|| {
        anyhow!("no rate for {} -> {}", token_in.symbol, token_out.symbol)
      })
  }
}

impl Default for MockFarmClient {
  fn default() -> MockFarmClient {
    MockFarmClient::new()
  }
}

fn mul_div(value: U256, numerator: U256, denominator: U256) -> Result<U256> {
  if denominator.is_zero() {
    return Err(anyhow!("zero denominator in mock rate"));
  }
  let wide =
    U512::from(value) * U512::from(numerator) / U512::from(denominator);
  if wide > U512::from(U256::MAX) {
    return Err(anyhow!("mock rate overflow"));
  }
  Ok(wide.to::<U256>())
}

fn op(call: &str) -> Bytes {
  Bytes::from(call.as_bytes().to_vec())
}

impl CallEncoder for MockFarmClient {
  fn farm_address(&self) -> Address {
    self.farm
  }

  fn encode_wrap_eth(&self, amount: U256, to_mode: FarmToMode) -> Bytes {
    op(&format!("wrapEth({amount},{to_mode:?})"))
  }

  fn encode_unwrap_eth(&self, amount: U256, from_mode: FarmFromMode) -> Bytes {
    op(&format!("unwrapEth({amount},{from_mode:?})"))
  }

  fn encode_transfer_token(
    &self,
    token: Address,
    recipient: Address,
    amount: U256,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
  ) -> Bytes {
    op(&format!(
      "transferToken({token},{recipient},{amount},{from_mode:?},{to_mode:?})"
    ))
  }

  fn encode_well_swap(
    &self,
    well: Address,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    min_amount_out: U256,
    recipient: Address,
  ) -> Bytes {
    op(&format!(
      "wellSwap({well},{token_in},{token_out},{amount_in},{min_amount_out},{recipient})"
    ))
  }

  fn encode_withdraw_deposits(
    &self,
    token: Address,
    stems: &[i64],
    amounts: &[U256],
    to_mode: FarmToMode,
  ) -> Bytes {
    op(&format!(
      "withdrawDeposits({token},{stems:?},{amounts:?},{to_mode:?})"
    ))
  }

  fn encode_convert(
    &self,
    from: Address,
    to: Address,
    amount_in: U256,
    min_amount_out: U256,
    stems: &[i64],
    amounts: &[U256],
  ) -> Bytes {
    op(&format!(
      "convert({from},{to},{amount_in},{min_amount_out},{stems:?},{amounts:?})"
    ))
  }

  fn encode_enroot_deposits(
    &self,
    token: Address,
    stems: &[i64],
    amounts: &[U256],
  ) -> Bytes {
    op(&format!("enrootDeposits({token},{stems:?},{amounts:?})"))
  }

  fn encode_mow(&self, account: Address, token: Address) -> Bytes {
    op(&format!("mow({account},{token})"))
  }

  fn encode_claim_withdrawals(
    &self,
    token: Address,
    seasons: &[i64],
    to_mode: FarmToMode,
  ) -> Bytes {
    op(&format!("claimWithdrawals({token},{seasons:?},{to_mode:?})"))
  }
}

#[async_trait]
impl FarmClient for MockFarmClient {
  async fn quote_swap_out(
    &self,
    _well: Address,
    token_in: &Token,
    token_out: &Token,
    amount_in: &TokenValue,
  ) -> Result<TokenValue> {
    let rate = self.rate(token_in, token_out)?;
    let raw = mul_div(amount_in.raw(), rate.numerator, rate.denominator)?;
    Ok(TokenValue::new(raw, token_out.decimals))
  }

  async fn quote_swap_in(
    &self,
    _well: Address,
    token_in: &Token,
    token_out: &Token,
    desired_out: &TokenValue,
  ) -> Result<TokenValue> {
    let rate = self.rate(token_in, token_out)?;
    let raw = mul_div(desired_out.raw(), rate.denominator, rate.numerator)?;
    Ok(TokenValue::new(raw, token_in.decimals))
  }

  async fn quote_convert_out(
    &self,
    from: &Token,
    to: &Token,
    amount_in: &TokenValue,
  ) -> Result<TokenValue> {
    let rate = self.rate(from, to)?;
    let raw = mul_div(amount_in.raw(), rate.numerator, rate.denominator)?;
    Ok(TokenValue::new(raw, to.decimals))
  }

  async fn submit_farm(&self, batch: &FarmBatch) -> Result<TxHash> {
    if self.fail_submit {
      return Err(anyhow!("submission rejected"));
    }
    self.submitted.lock().expect("mock lock").push(batch.clone());
    Ok(B256::repeat_byte(0x42))
  }

  async fn call_static_farm(&self, batch: &FarmBatch) -> Result<Vec<Bytes>> {
    Ok(vec![Bytes::from(vec![0u8; 32]); batch.len()])
  }

  async fn estimate_farm_gas(&self, _batch: &FarmBatch) -> Result<u64> {
    Ok(MOCK_GAS)
  }
}
