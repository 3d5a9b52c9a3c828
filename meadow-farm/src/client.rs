//! Chain-access boundary: everything the engine needs from the contract
//! layer, kept behind traits so the ABI/RPC machinery stays out of scope
//! and tests can substitute a mock.

use alloy_primitives::{Address, Bytes, U256};
use anyhow::Result;
use async_trait::async_trait;
use meadow_core::token::{Token, TokenValue};

use crate::call::{FarmBatch, FarmFromMode, FarmToMode, TxHash};

/// Pure calldata construction for every farm operation the action library
/// emits. Implementations wrap an ABI encoder; the engine never inspects
/// the bytes it gets back.
pub trait CallEncoder: Send + Sync {
  /// Address of the farm diamond all non-pipe calls target.
  fn farm_address(&self) -> Address;

  fn encode_wrap_eth(&self, amount: U256, to_mode: FarmToMode) -> Bytes;

  fn encode_unwrap_eth(&self, amount: U256, from_mode: FarmFromMode) -> Bytes;

  fn encode_transfer_token(
    &self,
    token: Address,
    recipient: Address,
    amount: U256,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
  ) -> Bytes;

  fn encode_well_swap(
    &self,
    well: Address,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    min_amount_out: U256,
    recipient: Address,
  ) -> Bytes;

  fn encode_withdraw_deposits(
    &self,
    token: Address,
    stems: &[i64],
    amounts: &[U256],
    to_mode: FarmToMode,
  ) -> Bytes;

  fn encode_convert(
    &self,
    from: Address,
    to: Address,
    amount_in: U256,
    min_amount_out: U256,
    stems: &[i64],
    amounts: &[U256],
  ) -> Bytes;

  fn encode_enroot_deposits(
    &self,
    token: Address,
    stems: &[i64],
    amounts: &[U256],
  ) -> Bytes;

  fn encode_mow(&self, account: Address, token: Address) -> Bytes;

  fn encode_claim_withdrawals(
    &self,
    token: Address,
    seasons: &[i64],
    to_mode: FarmToMode,
  ) -> Bytes;
}

/// Quote simulation and batch submission on top of [`CallEncoder`].
///
/// Quote methods are read-only simulations; failures carry the underlying
/// RPC/revert cause and are surfaced by the workflow as
/// [`FarmError::Quote`](crate::error::FarmError::Quote) without retry.
#[async_trait]
pub trait FarmClient: CallEncoder {
  /// Output amount a well swap would produce for `amount_in`.
  async fn quote_swap_out(
    &self,
    well: Address,
    token_in: &Token,
    token_out: &Token,
    amount_in: &TokenValue,
  ) -> Result<TokenValue>;

  /// Input amount a well swap would require to produce `desired_out`.
  async fn quote_swap_in(
    &self,
    well: Address,
    token_in: &Token,
    token_out: &Token,
    desired_out: &TokenValue,
  ) -> Result<TokenValue>;

  /// Output amount a silo convert would produce for `amount_in`.
  async fn quote_convert_out(
    &self,
    from: &Token,
    to: &Token,
    amount_in: &TokenValue,
  ) -> Result<TokenValue>;

  /// Submits the batch as one transaction. All calls land atomically or
  /// not at all.
  async fn submit_farm(&self, batch: &FarmBatch) -> Result<TxHash>;

  /// Simulates the batch, returning each call's raw return bytes in order.
  async fn call_static_farm(&self, batch: &FarmBatch) -> Result<Vec<Bytes>>;

  async fn estimate_farm_gas(&self, batch: &FarmBatch) -> Result<u64>;
}
