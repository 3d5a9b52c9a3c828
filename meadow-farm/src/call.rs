//! Prepared farm calls and the batch submitted to the multicall entry point.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::clipboard::Clipboard;

pub type TxHash = B256;

/// Which balance a farm operation spends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FarmFromMode {
  External = 0,
  Internal = 1,
  InternalExternal = 2,
  InternalTolerant = 3,
}

/// Which balance a farm operation credits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FarmToMode {
  External = 0,
  Internal = 1,
}

/// One encoded call, ready for the farm's atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmCall {
  pub target: Address,
  pub call_data: Bytes,
  pub value: U256,
  pub clipboard: Clipboard,
}

impl FarmCall {
  #[must_use]
  pub fn new(target: Address, call_data: Bytes) -> FarmCall {
    FarmCall {
      target,
      call_data,
      value: U256::ZERO,
      clipboard: Clipboard::none(),
    }
  }

  #[must_use]
  pub fn with_value(mut self, value: U256) -> FarmCall {
    self.value = value;
    self
  }

  #[must_use]
  pub fn with_clipboard(mut self, clipboard: Clipboard) -> FarmCall {
    self.clipboard = clipboard;
    self
  }
}

/// An ordered batch of farm calls submitted as one transaction. The batch
/// order is exactly the workflow's step order; clipboard pastes rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmBatch {
  pub calls: Vec<FarmCall>,
  /// Total ether forwarded with the transaction.
  pub value: U256,
}

impl FarmBatch {
  #[must_use]
  pub fn len(&self) -> usize {
    self.calls.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.calls.is_empty()
  }
}
