use crate::token::TokenValue;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
  // `token`
  #[error("cannot combine amounts with {0} and {1} decimals")]
  DecimalMismatch(u8, u8),
  #[error("arithmetic overflow while computing {0}")]
  Arithmetic(&'static str),
  #[error("amount does not fit the token's raw representation")]
  AmountRange,
  // `slippage`
  #[error("slippage tolerance must not be negative")]
  NegativeSlippage,
  #[error("over/underflow while applying slippage tolerance")]
  SlippageArithmetic,
  // `crates`
  #[error("crate stem {stem} is newer than the current season {season}")]
  StemAhead { stem: i64, season: i64 },
  // `select`
  #[error("no deposits to select from")]
  NoDeposits,
  #[error(
    "insufficient deposited balance: requested {requested}, available {available}"
  )]
  InsufficientBalance {
    requested: TokenValue,
    available: TokenValue,
  },
  // `balance`
  #[error("silo balance totals do not match the sum of deposits")]
  BalanceMismatch,
}
