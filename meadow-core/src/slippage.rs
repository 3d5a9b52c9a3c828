//! Slippage tolerance arithmetic used when encoding minimum-output
//! arguments.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::token::TokenValue;

/// Fixed-point precision at which slippage factors are applied.
pub const SLIPPAGE_PRECISION: u64 = 1_000_000;

/// Scales `amount` down by a percentage tolerance. `0.5` means 0.5%.
///
/// The factor `1 - pct/100` is truncated to [`SLIPPAGE_PRECISION`] before
/// the multiply, and the result floors at the token's raw unit, so the
/// encoded minimum is never optimistic.
///
/// # Errors
/// - [`CoreError::NegativeSlippage`] for a negative tolerance
/// - [`CoreError::SlippageArithmetic`] for a tolerance of 100% or more
pub fn apply_slippage(
  amount: &TokenValue,
  pct: Decimal,
) -> Result<TokenValue, CoreError> {
  if pct.is_sign_negative() {
    return Err(CoreError::NegativeSlippage);
  }
  let factor = (Decimal::from(SLIPPAGE_PRECISION)
    * (Decimal::ONE - pct / Decimal::ONE_HUNDRED))
    .floor()
    .to_u64()
    .filter(|f| *f > 0)
    .ok_or(CoreError::SlippageArithmetic)?;
  amount
    .mul_div_floor(U256::from(factor), U256::from(SLIPPAGE_PRECISION))
    .map_err(|_| CoreError::SlippageArithmetic)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn half_percent_truncates_at_token_decimals() -> Result<(), CoreError> {
    // 2999 MEAD at 0.5% -> 2984.005 exactly.
    let amount = TokenValue::new(U256::from(2_999_000_000u64), 6);
    let slipped = apply_slippage(&amount, Decimal::new(5, 1))?;
    assert_eq!(U256::from(2_984_005_000u64), slipped.raw());
    Ok(())
  }

  #[test]
  fn zero_slippage_is_identity() -> Result<(), CoreError> {
    let amount = TokenValue::new(U256::from(123_456u64), 6);
    assert_eq!(amount, apply_slippage(&amount, Decimal::ZERO)?);
    Ok(())
  }

  #[test]
  fn negative_slippage_rejected() {
    let amount = TokenValue::new(U256::from(1u64), 6);
    assert_eq!(
      Err(CoreError::NegativeSlippage),
      apply_slippage(&amount, Decimal::new(-1, 1))
    );
  }

  #[test]
  fn full_slippage_rejected() {
    let amount = TokenValue::new(U256::from(1u64), 6);
    assert_eq!(
      Err(CoreError::SlippageArithmetic),
      apply_slippage(&amount, Decimal::ONE_HUNDRED)
    );
  }
}
