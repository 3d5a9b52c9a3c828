use std::cmp::Ordering;
use std::fmt;

use alloy_primitives::{Address, I256, U256, U512};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An ERC-20 token as the engine needs to know it: where it lives and how
/// its raw integer amounts scale to human units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
  pub address: Address,
  pub symbol: String,
  pub decimals: u8,
}

impl Token {
  #[must_use]
  pub fn new(address: Address, symbol: &str, decimals: u8) -> Token {
    Token {
      address,
      symbol: symbol.to_string(),
      decimals,
    }
  }

  #[must_use]
  pub fn zero(&self) -> TokenValue {
    TokenValue::new(U256::ZERO, self.decimals)
  }

  /// Converts a human-entered amount into this token's raw representation.
  pub fn amount(&self, human: Decimal) -> Result<TokenValue, CoreError> {
    TokenValue::from_human(human, self.decimals)
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.symbol)
  }
}

/// An unsigned token amount: a raw `U256` plus the decimal scale it is
/// denominated in. All arithmetic is checked and scale-aware; combining
/// amounts of different scales is an error rather than a silent rescale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenValue {
  value: U256,
  decimals: u8,
}

impl TokenValue {
  #[must_use]
  pub fn new(value: U256, decimals: u8) -> TokenValue {
    TokenValue { value, decimals }
  }

  #[must_use]
  pub fn zero(decimals: u8) -> TokenValue {
    TokenValue::new(U256::ZERO, decimals)
  }

  /// Parses a human-readable decimal amount, truncating any precision finer
  /// than the token's raw unit.
  pub fn from_human(
    human: Decimal,
    decimals: u8,
  ) -> Result<TokenValue, CoreError> {
    if human.is_sign_negative() {
      return Err(CoreError::AmountRange);
    }
    let scale = 10u128
      .checked_pow(u32::from(decimals))
      .and_then(Decimal::from_u128)
      .ok_or(CoreError::AmountRange)?;
    let raw = human
      .checked_mul(scale)
      .ok_or(CoreError::AmountRange)?
      .trunc()
      .to_u128()
      .ok_or(CoreError::AmountRange)?;
    Ok(TokenValue::new(U256::from(raw), decimals))
  }

  /// Renders the amount back into decimal form. Fails for values outside
  /// the mantissa a `Decimal` can carry.
  pub fn to_human(&self) -> Result<Decimal, CoreError> {
    if self.value > U256::from(u128::MAX) {
      return Err(CoreError::AmountRange);
    }
    let raw = i128::try_from(self.value.to::<u128>())
      .map_err(|_| CoreError::AmountRange)?;
    Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals))
      .map_err(|_| CoreError::AmountRange)
  }

  #[must_use]
  pub fn raw(&self) -> U256 {
    self.value
  }

  #[must_use]
  pub fn decimals(&self) -> u8 {
    self.decimals
  }

  #[must_use]
  pub fn is_zero(&self) -> bool {
    self.value.is_zero()
  }

  pub fn checked_add(
    &self,
    other: &TokenValue,
  ) -> Result<TokenValue, CoreError> {
    self.match_decimals(other)?;
    let value = self
      .value
      .checked_add(other.value)
      .ok_or(CoreError::Arithmetic("token amount addition"))?;
    Ok(TokenValue::new(value, self.decimals))
  }

  pub fn checked_sub(
    &self,
    other: &TokenValue,
  ) -> Result<TokenValue, CoreError> {
    self.match_decimals(other)?;
    let value = self
      .value
      .checked_sub(other.value)
      .ok_or(CoreError::Arithmetic("token amount subtraction"))?;
    Ok(TokenValue::new(value, self.decimals))
  }

  /// Computes `self * numerator / denominator` rounding toward zero, with a
  /// 512-bit intermediate so the product cannot overflow.
  pub fn mul_div_floor(
    &self,
    numerator: U256,
    denominator: U256,
  ) -> Result<TokenValue, CoreError> {
    if denominator.is_zero() {
      return Err(CoreError::Arithmetic("division by zero"));
    }
    let wide = U512::from(self.value) * U512::from(numerator)
      / U512::from(denominator);
    if wide > U512::from(U256::MAX) {
      return Err(CoreError::Arithmetic("mul_div quotient overflow"));
    }
    Ok(TokenValue::new(wide.to::<U256>(), self.decimals))
  }

  /// Reinterprets the raw value at a new decimal scale, rescaling the digits
  /// so the human quantity is preserved (truncating when narrowing).
  pub fn rescale(&self, decimals: u8) -> Result<TokenValue, CoreError> {
    match decimals.cmp(&self.decimals) {
      Ordering::Equal => Ok(self.clone()),
      Ordering::Greater => {
        let factor = U256::from(10u64).pow(U256::from(decimals - self.decimals));
        let value = self
          .value
          .checked_mul(factor)
          .ok_or(CoreError::Arithmetic("decimal widening"))?;
        Ok(TokenValue::new(value, decimals))
      }
      Ordering::Less => {
        let factor = U256::from(10u64).pow(U256::from(self.decimals - decimals));
        Ok(TokenValue::new(self.value / factor, decimals))
      }
    }
  }

  #[must_use]
  pub fn min(&self, other: &TokenValue) -> TokenValue {
    if self.value <= other.value {
      self.clone()
    } else {
      other.clone()
    }
  }

  fn match_decimals(&self, other: &TokenValue) -> Result<(), CoreError> {
    if self.decimals == other.decimals {
      Ok(())
    } else {
      Err(CoreError::DecimalMismatch(self.decimals, other.decimals))
    }
  }
}

impl PartialOrd for TokenValue {
  fn partial_cmp(&self, other: &TokenValue) -> Option<Ordering> {
    if self.decimals == other.decimals {
      Some(self.value.cmp(&other.value))
    } else {
      None
    }
  }
}

impl fmt::Display for TokenValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_scaled(f, &self.value.to_string(), self.decimals)
  }
}

/// A signed amount delta at a fixed decimal scale. Used for the aggregate
/// deltas of a crate selection, which are negative for removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDelta {
  value: I256,
  decimals: u8,
}

impl TokenDelta {
  #[must_use]
  pub fn zero(decimals: u8) -> TokenDelta {
    TokenDelta {
      value: I256::ZERO,
      decimals,
    }
  }

  /// The delta corresponding to removing `magnitude` from a balance.
  pub fn removal(magnitude: &TokenValue) -> Result<TokenDelta, CoreError> {
    let positive = I256::try_from(magnitude.raw())
      .map_err(|_| CoreError::Arithmetic("delta magnitude"))?;
    let value = positive
      .checked_neg()
      .ok_or(CoreError::Arithmetic("delta negation"))?;
    Ok(TokenDelta {
      value,
      decimals: magnitude.decimals(),
    })
  }

  #[must_use]
  pub fn raw(&self) -> I256 {
    self.value
  }

  #[must_use]
  pub fn decimals(&self) -> u8 {
    self.decimals
  }

  #[must_use]
  pub fn is_negative(&self) -> bool {
    self.value.is_negative()
  }

  /// The absolute amount this delta adds or removes.
  #[must_use]
  pub fn magnitude(&self) -> TokenValue {
    TokenValue::new(self.value.unsigned_abs(), self.decimals)
  }
}

impl fmt::Display for TokenDelta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.value.is_negative() {
      write!(f, "-")?;
    }
    write_scaled(f, &self.value.unsigned_abs().to_string(), self.decimals)
  }
}

fn write_scaled(
  f: &mut fmt::Formatter<'_>,
  digits: &str,
  decimals: u8,
) -> fmt::Result {
  let places = usize::from(decimals);
  if places == 0 {
    write!(f, "{digits}")
  } else if digits.len() <= places {
    write!(f, "0.{digits:0>places$}")
  } else {
    let (int, frac) = digits.split_at(digits.len() - places);
    write!(f, "{int}.{frac}")
  }
}
