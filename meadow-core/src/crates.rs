//! Deposit crates and the stalk/seeds accrual math attached to them.
//!
//! A deposit is tracked as a discrete crate stamped with the season it was
//! created in (its `stem`). The crate's `bdv` (deposited value denominated in
//! MEAD) earns a one-time stalk grant and a seeds balance at creation; seeds
//! then grow additional stalk every season the crate stays deposited.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::token::TokenValue;

/// Decimal scale of `bdv` values.
pub const BDV_DECIMALS: u8 = 6;
/// Decimal scale of stalk balances.
pub const STALK_DECIMALS: u8 = 10;
/// Decimal scale of seeds balances.
pub const SEED_DECIMALS: u8 = 6;

/// Stalk grown by one seed over one season, in ten-thousandths of a stalk.
pub const GROWN_STALK_PER_SEED_PER_SEASON_E4: u64 = 1;

/// Per-token reward rates applied to a deposit's bdv at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRates {
  /// Whole stalk granted per unit of bdv. 1 for every whitelisted token.
  pub stalk_per_bdv: u32,
  /// Seeds granted per unit of bdv. Varies by token; may be fractional.
  pub seeds_per_bdv: Decimal,
}

impl RewardRates {
  /// Stalk granted for a deposit of the given bdv, at stalk decimals.
  pub fn stalk_grant(&self, bdv: &TokenValue) -> Result<TokenValue, CoreError> {
    bdv
      .rescale(STALK_DECIMALS)?
      .mul_div_floor(U256::from(self.stalk_per_bdv), U256::from(1u64))
  }

  /// Seeds granted for a deposit of the given bdv, at seed decimals.
  pub fn seeds_grant(&self, bdv: &TokenValue) -> Result<TokenValue, CoreError> {
    let micros = self
      .seeds_per_bdv
      .checked_mul(Decimal::from(1_000_000u64))
      .and_then(|d| d.trunc().to_u64())
      .ok_or(CoreError::Arithmetic("seeds per bdv"))?;
    bdv
      .rescale(SEED_DECIMALS)?
      .mul_div_floor(U256::from(micros), U256::from(1_000_000u64))
  }
}

/// One deposit lot of a silo token.
///
/// `stalk` is the stored balance (the creation grant plus any growth already
/// settled by mowing); stalk grown since the last settlement is derived from
/// `seeds` and the crate's age on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCrate {
  pub stem: i64,
  pub amount: TokenValue,
  pub bdv: TokenValue,
  pub stalk: TokenValue,
  pub seeds: TokenValue,
}

impl DepositCrate {
  /// Builds the crate a fresh deposit would create, granting stalk and seeds
  /// from the deposit's bdv.
  pub fn from_deposit(
    stem: i64,
    amount: TokenValue,
    bdv: TokenValue,
    rates: &RewardRates,
  ) -> Result<DepositCrate, CoreError> {
    let stalk = rates.stalk_grant(&bdv)?;
    let seeds = rates.seeds_grant(&bdv)?;
    Ok(DepositCrate {
      stem,
      amount,
      bdv,
      stalk,
      seeds,
    })
  }

  /// Stalk grown by this crate's seeds since deposit, not yet settled into
  /// the stored balance.
  pub fn grown_stalk(&self, current_season: i64) -> Result<TokenValue, CoreError> {
    grown_stalk(&self.seeds, self.stem, current_season)
  }

  /// Stored stalk plus growth to date.
  pub fn total_stalk(&self, current_season: i64) -> Result<TokenValue, CoreError> {
    self.stalk.checked_add(&self.grown_stalk(current_season)?)
  }
}

/// Stalk grown by a seeds balance between `stem` and `current_season`.
pub fn grown_stalk(
  seeds: &TokenValue,
  stem: i64,
  current_season: i64,
) -> Result<TokenValue, CoreError> {
  let elapsed = current_season
    .checked_sub(stem)
    .ok_or(CoreError::Arithmetic("season delta"))?;
  if elapsed < 0 {
    return Err(CoreError::StemAhead {
      stem,
      season: current_season,
    });
  }
  let scaled = seeds.rescale(STALK_DECIMALS)?;
  let grown = scaled.mul_div_floor(
    U256::from(elapsed.unsigned_abs())
      * U256::from(GROWN_STALK_PER_SEED_PER_SEASON_E4),
    U256::from(10_000u64),
  )?;
  Ok(grown)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mead_rates() -> RewardRates {
    RewardRates {
      stalk_per_bdv: 1,
      seeds_per_bdv: Decimal::new(2, 0),
    }
  }

  #[test]
  fn deposit_grants_follow_bdv() -> Result<(), CoreError> {
    let bdv = TokenValue::new(U256::from(500_000_000u64), BDV_DECIMALS);
    let crate_ = DepositCrate::from_deposit(
      100,
      TokenValue::new(U256::from(500_000_000u64), 6),
      bdv,
      &mead_rates(),
    )?;
    // 500 bdv -> 500 stalk (10 decimals), 1000 seeds (6 decimals).
    assert_eq!(U256::from(5_000_000_000_000u64), crate_.stalk.raw());
    assert_eq!(U256::from(1_000_000_000u64), crate_.seeds.raw());
    Ok(())
  }

  #[test]
  fn fractional_seed_rate_truncates() -> Result<(), CoreError> {
    let rates = RewardRates {
      stalk_per_bdv: 1,
      seeds_per_bdv: Decimal::new(325, 2),
    };
    let bdv = TokenValue::new(U256::from(1_000_000u64), BDV_DECIMALS);
    assert_eq!(U256::from(3_250_000u64), rates.seeds_grant(&bdv)?.raw());
    Ok(())
  }

  #[test]
  fn grown_stalk_accrues_per_season() -> Result<(), CoreError> {
    // 1000 seeds held for 250 seasons grow 25 stalk.
    let seeds = TokenValue::new(U256::from(1_000_000_000u64), SEED_DECIMALS);
    let grown = grown_stalk(&seeds, 50, 300)?;
    assert_eq!(U256::from(250_000_000_000u64), grown.raw());
    Ok(())
  }

  #[test]
  fn future_stem_is_rejected() {
    let seeds = TokenValue::new(U256::from(1u64), SEED_DECIMALS);
    assert_eq!(
      Err(CoreError::StemAhead {
        stem: 10,
        season: 5
      }),
      grown_stalk(&seeds, 10, 5)
    );
  }
}
