//! A holder's silo position in one token, assembled from deposit crates.

use meadow_core::crates::{
  grown_stalk, DepositCrate, BDV_DECIMALS, SEED_DECIMALS, STALK_DECIMALS,
};
use meadow_core::error::CoreError;
use meadow_core::registry::SiloToken;
use meadow_core::token::TokenValue;
use serde::{Deserialize, Serialize};

/// The ordered crates of one holder+token pair plus their reported totals.
///
/// The totals are redundant with the crate list on purpose: they mirror the
/// holder's on-chain balances, and [`TokenSiloBalance::verify`] checks that
/// the crates actually account for them before any selection runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSiloBalance {
  pub token: SiloToken,
  pub deposits: Vec<DepositCrate>,
  pub amount: TokenValue,
  pub bdv: TokenValue,
  pub stalk: TokenValue,
  pub seeds: TokenValue,
}

impl TokenSiloBalance {
  /// Builds a balance whose totals are the sums of `deposits`.
  pub fn from_deposits(
    token: SiloToken,
    deposits: Vec<DepositCrate>,
  ) -> Result<TokenSiloBalance, CoreError> {
    let mut amount = TokenValue::zero(token.token.decimals);
    let mut bdv = TokenValue::zero(BDV_DECIMALS);
    let mut stalk = TokenValue::zero(STALK_DECIMALS);
    let mut seeds = TokenValue::zero(SEED_DECIMALS);
    for deposit in &deposits {
      amount = amount.checked_add(&deposit.amount)?;
      bdv = bdv.checked_add(&deposit.bdv)?;
      stalk = stalk.checked_add(&deposit.stalk)?;
      seeds = seeds.checked_add(&deposit.seeds)?;
    }
    Ok(TokenSiloBalance {
      token,
      deposits,
      amount,
      bdv,
      stalk,
      seeds,
    })
  }

  /// Checks that the reported totals equal the sums over the crate list.
  pub fn verify(&self) -> Result<(), CoreError> {
    let computed =
      TokenSiloBalance::from_deposits(self.token.clone(), self.deposits.clone())?;
    let consistent = computed.amount == self.amount
      && computed.bdv == self.bdv
      && computed.stalk == self.stalk
      && computed.seeds == self.seeds;
    if consistent {
      Ok(())
    } else {
      Err(CoreError::BalanceMismatch)
    }
  }

  /// Stalk grown across all crates since their deposits, not yet settled.
  pub fn grown_stalk(
    &self,
    current_season: i64,
  ) -> Result<TokenValue, CoreError> {
    let mut total = TokenValue::zero(STALK_DECIMALS);
    for deposit in &self.deposits {
      let grown = grown_stalk(&deposit.seeds, deposit.stem, current_season)?;
      total = total.checked_add(&grown)?;
    }
    Ok(total)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use alloy_primitives::U256;
  use meadow_core::crates::RewardRates;
  use meadow_core::registry;

  fn crate_of(stem: i64, amount: u64) -> DepositCrate {
    let rates = RewardRates {
      stalk_per_bdv: 1,
      seeds_per_bdv: rust_decimal::Decimal::from(2u8),
    };
    DepositCrate::from_deposit(
      stem,
      TokenValue::new(U256::from(amount), 6),
      TokenValue::new(U256::from(amount), BDV_DECIMALS),
      &rates,
    )
    .expect("crate")
  }

  #[test]
  fn totals_sum_the_crates() -> Result<(), CoreError> {
    let balance = TokenSiloBalance::from_deposits(
      registry::mead(),
      vec![crate_of(1, 5_000_000), crate_of(2, 10_000_000)],
    )?;
    assert_eq!(U256::from(15_000_000u64), balance.amount.raw());
    assert_eq!(U256::from(30_000_000u64), balance.seeds.raw());
    balance.verify()
  }

  #[test]
  fn tampered_totals_fail_verification() -> Result<(), CoreError> {
    let mut balance = TokenSiloBalance::from_deposits(
      registry::mead(),
      vec![crate_of(1, 5_000_000)],
    )?;
    balance.amount = TokenValue::new(U256::from(1u64), 6);
    assert_eq!(Err(CoreError::BalanceMismatch), balance.verify());
    Ok(())
  }

  #[test]
  fn grown_stalk_spans_all_crates() -> Result<(), CoreError> {
    let balance = TokenSiloBalance::from_deposits(
      registry::mead(),
      vec![crate_of(100, 1_000_000), crate_of(200, 1_000_000)],
    )?;
    // 2 seeds per crate: (200 - 100) + (200 - 200) seasons of growth, at
    // 0.0001 stalk per seed per season.
    let grown = balance.grown_stalk(200)?;
    assert_eq!(U256::from(200_000_000u64), grown.raw());
    Ok(())
  }
}
