//! Crate selection: which deposits satisfy a removal, and what it costs.
//!
//! Walks a caller-ordered list of crates until the requested amount is
//! covered, consuming whole crates and a proportional share of the last one.
//! Withdrawals order most-recent-first so the least-matured stalk is
//! forfeited; converts order differently (see the strategy layer), so the
//! walk itself is order-agnostic.

use alloy_primitives::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::crates::{grown_stalk, DepositCrate};
use crate::error::CoreError;
use crate::token::{TokenDelta, TokenValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
  Ascending,
  Descending,
}

/// Orders crates by stem. Descending puts the most recent deposit first.
pub fn sort_crates_by_stem(
  crates: &mut [DepositCrate],
  direction: SortDirection,
) {
  crates.sort_by_key(|c| c.stem);
  if direction == SortDirection::Descending {
    crates.reverse();
  }
}

/// Orders crates by their bdv-per-amount ratio, compared exactly by
/// cross-multiplication.
pub fn sort_crates_by_bdv_ratio(
  crates: &mut [DepositCrate],
  direction: SortDirection,
) {
  crates.sort_by(|a, b| {
    let lhs = U512::from(a.bdv.raw()) * U512::from(b.amount.raw());
    let rhs = U512::from(b.bdv.raw()) * U512::from(a.amount.raw());
    lhs.cmp(&rhs)
  });
  if direction == SortDirection::Descending {
    crates.reverse();
  }
}

/// The share removed from one crate, in positive magnitudes so the values
/// can be used directly as on-chain call arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrateDelta {
  pub stem: i64,
  pub amount: TokenValue,
  pub bdv: TokenValue,
  pub stalk: TokenValue,
  pub seeds: TokenValue,
}

/// The full accounting of a removal: per-crate shares in consumption order
/// plus aggregate deltas, all negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrateSelection {
  pub crates: Vec<CrateDelta>,
  pub delta_amount: TokenDelta,
  pub delta_bdv: TokenDelta,
  pub delta_stalk: TokenDelta,
  pub delta_seeds: TokenDelta,
}

impl CrateSelection {
  #[must_use]
  pub fn stems(&self) -> Vec<i64> {
    self.crates.iter().map(|c| c.stem).collect()
  }

  #[must_use]
  pub fn amounts(&self) -> Vec<U256> {
    self.crates.iter().map(|c| c.amount.raw()).collect()
  }
}

/// Selects crates, in the order given, until `target` is covered.
///
/// Every fully consumed crate contributes its whole amount/bdv/stalk/seeds;
/// the final crate contributes a `take / amount` share of each. The stalk
/// share covers both the stored balance and the stalk its removed seeds have
/// grown since deposit, so the holder's books stay consistent after the
/// removal lands on-chain.
///
/// # Errors
/// - [`CoreError::NoDeposits`] when `crates` is empty
/// - [`CoreError::InsufficientBalance`] when the crates sum to less than
///   `target`; no partial selection is returned
pub fn pick_crates(
  crates: &[DepositCrate],
  target: &TokenValue,
  current_season: i64,
) -> Result<CrateSelection, CoreError> {
  if crates.is_empty() {
    return Err(CoreError::NoDeposits);
  }

  let mut remaining = target.clone();
  let mut picked: Vec<CrateDelta> = Vec::new();
  let mut total_amount = TokenValue::zero(target.decimals());
  let mut total_bdv = TokenValue::zero(crates[0].bdv.decimals());
  let mut total_stalk = TokenValue::zero(crates[0].stalk.decimals());
  let mut total_seeds = TokenValue::zero(crates[0].seeds.decimals());

  for crate_ in crates {
    if remaining.is_zero() {
      break;
    }
    let take = crate_.amount.min(&remaining);
    let share = |whole: &TokenValue| {
      whole.mul_div_floor(take.raw(), crate_.amount.raw())
    };

    let bdv = share(&crate_.bdv)?;
    let seeds = share(&crate_.seeds)?;
    let grown = grown_stalk(&seeds, crate_.stem, current_season)?;
    let stalk = share(&crate_.stalk)?.checked_add(&grown)?;

    total_amount = total_amount.checked_add(&take)?;
    total_bdv = total_bdv.checked_add(&bdv)?;
    total_stalk = total_stalk.checked_add(&stalk)?;
    total_seeds = total_seeds.checked_add(&seeds)?;
    remaining = remaining.checked_sub(&take)?;

    picked.push(CrateDelta {
      stem: crate_.stem,
      amount: take,
      bdv,
      stalk,
      seeds,
    });
  }

  if !remaining.is_zero() {
    return Err(CoreError::InsufficientBalance {
      requested: target.clone(),
      available: total_amount,
    });
  }

  Ok(CrateSelection {
    crates: picked,
    delta_amount: TokenDelta::removal(&total_amount)?,
    delta_bdv: TokenDelta::removal(&total_bdv)?,
    delta_stalk: TokenDelta::removal(&total_stalk)?,
    delta_seeds: TokenDelta::removal(&total_seeds)?,
  })
}
