//! Well-known protocol addresses and the silo whitelist.
//!
//! Defaults target mainnet; binaries can deserialize an override from JSON
//! for forks and test networks.

use alloy_primitives::{address, Address};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::crates::RewardRates;
use crate::token::Token;

/// Deployed addresses of the protocol's entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAddresses {
  /// The farm diamond: multicall entry point and silo facets.
  pub farm: Address,
  /// The pipeline helper contract used as an intermediate call target.
  pub pipeline: Address,
  /// The MEAD:WETH constant-function well.
  pub mead_weth_well: Address,
}

impl Default for ProtocolAddresses {
  fn default() -> ProtocolAddresses {
    ProtocolAddresses {
      farm: address!("c0283f5ede4f12f1a66d1e1a10af91ce7a268547"),
      pipeline: address!("b1be0001f5a373b69b1e132b420e6d9687155e80"),
      mead_weth_well: address!("bea0e11282e2bb5893bece110cf199501e872bad"),
    }
  }
}

/// A silo-whitelisted token: the token itself plus its deposit reward rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiloToken {
  pub token: Token,
  pub is_lp: bool,
  pub rewards: RewardRates,
}

#[must_use]
pub fn mead() -> SiloToken {
  SiloToken {
    token: Token::new(
      address!("1bea0050e63e05fbb5d8ba2f10cf4800c10f88f3"),
      "MEAD",
      6,
    ),
    is_lp: false,
    rewards: RewardRates {
      stalk_per_bdv: 1,
      seeds_per_bdv: Decimal::from(2u8),
    },
  }
}

#[must_use]
pub fn mead_weth_lp() -> SiloToken {
  SiloToken {
    token: Token::new(
      address!("bea0e11282e2bb5893bece110cf199501e872bad"),
      "MEADWETH",
      18,
    ),
    is_lp: true,
    rewards: RewardRates {
      stalk_per_bdv: 1,
      seeds_per_bdv: Decimal::new(45, 1),
    },
  }
}

#[must_use]
pub fn weth() -> Token {
  Token::new(
    address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
    "WETH",
    18,
  )
}

#[must_use]
pub fn usdc() -> Token {
  Token::new(
    address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
    "USDC",
    6,
  )
}
