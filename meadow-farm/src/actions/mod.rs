//! The farm action library: one step generator per protocol operation.
//!
//! Every action takes its chain access explicitly as an `Arc<dyn
//! FarmClient>`; nothing here reaches for globals.

mod silo;
mod swap;
mod transfer;
mod wrap;

pub use silo::{
  ClaimWithdrawals, ConvertDeposits, EnrootDeposits, Mow, WithdrawDeposits,
};
pub use swap::WellSwap;
pub use transfer::TransferToken;
pub use wrap::{UnwrapEth, WrapEth};
