pub use meadow_core::crates::DepositCrate;
pub use meadow_core::registry::{self, ProtocolAddresses, SiloToken};
pub use meadow_core::select::{CrateSelection, SortDirection};
pub use meadow_core::token::{Token, TokenValue};
pub use meadow_farm::prelude::{
  ExecuteOptions, FarmClient, FarmError, FarmFromMode, FarmToMode,
  FarmWorkflow, StepInput, StepOptions,
};

pub use crate::balance::TokenSiloBalance;
pub use crate::claim::ClaimFarmStep;
pub use crate::convert::ConvertFarmStep;
pub use crate::enroot::EnrootFarmStep;
pub use crate::quote_guard::QuoteGuard;
pub use crate::withdraw::WithdrawFarmStep;
