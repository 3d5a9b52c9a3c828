pub use alloy_primitives::{Address, Bytes, U256};
pub use meadow_core::error::CoreError;
pub use meadow_core::token::{Token, TokenValue};

pub use crate::actions::{
  ClaimWithdrawals, ConvertDeposits, EnrootDeposits, Mow, TransferToken,
  UnwrapEth, WellSwap, WithdrawDeposits, WrapEth,
};
pub use crate::call::{FarmBatch, FarmCall, FarmFromMode, FarmToMode, TxHash};
pub use crate::client::{CallEncoder, FarmClient};
pub use crate::clipboard::{Clipboard, Paste};
pub use crate::context::{RunContext, RunData, RunMode};
pub use crate::error::FarmError;
pub use crate::step::{Step, StepGenerator, StepInput, StepOptions};
pub use crate::workflow::{ExecuteOptions, FarmWorkflow, StepResult};
