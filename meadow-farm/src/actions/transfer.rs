use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use meadow_core::token::{Token, TokenValue};

use crate::call::{FarmCall, FarmFromMode, FarmToMode};
use crate::client::FarmClient;
use crate::clipboard::{Clipboard, Paste};
use crate::context::RunContext;
use crate::error::FarmError;
use crate::step::{Step, StepGenerator};

/// Argument slot of `amount` in the transfer call, for clipboard pastes.
const AMOUNT_SLOT: usize = 2;

/// Moves tokens between balances, passing the running amount through.
///
/// When `copy_amount_from` names the immediately preceding step, the
/// transfer amount is pasted from that step's return data on-chain instead
/// of being fixed at build time, so the transfer moves exactly what the
/// previous call produced. In every other case the literal amount is
/// encoded; the paste is an optimization, not a requirement.
pub struct TransferToken {
  client: Arc<dyn FarmClient>,
  token: Token,
  recipient: Address,
  from_mode: FarmFromMode,
  to_mode: FarmToMode,
  copy_amount_from: Option<String>,
}

impl TransferToken {
  #[must_use]
  pub fn new(
    client: Arc<dyn FarmClient>,
    token: Token,
    recipient: Address,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
  ) -> TransferToken {
    TransferToken {
      client,
      token,
      recipient,
      from_mode,
      to_mode,
      copy_amount_from: None,
    }
  }

  /// Pastes the transfer amount from the tagged step's output when that
  /// step directly precedes this one.
  #[must_use]
  pub fn copy_amount_from(mut self, tag: &str) -> TransferToken {
    self.copy_amount_from = Some(tag.to_string());
    self
  }
}

#[async_trait]
impl StepGenerator for TransferToken {
  fn name(&self) -> &str {
    "transferToken"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    context: &RunContext,
  ) -> Result<Step, FarmError> {
    // Wire the clipboard only when the source step is adjacent; a gap means
    // its return slot layout is not what this step was written against.
    let paste_index = self
      .copy_amount_from
      .as_deref()
      .and_then(|tag| context.tag(tag))
      .filter(|index| index + 1 == context.current_index());

    let client = Arc::clone(&self.client);
    let token = self.token.address;
    let recipient = self.recipient;
    let from_mode = self.from_mode;
    let to_mode = self.to_mode;
    let amount = amount_in.clone();
    Ok(Step::new(
      "transferToken",
      amount_in,
      Box::new(move |_context: &RunContext| {
        let (encoded_amount, clipboard) = match paste_index {
          Some(index) => (
            U256::ZERO,
            Clipboard::paste(Paste::slot(index, 0, AMOUNT_SLOT)),
          ),
          None => (amount.raw(), Clipboard::none()),
        };
        let call_data = client.encode_transfer_token(
          token,
          recipient,
          encoded_amount,
          from_mode,
          to_mode,
        );
        Ok(
          FarmCall::new(client.farm_address(), call_data)
            .with_clipboard(clipboard),
        )
      }),
    ))
  }
}
