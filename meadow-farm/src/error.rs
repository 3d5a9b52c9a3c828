use meadow_core::error::CoreError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FarmError {
  /// Invalid static configuration caught while assembling a workflow.
  #[error("invalid workflow configuration: {0}")]
  Build(String),
  #[error("tag does not exist: {0}")]
  TagNotFound(String),
  #[error("tag already exists: {0}")]
  DuplicateTag(String),
  /// A clipboard paste pointed at a step that does not execute strictly
  /// before the referring call.
  #[error(
    "step {step} (index {from}) pastes from step {to}, \
     which does not execute before it"
  )]
  ForwardReference {
    step: String,
    from: usize,
    to: usize,
  },
  /// The step has no closed-form inverse and cannot take part in a
  /// reversed estimate.
  #[error("step {step} cannot be estimated in reverse")]
  UnsupportedDirection { step: String },
  #[error("slippage tolerance required but not provided")]
  SlippageMissing,
  /// An on-chain quote lookup failed inside a step generator. Not retried
  /// here; the caller decides whether to re-quote.
  #[error("quote failed in step {step}")]
  Quote {
    step: String,
    #[source]
    source: anyhow::Error,
  },
  #[error("farm submission failed")]
  Submit(#[source] anyhow::Error),
  #[error(transparent)]
  Core(#[from] CoreError),
}
