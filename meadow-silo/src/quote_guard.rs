//! Cancellation for strategy-level quote fetching.
//!
//! UIs re-quote on every input change; only the most recent request may
//! land. The guard aborts the in-flight quote when a new one starts, and a
//! superseded quote's result is discarded rather than observed late.

use std::future::Future;
use std::sync::Mutex;

use futures::future::{AbortHandle, Abortable, Aborted};

#[derive(Debug, Default)]
pub struct QuoteGuard {
  in_flight: Mutex<Option<AbortHandle>>,
}

impl QuoteGuard {
  #[must_use]
  pub fn new() -> QuoteGuard {
    QuoteGuard::default()
  }

  /// Runs `quote`, cancelling whatever quote this guard was running
  /// before. Returns `None` when this quote was itself superseded before
  /// finishing; its partial result is never surfaced.
  pub async fn latest<F, T>(&self, quote: F) -> Option<T>
  where
    F: Future<Output = T>,
  {
    let (handle, registration) = AbortHandle::new_pair();
    {
      let mut in_flight = match self.in_flight.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
      };
      if let Some(previous) = in_flight.replace(handle) {
        previous.abort();
      }
    }
    match Abortable::new(quote, registration).await {
      Ok(value) => Some(value),
      Err(Aborted) => None,
    }
  }
}
