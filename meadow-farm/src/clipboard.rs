//! Clipboard encoding: byte-splice references between batched calls.
//!
//! A paste tells the farm to copy a byte range out of an earlier call's
//! return data and splice it into this call's data before execution, so one
//! call can consume another's output without an off-chain round trip. The
//! client only ever writes clipboards; decoding happens on-chain.
//!
//! Wire layout:
//!
//! ```txt
//! [ tag | ether flag | paste words            | ether value ]
//! [ 1B  | 1B         | 0, 1, or 1 + n words   | 0 or 32B    ]
//! ```
//!
//! Tag `0x00` carries no pastes, `0x01` exactly one, `0x02` a count word
//! followed by that many paste words. Each paste word packs three
//! big-endian 80-bit fields (source step, copy offset, paste offset) behind
//! two bytes of padding.

use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// Copy `32` bytes from `copy_byte` of step `copy_step`'s return data into
/// `paste_byte` of this call's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
  pub copy_step: usize,
  pub copy_byte: usize,
  pub paste_byte: usize,
}

impl Paste {
  #[must_use]
  pub fn new(copy_step: usize, copy_byte: usize, paste_byte: usize) -> Paste {
    Paste {
      copy_step,
      copy_byte,
      paste_byte,
    }
  }

  /// Builds a paste addressed in 32-byte ABI word slots rather than raw
  /// bytes: return data is offset by its length word, call data by the
  /// 4-byte selector behind its length word.
  #[must_use]
  pub fn slot(copy_step: usize, copy_slot: usize, paste_slot: usize) -> Paste {
    Paste {
      copy_step,
      copy_byte: 32 + 32 * copy_slot,
      paste_byte: 36 + 32 * paste_slot,
    }
  }
}

/// The clipboard attached to one call: any number of pastes plus an
/// optional ether value forwarded with the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clipboard {
  pub pastes: Vec<Paste>,
  pub ether_value: Option<U256>,
}

impl Clipboard {
  #[must_use]
  pub fn none() -> Clipboard {
    Clipboard::default()
  }

  #[must_use]
  pub fn paste(paste: Paste) -> Clipboard {
    Clipboard {
      pastes: vec![paste],
      ether_value: None,
    }
  }

  #[must_use]
  pub fn with_ether(mut self, value: U256) -> Clipboard {
    self.ether_value = Some(value);
    self
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.pastes.is_empty() && self.ether_value.is_none()
  }

  /// Encodes the clipboard into its on-chain byte layout.
  #[must_use]
  pub fn encode(&self) -> Bytes {
    let mut out: Vec<u8> = Vec::with_capacity(2 + 32 * (self.pastes.len() + 2));
    let tag: u8 = match self.pastes.len() {
      0 => 0x00,
      1 => 0x01,
      _ => 0x02,
    };
    out.push(tag);
    out.push(u8::from(self.ether_value.is_some()));
    if self.pastes.len() > 1 {
      out.extend_from_slice(
        &U256::from(self.pastes.len()).to_be_bytes::<32>(),
      );
    }
    for paste in &self.pastes {
      out.extend_from_slice(&[0u8; 2]);
      write_u80(&mut out, paste.copy_step);
      write_u80(&mut out, paste.copy_byte);
      write_u80(&mut out, paste.paste_byte);
    }
    if let Some(value) = self.ether_value {
      out.extend_from_slice(&value.to_be_bytes::<32>());
    }
    Bytes::from(out)
  }
}

/// Appends a big-endian 80-bit field. `usize` is at most 64 bits, so the
/// top two bytes are always zero.
fn write_u80(out: &mut Vec<u8>, value: usize) {
  out.extend_from_slice(&[0u8; 2]);
  out.extend_from_slice(&(value as u64).to_be_bytes());
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slot_addressing_offsets_prefixes() {
    let paste = Paste::slot(3, 0, 1);
    assert_eq!(3, paste.copy_step);
    assert_eq!(32, paste.copy_byte);
    assert_eq!(68, paste.paste_byte);

    let paste = Paste::slot(1, 2, 11);
    assert_eq!(96, paste.copy_byte);
    assert_eq!(388, paste.paste_byte);
  }

  #[test]
  fn empty_clipboard_is_two_bytes() {
    assert_eq!(vec![0x00, 0x00], Clipboard::none().encode().to_vec());
  }

  #[test]
  fn ether_only_clipboard() {
    let encoded = Clipboard::none().with_ether(U256::from(7u64)).encode();
    assert_eq!(34, encoded.len());
    assert_eq!([0x00, 0x01], encoded[..2]);
    assert_eq!(7, encoded[33]);
  }

  #[test]
  fn single_paste_packs_one_word() {
    let encoded = Clipboard::paste(Paste::slot(2, 0, 1)).encode();
    assert_eq!(2 + 32, encoded.len());
    assert_eq!([0x01, 0x00], encoded[..2]);
    // Three 10-byte fields behind 2 bytes of padding.
    assert_eq!(2, encoded[2 + 2 + 9]);
    assert_eq!(32, encoded[2 + 2 + 10 + 9]);
    assert_eq!(68, encoded[2 + 2 + 20 + 9]);
  }

  #[test]
  fn multi_paste_carries_count_word() {
    let clipboard = Clipboard {
      pastes: vec![Paste::slot(0, 0, 0), Paste::slot(1, 0, 2)],
      ether_value: None,
    };
    let encoded = clipboard.encode();
    assert_eq!(2 + 32 + 64, encoded.len());
    assert_eq!([0x02, 0x00], encoded[..2]);
    assert_eq!(2, encoded[2 + 31]);
  }
}
