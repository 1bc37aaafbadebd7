/*!
Key material that is wiped when it is cleared or dropped.

Session traffic keys live in `zeroize::Zeroizing` buffers. `clear()` wipes
them immediately with non-elidable writes; dropping the holder wipes them
again, so every exit path leaves no key bytes behind.
*/

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

/// A single secret buffer
pub type SecretBytes = Zeroizing<Vec<u8>>;

/// Per-direction traffic keys of one session
#[derive(Clone, Default)]
pub struct SessionKeys {
    /// Key for frames this endpoint seals
    tx: SecretBytes,
    /// Key for frames this endpoint opens
    rx: SecretBytes,
}

impl SessionKeys {
    /// Keys that have not been derived yet
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap freshly derived keys
    pub fn new(tx: SecretBytes, rx: SecretBytes) -> Self {
        Self { tx, rx }
    }

    /// Transmit key
    pub fn tx(&self) -> &[u8] {
        &self.tx
    }

    /// Receive key
    pub fn rx(&self) -> &[u8] {
        &self.rx
    }

    /// Whether no key material is held
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty() && self.rx.is_empty()
    }

    /// Replace both keys, wiping the previous ones first
    pub fn replace(&mut self, next: SessionKeys) {
        self.clear();
        *self = next;
    }

    /// Wipe both keys now
    pub fn clear(&mut self) {
        self.tx.zeroize();
        self.rx.zeroize();
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("tx", &format_args!("[{} bytes]", self.tx.len()))
            .field("rx", &format_args!("[{} bytes]", self.rx.len()))
            .finish()
    }
}
