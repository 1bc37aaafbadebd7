/*!
Nonce generation for outbound frames.

Each nonce is a 4-byte random prefix followed by an 8-byte big-endian
counter. The prefix is redrawn and the counter restarted whenever the keys
change, so a nonce never repeats under one key.
*/

use rand::RngCore;

use crate::core::{constants::sizes, error::CryptoError};

/// Per-key nonce source
#[derive(Debug, Clone)]
pub struct NonceSequence {
    prefix: [u8; 4],
    counter: u64,
}

impl NonceSequence {
    /// Create a sequence with a fresh random prefix
    pub fn new() -> Self {
        let mut prefix = [0u8; 4];
        rand::rng().fill_bytes(&mut prefix);
        Self { prefix, counter: 0 }
    }

    /// Restart for a new key
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Next unused nonce
    pub fn next_nonce(&mut self) -> Result<[u8; sizes::NONCE_SIZE], CryptoError> {
        if self.counter == u64::MAX {
            return Err(CryptoError::NonceExhausted);
        }
        let mut nonce = [0u8; sizes::NONCE_SIZE];
        nonce[..4].copy_from_slice(&self.prefix);
        nonce[4..].copy_from_slice(&self.counter.to_be_bytes());
        self.counter += 1;
        Ok(nonce)
    }

    /// Number of nonces issued under the current key
    pub fn issued(&self) -> u64 {
        self.counter
    }
}

impl Default for NonceSequence {
    fn default() -> Self {
        Self::new()
    }
}
