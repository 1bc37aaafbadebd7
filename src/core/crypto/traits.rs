/*!
Capability traits for the cryptographic primitives the session relies on.

The session never names a concrete cipher or KDF. It calls these traits with
the key, nonce and associated data of each frame.
*/

use crate::core::{constants::sizes, crypto::config::SymmetricAlgorithm, error::CryptoError};

/// Result type for capability calls
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Authenticated encryption with associated data
pub trait Aead: Send + Sync {
    /// Seal `plaintext`, returning ciphertext with the tag appended
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Open `ciphertext`; fails with `OpenFailed` on any tampering
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Get the algorithm being used
    fn algorithm(&self) -> SymmetricAlgorithm;

    /// Bytes `seal` adds to the plaintext
    fn tag_len(&self) -> usize {
        sizes::TAG_SIZE
    }
}

/// Key derivation
pub trait Kdf: Send + Sync {
    /// Fill `out` with key material derived from `secret` bound to `context`
    fn derive(&self, secret: &[u8], context: &[u8], out: &mut [u8]) -> CryptoResult<()>;
}
