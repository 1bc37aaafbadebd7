/*!
Cryptographic components for the QSP protocol.

The session treats the AEAD and the KDF as capabilities behind traits.
This module provides those traits, their RustCrypto-backed implementations,
algorithm selection and per-key nonce sequencing.
*/

// Capability traits
pub mod traits;

// Symmetric encryption
pub mod cipher;

// Key derivation
pub mod kdf;

// Nonce sequencing
pub mod nonce;

// Config
pub mod config;

// Re-export frequently used types
pub use traits::{Aead, Kdf, CryptoResult};
pub use cipher::ChaCha20Poly1305Aead;
#[cfg(feature = "aes-gcm")]
pub use cipher::Aes256GcmAead;
pub use kdf::HkdfSha256;
pub use nonce::NonceSequence;
pub use config::{SymmetricAlgorithm, CryptoSuite};
