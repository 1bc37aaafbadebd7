/*!
Cryptographic algorithm configuration for the QSP protocol.

This module selects the AEAD capability a session seals and opens frames
with, allowing the cipher to be chosen at runtime.
*/

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{
    crypto::{
        cipher::ChaCha20Poly1305Aead,
        kdf::HkdfSha256,
        traits::{Aead, Kdf},
    },
    error::Result,
};

/// Supported Symmetric Encryption Algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SymmetricAlgorithm {
    /// ChaCha20-Poly1305
    #[default]
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
    /// AES-256-GCM - hardware acceleration on many platforms
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl SymmetricAlgorithm {
    /// Get the name of the algorithm as a string
    pub fn name(self) -> &'static str {
        match self {
            SymmetricAlgorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            SymmetricAlgorithm::Aes256Gcm => "AES-256-GCM",
        }
    }

    /// Whether this build can provide the algorithm
    pub fn is_available(self) -> bool {
        match self {
            SymmetricAlgorithm::ChaCha20Poly1305 => true,
            SymmetricAlgorithm::Aes256Gcm => cfg!(feature = "aes-gcm"),
        }
    }

    /// Instantiate the AEAD capability
    pub fn aead(self) -> Result<Arc<dyn Aead>> {
        match self {
            SymmetricAlgorithm::ChaCha20Poly1305 => Ok(Arc::new(ChaCha20Poly1305Aead)),
            SymmetricAlgorithm::Aes256Gcm => {
                #[cfg(feature = "aes-gcm")]
                {
                    Ok(Arc::new(crate::core::crypto::cipher::Aes256GcmAead))
                }
                #[cfg(not(feature = "aes-gcm"))]
                {
                    Err(crate::core::error::Error::InvalidInput(
                        "AES-256-GCM is not available, enable the 'aes-gcm' feature".into(),
                    ))
                }
            }
        }
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pair of capabilities a session is built with
#[derive(Clone)]
pub struct CryptoSuite {
    /// Frame AEAD
    pub aead: Arc<dyn Aead>,
    /// Traffic key derivation
    pub kdf: Arc<dyn Kdf>,
}

impl CryptoSuite {
    /// Suite for the given symmetric algorithm with HKDF-SHA256
    pub fn new(symmetric: SymmetricAlgorithm) -> Result<Self> {
        Ok(Self {
            aead: symmetric.aead()?,
            kdf: Arc::new(HkdfSha256),
        })
    }

    /// Suite from caller-supplied capabilities
    pub fn with_capabilities(aead: Arc<dyn Aead>, kdf: Arc<dyn Kdf>) -> Self {
        Self { aead, kdf }
    }
}

impl Default for CryptoSuite {
    fn default() -> Self {
        Self {
            aead: Arc::new(ChaCha20Poly1305Aead),
            kdf: Arc::new(HkdfSha256),
        }
    }
}

impl fmt::Debug for CryptoSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoSuite")
            .field("aead", &self.aead.algorithm())
            .finish_non_exhaustive()
    }
}
