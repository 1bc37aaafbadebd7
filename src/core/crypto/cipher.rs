/*!
AEAD implementations for the QSP protocol.

ChaCha20-Poly1305 is always available. AES-256-GCM is built with the
`aes-gcm` feature.
*/

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead as _, KeyInit, Payload},
};

use crate::core::{
    constants::sizes,
    crypto::{
        config::SymmetricAlgorithm,
        traits::{Aead, CryptoResult},
    },
    error::CryptoError,
};

fn check_lengths(key: &[u8], nonce: &[u8], on_bad_nonce: CryptoError) -> CryptoResult<()> {
    if key.len() != sizes::KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength(key.len()));
    }
    if nonce.len() != sizes::NONCE_SIZE {
        return Err(on_bad_nonce);
    }
    Ok(())
}

/// ChaCha20-Poly1305 capability
#[derive(Debug, Default, Clone, Copy)]
pub struct ChaCha20Poly1305Aead;

impl Aead for ChaCha20Poly1305Aead {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        check_lengths(key, nonce, CryptoError::SealFailed)?;
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        cipher
            .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|_e| CryptoError::SealFailed)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        check_lengths(key, nonce, CryptoError::OpenFailed)?;
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
            .map_err(|_e| CryptoError::OpenFailed)
    }

    fn algorithm(&self) -> SymmetricAlgorithm {
        SymmetricAlgorithm::ChaCha20Poly1305
    }
}

/// AES-256-GCM capability
#[cfg(feature = "aes-gcm")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Aes256GcmAead;

#[cfg(feature = "aes-gcm")]
impl Aead for Aes256GcmAead {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        use aes_gcm::{Aes256Gcm, Nonce as AesNonce, aead::{Aead as _, KeyInit as _, Payload as AesPayload}};

        check_lengths(key, nonce, CryptoError::SealFailed)?;
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        cipher
            .encrypt(AesNonce::from_slice(nonce), AesPayload { msg: plaintext, aad })
            .map_err(|_e| CryptoError::SealFailed)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        use aes_gcm::{Aes256Gcm, Nonce as AesNonce, aead::{Aead as _, KeyInit as _, Payload as AesPayload}};

        check_lengths(key, nonce, CryptoError::OpenFailed)?;
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        cipher
            .decrypt(AesNonce::from_slice(nonce), AesPayload { msg: ciphertext, aad })
            .map_err(|_e| CryptoError::OpenFailed)
    }

    fn algorithm(&self) -> SymmetricAlgorithm {
        SymmetricAlgorithm::Aes256Gcm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];
    const NONCE: [u8; 12] = [0x01; 12];

    #[test]
    fn test_seal_open() {
        let aead = ChaCha20Poly1305Aead;
        let data = b"This is a test message";

        let sealed = aead.seal(&KEY, &NONCE, b"header", data).unwrap();
        assert_eq!(sealed.len(), data.len() + sizes::TAG_SIZE);

        let opened = aead.open(&KEY, &NONCE, b"header", &sealed).unwrap();
        assert_eq!(&opened[..], data);
    }

    #[test]
    fn test_tampered_ciphertext() {
        let aead = ChaCha20Poly1305Aead;
        let mut sealed = aead.seal(&KEY, &NONCE, b"header", b"payload").unwrap();
        sealed[3] ^= 0xFF;

        assert_eq!(aead.open(&KEY, &NONCE, b"header", &sealed), Err(CryptoError::OpenFailed));
    }

    #[test]
    fn test_tampered_aad() {
        let aead = ChaCha20Poly1305Aead;
        let sealed = aead.seal(&KEY, &NONCE, b"header", b"payload").unwrap();

        assert_eq!(aead.open(&KEY, &NONCE, b"HEADER", &sealed), Err(CryptoError::OpenFailed));
    }

    #[test]
    fn test_wrong_key() {
        let aead = ChaCha20Poly1305Aead;
        let sealed = aead.seal(&KEY, &NONCE, b"", b"payload").unwrap();

        assert_eq!(aead.open(&[0x43; 32], &NONCE, b"", &sealed), Err(CryptoError::OpenFailed));
    }

    #[test]
    fn test_invalid_key_length() {
        let aead = ChaCha20Poly1305Aead;
        assert_eq!(aead.seal(&[], &NONCE, b"", b"x"), Err(CryptoError::InvalidKeyLength(0)));
        assert_eq!(aead.open(&[1u8; 16], &NONCE, b"", b"x"), Err(CryptoError::InvalidKeyLength(16)));
    }

    #[cfg(feature = "aes-gcm")]
    #[test]
    fn test_aes_gcm_seal_open() {
        let aead = Aes256GcmAead;
        let sealed = aead.seal(&KEY, &NONCE, b"aad", b"payload").unwrap();
        assert_eq!(aead.open(&KEY, &NONCE, b"aad", &sealed).unwrap(), b"payload");
        assert_eq!(aead.open(&KEY, &NONCE, b"xxx", &sealed), Err(CryptoError::OpenFailed));
    }
}
