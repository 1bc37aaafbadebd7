/*!
HKDF-SHA256 key derivation.
*/

use hkdf::Hkdf;
use sha2::Sha256;

use crate::core::{
    constants::HKDF_SALT,
    crypto::traits::{CryptoResult, Kdf},
    error::CryptoError,
};

/// HKDF-SHA256 with the protocol salt
#[derive(Debug, Default, Clone, Copy)]
pub struct HkdfSha256;

impl Kdf for HkdfSha256 {
    fn derive(&self, secret: &[u8], context: &[u8], out: &mut [u8]) -> CryptoResult<()> {
        let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret);
        hkdf.expand(context, out)
            .map_err(|_e| CryptoError::KeyDerivationFailed)
    }
}
