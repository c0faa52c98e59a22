//! Cryptographically secure random generation.
//!
//! Used for content-encryption keys, CBC IVs and GCM nonces.

use rand::Rng;

use crate::cipher::SecretKey;
use crate::keys::KeyError;

/// Generates a cryptographically secure random byte array.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a fresh symmetric key of `bits` bits.
///
/// Every call returns a new key. The key is never cached or reused.
///
/// # Errors
///
/// Returns [`KeyError::InvalidKeySize`] if `bits` is zero or not a multiple of 8.
pub fn generate_secret_key(bits: u32) -> Result<SecretKey, KeyError> {
    if bits == 0 || bits % 8 != 0 {
        return Err(KeyError::InvalidKeySize(bits));
    }
    Ok(SecretKey::from_bytes(random_bytes((bits / 8) as usize)))
}
