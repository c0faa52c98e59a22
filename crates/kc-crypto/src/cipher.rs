//! Content encryption and key transport for XML Encryption.
//!
//! Ciphertext layouts follow XML-Enc: AES-CBC output is `IV || ciphertext`,
//! AES-GCM output is `nonce || ciphertext || tag`.

use std::fmt;

use aws_lc_rs::{
    aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, NONCE_LEN},
    cipher::{
        DecryptionContext, PaddedBlockDecryptingKey, PaddedBlockEncryptingKey, UnboundCipherKey,
        AES_128, AES_256,
    },
    iv::FixedLength,
    rsa::{
        OaepPrivateDecryptingKey, OaepPublicEncryptingKey, PrivateDecryptingKey,
        PublicEncryptingKey, OAEP_SHA1_MGF1SHA1,
    },
};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::algorithm::AlgorithmError;
use crate::keys::EncryptionPublicKey;
use crate::random::random_bytes;

const AES_BLOCK_LEN: usize = 16;

/// Error type for cipher operations.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key does not fit the cipher.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed.
    #[error("decryption failed")]
    Decryption,
}

/// A symmetric key. The bytes are zeroed on drop.
pub struct SecretKey(Zeroizing<Vec<u8>>);

impl SecretKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the key length in bits.
    #[must_use]
    pub fn len_bits(&self) -> usize {
        self.0.len() * 8
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len_bits", &self.len_bits())
            .finish_non_exhaustive()
    }
}

/// Block ciphers for encrypting XML content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCipher {
    /// AES-128 in CBC mode.
    Aes128Cbc,
    /// AES-256 in CBC mode.
    Aes256Cbc,
    /// AES-128 in GCM mode.
    Aes128Gcm,
    /// AES-256 in GCM mode.
    Aes256Gcm,
}

impl ContentCipher {
    /// Resolves a cipher from an algorithm family name and key size.
    ///
    /// `"AES"` selects CBC, `"AES-GCM"` (also `"AES/GCM"`, `"AES_GCM"`) selects GCM.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown families and unsupported key sizes.
    pub fn resolve(algorithm: &str, key_bits: u32) -> Result<Self, AlgorithmError> {
        let gcm = match algorithm.to_ascii_uppercase().as_str() {
            "AES" | "AES-CBC" | "AES/CBC" => false,
            "AES-GCM" | "AES/GCM" | "AES_GCM" => true,
            _ => return Err(AlgorithmError::Unknown(algorithm.to_string())),
        };

        match (gcm, key_bits) {
            (false, 128) => Ok(Self::Aes128Cbc),
            (false, 256) => Ok(Self::Aes256Cbc),
            (true, 128) => Ok(Self::Aes128Gcm),
            (true, 256) => Ok(Self::Aes256Gcm),
            _ => Err(AlgorithmError::UnsupportedKeySize {
                algorithm: algorithm.to_string(),
                bits: key_bits,
            }),
        }
    }

    /// Returns the key size in bits.
    #[must_use]
    pub const fn key_bits(self) -> u32 {
        match self {
            Self::Aes128Cbc | Self::Aes128Gcm => 128,
            Self::Aes256Cbc | Self::Aes256Gcm => 256,
        }
    }

    /// Returns whether this is an authenticated (GCM) mode.
    #[must_use]
    pub const fn is_aead(self) -> bool {
        matches!(self, Self::Aes128Gcm | Self::Aes256Gcm)
    }

    /// Encrypts `plaintext`, generating a fresh IV or nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if the key length does not match the cipher.
    pub fn encrypt(self, key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.check_key(key)?;

        if self.is_aead() {
            let key = self.aead_key(key)?;
            let nonce_bytes = random_bytes(NONCE_LEN);
            let nonce = Nonce::try_assume_unique_for_key(&nonce_bytes)
                .map_err(|e| CipherError::Encryption(format!("invalid nonce: {e}")))?;

            let mut in_out = plaintext.to_vec();
            key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
                .map_err(|e| CipherError::Encryption(format!("AES-GCM sealing failed: {e}")))?;

            let mut output = nonce_bytes;
            output.extend_from_slice(&in_out);
            return Ok(output);
        }

        let encrypting_key = PaddedBlockEncryptingKey::cbc_pkcs7(self.block_key(key)?)
            .map_err(|e| CipherError::InvalidKey(format!("AES-CBC key rejected: {e}")))?;
        let mut in_out = plaintext.to_vec();
        let context = encrypting_key
            .encrypt(&mut in_out)
            .map_err(|e| CipherError::Encryption(format!("AES-CBC encryption failed: {e}")))?;
        let iv: &[u8] = (&context)
            .try_into()
            .map_err(|e| CipherError::Encryption(format!("missing CBC IV: {e}")))?;

        let mut output = iv.to_vec();
        output.extend_from_slice(&in_out);
        Ok(output)
    }

    /// Decrypts data produced by [`ContentCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] if the data is truncated, the padding
    /// is wrong or the GCM tag does not verify.
    pub fn decrypt(self, key: &SecretKey, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.check_key(key)?;

        if self.is_aead() {
            if data.len() < NONCE_LEN {
                return Err(CipherError::Decryption);
            }
            let (nonce_bytes, sealed) = data.split_at(NONCE_LEN);
            let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
                .map_err(|_| CipherError::Decryption)?;
            let key = self.aead_key(key)?;

            let mut in_out = sealed.to_vec();
            let plaintext = key
                .open_in_place(nonce, Aad::empty(), &mut in_out)
                .map_err(|_| CipherError::Decryption)?;
            return Ok(plaintext.to_vec());
        }

        if data.len() < AES_BLOCK_LEN * 2 {
            return Err(CipherError::Decryption);
        }
        let (iv, ciphertext) = data.split_at(AES_BLOCK_LEN);
        let iv: [u8; AES_BLOCK_LEN] = iv.try_into().map_err(|_| CipherError::Decryption)?;

        let decrypting_key = PaddedBlockDecryptingKey::cbc_pkcs7(self.block_key(key)?)
            .map_err(|e| CipherError::InvalidKey(format!("AES-CBC key rejected: {e}")))?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = decrypting_key
            .decrypt(&mut in_out, DecryptionContext::Iv128(FixedLength::from(iv)))
            .map_err(|_| CipherError::Decryption)?;
        Ok(plaintext.to_vec())
    }

    fn check_key(self, key: &SecretKey) -> Result<(), CipherError> {
        if key.len_bits() == self.key_bits() as usize {
            Ok(())
        } else {
            Err(CipherError::InvalidKey(format!(
                "{self:?} needs a {}-bit key, got {} bits",
                self.key_bits(),
                key.len_bits()
            )))
        }
    }

    fn block_key(self, key: &SecretKey) -> Result<UnboundCipherKey, CipherError> {
        let alg = if self.key_bits() == 128 { &AES_128 } else { &AES_256 };
        UnboundCipherKey::new(alg, key.as_bytes())
            .map_err(|e| CipherError::InvalidKey(format!("AES key rejected: {e}")))
    }

    fn aead_key(self, key: &SecretKey) -> Result<LessSafeKey, CipherError> {
        let alg = if self.key_bits() == 128 {
            &aead::AES_128_GCM
        } else {
            &aead::AES_256_GCM
        };
        UnboundKey::new(alg, key.as_bytes())
            .map(LessSafeKey::new)
            .map_err(|e| CipherError::InvalidKey(format!("AES-GCM key rejected: {e}")))
    }
}

/// Wraps a content-encryption key with RSA-OAEP (MGF1 with SHA-1).
///
/// # Errors
///
/// Returns an error if the public key is unusable or the key is too long.
pub fn wrap_key_rsa_oaep(
    public_key: &EncryptionPublicKey,
    key: &SecretKey,
) -> Result<Vec<u8>, CipherError> {
    let public_key = PublicEncryptingKey::from_der(public_key.as_der())
        .map_err(|e| CipherError::InvalidKey(format!("invalid RSA public key: {e}")))?;
    let oaep = OaepPublicEncryptingKey::new(public_key)
        .map_err(|e| CipherError::InvalidKey(format!("RSA-OAEP key rejected: {e}")))?;

    let mut ciphertext = vec![0u8; oaep.ciphertext_size()];
    let wrapped = oaep
        .encrypt(&OAEP_SHA1_MGF1SHA1, key.as_bytes(), &mut ciphertext, None)
        .map_err(|e| CipherError::Encryption(format!("RSA-OAEP wrapping failed: {e}")))?;
    Ok(wrapped.to_vec())
}

/// Unwraps a key produced by [`wrap_key_rsa_oaep`] using a PKCS#8 RSA private key.
///
/// # Errors
///
/// Returns an error if the private key is unusable or the data does not decrypt.
pub fn unwrap_key_rsa_oaep(private_pkcs8_der: &[u8], wrapped: &[u8]) -> Result<SecretKey, CipherError> {
    let private_key = PrivateDecryptingKey::from_pkcs8(private_pkcs8_der)
        .map_err(|e| CipherError::InvalidKey(format!("invalid RSA private key: {e}")))?;
    let oaep = OaepPrivateDecryptingKey::new(private_key)
        .map_err(|e| CipherError::InvalidKey(format!("RSA-OAEP key rejected: {e}")))?;

    let mut plaintext = Zeroizing::new(vec![0u8; oaep.min_output_size()]);
    let key = oaep
        .decrypt(&OAEP_SHA1_MGF1SHA1, wrapped, plaintext.as_mut_slice(), None)
        .map_err(|_| CipherError::Decryption)?;
    Ok(SecretKey::from_bytes(key.to_vec()))
}
