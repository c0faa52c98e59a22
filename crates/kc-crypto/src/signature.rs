//! Digital signature operations.
//!
//! [`Signer`] binds a [`SigningKeyPair`] to a [`SigningScheme`] after checking
//! that the key family matches the scheme, so an RSA key can never be driven
//! through an ECDSA scheme (or the reverse) by a caller-chosen algorithm.

use aws_lc_rs::{
    rand::SystemRandom,
    signature::{self, UnparsedPublicKey, VerificationAlgorithm},
};
use rsa::signature::{SignatureEncoding, Signer as _};
use thiserror::Error;

use crate::algorithm::{KeyType, SigningScheme};
use crate::keys::{PrivateKey, SigningKeyPair};

/// Error type for signature operations.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Verification failed.
    #[error("signature verification failed")]
    Verification,

    /// The key does not fit the requested scheme.
    #[error("{key_type:?} key cannot be used with {scheme:?}")]
    KeyMismatch {
        /// The scheme that was requested.
        scheme: SigningScheme,
        /// The type of the supplied key.
        key_type: KeyType,
    },
}

/// A signing primitive ready to sign with one key and one scheme.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'k> {
    key: &'k SigningKeyPair,
    scheme: SigningScheme,
}

impl<'k> Signer<'k> {
    /// Creates a signer, rejecting keys that do not match the scheme.
    ///
    /// ## Errors
    ///
    /// Returns [`SignatureError::KeyMismatch`] if the key family or curve differs.
    pub fn new(key: &'k SigningKeyPair, scheme: SigningScheme) -> Result<Self, SignatureError> {
        if key.key_type() != scheme.key_type() {
            return Err(SignatureError::KeyMismatch {
                scheme,
                key_type: key.key_type(),
            });
        }
        Ok(Self { key, scheme })
    }

    /// Returns the signing scheme.
    #[must_use]
    pub const fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// Signs the given data.
    ///
    /// ## Errors
    ///
    /// Returns an error if the underlying primitive fails.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let rng = SystemRandom::new();

        match self.key.private_key() {
            PrivateKey::Rsa { legacy, .. } if self.scheme == SigningScheme::RsaPkcs1Sha1 => legacy
                .try_sign(data)
                .map(|sig| sig.to_vec())
                .map_err(|e| SignatureError::Signing(format!("RSA-SHA1 signing failed: {e}"))),
            PrivateKey::Rsa { key_pair, .. } => {
                let padding = match self.scheme {
                    SigningScheme::RsaPkcs1Sha256 => &signature::RSA_PKCS1_SHA256,
                    SigningScheme::RsaPkcs1Sha384 => &signature::RSA_PKCS1_SHA384,
                    SigningScheme::RsaPkcs1Sha512 => &signature::RSA_PKCS1_SHA512,
                    scheme => {
                        return Err(SignatureError::KeyMismatch {
                            scheme,
                            key_type: KeyType::Rsa,
                        })
                    }
                };

                let mut sig = vec![0u8; key_pair.public_modulus_len()];
                key_pair
                    .sign(padding, &rng, data, &mut sig)
                    .map_err(|e| SignatureError::Signing(format!("RSA signing failed: {e}")))?;
                Ok(sig)
            }
            PrivateKey::Ec { key_pair, .. } => {
                // The key pair was loaded with the fixed-encoding algorithm for its
                // curve, and `new` guarantees the scheme uses that same curve.
                let sig = key_pair
                    .sign(&rng, data)
                    .map_err(|e| SignatureError::Signing(format!("ECDSA signing failed: {e}")))?;
                Ok(sig.as_ref().to_vec())
            }
        }
    }
}

/// Verifies a signature against a raw public key.
///
/// `public_key` uses the same encoding as [`SigningKeyPair::public_key`].
///
/// ## Errors
///
/// Returns [`SignatureError::Verification`] if the signature does not verify.
pub fn verify(
    public_key: &[u8],
    scheme: SigningScheme,
    data: &[u8],
    sig: &[u8],
) -> Result<(), SignatureError> {
    let algorithm: &'static dyn VerificationAlgorithm = match scheme {
        SigningScheme::RsaPkcs1Sha1 => &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        SigningScheme::RsaPkcs1Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        SigningScheme::RsaPkcs1Sha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        SigningScheme::RsaPkcs1Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        SigningScheme::EcdsaP256Sha256 => &signature::ECDSA_P256_SHA256_FIXED,
        SigningScheme::EcdsaP384Sha384 => &signature::ECDSA_P384_SHA384_FIXED,
        SigningScheme::EcdsaP521Sha512 => &signature::ECDSA_P521_SHA512_FIXED,
    };

    UnparsedPublicKey::new(algorithm, public_key)
        .verify(data, sig)
        .map_err(|_| SignatureError::Verification)
}
