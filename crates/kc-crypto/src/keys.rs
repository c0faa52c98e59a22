//! Key material for SAML signing and encryption.
//!
//! - [`SigningKeyPair`]: RSA or ECDSA private key used for XML signatures and
//!   redirect-binding query signatures
//! - [`Certificate`]: X.509 certificate embedded in signature `KeyInfo`
//! - [`EncryptionPublicKey`]: a service provider's RSA key used to wrap
//!   content-encryption keys
//!
//! All three are read-only after construction and can be shared across threads.

use std::fmt;

use aws_lc_rs::{
    rsa::PublicEncryptingKey,
    signature::{
        EcdsaKeyPair, KeyPair, RsaKeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
        ECDSA_P384_SHA384_FIXED_SIGNING, ECDSA_P521_SHA512_FIXED_SIGNING,
    },
};
use base64::Engine;
use rsa::{
    pkcs1::DecodeRsaPrivateKey, pkcs1v15, pkcs8::DecodePrivateKey, RsaPrivateKey,
};
use sha1::Sha1;
use thiserror::Error;

use crate::algorithm::{EllipticCurve, KeyType};

/// Error type for key loading.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The private or public key could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The PEM envelope is missing or malformed.
    #[error("invalid PEM: expected a {0} block")]
    Pem(String),

    /// The requested key size cannot be generated.
    #[error("invalid key size: {0} bits")]
    InvalidKeySize(u32),
}

pub(crate) enum PrivateKey {
    /// aws-lc-rs has no SHA-1 PKCS#1 v1.5 signing encoding, so `rsa-sha1`
    /// signatures go through `legacy`.
    Rsa {
        key_pair: RsaKeyPair,
        legacy: pkcs1v15::SigningKey<Sha1>,
    },
    Ec {
        curve: EllipticCurve,
        key_pair: EcdsaKeyPair,
    },
}

/// An asymmetric signing key pair.
pub struct SigningKeyPair {
    private_key: PrivateKey,
    public_key: Vec<u8>,
}

impl SigningKeyPair {
    /// Loads a key pair from a PKCS#8 DER-encoded private key.
    ///
    /// RSA keys and EC keys on P-256, P-384 and P-521 are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a supported RSA or EC key.
    pub fn from_pkcs8(pkcs8_der: &[u8]) -> Result<Self, KeyError> {
        if let Ok(key_pair) = RsaKeyPair::from_pkcs8(pkcs8_der) {
            let legacy = RsaPrivateKey::from_pkcs8_der(pkcs8_der)
                .map_err(|e| KeyError::InvalidKey(format!("invalid RSA PKCS#8 key: {e}")))?;
            return Ok(Self::rsa(key_pair, legacy));
        }

        let curves = [
            (EllipticCurve::P256, &ECDSA_P256_SHA256_FIXED_SIGNING),
            (EllipticCurve::P384, &ECDSA_P384_SHA384_FIXED_SIGNING),
            (EllipticCurve::P521, &ECDSA_P521_SHA512_FIXED_SIGNING),
        ];
        for (curve, alg) in curves {
            if let Ok(key_pair) = EcdsaKeyPair::from_pkcs8(alg, pkcs8_der) {
                let public_key = key_pair.public_key().as_ref().to_vec();
                return Ok(Self {
                    private_key: PrivateKey::Ec { curve, key_pair },
                    public_key,
                });
            }
        }

        Err(KeyError::InvalidKey(
            "PKCS#8 key is neither RSA nor a supported EC key".to_string(),
        ))
    }

    /// Loads an RSA key pair from a PKCS#1 DER-encoded `RSAPrivateKey`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be parsed.
    pub fn from_rsa_der(der: &[u8]) -> Result<Self, KeyError> {
        let key_pair = RsaKeyPair::from_der(der)
            .map_err(|e| KeyError::InvalidKey(format!("invalid RSA DER key: {e}")))?;
        let legacy = RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| KeyError::InvalidKey(format!("invalid RSA DER key: {e}")))?;
        Ok(Self::rsa(key_pair, legacy))
    }

    /// Loads a key pair from PEM (`PRIVATE KEY` or `RSA PRIVATE KEY`).
    ///
    /// # Errors
    ///
    /// Returns an error if no supported PEM block is present or the key is invalid.
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        if let Some(der) = pem_to_der(pem, "PRIVATE KEY") {
            return Self::from_pkcs8(&der);
        }
        if let Some(der) = pem_to_der(pem, "RSA PRIVATE KEY") {
            return Self::from_rsa_der(&der);
        }
        Err(KeyError::Pem("PRIVATE KEY or RSA PRIVATE KEY".to_string()))
    }

    fn rsa(key_pair: RsaKeyPair, legacy: RsaPrivateKey) -> Self {
        let public_key = key_pair.public_key().as_ref().to_vec();
        Self {
            private_key: PrivateKey::Rsa {
                key_pair,
                legacy: pkcs1v15::SigningKey::new(legacy),
            },
            public_key,
        }
    }

    /// Returns the key family.
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match &self.private_key {
            PrivateKey::Rsa { .. } => KeyType::Rsa,
            PrivateKey::Ec { curve, .. } => KeyType::Ec(*curve),
        }
    }

    /// Returns the public key bytes.
    ///
    /// A DER `RSAPublicKey` for RSA keys, an uncompressed point for EC keys.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("key_type", &self.key_type())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// An X.509 certificate in DER form.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Creates a certificate from DER bytes, validating the structure.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a parseable X.509 certificate.
    pub fn from_der(der: Vec<u8>) -> Result<Self, KeyError> {
        parse_certificate(&der)?;
        Ok(Self { der })
    }

    /// Creates a certificate from a PEM `CERTIFICATE` block.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM block is missing or the certificate is invalid.
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let der = pem_to_der(pem, "CERTIFICATE")
            .ok_or_else(|| KeyError::Pem("CERTIFICATE".to_string()))?;
        Self::from_der(der)
    }

    /// Returns the DER bytes.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the DER bytes base64-encoded, as embedded in `ds:X509Certificate`.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.der)
    }

    /// Returns the certificate's `SubjectPublicKeyInfo` in DER form.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be parsed.
    pub fn subject_public_key_info(&self) -> Result<Vec<u8>, KeyError> {
        use x509_parser::prelude::*;

        let (_, cert) = X509Certificate::from_der(&self.der)
            .map_err(|e| KeyError::InvalidCertificate(format!("failed to parse certificate: {e}")))?;
        Ok(cert.public_key().raw.to_vec())
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("der_len", &self.der.len())
            .finish()
    }
}

fn parse_certificate(der: &[u8]) -> Result<(), KeyError> {
    use x509_parser::prelude::*;

    X509Certificate::from_der(der)
        .map(|_| ())
        .map_err(|e| KeyError::InvalidCertificate(format!("failed to parse certificate: {e}")))
}

/// An RSA public key used to wrap content-encryption keys (RSA-OAEP).
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionPublicKey {
    spki_der: Vec<u8>,
    key_size_bits: usize,
}

impl EncryptionPublicKey {
    /// Creates a key from a DER `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not an RSA public key.
    pub fn from_der(spki_der: Vec<u8>) -> Result<Self, KeyError> {
        let key = PublicEncryptingKey::from_der(&spki_der)
            .map_err(|e| KeyError::InvalidKey(format!("invalid RSA public key: {e}")))?;
        Ok(Self {
            key_size_bits: key.key_size_bits(),
            spki_der,
        })
    }

    /// Creates a key from a PEM `PUBLIC KEY` block.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM block is missing or the key is invalid.
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let der = pem_to_der(pem, "PUBLIC KEY")
            .ok_or_else(|| KeyError::Pem("PUBLIC KEY".to_string()))?;
        Self::from_der(der)
    }

    /// Extracts the encryption key from a service provider certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate does not carry an RSA key.
    pub fn from_certificate(certificate: &Certificate) -> Result<Self, KeyError> {
        Self::from_der(certificate.subject_public_key_info()?)
    }

    /// Returns the DER `SubjectPublicKeyInfo`.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Returns the modulus size in bits.
    #[must_use]
    pub const fn key_size_bits(&self) -> usize {
        self.key_size_bits
    }
}

impl fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionPublicKey")
            .field("key_size_bits", &self.key_size_bits)
            .finish()
    }
}

/// Extracts DER data from a PEM string.
#[must_use]
pub fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem.find(&begin)? + begin.len();
    let end_pos = pem[start..].find(&end)? + start;

    let b64_data: String = pem[start..end_pos]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD.decode(&b64_data).ok()
}
