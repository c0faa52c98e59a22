//! Cryptographic algorithm definitions.
//!
//! These are the primitive-level identifiers. Protocol-level names (XML-DSig
//! and XML-Enc URIs) are mapped onto them by the SAML crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for algorithm operations.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// Unknown algorithm.
    #[error("unknown algorithm: {0}")]
    Unknown(String),

    /// Key size not supported by the algorithm.
    #[error("key size {bits} bits is not supported by {algorithm}")]
    UnsupportedKeySize {
        /// The algorithm name.
        algorithm: String,
        /// The requested key size.
        bits: u32,
    },
}

/// Hash algorithms used for XML-DSig digests and signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-1 (legacy SAML peers only).
    #[serde(rename = "SHA1")]
    Sha1,

    /// SHA-256.
    #[serde(rename = "SHA256")]
    Sha256,

    /// SHA-384.
    #[serde(rename = "SHA384")]
    Sha384,

    /// SHA-512.
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns the algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Returns true for hashes kept only for interoperability.
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::Sha1)
    }
}

/// Elliptic curves accepted for ECDSA signing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EllipticCurve {
    /// NIST P-256 curve (secp256r1).
    #[serde(rename = "P-256")]
    P256,

    /// NIST P-384 curve (secp384r1).
    #[serde(rename = "P-384")]
    P384,

    /// NIST P-521 curve (secp521r1).
    #[serde(rename = "P-521")]
    P521,
}

impl EllipticCurve {
    /// Returns the curve name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }
}

/// The family of an asymmetric key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// RSA key.
    Rsa,
    /// Elliptic curve key on the given curve.
    Ec(EllipticCurve),
}

/// A concrete signing primitive: key family, padding/encoding and hash.
///
/// ECDSA schemes produce the fixed-width `r || s` encoding that XML-DSig and
/// the SAML redirect binding expect, not ASN.1 DER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningScheme {
    /// RSA PKCS#1 v1.5 with SHA-1.
    RsaPkcs1Sha1,
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaPkcs1Sha256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    RsaPkcs1Sha384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    RsaPkcs1Sha512,
    /// ECDSA on P-256 with SHA-256.
    EcdsaP256Sha256,
    /// ECDSA on P-384 with SHA-384.
    EcdsaP384Sha384,
    /// ECDSA on P-521 with SHA-512.
    EcdsaP521Sha512,
}

impl SigningScheme {
    /// Returns the hash algorithm applied to the message.
    #[must_use]
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaPkcs1Sha1 => HashAlgorithm::Sha1,
            Self::RsaPkcs1Sha256 | Self::EcdsaP256Sha256 => HashAlgorithm::Sha256,
            Self::RsaPkcs1Sha384 | Self::EcdsaP384Sha384 => HashAlgorithm::Sha384,
            Self::RsaPkcs1Sha512 | Self::EcdsaP521Sha512 => HashAlgorithm::Sha512,
        }
    }

    /// Returns the key type this scheme requires.
    #[must_use]
    pub const fn key_type(self) -> KeyType {
        match self {
            Self::RsaPkcs1Sha1 | Self::RsaPkcs1Sha256 | Self::RsaPkcs1Sha384 | Self::RsaPkcs1Sha512 => {
                KeyType::Rsa
            }
            Self::EcdsaP256Sha256 => KeyType::Ec(EllipticCurve::P256),
            Self::EcdsaP384Sha384 => KeyType::Ec(EllipticCurve::P384),
            Self::EcdsaP521Sha512 => KeyType::Ec(EllipticCurve::P521),
        }
    }

    /// Returns whether this is an RSA scheme.
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        matches!(self.key_type(), KeyType::Rsa)
    }

    /// Returns whether this is an ECDSA scheme.
    #[must_use]
    pub const fn is_ecdsa(self) -> bool {
        matches!(self.key_type(), KeyType::Ec(_))
    }
}
