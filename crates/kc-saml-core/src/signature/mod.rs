//! XML Signature support for SAML.
//!
//! [`SignatureAlgorithm`] is the registry of signature algorithms a client can
//! be configured with. Each entry pairs the XML-DSig `SignatureMethod` URI
//! with its default `DigestMethod` URI and the signing primitive that backs
//! it. [`XmlSigner`] applies an enveloped signature to a document.
//!
//! # Signing Algorithms
//!
//! - RSA-SHA1 (default, for peers that predate SHA-2 support)
//! - RSA-SHA256, RSA-SHA384, RSA-SHA512
//! - ECDSA-SHA256, ECDSA-SHA384, ECDSA-SHA512
//! - DSA-SHA1 (recognised by name and URI; no signing backend)

mod signer;

pub use signer::XmlSigner;

pub use crate::xml::CanonicalizationMethod;

use std::fmt;
use std::str::FromStr;

use kc_crypto::{HashAlgorithm, Signer, SigningKeyPair, SigningScheme};
use serde::{Deserialize, Serialize};

use crate::constants::{digest_algorithms, signature_algorithms};
use crate::error::{BindingError, BindingResult};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-1.
    #[default]
    #[serde(rename = "RSA_SHA1")]
    RsaSha1,
    /// RSA with SHA-256.
    #[serde(rename = "RSA_SHA256")]
    RsaSha256,
    /// RSA with SHA-384.
    #[serde(rename = "RSA_SHA384")]
    RsaSha384,
    /// RSA with SHA-512.
    #[serde(rename = "RSA_SHA512")]
    RsaSha512,
    /// DSA with SHA-1.
    #[serde(rename = "DSA_SHA1")]
    DsaSha1,
    /// ECDSA with SHA-256.
    #[serde(rename = "ECDSA_SHA256")]
    EcdsaSha256,
    /// ECDSA with SHA-384.
    #[serde(rename = "ECDSA_SHA384")]
    EcdsaSha384,
    /// ECDSA with SHA-512.
    #[serde(rename = "ECDSA_SHA512")]
    EcdsaSha512,
}

/// One registry entry.
#[derive(Debug)]
pub struct SignatureAlgorithmSpec {
    /// The algorithm this entry describes.
    pub algorithm: SignatureAlgorithm,
    /// Registry name, e.g. `RSA_SHA256`.
    pub name: &'static str,
    /// XML-DSig `SignatureMethod` URI, also used as the redirect `SigAlg`.
    pub signature_method_uri: &'static str,
    /// Default XML-DSig `DigestMethod` URI.
    pub digest_method_uri: &'static str,
    /// Default digest.
    pub digest: HashAlgorithm,
    scheme: Option<SigningScheme>,
}

// Indexed by discriminant.
static REGISTRY: [SignatureAlgorithmSpec; 8] = [
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::RsaSha1,
        name: "RSA_SHA1",
        signature_method_uri: signature_algorithms::RSA_SHA1,
        digest_method_uri: digest_algorithms::SHA1,
        digest: HashAlgorithm::Sha1,
        scheme: Some(SigningScheme::RsaPkcs1Sha1),
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::RsaSha256,
        name: "RSA_SHA256",
        signature_method_uri: signature_algorithms::RSA_SHA256,
        digest_method_uri: digest_algorithms::SHA256,
        digest: HashAlgorithm::Sha256,
        scheme: Some(SigningScheme::RsaPkcs1Sha256),
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::RsaSha384,
        name: "RSA_SHA384",
        signature_method_uri: signature_algorithms::RSA_SHA384,
        digest_method_uri: digest_algorithms::SHA384,
        digest: HashAlgorithm::Sha384,
        scheme: Some(SigningScheme::RsaPkcs1Sha384),
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::RsaSha512,
        name: "RSA_SHA512",
        signature_method_uri: signature_algorithms::RSA_SHA512,
        digest_method_uri: digest_algorithms::SHA512,
        digest: HashAlgorithm::Sha512,
        scheme: Some(SigningScheme::RsaPkcs1Sha512),
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::DsaSha1,
        name: "DSA_SHA1",
        signature_method_uri: signature_algorithms::DSA_SHA1,
        digest_method_uri: digest_algorithms::SHA1,
        digest: HashAlgorithm::Sha1,
        scheme: None,
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::EcdsaSha256,
        name: "ECDSA_SHA256",
        signature_method_uri: signature_algorithms::ECDSA_SHA256,
        digest_method_uri: digest_algorithms::SHA256,
        digest: HashAlgorithm::Sha256,
        scheme: Some(SigningScheme::EcdsaP256Sha256),
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::EcdsaSha384,
        name: "ECDSA_SHA384",
        signature_method_uri: signature_algorithms::ECDSA_SHA384,
        digest_method_uri: digest_algorithms::SHA384,
        digest: HashAlgorithm::Sha384,
        scheme: Some(SigningScheme::EcdsaP384Sha384),
    },
    SignatureAlgorithmSpec {
        algorithm: SignatureAlgorithm::EcdsaSha512,
        name: "ECDSA_SHA512",
        signature_method_uri: signature_algorithms::ECDSA_SHA512,
        digest_method_uri: digest_algorithms::SHA512,
        digest: HashAlgorithm::Sha512,
        scheme: Some(SigningScheme::EcdsaP521Sha512),
    },
];

impl SignatureAlgorithm {
    /// Every registered algorithm.
    pub const ALL: [Self; 8] = [
        Self::RsaSha1,
        Self::RsaSha256,
        Self::RsaSha384,
        Self::RsaSha512,
        Self::DsaSha1,
        Self::EcdsaSha256,
        Self::EcdsaSha384,
        Self::EcdsaSha512,
    ];

    /// Returns the registry entry.
    #[must_use]
    pub fn spec(self) -> &'static SignatureAlgorithmSpec {
        &REGISTRY[self as usize]
    }

    /// Returns the registry name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Returns the `SignatureMethod` URI.
    #[must_use]
    pub fn signature_method_uri(self) -> &'static str {
        self.spec().signature_method_uri
    }

    /// Returns the default `DigestMethod` URI.
    #[must_use]
    pub fn digest_method_uri(self) -> &'static str {
        self.spec().digest_method_uri
    }

    /// Returns the default digest.
    #[must_use]
    pub fn digest_algorithm(self) -> HashAlgorithm {
        self.spec().digest
    }

    /// Returns true if the algorithm hashes with SHA-1.
    #[must_use]
    pub fn is_legacy(self) -> bool {
        self.spec().digest.is_legacy()
    }

    /// Looks an algorithm up by registry name (`RSA_SHA256`).
    ///
    /// ## Errors
    ///
    /// Returns [`BindingError::Configuration`] for unknown names.
    pub fn from_name(name: &str) -> BindingResult<Self> {
        REGISTRY
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
            .map(|spec| spec.algorithm)
            .ok_or_else(|| BindingError::Configuration(format!("unknown signature algorithm: {name}")))
    }

    /// Looks an algorithm up by `SignatureMethod` URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|spec| spec.signature_method_uri == uri)
            .map(|spec| spec.algorithm)
    }

    /// Creates the signing primitive for this algorithm over `key`.
    ///
    /// ## Errors
    ///
    /// Returns [`BindingError::Configuration`] if the algorithm has no signing
    /// backend or `key` is the wrong type for it.
    pub fn new_signer(self, key: &SigningKeyPair) -> BindingResult<Signer<'_>> {
        let scheme = self.spec().scheme.ok_or_else(|| {
            BindingError::Configuration(format!("{} has no signing implementation", self.name()))
        })?;
        Signer::new(key, scheme).map_err(|e| {
            BindingError::Configuration(format!("{} cannot sign with this key: {e}", self.name()))
        })
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Returns the `DigestMethod` URI for a digest.
#[must_use]
pub const fn digest_method_uri(digest: HashAlgorithm) -> &'static str {
    match digest {
        HashAlgorithm::Sha1 => digest_algorithms::SHA1,
        HashAlgorithm::Sha256 => digest_algorithms::SHA256,
        HashAlgorithm::Sha384 => digest_algorithms::SHA384,
        HashAlgorithm::Sha512 => digest_algorithms::SHA512,
    }
}
