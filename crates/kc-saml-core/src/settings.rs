//! Per-client binding settings.
//!
//! These are the switches an administrator stores for a SAML client. Key
//! material is not part of the settings; the caller adds it to the
//! [`BindingBuilder`] returned by [`BindingSettings::builder`].

use serde::{Deserialize, Serialize};

use crate::bindings::BindingBuilder;
use crate::error::{BindingError, BindingResult};
use crate::signature::{CanonicalizationMethod, SignatureAlgorithm};

/// Serializable binding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingSettings {
    /// Sign the whole document (POST) or the redirect query string.
    pub sign_documents: bool,
    /// Sign assertions.
    pub sign_assertions: bool,
    /// Signature algorithm by registry name, e.g. `"RSA_SHA256"`.
    pub signature_algorithm: SignatureAlgorithm,
    /// Canonicalization method URI.
    pub canonicalization_method: String,
    /// Encrypt assertions.
    pub encrypt_assertions: bool,
    /// Content encryption algorithm family.
    pub encryption_algorithm: String,
    /// Content encryption key size in bits.
    pub encryption_key_size: u32,
}

impl Default for BindingSettings {
    fn default() -> Self {
        Self {
            sign_documents: false,
            sign_assertions: false,
            signature_algorithm: SignatureAlgorithm::default(),
            canonicalization_method: CanonicalizationMethod::default().uri().to_string(),
            encrypt_assertions: false,
            encryption_algorithm: "AES".to_string(),
            encryption_key_size: 128,
        }
    }
}

impl BindingSettings {
    /// Parses settings from JSON. Missing fields take their defaults.
    ///
    /// ## Errors
    ///
    /// Returns [`BindingError::Configuration`] for malformed JSON or unknown
    /// algorithm names.
    pub fn from_json(json: &str) -> BindingResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BindingError::Configuration(format!("invalid binding settings: {e}")))
    }

    /// Returns a builder with these switches applied.
    ///
    /// ## Errors
    ///
    /// Returns [`BindingError::Configuration`] for an unknown
    /// canonicalization method URI.
    pub fn builder(&self) -> BindingResult<BindingBuilder> {
        let canonicalization = CanonicalizationMethod::from_uri(&self.canonicalization_method)
            .ok_or_else(|| {
                BindingError::Configuration(format!(
                    "unknown canonicalization method: {}",
                    self.canonicalization_method
                ))
            })?;

        let mut builder = BindingBuilder::new()
            .signature_algorithm(self.signature_algorithm)
            .canonicalization_method(canonicalization)
            .encryption_algorithm(self.encryption_algorithm.as_str())
            .encryption_key_size(self.encryption_key_size);
        if self.sign_documents {
            builder = builder.sign_document();
        }
        if self.sign_assertions {
            builder = builder.sign_assertions();
        }
        if self.encrypt_assertions {
            builder = builder.encrypt_assertions();
        }
        Ok(builder)
    }
}
