//! Binding error types.
//!
//! Every failure surfaces as one of three kinds: the caller's configuration
//! is incomplete or names an unknown algorithm, a signing/encryption/encoding
//! step failed, or the document lacks a structure the requested step needs.

use std::error::Error as StdError;

use kc_crypto::{AlgorithmError, CipherError, KeyError, SignatureError};
use thiserror::Error;

use crate::xml::XmlError;

/// Result type for binding operations.
pub type BindingResult<T> = Result<T, BindingError>;

/// Errors raised while building a SAML binding.
#[derive(Debug, Error)]
pub enum BindingError {
    /// Missing key material or an unknown/unsupported algorithm.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A signing, encryption, serialization or compression step failed.
    #[error("processing error: {message}")]
    Processing {
        /// What was being done.
        message: String,
        /// The underlying failure.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The document does not have the structure the operation requires.
    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl BindingError {
    /// Creates a processing error wrapping `source`.
    pub fn processing(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Processing {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true for processing errors.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Returns true for illegal state errors.
    #[must_use]
    pub const fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState(_))
    }
}

impl From<XmlError> for BindingError {
    fn from(err: XmlError) -> Self {
        Self::processing("XML processing failed", err)
    }
}

impl From<SignatureError> for BindingError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::KeyMismatch { .. } => Self::Configuration(err.to_string()),
            other => Self::processing("signing failed", other),
        }
    }
}

impl From<CipherError> for BindingError {
    fn from(err: CipherError) -> Self {
        Self::processing("encryption failed", err)
    }
}

impl From<std::io::Error> for BindingError {
    fn from(err: std::io::Error) -> Self {
        Self::processing("compression failed", err)
    }
}

impl From<url::ParseError> for BindingError {
    fn from(err: url::ParseError) -> Self {
        Self::processing("invalid action URL", err)
    }
}

impl From<KeyError> for BindingError {
    fn from(err: KeyError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<AlgorithmError> for BindingError {
    fn from(err: AlgorithmError) -> Self {
        Self::Configuration(err.to_string())
    }
}
