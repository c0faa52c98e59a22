//! SAML binding construction.
//!
//! [`BindingBuilder`] collects the per-client protection switches and key
//! material; [`BindingBuilder::build`] validates them into a [`BindingConfig`]
//! before any document is touched. The config then applies signing and
//! encryption in the order each binding requires:
//!
//! - **HTTP-POST**: sign assertions, encrypt assertion, sign document
//! - **HTTP-Redirect**: encrypt assertion, sign assertions; the document is
//!   protected by a detached signature over the query string instead
//!
//! # Usage
//!
//! ```rust,ignore
//! use kc_saml_core::{BindingBuilder, MessageType, SignatureAlgorithm};
//!
//! let config = BindingBuilder::new()
//!     .sign_with(key_pair)
//!     .signature_algorithm(SignatureAlgorithm::RsaSha256)
//!     .sign_assertions()
//!     .relay_state("state123")
//!     .build()?;
//!
//! let html = config.post_binding(document)?.html_response("https://sp.example.com/acs");
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

use std::sync::Arc;

use kc_crypto::{Certificate, ContentCipher, EncryptionPublicKey, HashAlgorithm, SigningKeyPair};

use crate::constants::{elements, params, SAML_NS};
use crate::encryption;
use crate::error::{BindingError, BindingResult};
use crate::signature::{CanonicalizationMethod, SignatureAlgorithm, XmlSigner};
use crate::xml::Document;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Request message (AuthnRequest, LogoutRequest).
    Request,
    /// Response message.
    Response,
}

impl MessageType {
    /// Returns the form or query parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => params::SAML_REQUEST,
            Self::Response => params::SAML_RESPONSE,
        }
    }
}

/// Fluent collector of binding options.
#[derive(Debug, Clone)]
pub struct BindingBuilder {
    signing_key: Option<Arc<SigningKeyPair>>,
    signing_certificate: Option<Certificate>,
    sign_document: bool,
    sign_assertions: bool,
    signature_algorithm: SignatureAlgorithm,
    digest_method: Option<HashAlgorithm>,
    canonicalization_method: CanonicalizationMethod,
    encrypt: bool,
    encryption_key: Option<EncryptionPublicKey>,
    encryption_algorithm: String,
    encryption_key_size: u32,
    relay_state: Option<String>,
}

impl Default for BindingBuilder {
    fn default() -> Self {
        Self {
            signing_key: None,
            signing_certificate: None,
            sign_document: false,
            sign_assertions: false,
            signature_algorithm: SignatureAlgorithm::default(),
            digest_method: None,
            canonicalization_method: CanonicalizationMethod::default(),
            encrypt: false,
            encryption_key: None,
            encryption_algorithm: "AES".to_string(),
            encryption_key_size: 128,
            relay_state: None,
        }
    }
}

impl BindingBuilder {
    /// Creates a builder with no protections enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signing key pair.
    #[must_use]
    pub fn sign_with(mut self, key: Arc<SigningKeyPair>) -> Self {
        self.signing_key = Some(key);
        self.signing_certificate = None;
        self
    }

    /// Sets the signing key pair and the certificate embedded in signatures.
    #[must_use]
    pub fn sign_with_certificate(mut self, key: Arc<SigningKeyPair>, certificate: Certificate) -> Self {
        self.signing_key = Some(key);
        self.signing_certificate = Some(certificate);
        self
    }

    /// Signs the whole document (POST) or the query string (Redirect).
    #[must_use]
    pub fn sign_document(mut self) -> Self {
        self.sign_document = true;
        self
    }

    /// Signs the assertion.
    #[must_use]
    pub fn sign_assertions(mut self) -> Self {
        self.sign_assertions = true;
        self
    }

    /// Sets the signature algorithm.
    #[must_use]
    pub fn signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Overrides the `DigestMethod` of XML signatures. Without it the
    /// signature algorithm's own digest is used.
    #[must_use]
    pub fn digest_method(mut self, digest: HashAlgorithm) -> Self {
        self.digest_method = Some(digest);
        self
    }

    /// Sets the canonicalization method for XML signatures.
    #[must_use]
    pub fn canonicalization_method(mut self, method: CanonicalizationMethod) -> Self {
        self.canonicalization_method = method;
        self
    }

    /// Encrypts the assertion for the holder of `key`.
    #[must_use]
    pub fn encrypt(mut self, key: EncryptionPublicKey) -> Self {
        self.encrypt = true;
        self.encryption_key = Some(key);
        self
    }

    /// Requests assertion encryption without supplying the key.
    ///
    /// [`build`](Self::build) fails unless [`encrypt`](Self::encrypt) is also
    /// called.
    #[must_use]
    pub fn encrypt_assertions(mut self) -> Self {
        self.encrypt = true;
        self
    }

    /// Sets the content encryption algorithm family (`AES`, `AES-GCM`).
    #[must_use]
    pub fn encryption_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.encryption_algorithm = algorithm.into();
        self
    }

    /// Sets the content encryption key size in bits.
    #[must_use]
    pub fn encryption_key_size(mut self, bits: u32) -> Self {
        self.encryption_key_size = bits;
        self
    }

    /// Sets the RelayState passed along with the message.
    #[must_use]
    pub fn relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }

    /// Validates the options.
    ///
    /// ## Errors
    ///
    /// Returns [`BindingError::Configuration`] if signing is requested
    /// without a usable key for the algorithm, if encryption is requested
    /// without a key, or if the encryption algorithm or size is unsupported.
    pub fn build(self) -> BindingResult<BindingConfig> {
        let signing = match self.signing_key {
            Some(key) => {
                if self.sign_document || self.sign_assertions {
                    self.signature_algorithm.new_signer(&key)?;
                    if self.signature_algorithm.is_legacy() {
                        tracing::warn!(
                            "Signature algorithm {} uses SHA-1; configure a SHA-2 algorithm where the peer supports it",
                            self.signature_algorithm
                        );
                    }
                }
                Some(SigningConfig {
                    key,
                    certificate: self.signing_certificate,
                    algorithm: self.signature_algorithm,
                    digest: self.digest_method,
                })
            }
            None if self.sign_document || self.sign_assertions => {
                return Err(BindingError::Configuration(
                    "signing requested but no signing key pair configured".to_string(),
                ));
            }
            None => None,
        };

        let encryption = if self.encrypt {
            let key = self.encryption_key.ok_or_else(|| {
                BindingError::Configuration(
                    "encryption requested but no encryption public key configured".to_string(),
                )
            })?;
            let cipher = ContentCipher::resolve(&self.encryption_algorithm, self.encryption_key_size)?;
            Some(EncryptionConfig { key, cipher })
        } else {
            None
        };

        Ok(BindingConfig {
            signing,
            sign_document: self.sign_document,
            sign_assertions: self.sign_assertions,
            canonicalization_method: self.canonicalization_method,
            encryption,
            relay_state: self.relay_state,
        })
    }
}

#[derive(Debug, Clone)]
struct SigningConfig {
    key: Arc<SigningKeyPair>,
    certificate: Option<Certificate>,
    algorithm: SignatureAlgorithm,
    digest: Option<HashAlgorithm>,
}

#[derive(Debug, Clone)]
struct EncryptionConfig {
    key: EncryptionPublicKey,
    cipher: ContentCipher,
}

/// Validated binding options, applied to documents by the binding methods.
#[derive(Debug, Clone)]
pub struct BindingConfig {
    signing: Option<SigningConfig>,
    sign_document: bool,
    sign_assertions: bool,
    canonicalization_method: CanonicalizationMethod,
    encryption: Option<EncryptionConfig>,
    relay_state: Option<String>,
}

impl BindingConfig {
    /// Applies the HTTP-POST protections to `document`.
    ///
    /// ## Errors
    ///
    /// Returns the first signing or encryption failure. The document is
    /// consumed, so no partially protected document escapes.
    pub fn post_binding(&self, mut document: Document) -> BindingResult<PostBinding> {
        if self.sign_assertions {
            self.sign_assertion(&mut document)?;
        }
        if self.encryption.is_some() {
            self.encrypt_assertion(&mut document)?;
        }
        if self.sign_document {
            self.sign_document(&mut document)?;
        }
        Ok(PostBinding::new(document, self.relay_state.clone()))
    }

    /// Applies the HTTP-Redirect protections to `document`.
    ///
    /// ## Errors
    ///
    /// Returns the first signing or encryption failure.
    pub fn redirect_binding(&self, mut document: Document) -> BindingResult<RedirectBinding> {
        if self.encryption.is_some() {
            self.encrypt_assertion(&mut document)?;
        }
        if self.sign_assertions {
            self.sign_assertion(&mut document)?;
        }

        let detached = if self.sign_document {
            self.signing
                .as_ref()
                .map(|signing| (Arc::clone(&signing.key), signing.algorithm))
        } else {
            None
        };
        Ok(RedirectBinding::new(document, self.relay_state.clone(), detached))
    }

    /// Signs the root's `Assertion` child on a standalone copy and splices
    /// the signed copy back in its place.
    ///
    /// Does nothing when the root has no `Assertion` child.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error without a signing key, or the signing
    /// failure. The document is unchanged on error.
    pub fn sign_assertion(&self, document: &mut Document) -> BindingResult<()> {
        let root = document.root_element()?;
        let Some(assertion) = document.child_element(root, SAML_NS, elements::ASSERTION) else {
            tracing::debug!("No assertion to sign");
            return Ok(());
        };

        let mut standalone = document.extract_subtree(assertion)?;
        self.signer()?.sign(&mut standalone)?;

        let signed_root = standalone.root_element()?;
        let signed = document.import_node(&standalone, signed_root)?;
        document.replace_child(assertion, signed)?;

        tracing::debug!("Signed assertion");
        Ok(())
    }

    /// Signs the whole document.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error without a signing key, or the signing
    /// failure.
    pub fn sign_document(&self, document: &mut Document) -> BindingResult<()> {
        self.signer()?.sign(document)
    }

    /// Encrypts the document's assertion.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if encryption is not configured,
    /// [`BindingError::IllegalState`] if there is no assertion, or the
    /// encryption failure.
    pub fn encrypt_assertion(&self, document: &mut Document) -> BindingResult<()> {
        let encryption = self.encryption.as_ref().ok_or_else(|| {
            BindingError::Configuration("no encryption public key configured".to_string())
        })?;
        encryption::encrypt_assertion(document, &encryption.key, encryption.cipher)
    }

    /// Returns true if the document (or redirect query) is signed.
    #[must_use]
    pub const fn signs_document(&self) -> bool {
        self.sign_document
    }

    /// Returns true if assertions are signed.
    #[must_use]
    pub const fn signs_assertions(&self) -> bool {
        self.sign_assertions
    }

    /// Returns the signature algorithm, if a signing key is configured.
    #[must_use]
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.signing.as_ref().map(|signing| signing.algorithm)
    }

    /// Returns the canonicalization method.
    #[must_use]
    pub const fn canonicalization_method(&self) -> CanonicalizationMethod {
        self.canonicalization_method
    }

    /// Returns the content cipher, if assertions are encrypted.
    #[must_use]
    pub fn content_cipher(&self) -> Option<ContentCipher> {
        self.encryption.as_ref().map(|encryption| encryption.cipher)
    }

    /// Returns the RelayState.
    #[must_use]
    pub fn relay_state(&self) -> Option<&str> {
        self.relay_state.as_deref()
    }

    fn signer(&self) -> BindingResult<XmlSigner<'_>> {
        let signing = self.signing.as_ref().ok_or_else(|| {
            BindingError::Configuration("no signing key pair configured".to_string())
        })?;
        Ok(XmlSigner::new(&signing.key, signing.algorithm)
            .with_certificate(signing.certificate.as_ref())
            .with_digest_method(signing.digest)
            .with_canonicalization(self.canonicalization_method))
    }
}
