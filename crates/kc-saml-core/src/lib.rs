//! SAML 2.0 binding construction for Keycloak Rust.
//!
//! Takes an assembled SAML protocol document (a `Response` or a request),
//! applies the cryptographic protections a client is configured for, and
//! encodes the result for one of the two browser bindings:
//!
//! - **HTTP-POST** - base64 payload in an auto-submitting HTML form
//! - **HTTP-Redirect** - deflated, base64 payload in a URL query, with an
//!   optional detached signature over the query string
//!
//! # Architecture
//!
//! - [`xml`] - owned XML tree: parsing, serialization, canonicalization
//! - [`signature`] - signature algorithm registry and the XML-DSig signer
//! - [`encryption`] - XML-Enc assertion encryption
//! - [`bindings`] - builder, validated configuration, pipeline and encoders
//! - [`settings`] - serde-loadable per-client binding switches
//! - [`error`] - error types for binding operations
//!
//! # Example
//!
//! ```rust,ignore
//! use kc_saml_core::{BindingBuilder, SignatureAlgorithm};
//!
//! let config = BindingBuilder::new()
//!     .sign_with_certificate(key, certificate)
//!     .sign_assertions()
//!     .signature_algorithm(SignatureAlgorithm::RsaSha256)
//!     .relay_state("token")
//!     .build()?;
//!
//! let html = config.post_binding(document)?.html_response("https://sp.example.com/acs");
//! ```
//!
//! # Standards
//!
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)
//! - [XML Encryption](https://www.w3.org/TR/xmlenc-core1/)
//! - [Exclusive XML Canonicalization](https://www.w3.org/TR/xml-exc-c14n/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod constants;
pub mod encryption;
pub mod error;
pub mod settings;
pub mod signature;
pub mod xml;

pub use bindings::{BindingBuilder, BindingConfig, MessageType, PostBinding, RedirectBinding};
pub use error::{BindingError, BindingResult};
pub use settings::BindingSettings;
pub use signature::{CanonicalizationMethod, SignatureAlgorithm};
pub use xml::Document;
