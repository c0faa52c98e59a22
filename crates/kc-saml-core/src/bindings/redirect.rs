//! HTTP-Redirect Binding implementation.
//!
//! The serialized document is DEFLATE compressed, base64 encoded and carried
//! in the query string. A document-level signature is detached: it covers the
//! raw query bytes `SAMLRequest|SAMLResponse=..[&RelayState=..]&SigAlg=..`
//! exactly as emitted and is appended as the final `Signature` parameter.

use std::io::Write;
use std::sync::Arc;

use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use kc_crypto::SigningKeyPair;
use url::Url;

use crate::constants::params;
use crate::error::BindingResult;
use crate::signature::SignatureAlgorithm;
use crate::xml::Document;

use super::MessageType;

/// A protected document ready for the HTTP-Redirect binding.
#[derive(Debug, Clone)]
pub struct RedirectBinding {
    document: Document,
    relay_state: Option<String>,
    detached: Option<(Arc<SigningKeyPair>, SignatureAlgorithm)>,
}

impl RedirectBinding {
    pub(crate) fn new(
        document: Document,
        relay_state: Option<String>,
        detached: Option<(Arc<SigningKeyPair>, SignatureAlgorithm)>,
    ) -> Self {
        Self {
            document,
            relay_state,
            detached,
        }
    }

    /// Returns the deflated, base64 encoded document.
    ///
    /// ## Errors
    ///
    /// Returns a processing error if compression fails.
    pub fn encoded(&self) -> BindingResult<String> {
        let xml = self.document.to_xml_string();
        tracing::trace!("SAML document: {}", xml);
        let compressed = deflate_compress(xml.as_bytes())?;
        Ok(base64::engine::general_purpose::STANDARD.encode(compressed))
    }

    /// Builds the redirect URI to `action`, replacing any query it carries.
    ///
    /// ## Errors
    ///
    /// Returns a processing error if `action` is not an absolute URL or if
    /// compression or signing fails.
    pub fn generate_uri(&self, action: &str, message_type: MessageType) -> BindingResult<Url> {
        let mut url = Url::parse(action)?;
        url.set_query(None);

        let encoded = self.encoded()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(message_type.form_param(), &encoded);
            if let Some(relay_state) = self.relay_state.as_deref().filter(|rs| !rs.is_empty()) {
                query.append_pair(params::RELAY_STATE, relay_state);
            }
            if let Some((_, algorithm)) = &self.detached {
                query.append_pair(params::SIG_ALG, algorithm.signature_method_uri());
            }
        }

        if let Some((key, algorithm)) = &self.detached {
            let signed = url.query().unwrap_or_default().to_string();
            let signature = algorithm.new_signer(key)?.sign(signed.as_bytes())?;
            url.query_pairs_mut().append_pair(
                params::SIGNATURE,
                &base64::engine::general_purpose::STANDARD.encode(signature),
            );
            tracing::debug!("Built redirect URI with {} query signature", algorithm);
        } else {
            tracing::debug!("Built unsigned redirect URI");
        }

        Ok(url)
    }

    /// Builds the redirect URI for a request message.
    ///
    /// ## Errors
    ///
    /// See [`generate_uri`](Self::generate_uri).
    pub fn request_uri(&self, action: &str) -> BindingResult<Url> {
        self.generate_uri(action, MessageType::Request)
    }

    /// Builds the redirect URI for a response message.
    ///
    /// ## Errors
    ///
    /// See [`generate_uri`](Self::generate_uri).
    pub fn response_uri(&self, action: &str) -> BindingResult<Url> {
        self.generate_uri(action, MessageType::Response)
    }

    /// Returns the protected document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Consumes the binding, returning the protected document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Compresses data using DEFLATE (raw, no zlib header).
fn deflate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
