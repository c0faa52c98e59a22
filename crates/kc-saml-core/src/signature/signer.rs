//! XML Signature creation.
//!
//! Produces an enveloped signature over the document's root element:
//!
//! ```text
//! <ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
//!   <ds:SignedInfo>
//!     <ds:CanonicalizationMethod/> <ds:SignatureMethod/>
//!     <ds:Reference URI="#{root ID}">
//!       <ds:Transforms> enveloped-signature, canonicalization </ds:Transforms>
//!       <ds:DigestMethod/> <ds:DigestValue/>
//!     </ds:Reference>
//!   </ds:SignedInfo>
//!   <ds:SignatureValue/>
//!   <ds:KeyInfo><ds:X509Data><ds:X509Certificate/></ds:X509Data></ds:KeyInfo>
//! </ds:Signature>
//! ```
//!
//! The signature goes immediately after the root's `saml:Issuer` child,
//! where SAML schema validation expects it.

use base64::Engine;
use kc_crypto::{hash, Certificate, HashAlgorithm, SigningKeyPair};

use crate::constants::{elements, transforms, SAML_NS, XMLDSIG_NS, XMLDSIG_PREFIX};
use crate::error::{BindingError, BindingResult};
use crate::xml::{canonicalize, CanonicalizationMethod, Document, NodeId, QName, XmlResult};

use super::{digest_method_uri, SignatureAlgorithm};

/// XML document signer.
#[derive(Debug, Clone, Copy)]
pub struct XmlSigner<'k> {
    key: &'k SigningKeyPair,
    certificate: Option<&'k Certificate>,
    algorithm: SignatureAlgorithm,
    digest: Option<HashAlgorithm>,
    canonicalization: CanonicalizationMethod,
}

impl<'k> XmlSigner<'k> {
    /// Creates a signer using the algorithm's default digest and exclusive
    /// canonicalization.
    #[must_use]
    pub fn new(key: &'k SigningKeyPair, algorithm: SignatureAlgorithm) -> Self {
        Self {
            key,
            certificate: None,
            algorithm,
            digest: None,
            canonicalization: CanonicalizationMethod::default(),
        }
    }

    /// Embeds `certificate` in the signature's `KeyInfo`.
    #[must_use]
    pub fn with_certificate(mut self, certificate: Option<&'k Certificate>) -> Self {
        self.certificate = certificate;
        self
    }

    /// Sets the canonicalization method.
    #[must_use]
    pub fn with_canonicalization(mut self, method: CanonicalizationMethod) -> Self {
        self.canonicalization = method;
        self
    }

    /// Overrides the digest method; `None` keeps the algorithm's default.
    #[must_use]
    pub fn with_digest_method(mut self, digest: Option<HashAlgorithm>) -> Self {
        self.digest = digest;
        self
    }

    /// Returns the signature algorithm in use.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Signs the document's root element in place.
    ///
    /// The document is left unchanged on error.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if the key cannot be used with the
    /// algorithm, or a processing error if canonicalization or signing fails.
    pub fn sign(&self, doc: &mut Document) -> BindingResult<()> {
        let signer = self.algorithm.new_signer(self.key)?;
        let digest = self.digest.unwrap_or_else(|| self.algorithm.digest_algorithm());

        let root = doc.root_element()?;
        let reference_uri = doc
            .element(root)
            .and_then(|element| element.attribute("ID"))
            .map(|id| format!("#{id}"))
            .unwrap_or_default();

        // The Signature is not in the tree yet, so this equals the
        // enveloped-signature transform's output.
        let canonical = canonicalize(doc, root, self.canonicalization.without_comments(), None)?;
        let digest_value =
            base64::engine::general_purpose::STANDARD.encode(hash(digest, canonical.as_bytes()));

        let parts = self.build_signature(doc, &reference_uri, digest, &digest_value)?;
        match doc.child_element(root, SAML_NS, elements::ISSUER) {
            Some(issuer) => doc.insert_after(issuer, parts.signature)?,
            None => doc.append_child(root, parts.signature)?,
        }

        // SignedInfo is canonicalized where it sits so inclusive methods see
        // the namespaces in scope from the document.
        let signature_value = canonicalize(doc, parts.signed_info, self.canonicalization, None)
            .map_err(BindingError::from)
            .and_then(|signed_info| signer.sign(signed_info.as_bytes()).map_err(BindingError::from));

        let signature_value = match signature_value {
            Ok(value) => value,
            Err(e) => {
                doc.remove(parts.signature)?;
                return Err(e);
            }
        };

        doc.set_text(
            parts.signature_value,
            base64::engine::general_purpose::STANDARD.encode(signature_value),
        )?;

        if let Some(certificate) = self.certificate {
            let key_info = ds_element(doc, "KeyInfo");
            let x509_data = ds_element(doc, "X509Data");
            let x509_certificate = ds_element(doc, "X509Certificate");
            doc.set_text(x509_certificate, certificate.to_base64())?;
            doc.append_child(x509_data, x509_certificate)?;
            doc.append_child(key_info, x509_data)?;
            doc.append_child(parts.signature, key_info)?;
        }

        tracing::debug!(
            "Signed document with {} (reference '{}')",
            self.algorithm,
            reference_uri
        );
        Ok(())
    }

    fn build_signature(
        &self,
        doc: &mut Document,
        reference_uri: &str,
        digest: HashAlgorithm,
        digest_value: &str,
    ) -> XmlResult<SignatureParts> {
        let signature = ds_element(doc, "Signature");
        if let Some(element) = doc.element_mut(signature) {
            element.declare_namespace(XMLDSIG_PREFIX, XMLDSIG_NS);
        }

        let signed_info = ds_element(doc, "SignedInfo");
        let c14n_method =
            ds_algorithm_element(doc, "CanonicalizationMethod", self.canonicalization.uri());
        let signature_method =
            ds_algorithm_element(doc, "SignatureMethod", self.algorithm.signature_method_uri());

        let reference = ds_element(doc, "Reference");
        if let Some(element) = doc.element_mut(reference) {
            element.set_attribute("URI", reference_uri);
        }
        let transforms = ds_element(doc, "Transforms");
        let enveloped = ds_algorithm_element(doc, "Transform", transforms::ENVELOPED_SIGNATURE);
        let c14n_transform = ds_algorithm_element(doc, "Transform", self.canonicalization.uri());
        let digest_method = ds_algorithm_element(doc, "DigestMethod", digest_method_uri(digest));
        let digest_value_node = ds_element(doc, "DigestValue");
        let digest_text = doc.create_text(digest_value);

        let signature_value = ds_element(doc, "SignatureValue");

        let links = [
            (transforms, enveloped),
            (transforms, c14n_transform),
            (digest_value_node, digest_text),
            (reference, transforms),
            (reference, digest_method),
            (reference, digest_value_node),
            (signed_info, c14n_method),
            (signed_info, signature_method),
            (signed_info, reference),
            (signature, signed_info),
            (signature, signature_value),
        ];
        for (parent, child) in links {
            doc.append_child(parent, child)?;
        }

        Ok(SignatureParts {
            signature,
            signed_info,
            signature_value,
        })
    }
}

struct SignatureParts {
    signature: NodeId,
    signed_info: NodeId,
    signature_value: NodeId,
}

fn ds_element(doc: &mut Document, local: &str) -> NodeId {
    doc.create_element(QName::new(XMLDSIG_NS, Some(XMLDSIG_PREFIX), local))
}

fn ds_algorithm_element(doc: &mut Document, local: &str, algorithm: &str) -> NodeId {
    let id = ds_element(doc, local);
    if let Some(element) = doc.element_mut(id) {
        element.set_attribute("Algorithm", algorithm);
    }
    id
}
