//! XML Encryption of SAML assertions.
//!
//! The assertion is replaced by an `EncryptedAssertion` carrying the
//! encrypted element and its RSA-OAEP wrapped content key:
//!
//! ```text
//! <saml:EncryptedAssertion>
//!   <xenc:EncryptedData Type="http://www.w3.org/2001/04/xmlenc#Element">
//!     <xenc:EncryptionMethod Algorithm="{content cipher}"/>
//!     <ds:KeyInfo>
//!       <xenc:EncryptedKey>
//!         <xenc:EncryptionMethod Algorithm="...#rsa-oaep-mgf1p">
//!           <ds:DigestMethod Algorithm="...#sha1"/>
//!         </xenc:EncryptionMethod>
//!         <xenc:CipherData><xenc:CipherValue/></xenc:CipherData>
//!       </xenc:EncryptedKey>
//!     </ds:KeyInfo>
//!     <xenc:CipherData><xenc:CipherValue/></xenc:CipherData>
//!   </xenc:EncryptedData>
//! </saml:EncryptedAssertion>
//! ```

use base64::Engine;
use kc_crypto::{generate_secret_key, wrap_key_rsa_oaep, ContentCipher, EncryptionPublicKey};

use crate::constants::{
    digest_algorithms, elements, encryption_algorithms, SAML_NS, XMLDSIG_NS, XMLDSIG_PREFIX,
    XMLENC_NS, XMLENC_PREFIX,
};
use crate::error::{BindingError, BindingResult};
use crate::xml::{Document, NodeId, QName};

/// Returns the XML Encryption `Algorithm` URI for a content cipher.
#[must_use]
pub const fn cipher_uri(cipher: ContentCipher) -> &'static str {
    match cipher {
        ContentCipher::Aes128Cbc => encryption_algorithms::AES128_CBC,
        ContentCipher::Aes256Cbc => encryption_algorithms::AES256_CBC,
        ContentCipher::Aes128Gcm => encryption_algorithms::AES128_GCM,
        ContentCipher::Aes256Gcm => encryption_algorithms::AES256_GCM,
    }
}

/// Returns the prefix bound on the document's first `Assertion` element.
///
/// `None` means the assertion uses a default namespace declaration.
///
/// ## Errors
///
/// Returns [`BindingError::IllegalState`] if there is no assertion.
pub fn saml_ns_prefix(doc: &Document) -> BindingResult<Option<String>> {
    let assertion = find_assertion(doc)?;
    Ok(doc
        .element(assertion)
        .and_then(|element| element.name.prefix.clone()))
}

/// Encrypts the document's first `Assertion` in place.
///
/// A fresh content key is generated for every call and only leaves this
/// function wrapped under `key`. The plaintext assertion is unreachable from
/// the document once this returns.
///
/// ## Errors
///
/// Returns [`BindingError::IllegalState`] if there is no assertion, or a
/// processing error if encryption or key wrapping fails. The document is
/// unchanged on error.
pub fn encrypt_assertion(
    doc: &mut Document,
    key: &EncryptionPublicKey,
    cipher: ContentCipher,
) -> BindingResult<()> {
    let assertion = find_assertion(doc)?;
    let prefix = saml_ns_prefix(doc)?;

    let content_key = generate_secret_key(cipher.key_bits())
        .map_err(|e| BindingError::processing("content key generation failed", e))?;

    let plaintext = doc.node_to_string(assertion);
    let encrypted = cipher.encrypt(&content_key, plaintext.as_bytes())?;
    let wrapped = wrap_key_rsa_oaep(key, &content_key)?;

    let engine = base64::engine::general_purpose::STANDARD;
    let encrypted_assertion = doc.create_element(QName::new(
        SAML_NS,
        prefix.as_deref(),
        elements::ENCRYPTED_ASSERTION,
    ));

    let encrypted_data = xenc_element(doc, "EncryptedData");
    if let Some(element) = doc.element_mut(encrypted_data) {
        element.declare_namespace(XMLENC_PREFIX, XMLENC_NS);
        element.set_attribute("Type", encryption_algorithms::TYPE_ELEMENT);
    }
    let data_method = algorithm_element(doc, XMLENC_NS, XMLENC_PREFIX, "EncryptionMethod", cipher_uri(cipher));

    let key_info = doc.create_element(QName::new(XMLDSIG_NS, Some(XMLDSIG_PREFIX), "KeyInfo"));
    if let Some(element) = doc.element_mut(key_info) {
        element.declare_namespace(XMLDSIG_PREFIX, XMLDSIG_NS);
    }
    let encrypted_key = xenc_element(doc, "EncryptedKey");
    let key_method = algorithm_element(
        doc,
        XMLENC_NS,
        XMLENC_PREFIX,
        "EncryptionMethod",
        encryption_algorithms::RSA_OAEP_MGF1P,
    );
    let oaep_digest = algorithm_element(doc, XMLDSIG_NS, XMLDSIG_PREFIX, "DigestMethod", digest_algorithms::SHA1);
    let key_cipher_data = cipher_data(doc, &engine.encode(wrapped))?;
    let data_cipher_data = cipher_data(doc, &engine.encode(encrypted))?;

    doc.append_child(key_method, oaep_digest)?;
    doc.append_child(encrypted_key, key_method)?;
    doc.append_child(encrypted_key, key_cipher_data)?;
    doc.append_child(key_info, encrypted_key)?;
    doc.append_child(encrypted_data, data_method)?;
    doc.append_child(encrypted_data, key_info)?;
    doc.append_child(encrypted_data, data_cipher_data)?;
    doc.append_child(encrypted_assertion, encrypted_data)?;

    doc.replace_child(assertion, encrypted_assertion)?;

    tracing::debug!(
        "Encrypted assertion with {} (key transport {})",
        cipher_uri(cipher),
        encryption_algorithms::RSA_OAEP_MGF1P
    );
    Ok(())
}

fn find_assertion(doc: &Document) -> BindingResult<NodeId> {
    doc.find_descendant(SAML_NS, elements::ASSERTION)
        .ok_or_else(|| BindingError::IllegalState("document has no Assertion element".to_string()))
}

fn xenc_element(doc: &mut Document, local: &str) -> NodeId {
    doc.create_element(QName::new(XMLENC_NS, Some(XMLENC_PREFIX), local))
}

fn algorithm_element(
    doc: &mut Document,
    namespace: &str,
    prefix: &str,
    local: &str,
    algorithm: &str,
) -> NodeId {
    let id = doc.create_element(QName::new(namespace, Some(prefix), local));
    if let Some(element) = doc.element_mut(id) {
        element.set_attribute("Algorithm", algorithm);
    }
    id
}

fn cipher_data(doc: &mut Document, value: &str) -> BindingResult<NodeId> {
    let cipher_data = xenc_element(doc, "CipherData");
    let cipher_value = xenc_element(doc, "CipherValue");
    doc.set_text(cipher_value, value)?;
    doc.append_child(cipher_data, cipher_value)?;
    Ok(cipher_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kc_crypto::{pem_to_der, unwrap_key_rsa_oaep, Certificate};

    const SP_CERT_PEM: &str = include_str!("../../../tests/fixtures/sp-encryption-cert.pem");
    const SP_KEY_PEM: &str = include_str!("../../../tests/fixtures/sp-encryption-key.pem");

    const RESPONSE: &str = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_r"><saml:Issuer>idp</saml:Issuer><saml:Assertion ID="_a"><saml:Subject>alice</saml:Subject></saml:Assertion></samlp:Response>"#;

    fn sp_key() -> EncryptionPublicKey {
        EncryptionPublicKey::from_certificate(&Certificate::from_pem(SP_CERT_PEM).unwrap()).unwrap()
    }

    fn xenc(doc: &Document, parent: NodeId, local: &str) -> NodeId {
        doc.child_element(parent, XMLENC_NS, local).unwrap()
    }

    fn decrypt(doc: &Document, cipher: ContentCipher) -> String {
        let encrypted_data = doc.find_descendant(XMLENC_NS, "EncryptedData").unwrap();
        let key_info = doc.child_element(encrypted_data, XMLDSIG_NS, "KeyInfo").unwrap();
        let encrypted_key = xenc(doc, key_info, "EncryptedKey");
        let engine = base64::engine::general_purpose::STANDARD;

        let wrapped = engine
            .decode(doc.text_content(xenc(doc, xenc(doc, encrypted_key, "CipherData"), "CipherValue")))
            .unwrap();
        let private_key = pem_to_der(SP_KEY_PEM, "PRIVATE KEY").unwrap();
        let content_key = unwrap_key_rsa_oaep(&private_key, &wrapped).unwrap();

        let ciphertext = engine
            .decode(doc.text_content(xenc(doc, xenc(doc, encrypted_data, "CipherData"), "CipherValue")))
            .unwrap();
        String::from_utf8(cipher.decrypt(&content_key, &ciphertext).unwrap()).unwrap()
    }

    #[test]
    fn replaces_assertion_with_encrypted_assertion() {
        let mut doc = Document::parse(RESPONSE).unwrap();
        encrypt_assertion(&mut doc, &sp_key(), ContentCipher::Aes128Cbc).unwrap();

        assert!(doc.find_descendant(SAML_NS, elements::ASSERTION).is_none());
        let root = doc.root_element().unwrap();
        let children: Vec<_> = doc.child_elements(root).collect();
        assert_eq!(children.len(), 2);
        let encrypted = doc.element(children[1]).unwrap();
        assert!(encrypted.name.is(SAML_NS, elements::ENCRYPTED_ASSERTION));
        assert_eq!(encrypted.name.prefix.as_deref(), Some("saml"));

        let xml = doc.to_xml_string();
        assert!(!xml.contains("alice"));
        assert!(xml.contains(encryption_algorithms::AES128_CBC));
        assert!(xml.contains(encryption_algorithms::RSA_OAEP_MGF1P));
    }

    #[test]
    fn decrypts_to_standalone_assertion() {
        for cipher in [ContentCipher::Aes256Cbc, ContentCipher::Aes128Gcm] {
            let mut doc = Document::parse(RESPONSE).unwrap();
            encrypt_assertion(&mut doc, &sp_key(), cipher).unwrap();

            let plaintext = decrypt(&doc, cipher);
            assert_eq!(
                plaintext,
                r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_a"><saml:Subject>alice</saml:Subject></saml:Assertion>"#
            );
        }
    }

    #[test]
    fn keeps_default_namespace_convention() {
        let xml = r#"<Response xmlns="urn:oasis:names:tc:SAML:2.0:protocol"><Assertion xmlns="urn:oasis:names:tc:SAML:2.0:assertion" ID="_a"/></Response>"#;
        let mut doc = Document::parse(xml).unwrap();
        assert_eq!(saml_ns_prefix(&doc).unwrap(), None);

        encrypt_assertion(&mut doc, &sp_key(), ContentCipher::Aes128Cbc).unwrap();
        let encrypted = doc.find_descendant(SAML_NS, elements::ENCRYPTED_ASSERTION).unwrap();
        assert_eq!(doc.element(encrypted).unwrap().name.prefix, None);
        assert!(doc
            .to_xml_string()
            .contains(r#"<EncryptedAssertion xmlns="urn:oasis:names:tc:SAML:2.0:assertion">"#));
    }

    #[test]
    fn missing_assertion_is_illegal_state() {
        let mut doc = Document::parse(r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"/>"#).unwrap();
        let err = encrypt_assertion(&mut doc, &sp_key(), ContentCipher::Aes128Cbc).unwrap_err();
        assert!(err.is_illegal_state());
        assert!(saml_ns_prefix(&doc).unwrap_err().is_illegal_state());
    }

    #[test]
    fn fresh_content_key_per_call() {
        let mut first = Document::parse(RESPONSE).unwrap();
        let mut second = Document::parse(RESPONSE).unwrap();
        encrypt_assertion(&mut first, &sp_key(), ContentCipher::Aes128Cbc).unwrap();
        encrypt_assertion(&mut second, &sp_key(), ContentCipher::Aes128Cbc).unwrap();
        assert_ne!(first.to_xml_string(), second.to_xml_string());
    }
}
