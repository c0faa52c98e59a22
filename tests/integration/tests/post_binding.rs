//! HTTP-POST binding integration tests.
//!
//! Covers signature placement, the sign-encrypt-sign ordering, payload
//! encoding and HTML form rendering.

use base64::Engine;
use kc_crypto::HashAlgorithm;

use kc_integration_tests::{
    count, decrypt_assertion, ec_signing_key, find, init_tracing, sample_response,
    signing_certificate, signing_key, sp_encryption_key, verify_enveloped_signature,
    SAMPLE_LOGOUT_REQUEST,
};
use kc_saml_core::constants::{digest_algorithms, SAML_NS, XMLDSIG_NS, XMLENC_NS};
use kc_saml_core::{BindingBuilder, BindingSettings, Document, SignatureAlgorithm};

const ACS_URL: &str = "https://sp.example.com/saml/acs";

/// Returns the element that follows the `saml:Issuer` child of `parent`.
fn element_after_issuer(doc: &Document, parent: kc_saml_core::xml::NodeId) -> anyhow::Result<String> {
    let children: Vec<_> = doc.child_elements(parent).collect();
    let issuer = children
        .iter()
        .position(|&id| doc.element(id).is_some_and(|e| e.name.is(SAML_NS, "Issuer")))
        .ok_or_else(|| anyhow::anyhow!("no Issuer"))?;
    let next = children.get(issuer + 1).ok_or_else(|| anyhow::anyhow!("nothing after Issuer"))?;
    Ok(doc
        .element(*next)
        .map(|e| e.name.qualified())
        .unwrap_or_default())
}

/// Tests the documented end-to-end example: RSA-SHA256 assertion signing.
#[test]
fn test_post_signed_assertion() -> anyhow::Result<()> {
    init_tracing();
    let key = signing_key()?;

    let config = BindingBuilder::new()
        .sign_with(key.clone())
        .sign_assertions()
        .signature_algorithm(SignatureAlgorithm::RsaSha256)
        .build()?;
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();

    assert_eq!(count(doc, XMLDSIG_NS, "Signature")?, 1, "expected exactly one signature");
    let assertion = find(doc, SAML_NS, "Assertion")?;
    assert!(
        doc.child_element(assertion, XMLDSIG_NS, "Signature").is_some(),
        "signature should be inside the assertion"
    );
    assert_eq!(element_after_issuer(doc, assertion)?, "ds:Signature");

    let digest_method = find(doc, XMLDSIG_NS, "DigestMethod")?;
    assert_eq!(
        doc.element(digest_method).and_then(|e| e.attribute("Algorithm")),
        Some(digest_algorithms::SHA256)
    );

    verify_enveloped_signature(doc, assertion, &key)?;
    Ok(())
}

/// Tests the default algorithm: a builder with only a key and the signing
/// switches produces verifiable RSA-SHA1 signatures.
#[test]
fn test_post_default_rsa_sha1() -> anyhow::Result<()> {
    init_tracing();
    let key = signing_key()?;

    let config = BindingSettings::default()
        .builder()?
        .sign_with(key.clone())
        .sign_document()
        .sign_assertions()
        .build()?;
    assert_eq!(config.signature_algorithm(), Some(SignatureAlgorithm::RsaSha1));
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();

    let signature_method = find(doc, XMLDSIG_NS, "SignatureMethod")?;
    assert_eq!(
        doc.element(signature_method).and_then(|e| e.attribute("Algorithm")),
        Some("http://www.w3.org/2000/09/xmldsig#rsa-sha1")
    );
    let digest_method = find(doc, XMLDSIG_NS, "DigestMethod")?;
    assert_eq!(
        doc.element(digest_method).and_then(|e| e.attribute("Algorithm")),
        Some(digest_algorithms::SHA1)
    );

    verify_enveloped_signature(doc, doc.root_element()?, &key)?;
    verify_enveloped_signature(doc, find(doc, SAML_NS, "Assertion")?, &key)?;
    Ok(())
}

/// Tests that a document signature sits right after the response Issuer
/// and embeds the signing certificate.
#[test]
fn test_post_signed_document() -> anyhow::Result<()> {
    init_tracing();
    let key = signing_key()?;
    let certificate = signing_certificate()?;

    let config = BindingBuilder::new()
        .sign_with_certificate(key.clone(), certificate.clone())
        .sign_document()
        .signature_algorithm(SignatureAlgorithm::RsaSha512)
        .build()?;
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();

    let root = doc.root_element()?;
    assert_eq!(element_after_issuer(doc, root)?, "ds:Signature");
    let x509 = find(doc, XMLDSIG_NS, "X509Certificate")?;
    assert_eq!(doc.text_content(x509), certificate.to_base64());

    verify_enveloped_signature(doc, root, &key)?;
    Ok(())
}

/// Tests the full POST order: the assertion is signed, then encrypted, then
/// the whole response is signed.
#[test]
fn test_post_sign_encrypt_sign() -> anyhow::Result<()> {
    init_tracing();
    let key = signing_key()?;

    let config = BindingBuilder::new()
        .sign_with(key.clone())
        .signature_algorithm(SignatureAlgorithm::RsaSha256)
        .sign_assertions()
        .sign_document()
        .encrypt(sp_encryption_key()?)
        .encryption_algorithm("AES")
        .encryption_key_size(256)
        .build()?;
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();

    assert!(doc.find_descendant(SAML_NS, "Assertion").is_none(), "plaintext assertion left behind");
    let encrypted = find(doc, SAML_NS, "EncryptedAssertion")?;
    assert!(doc.child_element(encrypted, XMLENC_NS, "EncryptedData").is_some());
    assert!(!doc.to_xml_string().contains("alice@example.com"));

    let root = doc.root_element()?;
    verify_enveloped_signature(doc, root, &key)?;

    let decrypted = decrypt_assertion(doc)?;
    let assertion = decrypted.root_element()?;
    assert!(decrypted.element(assertion).is_some_and(|e| e.name.is(SAML_NS, "Assertion")));
    assert_eq!(element_after_issuer(&decrypted, assertion)?, "ds:Signature");
    verify_enveloped_signature(&decrypted, assertion, &key)?;
    Ok(())
}

/// Tests that encrypting without signing still decrypts to the original
/// assertion content.
#[test]
fn test_post_encrypt_only_gcm() -> anyhow::Result<()> {
    init_tracing();
    let config = BindingBuilder::new()
        .encrypt(sp_encryption_key()?)
        .encryption_algorithm("AES-GCM")
        .build()?;
    let binding = config.post_binding(sample_response()?)?;

    let decrypted = decrypt_assertion(binding.document())?;
    let name_id = find(&decrypted, SAML_NS, "NameID")?;
    assert_eq!(
        decrypted.text_content(name_id),
        "_ce3d2948b4cf20146dee0a0b3dd6f69b6cf86f62d7"
    );
    assert_eq!(count(&decrypted, XMLDSIG_NS, "Signature")?, 0);
    Ok(())
}

/// Tests that the POST payload decodes to the serialized document.
#[test]
fn test_post_payload_roundtrip() -> anyhow::Result<()> {
    let config = BindingBuilder::new()
        .sign_with(signing_key()?)
        .sign_document()
        .build()?;
    let binding = config.post_binding(sample_response()?)?;

    let decoded = base64::engine::general_purpose::STANDARD.decode(binding.encoded())?;
    assert_eq!(String::from_utf8(decoded)?, binding.document().to_xml_string());

    let html = binding.html_response(ACS_URL);
    assert!(html.contains(&format!(r#"NAME="SAMLResponse" VALUE="{}""#, binding.encoded())));
    Ok(())
}

/// Tests that RelayState never appears unescaped in the form.
#[test]
fn test_post_relay_state_escaping() -> anyhow::Result<()> {
    let relay_state = r#""/><script>alert(document.cookie)</script><a b=""#;
    let config = BindingBuilder::new().relay_state(relay_state).build()?;
    let html = config
        .post_binding(Document::parse(SAMPLE_LOGOUT_REQUEST)?)?
        .html_request("https://idp.example.com/saml?client=a&b=\"c\"");

    assert!(!html.contains(relay_state));
    assert!(!html.contains("<script>"));
    assert!(html.contains(
        r#"<INPUT TYPE="HIDDEN" NAME="RelayState" VALUE="&quot;/&gt;&lt;script&gt;alert(document.cookie)&lt;/script&gt;&lt;a b=&quot;"/>"#
    ));
    assert!(html.contains(r#"ACTION="https://idp.example.com/saml?client=a&amp;b=&quot;c&quot;""#));
    assert!(html.contains(r#"NAME="SAMLRequest""#));
    Ok(())
}

/// Tests that a missing signing key is reported before any document exists.
#[test]
fn test_missing_signing_key() {
    let err = BindingBuilder::new()
        .sign_document()
        .build()
        .expect_err("signing without a key must fail");
    assert!(err.is_configuration(), "expected configuration error, got {err}");
}

/// Tests that encryption on a document without an assertion is an illegal
/// state.
#[test]
fn test_encrypt_without_assertion() -> anyhow::Result<()> {
    let config = BindingBuilder::new().encrypt(sp_encryption_key()?).build()?;
    let err = config
        .post_binding(Document::parse(SAMPLE_LOGOUT_REQUEST)?)
        .expect_err("nothing to encrypt");
    assert!(err.is_illegal_state(), "expected illegal state, got {err}");
    Ok(())
}

/// Tests that assertion signing skips documents without an assertion.
#[test]
fn test_sign_assertions_without_assertion() -> anyhow::Result<()> {
    let config = BindingBuilder::new()
        .sign_with(signing_key()?)
        .sign_assertions()
        .build()?;
    let binding = config.post_binding(Document::parse(SAMPLE_LOGOUT_REQUEST)?)?;
    assert_eq!(binding.document().to_xml_string(), SAMPLE_LOGOUT_REQUEST);
    Ok(())
}

/// Tests that a digest override still yields verifiable signatures.
#[test]
fn test_post_digest_override() -> anyhow::Result<()> {
    let key = signing_key()?;
    let config = BindingBuilder::new()
        .sign_with(key.clone())
        .signature_algorithm(SignatureAlgorithm::RsaSha256)
        .digest_method(HashAlgorithm::Sha1)
        .sign_document()
        .build()?;
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();

    let digest_method = find(doc, XMLDSIG_NS, "DigestMethod")?;
    assert_eq!(
        doc.element(digest_method).and_then(|e| e.attribute("Algorithm")),
        Some(digest_algorithms::SHA1)
    );
    verify_enveloped_signature(doc, doc.root_element()?, &key)?;
    Ok(())
}

/// Tests ECDSA signing with an EC key.
#[test]
fn test_post_ecdsa_signed_document() -> anyhow::Result<()> {
    let key = ec_signing_key()?;
    let config = BindingBuilder::new()
        .sign_with(key.clone())
        .signature_algorithm(SignatureAlgorithm::EcdsaSha256)
        .sign_document()
        .build()?;
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();
    verify_enveloped_signature(doc, doc.root_element()?, &key)?;
    Ok(())
}

/// Tests a binding driven by stored client settings.
#[test]
fn test_post_from_settings() -> anyhow::Result<()> {
    let key = signing_key()?;
    let settings = BindingSettings::from_json(
        r#"{
            "sign_documents": true,
            "sign_assertions": true,
            "signature_algorithm": "RSA_SHA384",
            "canonicalization_method": "http://www.w3.org/TR/2001/REC-xml-c14n-20010315"
        }"#,
    )?;
    let config = settings.builder()?.sign_with(key.clone()).build()?;
    let binding = config.post_binding(sample_response()?)?;
    let doc = binding.document();

    assert_eq!(count(doc, XMLDSIG_NS, "Signature")?, 2);
    verify_enveloped_signature(doc, doc.root_element()?, &key)?;
    verify_enveloped_signature(doc, find(doc, SAML_NS, "Assertion")?, &key)?;
    Ok(())
}
