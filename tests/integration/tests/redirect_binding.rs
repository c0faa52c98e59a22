//! HTTP-Redirect binding integration tests.
//!
//! Covers payload encoding, query parameter order and the detached query
//! string signature.

use base64::Engine;
use kc_crypto::SigningScheme;
use url::Url;

use kc_integration_tests::{
    count, decrypt_assertion, init_tracing, inflate, sample_response, signing_key,
    signing_scheme, sp_encryption_key, SAMPLE_LOGOUT_REQUEST,
};
use kc_saml_core::constants::{SAML_NS, XMLDSIG_NS};
use kc_saml_core::{BindingBuilder, Document, MessageType, SignatureAlgorithm};

const SLO_URL: &str = "https://sp.example.com/saml/slo?stale=1";

fn parameter_names(url: &Url) -> Vec<String> {
    url.query_pairs().map(|(name, _)| name.into_owned()).collect()
}

fn parameter(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Tests that the detached signature verifies over the raw query bytes.
#[test]
fn test_redirect_query_signature() -> anyhow::Result<()> {
    init_tracing();
    let key = signing_key()?;

    let config = BindingBuilder::new()
        .sign_with(key.clone())
        .sign_document()
        .signature_algorithm(SignatureAlgorithm::RsaSha256)
        .relay_state("https://sp.example.com/app?page=1&tab=2")
        .build()?;
    let url = config
        .redirect_binding(Document::parse(SAMPLE_LOGOUT_REQUEST)?)?
        .request_uri(SLO_URL)?;

    assert_eq!(
        parameter_names(&url),
        ["SAMLRequest", "RelayState", "SigAlg", "Signature"]
    );
    assert_eq!(
        parameter(&url, "SigAlg").as_deref(),
        Some("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256")
    );

    let query = url.query().unwrap_or_default();
    let (signed, _) = query
        .split_once("&Signature=")
        .ok_or_else(|| anyhow::anyhow!("no Signature parameter"))?;
    assert!(signed.starts_with("SAMLRequest="));

    let sig_alg = parameter(&url, "SigAlg").unwrap_or_default();
    let signature = base64::engine::general_purpose::STANDARD
        .decode(parameter(&url, "Signature").unwrap_or_default())?;
    kc_crypto::verify(key.public_key(), signing_scheme(&sig_alg)?, signed.as_bytes(), &signature)?;
    Ok(())
}

/// Tests the default algorithm on the query string signature.
#[test]
fn test_redirect_default_rsa_sha1() -> anyhow::Result<()> {
    let key = signing_key()?;
    let url = BindingBuilder::new()
        .sign_with(key.clone())
        .sign_document()
        .build()?
        .redirect_binding(Document::parse(SAMPLE_LOGOUT_REQUEST)?)?
        .request_uri(SLO_URL)?;

    let sig_alg = parameter(&url, "SigAlg").unwrap_or_default();
    assert_eq!(sig_alg, "http://www.w3.org/2000/09/xmldsig#rsa-sha1");
    assert_eq!(signing_scheme(&sig_alg)?, SigningScheme::RsaPkcs1Sha1);

    let query = url.query().unwrap_or_default();
    let (signed, _) = query
        .split_once("&Signature=")
        .ok_or_else(|| anyhow::anyhow!("no Signature parameter"))?;
    let signature = base64::engine::general_purpose::STANDARD
        .decode(parameter(&url, "Signature").unwrap_or_default())?;
    assert_eq!(signature.len(), 256);
    kc_crypto::verify(key.public_key(), SigningScheme::RsaPkcs1Sha1, signed.as_bytes(), &signature)?;
    Ok(())
}

/// Tests that the redirect payload inflates to the serialized document and
/// the document carries no XML signature.
#[test]
fn test_redirect_payload_roundtrip() -> anyhow::Result<()> {
    let config = BindingBuilder::new()
        .sign_with(signing_key()?)
        .sign_document()
        .build()?;
    let binding = config.redirect_binding(sample_response()?)?;

    assert_eq!(count(binding.document(), XMLDSIG_NS, "Signature")?, 0);
    assert_eq!(inflate(&binding.encoded()?)?, binding.document().to_xml_string());

    let url = binding.generate_uri(SLO_URL, MessageType::Response)?;
    assert_eq!(url.host_str(), Some("sp.example.com"));
    assert_eq!(url.path(), "/saml/slo");
    let payload = parameter(&url, "SAMLResponse").unwrap_or_default();
    assert_eq!(inflate(&payload)?, binding.document().to_xml_string());
    Ok(())
}

/// Tests an unsigned redirect without RelayState.
#[test]
fn test_redirect_unsigned() -> anyhow::Result<()> {
    let config = BindingBuilder::new().build()?;
    let url = config
        .redirect_binding(sample_response()?)?
        .response_uri(SLO_URL)?;
    assert_eq!(parameter_names(&url), ["SAMLResponse"]);
    Ok(())
}

/// Tests the redirect order: the assertion is encrypted first, so there is
/// no plaintext assertion left to sign.
#[test]
fn test_redirect_encrypts_before_signing_assertions() -> anyhow::Result<()> {
    init_tracing();
    let config = BindingBuilder::new()
        .sign_with(signing_key()?)
        .sign_assertions()
        .encrypt(sp_encryption_key()?)
        .build()?;
    let binding = config.redirect_binding(sample_response()?)?;
    let doc = binding.document();

    assert_eq!(count(doc, SAML_NS, "EncryptedAssertion")?, 1);
    assert_eq!(count(doc, XMLDSIG_NS, "Signature")?, 0);

    let decrypted = decrypt_assertion(doc)?;
    assert_eq!(count(&decrypted, XMLDSIG_NS, "Signature")?, 0);
    Ok(())
}

/// Tests that a relative action URL is rejected.
#[test]
fn test_redirect_relative_action() -> anyhow::Result<()> {
    let config = BindingBuilder::new().build()?;
    let err = config
        .redirect_binding(sample_response()?)?
        .response_uri("/saml/slo")
        .expect_err("relative URLs cannot carry a query");
    assert!(err.is_processing(), "expected processing error, got {err}");
    Ok(())
}
