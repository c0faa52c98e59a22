//! Common test utilities and fixtures.
//!
//! Signatures are checked independently of the signer: the digest is
//! recomputed over the signed element with the signature excluded, and the
//! signature value is verified over the canonical `SignedInfo`.

use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context};
use base64::Engine;
use flate2::read::DeflateDecoder;

use kc_crypto::{
    pem_to_der, unwrap_key_rsa_oaep, Certificate, ContentCipher, EncryptionPublicKey,
    HashAlgorithm, SigningKeyPair, SigningScheme,
};
use kc_saml_core::constants::{digest_algorithms, XMLDSIG_NS, XMLENC_NS};
use kc_saml_core::encryption::cipher_uri;
use kc_saml_core::xml::{canonicalize, CanonicalizationMethod, Document, NodeId};
use kc_saml_core::SignatureAlgorithm;

const IDP_SIGNING_KEY: &str = include_str!("../../fixtures/idp-signing-key.pem");
const IDP_SIGNING_CERT: &str = include_str!("../../fixtures/idp-signing-cert.pem");
const IDP_EC_SIGNING_KEY: &str = include_str!("../../fixtures/idp-ec-signing-key.pem");
const SP_ENCRYPTION_CERT: &str = include_str!("../../fixtures/sp-encryption-cert.pem");
const SP_ENCRYPTION_KEY: &str = include_str!("../../fixtures/sp-encryption-key.pem");

/// A minimal SAML response with one assertion.
pub const SAMPLE_RESPONSE: &str = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_8e8dc5f69a98cc4c1ff3427e5ce34606fd672f91e6" Version="2.0" IssueInstant="2014-07-17T01:01:48Z" Destination="https://sp.example.com/acs" InResponseTo="ONELOGIN_4fee3b046395c4e751011e97f8900b5273d56685"><saml:Issuer>https://idp.example.com/realms/test</saml:Issuer><samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status><saml:Assertion xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" ID="_d71a3a8e9fcc45c9e9d248ef7049393fc8f04e5f75" Version="2.0" IssueInstant="2014-07-17T01:01:48Z"><saml:Issuer>https://idp.example.com/realms/test</saml:Issuer><saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:transient">_ce3d2948b4cf20146dee0a0b3dd6f69b6cf86f62d7</saml:NameID></saml:Subject><saml:AttributeStatement><saml:Attribute Name="mail"><saml:AttributeValue xsi:type="xs:string">alice@example.com</saml:AttributeValue></saml:Attribute></saml:AttributeStatement></saml:Assertion></samlp:Response>"#;

/// A logout request without an assertion.
pub const SAMPLE_LOGOUT_REQUEST: &str = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_logout1" Version="2.0" IssueInstant="2014-07-18T01:13:06Z"><saml:Issuer>https://idp.example.com/realms/test</saml:Issuer><saml:NameID>alice</saml:NameID></samlp:LogoutRequest>"#;

/// Installs a test subscriber once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("kc_saml_core=debug")
        .with_test_writer()
        .try_init();
}

/// Parses [`SAMPLE_RESPONSE`].
pub fn sample_response() -> anyhow::Result<Document> {
    Ok(Document::parse(SAMPLE_RESPONSE)?)
}

/// The IdP's RSA signing key.
pub fn signing_key() -> anyhow::Result<Arc<SigningKeyPair>> {
    Ok(Arc::new(SigningKeyPair::from_pem(IDP_SIGNING_KEY)?))
}

/// The IdP's P-256 signing key.
pub fn ec_signing_key() -> anyhow::Result<Arc<SigningKeyPair>> {
    Ok(Arc::new(SigningKeyPair::from_pem(IDP_EC_SIGNING_KEY)?))
}

/// The IdP's signing certificate.
pub fn signing_certificate() -> anyhow::Result<Certificate> {
    Ok(Certificate::from_pem(IDP_SIGNING_CERT)?)
}

/// The SP's encryption key, taken from its certificate.
pub fn sp_encryption_key() -> anyhow::Result<EncryptionPublicKey> {
    Ok(EncryptionPublicKey::from_certificate(&Certificate::from_pem(
        SP_ENCRYPTION_CERT,
    )?)?)
}

/// Returns the first descendant element with the given name.
pub fn find(doc: &Document, namespace: &str, local: &str) -> anyhow::Result<NodeId> {
    doc.find_descendant(namespace, local)
        .with_context(|| format!("no {local} element"))
}

/// Counts the elements with the given name.
pub fn count(doc: &Document, namespace: &str, local: &str) -> anyhow::Result<usize> {
    let root = doc.root_element()?;
    Ok(doc
        .descendants(root)
        .into_iter()
        .filter(|&id| doc.element(id).is_some_and(|e| e.name.is(namespace, local)))
        .count())
}

/// Verifies the enveloped signature that is a direct child of `signed`.
pub fn verify_enveloped_signature(
    doc: &Document,
    signed: NodeId,
    key: &SigningKeyPair,
) -> anyhow::Result<()> {
    let signature = ds_child(doc, signed, "Signature")?;
    let signed_info = ds_child(doc, signature, "SignedInfo")?;
    let method = CanonicalizationMethod::from_uri(&algorithm(
        doc,
        ds_child(doc, signed_info, "CanonicalizationMethod")?,
    )?)
    .context("unknown canonicalization method")?;

    let reference = ds_child(doc, signed_info, "Reference")?;
    let expected_uri = doc
        .element(signed)
        .and_then(|e| e.attribute("ID"))
        .map(|id| format!("#{id}"))
        .unwrap_or_default();
    let uri = doc.element(reference).and_then(|e| e.attribute("URI"));
    anyhow::ensure!(uri == Some(expected_uri.as_str()), "reference URI {uri:?} does not point at the signed element");

    let digest = digest_algorithm(&algorithm(doc, ds_child(doc, reference, "DigestMethod")?)?)?;
    let expected_digest = base64::engine::general_purpose::STANDARD
        .decode(doc.text_content(ds_child(doc, reference, "DigestValue")?))?;
    let canonical = canonicalize(doc, signed, method.without_comments(), Some(signature))?;
    anyhow::ensure!(
        kc_crypto::hash(digest, canonical.as_bytes()) == expected_digest,
        "digest mismatch"
    );

    let scheme = signing_scheme(&algorithm(doc, ds_child(doc, signed_info, "SignatureMethod")?)?)?;
    let value = base64::engine::general_purpose::STANDARD
        .decode(doc.text_content(ds_child(doc, signature, "SignatureValue")?))?;
    let canonical_signed_info = canonicalize(doc, signed_info, method, None)?;
    kc_crypto::verify(key.public_key(), scheme, canonical_signed_info.as_bytes(), &value)?;
    Ok(())
}

/// Decrypts the document's `EncryptedData` with the SP private key and
/// parses the plaintext element as a standalone document.
pub fn decrypt_assertion(doc: &Document) -> anyhow::Result<Document> {
    let encrypted_data = find(doc, XMLENC_NS, "EncryptedData")?;
    let method = algorithm(doc, xenc_child(doc, encrypted_data, "EncryptionMethod")?)?;
    let cipher = [
        ContentCipher::Aes128Cbc,
        ContentCipher::Aes256Cbc,
        ContentCipher::Aes128Gcm,
        ContentCipher::Aes256Gcm,
    ]
    .into_iter()
    .find(|cipher| cipher_uri(*cipher) == method)
    .with_context(|| format!("unknown content cipher {method}"))?;

    let key_info = ds_child(doc, encrypted_data, "KeyInfo")?;
    let encrypted_key = xenc_child(doc, key_info, "EncryptedKey")?;
    let wrapped = cipher_value(doc, encrypted_key)?;
    let private_key = pem_to_der(SP_ENCRYPTION_KEY, "PRIVATE KEY").context("SP key PEM")?;
    let content_key = unwrap_key_rsa_oaep(&private_key, &wrapped)?;

    let plaintext = cipher.decrypt(&content_key, &cipher_value(doc, encrypted_data)?)?;
    Ok(Document::parse(&String::from_utf8(plaintext)?)?)
}

/// Reverses the redirect payload encoding.
pub fn inflate(encoded: &str) -> anyhow::Result<String> {
    let compressed = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    let mut xml = String::new();
    DeflateDecoder::new(compressed.as_slice()).read_to_string(&mut xml)?;
    Ok(xml)
}

/// Maps a `SignatureMethod` URI to the scheme that verifies it.
pub fn signing_scheme(uri: &str) -> anyhow::Result<SigningScheme> {
    Ok(match SignatureAlgorithm::from_uri(uri) {
        Some(SignatureAlgorithm::RsaSha1) => SigningScheme::RsaPkcs1Sha1,
        Some(SignatureAlgorithm::RsaSha256) => SigningScheme::RsaPkcs1Sha256,
        Some(SignatureAlgorithm::RsaSha384) => SigningScheme::RsaPkcs1Sha384,
        Some(SignatureAlgorithm::RsaSha512) => SigningScheme::RsaPkcs1Sha512,
        Some(SignatureAlgorithm::EcdsaSha256) => SigningScheme::EcdsaP256Sha256,
        Some(SignatureAlgorithm::EcdsaSha384) => SigningScheme::EcdsaP384Sha384,
        Some(SignatureAlgorithm::EcdsaSha512) => SigningScheme::EcdsaP521Sha512,
        _ => bail!("no verifier for {uri}"),
    })
}

fn digest_algorithm(uri: &str) -> anyhow::Result<HashAlgorithm> {
    Ok(match uri {
        digest_algorithms::SHA1 => HashAlgorithm::Sha1,
        digest_algorithms::SHA256 => HashAlgorithm::Sha256,
        digest_algorithms::SHA384 => HashAlgorithm::Sha384,
        digest_algorithms::SHA512 => HashAlgorithm::Sha512,
        _ => bail!("unknown digest method {uri}"),
    })
}

fn algorithm(doc: &Document, id: NodeId) -> anyhow::Result<String> {
    doc.element(id)
        .and_then(|e| e.attribute("Algorithm"))
        .map(str::to_string)
        .context("missing Algorithm attribute")
}

fn cipher_value(doc: &Document, parent: NodeId) -> anyhow::Result<Vec<u8>> {
    let value = xenc_child(doc, xenc_child(doc, parent, "CipherData")?, "CipherValue")?;
    Ok(base64::engine::general_purpose::STANDARD.decode(doc.text_content(value))?)
}

fn ds_child(doc: &Document, parent: NodeId, local: &str) -> anyhow::Result<NodeId> {
    doc.child_element(parent, XMLDSIG_NS, local)
        .with_context(|| format!("no ds:{local} element"))
}

fn xenc_child(doc: &Document, parent: NodeId, local: &str) -> anyhow::Result<NodeId> {
    doc.child_element(parent, XMLENC_NS, local)
        .with_context(|| format!("no xenc:{local} element"))
}
