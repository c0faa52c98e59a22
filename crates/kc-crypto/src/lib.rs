//! # kc-crypto
//!
//! Cryptographic operations for the Keycloak Rust SAML binding core using aws-lc-rs.
//!
//! ## Scope
//!
//! - Hashing for XML-DSig digests (SHA-1 for legacy peers, SHA-2 family)
//! - RSA PKCS#1 v1.5 and ECDSA signing over raw bytes
//! - Key material: signing key pairs, X.509 certificates, encryption public keys
//! - Symmetric key generation, AES content encryption and RSA-OAEP key transport
//!
//! SAML 2.0 peers still negotiate SHA-1 and SHA-256 based algorithms, so unlike
//! the OIDC side of the server this crate does not restrict itself to CNSA 2.0.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod cipher;
pub mod hash;
pub mod keys;
pub mod random;
pub mod signature;

pub use algorithm::{AlgorithmError, EllipticCurve, HashAlgorithm, KeyType, SigningScheme};
pub use cipher::{unwrap_key_rsa_oaep, wrap_key_rsa_oaep, CipherError, ContentCipher, SecretKey};
pub use hash::{hash, sha1, sha256, sha384, sha512};
pub use keys::{pem_to_der, Certificate, EncryptionPublicKey, KeyError, SigningKeyPair};
pub use random::{generate_secret_key, random_bytes};
pub use signature::{verify, SignatureError, Signer};
