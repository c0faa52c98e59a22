//! Owned XML tree for SAML documents.
//!
//! The binding pipeline edits documents structurally: it clones an assertion
//! into a scratch document, signs it, and splices it back, or swaps an
//! assertion for its encrypted form. [`Document`] is an arena of nodes
//! addressed by [`NodeId`] so those edits are explicit moves between trees.
//!
//! - [`Document::parse`] reads a document with `quick-xml`, resolving
//!   namespaces up front so every name carries its URI
//! - [`Document::to_xml_string`] serializes, declaring any namespace a
//!   detached subtree needs
//! - [`canonicalize`] produces inclusive or exclusive C14N output for signing

mod c14n;
mod document;
mod parser;
mod writer;

pub use c14n::{canonicalize, CanonicalizationMethod};
pub use document::{Attribute, Document, Element, NodeId, NodeKind, QName};

use thiserror::Error;

/// Result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;

/// XML parsing and tree editing errors.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The underlying reader rejected the input.
    #[error("XML parsing error: {0}")]
    Parse(#[from] quick_xml::Error),

    /// The input is not a well-formed single-rooted document.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// Document type declarations are refused.
    #[error("DOCTYPE declarations are not allowed")]
    DoctypeNotAllowed,

    /// A prefix was used without a namespace declaration in scope.
    #[error("undeclared namespace prefix: {0}")]
    UnboundPrefix(String),

    /// A tree edit referenced a node in the wrong state.
    #[error("invalid tree operation: {0}")]
    InvalidOperation(String),
}
