//! Canonical XML 1.0 and Exclusive XML Canonicalization 1.0.
//!
//! Only element subtrees are canonicalized; that is all an enveloped
//! same-document reference or a `SignedInfo` ever needs.

use std::collections::BTreeMap;

use super::document::{required_declarations, Document, Element, NodeId, NodeKind};
use super::{XmlError, XmlResult};
use crate::constants::canonicalization_algorithms;

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CanonicalizationMethod {
    /// Exclusive C14N without comments.
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
    /// C14N without comments.
    C14N,
    /// C14N with comments.
    C14NWithComments,
}

impl CanonicalizationMethod {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => {
                canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
            }
            Self::C14N => canonicalization_algorithms::C14N,
            Self::C14NWithComments => canonicalization_algorithms::C14N_WITH_COMMENTS,
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            canonicalization_algorithms::C14N => Some(Self::C14N),
            canonicalization_algorithms::C14N_WITH_COMMENTS => Some(Self::C14NWithComments),
            _ => None,
        }
    }

    /// Returns true for the exclusive variants.
    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        matches!(self, Self::ExclusiveC14N | Self::ExclusiveC14NWithComments)
    }

    /// Returns true if comments are kept.
    #[must_use]
    pub const fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveC14NWithComments | Self::C14NWithComments)
    }

    /// Returns the same algorithm without comments.
    ///
    /// A bare-name `#id` reference drops comments before any transform runs.
    #[must_use]
    pub const fn without_comments(self) -> Self {
        match self {
            Self::ExclusiveC14N | Self::ExclusiveC14NWithComments => Self::ExclusiveC14N,
            Self::C14N | Self::C14NWithComments => Self::C14N,
        }
    }
}

/// Canonicalizes the element subtree at `node`.
///
/// `exclude` removes one subtree from the output, which is how the
/// enveloped-signature transform is applied.
///
/// ## Errors
///
/// Returns an error if `node` is not an element.
pub fn canonicalize(
    doc: &Document,
    node: NodeId,
    method: CanonicalizationMethod,
    exclude: Option<NodeId>,
) -> XmlResult<String> {
    if doc.element(node).is_none() {
        return Err(XmlError::InvalidOperation(
            "canonicalization starts at an element".to_string(),
        ));
    }

    let context = doc
        .parent(node)
        .map(|parent| doc.in_scope_namespaces(parent))
        .unwrap_or_default();

    let mut canon = Canonicalizer {
        doc,
        method,
        exclude,
        out: String::new(),
    };
    canon.node(node, &context, &BTreeMap::new());
    Ok(canon.out)
}

struct Canonicalizer<'d> {
    doc: &'d Document,
    method: CanonicalizationMethod,
    exclude: Option<NodeId>,
    out: String,
}

impl Canonicalizer<'_> {
    /// `scope` holds the bindings in effect at the parent, `rendered` the
    /// bindings output ancestors have already emitted.
    fn node(
        &mut self,
        id: NodeId,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
    ) {
        if Some(id) == self.exclude {
            return;
        }
        match self.doc.kind(id) {
            None => {}
            Some(NodeKind::Element(element)) => self.element(id, element, scope, rendered),
            Some(NodeKind::Text(text)) => escape_text(text, &mut self.out),
            Some(NodeKind::Comment(comment)) => {
                if self.method.with_comments() {
                    self.out.push_str("<!--");
                    self.out.push_str(comment);
                    self.out.push_str("-->");
                }
            }
            Some(NodeKind::ProcessingInstruction { target, data }) => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !data.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push_str("?>");
            }
        }
    }

    fn element(
        &mut self,
        id: NodeId,
        element: &Element,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
    ) {
        let mut element_scope = scope.clone();
        element_scope.extend(required_declarations(element, scope));

        let candidates: Vec<(String, String)> = if self.method.is_exclusive() {
            visibly_utilized(element)
        } else {
            element_scope
                .iter()
                .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
                .collect()
        };

        let mut declarations: BTreeMap<String, String> = BTreeMap::new();
        for (prefix, uri) in candidates {
            let already = rendered.get(&prefix);
            let emit = if uri.is_empty() {
                // Only an empty default can be rendered, and only to undo a
                // non-empty default from an output ancestor.
                prefix.is_empty() && already.is_some_and(|u| !u.is_empty())
            } else {
                already != Some(&uri)
            };
            if emit {
                declarations.insert(prefix, uri);
            }
        }

        let mut attributes: Vec<(&str, &str, String, &str)> = element
            .attributes
            .iter()
            .map(|attr| {
                (
                    attr.name.namespace.as_deref().unwrap_or(""),
                    attr.name.local.as_str(),
                    attr.name.qualified(),
                    attr.value.as_str(),
                )
            })
            .collect();
        attributes.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let name = element.name.qualified();
        self.out.push('<');
        self.out.push_str(&name);
        // BTreeMap order puts the default namespace first, then prefixes.
        for (prefix, uri) in &declarations {
            if prefix.is_empty() {
                self.out.push_str(" xmlns=\"");
            } else {
                self.out.push_str(" xmlns:");
                self.out.push_str(prefix);
                self.out.push_str("=\"");
            }
            escape_attribute(uri, &mut self.out);
            self.out.push('"');
        }
        for (_, _, qualified, value) in &attributes {
            self.out.push(' ');
            self.out.push_str(qualified);
            self.out.push_str("=\"");
            escape_attribute(value, &mut self.out);
            self.out.push('"');
        }
        self.out.push('>');

        let mut child_rendered = rendered.clone();
        child_rendered.extend(declarations);
        for &child in self.doc.children(id) {
            self.node(child, &element_scope, &child_rendered);
        }

        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
    }
}

/// Namespace bindings an element's own name and attributes use.
fn visibly_utilized(element: &Element) -> Vec<(String, String)> {
    let mut used = vec![(
        element.name.prefix.clone().unwrap_or_default(),
        element.name.namespace.clone().unwrap_or_default(),
    )];
    for attr in &element.attributes {
        if let (Some(prefix), Some(uri)) = (&attr.name.prefix, &attr.name.namespace) {
            if prefix != "xml" && !used.iter().any(|(p, _)| p == prefix) {
                used.push((prefix.clone(), uri.clone()));
            }
        }
    }
    used
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}
