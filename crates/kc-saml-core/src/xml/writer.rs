//! Serialization.

use std::collections::BTreeMap;

use quick_xml::escape::partial_escape;

use super::document::{required_declarations, Document, NodeId, NodeKind};

/// Serializes `id` and its descendants. Bindings inherited from ancestors
/// are declared on `id` so the output stands alone.
pub(crate) fn write_subtree(doc: &Document, id: NodeId) -> String {
    let inherited = doc
        .parent(id)
        .map(|parent| doc.in_scope_namespaces(parent))
        .unwrap_or_default();

    let mut out = String::new();
    write_node(doc, id, &BTreeMap::new(), Some(&inherited), &mut out);
    out
}

fn write_node(
    doc: &Document,
    id: NodeId,
    scope: &BTreeMap<String, String>,
    inherited: Option<&BTreeMap<String, String>>,
    out: &mut String,
) {
    match doc.kind(id) {
        None => {}
        Some(NodeKind::Text(text)) => out.push_str(&partial_escape(text.as_str())),
        Some(NodeKind::Comment(comment)) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Some(NodeKind::ProcessingInstruction { target, data }) => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
        Some(NodeKind::Element(element)) => {
            let mut decls = required_declarations(element, scope);
            if let Some(inherited) = inherited {
                for (prefix, uri) in inherited {
                    // The element's own name decides the default namespace.
                    if uri.is_empty() || (prefix.is_empty() && element.name.prefix.is_none()) {
                        continue;
                    }
                    if !decls.iter().any(|(p, _)| p == prefix) {
                        decls.push((prefix.clone(), uri.clone()));
                    }
                }
            }

            let name = element.name.qualified();
            out.push('<');
            out.push_str(&name);
            for (prefix, uri) in &decls {
                if prefix.is_empty() {
                    out.push_str(" xmlns=\"");
                } else {
                    out.push_str(" xmlns:");
                    out.push_str(prefix);
                    out.push_str("=\"");
                }
                escape_attribute(uri, out);
                out.push('"');
            }
            for attr in &element.attributes {
                out.push(' ');
                out.push_str(&attr.name.qualified());
                out.push_str("=\"");
                escape_attribute(&attr.value, out);
                out.push('"');
            }

            let children = doc.children(id);
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');

            let mut child_scope = scope.clone();
            child_scope.extend(decls);
            for &child in children {
                write_node(doc, child, &child_scope, None, out);
            }

            out.push_str("</");
            out.push_str(&name);
            out.push('>');
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
