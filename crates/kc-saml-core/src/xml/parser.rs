//! Parsing with `quick-xml`, resolving namespaces as elements open.
//!
//! DOCTYPE declarations are refused outright so no entity expansion ever
//! happens. Comments and processing instructions outside the root element
//! are dropped.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::document::{Attribute, Document, Element, NodeId, NodeKind, QName};
use super::{XmlError, XmlResult};
use crate::constants::XML_NS;

pub(crate) fn parse(xml: &str) -> XmlResult<Document> {
    // XML line-end normalization
    let normalized;
    let input = if xml.contains('\r') {
        normalized = xml.replace("\r\n", "\n").replace('\r', "\n");
        normalized.as_str()
    } else {
        xml
    };

    let mut reader = Reader::from_str(input);
    let mut doc = Document::new();
    let mut open: Vec<NodeId> = Vec::new();
    let mut scopes: Vec<BTreeMap<String, String>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let id = open_element(&mut doc, &start, &mut scopes)?;
                attach(&mut doc, &open, id)?;
                open.push(id);
            }
            Event::Empty(start) => {
                let id = open_element(&mut doc, &start, &mut scopes)?;
                attach(&mut doc, &open, id)?;
                scopes.pop();
            }
            Event::End(_) => {
                if open.pop().is_none() {
                    return Err(XmlError::Malformed("unexpected closing tag".to_string()));
                }
                scopes.pop();
            }
            Event::Text(text) => {
                let content = text.unescape()?;
                match open.last() {
                    Some(&parent) => {
                        let node = doc.create_text(content.into_owned());
                        doc.append_child(parent, node)?;
                    }
                    None if content.trim().is_empty() => {}
                    None => {
                        return Err(XmlError::Malformed(
                            "text content outside the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(cdata) => {
                let parent = *open.last().ok_or_else(|| {
                    XmlError::Malformed("CDATA section outside the root element".to_string())
                })?;
                let content = utf8(&cdata.into_inner())?.to_string();
                let node = doc.create_text(content);
                doc.append_child(parent, node)?;
            }
            Event::Comment(comment) => {
                if let Some(&parent) = open.last() {
                    let content = utf8(&comment.into_inner())?.to_string();
                    let node = doc.create_node(NodeKind::Comment(content));
                    doc.append_child(parent, node)?;
                }
            }
            Event::PI(pi) => {
                if let Some(&parent) = open.last() {
                    let target = utf8(pi.target())?.to_string();
                    let data = utf8(pi.content())?.trim_start().to_string();
                    let node = doc.create_node(NodeKind::ProcessingInstruction { target, data });
                    doc.append_child(parent, node)?;
                }
            }
            Event::DocType(_) => return Err(XmlError::DoctypeNotAllowed),
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    if !open.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".to_string()));
    }
    if doc.root().is_none() {
        return Err(XmlError::Malformed("no root element".to_string()));
    }
    Ok(doc)
}

fn attach(doc: &mut Document, open: &[NodeId], id: NodeId) -> XmlResult<()> {
    match open.last() {
        Some(&parent) => doc.append_child(parent, id),
        None if doc.root().is_some() => {
            Err(XmlError::Malformed("more than one root element".to_string()))
        }
        None => doc.set_root(id),
    }
}

fn open_element(
    doc: &mut Document,
    start: &BytesStart<'_>,
    scopes: &mut Vec<BTreeMap<String, String>>,
) -> XmlResult<NodeId> {
    let name = utf8(start.name().as_ref())?.to_string();
    let mut scope = scopes.last().cloned().unwrap_or_default();

    let mut namespaces = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attribute_value(&attr.value)?;

        if key == "xmlns" {
            namespaces.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            if value.is_empty() {
                return Err(XmlError::Malformed(format!("prefix '{prefix}' bound to empty URI")));
            }
            namespaces.push((prefix.to_string(), value));
        } else {
            raw_attributes.push((key, value));
        }
    }
    for (prefix, uri) in &namespaces {
        scope.insert(prefix.clone(), uri.clone());
    }

    let element_name = resolve(&scope, &name, true)?;
    let attributes = raw_attributes
        .into_iter()
        .map(|(key, value)| {
            Ok(Attribute {
                name: resolve(&scope, &key, false)?,
                value,
            })
        })
        .collect::<XmlResult<Vec<_>>>()?;

    scopes.push(scope);
    Ok(doc.create_node(NodeKind::Element(Element {
        name: element_name,
        namespaces,
        attributes,
    })))
}

fn resolve(scope: &BTreeMap<String, String>, raw: &str, is_element: bool) -> XmlResult<QName> {
    match raw.split_once(':') {
        Some((prefix, local)) => {
            let namespace = if prefix == "xml" {
                XML_NS.to_string()
            } else {
                scope
                    .get(prefix)
                    .filter(|uri| !uri.is_empty())
                    .cloned()
                    .ok_or_else(|| XmlError::UnboundPrefix(prefix.to_string()))?
            };
            Ok(QName {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
                namespace: Some(namespace),
            })
        }
        None => {
            // Unprefixed attributes never take the default namespace.
            let namespace = if is_element {
                scope.get("").filter(|uri| !uri.is_empty()).cloned()
            } else {
                None
            };
            Ok(QName {
                prefix: None,
                local: raw.to_string(),
                namespace,
            })
        }
    }
}

fn attribute_value(raw: &[u8]) -> XmlResult<String> {
    let raw = utf8(raw)?;
    let normalized: String = raw
        .chars()
        .map(|c| if matches!(c, '\t' | '\n') { ' ' } else { c })
        .collect();
    quick_xml::escape::unescape(&normalized)
        .map(Cow::into_owned)
        .map_err(|e| XmlError::Malformed(e.to_string()))
}

fn utf8(bytes: &[u8]) -> XmlResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| XmlError::Malformed(format!("invalid UTF-8: {e}")))
}
