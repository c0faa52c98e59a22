//! Arena-backed XML document.

use std::collections::BTreeMap;

use super::{parser, writer, XmlError, XmlResult};

/// Handle to a node inside one [`Document`].
///
/// Ids are not transferable between documents; use [`Document::import_node`]
/// to copy a subtree across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A namespace-resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// The prefix as written, if any.
    pub prefix: Option<String>,
    /// The local part.
    pub local: String,
    /// The namespace URI the name resolves to.
    pub namespace: Option<String>,
}

impl QName {
    /// Creates a namespaced name.
    #[must_use]
    pub fn new(namespace: &str, prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            namespace: Some(namespace.to_string()),
        }
    }

    /// Creates a name in no namespace.
    #[must_use]
    pub fn unqualified(local: &str) -> Self {
        Self {
            prefix: None,
            local: local.to_string(),
            namespace: None,
        }
    }

    /// Returns the name as written: `prefix:local` or `local`.
    #[must_use]
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }

    /// Returns true if the name has the given namespace and local part.
    #[must_use]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }
}

/// An attribute on an element. Namespace declarations are kept separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: QName,
    /// Unescaped value.
    pub value: String,
}

/// Element data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element name.
    pub name: QName,
    /// Namespace declarations on this element as `(prefix, uri)`.
    /// The default namespace uses the empty prefix.
    pub namespaces: Vec<(String, String)>,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Creates an element with no attributes or declarations.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Returns the value of an attribute in no namespace.
    #[must_use]
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.namespace.is_none() && attr.name.local == local)
            .map(|attr| attr.value.as_str())
    }

    /// Sets an attribute in no namespace, replacing any existing value.
    pub fn set_attribute(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attr) = self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.namespace.is_none() && attr.name.local == local)
        {
            attr.value = value;
        } else {
            self.attributes.push(Attribute {
                name: QName::unqualified(local),
                value,
            });
        }
    }

    /// Declares a namespace prefix on this element.
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) {
        if let Some(decl) = self.namespaces.iter_mut().find(|(p, _)| p == prefix) {
            decl.1 = uri.to_string();
        } else {
            self.namespaces.push((prefix.to_string(), uri.to_string()));
        }
    }
}

/// Node payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element.
    Element(Element),
    /// Character data (CDATA sections are stored as text).
    Text(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// PI target.
        target: String,
        /// PI content, possibly empty.
        data: String,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document with a single root element.
///
/// Removed nodes are purged from the arena; their ids stop resolving.
/// Purged slots are never reused, so a `NodeId` cannot silently point at a
/// newer node, and the arena only shrinks when the tree is copied out with
/// [`Document::extract_subtree`]. Documents here live for one message, so
/// the tombstones are dropped with it.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: Option<NodeId>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a document from a string.
    ///
    /// ## Errors
    ///
    /// Returns an error for malformed input, undeclared prefixes or a DOCTYPE.
    pub fn parse(xml: &str) -> XmlResult<Self> {
        parser::parse(xml)
    }

    /// Serializes the document without an XML declaration.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        self.root
            .map(|root| writer::write_subtree(self, root))
            .unwrap_or_default()
    }

    /// Serializes one subtree so it can be parsed on its own.
    ///
    /// Namespaces in scope from ancestors are declared on the subtree's top
    /// element.
    #[must_use]
    pub fn node_to_string(&self, id: NodeId) -> String {
        writer::write_subtree(self, id)
    }

    /// Returns the root node.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the root element.
    ///
    /// ## Errors
    ///
    /// Returns an error if the document is empty.
    pub fn root_element(&self) -> XmlResult<NodeId> {
        self.root
            .ok_or_else(|| XmlError::InvalidOperation("document has no root element".to_string()))
    }

    /// Makes a detached element the document root.
    ///
    /// ## Errors
    ///
    /// Returns an error if a root already exists or the node is not a detached element.
    pub fn set_root(&mut self, id: NodeId) -> XmlResult<()> {
        if self.root.is_some() {
            return Err(XmlError::InvalidOperation("document already has a root".to_string()));
        }
        self.require_detached(id)?;
        if self.element(id).is_none() {
            return Err(XmlError::InvalidOperation("root must be an element".to_string()));
        }
        self.root = Some(id);
        Ok(())
    }

    /// Returns a node's payload.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    /// Returns the element payload if `id` is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Returns the mutable element payload if `id` is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(Node {
                kind: NodeKind::Element(element),
                ..
            }) => Some(element),
            _ => None,
        }
    }

    /// Returns a node's parent.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Returns a node's children in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Iterates over the element children of a node.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
    }

    /// Returns the first element child with the given name.
    #[must_use]
    pub fn child_element(&self, parent: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.child_elements(parent)
            .find(|&child| self.element(child).is_some_and(|e| e.name.is(namespace, local)))
    }

    /// Returns the first element in document order with the given name,
    /// including the root.
    #[must_use]
    pub fn find_descendant(&self, namespace: &str, local: &str) -> Option<NodeId> {
        let root = self.root?;
        self.descendants(root)
            .into_iter()
            .find(|&id| self.element(id).is_some_and(|e| e.name.is(namespace, local)))
    }

    /// Returns `id` and all nodes below it in document order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Concatenates all text below a node.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                Some(NodeKind::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces an element's children with a single text node.
    ///
    /// ## Errors
    ///
    /// Returns an error if `id` is not an element.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> XmlResult<()> {
        if self.element(id).is_none() {
            return Err(XmlError::InvalidOperation("text can only be set on elements".to_string()));
        }
        let old_children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in old_children {
            self.purge(child);
        }
        let text = self.create_text(text);
        self.link(id, text, None);
        Ok(())
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.create_node(NodeKind::Element(Element::new(name)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Text(text.into()))
    }

    /// Creates a detached node of any kind.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    /// Appends a detached node as the last child of `parent`.
    ///
    /// ## Errors
    ///
    /// Returns an error if `parent` is not an element or `child` is attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> XmlResult<()> {
        self.check_insert(parent, child)?;
        self.link(parent, child, None);
        Ok(())
    }

    /// Inserts a detached node as the next sibling of `reference`.
    ///
    /// ## Errors
    ///
    /// Returns an error if `reference` has no parent or `node` is attached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> XmlResult<()> {
        let parent = self.parent(reference).ok_or_else(|| {
            XmlError::InvalidOperation("cannot insert a sibling next to a parentless node".to_string())
        })?;
        self.check_insert(parent, node)?;
        let index = self.child_index(parent, reference)?;
        self.link(parent, node, Some(index + 1));
        Ok(())
    }

    /// Puts a detached node in the place of `old` and purges `old`'s subtree.
    ///
    /// `old` may be the root element, in which case `new` becomes the root.
    ///
    /// ## Errors
    ///
    /// Returns an error if `old` is not attached or `new` is not detached.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> XmlResult<()> {
        self.require_detached(new)?;
        if let Some(parent) = self.parent(old) {
            let index = self.child_index(parent, old)?;
            self.node_mut(parent)?.children[index] = new;
            self.node_mut(new)?.parent = Some(parent);
        } else if self.root == Some(old) {
            if self.element(new).is_none() {
                return Err(XmlError::InvalidOperation("root must be an element".to_string()));
            }
            self.root = Some(new);
        } else {
            return Err(XmlError::InvalidOperation("node to replace is not attached".to_string()));
        }
        self.purge(old);
        Ok(())
    }

    /// Detaches a node and purges its subtree.
    ///
    /// ## Errors
    ///
    /// Returns an error if the node does not exist.
    pub fn remove(&mut self, id: NodeId) -> XmlResult<()> {
        if let Some(parent) = self.parent(id) {
            let index = self.child_index(parent, id)?;
            self.node_mut(parent)?.children.remove(index);
        } else if self.root == Some(id) {
            self.root = None;
        } else {
            self.node(id)?;
        }
        self.purge(id);
        Ok(())
    }

    /// Returns the namespace bindings in effect at an element, including its
    /// own declarations, as `prefix -> uri`.
    ///
    /// An empty default namespace (`xmlns=""`) appears as `"" -> ""`.
    #[must_use]
    pub fn in_scope_namespaces(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }

        let mut scope = BTreeMap::new();
        for node in chain.into_iter().rev() {
            if let Some(element) = self.element(node) {
                for (prefix, uri) in required_declarations(element, &scope) {
                    scope.insert(prefix, uri);
                }
            }
        }
        scope
    }

    /// Copies an element subtree into a new standalone document.
    ///
    /// The copy holds only live nodes; extracting the root element compacts
    /// a document that has had nodes removed.
    ///
    /// Namespaces inherited from ancestors are declared on the new root so
    /// the copy keeps its meaning, including prefixes only referenced from
    /// attribute or text content.
    ///
    /// ## Errors
    ///
    /// Returns an error if `id` is not an element.
    pub fn extract_subtree(&self, id: NodeId) -> XmlResult<Document> {
        if self.element(id).is_none() {
            return Err(XmlError::InvalidOperation("only elements can be extracted".to_string()));
        }
        let inherited = self
            .parent(id)
            .map(|parent| self.in_scope_namespaces(parent))
            .unwrap_or_default();

        let mut doc = Document::new();
        let root = doc.copy_from(self, id)?;
        if let Some(element) = doc.element_mut(root) {
            for (prefix, uri) in inherited {
                if !uri.is_empty() && !element.namespaces.iter().any(|(p, _)| *p == prefix) {
                    element.namespaces.push((prefix, uri));
                }
            }
        }
        doc.root = Some(root);
        Ok(doc)
    }

    /// Deep-copies a subtree of `source` into this document, detached.
    ///
    /// ## Errors
    ///
    /// Returns an error if `id` does not exist in `source`.
    pub fn import_node(&mut self, source: &Document, id: NodeId) -> XmlResult<NodeId> {
        self.copy_from(source, id)
    }

    fn copy_from(&mut self, source: &Document, id: NodeId) -> XmlResult<NodeId> {
        let node = source.node(id)?;
        let copy = self.create_node(node.kind.clone());
        for &child in &node.children {
            let child_copy = self.copy_from(source, child)?;
            self.link(copy, child_copy, None);
        }
        Ok(copy)
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node(&self, id: NodeId) -> XmlResult<&Node> {
        self.get(id)
            .ok_or_else(|| XmlError::InvalidOperation(format!("unknown node {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> XmlResult<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| XmlError::InvalidOperation(format!("unknown node {}", id.0)))
    }

    fn require_detached(&self, id: NodeId) -> XmlResult<()> {
        let node = self.node(id)?;
        if node.parent.is_some() || self.root == Some(id) {
            return Err(XmlError::InvalidOperation("node is already attached".to_string()));
        }
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> XmlResult<()> {
        if self.element(parent).is_none() {
            return Err(XmlError::InvalidOperation("parent must be an element".to_string()));
        }
        self.require_detached(child)?;

        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return Err(XmlError::InvalidOperation(
                    "cannot insert a node into its own subtree".to_string(),
                ));
            }
            current = self.parent(node);
        }
        Ok(())
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> XmlResult<usize> {
        self.children(parent)
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| XmlError::InvalidOperation("node is not a child of its parent".to_string()))
    }

    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if let Some(Some(node)) = self.nodes.get_mut(child.0) {
            node.parent = Some(parent);
        }
        if let Some(Some(node)) = self.nodes.get_mut(parent.0) {
            match index {
                Some(index) if index < node.children.len() => node.children.insert(index, child),
                _ => node.children.push(child),
            }
        }
    }

    fn purge(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            if let Some(slot) = self.nodes.get_mut(node.0) {
                *slot = None;
            }
        }
    }
}

/// Returns the declarations an element must carry given the bindings
/// already in scope: its explicit declarations plus any binding its own
/// name or attribute names need that the scope does not provide.
pub(crate) fn required_declarations(
    element: &Element,
    in_scope: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut decls = element.namespaces.clone();

    let mut require = |prefix: &str, uri: &str| {
        if prefix == "xml" || decls.iter().any(|(p, _)| p == prefix) {
            return;
        }
        if in_scope.get(prefix).map(String::as_str) == Some(uri) {
            return;
        }
        if uri.is_empty() && (!prefix.is_empty() || in_scope.get("").map_or(true, String::is_empty)) {
            return;
        }
        decls.push((prefix.to_string(), uri.to_string()));
    };

    require(
        element.name.prefix.as_deref().unwrap_or(""),
        element.name.namespace.as_deref().unwrap_or(""),
    );
    for attr in &element.attributes {
        if let (Some(prefix), Some(uri)) = (&attr.name.prefix, &attr.name.namespace) {
            require(prefix, uri);
        }
    }
    decls
}
