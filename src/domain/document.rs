//! Arena-backed mutable document tree (SVG DOM subset)

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};

/// Handle to a node in a [`Document`]. Stale once the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "node#{slot}.{generation}")
    }
}

/// Namespace-qualified XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            local: local.into(),
        }
    }

    pub fn namespaced(
        namespace: impl Into<String>,
        prefix: Option<&str>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: prefix.map(str::to_owned),
            local: local.into(),
        }
    }

    /// Same namespace and prefix as `self`, different local name.
    pub fn sibling(&self, local: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            prefix: self.prefix.clone(),
            local: local.into(),
        }
    }

    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// Namespace declaration carried by an element (`xmlns` / `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub namespaces: Vec<NamespaceDecl>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute(QName::local("id"), id)
    }

    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(namespace, local))
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.matches(name.namespace.as_deref(), &name.local))
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// The un-namespaced `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute(None, "id")
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Mutable document tree.
///
/// Nodes live in a generational arena; detached nodes stay in the arena until
/// [`Document::remove`] drops them together with their subtree.
#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<Node>,
    root: NodeId,
}

impl Document {
    pub fn new(root: Element) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(Node {
            kind: NodeKind::Element(root),
            parent: None,
            children: Vec::new(),
        }));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        NodeId(self.arena.insert(Node {
            kind,
            parent: None,
            children: Vec::new(),
        }))
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.create(NodeKind::Element(element))
    }

    pub fn node(&self, id: NodeId) -> DomainResult<&Node> {
        self.arena.get(id.0).ok_or(DomainError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut Node> {
        self.arena.get_mut(id.0).ok_or(DomainError::UnknownNode(id))
    }

    /// Element payload, or `None` for text/comment nodes and stale ids.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.arena.get(id.0).and_then(Node::element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> DomainResult<&mut Element> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(e) => Ok(e),
            _ => Err(DomainError::NotAnElement(id)),
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id.0).and_then(|n| n.parent)
    }

    /// Unlink a node from its parent, keeping it (and its subtree) in the arena.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, id: NodeId) -> DomainResult<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Move `child` to the end of `parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Move `child` right before `reference`, which must be a child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> DomainResult<()> {
        if self.parent(reference) != Some(parent) {
            return Err(DomainError::NotAChild {
                parent,
                child: reference,
            });
        }
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomainError::NotAChild {
                parent,
                child: reference,
            })?;
        siblings.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node and drop it, with its whole subtree, from the arena.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> DomainResult<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Pre-order traversal of the subtree rooted at `from` (including `from`).
    pub fn descendants(&self, from: NodeId) -> Descendants<'_> {
        Descendants::new(self, from)
    }

    /// Element ids of the direct children of `parent`, skipping id-less nodes.
    pub fn child_ids(&self, parent: NodeId) -> Vec<String> {
        self.children(parent)
            .iter()
            .filter_map(|&c| self.element(c).and_then(Element::id).map(str::to_owned))
            .collect()
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    fn new(document: &'a Document, from: NodeId) -> Self {
        let stack = if document.contains(from) {
            vec![from]
        } else {
            Vec::new()
        };
        Self { document, stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Ok(node) = self.document.node(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current, node));
            }
        }
        None
    }
}
