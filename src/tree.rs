// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Arena-backed document tree exchanged with the core.
//
// Every node of a document lives in one `slab::Slab` owned by the
// `Document`; links between nodes are `NodeId`s into that slab. Copying a
// document copies the arena, so ids stay valid in the copy and no node can
// outlive its document.
//
// Ids are only meaningful for the document that produced them. Passing an id
// of another document, or of a removed node, panics like an out-of-bounds
// slice index.

use slab::Slab;

/// Handle of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Node kind. The discriminant is the 6-bit tag used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeKind {
    Document = 0,
    Element = 1,
    Data = 2,
    Cdata = 3,
    Comment = 4,
    Declaration = 5,
    Doctype = 6,
    Pi = 7,
}

impl NodeKind {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => NodeKind::Document,
            1 => NodeKind::Element,
            2 => NodeKind::Data,
            3 => NodeKind::Cdata,
            4 => NodeKind::Comment,
            5 => NodeKind::Declaration,
            6 => NodeKind::Doctype,
            7 => NodeKind::Pi,
            _ => return None,
        })
    }

    /// Elements and processing instructions must be named; every other
    /// kind except the document must not be.
    pub const fn requires_name(self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Pi)
    }
}

/// A name/value pair attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    name: String,
    value: String,
    attrs: Vec<Attribute>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind, name: String, value: String) -> Self {
        Self {
            kind,
            name,
            value,
            attrs: Vec::new(),
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// Fixed per-node cost counted by [`Document::byte_size`].
const NODE_OVERHEAD: usize = std::mem::size_of::<NodeData>();
/// Fixed per-attribute cost counted by [`Document::byte_size`].
const ATTR_OVERHEAD: usize = std::mem::size_of::<Attribute>();

/// A tree of nodes rooted at a single document node.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Slab<NodeData>,
    root: NodeId,
}

impl Document {
    /// Create an empty document holding only its document node.
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(NodeData::new(
            NodeKind::Document,
            String::new(),
            String::new(),
        )));
        Self { nodes, root }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the document node included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` refers to a live node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Kind of node `id`.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Name of node `id`; empty for data, comment and document nodes.
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Text value of node `id`.
    pub fn value(&self, id: NodeId) -> &str {
        &self.node(id).value
    }

    /// Replace the name of node `id`.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        self.node_mut(id).name = name.into();
    }

    /// Replace the text value of node `id`.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.node_mut(id).value = value.into();
    }

    /// Parent of `id`, `None` for the document node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// First child of `id`.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Last child of `id`.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Sibling following `id` under the same parent.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Sibling preceding `id` under the same parent.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Iterate over the direct children of `id` in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// First child element of `id` named `name`.
    pub fn first_child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .find(|&c| self.kind(c) == NodeKind::Element && self.name(c) == name)
    }

    /// Next sibling element of `id` named `name`.
    pub fn next_sibling_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut cur = self.next_sibling(id);
        while let Some(c) = cur {
            if self.kind(c) == NodeKind::Element && self.name(c) == name {
                return Some(c);
            }
            cur = self.next_sibling(c);
        }
        None
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        &self.node(id).attrs
    }

    /// Value of the first attribute of `id` named `name`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Append an attribute; duplicates are kept in order, like on the wire.
    pub fn append_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.node_mut(id).attrs.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Remove the first attribute named `name`, returning its value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attrs = &mut self.node_mut(id).attrs;
        let pos = attrs.iter().position(|a| a.name == name)?;
        Some(attrs.remove(pos).value)
    }

    /// Allocate a detached node and append it as the last child of `parent`.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let id = NodeId(
            self.nodes
                .insert(NodeData::new(kind, name.into(), value.into())),
        );
        let prev = self.node(parent).last_child;
        {
            let n = self.node_mut(id);
            n.parent = Some(parent);
            n.prev_sibling = prev;
        }
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        self.node_mut(parent).last_child = Some(id);
        id
    }

    /// Shorthand for appending an element child.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        self.append_child(parent, NodeKind::Element, name, value)
    }

    /// Allocate a node and insert it right before `before`, which must be a
    /// child of some node.
    ///
    /// # Panics
    /// Panics if `before` is the document node.
    pub fn insert_before(
        &mut self,
        before: NodeId,
        kind: NodeKind,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let parent = self
            .parent(before)
            .unwrap_or_else(|| panic!("insert_before: node {before:?} has no parent"));
        let id = NodeId(
            self.nodes
                .insert(NodeData::new(kind, name.into(), value.into())),
        );
        let prev = self.node(before).prev_sibling;
        {
            let n = self.node_mut(id);
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = Some(before);
        }
        self.node_mut(before).prev_sibling = Some(id);
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        id
    }

    /// Unlink `id` from its parent and free it together with its subtree.
    ///
    /// # Panics
    /// Panics if `id` is the document node.
    pub fn remove(&mut self, id: NodeId) {
        assert!(id != self.root, "the document node cannot be removed");
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).first_child = next;
                }
            }
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).last_child = prev;
                }
            }
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let data = self.nodes.remove(cur.0);
            let mut child = data.first_child;
            while let Some(c) = child {
                child = self.node(c).next_sibling;
                stack.push(c);
            }
        }
    }

    /// Remove every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        while let Some(c) = self.first_child(id) {
            self.remove(c);
        }
    }

    /// Approximate heap footprint of the document in bytes.
    pub fn byte_size(&self) -> usize {
        self.nodes
            .iter()
            .map(|(_, n)| {
                NODE_OVERHEAD
                    + n.name.len()
                    + n.value.len()
                    + n
                        .attrs
                        .iter()
                        .map(|a| ATTR_OVERHEAD + a.name.len() + a.value.len())
                        .sum::<usize>()
            })
            .sum()
    }

    /// Structural equality of the subtrees at `a` (in `self`) and `b` (in
    /// `other`): kinds, names, values, attributes and children, in order.
    pub fn subtree_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((x, y)) = stack.pop() {
            let (nx, ny) = (self.node(x), other.node(y));
            if nx.kind != ny.kind
                || nx.name != ny.name
                || nx.value != ny.value
                || nx.attrs != ny.attrs
            {
                return false;
            }
            let mut cx = nx.first_child;
            let mut cy = ny.first_child;
            loop {
                match (cx, cy) {
                    (Some(i), Some(j)) => {
                        stack.push((i, j));
                        cx = self.next_sibling(i);
                        cy = other.next_sibling(j);
                    }
                    (None, None) => break,
                    _ => return false,
                }
            }
        }
        true
    }

    /// Structural equality of two whole documents.
    pub fn same_shape(&self, other: &Document) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.next_sibling(cur);
        Some(cur)
    }
}
