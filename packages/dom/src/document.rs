//! # Document Arena
//!
//! Owns every node of one editable surface and implements the tree surgery
//! the formatting engine is built from: insert, detach, wrap, unwrap, split
//! and normalize.
//!
//! ## Transactions
//!
//! Multi-step edits run inside [`Document::transaction`]. The closure works
//! on the live tree; if it returns `Err` the tree is put back exactly as it
//! was, so a failure halfway through a split-and-wrap never leaves a unit
//! partially wrapped.
//!
//! ## Slots
//!
//! Detached nodes keep their slot, so ids stay valid across surgery and
//! the arena only grows. [`Document::compact`] drops unreachable slots and
//! renumbers the rest; it invalidates every id and point held outside.

use crate::node::{ElementData, Node, NodeId, NodeKind};
use crate::point::{Point, Range};
use crate::text::{byte_offset, char_len};
use crate::{DomError, DomResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Document tree rooted at the editable container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create an empty document whose root element has the given tag
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Element(ElementData::new(root_tag)))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.nodes.get(id.0).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::NodeNotFound(id))
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(content.into()))
    }

    /// Allocate a detached element node
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.push(NodeKind::Element(data))
    }

    /// Allocated slots, attached or not
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Keep only the nodes reachable from the root, renumbered in document
    /// order with the root at `#0`
    pub fn compact(&mut self) {
        let order: Vec<NodeId> = self.descendants(self.root).collect();
        let mut remap = vec![None; self.nodes.len()];
        for (index, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeId(index));
        }
        let lookup = |id: NodeId| remap.get(id.0).copied().flatten();

        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let Some(node) = self.nodes.get(old.0) else {
                continue;
            };
            nodes.push(Node {
                kind: node.kind.clone(),
                parent: node.parent.and_then(lookup),
                children: node.children.iter().copied().filter_map(lookup).collect(),
            });
        }
        self.nodes = nodes;
        self.root = NodeId(0);
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// True when `node` is reachable from the root
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.root || self.ancestors(node).any(|a| a == self.root)
    }

    /// Number of edges between the node and its topmost ancestor
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// True when `ancestor` strictly contains `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).and_then(Node::as_text)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id.0).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Character length of a text node, 0 for elements
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(char_len).unwrap_or(0)
    }

    /// Pre-order concatenation of all text under `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .filter_map(|t| self.text(t))
            .collect()
    }

    /// Pre-order traversal starting at (and including) `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Text nodes under `id` in document order
    pub fn text_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(move |n| self.is_text(*n))
    }

    /// Child-index chain from the topmost ancestor down to `id`
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(idx) = self.index_in_parent(current) {
            path.push(idx);
            current = match self.parent(current) {
                Some(parent) => parent,
                None => break,
            };
        }
        path.reverse();
        path
    }

    /// Boundary-point order.
    ///
    /// A point's key is the path of its node extended by its offset; keys
    /// compare lexicographically with a prefix ordering before its
    /// extensions. That puts `(element, k)` before everything inside child
    /// `k`, and the end of one text node before the start of the next.
    pub fn compare_points(&self, a: Point, b: Point) -> Ordering {
        self.point_key(a).cmp(&self.point_key(b))
    }

    fn point_key(&self, point: Point) -> Vec<usize> {
        let mut key = self.path(point.node);
        key.push(point.offset);
        key
    }

    /// Build a range from two points in either order
    pub fn ordered_range(&self, a: Point, b: Point) -> Range {
        match self.compare_points(a, b) {
            Ordering::Greater => Range::new(b, a),
            _ => Range::new(a, b),
        }
    }

    /// Range spanning the whole content of `node`
    pub fn content_range(&self, node: NodeId) -> Range {
        let end = if self.is_text(node) {
            self.text_len(node)
        } else {
            self.children(node).len()
        };
        Range::new(Point::new(node, 0), Point::new(node, end))
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(existing) => {
                *existing = content.into();
                Ok(())
            }
            NodeKind::Element(_) => Err(DomError::NotText(id)),
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Insert `child` under `parent` at `index` (clamped), moving it out of
    /// its current parent first
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomResult<()> {
        if !self.is_element(parent) {
            self.node(parent)?;
            return Err(DomError::NotAnElement(parent));
        }
        self.node(child)?;
        if child == self.root {
            return Err(DomError::RootImmutable);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(DomError::CycleDetected);
        }

        let mut index = index;
        if self.parent(child) == Some(parent) {
            if let Some(old) = self.index_in_parent(child) {
                if old < index {
                    index -= 1;
                }
            }
        }
        self.detach(child)?;

        let parent_node = self.node_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `id` from its parent. Detaching a detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if id == self.root {
            return Err(DomError::RootImmutable);
        }
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Put `new` where `old` is and detach `old`
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        if old == self.root {
            return Err(DomError::RootImmutable);
        }
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        let index = self.index_in_parent(old).ok_or(DomError::Detached(old))?;
        self.detach(old)?;
        self.insert_child(parent, index, new)
    }

    /// Replace `node` with `wrapper` and make `node` the wrapper's last child
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) -> DomResult<()> {
        if !self.is_element(wrapper) {
            return Err(DomError::NotAnElement(wrapper));
        }
        self.replace(node, wrapper)?;
        self.append_child(wrapper, node)
    }

    /// Move the element's children into its parent at its position and
    /// detach it. Returns the moved children in order.
    pub fn unwrap(&mut self, element: NodeId) -> DomResult<Vec<NodeId>> {
        if element == self.root {
            return Err(DomError::RootImmutable);
        }
        if !self.is_element(element) {
            self.node(element)?;
            return Err(DomError::NotAnElement(element));
        }
        let parent = self.parent(element).ok_or(DomError::Detached(element))?;
        let index = self
            .index_in_parent(element)
            .ok_or(DomError::Detached(element))?;

        let children = std::mem::take(&mut self.node_mut(element)?.children);
        for child in &children {
            self.node_mut(*child)?.parent = Some(parent);
        }
        self.node_mut(parent)?
            .children
            .splice(index..=index, children.iter().copied());
        self.node_mut(element)?.parent = None;
        Ok(children)
    }

    /// Split a text node at a character offset. The original node keeps
    /// the head; the tail becomes a new node inserted right after it (when
    /// the original is attached). Returns the tail's id.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> DomResult<NodeId> {
        let content = self.text(id).ok_or(DomError::NotText(id))?;
        let len = char_len(content);
        if at > len {
            return Err(DomError::OffsetOutOfBounds { offset: at, len });
        }
        let split = byte_offset(content, at);
        let tail = content[split..].to_string();
        let head = content[..split].to_string();

        self.set_text(id, head)?;
        let tail_id = self.create_text(tail);
        if let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) {
            self.insert_child(parent, index + 1, tail_id)?;
        }
        Ok(tail_id)
    }

    /// Merge adjacent text children of `element` and drop empty ones
    pub fn normalize(&mut self, element: NodeId) -> DomResult<()> {
        if !self.is_element(element) {
            return Err(DomError::NotAnElement(element));
        }
        let children = self.children(element).to_vec();
        let mut previous_text: Option<NodeId> = None;

        for child in children {
            let Some(content) = self.text(child).map(str::to_string) else {
                previous_text = None;
                continue;
            };
            if content.is_empty() {
                self.detach(child)?;
                continue;
            }
            match previous_text {
                Some(prev) => {
                    let merged = format!("{}{}", self.text(prev).unwrap_or_default(), content);
                    self.set_text(prev, merged)?;
                    self.detach(child)?;
                }
                None => previous_text = Some(child),
            }
        }
        Ok(())
    }

    /// Detach every child of `element`
    pub fn clear_children(&mut self, element: NodeId) -> DomResult<()> {
        for child in self.children(element).to_vec() {
            self.detach(child)?;
        }
        Ok(())
    }

    /// Run `edit` against the tree; restore the prior tree if it fails
    pub fn transaction<T, E>(
        &mut self,
        edit: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let snapshot = self.clone();
        match edit(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(next).iter().rev().copied());
        Some(next)
    }
}
