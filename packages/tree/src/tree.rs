//! # Document tree
//!
//! Flat arena of [`Node`]s addressed by [`NodeId`]. The tree owns the
//! configuration that drives every classification and validates every
//! structural mutation against it:
//!
//! - mutating under a node that is not editable is rejected
//! - splitting an unbreakable node is rejected
//! - removing an unbreakable node out of an unbreakable parent is rejected
//!
//! A rejected mutation leaves the tree untouched and logs a diagnostic.

use crate::config::{
    ArchConfig, Capabilities, ANCHOR_TAG, CELL_TAGS, LINE_BREAK_TAG, LIST_ITEM_TAG, LIST_TAGS,
    ROW_TAG,
};
use crate::error::{TreeError, TreeResult};
use crate::node::{Attributes, Node, NodeId, NodeKind};
use std::sync::Arc;
use tracing::{trace, warn};

/// Characters that render with no width.
pub const ZERO_WIDTH_CHARS: &[char] = &['\u{200B}', '\u{FEFF}'];

/// The edited document.
#[derive(Debug, Clone)]
pub struct ArchTree {
    config: Arc<ArchConfig>,
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

fn reject(err: TreeError) -> TreeError {
    warn!(error = %err, "Rejected tree mutation");
    err
}

impl ArchTree {
    pub fn new(config: ArchConfig) -> Self {
        let root = NodeId(0);
        Self {
            config: Arc::new(config),
            nodes: vec![Some(Node::new(root, NodeKind::Root))],
            root,
        }
    }

    pub fn config(&self) -> &ArchConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena slots ever allocated (the next id to hand out).
    pub(crate) fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Drops every slot allocated after `len`. Used to roll back a failed parse.
    pub(crate) fn truncate_arena(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    // ---------------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&Node> {
        self.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::NodeNotFound(id))
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Offset length: characters for text, 0 for Virtual and
    /// ArchitecturalSpace, child count otherwise.
    pub fn len(&self, id: NodeId) -> usize {
        self.get(id).map(Node::len).unwrap_or(0)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::text)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.child(parent, index + 1)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    /// Ancestors from the parent up, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// `id` followed by its ancestors.
    pub fn ancestors_inclusive(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.exists(id).then_some(id),
        }
    }

    /// Root-first path down to and including `id`.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors_inclusive(id).collect();
        path.reverse();
        path
    }

    /// Closest node, `id` included, satisfying `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&ArchTree, NodeId) -> bool) -> Option<NodeId> {
        self.ancestors_inclusive(id).find(|node| pred(self, *node))
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|n| n == ancestor)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id).last() == Some(self.root)
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let path_a = self.path(a);
        let path_b = self.path(b);
        path_a
            .iter()
            .zip(path_b.iter())
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| *x)
    }

    /// Pre-order list of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.exists(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Concatenated text below `id`; Virtual and layout nodes contribute nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    pub fn first_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.first_child(current) {
            current = child;
        }
        current
    }

    pub fn last_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.last_child(current) {
            current = child;
        }
        current
    }

    // ---------------------------------------------------------------------
    // Classification
    // ---------------------------------------------------------------------

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_text)
    }

    pub fn is_text_like(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_text_like)
    }

    pub fn is_virtual(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_virtual)
    }

    pub fn is_architectural_space(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_architectural_space)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Root and Fragment: containers that anchor a tree rather than content.
    pub fn is_container_root(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|node| node.is_root() || node.is_fragment())
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn is_inline(&self, id: NodeId) -> bool {
        match self.get(id).map(|node| &node.kind) {
            Some(NodeKind::Text { .. }) | Some(NodeKind::Virtual) => true,
            Some(NodeKind::Element { tag, .. }) => self.config.is_format_tag(tag),
            _ => false,
        }
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        !self.is_inline(id)
    }

    /// A block-level element (not Root, Fragment or a layout node).
    pub fn is_block_element(&self, id: NodeId) -> bool {
        self.is_element(id) && !self.is_inline(id)
    }

    pub fn is_void(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| self.config.is_void_tag(tag))
    }

    pub fn is_br(&self, id: NodeId) -> bool {
        self.has_tag(id, LINE_BREAK_TAG)
    }

    /// Embedded atomic content: every void other than a line break.
    pub fn is_media(&self, id: NodeId) -> bool {
        self.is_void(id) && !self.is_br(id)
    }

    pub fn is_list(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| LIST_TAGS.contains(&tag))
    }

    pub fn is_list_item(&self, id: NodeId) -> bool {
        self.has_tag(id, LIST_ITEM_TAG)
    }

    pub fn is_cell(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| CELL_TAGS.contains(&tag))
    }

    pub fn is_row(&self, id: NodeId) -> bool {
        self.has_tag(id, ROW_TAG)
    }

    pub fn is_anchor(&self, id: NodeId) -> bool {
        self.has_tag(id, ANCHOR_TAG)
    }

    pub fn is_style_block(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| self.config.is_style_tag(tag))
    }

    /// Inside a block whose whitespace is preserved.
    pub fn is_preformatted(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id).any(|node| {
            self.tag(node)
                .is_some_and(|tag| self.config.is_preformatted_tag(tag))
        })
    }

    /// No content, or a single Virtual, ArchitecturalSpace or BR child.
    pub fn is_empty(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return true;
        };
        if node.is_text_like() {
            return node.len() == 0;
        }
        match node.children.as_slice() {
            [] => true,
            [only] => {
                self.is_virtual(*only) || self.is_architectural_space(*only) || self.is_br(*only)
            }
            _ => false,
        }
    }

    /// Invisible content: layout nodes, zero-width text, or elements made only
    /// of those. `is_not_blank` lets callers pin nodes as significant.
    pub fn is_blank_with(&self, id: NodeId, is_not_blank: &dyn Fn(&ArchTree, NodeId) -> bool) -> bool {
        let Some(node) = self.get(id) else {
            return true;
        };
        if self.is_void(id) || is_not_blank(self, id) {
            return false;
        }
        match &node.kind {
            NodeKind::Text { value } => value.chars().all(|c| ZERO_WIDTH_CHARS.contains(&c)),
            NodeKind::Virtual | NodeKind::ArchitecturalSpace => true,
            _ => node
                .children
                .iter()
                .all(|child| self.is_blank_with(*child, is_not_blank)),
        }
    }

    pub fn is_blank(&self, id: NodeId) -> bool {
        self.is_blank_with(id, &|_, _| false)
    }

    /// Text that is empty or whitespace only (may still render as a space).
    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        self.text(id)
            .is_some_and(|value| value.chars().all(|c| c.is_whitespace() || ZERO_WIDTH_CHARS.contains(&c)))
    }

    pub fn is_unbreakable(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|node| self.config.node_unbreakable(node))
    }

    /// Editability inherits downward; Root and detached subtrees are editable.
    pub fn is_editable(&self, id: NodeId) -> bool {
        for node in self.ancestors_inclusive(id) {
            if let Some(editable) = self
                .get(node)
                .and_then(|n| self.config.node_editability(n))
            {
                return editable;
            }
        }
        true
    }

    pub fn capabilities(&self, id: NodeId) -> Capabilities {
        Capabilities {
            block: self.is_block(id),
            void: self.is_void(id),
            unbreakable: self.is_unbreakable(id),
            editable: self.is_editable(id),
        }
    }

    /// Closest block element or container root, `id` included.
    pub fn closest_block(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, |tree, node| {
            tree.is_block_element(node) || tree.is_container_root(node)
        })
    }

    /// Closest unbreakable node, `id` included.
    pub fn closest_unbreakable(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, |tree, node| tree.is_unbreakable(node))
    }

    /// Children that are not blank.
    pub fn significant_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| !self.is_blank(*child))
            .collect()
    }

    pub fn prev_significant_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.prev_sibling(id);
        while let Some(node) = current {
            if !self.is_blank(node) {
                return Some(node);
            }
            current = self.prev_sibling(node);
        }
        None
    }

    pub fn next_significant_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(node) = current {
            if !self.is_blank(node) {
                return Some(node);
            }
            current = self.next_sibling(node);
        }
        None
    }

    /// A BR standing alone in its block to keep it addressable.
    pub fn is_filler_br(&self, id: NodeId) -> bool {
        self.is_br(id)
            && self
                .parent(id)
                .is_some_and(|parent| self.significant_children(parent) == vec![id])
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node::new(id, kind)));
        id
    }

    pub fn create_element(&mut self, tag: impl Into<String>, attributes: Attributes) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.into().to_ascii_lowercase(),
            attributes,
        })
    }

    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text {
            value: value.into(),
        })
    }

    pub fn create_virtual(&mut self) -> NodeId {
        self.alloc(NodeKind::Virtual)
    }

    pub fn create_architectural_space(&mut self) -> NodeId {
        self.alloc(NodeKind::ArchitecturalSpace)
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    /// Shallow copy of an element: same tag and attributes, no children.
    pub fn clone_shallow(&mut self, id: NodeId) -> TreeResult<NodeId> {
        let kind = self.node(id)?.kind.clone();
        match kind {
            NodeKind::Element { .. } | NodeKind::Text { .. } => Ok(self.alloc(kind)),
            _ => Err(TreeError::NotAnElement(id)),
        }
    }

    // ---------------------------------------------------------------------
    // Structural mutation
    // ---------------------------------------------------------------------

    fn ensure_editable(&self, id: NodeId) -> TreeResult<()> {
        if self.is_editable(id) {
            Ok(())
        } else {
            Err(reject(TreeError::NotEditable(id)))
        }
    }

    fn validate_insert(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let parent_node = self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(reject(TreeError::InvalidStructure("cannot move the root".into())));
        }
        if parent_node.is_text_like() {
            return Err(reject(TreeError::NotAnElement(parent)));
        }
        if self.is_void(parent) {
            return Err(reject(TreeError::InvalidStructure(format!(
                "void node {} cannot have children",
                parent
            ))));
        }
        if self.contains(child, parent) {
            return Err(reject(TreeError::CycleDetected));
        }
        self.ensure_editable(parent)?;
        if let Some(old_parent) = self.parent(child) {
            self.ensure_editable(old_parent)?;
        }
        Ok(())
    }

    /// Unlinks `id` from its parent without validation.
    fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        if let Ok(parent_node) = self.node_mut(parent) {
            parent_node.children.remove(index);
        }
        if let Ok(node) = self.node_mut(id) {
            node.parent = None;
        }
        Some((parent, index))
    }

    /// Links a detached node without validation.
    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Ok(parent_node) = self.node_mut(parent) {
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, child);
        }
        if let Ok(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Moves (or inserts) `child` into `parent` at `index`.
    ///
    /// `index` is interpreted against the children as they are before the
    /// move and clamped to the end.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        self.validate_insert(parent, child)?;
        let mut index = index;
        if let Some((old_parent, old_index)) = self.detach(child) {
            if old_parent == parent && old_index < index {
                index -= 1;
            }
        }
        trace!(%parent, %child, index, "Inserting node");
        self.attach(parent, index, child);
        Ok(())
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let len = self.children(parent).len();
        self.insert_at(parent, len, child)
    }

    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.insert_at(parent, 0, child)
    }

    pub fn insert_before(&mut self, node: NodeId, reference: NodeId) -> TreeResult<()> {
        let parent = self
            .parent(reference)
            .ok_or_else(|| reject(TreeError::InvalidStructure(format!("{} has no parent", reference))))?;
        let index = self.index_of(reference).unwrap_or(0);
        self.insert_at(parent, index, node)
    }

    pub fn insert_after(&mut self, node: NodeId, reference: NodeId) -> TreeResult<()> {
        let parent = self
            .parent(reference)
            .ok_or_else(|| reject(TreeError::InvalidStructure(format!("{} has no parent", reference))))?;
        let index = self.index_of(reference).map(|i| i + 1).unwrap_or(0);
        self.insert_at(parent, index, node)
    }

    fn free(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            if let Some(slot) = self.nodes.get_mut(node.index()) {
                *slot = None;
            }
        }
    }

    /// An unbreakable node nested in an unbreakable parent is part of its
    /// structure (a cell in a row) and only goes away with it. Cell content is
    /// free to go.
    fn is_structural_part(&self, id: NodeId) -> bool {
        self.parent(id).is_some_and(|parent| {
            self.capabilities(id).unbreakable
                && self.capabilities(parent).unbreakable
                && !self.is_cell(parent)
        })
    }

    /// Whether [`ArchTree::remove`] would accept `id`.
    pub fn can_remove(&self, id: NodeId) -> bool {
        self.exists(id)
            && id != self.root
            && self.parent(id).map_or(true, |parent| self.capabilities(parent).editable)
            && !self.is_structural_part(id)
    }

    /// Removes `id` and everything below it.
    pub fn remove(&mut self, id: NodeId) -> TreeResult<()> {
        self.node(id)?;
        if id == self.root {
            return Err(reject(TreeError::InvalidStructure("cannot remove the root".into())));
        }
        if let Some(parent) = self.parent(id) {
            self.ensure_editable(parent)?;
            if self.is_structural_part(id) {
                return Err(reject(TreeError::Unbreakable(id)));
            }
        }
        trace!(%id, "Removing node");
        self.detach(id);
        self.free(id);
        Ok(())
    }

    /// Puts `new` where `old` is and removes `old` wholesale.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> TreeResult<()> {
        let parent = self
            .parent(old)
            .ok_or_else(|| reject(TreeError::InvalidStructure(format!("{} has no parent", old))))?;
        self.ensure_editable(parent)?;
        self.insert_before(new, old)?;
        self.detach(old);
        self.free(old);
        Ok(())
    }

    /// Moves every child of `id` into its parent, in place, then removes `id`.
    pub fn unwrap(&mut self, id: NodeId) -> TreeResult<()> {
        let parent = self
            .parent(id)
            .ok_or_else(|| reject(TreeError::InvalidStructure(format!("{} has no parent", id))))?;
        self.ensure_editable(parent)?;
        self.ensure_editable(id)?;
        if self.is_unbreakable(id) {
            return Err(reject(TreeError::Unbreakable(id)));
        }
        let index = self.index_of(id).unwrap_or(0);
        let children = self.children(id).to_vec();
        self.detach(id);
        for (offset, child) in children.into_iter().enumerate() {
            self.detach(child);
            self.attach(parent, index + offset, child);
        }
        self.free(id);
        Ok(())
    }

    /// Wraps `id` into a new element with the given tag; returns the wrapper.
    pub fn wrap(&mut self, id: NodeId, tag: &str) -> TreeResult<NodeId> {
        let parent = self
            .parent(id)
            .ok_or_else(|| reject(TreeError::InvalidStructure(format!("{} has no parent", id))))?;
        self.ensure_editable(parent)?;
        let index = self.index_of(id).unwrap_or(0);
        let wrapper = self.create_element(tag, Attributes::new());
        self.detach(id);
        self.attach(parent, index, wrapper);
        self.attach(wrapper, 0, id);
        Ok(wrapper)
    }

    /// Moves the children of `from` starting at `start` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, start: usize, to: NodeId) -> TreeResult<()> {
        self.ensure_editable(from)?;
        let moving: Vec<NodeId> = self.children(from).iter().skip(start).copied().collect();
        for child in moving {
            self.append(to, child)?;
        }
        Ok(())
    }

    /// Splits `id` at `offset`; the new right sibling gets everything after it.
    pub fn split(&mut self, id: NodeId, offset: usize) -> TreeResult<NodeId> {
        let node = self.node(id)?;
        let parent = node
            .parent
            .ok_or_else(|| reject(TreeError::InvalidStructure(format!("{} has no parent", id))))?;
        if offset > node.len() {
            return Err(reject(TreeError::OffsetOutOfBounds { node: id, offset }));
        }
        if self.is_unbreakable(id) {
            return Err(reject(TreeError::Unbreakable(id)));
        }
        if self.is_void(id) || !(node.is_text() || node.is_element()) {
            return Err(reject(TreeError::InvalidStructure(format!(
                "{} cannot be split",
                id
            ))));
        }
        self.ensure_editable(parent)?;

        let new = if let Some(value) = node.text() {
            let (left, right) = split_chars(value, offset);
            let (left, right) = (left.to_string(), right.to_string());
            self.node_mut(id)?.kind = NodeKind::Text { value: left };
            self.create_text(right)
        } else {
            let new = self.clone_shallow(id)?;
            let moving: Vec<NodeId> = self.children(id)[offset..].to_vec();
            for child in moving {
                self.detach(child);
                let len = self.children(new).len();
                self.attach(new, len, child);
            }
            new
        };
        let index = self.index_of(id).map(|i| i + 1).unwrap_or(0);
        self.attach(parent, index, new);
        trace!(%id, %new, offset, "Split node");
        Ok(new)
    }

    /// Splits `id` at `offset`, then its parents at the split index, up to and
    /// including `ancestor`. Returns the new branch below the topmost split.
    ///
    /// Nothing is split at or above an unbreakable node on the path: the
    /// splitting stops below it and the deepest new branch reached is returned
    /// (`id` itself when no split happened).
    pub fn split_until(&mut self, id: NodeId, ancestor: NodeId, offset: usize) -> TreeResult<NodeId> {
        if !self.contains(ancestor, id) {
            return Err(reject(TreeError::InvalidStructure(format!(
                "{} is not inside {}",
                id, ancestor
            ))));
        }
        let (mut node, mut offset) = (id, offset);
        if self.get(id).is_some_and(|n| n.is_virtual() || n.is_architectural_space()) {
            if id == ancestor {
                return Ok(id);
            }
            offset = self.index_of(id).unwrap_or(0);
            node = self.parent(id).ok_or(TreeError::NodeNotFound(id))?;
        }

        let mut path = Vec::new();
        for current in self.ancestors_inclusive(node) {
            if self.is_unbreakable(current) {
                break;
            }
            path.push(current);
            if current == ancestor {
                break;
            }
        }
        for current in &path {
            if let Some(parent) = self.parent(*current) {
                self.ensure_editable(parent)?;
            }
        }

        let mut reached = id;
        for current in path {
            let new = self.split(current, offset)?;
            offset = self.index_of(new).unwrap_or(0);
            reached = new;
        }
        Ok(reached)
    }

    // ---------------------------------------------------------------------
    // Content mutation
    // ---------------------------------------------------------------------

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> TreeResult<()> {
        if !self.is_text(id) {
            return Err(reject(TreeError::NotAText(id)));
        }
        self.ensure_editable(id)?;
        self.node_mut(id)?.kind = NodeKind::Text {
            value: value.into(),
        };
        Ok(())
    }

    /// Inserts characters at a character offset.
    pub fn insert_chars(&mut self, id: NodeId, offset: usize, chars: &str) -> TreeResult<()> {
        let value = self.text(id).ok_or(TreeError::NotAText(id))?;
        if offset > value.chars().count() {
            return Err(reject(TreeError::OffsetOutOfBounds { node: id, offset }));
        }
        let (left, right) = split_chars(value, offset);
        let updated = format!("{}{}{}", left, chars, right);
        self.set_text(id, updated)
    }

    /// Removes the characters in `start..end` (character offsets).
    pub fn remove_chars(&mut self, id: NodeId, start: usize, end: usize) -> TreeResult<()> {
        let value = self.text(id).ok_or(TreeError::NotAText(id))?;
        let len = value.chars().count();
        if start > end || end > len {
            return Err(reject(TreeError::OffsetOutOfBounds { node: id, offset: end }));
        }
        let updated: String = value
            .chars()
            .enumerate()
            .filter(|(i, _)| *i < start || *i >= end)
            .map(|(_, c)| c)
            .collect();
        self.set_text(id, updated)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> TreeResult<()> {
        self.ensure_editable(id)?;
        let attributes = self
            .node_mut(id)?
            .attributes_mut()
            .ok_or(TreeError::NotAnElement(id))?;
        attributes.set(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> TreeResult<Option<String>> {
        self.ensure_editable(id)?;
        let attributes = self
            .node_mut(id)?
            .attributes_mut()
            .ok_or(TreeError::NotAnElement(id))?;
        Ok(attributes.remove(name))
    }

    /// Forces editability on one node; used when securing atomic content.
    pub fn set_editable_override(&mut self, id: NodeId, editable: Option<bool>) -> TreeResult<()> {
        self.node_mut(id)?.editable_override = editable;
        Ok(())
    }

    /// Structural edit without validation, used by normalization passes that
    /// only add or drop layout nodes.
    pub(crate) fn raw_insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.attach(parent, index, child);
    }

    pub(crate) fn raw_remove(&mut self, id: NodeId) {
        self.detach(id);
        self.free(id);
    }

    /// Replaces the child list of `id`; every listed node must be detached
    /// or already a child of `id`.
    pub(crate) fn raw_set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            if let Ok(node) = self.node_mut(child) {
                node.parent = Some(id);
            }
        }
        if let Ok(node) = self.node_mut(id) {
            node.children = children;
        }
    }

    pub(crate) fn raw_set_text(&mut self, id: NodeId, value: String) {
        if let Ok(node) = self.node_mut(id) {
            if node.is_text() {
                node.kind = NodeKind::Text { value };
            }
        }
    }
}

/// Splits a string at a character offset.
pub fn split_chars(value: &str, offset: usize) -> (&str, &str) {
    let byte = value
        .char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value.split_at(byte)
}

/// Iterator over a chain of parents.
pub struct Ancestors<'a> {
    tree: &'a ArchTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
