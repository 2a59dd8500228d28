//! # Boundary points
//!
//! A [`BoundaryPoint`] addresses a position in the tree: a character offset
//! inside a text-like node, or a child index inside any other node.
//!
//! Positions form a single document-order sequence. [`BoundaryPoint::next`]
//! and [`BoundaryPoint::prev`] step through it one position at a time,
//! treating void nodes as atomic, and every higher level search (range
//! normalization, selection securing, edit operations) is built on
//! [`BoundaryPoint::next_until`], [`BoundaryPoint::prev_until`] and the walk
//! helpers.

use crate::skip::{self, SkipOptions};
use arch_tree::{ArchTree, NodeId, ZERO_WIDTH_CHARS};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Left,
    Right,
}

/// One end of a cursor or selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

fn is_zero_width(c: char) -> bool {
    ZERO_WIDTH_CHARS.contains(&c)
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    pub fn start_of(node: NodeId) -> Self {
        Self::new(node, 0)
    }

    pub fn end_of(tree: &ArchTree, node: NodeId) -> Self {
        Self::new(node, tree.len(node))
    }

    /// Position in the parent right before `node`.
    pub fn before(tree: &ArchTree, node: NodeId) -> Option<Self> {
        Some(Self::new(tree.parent(node)?, tree.index_of(node)?))
    }

    /// Position in the parent right after `node`.
    pub fn after(tree: &ArchTree, node: NodeId) -> Option<Self> {
        Some(Self::new(tree.parent(node)?, tree.index_of(node)? + 1))
    }

    pub fn is_valid(&self, tree: &ArchTree) -> bool {
        tree.exists(self.node) && self.offset <= tree.len(self.node)
    }

    /// Same node, offset clamped to its length.
    pub fn clamp(&self, tree: &ArchTree) -> Self {
        Self::new(self.node, self.offset.min(tree.len(self.node)))
    }

    pub fn is_text(&self, tree: &ArchTree) -> bool {
        tree.is_text(self.node)
    }

    /// Child right after the position, for element positions.
    pub fn node_after(&self, tree: &ArchTree) -> Option<NodeId> {
        if tree.is_text_like(self.node) {
            return None;
        }
        tree.child(self.node, self.offset)
    }

    /// Child right before the position, for element positions.
    pub fn node_before(&self, tree: &ArchTree) -> Option<NodeId> {
        if tree.is_text_like(self.node) {
            return None;
        }
        self.offset.checked_sub(1).and_then(|i| tree.child(self.node, i))
    }

    /// Character right after the position, for text positions.
    pub fn char_after(&self, tree: &ArchTree) -> Option<char> {
        tree.text(self.node)?.chars().nth(self.offset)
    }

    /// Character right before the position, for text positions.
    pub fn char_before(&self, tree: &ArchTree) -> Option<char> {
        let index = self.offset.checked_sub(1)?;
        tree.text(self.node)?.chars().nth(index)
    }

    /// Descends one level: into the child at the offset, or into the last
    /// child when the position is at the end of a non-empty node.
    pub fn enter(&self, tree: &ArchTree) -> Self {
        if tree.is_text_like(self.node) {
            return *self;
        }
        if let Some(child) = tree.child(self.node, self.offset) {
            if !tree.is_void(child) {
                return Self::start_of(child);
            }
            return *self;
        }
        match tree.last_child(self.node) {
            Some(last) if self.offset > 0 && !tree.is_void(last) => Self::end_of(tree, last),
            _ => *self,
        }
    }

    /// Descends repeatedly until `pred` holds or no deeper position exists.
    pub fn enter_until(&self, tree: &ArchTree, pred: impl Fn(&ArchTree, &Self) -> bool) -> Self {
        let mut current = *self;
        while !pred(tree, &current) {
            let deeper = current.enter(tree);
            if deeper == current {
                break;
            }
            current = deeper;
        }
        current
    }

    /// Next position in document order; `None` at the end of the root.
    ///
    /// With `skip_inner` a text position steps straight out of its node.
    pub fn next(&self, tree: &ArchTree, skip_inner: bool) -> Option<Self> {
        if !tree.exists(self.node) {
            return None;
        }
        let len = tree.len(self.node);
        if tree.is_text_like(self.node) {
            if !skip_inner && self.offset < len {
                return Some(Self::new(self.node, self.offset + 1));
            }
            return Self::after(tree, self.node);
        }
        if let Some(child) = tree.child(self.node, self.offset) {
            if tree.is_void(child) {
                return Some(Self::new(self.node, self.offset + 1));
            }
            return Some(Self::start_of(child));
        }
        if tree.is_root(self.node) {
            return None;
        }
        Self::after(tree, self.node)
    }

    /// Previous position in document order; `None` at the start of the root.
    pub fn prev(&self, tree: &ArchTree, skip_inner: bool) -> Option<Self> {
        if !tree.exists(self.node) {
            return None;
        }
        if tree.is_text_like(self.node) {
            if !skip_inner && self.offset > 0 {
                return Some(Self::new(self.node, self.offset - 1));
            }
            return Self::before(tree, self.node);
        }
        if self.offset > 0 {
            if let Some(child) = tree.child(self.node, self.offset - 1) {
                if tree.is_void(child) {
                    return Some(Self::new(self.node, self.offset - 1));
                }
                return Some(Self::end_of(tree, child));
            }
        }
        if tree.is_root(self.node) {
            return None;
        }
        Self::before(tree, self.node)
    }

    pub fn step(&self, tree: &ArchTree, direction: Direction) -> Option<Self> {
        match direction {
            Direction::Forward => self.next(tree, false),
            Direction::Backward => self.prev(tree, false),
        }
    }

    /// First position after this one satisfying `pred`.
    pub fn next_until(&self, tree: &ArchTree, pred: impl Fn(&ArchTree, &Self) -> bool) -> Option<Self> {
        let mut current = self.next(tree, false)?;
        loop {
            if pred(tree, &current) {
                return Some(current);
            }
            current = current.next(tree, false)?;
        }
    }

    /// First position before this one satisfying `pred`.
    pub fn prev_until(&self, tree: &ArchTree, pred: impl Fn(&ArchTree, &Self) -> bool) -> Option<Self> {
        let mut current = self.prev(tree, false)?;
        loop {
            if pred(tree, &current) {
                return Some(current);
            }
            current = current.prev(tree, false)?;
        }
    }

    pub fn search(
        &self,
        tree: &ArchTree,
        direction: Direction,
        pred: impl Fn(&ArchTree, &Self) -> bool,
    ) -> Option<Self> {
        match direction {
            Direction::Forward => self.next_until(tree, pred),
            Direction::Backward => self.prev_until(tree, pred),
        }
    }

    /// Visits every position from this one up to and including `end`.
    pub fn walk_to(&self, tree: &ArchTree, end: &Self, mut visit: impl FnMut(&Self)) {
        let mut current = *self;
        loop {
            visit(&current);
            if current == *end || compare(tree, &current, end) != Ordering::Less {
                return;
            }
            match current.next(tree, false) {
                Some(next) => current = next,
                None => return,
            }
        }
    }

    /// Visits positions forward until `pred` holds; returns that position.
    pub fn walk_until(
        &self,
        tree: &ArchTree,
        pred: impl Fn(&ArchTree, &Self) -> bool,
        mut visit: impl FnMut(&Self),
    ) -> Option<Self> {
        let mut current = *self;
        loop {
            if pred(tree, &current) {
                return Some(current);
            }
            visit(&current);
            current = current.next(tree, false)?;
        }
    }

    /// Nothing visible between the start of the node and the position.
    pub fn is_left_edge(&self, tree: &ArchTree) -> bool {
        if let Some(value) = tree.text(self.node) {
            return value.chars().take(self.offset).all(is_zero_width);
        }
        if tree.is_text_like(self.node) {
            return true;
        }
        tree.children(self.node)
            .iter()
            .take(self.offset)
            .all(|child| tree.is_blank(*child))
    }

    /// Nothing visible between the position and the end of the node.
    pub fn is_right_edge(&self, tree: &ArchTree) -> bool {
        if let Some(value) = tree.text(self.node) {
            return value.chars().skip(self.offset).all(is_zero_width);
        }
        if tree.is_text_like(self.node) {
            return true;
        }
        tree.children(self.node)
            .iter()
            .skip(self.offset)
            .all(|child| tree.is_blank(*child))
    }

    pub fn is_edge(&self, tree: &ArchTree, side: Side) -> bool {
        match side {
            Side::Left => self.is_left_edge(tree),
            Side::Right => self.is_right_edge(tree),
        }
    }

    /// The position is on the `side` edge of `ancestor`: nothing visible lies
    /// between them.
    pub fn is_edge_of(&self, tree: &ArchTree, ancestor: NodeId, side: Side) -> bool {
        if !tree.contains(ancestor, self.node) || !self.is_edge(tree, side) {
            return false;
        }
        let mut current = self.node;
        while current != ancestor {
            let (Some(parent), Some(index)) = (tree.parent(current), tree.index_of(current)) else {
                return false;
            };
            let siblings = tree.children(parent);
            let outside = match side {
                Side::Left => &siblings[..index],
                Side::Right => &siblings[index + 1..],
            };
            if !outside.iter().all(|sibling| tree.is_blank(*sibling)) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Finds the closest ancestor with `tag` and reports whether the position
    /// sits on its `side` edge.
    pub fn is_edge_of_tag(&self, tree: &ArchTree, tag: &str, side: Side) -> bool {
        tree.closest(self.node, |tree, node| tree.has_tag(node, tag))
            .is_some_and(|ancestor| self.is_edge_of(tree, ancestor, side))
    }

    pub fn is_skippable(&self, tree: &ArchTree, options: &SkipOptions) -> bool {
        skip::is_skippable(tree, self, options)
    }

    pub fn is_canonical(&self, tree: &ArchTree) -> bool {
        skip::is_canonical(tree, self)
    }

    /// First canonical position inside `node`, boundaries included.
    pub fn first_in(tree: &ArchTree, node: NodeId) -> Option<Self> {
        let mut current = Self::start_of(node);
        loop {
            if !tree.contains(node, current.node) {
                return None;
            }
            if current.is_canonical(tree) {
                return Some(current);
            }
            current = current.next(tree, false)?;
        }
    }

    /// Last canonical position inside `node`, boundaries included.
    pub fn last_in(tree: &ArchTree, node: NodeId) -> Option<Self> {
        let mut current = Self::end_of(tree, node);
        loop {
            if !tree.contains(node, current.node) {
                return None;
            }
            if current.is_canonical(tree) {
                return Some(current);
            }
            current = current.prev(tree, false)?;
        }
    }
}

/// Document-order comparison of two positions. Positions in unrelated trees
/// (a detached node, or one no longer in the arena) order by node id.
pub fn compare(tree: &ArchTree, a: &BoundaryPoint, b: &BoundaryPoint) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    let path_a = tree.path(a.node);
    let path_b = tree.path(b.node);
    let shared = path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    if shared == 0 {
        return a.node.cmp(&b.node).then(a.offset.cmp(&b.offset));
    }

    match (path_a.get(shared), path_b.get(shared)) {
        // `a` is on an ancestor of `b`
        (None, Some(child)) => {
            let index = tree.index_of(*child).unwrap_or(0);
            if a.offset <= index {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(child), None) => {
            let index = tree.index_of(*child).unwrap_or(0);
            if b.offset <= index {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(x), Some(y)) => tree.index_of(*x).cmp(&tree.index_of(*y)),
        (None, None) => a.offset.cmp(&b.offset),
    }
}
