//! # Ranges
//!
//! A [`Range`] is a pair of [`BoundaryPoint`]s. Ranges handed out by the
//! editor are normalized: both ends sit on canonical positions (see
//! [`crate::skip::is_canonical`]) and `start` never comes after `end`.

use crate::blocks;
use crate::boundary::{compare, BoundaryPoint, Direction};
use crate::errors::EditorResult;
use arch_tree::{ArchTree, NodeId, TreeError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    pub fn collapsed(point: BoundaryPoint) -> Self {
        Self::new(point, point)
    }

    /// The range covering `node` from its parent.
    pub fn select_node(tree: &ArchTree, node: NodeId) -> Option<Self> {
        Some(Self::new(
            BoundaryPoint::before(tree, node)?,
            BoundaryPoint::after(tree, node)?,
        ))
    }

    /// The range covering the content of `node`.
    pub fn select_contents(tree: &ArchTree, node: NodeId) -> Self {
        Self::new(BoundaryPoint::start_of(node), BoundaryPoint::end_of(tree, node))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn is_valid(&self, tree: &ArchTree) -> bool {
        self.start.is_valid(tree) && self.end.is_valid(tree)
    }

    /// Same range with `start` before `end`.
    pub fn ordered(&self, tree: &ArchTree) -> Self {
        if compare(tree, &self.start, &self.end) == Ordering::Greater {
            Self::new(self.end, self.start)
        } else {
            *self
        }
    }

    pub fn common_ancestor(&self, tree: &ArchTree) -> Option<NodeId> {
        tree.common_ancestor(self.start.node, self.end.node)
    }

    pub fn contains_point(&self, tree: &ArchTree, point: &BoundaryPoint) -> bool {
        compare(tree, &self.start, point) != Ordering::Greater
            && compare(tree, point, &self.end) != Ordering::Greater
    }

    /// Moves both ends onto canonical positions. `end` is resolved first; a
    /// collapsed range reuses it for `start`.
    pub fn normalize(&self, tree: &ArchTree) -> Self {
        if !self.is_valid(tree) {
            return *self;
        }
        let range = self.ordered(tree);
        if range.is_collapsed() {
            let point = normalize_point(tree, &range.end, Direction::Forward);
            return Self::collapsed(point);
        }
        let end = normalize_point(tree, &range.end, Direction::Backward);
        let mut start = normalize_point(tree, &range.start, Direction::Forward);
        if compare(tree, &start, &end) == Ordering::Greater {
            start = end;
        }
        Self::new(start, end)
    }

    /// Deletes the selected content and returns the collapsed cursor left
    /// where the content was.
    #[instrument(skip(self, tree), fields(start = %self.start.node, end = %self.end.node))]
    pub fn delete_contents(&self, tree: &mut ArchTree) -> EditorResult<BoundaryPoint> {
        for point in [self.start, self.end] {
            if !tree.exists(point.node) {
                return Err(TreeError::NodeNotFound(point.node).into());
            }
            if !point.is_valid(tree) {
                return Err(TreeError::OffsetOutOfBounds {
                    node: point.node,
                    offset: point.offset,
                }
                .into());
            }
        }
        let Range { start, end } = self.ordered(tree);
        if start == end {
            return Ok(start);
        }
        if start.node == end.node && tree.is_text(start.node) {
            tree.remove_chars(start.node, start.offset, end.offset)?;
            return settle_cursor(tree, start);
        }

        // Reduce both ends to element positions, trimming the boundary texts.
        let outer_start = if tree.is_text_like(start.node) {
            if tree.is_text(start.node) {
                let len = tree.len(start.node);
                tree.remove_chars(start.node, start.offset, len)?;
            }
            BoundaryPoint::after(tree, start.node).unwrap_or(start)
        } else {
            start
        };
        let outer_end = if tree.is_text_like(end.node) {
            if tree.is_text(end.node) {
                tree.remove_chars(end.node, 0, end.offset)?;
            }
            BoundaryPoint::before(tree, end.node).unwrap_or(end)
        } else {
            end
        };

        let ancestor = tree
            .common_ancestor(outer_start.node, outer_end.node)
            .unwrap_or_else(|| tree.root());
        let mut contained = Vec::new();
        collect_contained(tree, ancestor, &outer_start, &outer_end, &mut contained);
        debug!(count = contained.len(), "Deleting contained nodes");
        for node in contained {
            purge(tree, node)?;
        }

        let start_block = tree.closest_block(start.node);
        let end_block = tree.exists(end.node).then(|| tree.closest_block(end.node)).flatten();
        let mut cursor = start;
        if let (Some(left), Some(right)) = (start_block, end_block) {
            if can_merge(tree, left, right) {
                blocks::merge_blocks(tree, left, right)?;
            } else if tree.exists(right) {
                blocks::prune_empty(tree, right, &[])?;
                blocks::ensure_filler(tree, right)?;
            }
        }
        if let Some(left) = start_block.filter(|left| tree.exists(*left)) {
            blocks::prune_empty(tree, left, &[cursor.node])?;
        }
        if !tree.exists(cursor.node) {
            cursor = BoundaryPoint::start_of(tree.root());
        }
        settle_cursor(tree, cursor)
    }

    /// Nodes touched by the range, in document order.
    pub fn get_selected_nodes(
        &self,
        tree: &ArchTree,
        pred: impl Fn(&ArchTree, NodeId) -> bool,
    ) -> Vec<NodeId> {
        let Range { start, end } = self.ordered(tree);
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        let mut push = |id: NodeId| {
            if seen.insert(id) {
                nodes.push(id);
            }
        };
        push(start.node);

        let mut previous: Option<BoundaryPoint> = None;
        start.walk_to(tree, &end, |point| {
            if let Some(prev) = previous {
                let entered = point.node != prev.node
                    && point.offset == 0
                    && tree.parent(point.node) == Some(prev.node);
                if entered {
                    push(point.node);
                }
                let stepped_over_void = point.node == prev.node && point.offset == prev.offset + 1;
                if stepped_over_void && !tree.is_text_like(prev.node) {
                    if let Some(void) = prev.node_after(tree) {
                        push(void);
                    }
                }
            }
            previous = Some(*point);
        });
        nodes.into_iter().filter(|id| pred(tree, *id)).collect()
    }

    pub fn get_selected_text_nodes(
        &self,
        tree: &ArchTree,
        pred: impl Fn(&ArchTree, NodeId) -> bool,
    ) -> Vec<NodeId> {
        self.get_selected_nodes(tree, |tree, id| tree.is_text(id) && pred(tree, id))
    }

    /// Closest node around both ends satisfying `pred`.
    pub fn closest(&self, tree: &ArchTree, pred: impl Fn(&ArchTree, NodeId) -> bool) -> Option<NodeId> {
        self.common_ancestor(tree)
            .and_then(|ancestor| tree.closest(ancestor, pred))
    }

    pub fn is_on(&self, tree: &ArchTree, pred: impl Fn(&ArchTree, NodeId) -> bool) -> bool {
        self.closest(tree, pred).is_some()
    }

    pub fn is_on_anchor(&self, tree: &ArchTree) -> bool {
        self.is_on(tree, |tree, id| tree.is_anchor(id))
    }

    pub fn is_on_cell(&self, tree: &ArchTree) -> bool {
        self.is_on(tree, |tree, id| tree.is_cell(id))
    }

    pub fn is_on_list(&self, tree: &ArchTree) -> bool {
        self.is_on(tree, |tree, id| tree.is_list(id))
    }

    pub fn is_on_editable(&self, tree: &ArchTree) -> bool {
        self.common_ancestor(tree)
            .is_some_and(|ancestor| tree.is_editable(ancestor))
    }

    pub fn is_on_data(&self, tree: &ArchTree, attribute: &str) -> bool {
        self.is_on(tree, |tree, id| {
            tree.get(id)
                .and_then(|node| node.attribute(attribute))
                .is_some()
        })
    }
}

/// Nearest canonical position, looking in `direction` first.
pub fn normalize_point(tree: &ArchTree, point: &BoundaryPoint, direction: Direction) -> BoundaryPoint {
    let mut point = point.clamp(tree);
    if point.is_canonical(tree) {
        return point;
    }
    if tree.is_void(point.node) {
        if let Some(after) = BoundaryPoint::after(tree, point.node) {
            if after.is_canonical(tree) {
                return after;
            }
            point = after;
        }
    }
    let entered = point.enter_until(tree, |tree, p| tree.is_text_like(p.node) || p.is_canonical(tree));
    if entered.is_canonical(tree) {
        return entered;
    }
    let canonical = |tree: &ArchTree, p: &BoundaryPoint| p.is_canonical(tree);
    point
        .search(tree, direction, canonical)
        .or_else(|| point.search(tree, direction.reverse(), canonical))
        .unwrap_or(point)
}

fn collect_contained(
    tree: &ArchTree,
    node: NodeId,
    start: &BoundaryPoint,
    end: &BoundaryPoint,
    out: &mut Vec<NodeId>,
) {
    for &child in tree.children(node) {
        let (Some(before), Some(after)) = (
            BoundaryPoint::before(tree, child),
            BoundaryPoint::after(tree, child),
        ) else {
            continue;
        };
        let starts_inside = compare(tree, &before, start) != Ordering::Less;
        let ends_inside = compare(tree, &after, end) != Ordering::Greater;
        if starts_inside && ends_inside {
            out.push(child);
        } else if compare(tree, &after, start) == Ordering::Greater
            && compare(tree, &before, end) == Ordering::Less
        {
            collect_contained(tree, child, start, end, out);
        }
    }
}

/// Removes `id` when the tree allows it, otherwise empties it.
fn purge(tree: &mut ArchTree, id: NodeId) -> EditorResult<()> {
    if !tree.exists(id) {
        return Ok(());
    }
    if tree.can_remove(id) {
        tree.remove(id)?;
        return Ok(());
    }
    if !tree.is_editable(id) {
        return Ok(());
    }
    for child in tree.children(id).to_vec() {
        purge(tree, child)?;
    }
    blocks::ensure_filler(tree, id)?;
    Ok(())
}

fn can_merge(tree: &ArchTree, left: NodeId, right: NodeId) -> bool {
    left != right
        && tree.exists(left)
        && tree.exists(right)
        && tree.is_block_element(left)
        && tree.is_block_element(right)
        && !tree.contains(left, right)
        && !tree.contains(right, left)
        && tree.closest_unbreakable(left) == tree.closest_unbreakable(right)
        && tree.is_editable(left)
        && tree.is_editable(right)
}

/// Outermost node that only exists to hold `text`: the text itself or the
/// chain of inline wrappers around it with no other children.
fn emptied_wrapper(tree: &ArchTree, text: NodeId) -> NodeId {
    let mut top = text;
    while let Some(parent) = tree.parent(top) {
        let wraps_only_top = matches!(tree.children(parent), [only] if *only == top);
        if !(wraps_only_top && tree.is_inline(parent) && !tree.is_void(parent)) {
            break;
        }
        top = parent;
    }
    top
}

/// Drops an emptied anchor text together with the inline wrappers it leaves
/// empty, and makes sure the block around the cursor is still addressable.
pub(crate) fn settle_cursor(tree: &mut ArchTree, anchor: BoundaryPoint) -> EditorResult<BoundaryPoint> {
    let mut cursor = anchor.clamp(tree);
    if tree.is_text(cursor.node) && tree.len(cursor.node) == 0 {
        let top = emptied_wrapper(tree, cursor.node);
        if tree.can_remove(top) {
            if let Some(before) = BoundaryPoint::before(tree, top) {
                tree.remove(top)?;
                cursor = before;
            }
        }
    }
    let Some(block) = tree.closest_block(cursor.node) else {
        return Ok(cursor);
    };
    if tree.is_container_root(block) {
        if tree.is_blank(block) && tree.is_editable(block) {
            let paragraph_tag = tree.config().paragraph_tag.clone();
            let paragraph = tree.create_element(paragraph_tag, Default::default());
            tree.append(block, paragraph)?;
            blocks::ensure_filler(tree, paragraph)?;
            return Ok(BoundaryPoint::start_of(paragraph));
        }
        return Ok(cursor);
    }
    if blocks::ensure_filler(tree, block)?.is_some() && cursor.node != block {
        cursor = BoundaryPoint::start_of(block);
    }
    Ok(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_tree::parse;

    fn texts(tree: &ArchTree) -> Vec<NodeId> {
        tree.descendants(tree.root())
            .into_iter()
            .filter(|id| tree.is_text(*id))
            .collect()
    }

    #[test]
    fn test_delete_whole_paragraph_text_leaves_filler() {
        let mut tree = parse("<p>hello</p>").unwrap();
        let t = texts(&tree)[0];
        let p = tree.parent(t).unwrap();
        let range = Range::new(BoundaryPoint::new(t, 0), BoundaryPoint::new(t, 5));
        let cursor = range.delete_contents(&mut tree).unwrap();
        assert_eq!(tree.to_markup(), "<p><br></p>");
        assert_eq!(cursor, BoundaryPoint::new(p, 0));
    }

    #[test]
    fn test_delete_whole_wrapped_text_drops_wrapper() {
        let mut tree = parse("<ul><li><b>ab</b></li></ul>").unwrap();
        let t = texts(&tree)[0];
        let b = tree.parent(t).unwrap();
        let li = tree.parent(b).unwrap();
        let range = Range::new(BoundaryPoint::new(t, 0), BoundaryPoint::new(t, 2));
        let cursor = range.delete_contents(&mut tree).unwrap();
        assert_eq!(tree.to_markup(), "<ul><li><br></li></ul>");
        assert!(!tree.exists(b));
        assert_eq!(cursor.node, li);
    }

    #[test]
    fn test_delete_nested_wrappers_keeps_siblings() {
        let mut tree = parse("<p>a<i><b>xy</b></i>c</p>").unwrap();
        let ts = texts(&tree);
        let range = Range::new(BoundaryPoint::new(ts[1], 0), BoundaryPoint::new(ts[1], 2));
        let cursor = range.delete_contents(&mut tree).unwrap();
        assert_eq!(tree.to_markup(), "<p>ac</p>");
        assert_eq!(cursor, BoundaryPoint::new(tree.parent(ts[0]).unwrap(), 1));
    }

    #[test]
    fn test_delete_stale_range_is_an_error() {
        let mut tree = parse("<p>ab</p>").unwrap();
        let range = Range::new(BoundaryPoint::new(NodeId(900), 0), BoundaryPoint::new(NodeId(901), 0));
        assert!(range.delete_contents(&mut tree).is_err());
        assert_eq!(tree.to_markup(), "<p>ab</p>");
    }

    #[test]
    fn test_delete_across_paragraphs_merges() {
        let mut tree = parse("<p>abc</p><p>mid</p><p>xyz</p>").unwrap();
        let ts = texts(&tree);
        let range = Range::new(BoundaryPoint::new(ts[0], 1), BoundaryPoint::new(ts[2], 2));
        let cursor = range.delete_contents(&mut tree).unwrap();
        assert_eq!(tree.to_markup(), "<p>az</p>");
        assert_eq!(cursor, BoundaryPoint::new(ts[0], 1));
    }

    #[test]
    fn test_delete_inside_one_text() {
        let mut tree = parse("<p>abcdef</p>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::new(BoundaryPoint::new(t, 4), BoundaryPoint::new(t, 1));
        let cursor = range.delete_contents(&mut tree).unwrap();
        assert_eq!(tree.text(t), Some("aef"));
        assert_eq!(cursor, BoundaryPoint::new(t, 1));
    }

    #[test]
    fn test_delete_across_cells_empties_them() {
        let mut tree = parse("<table><tbody><tr><td>ab</td><td>cd</td><td>ef</td></tr></tbody></table>").unwrap();
        let ts = texts(&tree);
        let range = Range::new(BoundaryPoint::new(ts[0], 1), BoundaryPoint::new(ts[2], 1));
        range.delete_contents(&mut tree).unwrap();
        assert_eq!(
            tree.to_markup(),
            "<table><tbody><tr><td>a</td><td><br></td><td>f</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_normalize_enters_text() {
        let tree = parse("<p>ab</p>").unwrap();
        let t = texts(&tree)[0];
        let p = tree.parent(t).unwrap();
        let start = Range::collapsed(BoundaryPoint::new(p, 0)).normalize(&tree);
        assert_eq!(start.start, BoundaryPoint::new(t, 0));
        let end = Range::collapsed(BoundaryPoint::new(p, 1)).normalize(&tree);
        assert_eq!(end.end, BoundaryPoint::new(t, 2));
    }

    #[test]
    fn test_normalize_leaves_layout_nodes() {
        let tree = parse("<p>ab</p><p>cd</p>").unwrap();
        let ts = texts(&tree);
        let root_start = Range::collapsed(BoundaryPoint::start_of(tree.root())).normalize(&tree);
        assert_eq!(root_start.start, BoundaryPoint::new(ts[0], 0));

        let between = BoundaryPoint::new(tree.root(), 2);
        let range = Range::new(BoundaryPoint::new(ts[0], 1), between).normalize(&tree);
        assert_eq!(range.end, BoundaryPoint::new(ts[0], 2));
        assert_eq!(range.normalize(&tree), range);
    }

    #[test]
    fn test_selected_nodes() {
        let tree = parse("<p>a<b>b</b>c</p><p>d<br>e</p>").unwrap();
        let ts = texts(&tree);
        let range = Range::new(BoundaryPoint::new(ts[0], 0), BoundaryPoint::new(ts[4], 1));
        let selected = range.get_selected_text_nodes(&tree, |_, _| true);
        assert_eq!(selected, ts);
        let brs = range.get_selected_nodes(&tree, |tree, id| tree.is_br(id));
        assert_eq!(brs.len(), 1);
    }

    #[test]
    fn test_is_on_helpers() {
        let tree = parse("<ul><li><a href=\"/x\">link</a></li></ul>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::new(BoundaryPoint::new(t, 0), BoundaryPoint::new(t, 2));
        assert!(range.is_on_anchor(&tree));
        assert!(range.is_on_list(&tree));
        assert!(!range.is_on_cell(&tree));
        assert!(range.is_on_editable(&tree));
        assert!(range.is_on_data(&tree, "href"));
    }
}
