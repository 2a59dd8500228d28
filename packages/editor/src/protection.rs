//! # Protection policy
//!
//! Keeps selections and mutations away from what the configuration protects:
//!
//! - [`secure_range`] moves both ends of a range onto editable, perceivable
//!   positions and never lets it cut an unbreakable subtree partially. When
//!   the end lies inside an unbreakable node nested below the start's, the
//!   selection widens to cover that node whole.
//! - [`secure_area`] makes void nodes non-editable and surrounds embedded
//!   media with Virtual shims so text can be typed on either side.

use crate::boundary::{compare, BoundaryPoint};
use crate::errors::EditorResult;
use crate::range::Range;
use crate::skip::is_shim;
use arch_tree::{ArchTree, NodeId};
use std::cmp::Ordering;
use tracing::{debug, instrument, trace};

/// Canonical and editable.
pub fn is_usable(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    point.is_canonical(tree) && tree.is_editable(point.node)
}

fn beside_void(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    if tree.is_virtual(point.node) {
        return is_shim(tree, point.node);
    }
    point.node_after(tree).is_some_and(|n| tree.is_void(n))
        || point.node_before(tree).is_some_and(|n| tree.is_void(n))
}

fn unbreakable_scope(tree: &ArchTree, node: NodeId) -> NodeId {
    tree.closest_unbreakable(node).unwrap_or_else(|| tree.root())
}

/// Corrects `range` against editability and unbreakable boundaries.
#[instrument(skip(tree, range), fields(start = %range.start.node, end = %range.end.node))]
pub fn secure_range(tree: &ArchTree, range: &Range) -> Range {
    if !range.is_valid(tree) {
        return *range;
    }
    let range = range.ordered(tree);
    if range.is_collapsed() && beside_void(tree, &range.start) && tree.is_editable(range.start.node) {
        return range;
    }

    let start = if is_usable(tree, &range.start) {
        range.start
    } else {
        match range
            .start
            .next_until(tree, is_usable)
            .or_else(|| range.start.prev_until(tree, is_usable))
        {
            Some(start) => start,
            None => {
                debug!("No editable position in the document");
                return range;
            }
        }
    };
    if range.is_collapsed() || compare(tree, &start, &range.end) != Ordering::Less {
        return Range::collapsed(start);
    }

    let end = if is_usable(tree, &range.end) {
        range.end
    } else {
        range
            .end
            .prev_until(tree, is_usable)
            .filter(|end| compare(tree, end, &start) != Ordering::Less)
            .unwrap_or(start)
    };

    let start_scope = unbreakable_scope(tree, start.node);
    let end_scope = unbreakable_scope(tree, end.node);
    if start_scope == end_scope {
        return Range::new(start, end);
    }

    if tree.contains(start_scope, end_scope) {
        let outermost = tree
            .ancestors_inclusive(end.node)
            .take_while(|node| *node != start_scope)
            .filter(|node| tree.is_unbreakable(*node))
            .last();
        if let Some(after) = outermost.and_then(|node| BoundaryPoint::after(tree, node)) {
            trace!(node = ?outermost, "Widening selection over unbreakable node");
            return Range::new(start, after);
        }
    }

    let clamped = end
        .prev_until(tree, |tree, point| {
            is_usable(tree, point)
                && unbreakable_scope(tree, point.node) == start_scope
                && compare(tree, point, &start) != Ordering::Less
        })
        .filter(|point| compare(tree, point, &start) != Ordering::Less)
        .unwrap_or(start);
    trace!("Clamping selection end inside its unbreakable scope");
    Range::new(start, clamped)
}

fn needs_shim(tree: &ArchTree, neighbour: Option<NodeId>) -> bool {
    match neighbour {
        Some(node) => !(tree.is_virtual(node) || (tree.is_text(node) && !tree.is_blank(node))),
        None => true,
    }
}

/// Protects atomic content below the root; returns the number of changes.
/// Running it twice changes nothing the second time.
#[instrument(skip(tree))]
pub fn secure_area(tree: &mut ArchTree) -> EditorResult<usize> {
    let voids: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|id| tree.is_void(*id))
        .collect();

    let mut changes = 0;
    for &void in &voids {
        let locked = tree.get(void).is_some_and(|node| node.editable_override == Some(false));
        if !locked {
            tree.set_editable_override(void, Some(false))?;
            changes += 1;
        }
    }

    for void in voids {
        if !tree.is_media(void) {
            continue;
        }
        let Some(parent) = tree.parent(void) else {
            continue;
        };
        if tree.is_container_root(parent) || !tree.is_editable(parent) {
            continue;
        }
        if needs_shim(tree, tree.prev_sibling(void)) {
            let shim = tree.create_virtual();
            tree.insert_before(shim, void)?;
            changes += 1;
        }
        if needs_shim(tree, tree.next_sibling(void)) {
            let shim = tree.create_virtual();
            tree.insert_after(shim, void)?;
            changes += 1;
        }
    }
    debug!(changes, "Secured area");
    Ok(changes)
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
    fn test_secure_area_is_idempotent() {
        let mut tree = parse("<p>a<img src=\"x.png\">b</p><p><img src=\"y.png\"></p>").unwrap();
        let first = secure_area(&mut tree).unwrap();
        assert!(first > 0);
        assert_eq!(secure_area(&mut tree).unwrap(), 0);
        assert_eq!(
            tree.to_markup(),
            "<p>a<img src=\"x.png\">b</p><p><img src=\"y.png\"></p>"
        );

        let imgs: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.has_tag(*id, "img"))
            .collect();
        assert!(!tree.is_editable(imgs[0]));
        // Text already flanks the first image
        assert!(tree.is_text(tree.prev_sibling(imgs[0]).unwrap()));
        assert!(tree.is_virtual(tree.prev_sibling(imgs[1]).unwrap()));
        assert!(tree.is_virtual(tree.next_sibling(imgs[1]).unwrap()));
    }

    #[test]
    fn test_usable_start_is_kept() {
        let tree = parse("<p>abc</p>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::new(BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 2));
        assert_eq!(secure_range(&tree, &range), range);
    }

    #[test]
    fn test_start_leaves_non_editable_region() {
        let tree = parse("<p class=\"not-editable\">locked</p><p>open</p>").unwrap();
        let ts = texts(&tree);
        let range = Range::collapsed(BoundaryPoint::new(ts[0], 2));
        assert_eq!(
            secure_range(&tree, &range),
            Range::collapsed(BoundaryPoint::new(ts[1], 0))
        );
    }

    #[test]
    fn test_end_is_clamped_into_cell() {
        let tree = parse("<table><tbody><tr><td>ab</td></tr></tbody></table><p>after</p>").unwrap();
        let ts = texts(&tree);
        let range = Range::new(BoundaryPoint::new(ts[0], 1), BoundaryPoint::new(ts[1], 3));
        let secured = secure_range(&tree, &range);
        assert_eq!(secured.start, BoundaryPoint::new(ts[0], 1));
        assert_eq!(secured.end, BoundaryPoint::new(ts[0], 2));
    }

    #[test]
    fn test_end_inside_table_widens_over_it() {
        let tree = parse("<p>before</p><table><tbody><tr><td>ab</td></tr></tbody></table>").unwrap();
        let ts = texts(&tree);
        let table = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.has_tag(*id, "table"))
            .unwrap();
        let range = Range::new(BoundaryPoint::new(ts[0], 2), BoundaryPoint::new(ts[1], 1));
        let secured = secure_range(&tree, &range);
        assert_eq!(secured.start, BoundaryPoint::new(ts[0], 2));
        assert_eq!(secured.end, BoundaryPoint::after(&tree, table).unwrap());
    }
}
