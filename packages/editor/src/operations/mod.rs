//! # Edit operations
//!
//! One function per input class. Each takes the tree and the current range
//! and returns:
//!
//! - `Ok(Some(range))` when handled, with the range to secure next
//! - `Ok(None)` when the input does not apply here (nothing was changed)
//! - `Err(_)` when a mutation was rejected midway; the caller rolls back
//!
//! [`crate::EditorContext`] runs them as transactions and finishes every
//! handled one with normalization and `secure_range`.

mod delete;
mod enter;
mod lists;
mod tab;
mod text;

pub use delete::{backspace, delete};
pub use enter::{enter, shift_enter};
pub use lists::{indent_item, outdent_item};
pub use tab::tab;
pub use text::{delete_range, insert_text};

use crate::boundary::BoundaryPoint;
use crate::protection::is_usable;
use arch_tree::{ArchTree, NodeId, TreeResult};

/// Closest block element around `node`; container roots do not count.
pub(crate) fn block_of(tree: &ArchTree, node: NodeId) -> Option<NodeId> {
    tree.closest_block(node)
        .filter(|block| !tree.is_container_root(*block))
}

/// Previous position the cursor could rest on.
pub(crate) fn prev_position(tree: &ArchTree, point: &BoundaryPoint) -> Option<BoundaryPoint> {
    point.prev_until(tree, is_usable)
}

/// Next position the cursor could rest on.
pub(crate) fn next_position(tree: &ArchTree, point: &BoundaryPoint) -> Option<BoundaryPoint> {
    point.next_until(tree, is_usable)
}

/// No perceivable position of `block` lies before `point`.
pub(crate) fn at_start_of(tree: &ArchTree, point: &BoundaryPoint, block: NodeId) -> bool {
    prev_position(tree, point).map_or(true, |prev| !tree.contains(block, prev.node))
}

/// No perceivable position of `block` lies after `point`.
pub(crate) fn at_end_of(tree: &ArchTree, point: &BoundaryPoint, block: NodeId) -> bool {
    next_position(tree, point).map_or(true, |next| !tree.contains(block, next.node))
}

pub(crate) fn indent_level(tree: &ArchTree, block: NodeId) -> usize {
    let attribute = &tree.config().indent_attribute;
    tree.get(block)
        .and_then(|node| node.attribute(attribute))
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

pub(crate) fn set_indent_level(tree: &mut ArchTree, block: NodeId, level: usize) -> TreeResult<()> {
    let attribute = tree.config().indent_attribute.clone();
    if level == 0 {
        tree.remove_attribute(block, &attribute)?;
    } else {
        tree.set_attribute(block, &attribute, &level.to_string())?;
    }
    Ok(())
}

/// First position inside `node`, or its start when it has none.
pub(crate) fn first_position(tree: &ArchTree, node: NodeId) -> BoundaryPoint {
    BoundaryPoint::first_in(tree, node).unwrap_or_else(|| BoundaryPoint::start_of(node))
}
