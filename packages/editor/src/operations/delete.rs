//! Backspace and Delete.

use super::{at_end_of, at_start_of, block_of, indent_level, lists, next_position, prev_position, set_indent_level};
use crate::blocks;
use crate::boundary::{BoundaryPoint, Direction};
use crate::errors::EditorResult;
use crate::range::{settle_cursor, Range};
use arch_tree::{ArchTree, NodeId, ZERO_WIDTH_CHARS};
use tracing::{debug, instrument};

fn collapsed(point: BoundaryPoint) -> Option<Range> {
    Some(Range::collapsed(point))
}

#[instrument(skip(tree, range))]
pub fn backspace(tree: &mut ArchTree, range: &Range) -> EditorResult<Option<Range>> {
    if !range.is_collapsed() {
        return Ok(collapsed(range.delete_contents(tree)?));
    }
    let point = range.start;
    let Some(block) = block_of(tree, point.node) else {
        let root = tree.root();
        return remove_unit(tree, point, root, Direction::Backward);
    };
    if !at_start_of(tree, &point, block) {
        return remove_unit(tree, point, block, Direction::Backward);
    }
    let previous = prev_position(tree, &point);

    if let Some(cell) = tree.closest(point.node, |tree, id| tree.is_cell(id)) {
        if previous.map_or(true, |prev| !tree.contains(cell, prev.node)) {
            debug!(%cell, "Backspace at the start of a cell");
            return Ok(Some(*range));
        }
    }

    if let Some(item) = tree.closest(block, |tree, id| tree.is_list_item(id)) {
        if previous.map_or(true, |prev| !tree.contains(item, prev.node)) {
            let previous_item = tree
                .prev_significant_sibling(item)
                .filter(|sibling| tree.is_list_item(*sibling));
            if previous_item.is_none() {
                return outdent(tree, item, point);
            }
            if let Some(target) = previous.and_then(|prev| block_of(tree, prev.node)) {
                if can_join(tree, target, block) {
                    return Ok(collapsed(blocks::merge_blocks(tree, target, block)?));
                }
            }
            return Ok(None);
        }
    }

    let level = indent_level(tree, block);
    if level > 0 {
        set_indent_level(tree, block, level - 1)?;
        return Ok(Some(*range));
    }

    let Some(previous) = previous else {
        return Ok(None);
    };
    if let Some(sibling) = tree.prev_significant_sibling(block) {
        if tree.is_void(sibling) && tree.can_remove(sibling) {
            tree.remove(sibling)?;
            return Ok(Some(*range));
        }
    }
    join_or_step(tree, block, previous, Direction::Backward)
}

#[instrument(skip(tree, range))]
pub fn delete(tree: &mut ArchTree, range: &Range) -> EditorResult<Option<Range>> {
    if !range.is_collapsed() {
        return Ok(collapsed(range.delete_contents(tree)?));
    }
    let point = range.end;
    let Some(block) = block_of(tree, point.node) else {
        let root = tree.root();
        return remove_unit(tree, point, root, Direction::Forward);
    };
    if !at_end_of(tree, &point, block) {
        return remove_unit(tree, point, block, Direction::Forward);
    }
    let next = next_position(tree, &point);

    if let Some(cell) = tree.closest(point.node, |tree, id| tree.is_cell(id)) {
        if next.map_or(true, |next| !tree.contains(cell, next.node)) {
            debug!(%cell, "Delete at the end of a cell");
            return Ok(Some(*range));
        }
    }

    let Some(next) = next else {
        return Ok(None);
    };
    if let Some(sibling) = tree.next_significant_sibling(block) {
        if tree.is_void(sibling) && tree.can_remove(sibling) {
            tree.remove(sibling)?;
            return Ok(Some(*range));
        }
    }
    join_or_step(tree, block, next, Direction::Forward)
}

fn can_join(tree: &ArchTree, left: NodeId, right: NodeId) -> bool {
    left != right
        && !tree.contains(right, left)
        && tree.closest_unbreakable(left) == tree.closest_unbreakable(right)
        && tree.is_editable(left)
        && tree.is_editable(right)
}

/// Merges `block` with the block holding `neighbour`, or moves the cursor
/// there when an unbreakable boundary lies in between.
fn join_or_step(
    tree: &mut ArchTree,
    block: NodeId,
    neighbour: BoundaryPoint,
    direction: Direction,
) -> EditorResult<Option<Range>> {
    let Some(other) = block_of(tree, neighbour.node) else {
        return Ok(collapsed(neighbour));
    };
    let (left, right) = match direction {
        Direction::Backward => (other, block),
        Direction::Forward => (block, other),
    };
    if can_join(tree, left, right) {
        return Ok(collapsed(blocks::merge_blocks(tree, left, right)?));
    }
    if (tree.is_blank(block) || tree.is_empty(block)) && tree.can_remove(block) {
        blocks::remove_empty_chain(tree, block, Some(other))?;
    }
    Ok(collapsed(neighbour))
}

fn outdent(tree: &mut ArchTree, item: NodeId, point: BoundaryPoint) -> EditorResult<Option<Range>> {
    let Some(holder) = lists::outdent_item(tree, item)? else {
        return Ok(None);
    };
    let cursor = if tree.exists(point.node) {
        point
    } else {
        BoundaryPoint::new(holder, point.offset.min(tree.len(holder)))
    };
    Ok(collapsed(cursor))
}

/// Removes the character or void node next to `point` inside its block.
fn remove_unit(
    tree: &mut ArchTree,
    point: BoundaryPoint,
    scope: NodeId,
    direction: Direction,
) -> EditorResult<Option<Range>> {
    let mut current = point;
    loop {
        if let Some(value) = tree.text(current.node) {
            let len = value.chars().count();
            let target = match direction {
                Direction::Backward if current.offset > 0 => Some(current.offset - 1),
                Direction::Forward if current.offset < len => Some(current.offset),
                _ => None,
            };
            if let Some(index) = target {
                let is_zero_width = value
                    .chars()
                    .nth(index)
                    .is_some_and(|c| ZERO_WIDTH_CHARS.contains(&c));
                tree.remove_chars(current.node, index, index + 1)?;
                let cursor = BoundaryPoint::new(current.node, index);
                if is_zero_width {
                    current = cursor;
                    continue;
                }
                return Ok(collapsed(settle_cursor(tree, cursor)?));
            }
        } else if !tree.is_text_like(current.node) {
            let neighbour = match direction {
                Direction::Backward => current.node_before(tree),
                Direction::Forward => current.node_after(tree),
            };
            if let Some(void) = neighbour.filter(|n| tree.is_void(*n)) {
                if !tree.can_remove(void) {
                    return Ok(None);
                }
                let index = tree.index_of(void).unwrap_or(0);
                tree.remove(void)?;
                let cursor = settle_cursor(tree, BoundaryPoint::new(current.node, index))?;
                return Ok(collapsed(cursor));
            }
        }
        match current.step(tree, direction) {
            Some(next) if tree.contains(scope, next.node) => current = next,
            _ => return Ok(None),
        }
    }
}
