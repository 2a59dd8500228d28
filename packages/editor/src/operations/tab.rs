//! Tab and Shift+Tab.

use super::{at_start_of, block_of, indent_level, lists, set_indent_level, text};
use crate::boundary::BoundaryPoint;
use crate::errors::{EditorError, EditorResult};
use crate::protection::is_usable;
use crate::range::Range;
use arch_tree::{ArchTree, NodeId, NBSP};
use tracing::{debug, instrument};

fn table_of(tree: &ArchTree, cell: NodeId) -> Option<NodeId> {
    tree.closest(cell, |tree, id| tree.has_tag(id, "table"))
}

/// Cells of `table` in document order, without those of nested tables.
fn cells_of(tree: &ArchTree, table: NodeId) -> Vec<NodeId> {
    tree.descendants(table)
        .into_iter()
        .filter(|id| tree.is_cell(*id) && table_of(tree, *id) == Some(table))
        .collect()
}

/// Moves to the next (or previous) cell with a usable position, skipping
/// locked ones. Unhandled at the last (or first) cell of the table.
fn move_to_cell(tree: &ArchTree, cell: NodeId, backwards: bool) -> EditorResult<Option<Range>> {
    let Some(table) = table_of(tree, cell) else {
        return Ok(None);
    };
    let cells = cells_of(tree, table);
    let Some(index) = cells.iter().position(|c| *c == cell) else {
        return Ok(None);
    };
    let candidates: Vec<NodeId> = if backwards {
        cells[..index].iter().rev().copied().collect()
    } else {
        cells[index + 1..].to_vec()
    };
    if candidates.is_empty() {
        return Ok(None);
    }
    for target in candidates {
        let usable = BoundaryPoint::first_in(tree, target).filter(|point| is_usable(tree, point));
        if let Some(point) = usable {
            debug!(from = %cell, to = %target, "Moving to cell");
            return Ok(Some(Range::collapsed(point)));
        }
    }
    Err(EditorError::search_exhausted(format!("no editable cell next to {}", cell)))
}

#[instrument(skip(tree, range))]
pub fn tab(tree: &mut ArchTree, range: &Range, backwards: bool) -> EditorResult<Option<Range>> {
    if let Some(cell) = range.closest(tree, |tree, id| tree.is_cell(id)) {
        return move_to_cell(tree, cell, backwards);
    }

    let point = range.start;
    if let Some(block) = block_of(tree, point.node) {
        if let Some(item) = tree.closest(block, |tree, id| tree.is_list_item(id)) {
            if range.is_collapsed() && at_start_of(tree, &point, item) {
                return indent_list_item(tree, range, item, backwards);
            }
        } else if range.is_collapsed() && at_start_of(tree, &point, block) {
            let level = indent_level(tree, block);
            if backwards && level == 0 {
                return Ok(None);
            }
            let level = if backwards { level - 1 } else { level + 1 };
            set_indent_level(tree, block, level)?;
            return Ok(Some(*range));
        }
    }

    if backwards {
        return Ok(None);
    }
    let spaces: String = std::iter::repeat(NBSP).take(tree.config().tab_width).collect();
    text::insert_text(tree, range, &spaces)
}

fn indent_list_item(
    tree: &mut ArchTree,
    range: &Range,
    item: NodeId,
    backwards: bool,
) -> EditorResult<Option<Range>> {
    if !backwards {
        return Ok(lists::indent_item(tree, item)?.then_some(*range));
    }
    let Some(holder) = lists::outdent_item(tree, item)? else {
        return Ok(None);
    };
    let point = range.start;
    let cursor = if tree.exists(point.node) {
        point
    } else {
        BoundaryPoint::new(holder, point.offset.min(tree.len(holder)))
    };
    Ok(Some(Range::collapsed(cursor)))
}
