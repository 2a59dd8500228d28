//! Enter and Shift+Enter.

use super::{block_of, first_position, lists};
use crate::blocks;
use crate::boundary::{BoundaryPoint, Side};
use crate::errors::EditorResult;
use crate::range::Range;
use arch_tree::{ArchTree, Attributes, NodeId};
use tracing::{debug, instrument};

/// A list item with nothing but blank text, at most one line break and no
/// media in it.
fn is_blank_item(tree: &ArchTree, item: NodeId) -> bool {
    let descendants = tree.descendants(item);
    let breaks = descendants.iter().filter(|id| tree.is_br(**id)).count();
    let media = descendants.iter().any(|id| tree.is_media(*id));
    let text = tree.text_content(item);
    let blank_text = text
        .chars()
        .all(|c| c.is_whitespace() || arch_tree::ZERO_WIDTH_CHARS.contains(&c));
    blank_text && breaks <= 1 && !media
}

/// The list item around `node`, else its closest block element.
fn split_target(tree: &ArchTree, node: NodeId) -> Option<NodeId> {
    tree.closest(node, |tree, id| tree.is_list_item(id))
        .or_else(|| block_of(tree, node))
}

#[instrument(skip(tree, range))]
pub fn enter(tree: &mut ArchTree, range: &Range) -> EditorResult<Option<Range>> {
    let point = if range.is_collapsed() {
        range.start
    } else {
        range.delete_contents(tree)?
    };
    let Some(target) = split_target(tree, point.node) else {
        return Ok(None);
    };
    if !tree.parent(target).is_some_and(|parent| tree.is_editable(parent)) {
        return Ok(None);
    }

    if tree.is_list_item(target) && is_blank_item(tree, target) {
        let Some(holder) = lists::outdent_item(tree, target)? else {
            return Ok(None);
        };
        debug!(item = %target, "Enter on a blank list item");
        let cursor = if tree.exists(point.node) {
            point
        } else {
            first_position(tree, holder)
        };
        return Ok(Some(Range::collapsed(cursor)));
    }

    let crosses_unbreakable = tree
        .ancestors_inclusive(point.node)
        .take_while(|node| *node != target)
        .chain(std::iter::once(target))
        .any(|node| tree.is_unbreakable(node));
    if crosses_unbreakable {
        debug!(%target, "Enter inside an unbreakable node falls back to a line break");
        return shift_enter(tree, &Range::collapsed(point));
    }

    let right = tree.split_until(point.node, target, point.offset)?;
    if right == point.node {
        return Ok(None);
    }
    blocks::prune_empty(tree, target, &[])?;
    blocks::prune_empty(tree, right, &[])?;
    blocks::ensure_filler(tree, target)?;
    blocks::ensure_filler(tree, right)?;
    debug!(left = %target, %right, "Split block");
    Ok(Some(Range::collapsed(first_position(tree, right))))
}

#[instrument(skip(tree, range))]
pub fn shift_enter(tree: &mut ArchTree, range: &Range) -> EditorResult<Option<Range>> {
    let point = if range.is_collapsed() {
        range.start
    } else {
        range.delete_contents(tree)?
    };
    let br = tree.create_element("br", Attributes::new());

    if tree.is_text(point.node) {
        if !tree.parent(point.node).is_some_and(|parent| tree.is_editable(parent)) {
            return Ok(None);
        }
        let len = tree.len(point.node);
        if point.offset == 0 {
            tree.insert_before(br, point.node)?;
        } else if point.offset >= len {
            tree.insert_after(br, point.node)?;
        } else {
            tree.split(point.node, point.offset)?;
            tree.insert_after(br, point.node)?;
        }
    } else if tree.is_text_like(point.node) {
        if !tree.parent(point.node).is_some_and(|parent| tree.is_editable(parent)) {
            return Ok(None);
        }
        tree.insert_after(br, point.node)?;
    } else {
        if !tree.is_editable(point.node) || tree.is_container_root(point.node) {
            return Ok(None);
        }
        tree.insert_at(point.node, point.offset, br)?;
    }

    let Some(after) = BoundaryPoint::after(tree, br) else {
        return Ok(None);
    };
    if let Some(block) = block_of(tree, br) {
        if after.is_edge_of(tree, block, Side::Right) {
            let second = tree.create_element("br", Attributes::new());
            tree.insert_after(second, br)?;
        }
    }
    Ok(Some(Range::collapsed(after)))
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
    fn test_enter_splits_paragraph() {
        let mut tree = parse("<p>a<b>bc</b>d</p>").unwrap();
        let ts = texts(&tree);
        let range = Range::collapsed(BoundaryPoint::new(ts[1], 1));
        let result = enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>a<b>b</b></p><p><b>c</b>d</p>");
        assert_eq!(tree.text(result.start.node), Some("c"));
        assert_eq!(result.start.offset, 0);
    }

    #[test]
    fn test_enter_at_end_leaves_filled_paragraph() {
        let mut tree = parse("<p>ab</p>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::collapsed(BoundaryPoint::new(t, 2));
        let result = enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>ab</p><p><br></p>");
        assert!(tree.has_tag(result.start.node, "p"));
        assert_eq!(result.start.offset, 0);
    }

    #[test]
    fn test_enter_splits_list_item() {
        let mut tree = parse("<ul><li><p>ab</p></li></ul>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::collapsed(BoundaryPoint::new(t, 1));
        enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<ul><li><p>a</p></li><li><p>b</p></li></ul>");
    }

    #[test]
    fn test_enter_on_blank_item_outdents() {
        let mut tree = parse("<ul><li>a</li><li></li></ul>").unwrap();
        let li = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.is_list_item(*id))
            .last()
            .unwrap();
        let range = Range::collapsed(BoundaryPoint::start_of(li));
        enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<ul><li>a</li></ul><p><br></p>");
    }

    #[test]
    fn test_enter_in_cell_inserts_line_break() {
        let mut tree = parse("<table><tbody><tr><td>ab</td></tr></tbody></table>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::collapsed(BoundaryPoint::new(t, 1));
        enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(
            tree.to_markup(),
            "<table><tbody><tr><td>a<br>b</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_shift_enter_at_line_end_doubles_break() {
        let mut tree = parse("<p>ab</p>").unwrap();
        let t = texts(&tree)[0];
        let p = tree.parent(t).unwrap();
        let range = Range::collapsed(BoundaryPoint::new(t, 2));
        let result = shift_enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>ab<br><br></p>");
        assert_eq!(result.start, BoundaryPoint::new(p, 2));
    }

    #[test]
    fn test_shift_enter_mid_text() {
        let mut tree = parse("<p>abc</p>").unwrap();
        let t = texts(&tree)[0];
        let range = Range::collapsed(BoundaryPoint::new(t, 1));
        shift_enter(&mut tree, &range).unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>a<br>bc</p>");
    }
}
