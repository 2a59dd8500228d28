//! Typing and deleting a selection.

use super::block_of;
use crate::boundary::BoundaryPoint;
use crate::errors::EditorResult;
use crate::range::Range;
use arch_tree::{ArchTree, NodeId};
use tracing::instrument;

/// Text node to type into at `point`, created when there is none.
fn text_slot(tree: &mut ArchTree, point: &BoundaryPoint) -> EditorResult<Option<(NodeId, usize)>> {
    if tree.is_text(point.node) {
        return Ok(Some((point.node, point.offset)));
    }
    if tree.is_text_like(point.node) {
        let Some(parent) = tree.parent(point.node) else {
            return Ok(None);
        };
        if !tree.is_editable(parent) {
            return Ok(None);
        }
        if let Some(next) = tree.next_sibling(point.node).filter(|n| tree.is_text(*n)) {
            return Ok(Some((next, 0)));
        }
        let text = tree.create_text("");
        tree.insert_after(text, point.node)?;
        return Ok(Some((text, 0)));
    }
    if tree.is_container_root(point.node) || tree.is_void(point.node) || !tree.is_editable(point.node) {
        return Ok(None);
    }
    if let Some(before) = point.node_before(tree).filter(|n| tree.is_text(*n)) {
        return Ok(Some((before, tree.len(before))));
    }
    if let Some(after) = point.node_after(tree).filter(|n| tree.is_text(*n)) {
        return Ok(Some((after, 0)));
    }
    let text = tree.create_text("");
    tree.insert_at(point.node, point.offset, text)?;
    Ok(Some((text, 0)))
}

#[instrument(skip(tree, range), fields(len = text.len()))]
pub fn insert_text(tree: &mut ArchTree, range: &Range, text: &str) -> EditorResult<Option<Range>> {
    if text.is_empty() {
        return Ok(None);
    }
    let point = if range.is_collapsed() {
        range.start
    } else {
        range.delete_contents(tree)?
    };
    let filler = block_of(tree, point.node).and_then(|block| {
        tree.children(block)
            .iter()
            .copied()
            .find(|child| tree.is_filler_br(*child))
    });

    let Some((node, offset)) = text_slot(tree, &point)? else {
        return Ok(None);
    };
    if !tree.is_editable(node) {
        return Ok(None);
    }
    tree.insert_chars(node, offset, text)?;
    if let Some(br) = filler {
        tree.remove(br)?;
    }
    let cursor = BoundaryPoint::new(node, offset + text.chars().count());
    Ok(Some(Range::collapsed(cursor)))
}

#[instrument(skip(tree, range))]
pub fn delete_range(tree: &mut ArchTree, range: &Range) -> EditorResult<Option<Range>> {
    if range.is_collapsed() {
        return Ok(None);
    }
    let cursor = range.delete_contents(tree)?;
    Ok(Some(Range::collapsed(cursor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_tree::parse;

    #[test]
    fn test_insert_into_text() {
        let mut tree = parse("<p>ac</p>").unwrap();
        let t = tree.descendants(tree.root()).into_iter().find(|id| tree.is_text(*id)).unwrap();
        let range = Range::collapsed(BoundaryPoint::new(t, 1));
        let result = insert_text(&mut tree, &range, "b").unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>abc</p>");
        assert_eq!(result.start, BoundaryPoint::new(t, 2));
    }

    #[test]
    fn test_insert_into_empty_paragraph_replaces_filler() {
        let mut tree = parse("<p></p>").unwrap();
        let p = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.has_tag(*id, "p"))
            .unwrap();
        let range = Range::collapsed(BoundaryPoint::start_of(p));
        let result = insert_text(&mut tree, &range, "hi").unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>hi</p>");
        assert_eq!(result.start.offset, 2);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut tree = parse("<p>abcd</p>").unwrap();
        let t = tree.descendants(tree.root()).into_iter().find(|id| tree.is_text(*id)).unwrap();
        let range = Range::new(BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 3));
        insert_text(&mut tree, &range, "X").unwrap().unwrap();
        assert_eq!(tree.to_markup(), "<p>aXd</p>");
    }

    #[test]
    fn test_delete_range_needs_a_selection() {
        let mut tree = parse("<p>abcd</p>").unwrap();
        let t = tree.descendants(tree.root()).into_iter().find(|id| tree.is_text(*id)).unwrap();
        let point = BoundaryPoint::new(t, 1);
        assert_eq!(delete_range(&mut tree, &Range::collapsed(point)).unwrap(), None);
    }
}
