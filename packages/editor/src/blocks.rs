//! Block-level helpers shared by range deletion and the edit operations.

use crate::boundary::BoundaryPoint;
use crate::errors::EditorResult;
use arch_tree::{rules, ArchTree, Attributes, NodeId, TreeError};
use tracing::trace;

/// A block that would no longer be a cursor target without a filler.
pub fn needs_filler(tree: &ArchTree, id: NodeId) -> bool {
    if rules::needs_filler(tree, id) {
        return true;
    }
    tree.is_block_element(id)
        && !tree.is_void(id)
        && !tree.is_list(id)
        && !tree.is_unbreakable(id)
        && tree.is_blank(id)
        && !tree.children(id).iter().any(|child| tree.is_virtual(*child))
}

/// Appends a BR to `block` when it needs one; returns the filler.
pub fn ensure_filler(tree: &mut ArchTree, block: NodeId) -> EditorResult<Option<NodeId>> {
    if !tree.exists(block) || !needs_filler(tree, block) {
        return Ok(None);
    }
    let br = tree.create_element("br", Attributes::new());
    tree.append(block, br)?;
    trace!(%block, %br, "Added filler");
    Ok(Some(br))
}

/// Removes the filler BRs of `block`.
pub fn drop_fillers(tree: &mut ArchTree, block: NodeId) -> EditorResult<()> {
    let fillers: Vec<NodeId> = tree
        .children(block)
        .iter()
        .copied()
        .filter(|child| tree.is_filler_br(*child))
        .collect();
    for br in fillers {
        tree.remove(br)?;
    }
    Ok(())
}

/// Removes `id`, then every ancestor left blank by the removal, stopping at
/// container roots, unremovable nodes and any ancestor of `keep`.
pub fn remove_empty_chain(tree: &mut ArchTree, id: NodeId, keep: Option<NodeId>) -> EditorResult<()> {
    let mut current = id;
    loop {
        if !tree.can_remove(current) {
            return Ok(());
        }
        let parent = tree.parent(current);
        tree.remove(current)?;
        match parent {
            Some(parent)
                if !tree.is_container_root(parent)
                    && keep.map_or(true, |keep| !tree.contains(parent, keep))
                    && tree.is_blank(parent)
                    && !tree.is_cell(parent) =>
            {
                current = parent;
            }
            _ => return Ok(()),
        }
    }
}

/// Removes empty texts and childless inline elements below `scope`, except
/// `keep` and its ancestors.
pub fn prune_empty(tree: &mut ArchTree, scope: NodeId, keep: &[NodeId]) -> EditorResult<()> {
    let candidates: Vec<NodeId> = tree.descendants(scope).into_iter().rev().collect();
    for id in candidates {
        if id == scope || !tree.exists(id) || keep.iter().any(|k| tree.contains(id, *k)) {
            continue;
        }
        let empty_text = tree.is_text(id) && tree.len(id) == 0;
        let empty_inline = tree.is_element(id)
            && tree.is_inline(id)
            && !tree.is_void(id)
            && tree.children(id).is_empty();
        if (empty_text || empty_inline) && tree.can_remove(id) {
            tree.remove(id)?;
        }
    }
    Ok(())
}

/// Folds every Text sibling directly following `text` into it.
pub fn join_following_texts(tree: &mut ArchTree, text: NodeId) -> EditorResult<()> {
    while let Some(next) = tree.next_sibling(text).filter(|n| tree.is_text(*n)) {
        let joined = format!(
            "{}{}",
            tree.text(text).unwrap_or_default(),
            tree.text(next).unwrap_or_default()
        );
        tree.set_text(text, joined)?;
        tree.remove(next)?;
    }
    Ok(())
}

/// Position at the end of the content of `parent` before child `index`:
/// the end of the last text when there is one, an element position otherwise.
fn junction(tree: &ArchTree, parent: NodeId, index: usize) -> BoundaryPoint {
    let previous = index.checked_sub(1).and_then(|i| tree.child(parent, i));
    if let Some(previous) = previous.filter(|p| tree.is_inline(*p)) {
        let leaf = tree.last_leaf(previous);
        if tree.is_text(leaf) {
            return BoundaryPoint::end_of(tree, leaf);
        }
    }
    BoundaryPoint::new(parent, index)
}

/// Moves the content of `right` into `left` and removes `right` together with
/// the ancestors it leaves blank. Returns the position at the junction.
pub fn merge_blocks(tree: &mut ArchTree, left: NodeId, right: NodeId) -> EditorResult<BoundaryPoint> {
    if left == right || tree.contains(right, left) {
        return Err(TreeError::InvalidStructure(format!("cannot merge {} into {}", right, left)).into());
    }
    drop_fillers(tree, left)?;
    drop_fillers(tree, right)?;

    let index = if tree.contains(left, right) {
        tree.ancestors(right)
            .zip(tree.ancestors_inclusive(right))
            .find(|(parent, _)| *parent == left)
            .and_then(|(_, child)| tree.index_of(child))
            .unwrap_or(0)
    } else {
        tree.children(left).len()
    };
    let cursor = junction(tree, left, index);

    let moving: Vec<NodeId> = tree
        .children(right)
        .iter()
        .copied()
        .filter(|child| !tree.is_architectural_space(*child))
        .collect();
    for (k, child) in moving.into_iter().enumerate() {
        tree.insert_at(left, index + k, child)?;
    }
    if tree.is_text(cursor.node) {
        join_following_texts(tree, cursor.node)?;
    }

    remove_empty_chain(tree, right, Some(left))?;
    ensure_filler(tree, left)?;
    trace!(%left, %right, "Merged blocks");
    Ok(cursor)
}
