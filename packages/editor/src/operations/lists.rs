//! List item indentation.

use crate::blocks;
use crate::errors::EditorResult;
use arch_tree::{ArchTree, Attributes, NodeId};
use tracing::debug;

fn list_of(tree: &ArchTree, item: NodeId) -> Option<NodeId> {
    tree.parent(item).filter(|list| tree.is_list(*list))
}

/// Nests `item` under its previous item, inside a sub-list of the same tag.
/// Returns false for the first item of a list.
pub fn indent_item(tree: &mut ArchTree, item: NodeId) -> EditorResult<bool> {
    let Some(list) = list_of(tree, item) else {
        return Ok(false);
    };
    let Some(previous) = tree
        .prev_significant_sibling(item)
        .filter(|prev| tree.is_list_item(*prev))
    else {
        return Ok(false);
    };
    let tag = tree.tag(list).unwrap_or("ul").to_string();

    let trailing_list = tree
        .significant_children(previous)
        .last()
        .copied()
        .filter(|last| tree.has_tag(*last, &tag));
    let sublist = match trailing_list {
        Some(sublist) => sublist,
        None => {
            let sublist = tree.create_element(tag, Attributes::new());
            tree.append(previous, sublist)?;
            sublist
        }
    };
    tree.append(sublist, item)?;
    debug!(%item, %sublist, "Indented list item");
    Ok(true)
}

/// Lifts `item` one level. A nested item lands right after the item that
/// held its list, taking its following siblings along as its own sub-list. A
/// top-level item is lifted between the two halves of its list: its inline
/// content as a paragraph, its blocks as they are.
///
/// Returns the node now holding the item's content.
pub fn outdent_item(tree: &mut ArchTree, item: NodeId) -> EditorResult<Option<NodeId>> {
    let Some(list) = list_of(tree, item) else {
        return Ok(None);
    };
    let index = tree.index_of(item).unwrap_or(0);
    let following: Vec<NodeId> = tree.children(list)[index + 1..]
        .iter()
        .copied()
        .filter(|child| !tree.is_architectural_space(*child))
        .collect();

    if let Some(outer) = tree.parent(list).filter(|outer| tree.is_list_item(*outer)) {
        if !following.is_empty() {
            let sublist = tree.clone_shallow(list)?;
            tree.append(item, sublist)?;
            for child in following {
                tree.append(sublist, child)?;
            }
        }
        tree.insert_after(item, outer)?;
        if tree.is_blank(list) {
            tree.remove(list)?;
        }
        debug!(%item, %outer, "Outdented nested list item");
        return Ok(Some(item));
    }

    if !following.is_empty() {
        let tail = tree.clone_shallow(list)?;
        tree.insert_after(tail, list)?;
        for child in following {
            tree.append(tail, child)?;
        }
    }
    // Inline runs of the item become paragraphs, its blocks move out as they are.
    let paragraph_tag = tree.config().paragraph_tag.clone();
    let mut anchor = list;
    let mut paragraph: Option<NodeId> = None;
    let mut holder: Option<NodeId> = None;
    for child in tree.children(item).to_vec() {
        if tree.is_architectural_space(child) {
            continue;
        }
        if tree.is_block_element(child) {
            tree.insert_after(child, anchor)?;
            anchor = child;
            paragraph = None;
            holder.get_or_insert(child);
            continue;
        }
        let target = match paragraph {
            Some(target) => target,
            None => {
                let target = tree.create_element(paragraph_tag.clone(), Attributes::new());
                tree.insert_after(target, anchor)?;
                anchor = target;
                paragraph = Some(target);
                holder.get_or_insert(target);
                target
            }
        };
        tree.append(target, child)?;
    }
    let holder = match holder {
        Some(holder) => holder,
        None => {
            let empty = tree.create_element(paragraph_tag, Attributes::new());
            tree.insert_after(empty, list)?;
            empty
        }
    };
    tree.remove(item)?;
    if tree.is_blank(list) {
        tree.remove(list)?;
    }
    blocks::ensure_filler(tree, holder)?;
    debug!(%item, %holder, "Outdented list item out of its list");
    Ok(Some(holder))
}
