//! Structural rules and layout passes.
//!
//! [`RULES`] maps child kinds to the parents they may live in. A child found
//! under any other parent is wrapped into a synthesized parent, and
//! consecutive synthesized wrappers of the same tag are merged.
//!
//! After structure, empty blocks get a BR filler and every block element is
//! surrounded by ArchitecturalSpace nodes.

use crate::node::{Attributes, NodeId};
use crate::tree::ArchTree;
use crate::whitespace;
use std::collections::HashSet;
use tracing::debug;

/// One entry of the structural rule table.
pub struct StructureRule {
    pub name: &'static str,
    /// Does the rule apply to this child?
    pub child: fn(&ArchTree, NodeId) -> bool,
    /// Is this parent allowed for a matching child?
    pub parent: fn(&ArchTree, NodeId) -> bool,
    /// Tag of the synthesized wrapper.
    pub wrapper: fn(&ArchTree) -> String,
}

fn is_table_section(tree: &ArchTree, id: NodeId) -> bool {
    matches!(tree.tag(id), Some("thead" | "tbody" | "tfoot"))
}

fn is_table(tree: &ArchTree, id: NodeId) -> bool {
    tree.has_tag(id, "table")
}

fn is_list_item(tree: &ArchTree, id: NodeId) -> bool {
    tree.is_list_item(id)
}

fn is_list(tree: &ArchTree, id: NodeId) -> bool {
    tree.is_list(id)
}

fn is_row(tree: &ArchTree, id: NodeId) -> bool {
    tree.is_row(id)
}

fn is_cell(tree: &ArchTree, id: NodeId) -> bool {
    tree.is_cell(id)
}

fn is_row_container(tree: &ArchTree, id: NodeId) -> bool {
    is_table_section(tree, id) || is_table(tree, id)
}

fn is_list_content(tree: &ArchTree, id: NodeId) -> bool {
    !tree.is_list_item(id) && !tree.is_architectural_space(id)
}

fn is_not_list(tree: &ArchTree, id: NodeId) -> bool {
    !tree.is_list(id)
}

fn is_inline(tree: &ArchTree, id: NodeId) -> bool {
    tree.is_inline(id)
}

fn is_not_container_root(tree: &ArchTree, id: NodeId) -> bool {
    !tree.is_container_root(id)
}

pub const RULES: &[StructureRule] = &[
    StructureRule {
        name: "list-item",
        child: is_list_item,
        parent: is_list,
        wrapper: |_| "ul".to_string(),
    },
    StructureRule {
        name: "table-section",
        child: is_table_section,
        parent: is_table,
        wrapper: |_| "table".to_string(),
    },
    StructureRule {
        name: "table-row",
        child: is_row,
        parent: is_row_container,
        wrapper: |_| "tbody".to_string(),
    },
    StructureRule {
        name: "table-cell",
        child: is_cell,
        parent: is_row,
        wrapper: |_| "tr".to_string(),
    },
    StructureRule {
        name: "list-content",
        child: is_list_content,
        parent: is_not_list,
        wrapper: |_| "li".to_string(),
    },
    StructureRule {
        name: "root-inline",
        child: is_inline,
        parent: is_not_container_root,
        wrapper: |tree| tree.config().paragraph_tag.clone(),
    },
];

fn violated_rule(tree: &ArchTree, id: NodeId) -> Option<&'static StructureRule> {
    let parent = tree.parent(id)?;
    RULES
        .iter()
        .find(|rule| (rule.child)(tree, id) && !(rule.parent)(tree, parent))
}

/// Wraps every rule violator below `scope`. Returns the number of wrappers
/// synthesized.
pub fn apply_structure(tree: &mut ArchTree, scope: NodeId) -> usize {
    let mut synthesized: HashSet<NodeId> = HashSet::new();
    let nodes = tree.descendants(scope);

    for id in nodes.into_iter().skip(1) {
        let mut current = id;
        while let Some(rule) = violated_rule(tree, current) {
            let tag = (rule.wrapper)(tree);
            let Some(parent) = tree.parent(current) else {
                break;
            };
            let index = tree.index_of(current).unwrap_or(0);

            let previous = index.checked_sub(1).and_then(|i| tree.child(parent, i));
            if let Some(previous) = previous.filter(|prev| {
                synthesized.contains(prev) && tree.has_tag(*prev, &tag)
            }) {
                let len = tree.children(previous).len();
                tree.raw_insert(previous, len, current);
                break;
            }

            debug!(rule = rule.name, node = %current, wrapper = %tag, "Wrapping node");
            let wrapper = tree.create_element(tag, Attributes::new());
            tree.raw_insert(parent, index, wrapper);
            tree.raw_insert(wrapper, 0, current);
            synthesized.insert(wrapper);
            current = wrapper;
        }
    }
    synthesized.len()
}

/// Blocks that must stay addressable when they hold no content.
pub fn needs_filler(tree: &ArchTree, id: NodeId) -> bool {
    (tree.is_style_block(id) || tree.is_list_item(id) || tree.is_cell(id))
        && tree.is_blank(id)
        && !tree.children(id).iter().any(|child| tree.is_virtual(*child))
}

/// Appends a BR to every blank paragraph-like block, list item and cell.
pub fn fill_empty_blocks(tree: &mut ArchTree, scope: NodeId) -> usize {
    let targets: Vec<NodeId> = tree
        .descendants(scope)
        .into_iter()
        .filter(|id| needs_filler(tree, *id))
        .collect();
    for &id in &targets {
        let br = tree.create_element("br", Attributes::new());
        let len = tree.children(id).len();
        tree.raw_insert(id, len, br);
    }
    targets.len()
}

fn holds_layout(tree: &ArchTree, id: NodeId) -> bool {
    (tree.is_container_root(id) || tree.is_block_element(id))
        && !tree.is_void(id)
        && !tree.is_preformatted(id)
}

/// Places exactly one ArchitecturalSpace on each side of every block element
/// below `scope` and drops the misplaced ones. Existing space nodes are
/// reused in order.
pub fn fix_layout(tree: &mut ArchTree, scope: NodeId) {
    let containers: Vec<NodeId> = tree
        .descendants(scope)
        .into_iter()
        .filter(|id| holds_layout(tree, *id))
        .collect();

    for container in containers {
        let children = tree.children(container).to_vec();
        let (mut spaces, content): (Vec<NodeId>, Vec<NodeId>) = children
            .iter()
            .partition(|child| tree.is_architectural_space(**child));
        spaces.reverse();

        let mut desired: Vec<NodeId> = Vec::with_capacity(children.len() + 2);
        let mut last_is_space = false;
        for child in content {
            if tree.is_block_element(child) {
                if !last_is_space {
                    let space = spaces
                        .pop()
                        .unwrap_or_else(|| tree.create_architectural_space());
                    desired.push(space);
                }
                desired.push(child);
                let space = spaces
                    .pop()
                    .unwrap_or_else(|| tree.create_architectural_space());
                desired.push(space);
                last_is_space = true;
            } else {
                desired.push(child);
                last_is_space = false;
            }
        }

        if desired == children {
            continue;
        }
        for leftover in spaces {
            tree.raw_remove(leftover);
        }
        tree.raw_set_children(container, desired);
    }
}

/// Removes every ArchitecturalSpace below `scope`.
pub fn strip_layout(tree: &mut ArchTree, scope: NodeId) {
    let spaces: Vec<NodeId> = tree
        .descendants(scope)
        .into_iter()
        .filter(|id| tree.is_architectural_space(*id))
        .collect();
    for id in spaces {
        tree.raw_remove(id);
    }
}

/// Full parse-time normalization of a freshly built subtree.
pub fn normalize_structure(tree: &mut ArchTree, scope: NodeId) {
    whitespace::collapse_whitespace(tree, scope);
    apply_structure(tree, scope);
    fill_empty_blocks(tree, scope);
    fix_layout(tree, scope);
}
