//! # Edit intents
//!
//! What a host can ask of an editing session, as plain serde values so a
//! stream of intents can be exchanged as JSON:
//!
//! ```json
//! [
//!   { "type": "setRange", "range": { "start": { "node": 4, "offset": 5 },
//!                                     "end":   { "node": 4, "offset": 5 } } },
//!   { "type": "backspace" },
//!   { "type": "insertText", "text": "x" }
//! ]
//! ```
//!
//! [`TreeMutation`] carries structural commands from feature plugins living
//! outside the core (links, media, tables). Each one is validated against the
//! tree before it is applied, and a rejected mutation changes nothing.

use crate::range::Range;
use arch_tree::{ArchTree, NodeId, TreeError, TreeResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditIntent {
    Backspace,
    Delete,
    Enter,
    ShiftEnter,
    Tab,
    ShiftTab,
    InsertText { text: String },
    DeleteRange,
    SetRange { range: Range },
    Mutation { mutation: TreeMutation },
}

impl EditIntent {
    pub fn name(&self) -> &'static str {
        match self {
            EditIntent::Backspace => "backspace",
            EditIntent::Delete => "delete",
            EditIntent::Enter => "enter",
            EditIntent::ShiftEnter => "shiftEnter",
            EditIntent::Tab => "tab",
            EditIntent::ShiftTab => "shiftTab",
            EditIntent::InsertText { .. } => "insertText",
            EditIntent::DeleteRange => "deleteRange",
            EditIntent::SetRange { .. } => "setRange",
            EditIntent::Mutation { .. } => "mutation",
        }
    }
}

/// Structural command addressed by node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TreeMutation {
    /// Parse markup and insert the result under `parent` at `index`
    InsertMarkup {
        parent: NodeId,
        index: usize,
        markup: String,
    },

    /// Remove a node and everything below it
    RemoveNode { node: NodeId },

    /// Replace a node wholesale with parsed markup
    ReplaceNode { node: NodeId, markup: String },

    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },

    RemoveAttribute { node: NodeId, name: String },

    /// Atomic replacement of a text node's value
    UpdateText { node: NodeId, content: String },
}

impl TreeMutation {
    /// Apply the mutation after validating it.
    ///
    /// Returns the nodes the mutation inserted (empty for in-place edits).
    pub fn apply(&self, tree: &mut ArchTree) -> TreeResult<Vec<NodeId>> {
        self.validate(tree)?;

        match self {
            TreeMutation::InsertMarkup {
                parent,
                index,
                markup,
            } => Self::apply_insert(tree, *parent, *index, markup),

            TreeMutation::RemoveNode { node } => {
                tree.remove(*node)?;
                Ok(Vec::new())
            }

            TreeMutation::ReplaceNode { node, markup } => Self::apply_replace(tree, *node, markup),

            TreeMutation::SetAttribute { node, name, value } => {
                tree.set_attribute(*node, name, value)?;
                Ok(Vec::new())
            }

            TreeMutation::RemoveAttribute { node, name } => {
                tree.remove_attribute(*node, name)?;
                Ok(Vec::new())
            }

            TreeMutation::UpdateText { node, content } => {
                tree.set_text(*node, content.as_str())?;
                Ok(Vec::new())
            }
        }
    }

    fn parse_fragment(tree: &mut ArchTree, markup: &str) -> TreeResult<(NodeId, Vec<NodeId>)> {
        let fragment = tree
            .parse(markup)
            .map_err(|err| TreeError::InvalidStructure(format!("invalid markup: {}", err)))?;
        let children = tree.children(fragment).to_vec();
        Ok((fragment, children))
    }

    fn apply_insert(tree: &mut ArchTree, parent: NodeId, index: usize, markup: &str) -> TreeResult<Vec<NodeId>> {
        let (fragment, children) = Self::parse_fragment(tree, markup)?;
        let index = index.min(tree.children(parent).len());
        for (k, child) in children.iter().enumerate() {
            tree.insert_at(parent, index + k, *child)?;
        }
        tree.remove(fragment)?;
        Ok(children)
    }

    fn apply_replace(tree: &mut ArchTree, node: NodeId, markup: &str) -> TreeResult<Vec<NodeId>> {
        let (fragment, children) = Self::parse_fragment(tree, markup)?;
        match children.split_last() {
            Some((last, rest)) => {
                for child in rest {
                    tree.insert_before(*child, node)?;
                }
                tree.replace(node, *last)?;
            }
            None => tree.remove(node)?,
        }
        tree.remove(fragment)?;
        Ok(children)
    }

    /// Validate without applying
    pub fn validate(&self, tree: &ArchTree) -> TreeResult<()> {
        match self {
            TreeMutation::InsertMarkup { parent, .. } => {
                let node = tree.node(*parent)?;
                if node.is_text_like() || tree.is_void(*parent) {
                    return Err(TreeError::InvalidStructure(format!(
                        "{} cannot have children",
                        parent
                    )));
                }
                if !tree.is_editable(*parent) {
                    return Err(TreeError::NotEditable(*parent));
                }
                Ok(())
            }

            TreeMutation::RemoveNode { node } | TreeMutation::ReplaceNode { node, .. } => {
                tree.node(*node)?;
                if tree.is_root(*node) {
                    return Err(TreeError::InvalidStructure("cannot remove the root".into()));
                }
                let parent_editable = tree.parent(*node).map_or(true, |p| tree.is_editable(p));
                if !parent_editable {
                    return Err(TreeError::NotEditable(*node));
                }
                if matches!(self, TreeMutation::RemoveNode { .. }) && !tree.can_remove(*node) {
                    return Err(TreeError::Unbreakable(*node));
                }
                Ok(())
            }

            TreeMutation::SetAttribute { node, .. } | TreeMutation::RemoveAttribute { node, .. } => {
                if !tree.node(*node)?.is_element() {
                    return Err(TreeError::NotAnElement(*node));
                }
                if !tree.is_editable(*node) {
                    return Err(TreeError::NotEditable(*node));
                }
                Ok(())
            }

            TreeMutation::UpdateText { node, .. } => {
                if !tree.node(*node)?.is_text() {
                    return Err(TreeError::NotAText(*node));
                }
                if !tree.is_editable(*node) {
                    return Err(TreeError::NotEditable(*node));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_tree::parse;

    fn first(tree: &ArchTree, tag: &str) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find(|id| tree.has_tag(*id, tag))
            .unwrap()
    }

    #[test]
    fn test_intent_serialization() {
        let intent = EditIntent::InsertText {
            text: "Hello".to_string(),
        };
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(json, r#"{"type":"insertText","text":"Hello"}"#);
        let deserialized: EditIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(intent, deserialized);

        let parsed: Vec<EditIntent> =
            serde_json::from_str(r#"[{"type":"backspace"},{"type":"shiftEnter"}]"#).unwrap();
        assert_eq!(parsed, vec![EditIntent::Backspace, EditIntent::ShiftEnter]);
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = TreeMutation::UpdateText {
            node: NodeId(3),
            content: "Hello World".to_string(),
        };
        let json = serde_json::to_string(&mutation).unwrap();
        assert_eq!(json, r#"{"kind":"updateText","node":3,"content":"Hello World"}"#);
        let deserialized: TreeMutation = serde_json::from_str(&json).unwrap();
        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_insert_markup() {
        let mut tree = parse("<p>a</p>").unwrap();
        let root = tree.root();
        let len = tree.children(root).len();
        let inserted = TreeMutation::InsertMarkup {
            parent: root,
            index: len,
            markup: "<p>b</p>".to_string(),
        }
        .apply(&mut tree)
        .unwrap();
        assert!(!inserted.is_empty());
        assert_eq!(tree.to_markup(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_replace_node() {
        let mut tree = parse("<p>a</p><table><tbody><tr><td>x</td></tr></tbody></table>").unwrap();
        let table = first(&tree, "table");
        TreeMutation::ReplaceNode {
            node: table,
            markup: "<p>b</p>".to_string(),
        }
        .apply(&mut tree)
        .unwrap();
        assert_eq!(tree.to_markup(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_remove_cell_is_rejected() {
        let mut tree = parse("<table><tbody><tr><td>x</td></tr></tbody></table>").unwrap();
        let td = first(&tree, "td");
        let before = tree.to_markup();
        let result = TreeMutation::RemoveNode { node: td }.apply(&mut tree);
        assert_eq!(result, Err(TreeError::Unbreakable(td)));
        assert_eq!(tree.to_markup(), before);
    }

    #[test]
    fn test_update_text_validates_kind() {
        let mut tree = parse("<p>a</p>").unwrap();
        let p = first(&tree, "p");
        let result = TreeMutation::UpdateText {
            node: p,
            content: "x".to_string(),
        }
        .apply(&mut tree);
        assert_eq!(result, Err(TreeError::NotAText(p)));
    }
}
