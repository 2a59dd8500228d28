//! Host-supplied configuration.
//!
//! Every classification the tree makes (block/inline, void, unbreakable,
//! editable) is derived from an [`ArchConfig`]. The data-driven part is plain
//! serde so hosts can ship it as JSON; predicate hooks are attached in code.

use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_CONFIG_NAME: &str = "arch.config.json";

/// Tags whose nodes are unbreakable by structure alone.
pub const STRUCTURAL_UNBREAKABLE_TAGS: &[&str] =
    &["table", "thead", "tbody", "tfoot", "tr", "td", "th"];

pub const LIST_TAGS: &[&str] = &["ul", "ol"];
pub const LIST_ITEM_TAG: &str = "li";
pub const CELL_TAGS: &[&str] = &["td", "th"];
pub const ROW_TAG: &str = "tr";
pub const LINE_BREAK_TAG: &str = "br";
pub const ANCHOR_TAG: &str = "a";

/// Host predicate over a single node.
#[derive(Clone)]
pub struct NodePredicate(Arc<dyn Fn(&Node) -> bool + Send + Sync>);

impl NodePredicate {
    pub fn new(f: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, node: &Node) -> bool {
        (self.0)(node)
    }
}

impl fmt::Debug for NodePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodePredicate(..)")
    }
}

/// Editor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchConfig {
    /// Atomic tags: no children, no interior cursor position.
    pub void_tags: BTreeSet<String>,

    /// Inline ("format") tags. Every other element is a block.
    pub format_tags: BTreeSet<String>,

    /// Paragraph-like block tags; the first structural wrap uses `paragraph_tag`.
    pub style_tags: BTreeSet<String>,

    /// Blocks whose whitespace is kept verbatim.
    pub preformatted_tags: BTreeSet<String>,

    pub unbreakable_tags: BTreeSet<String>,
    pub unbreakable_classes: BTreeSet<String>,
    pub not_editable_classes: BTreeSet<String>,

    /// Tag used to wrap stray inline content and outdented list items.
    pub paragraph_tag: String,

    /// Attribute holding the indentation level of non-list blocks.
    pub indent_attribute: String,

    /// Number of non-breaking spaces inserted by Tab.
    pub tab_width: usize,

    #[serde(skip)]
    unbreakable_hook: Option<NodePredicate>,

    #[serde(skip)]
    editable_hook: Option<NodePredicate>,
}

fn tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

impl Default for ArchConfig {
    fn default() -> Self {
        Self {
            void_tags: tag_set(&["br", "hr", "img", "input", "iframe", "video", "embed", "wbr"]),
            format_tags: tag_set(&[
                "a", "abbr", "b", "br", "code", "em", "font", "i", "img", "input", "kbd", "mark",
                "s", "small", "span", "strong", "sub", "sup", "u", "wbr",
            ]),
            style_tags: tag_set(&["p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre"]),
            preformatted_tags: tag_set(&["pre"]),
            unbreakable_tags: BTreeSet::new(),
            unbreakable_classes: tag_set(&["unbreakable"]),
            not_editable_classes: tag_set(&["not-editable"]),
            paragraph_tag: "p".to_string(),
            indent_attribute: "data-indent".to_string(),
            tab_width: 4,
            unbreakable_hook: None,
            editable_hook: None,
        }
    }
}

impl ArchConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Extra unbreakable predicate, OR-ed with the configured tags and classes.
    pub fn with_unbreakable(mut self, f: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        self.unbreakable_hook = Some(NodePredicate::new(f));
        self
    }

    /// Extra editability predicate: a node for which it returns `false` is
    /// not editable, and neither is anything below it.
    pub fn with_editable(mut self, f: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        self.editable_hook = Some(NodePredicate::new(f));
        self
    }

    pub fn is_void_tag(&self, tag: &str) -> bool {
        self.void_tags.contains(tag)
    }

    pub fn is_format_tag(&self, tag: &str) -> bool {
        self.format_tags.contains(tag)
    }

    pub fn is_style_tag(&self, tag: &str) -> bool {
        self.style_tags.contains(tag)
    }

    pub fn is_preformatted_tag(&self, tag: &str) -> bool {
        self.preformatted_tags.contains(tag)
    }

    /// Unbreakability of a node taken on its own (no ancestry).
    pub fn node_unbreakable(&self, node: &Node) -> bool {
        let Some(tag) = node.tag() else {
            return false;
        };
        STRUCTURAL_UNBREAKABLE_TAGS.contains(&tag)
            || self.unbreakable_tags.contains(tag)
            || self
                .unbreakable_classes
                .iter()
                .any(|class| node.has_class(class))
            || self
                .unbreakable_hook
                .as_ref()
                .is_some_and(|hook| hook.test(node))
    }

    /// Editability a node declares for itself; `None` inherits from the parent.
    pub fn node_editability(&self, node: &Node) -> Option<bool> {
        if let Some(forced) = node.editable_override {
            return Some(forced);
        }
        if node.is_root() {
            return Some(true);
        }
        if self
            .editable_hook
            .as_ref()
            .is_some_and(|hook| !hook.test(node))
        {
            return Some(false);
        }
        if self
            .not_editable_classes
            .iter()
            .any(|class| node.has_class(class))
        {
            return Some(false);
        }
        match node.attribute("contenteditable") {
            Some("false") => Some(false),
            Some("true") | Some("") => Some(true),
            _ => None,
        }
    }
}

/// Classification of one node, computed in a single place from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub block: bool,
    pub void: bool,
    pub unbreakable: bool,
    pub editable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Attributes, NodeId, NodeKind};

    fn element(tag: &str, attrs: &[(&str, &str)]) -> Node {
        Node::new(
            NodeId(1),
            NodeKind::Element {
                tag: tag.to_string(),
                attributes: attrs.iter().copied().collect::<Attributes>(),
            },
        )
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "voidTags": ["br", "img"],
            "unbreakableClasses": ["card"],
            "tabWidth": 2
        }"#;

        let config = ArchConfig::from_json(json).unwrap();
        assert!(config.is_void_tag("img"));
        assert!(!config.is_void_tag("hr"));
        assert_eq!(config.tab_width, 2);
        // Unspecified fields fall back to defaults
        assert_eq!(config.paragraph_tag, "p");
        assert!(config.is_format_tag("b"));
    }

    #[test]
    fn test_structural_tags_are_unbreakable() {
        let config = ArchConfig::default();
        assert!(config.node_unbreakable(&element("td", &[])));
        assert!(config.node_unbreakable(&element("div", &[("class", "unbreakable")])));
        assert!(!config.node_unbreakable(&element("p", &[])));
    }

    #[test]
    fn test_hooks_extend_classification() {
        let config = ArchConfig::default()
            .with_unbreakable(|node| node.has_tag("section"))
            .with_editable(|node| node.attribute("data-locked").is_none());

        assert!(config.node_unbreakable(&element("section", &[])));
        assert_eq!(
            config.node_editability(&element("div", &[("data-locked", "1")])),
            Some(false)
        );
        assert_eq!(config.node_editability(&element("div", &[])), None);
        assert_eq!(
            config.node_editability(&element("div", &[("contenteditable", "true")])),
            Some(true)
        );
    }
}
