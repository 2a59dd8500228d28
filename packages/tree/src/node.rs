//! Node storage types.
//!
//! Nodes live in the arena owned by [`crate::ArchTree`]; they reference each
//! other by [`NodeId`] only, so the parent/child graph never forms an
//! ownership cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a node, used by hosts to address positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Tree anchor. Always editable, never has a parent.
    Root,
    Element {
        tag: String,
        attributes: Attributes,
    },
    Text {
        value: String,
    },
    /// Zero-width placeholder keeping an otherwise empty position addressable.
    Virtual,
    /// Layout whitespace around block elements; never user content.
    ArchitecturalSpace,
    /// Ephemeral container used while parsing; never persisted.
    Fragment,
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    /// Editability forced on this node (e.g. by securing an atomic node).
    pub editable_override: Option<bool>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            kind,
            children: Vec::new(),
            editable_override: None,
        }
    }

    /// Tag name for elements, `None` for every other kind.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tag().is_some_and(|tag| tag == name)
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        match &mut self.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes().and_then(|attrs| attrs.get(name))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attributes().is_some_and(|attrs| attrs.has_class(class))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. })
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, NodeKind::Virtual)
    }

    pub fn is_architectural_space(&self) -> bool {
        matches!(self.kind, NodeKind::ArchitecturalSpace)
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, NodeKind::Fragment)
    }

    /// Text, Virtual and ArchitecturalSpace nodes hold character offsets
    /// rather than child indices.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Text { .. } | NodeKind::Virtual | NodeKind::ArchitecturalSpace
        )
    }

    /// Number of offsets past zero: characters for text, children otherwise.
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Text { value } => value.chars().count(),
            NodeKind::Virtual | NodeKind::ArchitecturalSpace => 0,
            _ => self.children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Element attributes, kept in insertion order for serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Sets a value, keeping the original position of an existing name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classes of the `class` attribute, in order, without duplicates.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = Vec::new();
        for class in self.get("class").unwrap_or_default().split_whitespace() {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<String> = self.classes().into_iter().map(String::from).collect();
        classes.push(class.to_string());
        self.set("class", classes.join(" "));
    }

    /// Removes a class; drops the attribute entirely once no class is left.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let remaining: Vec<String> = self
            .classes()
            .into_iter()
            .filter(|c| *c != class)
            .map(String::from)
            .collect();
        if remaining.is_empty() {
            self.remove("class");
        } else {
            self.set("class", remaining.join(" "));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.set(name, value);
        }
        attributes
    }
}
