use crate::node::{NodeId, NodeKind};
use crate::tree::ArchTree;

/// Serializer turns a subtree back into markup.
///
/// By default layout nodes (Virtual, ArchitecturalSpace) are dropped so the
/// output is exactly the user's content. With `keep_virtual` they are written
/// as U+FEFF and a newline, which the parser turns back into the same shape.
pub struct Serializer<'a> {
    tree: &'a ArchTree,
    keep_virtual: bool,
}

impl<'a> Serializer<'a> {
    pub fn new(tree: &'a ArchTree) -> Self {
        Self {
            tree,
            keep_virtual: false,
        }
    }

    pub fn keep_virtual(mut self, keep_virtual: bool) -> Self {
        self.keep_virtual = keep_virtual;
        self
    }

    /// Root and Fragment serialize their children only.
    pub fn serialize(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(id, &mut output);
        output
    }

    fn serialize_children(&self, id: NodeId, output: &mut String) {
        for &child in self.tree.children(id) {
            self.serialize_node(child, output);
        }
    }

    fn serialize_node(&self, id: NodeId, output: &mut String) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Root | NodeKind::Fragment => self.serialize_children(id, output),
            NodeKind::Text { value } => escape_text(value, output),
            NodeKind::Virtual => {
                if self.keep_virtual {
                    output.push('\u{FEFF}');
                }
            }
            NodeKind::ArchitecturalSpace => {
                if self.keep_virtual {
                    output.push('\n');
                }
            }
            NodeKind::Element { tag, attributes } => {
                output.push('<');
                output.push_str(tag);
                for (name, value) in attributes.iter() {
                    output.push(' ');
                    output.push_str(name);
                    if !value.is_empty() {
                        output.push_str("=\"");
                        escape_attribute(value, output);
                        output.push('"');
                    }
                }
                output.push('>');

                if self.tree.config().is_void_tag(tag) {
                    return;
                }
                self.serialize_children(id, output);
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
        }
    }
}

fn escape_text(value: &str, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{00A0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

fn escape_attribute(value: &str, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
}

impl ArchTree {
    pub fn serialize(&self, id: NodeId, keep_virtual: bool) -> String {
        Serializer::new(self).keep_virtual(keep_virtual).serialize(id)
    }

    /// Markup of the whole document.
    pub fn to_markup(&self) -> String {
        self.serialize(self.root(), false)
    }
}
