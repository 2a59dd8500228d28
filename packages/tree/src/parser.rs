use crate::config::ArchConfig;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{decode_entities, tokenize, MarkupToken};
use crate::node::{Attributes, NodeId};
use crate::rules;
use crate::tree::ArchTree;
use std::ops::Range;
use tracing::{debug, instrument};

/// Builds nodes from markup into a container of an [`ArchTree`].
///
/// Unclosed elements are closed at end of input; an end tag with no open
/// element to close is an error.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(MarkupToken<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    /// Appends the parsed nodes to `container`.
    pub fn parse_into(&mut self, tree: &mut ArchTree, container: NodeId) -> ParseResult<()> {
        let mut open: Vec<(NodeId, String)> = vec![(container, String::new())];

        while let Some((token, span)) = self.advance() {
            let start = span.start;
            let parent = open.last().map(|(id, _)| *id).unwrap_or(container);
            match token {
                MarkupToken::Text(text) => {
                    let value = decode_entities(text);
                    let id = if value.chars().all(|c| c == '\u{FEFF}') {
                        tree.create_virtual()
                    } else {
                        tree.create_text(value.into_owned())
                    };
                    let len = tree.children(parent).len();
                    tree.raw_insert(parent, len, id);
                }
                MarkupToken::StartTag(name) => {
                    let tag = name.to_ascii_lowercase();
                    let (attributes, self_closing) = self.parse_attributes()?;
                    let void = tree.config().is_void_tag(&tag);
                    let id = tree.create_element(tag.clone(), attributes);
                    let len = tree.children(parent).len();
                    tree.raw_insert(parent, len, id);
                    if !void && !self_closing {
                        open.push((id, tag));
                    }
                }
                MarkupToken::EndTag(name) => {
                    let tag = name.to_ascii_lowercase();
                    self.expect_close()?;
                    if tree.config().is_void_tag(&tag) {
                        continue;
                    }
                    match open.iter().skip(1).rposition(|(_, t)| *t == tag) {
                        Some(index) => open.truncate(index + 1),
                        None => return Err(ParseError::unexpected_end_tag(start, tag)),
                    }
                }
                other => {
                    return Err(ParseError::invalid_syntax(
                        start,
                        format!("Unexpected token: {:?}", other),
                    ));
                }
            }
        }

        if open.len() > 1 {
            debug!(unclosed = open.len() - 1, "Closing elements at end of input");
        }
        Ok(())
    }

    fn advance(&mut self) -> Option<(MarkupToken<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&MarkupToken<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn expect_close(&mut self) -> ParseResult<()> {
        match self.advance() {
            Some((MarkupToken::TagClose, _)) => Ok(()),
            Some((_, span)) => Err(ParseError::invalid_syntax(span.start, "Expected '>'")),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    /// Attributes up to the end of a start tag; returns whether it self-closed.
    fn parse_attributes(&mut self) -> ParseResult<(Attributes, bool)> {
        let mut attributes = Attributes::new();
        loop {
            let pos = self.peek_pos();
            match self.advance() {
                Some((MarkupToken::TagClose, _)) => return Ok((attributes, false)),
                Some((MarkupToken::SelfClose, _)) => return Ok((attributes, true)),
                Some((MarkupToken::AttrName(name), _)) => {
                    let name = name.to_ascii_lowercase();
                    if self.peek() == Some(&MarkupToken::Equals) {
                        self.advance();
                        match self.advance() {
                            Some((MarkupToken::AttrValue(value), _)) => {
                                attributes.set(name, decode_entities(value).into_owned());
                            }
                            _ => {
                                return Err(ParseError::invalid_syntax(
                                    pos,
                                    format!("Expected a value for attribute '{}'", name),
                                ))
                            }
                        }
                    } else {
                        attributes.set(name, "");
                    }
                }
                Some((_, span)) => {
                    return Err(ParseError::invalid_syntax(span.start, "Expected attribute"))
                }
                None => return Err(ParseError::unexpected_eof(self.source.len())),
            }
        }
    }
}

impl ArchTree {
    /// Builds a tree from markup with the given configuration.
    pub fn from_markup(config: ArchConfig, markup: &str) -> ParseResult<Self> {
        let mut tree = ArchTree::new(config);
        tree.load(markup)?;
        Ok(tree)
    }

    /// Parses markup into a new, detached, normalized Fragment.
    ///
    /// On error nothing is allocated.
    #[instrument(skip(self, markup), fields(len = markup.len()))]
    pub fn parse(&mut self, markup: &str) -> ParseResult<NodeId> {
        let mark = self.allocated();
        let fragment = self.create_fragment();
        let result = Parser::new(markup).and_then(|mut parser| parser.parse_into(self, fragment));
        if let Err(err) = result {
            debug!(error = %err, "Parse failed, rolling back");
            self.truncate_arena(mark);
            return Err(err);
        }
        rules::normalize_structure(self, fragment);
        Ok(fragment)
    }

    /// Replaces the whole document with parsed markup. The previous content is
    /// kept untouched when parsing fails.
    #[instrument(skip(self, markup), fields(len = markup.len()))]
    pub fn load(&mut self, markup: &str) -> ParseResult<()> {
        let fragment = self.parse(markup)?;
        let root = self.root();
        for child in self.children(root).to_vec() {
            self.raw_remove(child);
        }
        let content = self.children(fragment).to_vec();
        self.raw_set_children(root, content);
        self.raw_set_children(fragment, Vec::new());
        self.raw_remove(fragment);
        rules::fix_layout(self, root);
        debug!(nodes = self.descendants(root).len(), "Document loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(markup: &str) -> ArchTree {
        ArchTree::from_markup(ArchConfig::default(), markup).unwrap()
    }

    fn element_children(tree: &ArchTree, id: NodeId) -> Vec<NodeId> {
        tree.children(id)
            .iter()
            .copied()
            .filter(|child| !tree.is_architectural_space(*child))
            .collect()
    }

    #[test]
    fn test_parse_nested_elements() {
        let tree = load("<p>a<b>b</b>c</p>");
        let blocks = element_children(&tree, tree.root());
        assert_eq!(blocks.len(), 1);
        let p = blocks[0];
        assert_eq!(tree.tag(p), Some("p"));
        assert_eq!(tree.children(p).len(), 3);
        assert_eq!(tree.text_content(p), "abc");
    }

    #[test]
    fn test_void_and_self_closing() {
        let tree = load("<p>a<br>b<img src=\"x.png\"/>c</p>");
        let p = element_children(&tree, tree.root())[0];
        let tags: Vec<Option<&str>> = tree.children(p).iter().map(|id| tree.tag(*id)).collect();
        assert_eq!(tags, vec![None, Some("br"), None, Some("img"), None]);
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let tree = load("<ul><li>one<li>two");
        let ul = element_children(&tree, tree.root())[0];
        let li = element_children(&tree, ul)[0];
        // Without implicit closing rules the second item nests in the first.
        assert_eq!(tree.text_content(li), "onetwo");
    }

    #[test]
    fn test_stray_end_tag_is_rejected() {
        let mut tree = load("<p>keep</p>");
        let before = tree.descendants(tree.root()).len();
        let allocated = tree.allocated();

        let err = tree.load("<p>x</p></div>").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEndTag { ref tag, .. } if tag == "div"));
        assert_eq!(tree.descendants(tree.root()).len(), before);
        assert_eq!(tree.allocated(), allocated);
        assert_eq!(tree.text_content(tree.root()), "keep");
    }

    #[test]
    fn test_zero_width_text_becomes_virtual() {
        let tree = load("<p>\u{FEFF}</p>");
        let p = element_children(&tree, tree.root())[0];
        assert!(tree.is_virtual(tree.children(p)[0]));
    }

    #[test]
    fn test_entities_in_text_and_attributes() {
        let tree = load("<p title=\"a &amp; b\">x &lt; y</p>");
        let p = element_children(&tree, tree.root())[0];
        assert_eq!(tree.get(p).unwrap().attribute("title"), Some("a & b"));
        assert_eq!(tree.text_content(p), "x < y");
    }

    #[test]
    fn test_empty_blocks_are_filled() {
        let tree = load("<p></p><ul><li></li></ul>");
        let blocks = element_children(&tree, tree.root());
        assert!(tree.is_br(tree.children(blocks[0])[0]));
        let li = element_children(&tree, blocks[1])[0];
        assert!(tree.is_br(tree.children(li)[0]));
    }
}
