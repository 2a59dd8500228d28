use crate::node::NodeId;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

pub type TreeResult<T> = Result<T, TreeError>;

/// Markup that cannot be turned into a tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },

    #[error("Unexpected end tag </{tag}> at {pos}")]
    UnexpectedEndTag { pos: usize, tag: String },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Unexpected end of input at {pos}")]
    UnexpectedEof { pos: usize },
}

impl ParseError {
    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn unexpected_end_tag(pos: usize, tag: impl Into<String>) -> Self {
        Self::UnexpectedEndTag {
            pos,
            tag: tag.into(),
        }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    /// Byte offset in the source where the problem was detected.
    pub fn pos(&self) -> usize {
        match self {
            ParseError::LexerError { pos }
            | ParseError::UnexpectedEndTag { pos, .. }
            | ParseError::InvalidSyntax { pos, .. }
            | ParseError::UnexpectedEof { pos } => *pos,
        }
    }
}

/// A structural change the tree refused to make. The tree is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not editable")]
    NotEditable(NodeId),

    #[error("Node {0} is unbreakable")]
    Unbreakable(NodeId),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node {0} is not text")]
    NotAText(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Offset {offset} out of bounds for node {node}")]
    OffsetOutOfBounds { node: NodeId, offset: usize },
}
