pub mod config;
pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod rules;
pub mod serializer;
pub mod tree;
pub mod whitespace;

#[cfg(test)]
mod tests_serializer;

pub use config::{ArchConfig, Capabilities, NodePredicate, DEFAULT_CONFIG_NAME};
pub use error::{ParseError, ParseResult, TreeError, TreeResult};
pub use node::{Attributes, Node, NodeId, NodeKind};
pub use parser::Parser;
pub use serializer::Serializer;
pub use tree::{ArchTree, ZERO_WIDTH_CHARS};
pub use whitespace::NBSP;

/// Parse markup with the default configuration.
pub fn parse(markup: &str) -> ParseResult<ArchTree> {
    ArchTree::from_markup(ArchConfig::default(), markup)
}
