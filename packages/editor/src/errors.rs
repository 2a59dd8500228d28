//! Error types for the editor

use arch_tree::{ParseError, TreeError};
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("No position found: {0}")]
    SearchExhausted(String),
}

impl EditorError {
    pub fn search_exhausted(what: impl Into<String>) -> Self {
        EditorError::SearchExhausted(what.into())
    }
}
