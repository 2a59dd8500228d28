//! # Arch Editor
//!
//! Cursor model, selection protection and keyboard edit operations on top of
//! an [`arch_tree::ArchTree`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ arch-tree: markup → node arena              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: positions + operations              │
//! │  - BoundaryPoint traversal and skip rules   │
//! │  - Range normalization and deletion         │
//! │  - secure_range / secure_area               │
//! │  - Backspace, Delete, Enter, Tab            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EditorContext: transactions + host echo     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: the host renders it and reports
//!    selections back as node ids and offsets
//! 2. **All or nothing**: an edit either completes or leaves the tree as it
//!    found it
//! 3. **Ranges are always secured**: no range handed out cuts through an
//!    unbreakable node or rests on a position the user cannot see
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arch_editor::{EditIntent, EditorContext};
//! use arch_tree::ArchConfig;
//!
//! let mut ctx = EditorContext::from_markup(ArchConfig::default(), "<p>dom to edit</p>")?;
//! ctx.apply(EditIntent::InsertText { text: "x".into() });
//! ctx.backspace();
//! println!("{}", ctx.markup(false));
//! ```

pub mod blocks;
pub mod boundary;
mod context;
mod errors;
mod intents;
pub mod operations;
pub mod protection;
pub mod range;
pub mod skip;

pub use boundary::{compare, BoundaryPoint, Direction, Side};
pub use context::{EditorContext, SelectionHost, SelectionReport};
pub use errors::{EditorError, EditorResult};
pub use intents::{EditIntent, TreeMutation};
pub use protection::{secure_area, secure_range};
pub use range::Range;
pub use skip::SkipOptions;
