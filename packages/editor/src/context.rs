//! # Editing session
//!
//! [`EditorContext`] owns the tree and the current range. Every edit runs as
//! a transaction against a snapshot of both:
//!
//! ```text
//! snapshot ─► operation ─┬─ Ok(Some(range)) ─► prune/fill ─► fix layout ─► secure area ─► secure range
//!                        ├─ Ok(None)        ─► restore snapshot
//!                        └─ Err(_)          ─► restore snapshot, warn
//! ```
//!
//! Securing the range may move the host's selection, and the host may answer
//! with selection-changed notifications of its own. Those arrive while the
//! guard is set and are dropped.

use crate::blocks;
use crate::boundary::BoundaryPoint;
use crate::errors::EditorResult;
use crate::intents::{EditIntent, TreeMutation};
use crate::operations;
use crate::protection::{is_usable, secure_area, secure_range};
use crate::range::Range;
use arch_tree::{rules, whitespace, ArchConfig, ArchTree, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// The host side of the selection: whatever renders the document and owns
/// the visible caret.
pub trait SelectionHost {
    /// Moves the visible selection to `range`. Returns the selection-changed
    /// notifications the host fired while doing so.
    fn reflect_selection(&mut self, range: &Range) -> Vec<Range>;
}

/// Selection as `(node, offset)` pairs, for hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub start: (NodeId, usize),
    pub end: (NodeId, usize),
    pub collapsed: bool,
}

/// Where a range end sits, expressed so it survives layout fixes that add
/// or drop architectural spaces.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Exact(BoundaryPoint),
    Before(NodeId),
    After(NodeId),
    Start(NodeId),
}

impl Anchor {
    fn of(tree: &ArchTree, point: BoundaryPoint) -> Self {
        if tree.is_architectural_space(point.node) {
            return match BoundaryPoint::before(tree, point.node) {
                Some(position) => Self::of(tree, position),
                None => Anchor::Exact(point),
            };
        }
        if tree.is_text_like(point.node) {
            return Anchor::Exact(point);
        }
        let children = tree.children(point.node);
        let offset = point.offset.min(children.len());
        let solid = |id: &&NodeId| !tree.is_architectural_space(**id);
        if let Some(child) = children[offset..].iter().find(solid) {
            return Anchor::Before(*child);
        }
        if let Some(child) = children[..offset].iter().rev().find(solid) {
            return Anchor::After(*child);
        }
        Anchor::Start(point.node)
    }

    fn resolve(self, tree: &ArchTree) -> BoundaryPoint {
        let fallback = BoundaryPoint::start_of(tree.root());
        match self {
            Anchor::Exact(point) if tree.exists(point.node) => point.clamp(tree),
            Anchor::Before(child) => BoundaryPoint::before(tree, child).unwrap_or(fallback),
            Anchor::After(child) => BoundaryPoint::after(tree, child).unwrap_or(fallback),
            Anchor::Start(node) if tree.exists(node) => BoundaryPoint::start_of(node),
            _ => fallback,
        }
    }
}

/// One editing session: the document, the current range and the host.
pub struct EditorContext {
    tree: ArchTree,
    range: Range,
    securing: bool,
    suppressed: usize,
    host: Option<Box<dyn SelectionHost>>,
}

fn first_usable(tree: &ArchTree) -> BoundaryPoint {
    let start = BoundaryPoint::start_of(tree.root());
    if is_usable(tree, &start) {
        return start;
    }
    start.next_until(tree, is_usable).unwrap_or(start)
}

impl EditorContext {
    pub fn new(mut tree: ArchTree) -> EditorResult<Self> {
        secure_area(&mut tree)?;
        let range = Range::collapsed(first_usable(&tree));
        Ok(Self {
            tree,
            range,
            securing: false,
            suppressed: 0,
            host: None,
        })
    }

    pub fn from_markup(config: ArchConfig, markup: &str) -> EditorResult<Self> {
        Self::new(ArchTree::from_markup(config, markup)?)
    }

    /// Replaces the document. On a parse error the session is unchanged.
    pub fn load(&mut self, markup: &str) -> EditorResult<()> {
        self.tree.load(markup)?;
        secure_area(&mut self.tree)?;
        self.range = Range::collapsed(first_usable(&self.tree));
        Ok(())
    }

    pub fn tree(&self) -> &ArchTree {
        &self.tree
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn markup(&self, keep_virtual: bool) -> String {
        self.tree.serialize(self.tree.root(), keep_virtual)
    }

    pub fn set_host(&mut self, host: Box<dyn SelectionHost>) {
        self.host = Some(host);
    }

    /// Host notifications dropped because they arrived while the range was
    /// being secured.
    pub fn suppressed_notifications(&self) -> usize {
        self.suppressed
    }

    pub fn selection_report(&self) -> SelectionReport {
        SelectionReport {
            start: (self.range.start.node, self.range.start.offset),
            end: (self.range.end.node, self.range.end.offset),
            collapsed: self.range.is_collapsed(),
        }
    }

    /// Takes a range from the host, then secures it. Returns false when the
    /// range does not address this tree.
    pub fn set_range(&mut self, range: Range) -> bool {
        if !range.is_valid(&self.tree) {
            warn!(start = %range.start.node, end = %range.end.node, "Ignoring invalid range");
            return false;
        }
        self.range = range;
        self.secure_selection();
        true
    }

    /// Selection-changed notification from the host.
    pub fn on_selection_changed(&mut self, range: Range) -> bool {
        if self.securing {
            self.suppressed += 1;
            debug!("Selection change while securing, dropped");
            return false;
        }
        self.set_range(range)
    }

    /// Normalizes and secures the current range, then mirrors it to the host.
    pub fn secure_selection(&mut self) -> Range {
        if self.securing {
            self.suppressed += 1;
            return self.range;
        }
        self.securing = true;
        let normalized = self.range.normalize(&self.tree);
        let secured = secure_range(&self.tree, &normalized);
        if secured != self.range {
            debug!(
                start = %secured.start.node,
                start_offset = secured.start.offset,
                end = %secured.end.node,
                end_offset = secured.end.offset,
                "Range corrected"
            );
        }
        self.range = secured;

        let echoes = match self.host.as_mut() {
            Some(host) => host.reflect_selection(&secured),
            None => Vec::new(),
        };
        for echo in echoes {
            self.on_selection_changed(echo);
        }
        self.securing = false;
        secured
    }

    #[instrument(skip(self, intent), fields(intent = intent.name()))]
    pub fn apply(&mut self, intent: EditIntent) -> bool {
        match intent {
            EditIntent::Backspace => self.backspace(),
            EditIntent::Delete => self.delete(),
            EditIntent::Enter => self.enter(),
            EditIntent::ShiftEnter => self.shift_enter(),
            EditIntent::Tab => self.tab(),
            EditIntent::ShiftTab => self.shift_tab(),
            EditIntent::InsertText { text } => self.insert_text(&text),
            EditIntent::DeleteRange => self.delete_range(),
            EditIntent::SetRange { range } => self.set_range(range),
            EditIntent::Mutation { mutation } => self.apply_mutation(&mutation),
        }
    }

    pub fn backspace(&mut self) -> bool {
        self.transaction("backspace", operations::backspace)
    }

    pub fn delete(&mut self) -> bool {
        self.transaction("delete", operations::delete)
    }

    pub fn enter(&mut self) -> bool {
        self.transaction("enter", operations::enter)
    }

    pub fn shift_enter(&mut self) -> bool {
        self.transaction("shiftEnter", operations::shift_enter)
    }

    pub fn tab(&mut self) -> bool {
        self.transaction("tab", |tree, range| operations::tab(tree, range, false))
    }

    pub fn shift_tab(&mut self) -> bool {
        self.transaction("shiftTab", |tree, range| operations::tab(tree, range, true))
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        self.transaction("insertText", |tree, range| operations::insert_text(tree, range, text))
    }

    pub fn delete_range(&mut self) -> bool {
        self.transaction("deleteRange", operations::delete_range)
    }

    /// Applies a structural command. The range stays where it was, or moves
    /// to the document start when the mutation removed what it pointed into.
    pub fn apply_mutation(&mut self, mutation: &TreeMutation) -> bool {
        self.transaction("mutation", |tree, range| {
            mutation.apply(tree)?;
            if range.is_valid(tree) {
                Ok(Some(*range))
            } else {
                Ok(Some(Range::collapsed(BoundaryPoint::start_of(tree.root()))))
            }
        })
    }

    fn transaction(
        &mut self,
        name: &str,
        operation: impl FnOnce(&mut ArchTree, &Range) -> EditorResult<Option<Range>>,
    ) -> bool {
        let snapshot = (self.tree.clone(), self.range);
        let outcome = operation(&mut self.tree, &self.range).and_then(|handled| match handled {
            Some(range) => self.finish(range).map(|_| true),
            None => Ok(false),
        });
        match outcome {
            Ok(true) => true,
            Ok(false) => {
                debug!(operation = name, "Not handled");
                (self.tree, self.range) = snapshot;
                false
            }
            Err(err) => {
                warn!(operation = name, error = %err, "Edit failed, rolling back");
                (self.tree, self.range) = snapshot;
                false
            }
        }
    }

    fn finish(&mut self, range: Range) -> EditorResult<()> {
        let root = self.tree.root();
        blocks::prune_empty(&mut self.tree, root, &[range.start.node, range.end.node])?;
        rules::fill_empty_blocks(&mut self.tree, root);
        let start = Anchor::of(&self.tree, range.start);
        let end = Anchor::of(&self.tree, range.end);
        rules::fix_layout(&mut self.tree, root);
        secure_area(&mut self.tree)?;
        whitespace::protect_spaces(&mut self.tree, root);
        self.range = Range::new(start.resolve(&self.tree), end.resolve(&self.tree));
        self.secure_selection();
        Ok(())
    }
}
