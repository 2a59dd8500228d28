//! Text whitespace normalization.
//!
//! Two modes share one flow walk:
//!
//! - [`collapse_whitespace`] runs at parse time. Runs of collapsible
//!   whitespace become one space, spaces that would render invisible at a
//!   line edge are dropped and emptied text nodes are removed.
//! - [`protect_spaces`] runs after a mutation. Spaces left at a line edge or
//!   doubled become U+00A0 so the visible text does not shift, and U+00A0
//!   that no longer needs protecting turns back into a space. Character
//!   counts never change, so cursor offsets stay valid.
//!
//! Preformatted blocks are skipped by both.

use crate::node::NodeId;
use crate::tree::ArchTree;
use std::collections::BTreeMap;

pub const NBSP: char = '\u{00A0}';

fn is_collapsible(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Text(NodeId),
    /// Inline content with a width of its own (media).
    Atom,
    /// Line boundary: block edge, BR, layout space or preformatted block.
    Break,
}

fn walk(tree: &ArchTree, id: NodeId, out: &mut Vec<Flow>) {
    for &child in tree.children(id) {
        if tree.is_text(child) {
            out.push(Flow::Text(child));
        } else if tree.is_virtual(child) {
            continue;
        } else if tree.is_architectural_space(child) || tree.is_br(child) {
            out.push(Flow::Break);
        } else if tree.is_void(child) {
            out.push(Flow::Atom);
        } else if tree
            .tag(child)
            .is_some_and(|tag| tree.config().is_preformatted_tag(tag))
        {
            out.push(Flow::Break);
        } else if tree.is_inline(child) {
            walk(tree, child, out);
        } else {
            out.push(Flow::Break);
            walk(tree, child, out);
            out.push(Flow::Break);
        }
    }
}

fn flow(tree: &ArchTree, scope: NodeId) -> Vec<Flow> {
    let mut out = vec![Flow::Break];
    if !tree.is_preformatted(scope) {
        walk(tree, scope, &mut out);
    }
    out.push(Flow::Break);
    out
}

fn collapse_runs(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.chars() {
        if is_collapsible(c) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Parse-time normalization of every text node below `scope`.
pub fn collapse_whitespace(tree: &mut ArchTree, scope: NodeId) {
    let mut at_line_start = true;
    let mut last_text: Option<NodeId> = None;
    let mut emptied = Vec::new();

    for item in flow(tree, scope) {
        match item {
            Flow::Break => {
                if let Some(id) = last_text.take() {
                    let value = tree.text(id).unwrap_or_default();
                    if value.ends_with(' ') {
                        let trimmed = value.trim_end_matches(' ').to_string();
                        if trimmed.is_empty() {
                            emptied.push(id);
                        }
                        tree.raw_set_text(id, trimmed);
                    }
                }
                at_line_start = true;
            }
            Flow::Atom => {
                at_line_start = false;
                last_text = None;
            }
            Flow::Text(id) => {
                let mut value = collapse_runs(tree.text(id).unwrap_or_default());
                if at_line_start {
                    value = value.trim_start_matches(' ').to_string();
                }
                if value.is_empty() {
                    emptied.push(id);
                } else {
                    at_line_start = value.ends_with(' ');
                    last_text = Some(id);
                }
                tree.raw_set_text(id, value);
            }
        }
    }

    for id in emptied {
        tree.raw_remove(id);
    }
}

fn is_space(c: char) -> bool {
    c == ' ' || c == NBSP
}

/// Post-mutation normalization below `scope`. A space sits as U+00A0 where an
/// ordinary one would collapse (line edges and the second of two spaces) and
/// as an ordinary space everywhere else. Returns the number of rewritten
/// characters.
pub fn protect_spaces(tree: &mut ArchTree, scope: NodeId) -> usize {
    let mut lines: Vec<Vec<(Option<(NodeId, usize)>, char)>> = vec![Vec::new()];
    for item in flow(tree, scope) {
        match item {
            Flow::Break => lines.push(Vec::new()),
            Flow::Atom => {
                if let Some(line) = lines.last_mut() {
                    line.push((None, '\u{FFFC}'));
                }
            }
            Flow::Text(id) => {
                if let Some(line) = lines.last_mut() {
                    let value = tree.text(id).unwrap_or_default();
                    line.extend(value.chars().enumerate().map(|(i, c)| (Some((id, i)), c)));
                }
            }
        }
    }

    let mut changes: BTreeMap<NodeId, Vec<(usize, char)>> = BTreeMap::new();
    for line in &mut lines {
        let len = line.len();
        for k in 0..len {
            let current = line[k].1;
            if !is_space(current) {
                continue;
            }
            let at_edge = k == 0 || k + 1 == len;
            let doubled = k > 0 && line[k - 1].1 == ' ';
            let wanted = if at_edge || doubled { NBSP } else { ' ' };
            if wanted == current {
                continue;
            }
            line[k].1 = wanted;
            if let Some((id, index)) = line[k].0 {
                changes.entry(id).or_default().push((index, wanted));
            }
        }
    }

    let mut rewritten = 0;
    for (id, edits) in changes {
        let value: String = tree
            .text(id)
            .unwrap_or_default()
            .chars()
            .enumerate()
            .map(|(i, c)| {
                edits
                    .iter()
                    .find(|(index, _)| *index == i)
                    .map_or(c, |(_, wanted)| *wanted)
            })
            .collect();
        rewritten += edits.len();
        tree.raw_set_text(id, value);
    }
    rewritten
}
