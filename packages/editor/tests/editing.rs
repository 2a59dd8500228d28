//! Property tests for edits driven through EditorContext
//!
//! Any sequence of keyboard edits, from any starting selection, must leave
//! every non-void element with at least one child and a range that still
//! addresses the tree.

use arch_editor::{BoundaryPoint, EditIntent, EditorContext, Range};
use arch_tree::{ArchConfig, ArchTree, NodeId};
use proptest::prelude::*;
use proptest::sample::{select, Index};

const DOCUMENTS: &[&str] = &[
    "<p>dom to edit</p>",
    "<p>a<b>b</b>c</p><p>d</p>",
    "<p><i><b>nested</b></i> tail</p>",
    "<ul><li>one</li><li>two<ul><li>three</li></ul></li></ul>",
    "<ul><li><p>block</p></li><li>item</li></ul>",
    "<p>a<img src=\"x.png\">b</p>",
    "<table><tbody><tr><td>x</td><td></td></tr></tbody></table><p>y</p>",
    "<h1>title</h1><blockquote><p>quoted<br>line</p></blockquote>",
];

fn positions(tree: &ArchTree) -> Vec<BoundaryPoint> {
    let mut nodes = vec![tree.root()];
    nodes.extend(tree.descendants(tree.root()));
    nodes
        .into_iter()
        .flat_map(|node| (0..=tree.len(node)).map(move |offset| BoundaryPoint::new(node, offset)))
        .collect()
}

fn childless_elements(tree: &ArchTree) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|id| tree.is_element(*id) && !tree.is_void(*id) && tree.children(*id).is_empty())
        .collect()
}

fn intent() -> impl Strategy<Value = EditIntent> {
    prop_oneof![
        Just(EditIntent::Backspace),
        Just(EditIntent::Delete),
        Just(EditIntent::Enter),
        Just(EditIntent::ShiftEnter),
        Just(EditIntent::Tab),
        Just(EditIntent::ShiftTab),
        Just(EditIntent::DeleteRange),
        Just(EditIntent::InsertText { text: "x".to_string() }),
        Just(EditIntent::InsertText { text: " ".to_string() }),
    ]
}

proptest! {
    #[test]
    fn edits_never_leave_childless_elements(
        markup in select(DOCUMENTS),
        a in any::<Index>(),
        b in any::<Index>(),
        intents in prop::collection::vec(intent(), 1..6),
    ) {
        let mut ctx = EditorContext::from_markup(ArchConfig::default(), markup).unwrap();
        let all = positions(ctx.tree());
        ctx.set_range(Range::new(*a.get(&all), *b.get(&all)));

        for intent in intents {
            let name = intent.name();
            ctx.apply(intent);
            let childless = childless_elements(ctx.tree());
            prop_assert!(
                childless.is_empty(),
                "{} left {:?} childless in {}",
                name,
                childless,
                ctx.markup(false)
            );
            prop_assert!(ctx.range().is_valid(ctx.tree()));
        }
    }
}
