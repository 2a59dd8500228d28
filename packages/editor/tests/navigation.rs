//! Property tests for cursor normalization

use arch_editor::range::normalize_point;
use arch_editor::{compare, BoundaryPoint, Direction, Range};
use arch_tree::{parse, ArchTree};
use proptest::prelude::*;
use proptest::sample::{select, Index};
use std::cmp::Ordering;

const DOCUMENTS: &[&str] = &[
    "<p>dom to edit</p>",
    "<p>a<b>b</b>c</p><p>d</p>",
    "<ul><li>one</li><li>two<ul><li>three</li></ul></li></ul>",
    "<p>a<img src=\"x.png\">b</p>",
    "<table><tbody><tr><td>x</td><td></td></tr></tbody></table><p>y</p>",
    "<p></p><p>  spaced   text </p>",
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

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Forward), Just(Direction::Backward)]
}

proptest! {
    #[test]
    fn normalized_point_is_canonical_and_fixed(
        markup in select(DOCUMENTS),
        index in any::<Index>(),
        direction in direction(),
    ) {
        let tree = parse(markup).unwrap();
        let all = positions(&tree);
        let point = *index.get(&all);

        let once = normalize_point(&tree, &point, direction);
        prop_assert!(once.is_canonical(&tree));
        prop_assert_eq!(normalize_point(&tree, &once, direction), once);
        prop_assert_eq!(normalize_point(&tree, &once, direction.reverse()), once);
    }

    #[test]
    fn normalized_range_is_ordered_and_idempotent(
        markup in select(DOCUMENTS),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let tree = parse(markup).unwrap();
        let all = positions(&tree);
        let range = Range::new(*a.get(&all), *b.get(&all));

        let once = range.normalize(&tree);
        prop_assert_ne!(compare(&tree, &once.start, &once.end), Ordering::Greater);
        prop_assert_eq!(once.normalize(&tree), once);
    }

    #[test]
    fn compare_is_antisymmetric(
        markup in select(DOCUMENTS),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let tree = parse(markup).unwrap();
        let all = positions(&tree);
        let (a, b) = (a.get(&all), b.get(&all));
        prop_assert_eq!(compare(&tree, a, b), compare(&tree, b, a).reverse());
    }
}
