//! Selection protection across nested unbreakable structures

use arch_editor::{secure_area, secure_range, BoundaryPoint, Range};
use arch_tree::{parse, ArchTree, NodeId};

fn texts(tree: &ArchTree) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|id| tree.is_text(*id))
        .collect()
}

fn tables(tree: &ArchTree) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|id| tree.has_tag(*id, "table"))
        .collect()
}

const NESTED: &str = "<table><tbody><tr><td>x</td></tr></tbody></table>";

#[test]
fn test_widening_from_root_covers_outer_table() {
    let markup = format!("<p>ab</p><table><tbody><tr><td>{NESTED}</td></tr></tbody></table>");
    let tree = parse(&markup).unwrap();
    let ts = texts(&tree);
    let outer = tables(&tree)[0];

    let range = Range::new(BoundaryPoint::new(ts[0], 1), BoundaryPoint::new(ts[1], 1));
    let secured = secure_range(&tree, &range);
    assert_eq!(secured.start, BoundaryPoint::new(ts[0], 1));
    assert_eq!(secured.end, BoundaryPoint::after(&tree, outer).unwrap());
}

#[test]
fn test_widening_inside_cell_covers_inner_table() {
    let markup = format!("<table><tbody><tr><td><p>ab</p>{NESTED}</td></tr></tbody></table>");
    let tree = parse(&markup).unwrap();
    let ts = texts(&tree);
    let inner = tables(&tree)[1];

    let range = Range::new(BoundaryPoint::new(ts[0], 0), BoundaryPoint::new(ts[1], 1));
    let secured = secure_range(&tree, &range);
    assert_eq!(secured.start, BoundaryPoint::new(ts[0], 0));
    assert_eq!(secured.end, BoundaryPoint::after(&tree, inner).unwrap());
}

#[test]
fn test_leaving_inner_cell_is_clamped() {
    let markup = format!("<table><tbody><tr><td>{NESTED}<p>yz</p></td></tr></tbody></table>");
    let tree = parse(&markup).unwrap();
    let ts = texts(&tree);

    let range = Range::new(BoundaryPoint::new(ts[0], 0), BoundaryPoint::new(ts[1], 1));
    let secured = secure_range(&tree, &range);
    assert_eq!(secured, Range::new(BoundaryPoint::new(ts[0], 0), BoundaryPoint::new(ts[0], 1)));
}

#[test]
fn test_secured_range_is_stable() {
    let markup = format!("<p>ab</p><table><tbody><tr><td>{NESTED}</td></tr></tbody></table><p>cd</p>");
    let tree = parse(&markup).unwrap();
    let ts = texts(&tree);

    let range = Range::new(BoundaryPoint::new(ts[0], 1), BoundaryPoint::new(ts[1], 1));
    let once = secure_range(&tree, &range);
    assert_eq!(secure_range(&tree, &once), once);
}

#[test]
fn test_media_gets_shims_once() {
    let mut tree = parse("<p><img src=\"a.png\"></p>").unwrap();
    assert!(secure_area(&mut tree).unwrap() > 0);
    let marked = tree.serialize(tree.root(), true);
    assert_eq!(secure_area(&mut tree).unwrap(), 0);
    assert_eq!(tree.serialize(tree.root(), true), marked);
    assert_eq!(tree.to_markup(), "<p><img src=\"a.png\"></p>");
}
