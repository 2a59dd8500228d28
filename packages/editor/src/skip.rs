//! Skip predicates.
//!
//! A position is skippable when the user cannot perceive it as distinct from
//! a neighbouring one: blank text, the far side of a filler line break, the
//! interior of a void node, collapsible whitespace at a line edge, or an
//! element position that only leads into one of those.
//!
//! Every rule is a pure function of the tree, the point and an explicit
//! [`SkipOptions`]; [`is_skippable`] ORs the enabled ones.

use crate::boundary::{BoundaryPoint, Direction, Side};
use arch_tree::{ArchTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipOptions {
    pub direction: Direction,
    pub blank_text: bool,
    pub void_interior: bool,
    pub whitespace: bool,
    pub reduce: bool,
    pub edge_sibling: bool,
}

impl Default for SkipOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Forward,
            blank_text: true,
            void_interior: true,
            whitespace: true,
            reduce: true,
            edge_sibling: true,
        }
    }
}

impl SkipOptions {
    pub fn towards(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

/// On a blank Text node or an ArchitecturalSpace.
pub fn on_blank_text(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    tree.is_architectural_space(point.node)
        || (tree.is_text(point.node) && tree.is_blank(point.node))
}

/// Right after a line break that only exists to keep its block open.
pub fn after_filler_br(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    point
        .node_before(tree)
        .is_some_and(|before| tree.is_filler_br(before))
}

pub fn in_void_interior(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    tree.is_void(point.node)
}

fn is_breakable_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Inside a run of breakable whitespace that renders nothing because it
/// touches a line edge. Forward skips the leading run of a line, Backward the
/// trailing one.
pub fn in_edge_whitespace(tree: &ArchTree, point: &BoundaryPoint, direction: Direction) -> bool {
    let Some(value) = tree.text(point.node) else {
        return false;
    };
    if tree.is_preformatted(point.node) {
        return false;
    }
    let Some(block) = tree.closest_block(point.node) else {
        return false;
    };
    let chars: Vec<char> = value.chars().collect();
    match direction {
        Direction::Forward => {
            let run = chars.iter().take_while(|c| is_breakable_space(**c)).count();
            run > 0
                && point.offset < run
                && BoundaryPoint::start_of(point.node).is_edge_of(tree, block, Side::Left)
        }
        Direction::Backward => {
            let run = chars
                .iter()
                .rev()
                .take_while(|c| is_breakable_space(**c))
                .count();
            run > 0
                && point.offset > chars.len() - run
                && BoundaryPoint::end_of(tree, point.node).is_edge_of(tree, block, Side::Right)
        }
    }
}

/// An element position whose entered equivalent is itself skippable.
pub fn reduces_to_skippable(tree: &ArchTree, point: &BoundaryPoint, options: &SkipOptions) -> bool {
    if tree.is_text_like(point.node) {
        return false;
    }
    let entered = point.enter(tree);
    entered != *point && is_skippable(tree, &entered, options)
}

fn is_visible_text(tree: &ArchTree, id: NodeId) -> bool {
    tree.is_text(id) && !tree.is_blank(id)
}

/// A Virtual node sitting next to visible text adds no position of its own.
pub fn virtual_beside_text(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    if !tree.is_virtual(point.node) {
        return false;
    }
    let prev = tree.prev_sibling(point.node);
    let next = tree.next_sibling(point.node);
    prev.is_some_and(|id| is_visible_text(tree, id)) || next.is_some_and(|id| is_visible_text(tree, id))
}

pub fn is_skippable(tree: &ArchTree, point: &BoundaryPoint, options: &SkipOptions) -> bool {
    (options.blank_text && (on_blank_text(tree, point) || after_filler_br(tree, point)))
        || (options.void_interior && in_void_interior(tree, point))
        || (options.whitespace && in_edge_whitespace(tree, point, options.direction))
        || (options.reduce && reduces_to_skippable(tree, point, options))
        || (options.edge_sibling && virtual_beside_text(tree, point))
}

/// A Virtual that keeps a blank block or a media neighbourhood addressable.
pub fn is_shim(tree: &ArchTree, id: NodeId) -> bool {
    if !tree.is_virtual(id) {
        return false;
    }
    let beside_media = tree.prev_sibling(id).is_some_and(|n| tree.is_media(n))
        || tree.next_sibling(id).is_some_and(|n| tree.is_media(n));
    let fills_parent = tree.parent(id).is_some_and(|parent| tree.is_blank(parent));
    beside_media || fills_parent
}

fn is_perceived(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    let node = point.node;
    if !point.is_valid(tree) || tree.is_container_root(node) || tree.is_void(node) {
        return false;
    }
    if tree.is_architectural_space(node) {
        return false;
    }
    if tree.is_virtual(node) {
        return is_shim(tree, node);
    }
    if tree.is_text(node) {
        return !tree.is_blank(node);
    }
    if point.node_after(tree).is_some_and(|child| tree.is_void(child)) {
        return true;
    }
    if point.node_before(tree).is_some_and(|child| tree.is_media(child)) {
        return true;
    }
    point.offset == 0 && tree.is_block_element(node) && tree.is_blank(node)
}

/// A position the user perceives and the cursor may rest on.
pub fn is_canonical(tree: &ArchTree, point: &BoundaryPoint) -> bool {
    is_perceived(tree, point)
        && !is_skippable(tree, point, &SkipOptions::towards(Direction::Forward))
        && !is_skippable(tree, point, &SkipOptions::towards(Direction::Backward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_tree::{parse, Attributes};

    fn first_text(tree: &ArchTree) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find(|id| tree.is_text(*id))
            .unwrap()
    }

    #[test]
    fn test_layout_space_is_skippable() {
        let tree = parse("<p>a</p><p>b</p>").unwrap();
        let space = tree.first_child(tree.root()).unwrap();
        assert!(tree.is_architectural_space(space));
        let point = BoundaryPoint::start_of(space);
        assert!(is_skippable(&tree, &point, &SkipOptions::default()));
        assert!(!is_canonical(&tree, &point));
    }

    #[test]
    fn test_filler_br_positions() {
        let tree = parse("<p></p>").unwrap();
        let p = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.has_tag(*id, "p"))
            .unwrap();
        assert!(tree.is_filler_br(tree.first_child(p).unwrap()));
        assert!(is_canonical(&tree, &BoundaryPoint::new(p, 0)));
        assert!(!is_canonical(&tree, &BoundaryPoint::new(p, 1)));
        assert!(after_filler_br(&tree, &BoundaryPoint::new(p, 1)));
    }

    #[test]
    fn test_text_positions_are_canonical() {
        let tree = parse("<p>ab</p>").unwrap();
        let t = first_text(&tree);
        for offset in 0..=2 {
            assert!(is_canonical(&tree, &BoundaryPoint::new(t, offset)));
        }
        let p = tree.parent(t).unwrap();
        assert!(!is_canonical(&tree, &BoundaryPoint::new(p, 0)));
    }

    #[test]
    fn test_edge_whitespace_is_direction_dependent() {
        let mut tree = parse("<p>x</p>").unwrap();
        let t = first_text(&tree);
        tree.set_text(t, "  ab  ").unwrap();

        let forward = Direction::Forward;
        let backward = Direction::Backward;
        assert!(in_edge_whitespace(&tree, &BoundaryPoint::new(t, 0), forward));
        assert!(in_edge_whitespace(&tree, &BoundaryPoint::new(t, 1), forward));
        assert!(!in_edge_whitespace(&tree, &BoundaryPoint::new(t, 2), forward));
        assert!(!in_edge_whitespace(&tree, &BoundaryPoint::new(t, 0), backward));
        assert!(in_edge_whitespace(&tree, &BoundaryPoint::new(t, 6), backward));
        assert!(!in_edge_whitespace(&tree, &BoundaryPoint::new(t, 4), backward));
    }

    #[test]
    fn test_media_neighbourhood() {
        let mut tree = parse("<p><img src=\"a.png\"></p>").unwrap();
        let p = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.has_tag(*id, "p"))
            .unwrap();
        assert!(is_canonical(&tree, &BoundaryPoint::new(p, 0)));
        assert!(is_canonical(&tree, &BoundaryPoint::new(p, 1)));

        let img = tree.first_child(p).unwrap();
        assert!(!is_canonical(&tree, &BoundaryPoint::start_of(img)));

        let shim = tree.create_virtual();
        tree.insert_after(shim, img).unwrap();
        assert!(is_shim(&tree, shim));
        assert!(is_canonical(&tree, &BoundaryPoint::start_of(shim)));
    }

    #[test]
    fn test_virtual_beside_text_is_skipped() {
        let mut tree = parse("<p>ab</p>").unwrap();
        let t = first_text(&tree);
        let v = tree.create_virtual();
        tree.insert_before(v, t).unwrap();
        assert!(virtual_beside_text(&tree, &BoundaryPoint::start_of(v)));
        assert!(!is_canonical(&tree, &BoundaryPoint::start_of(v)));

        let span = tree.create_element("span", Attributes::new());
        tree.append(tree.parent(t).unwrap(), span).unwrap();
        let options = SkipOptions {
            reduce: false,
            ..SkipOptions::default()
        };
        assert!(!is_skippable(&tree, &BoundaryPoint::start_of(span), &options));
    }
}
