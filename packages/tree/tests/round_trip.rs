use arch_tree::{parse, ArchConfig, ArchTree};
use proptest::collection::vec;
use proptest::prelude::*;

fn text() -> impl Strategy<Value = String> {
    "[a-z ]{1,8}"
}

fn inline() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        4 => text(),
        1 => Just("<br>".to_string()),
        1 => Just("<img src=\"x.png\">".to_string()),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        (prop_oneof![Just("b"), Just("i"), Just("span")], vec(inner, 0..3))
            .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat()))
    })
}

fn block() -> impl Strategy<Value = String> {
    prop_oneof![
        (prop_oneof![Just("p"), Just("h1"), Just("blockquote")], vec(inline(), 0..4))
            .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat())),
        vec(vec(inline(), 0..3), 1..4).prop_map(|items| {
            let items: String = items
                .into_iter()
                .map(|item| format!("<li>{}</li>", item.concat()))
                .collect();
            format!("<ul>{}</ul>", items)
        }),
        vec(inline(), 1..3).prop_map(|cells| {
            let cells: String = cells
                .into_iter()
                .map(|cell| format!("<td>{}</td>", cell))
                .collect();
            format!("<table><tbody><tr>{}</tr></tbody></table>", cells)
        }),
    ]
}

fn document() -> impl Strategy<Value = String> {
    vec(prop_oneof![3 => block(), 1 => inline()], 0..5).prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]
    #[test]
    fn test_serialize_parse_is_idempotent(markup in document()) {
        let first = parse(&markup).unwrap();
        let once = first.to_markup();
        let second = parse(&once).unwrap();
        prop_assert_eq!(second.to_markup(), once);
    }

    #[test]
    fn test_keep_virtual_round_trip_is_stable(markup in document()) {
        let first = parse(&markup).unwrap();
        let kept = first.serialize(first.root(), true);
        let second = parse(&kept).unwrap();
        prop_assert_eq!(second.serialize(second.root(), true), kept);
    }
}

#[test]
fn test_failed_load_keeps_previous_document() {
    let mut tree = ArchTree::from_markup(ArchConfig::default(), "<p>first</p>").unwrap();
    let before = tree.to_markup();

    assert!(tree.load("<p>broken</span>").is_err());
    assert!(tree.load("<p>a < b</p>").is_err());
    assert!(tree.load("<!-- never closed").is_err());
    assert_eq!(tree.to_markup(), before);

    tree.load("<p>second</p>").unwrap();
    assert_eq!(tree.to_markup(), "<p>second</p>");
}

#[test]
fn test_custom_configuration_changes_classification() {
    let config = ArchConfig::from_json(r#"{ "paragraphTag": "div" }"#).unwrap();
    let tree = ArchTree::from_markup(config, "loose text").unwrap();
    assert_eq!(tree.to_markup(), "<div>loose text</div>");
}
