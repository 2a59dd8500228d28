/// Round trips through parse and serialize
use crate::*;

#[test]
fn test_roundtrip_inline_formatting() {
    let tree = parse("<p>a<b>b</b>c</p>").unwrap();
    assert_eq!(tree.serialize(tree.root(), false), "<p>a<b>b</b>c</p>");
}

#[test]
fn test_roundtrip_documents() {
    let sources = vec![
        "<p>hello world</p>",
        "<h1>Title</h1><p>body</p>",
        "<ul><li>one</li><li>two</li></ul>",
        "<table><tbody><tr><td>a</td><td>b</td></tr></tbody></table>",
        "<p>a<br>b</p>",
        r#"<p><a href="/x" target="_blank">link</a></p>"#,
        "<p><img src=\"x.png\"></p>",
        "<pre>  keep   this  </pre>",
    ];

    for source in sources {
        let tree = parse(source).unwrap_or_else(|e| panic!("Failed to parse {}: {}", source, e));
        assert_eq!(tree.to_markup(), source);
    }
}

#[test]
fn test_layout_nodes_are_stripped_by_default() {
    let tree = parse("<p>a</p><p>b</p>").unwrap();
    assert_eq!(tree.to_markup(), "<p>a</p><p>b</p>");
    assert_eq!(
        tree.serialize(tree.root(), true),
        "\n<p>a</p>\n<p>b</p>\n"
    );
}

#[test]
fn test_keep_virtual_output_reparses_to_same_shape() {
    let tree = parse("<p>\u{FEFF}</p><div><p>x</p></div>").unwrap();
    let kept = tree.serialize(tree.root(), true);
    let reparsed = parse(&kept).unwrap();
    assert_eq!(reparsed.serialize(reparsed.root(), true), kept);
    assert_eq!(reparsed.descendants(reparsed.root()).len(), tree.descendants(tree.root()).len());
}

#[test]
fn test_void_tags_have_no_closing_tag() {
    let tree = parse("<p>x<br/>y<hr></p>").unwrap();
    let markup = tree.to_markup();
    assert!(markup.contains("<br>"));
    assert!(!markup.contains("</br>"));
    assert!(!markup.contains("</hr>"));
}

#[test]
fn test_escaping() {
    let tree = parse("<p title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2 &amp;&nbsp;3</p>").unwrap();
    assert_eq!(
        tree.to_markup(),
        "<p title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2 &amp;&nbsp;3</p>"
    );
}

#[test]
fn test_bare_attribute() {
    let tree = parse("<p><input disabled></p>").unwrap();
    assert_eq!(tree.to_markup(), "<p><input disabled></p>");
}

#[test]
fn test_whitespace_between_blocks_is_dropped() {
    let tree = parse("<p>a</p>\n   <p> b  c </p>\n").unwrap();
    assert_eq!(tree.to_markup(), "<p>a</p><p>b c</p>");
}

#[test]
fn test_structure_rules_apply_on_parse() {
    let tree = parse("loose <li>item</li><td>cell</td>").unwrap();
    assert_eq!(
        tree.to_markup(),
        "<p>loose</p><ul><li>item</li></ul><table><tbody><tr><td>cell</td></tr></tbody></table>"
    );
}
