use arch_tree::parse;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_document(paragraphs: usize) -> String {
    let mut markup = String::from("<h1>Release notes</h1>");
    for i in 0..paragraphs {
        markup.push_str(&format!(
            "<p>Paragraph {} with <b>bold</b>, <i>italic</i> and a <a href=\"/x\">link</a>.</p>",
            i
        ));
    }
    markup.push_str("<ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul>");
    markup.push_str("<table><tbody><tr><td>a</td><td>b</td></tr></tbody></table>");
    markup
}

fn parse_small_document(c: &mut Criterion) {
    let source = sample_document(5);
    c.bench_function("parse_small_document", |b| {
        b.iter(|| parse(black_box(&source)))
    });
}

fn parse_large_document(c: &mut Criterion) {
    let source = sample_document(500);
    c.bench_function("parse_large_document", |b| {
        b.iter(|| parse(black_box(&source)))
    });
}

fn serialize_large_document(c: &mut Criterion) {
    let source = sample_document(500);
    let tree = match parse(&source) {
        Ok(tree) => tree,
        Err(err) => panic!("sample document failed to parse: {}", err),
    };
    c.bench_function("serialize_large_document", |b| {
        b.iter(|| tree.serialize(black_box(tree.root()), false))
    });
}

criterion_group!(
    benches,
    parse_small_document,
    parse_large_document,
    serialize_large_document
);
criterion_main!(benches);
