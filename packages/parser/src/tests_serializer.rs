/// Serializer output and parse → serialize stability
use crate::*;

fn roundtrip(source: &str) -> String {
    let doc = parse(source).unwrap_or_else(|e| panic!("Failed to parse {}: {}", source, e));
    serialize_children(&doc, doc.root())
}

#[test]
fn test_roundtrip_inline_formatting() {
    let sources = vec![
        "Hello <strong>World</strong>",
        "<p>a <em>b</em> <u>c</u> <s>d</s></p>",
        "<ul><li>one</li><li>two</li></ul>",
        "<a href=\"https://example.com\">link</a>",
        "<table><tbody><tr><td>1</td><td>2</td></tr></tbody></table>",
    ];

    for source in sources {
        assert_eq!(roundtrip(source), source);
    }
}

#[test]
fn test_void_elements_have_no_close_tag() {
    assert_eq!(roundtrip("a<br/>b"), "a<br>b");
    assert_eq!(
        roundtrip("<img src=\"cat.png\" alt=\"cat\">"),
        "<img alt=\"cat\" src=\"cat.png\">"
    );
}

#[test]
fn test_styles_serialized_after_attributes() {
    assert_eq!(
        roundtrip("<span style=\"font-size: 18px\" class=\"x\">big</span>"),
        "<span class=\"x\" style=\"font-size: 18px\">big</span>"
    );
}

#[test]
fn test_text_is_escaped() {
    let mut doc = scribe_dom::Document::new("div");
    let root = doc.root();
    let text = doc.create_text("a < b & c > d");
    doc.append_child(root, text).unwrap();

    let html = serialize_children(&doc, root);
    assert_eq!(html, "a &lt; b &amp; c &gt; d");

    let reparsed = parse(&html).unwrap();
    assert_eq!(reparsed.text_content(reparsed.root()), "a < b & c > d");
}

#[test]
fn test_attribute_quotes_escaped() {
    let source = "<a title=\"say &quot;hi&quot;\">x</a>";
    assert_eq!(roundtrip(source), source);
}

#[test]
fn test_serialize_includes_root_tag() {
    let doc = parse("x").unwrap();
    assert_eq!(serialize(&doc, doc.root()), "<div>x</div>");
}
