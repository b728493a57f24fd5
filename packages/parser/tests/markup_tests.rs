//! Markup an editable surface produces, parsed and written back

use scribe_parser::{parse, parse_with_root, serialize, serialize_children, tokenize, ParseError, Token};

fn roundtrip(source: &str) -> String {
    let doc = parse(source).unwrap();
    serialize_children(&doc, doc.root())
}

#[test]
fn test_contenteditable_lines() {
    let source = "<div>line one</div><div>line two<br></div><div><br></div>";
    assert_eq!(roundtrip(source), source);
}

#[test]
fn test_comments_and_doctype_dropped() {
    assert_eq!(roundtrip("<!DOCTYPE html><!-- note --><p>x</p>"), "<p>x</p>");
}

#[test]
fn test_lone_angle_bracket_is_text() {
    let doc = parse("1 < 2").unwrap();
    assert_eq!(doc.text_content(doc.root()), "1 < 2");
    assert_eq!(doc.children(doc.root()).len(), 1);
    assert_eq!(serialize_children(&doc, doc.root()), "1 &lt; 2");
}

#[test]
fn test_unterminated_tag() {
    assert!(matches!(parse("<p>ok<b"), Err(ParseError::UnterminatedTag { pos: 5 })));
}

#[test]
fn test_attribute_values_round_trip() {
    let source = r#"<a href="/q?a=1&amp;b=2" title="say &quot;hi&quot;">x</a>"#;
    let doc = parse(source).unwrap();
    let link = doc.children(doc.root())[0];

    assert_eq!(doc.element(link).unwrap().attr("href"), Some("/q?a=1&b=2"));
    assert_eq!(serialize_children(&doc, doc.root()), source);
}

#[test]
fn test_character_references() {
    let doc = parse("&#65;&#x42;&nbsp;&bogus; &amp").unwrap();
    assert_eq!(doc.text_content(doc.root()), "AB\u{a0}&bogus; &amp");
}

#[test]
fn test_uppercase_tags_are_lowercased() {
    assert_eq!(roundtrip("<P>Hi <B>there</B></P>"), "<p>Hi <b>there</b></p>");
}

#[test]
fn test_outer_serialization_includes_root() {
    let doc = parse_with_root("<em>x</em>", "article").unwrap();
    assert_eq!(serialize(&doc, doc.root()), "<article><em>x</em></article>");
}

#[test]
fn test_tokens_carry_spans() {
    let tokens = tokenize("a<b>c</b>").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.token.clone()).collect();

    assert_eq!(
        kinds,
        vec![
            Token::Text("a"),
            Token::OpenTag("<b>"),
            Token::Text("c"),
            Token::CloseTag("</b>"),
        ]
    );
    assert_eq!(tokens[1].span, 1..4);
}
