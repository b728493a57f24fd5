//! Integration tests for the formatting engine
//!
//! Covers the engine's observable guarantees end to end:
//! - toggle pairs round-trip the tree
//! - partial formatting resolves toward applying
//! - splits keep sibling order and leave neighbours alone
//! - selections survive capture/restore

use scribe_dom::Document;
use scribe_editor::{
    capture, restore, toggle_format, units_in_selection, Command, Editor, EditorConfig, FormatTag,
    InlineFormat, LiveSelection, ManualClock, MemorySelection, Outcome, Point, Selection,
    SelectionProvider, Toggle,
};
use scribe_parser::{parse, serialize_children};

fn html(doc: &Document) -> String {
    serialize_children(doc, doc.root())
}

fn wrapper_count(doc: &Document) -> usize {
    doc.descendants(doc.root())
        .filter(|n| {
            doc.tag(*n)
                .is_some_and(|tag| FormatTag::ALL.iter().any(|f| f.matches(tag)) || tag == "span")
        })
        .count()
}

fn editor(markup: &str) -> Editor {
    let mut editor = Editor::new(EditorConfig::default(), MemorySelection::new(), ManualClock::new());
    editor.load(markup).unwrap();
    editor
}

#[test]
fn test_toggle_pair_round_trips_every_format() {
    let formats = [
        InlineFormat::bold(),
        InlineFormat::italic(),
        InlineFormat::underline(),
        InlineFormat::strikethrough(),
        InlineFormat::font_size("20px"),
        InlineFormat::font_family("Georgia"),
        InlineFormat::color("#333"),
        InlineFormat::highlight("yellow"),
    ];
    let source = "<p>The quick brown fox</p><p>jumps over</p>";

    for format in &formats {
        for (start, end) in [(0, 3), (4, 9), (2, 22), (10, 19)] {
            let mut doc = parse(source).unwrap();
            let root = doc.root();
            let selection = Selection::new(start, end);

            let first = toggle_format(&mut doc, root, selection, format).unwrap();
            assert_eq!(first.toggle, Toggle::Applied, "{:?} {}..{}", format, start, end);
            assert!(wrapper_count(&doc) > 0);

            let second = toggle_format(&mut doc, root, selection, format).unwrap();
            assert_eq!(second.toggle, Toggle::Removed, "{:?} {}..{}", format, start, end);
            assert_eq!(html(&doc), source);
            assert_eq!(wrapper_count(&doc), 0);
        }
    }
}

#[test]
fn test_partial_bold_becomes_fully_bold() {
    let mut doc = parse("<strong>A</strong>B").unwrap();
    let root = doc.root();

    let outcome = toggle_format(&mut doc, root, Selection::new(0, 2), &InlineFormat::bold()).unwrap();

    assert_eq!(outcome.toggle, Toggle::Applied);
    for unit in units_in_selection(&doc, root, Selection::new(0, 2)) {
        let parent = doc.parent(unit.node).unwrap();
        assert_eq!(doc.tag(parent), Some("strong"));
    }
}

#[test]
fn test_split_middle_of_five_chars() {
    let mut doc = parse("abcde").unwrap();
    let root = doc.root();
    toggle_format(&mut doc, root, Selection::new(2, 4), &InlineFormat::bold()).unwrap();

    let lengths: Vec<usize> = doc
        .children(root)
        .iter()
        .map(|child| doc.text_content(*child).chars().count())
        .collect();
    assert_eq!(lengths, vec![2, 2, 1]);

    let children = doc.children(root);
    assert!(doc.is_text(children[0]));
    assert_eq!(doc.tag(children[1]), Some("strong"));
    assert!(doc.is_text(children[2]));
}

#[test]
fn test_neighbouring_units_never_mutated() {
    let mut doc = parse("<em>before</em><span>target</span><em>after</em>").unwrap();
    let root = doc.root();
    let before_first = html(&doc);

    toggle_format(&mut doc, root, Selection::new(6, 12), &InlineFormat::underline()).unwrap();

    let markup = html(&doc);
    assert!(markup.starts_with("<em>before</em>"));
    assert!(markup.ends_with("<em>after</em>"));
    assert_ne!(markup, before_first);
}

#[test]
fn test_selection_round_trip() {
    let doc = parse("<p>one <b>two</b></p><p>three</p>").unwrap();
    let root = doc.root();
    let texts: Vec<_> = doc.text_nodes(root).collect();

    let cases = [
        LiveSelection::new(Point::new(texts[0], 1), Point::new(texts[2], 3)),
        LiveSelection::new(Point::new(texts[1], 0), Point::new(texts[1], 3)),
        LiveSelection::caret(Point::new(texts[2], 2)),
    ];
    for live in cases {
        let mut provider = MemorySelection::new();
        provider.set_current(Some(live));

        let captured = capture(&doc, root, &provider).unwrap();
        provider.set_current(None);
        assert!(restore(&doc, root, &mut provider, captured));
        assert_eq!(provider.current(), Some(live));
    }
}

#[test]
fn test_hello_world_scenario() {
    let mut editor = editor("Hello World");

    editor.select(6, 11);
    assert_eq!(editor.execute(&Command::new("bold")).unwrap(), Outcome::Applied);
    assert_eq!(editor.html(), "Hello <strong>World</strong>");

    editor.select(6, 11);
    assert_eq!(editor.execute(&Command::new("bold")).unwrap(), Outcome::Removed);
    assert_eq!(editor.html(), "Hello World");
    assert_eq!(editor.document().children(editor.root()).len(), 1);
    assert_eq!(editor.text(), "Hello World");
}

#[test]
fn test_caret_list_scenario() {
    let mut editor = editor("Hello");
    editor.select(5, 5);

    assert_eq!(editor.execute(&Command::new("bullet-list")).unwrap(), Outcome::Inserted);
    assert_eq!(editor.html(), "Hello<ul><li></li></ul>");
    assert_eq!(editor.text(), "Hello");
}

#[test]
fn test_query_reports_without_mutating() {
    let mut editor = editor("<b>bold</b> plain");
    editor.select(0, 4);
    let before = editor.html();

    assert!(editor.query(&InlineFormat::bold()));
    assert!(!editor.query(&InlineFormat::italic()));
    assert!(editor.active_formats().bold);

    editor.select(0, 6);
    assert!(!editor.query(&InlineFormat::bold()));
    assert_eq!(editor.html(), before);
}

#[test]
fn test_heading_and_alignment_commands() {
    let mut editor = editor("<p>Title</p><p>Body text</p>");

    editor.select(1, 3);
    assert_eq!(
        editor.execute(&Command::with_value("heading", "1")).unwrap(),
        Outcome::Applied
    );
    assert_eq!(editor.execute(&Command::new("align-center")).unwrap(), Outcome::Aligned);
    assert_eq!(
        editor.html(),
        "<h1 style=\"text-align: center\">Title</h1><p>Body text</p>"
    );

    assert!(editor.execute(&Command::with_value("heading", "9")).is_err());
}

#[test]
fn test_link_and_unlink_commands() -> anyhow::Result<()> {
    let mut editor = editor("Read the docs today");

    editor.select(9, 13);
    let outcome = editor.execute(&Command::with_value("link", "https://docs.example.com"))?;
    assert_eq!(outcome, Outcome::Inserted);
    assert_eq!(
        editor.html(),
        "Read the <a href=\"https://docs.example.com\">docs</a> today"
    );

    editor.select(9, 13);
    assert_eq!(editor.execute(&Command::new("unlink"))?, Outcome::Removed);
    assert_eq!(editor.html(), "Read the docs today");
    Ok(())
}

#[test]
fn test_table_and_image_commands() {
    let mut editor = editor("<p>x</p>");

    editor.select(1, 1);
    assert_eq!(
        editor.execute(&Command::with_value("table", "1x2")).unwrap(),
        Outcome::Inserted
    );
    assert_eq!(
        editor.html(),
        "<p>x<table><tbody><tr><td></td><td></td></tr></tbody></table></p>"
    );

    editor.select(0, 1);
    assert_eq!(
        editor.execute(&Command::with_value("image", "/logo.png")).unwrap(),
        Outcome::Inserted
    );
    assert!(editor.html().starts_with("<p><img src=\"/logo.png\">"));
}
