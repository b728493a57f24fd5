//! Tree integrity tests
//!
//! This tests:
//! - Parent/child links stay consistent across surgery chains
//! - Point ordering across nesting levels
//! - Transactions restoring the exact prior tree

use scribe_dom::{Document, DomError, DomResult, ElementData, NodeId, Point};
use std::cmp::Ordering;

/// Every attached node's parent lists it exactly once
fn assert_consistent(doc: &Document) {
    for node in doc.descendants(doc.root()) {
        for child in doc.children(node) {
            assert_eq!(doc.parent(*child), Some(node), "child {} of {}", child, node);
            let occurrences = doc.children(node).iter().filter(|c| *c == child).count();
            assert_eq!(occurrences, 1);
        }
    }
    assert_eq!(doc.parent(doc.root()), None);
}

fn paragraph(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
    let root = doc.root();
    let p = doc.create_element(ElementData::new("p"));
    let t = doc.create_text(text);
    doc.append_child(root, p).unwrap();
    doc.append_child(p, t).unwrap();
    (p, t)
}

#[test]
fn test_split_wrap_unwrap_chain_keeps_tree_valid() {
    let mut doc = Document::new("div");
    let (p, text) = paragraph(&mut doc, "abcdef");

    let tail = doc.split_text(text, 4).unwrap();
    let middle = doc.split_text(text, 2).unwrap();
    assert_eq!(doc.children(p), &[text, middle, tail]);

    let strong = doc.create_element(ElementData::new("strong"));
    doc.wrap(middle, strong).unwrap();
    let em = doc.create_element(ElementData::new("em"));
    doc.wrap(strong, em).unwrap();
    assert_consistent(&doc);
    assert_eq!(doc.depth(middle), 4);

    doc.unwrap(em).unwrap();
    doc.unwrap(strong).unwrap();
    doc.normalize(p).unwrap();

    assert_consistent(&doc);
    assert_eq!(doc.children(p), &[text]);
    assert_eq!(doc.text(text), Some("abcdef"));
    assert!(!doc.is_attached(strong));
    assert!(!doc.is_attached(tail));
}

#[test]
fn test_moving_a_node_between_parents() {
    let mut doc = Document::new("div");
    let (first, a) = paragraph(&mut doc, "a");
    let (second, b) = paragraph(&mut doc, "b");

    doc.append_child(second, a).unwrap();
    assert!(doc.children(first).is_empty());
    assert_eq!(doc.children(second), &[b, a]);

    doc.insert_child(second, 0, a).unwrap();
    assert_eq!(doc.children(second), &[a, b]);
    assert_consistent(&doc);
}

#[test]
fn test_point_order_across_nesting() {
    let mut doc = Document::new("div");
    let root = doc.root();
    let (p1, t1) = paragraph(&mut doc, "one");
    let (_, t2) = paragraph(&mut doc, "two");

    let ordered = [
        Point::new(root, 0),
        Point::new(p1, 0),
        Point::new(t1, 0),
        Point::new(t1, 3),
        Point::new(p1, 1),
        Point::new(root, 1),
        Point::new(t2, 0),
        Point::new(root, 2),
    ];
    for pair in ordered.windows(2) {
        assert_eq!(doc.compare_points(pair[0], pair[1]), Ordering::Less, "{:?}", pair);
        assert_eq!(doc.compare_points(pair[1], pair[0]), Ordering::Greater);
    }
    assert_eq!(doc.compare_points(ordered[3], ordered[3]), Ordering::Equal);
}

#[test]
fn test_failed_transaction_restores_everything() {
    let mut doc = Document::new("div");
    let (p, text) = paragraph(&mut doc, "Hello World");
    let before = doc.clone();

    let result: DomResult<()> = doc.transaction(|doc| {
        let tail = doc.split_text(text, 6)?;
        let strong = doc.create_element(ElementData::new("strong"));
        doc.wrap(tail, strong)?;
        doc.unwrap(doc.root())?;
        Ok(())
    });

    assert_eq!(result, Err(DomError::RootImmutable));
    assert_eq!(doc, before);
    assert_eq!(doc.children(p), &[text]);
}

#[test]
fn test_text_offsets_are_characters() {
    let mut doc = Document::new("div");
    let (_, text) = paragraph(&mut doc, "naïve café");
    assert_eq!(doc.text_len(text), 10);

    let tail = doc.split_text(text, 6).unwrap();
    assert_eq!(doc.text(text), Some("naïve "));
    assert_eq!(doc.text(tail), Some("café"));
}

#[test]
fn test_compact_drops_detached_slots() {
    let mut doc = Document::new("div");
    let (p, text) = paragraph(&mut doc, "Hello World");
    for _ in 0..10 {
        let tail = doc.split_text(text, 6).unwrap();
        let strong = doc.create_element(ElementData::new("strong"));
        doc.wrap(tail, strong).unwrap();
        doc.unwrap(strong).unwrap();
        doc.normalize(p).unwrap();
    }
    let orphan = doc.create_text("orphan");
    assert!(!doc.is_attached(orphan));
    assert_eq!(doc.slot_count(), 24);

    doc.compact();

    assert_eq!(doc.slot_count(), 3);
    assert_eq!(doc.root().to_string(), "#0");
    let p = doc.children(doc.root())[0];
    assert_eq!(doc.tag(p), Some("p"));
    assert_eq!(doc.text(doc.children(p)[0]), Some("Hello World"));
    assert_consistent(&doc);
}
