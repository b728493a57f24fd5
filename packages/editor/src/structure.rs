//! # Structural Insertion Ops
//!
//! Lists, links, images and tables. Each either replaces the selected
//! content or, for a caret, goes in at the caret. Addresses and table sizes
//! are validated before anything is touched, and all tree edits of one call
//! run in a single transaction.
//!
//! Replacing works insert-then-delete: the new node is placed before the
//! first selected character, then the old content (now shifted past the
//! node's own text) is cut out. Elements emptied by the cut are pruned. A
//! caret inserts after the text it ends. A list or table left as the only
//! child of a paragraph or heading takes that block's place.

use crate::block::BlockRole;
use crate::errors::{StructureError, StructureResult};
use crate::range::units_in_selection;
use crate::selection::{offset_of_point, point_at_offset, text_spans, Bias, Selection};
use scribe_dom::text::{char_len, slice_chars};
use scribe_dom::{Document, DomError, ElementData, NodeId, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Which link and image addresses are accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPolicy {
    allowed_schemes: Vec<String>,
}

impl AddressPolicy {
    pub fn new(allowed_schemes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_schemes: allowed_schemes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Link targets: absolute URLs with an allowed scheme, root-relative
    /// paths and fragments
    pub fn validate_link<'a>(&self, address: &'a str) -> StructureResult<&'a str> {
        let address = non_empty(address)?;
        if is_root_relative(address) || address.starts_with('#') {
            return Ok(address);
        }
        self.validate_absolute(address)
    }

    /// Image sources: absolute URLs with an allowed scheme, root-relative
    /// paths and inline `data:image/` payloads
    pub fn validate_image<'a>(&self, address: &'a str) -> StructureResult<&'a str> {
        let address = non_empty(address)?;
        if is_root_relative(address) || address.starts_with("data:image/") {
            return Ok(address);
        }
        self.validate_absolute(address)
    }

    fn validate_absolute<'a>(&self, address: &'a str) -> StructureResult<&'a str> {
        let url = Url::parse(address).map_err(|err| {
            warn!(%address, %err, "rejected address");
            StructureError::InvalidAddress(address.to_string())
        })?;
        if !self.allowed_schemes.iter().any(|s| s == url.scheme()) {
            warn!(%address, scheme = url.scheme(), "rejected address scheme");
            return Err(StructureError::InvalidAddress(address.to_string()));
        }
        Ok(address)
    }
}

impl Default for AddressPolicy {
    fn default() -> Self {
        Self::new(["http", "https", "mailto"])
    }
}

fn non_empty(address: &str) -> StructureResult<&str> {
    let address = address.trim();
    if address.is_empty() {
        warn!("rejected empty address");
        return Err(StructureError::EmptyAddress);
    }
    Ok(address)
}

fn is_root_relative(address: &str) -> bool {
    address.starts_with('/') && !address.starts_with("//")
}

/// Flattened text covered by `selection`
pub fn selected_text(doc: &Document, root: NodeId, selection: Selection) -> String {
    slice_chars(&doc.text_content(root), selection.start, selection.end).to_string()
}

/// Nearest block-capable ancestor of `node` below `root`, or `root`
fn enclosing_block(doc: &Document, root: NodeId, node: NodeId) -> NodeId {
    doc.ancestors(node)
        .take_while(|a| *a != root)
        .find(|a| doc.tag(*a).and_then(BlockRole::of).is_some())
        .unwrap_or(root)
}

/// Selected text split into trimmed, non-empty lines. Newlines, `br`
/// elements and block boundaries all break lines.
pub fn selected_lines(doc: &Document, root: NodeId, selection: Selection) -> Vec<String> {
    let mut lines = vec![String::new()];
    let mut offset = 0;
    let mut last_block = None;

    for node in doc.descendants(root) {
        if doc.tag(node) == Some("br") {
            if selection.start < offset && offset < selection.end {
                lines.push(String::new());
            }
            continue;
        }
        let Some(content) = doc.text(node) else {
            continue;
        };
        let (start, end) = (offset, offset + char_len(content));
        offset = end;
        if end <= selection.start || start >= selection.end {
            continue;
        }

        let block = enclosing_block(doc, root, node);
        if last_block.is_some_and(|b| b != block) {
            lines.push(String::new());
        }
        last_block = Some(block);

        let piece = slice_chars(
            content,
            selection.start.max(start) - start,
            selection.end.min(end) - start,
        );
        for (i, part) in piece.split('\n').enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            if let Some(line) = lines.last_mut() {
                line.push_str(part);
            }
        }
    }

    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Detach `node`, then every ancestor left without children
fn prune(doc: &mut Document, root: NodeId, node: NodeId) -> StructureResult<()> {
    let mut current = doc.parent(node);
    doc.detach(node)?;
    while let Some(element) = current {
        if element == root || !doc.children(element).is_empty() {
            break;
        }
        current = doc.parent(element);
        doc.detach(element)?;
    }
    Ok(())
}

/// Remove the selected characters, plus void elements strictly inside the
/// selection. Text nodes and elements left empty are pruned.
pub fn delete_range(doc: &mut Document, root: NodeId, selection: Selection) -> StructureResult<()> {
    if selection.is_collapsed() {
        return Ok(());
    }

    let voids: Vec<NodeId> = doc
        .descendants(root)
        .filter(|n| doc.element(*n).is_some_and(|e| e.is_void()))
        .filter(|n| {
            let position = doc
                .parent(*n)
                .zip(doc.index_in_parent(*n))
                .and_then(|(parent, index)| offset_of_point(doc, root, Point::new(parent, index)));
            position.is_some_and(|at| selection.start < at && at < selection.end)
        })
        .collect();

    let mut emptied = Vec::new();
    for span in text_spans(doc, root) {
        if span.end <= selection.start || span.start >= selection.end {
            continue;
        }
        let content = doc.text(span.node).unwrap_or_default();
        let local_start = selection.start.max(span.start) - span.start;
        let local_end = selection.end.min(span.end) - span.start;
        let kept = format!(
            "{}{}",
            slice_chars(content, 0, local_start),
            slice_chars(content, local_end, char_len(content))
        );
        if kept.is_empty() {
            emptied.push(span.node);
        } else {
            doc.set_text(span.node, kept)?;
        }
    }

    for node in voids.into_iter().chain(emptied) {
        prune(doc, root, node)?;
    }
    Ok(())
}

/// Where replacing `selection` inserts: before the first selected
/// character, or after the text a caret ends
fn insertion_bias(selection: Selection) -> Bias {
    if selection.is_collapsed() {
        Bias::Backward
    } else {
        Bias::Forward
    }
}

/// Insert `node` at a flattened-text offset, splitting the text node there
/// if needed. Without any text the node is appended to `root`. Returns the
/// point right after the inserted node.
pub fn insert_at(
    doc: &mut Document,
    root: NodeId,
    offset: usize,
    bias: Bias,
    node: NodeId,
) -> StructureResult<Point> {
    let Some(point) = point_at_offset(doc, root, offset, bias) else {
        doc.append_child(root, node)?;
        return Ok(Point::new(root, doc.children(root).len()));
    };

    let text = point.node;
    let parent = doc.parent(text).ok_or(DomError::Detached(text))?;
    let index = doc.index_in_parent(text).ok_or(DomError::Detached(text))?;

    let at = if point.offset == 0 {
        index
    } else if point.offset >= doc.text_len(text) {
        index + 1
    } else {
        doc.split_text(text, point.offset)?;
        index + 1
    };
    doc.insert_child(parent, at, node)?;
    Ok(Point::new(parent, at + 1))
}

/// Replace the selection with typed text. Returns the caret offset after
/// the inserted text.
pub fn insert_text(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    text: &str,
) -> StructureResult<usize> {
    doc.transaction(|doc| -> StructureResult<usize> {
        match point_at_offset(doc, root, selection.start, insertion_bias(selection)) {
            Some(point) => {
                let content = doc.text(point.node).unwrap_or_default();
                let updated = format!(
                    "{}{}{}",
                    slice_chars(content, 0, point.offset),
                    text,
                    slice_chars(content, point.offset, char_len(content))
                );
                doc.set_text(point.node, updated)?;
            }
            None => {
                let node = doc.create_text(text);
                doc.append_child(root, node)?;
            }
        }
        let shift = char_len(text);
        delete_range(
            doc,
            root,
            Selection::new(selection.start + shift, selection.end + shift),
        )?;
        Ok(selection.start + shift)
    })
}

/// Put `node` in place of the selection (or at the caret)
fn replace_selection(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    node: NodeId,
) -> StructureResult<Point> {
    doc.transaction(|doc| -> StructureResult<Point> {
        insert_at(doc, root, selection.start, insertion_bias(selection), node)?;
        let shift = char_len(&doc.text_content(node));
        delete_range(
            doc,
            root,
            Selection::new(selection.start + shift, selection.end + shift),
        )?;
        hoist_block(doc, root, node)?;

        let parent = doc.parent(node).ok_or(DomError::Detached(node))?;
        let index = doc.index_in_parent(node).ok_or(DomError::Detached(node))?;
        Ok(Point::new(parent, index + 1))
    })
}

/// Lists and tables cannot live in a paragraph or heading. When one is the
/// block's only child it replaces the block.
fn hoist_block(doc: &mut Document, root: NodeId, node: NodeId) -> StructureResult<()> {
    if !matches!(doc.tag(node), Some("ul" | "ol" | "table")) {
        return Ok(());
    }
    let Some(parent) = doc.parent(node).filter(|p| *p != root) else {
        return Ok(());
    };
    let inline_block = matches!(
        doc.tag(parent).and_then(BlockRole::of),
        Some(BlockRole::Paragraph | BlockRole::Heading(_))
    );
    if inline_block && doc.children(parent) == [node] {
        debug!(block = %parent, "list or table replaces its block");
        doc.replace(parent, node)?;
    }
    Ok(())
}

fn element_with_text(doc: &mut Document, data: ElementData, text: &str) -> StructureResult<NodeId> {
    let element = doc.create_element(data);
    if !text.is_empty() {
        let child = doc.create_text(text);
        doc.append_child(element, child)?;
    }
    Ok(element)
}

/// Replace the selection with a list holding one item per selected line.
/// A caret gets a single empty item.
#[instrument(skip(doc), level = "debug")]
pub fn insert_list(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    kind: ListKind,
) -> StructureResult<Point> {
    let mut lines = if selection.is_collapsed() {
        Vec::new()
    } else {
        selected_lines(doc, root, selection)
    };
    if lines.is_empty() {
        lines.push(String::new());
    }

    let list = doc.create_element(ElementData::new(kind.tag()));
    for line in &lines {
        let item = element_with_text(doc, ElementData::new("li"), line)?;
        doc.append_child(list, item)?;
    }

    debug!(items = lines.len(), "inserting list");
    replace_selection(doc, root, selection, list)
}

/// Replace the selection with a link. The visible text is `text` when
/// given, else the selected text, else the address.
#[instrument(skip(doc, policy), level = "debug")]
pub fn insert_link(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    address: &str,
    text: Option<&str>,
    policy: &AddressPolicy,
) -> StructureResult<Point> {
    let address = policy.validate_link(address)?;

    let label = match text.filter(|t| !t.is_empty()) {
        Some(text) => text.to_string(),
        None if !selection.is_collapsed() => selected_text(doc, root, selection),
        None => address.to_string(),
    };

    let link = element_with_text(doc, ElementData::new("a").with_attr("href", address), &label)?;
    replace_selection(doc, root, selection, link)
}

/// Unwrap every link around the selected text. Returns whether any link
/// was removed.
#[instrument(skip(doc), level = "debug")]
pub fn remove_link(doc: &mut Document, root: NodeId, selection: Selection) -> StructureResult<bool> {
    if selection.is_collapsed() {
        return Ok(false);
    }

    let mut links = Vec::new();
    for unit in units_in_selection(doc, root, selection) {
        for ancestor in doc.ancestors(unit.node).take_while(|a| *a != root) {
            if doc.tag(ancestor) == Some("a") && !links.contains(&ancestor) {
                links.push(ancestor);
            }
        }
    }
    if links.is_empty() {
        return Ok(false);
    }

    doc.transaction(|doc| -> StructureResult<()> {
        let mut parents = BTreeSet::new();
        for link in &links {
            if let Some(parent) = doc.parent(*link) {
                parents.insert(parent);
            }
            doc.unwrap(*link)?;
        }
        for parent in parents {
            doc.normalize(parent)?;
        }
        Ok(())
    })?;

    debug!(links = links.len(), "removed links");
    Ok(true)
}

/// Replace the selection with an image
#[instrument(skip(doc, policy), level = "debug")]
pub fn insert_image(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    src: &str,
    alt: Option<&str>,
    policy: &AddressPolicy,
) -> StructureResult<Point> {
    let src = policy.validate_image(src)?;
    let mut data = ElementData::new("img").with_attr("src", src);
    if let Some(alt) = alt {
        data = data.with_attr("alt", alt);
    }
    let image = doc.create_element(data);
    replace_selection(doc, root, selection, image)
}

/// Replace the selection with an empty `rows` x `cols` table
#[instrument(skip(doc), level = "debug")]
pub fn insert_table(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    rows: usize,
    cols: usize,
    max: usize,
) -> StructureResult<Point> {
    let valid = |n: usize| (1..=max).contains(&n);
    if !valid(rows) || !valid(cols) {
        return Err(StructureError::InvalidTableSize { rows, cols, max });
    }

    let table = doc.create_element(ElementData::new("table"));
    let body = doc.create_element(ElementData::new("tbody"));
    doc.append_child(table, body)?;
    for _ in 0..rows {
        let row = doc.create_element(ElementData::new("tr"));
        doc.append_child(body, row)?;
        for _ in 0..cols {
            let cell = doc.create_element(ElementData::new("td"));
            doc.append_child(row, cell)?;
        }
    }

    replace_selection(doc, root, selection, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_parser::{parse, serialize_children};

    fn html(doc: &Document) -> String {
        serialize_children(doc, doc.root())
    }

    #[test]
    fn test_caret_list_keeps_text() {
        let mut doc = parse("Hello").unwrap();
        let root = doc.root();
        let caret = insert_list(&mut doc, root, Selection::collapsed(5), ListKind::Bullet).unwrap();

        assert_eq!(html(&doc), "Hello<ul><li></li></ul>");
        assert_eq!(doc.text_content(root), "Hello");
        assert_eq!(caret, Point::new(root, 2));
    }

    #[test]
    fn test_caret_list_inside_word_splits_text_only() {
        let mut doc = parse("Hello").unwrap();
        let root = doc.root();
        insert_list(&mut doc, root, Selection::collapsed(2), ListKind::Ordered).unwrap();
        assert_eq!(html(&doc), "He<ol><li></li></ol>llo");
    }

    #[test]
    fn test_list_from_selected_lines() {
        let mut doc = parse("<p>one</p><p>two</p><p>three</p>").unwrap();
        let root = doc.root();
        insert_list(&mut doc, root, Selection::new(0, 6), ListKind::Bullet).unwrap();
        assert_eq!(
            html(&doc),
            "<ul><li>one</li><li>two</li></ul><p>three</p>"
        );
    }

    #[test]
    fn test_list_over_second_paragraph_stays_there() {
        let mut doc = parse("<p>one</p><p>two</p>").unwrap();
        let root = doc.root();
        insert_list(&mut doc, root, Selection::new(3, 6), ListKind::Bullet).unwrap();
        assert_eq!(html(&doc), "<p>one</p><ul><li>two</li></ul>");
    }

    #[test]
    fn test_link_over_second_paragraph_stays_there() {
        let mut doc = parse("<p>one</p><p>two</p>").unwrap();
        let root = doc.root();
        let policy = AddressPolicy::default();
        insert_link(&mut doc, root, Selection::new(3, 6), "https://x.io", None, &policy).unwrap();
        assert_eq!(html(&doc), "<p>one</p><p><a href=\"https://x.io\">two</a></p>");
        assert_eq!(doc.text_content(root), "onetwo");
    }

    #[test]
    fn test_image_over_second_paragraph_stays_there() {
        let mut doc = parse("<p>one</p><p>two</p>").unwrap();
        let root = doc.root();
        let policy = AddressPolicy::default();
        insert_image(&mut doc, root, Selection::new(3, 6), "/a.png", None, &policy).unwrap();
        assert_eq!(html(&doc), "<p>one</p><p><img src=\"/a.png\"></p>");
    }

    #[test]
    fn test_caret_list_at_paragraph_end_keeps_text() {
        let mut doc = parse("<p>one</p><p>two</p>").unwrap();
        let root = doc.root();
        insert_list(&mut doc, root, Selection::collapsed(3), ListKind::Bullet).unwrap();
        assert_eq!(html(&doc), "<p>one<ul><li></li></ul></p><p>two</p>");
    }

    #[test]
    fn test_selected_lines_split_on_br_and_newline() {
        let doc = parse("a<br>b\n\nc").unwrap();
        let lines = selected_lines(&doc, doc.root(), Selection::new(0, 5));
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_link_replaces_selection() {
        let mut doc = parse("Hello <b>World</b>").unwrap();
        let root = doc.root();
        let policy = AddressPolicy::default();
        insert_link(&mut doc, root, Selection::new(6, 11), "https://example.com", None, &policy).unwrap();
        assert_eq!(html(&doc), "Hello <b><a href=\"https://example.com\">World</a></b>");
    }

    #[test]
    fn test_link_at_caret_uses_address_as_text() {
        let mut doc = parse("x").unwrap();
        let root = doc.root();
        let policy = AddressPolicy::default();
        insert_link(&mut doc, root, Selection::collapsed(1), "/docs", None, &policy).unwrap();
        assert_eq!(html(&doc), "x<a href=\"/docs\">/docs</a>");
    }

    #[test]
    fn test_rejected_addresses_leave_tree_alone() {
        let mut doc = parse("text").unwrap();
        let root = doc.root();
        let before = doc.clone();
        let policy = AddressPolicy::default();

        assert_eq!(
            insert_link(&mut doc, root, Selection::new(0, 4), "   ", None, &policy),
            Err(StructureError::EmptyAddress)
        );
        assert!(matches!(
            insert_link(&mut doc, root, Selection::new(0, 4), "javascript:alert(1)", None, &policy),
            Err(StructureError::InvalidAddress(_))
        ));
        assert!(matches!(
            insert_image(&mut doc, root, Selection::new(0, 4), "not a url", None, &policy),
            Err(StructureError::InvalidAddress(_))
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_image_policy() {
        let policy = AddressPolicy::default();
        assert!(policy.validate_image("data:image/png;base64,AAAA").is_ok());
        assert!(policy.validate_image("/img/a.png").is_ok());
        assert!(policy.validate_image("//cdn.example.com/a.png").is_err());
        assert!(policy.validate_link("#top").is_ok());
        assert!(policy.validate_link("mailto:a@example.com").is_ok());
    }

    #[test]
    fn test_remove_link() {
        let mut doc = parse("go <a href=\"/x\">here</a> now").unwrap();
        let root = doc.root();
        assert!(remove_link(&mut doc, root, Selection::new(4, 6)).unwrap());
        assert_eq!(html(&doc), "go here now");
        assert_eq!(doc.children(root).len(), 1);
        assert!(!remove_link(&mut doc, root, Selection::new(4, 6)).unwrap());
    }

    #[test]
    fn test_table_at_caret() {
        let mut doc = parse("ab").unwrap();
        let root = doc.root();
        insert_table(&mut doc, root, Selection::collapsed(2), 2, 1, 20).unwrap();
        assert_eq!(
            html(&doc),
            "ab<table><tbody><tr><td></td></tr><tr><td></td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_table_size_validated() {
        let mut doc = parse("ab").unwrap();
        let root = doc.root();
        assert_eq!(
            insert_table(&mut doc, root, Selection::collapsed(0), 0, 3, 20),
            Err(StructureError::InvalidTableSize { rows: 0, cols: 3, max: 20 })
        );
        assert!(insert_table(&mut doc, root, Selection::collapsed(0), 21, 3, 20).is_err());
        assert_eq!(html(&doc), "ab");
    }

    #[test]
    fn test_image_replaces_selection() {
        let mut doc = parse("<p>old</p>").unwrap();
        let root = doc.root();
        let policy = AddressPolicy::default();
        insert_image(&mut doc, root, Selection::new(0, 3), "https://x.io/a.png", Some("pic"), &policy)
            .unwrap();
        assert_eq!(html(&doc), "<p><img alt=\"pic\" src=\"https://x.io/a.png\"></p>");
    }

    #[test]
    fn test_insert_text_replaces_selection() {
        let mut doc = parse("Hello <b>World</b>").unwrap();
        let root = doc.root();
        let caret = insert_text(&mut doc, root, Selection::new(0, 5), "Goodbye").unwrap();
        assert_eq!(caret, 7);
        assert_eq!(html(&doc), "Goodbye <b>World</b>");

        let mut empty = Document::new("div");
        let root = empty.root();
        assert_eq!(insert_text(&mut empty, root, Selection::collapsed(0), "hi").unwrap(), 2);
        assert_eq!(html(&empty), "hi");

        let mut doc = parse("<p>one</p><p>two</p>").unwrap();
        let root = doc.root();
        assert_eq!(insert_text(&mut doc, root, Selection::new(3, 6), "2").unwrap(), 4);
        assert_eq!(html(&doc), "<p>one</p><p>2</p>");
    }

    #[test]
    fn test_delete_range_prunes_empty_wrappers() {
        let mut doc = parse("a<b>bc</b>d<br>e").unwrap();
        let root = doc.root();
        delete_range(&mut doc, root, Selection::new(1, 4)).unwrap();
        assert_eq!(html(&doc), "a<br>e");

        let mut doc = parse("ab<br>cd").unwrap();
        let root = doc.root();
        delete_range(&mut doc, root, Selection::new(1, 3)).unwrap();
        assert_eq!(html(&doc), "ad");
    }
}
