//! # Range Walker
//!
//! Finds the text units a range actually selects characters from.
//!
//! Intersection is decided by boundary-point comparison, not by offsets or
//! substring search: a unit counts only when the range ends strictly after
//! the unit's start and starts strictly before the unit's end. Units that
//! merely touch an edge of the range are left alone, as are units made of
//! whitespace only.

use crate::selection::{point_at_offset, Bias, Selection};
use scribe_dom::text::is_blank;
use scribe_dom::{Document, NodeId, Range};
use std::cmp::Ordering;

/// A text node intersected by a range, with its flattened-text span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextUnit {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

impl TextUnit {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Local `(start, end)` of the part of this unit inside `selection`
    pub fn local(&self, selection: Selection) -> (usize, usize) {
        let start = selection.start.clamp(self.start, self.end) - self.start;
        let end = selection.end.clamp(self.start, self.end) - self.start;
        (start, end)
    }

    /// True when `selection` covers the whole unit
    pub fn is_covered_by(&self, selection: Selection) -> bool {
        selection.start <= self.start && self.end <= selection.end
    }
}

/// Non-blank text nodes under `root` that `range` intersects, in order
pub fn intersecting_units(doc: &Document, root: NodeId, range: &Range) -> Vec<TextUnit> {
    let mut units = Vec::new();
    let mut offset = 0;

    for node in doc.text_nodes(root) {
        let start = offset;
        offset += doc.text_len(node);

        if doc.text(node).map_or(true, is_blank) {
            continue;
        }

        let unit_range = doc.content_range(node);
        let ends_after_start = doc.compare_points(range.end, unit_range.start) == Ordering::Greater;
        let starts_before_end = doc.compare_points(range.start, unit_range.end) == Ordering::Less;

        if ends_after_start && starts_before_end {
            units.push(TextUnit {
                node,
                start,
                end: offset,
            });
        }
    }

    units
}

/// Boundary-point range for an offset selection.
///
/// Resolves the start forward and the end backward so the range hugs the
/// selected characters.
pub fn selection_range(doc: &Document, root: NodeId, selection: Selection) -> Option<Range> {
    let start = point_at_offset(doc, root, selection.start, Bias::Forward)?;
    if selection.is_collapsed() {
        return Some(Range::collapsed(start));
    }
    let end = point_at_offset(doc, root, selection.end, Bias::Backward)?;
    Some(Range::new(start, end))
}

/// Units intersected by an offset selection
pub fn units_in_selection(doc: &Document, root: NodeId, selection: Selection) -> Vec<TextUnit> {
    selection_range(doc, root, selection)
        .map(|range| intersecting_units(doc, root, &range))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_dom::{ElementData, Point};

    fn doc_with(texts: &[&str]) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("div");
        let root = doc.root();
        let ids = texts
            .iter()
            .map(|t| {
                let p = doc.create_element(ElementData::new("span"));
                let id = doc.create_text(*t);
                doc.append_child(root, p).unwrap();
                doc.append_child(p, id).unwrap();
                id
            })
            .collect();
        (doc, ids)
    }

    #[test]
    fn test_units_touching_edges_are_excluded() {
        let (doc, ids) = doc_with(&["aaa", "bbb", "ccc"]);
        let root = doc.root();

        let units = units_in_selection(&doc, root, Selection::new(3, 6));
        assert_eq!(units, vec![TextUnit { node: ids[1], start: 3, end: 6 }]);
    }

    #[test]
    fn test_partial_overlap_on_both_ends() {
        let (doc, ids) = doc_with(&["aaa", "bbb", "ccc"]);
        let units = units_in_selection(&doc, doc.root(), Selection::new(2, 7));
        let nodes: Vec<_> = units.iter().map(|u| u.node).collect();
        assert_eq!(nodes, ids);
    }

    #[test]
    fn test_whitespace_units_are_skipped() {
        let (doc, ids) = doc_with(&["aaa", "   ", "ccc"]);
        let units = units_in_selection(&doc, doc.root(), Selection::new(0, 9));
        let nodes: Vec<_> = units.iter().map(|u| u.node).collect();
        assert_eq!(nodes, vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_collapsed_range_intersects_nothing() {
        let (doc, _) = doc_with(&["abc"]);
        assert!(units_in_selection(&doc, doc.root(), Selection::collapsed(1)).is_empty());
    }

    #[test]
    fn test_element_boundary_range() {
        let (doc, ids) = doc_with(&["aaa", "bbb"]);
        let root = doc.root();
        let range = Range::new(Point::new(root, 1), Point::new(root, 2));
        let units = intersecting_units(&doc, root, &range);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].node, ids[1]);
    }

    #[test]
    fn test_local_offsets() {
        let unit = TextUnit { node: scribe_dom::Document::new("div").root(), start: 10, end: 15 };
        assert_eq!(unit.local(Selection::new(12, 20)), (2, 5));
        assert_eq!(unit.local(Selection::new(0, 11)), (0, 1));
        assert!(unit.is_covered_by(Selection::new(10, 15)));
        assert!(!unit.is_covered_by(Selection::new(11, 15)));
    }
}
