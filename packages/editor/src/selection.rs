//! # Offset Codec
//!
//! Translates between live selections (boundary points inside the tree)
//! and linear character offsets into the root's flattened text.
//!
//! Offsets survive any mutation that leaves the flattened text unchanged
//! (wrapping, unwrapping, splitting), which is why the formatting engine
//! works on offsets and converts back to points afterwards. When the tree is
//! replaced by unrelated content, offsets mean nothing and [`relocate`]
//! finds the old selection again by matching content instead.

use scribe_dom::text::{char_len, slice_chars};
use scribe_dom::{Document, NodeId, Point};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Characters of context used to relocate a collapsed cursor
const CURSOR_CONTEXT: usize = 16;

/// Linear selection, `start <= end`, in characters of flattened text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Build from two offsets in either order
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }
}

/// Selection as the editable surface reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiveSelection {
    pub anchor: Point,
    pub focus: Point,
}

impl LiveSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(at: Point) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Access to the surface's current selection
pub trait SelectionProvider {
    fn current(&self) -> Option<LiveSelection>;

    fn set_current(&mut self, selection: Option<LiveSelection>);
}

/// Selection held in memory, for tests and headless hosts
#[derive(Debug, Default, Clone)]
pub struct MemorySelection {
    current: Option<LiveSelection>,
}

impl MemorySelection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionProvider for MemorySelection {
    fn current(&self) -> Option<LiveSelection> {
        self.current
    }

    fn set_current(&mut self, selection: Option<LiveSelection>) {
        self.current = selection;
    }
}

/// Shared provider: the host keeps one handle, the editor the other
impl<P: SelectionProvider> SelectionProvider for Rc<RefCell<P>> {
    fn current(&self) -> Option<LiveSelection> {
        self.borrow().current()
    }

    fn set_current(&mut self, selection: Option<LiveSelection>) {
        self.borrow_mut().set_current(selection);
    }
}

/// How an offset on the boundary between two text nodes resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Start of the following text node
    Forward,
    /// End of the preceding text node
    Backward,
}

/// One text node's slice of the flattened text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Every text node under `root` (whitespace included) with its offsets
pub fn text_spans(doc: &Document, root: NodeId) -> Vec<TextSpan> {
    let mut offset = 0;
    doc.text_nodes(root)
        .map(|node| {
            let start = offset;
            offset += doc.text_len(node);
            TextSpan {
                node,
                start,
                end: offset,
            }
        })
        .collect()
}

fn contains(doc: &Document, root: NodeId, node: NodeId) -> bool {
    node == root || doc.is_ancestor(root, node)
}

/// Offset of a boundary point, or `None` when it lies outside `root`
pub fn offset_of_point(doc: &Document, root: NodeId, point: Point) -> Option<usize> {
    if !contains(doc, root, point.node) {
        return None;
    }
    let spans = text_spans(doc, root);

    if doc.is_text(point.node) {
        let span = spans.iter().find(|s| s.node == point.node)?;
        return Some(span.start + point.offset.min(span.end - span.start));
    }

    // Element point: everything in text nodes that start before it
    Some(
        spans
            .iter()
            .filter(|s| doc.compare_points(Point::new(s.node, 0), point) == Ordering::Less)
            .map(|s| s.end - s.start)
            .sum(),
    )
}

/// Text point for an offset, `None` past the end or without text nodes
pub fn point_at_offset(doc: &Document, root: NodeId, offset: usize, bias: Bias) -> Option<Point> {
    let spans = text_spans(doc, root);
    let hit = match bias {
        Bias::Forward => spans
            .iter()
            .find(|s| s.start <= offset && offset < s.end)
            .or_else(|| spans.iter().rev().find(|s| s.end == offset)),
        Bias::Backward => spans
            .iter()
            .find(|s| s.start < offset && offset <= s.end)
            .or_else(|| spans.iter().find(|s| s.start == offset)),
    }?;
    Some(Point::new(hit.node, offset - hit.start))
}

/// Capture the provider's selection as offsets relative to `root`.
///
/// `None` when nothing is selected, an endpoint lies outside `root`, or
/// `root` has no text.
pub fn capture(doc: &Document, root: NodeId, provider: &dyn SelectionProvider) -> Option<Selection> {
    let live = provider.current()?;
    doc.text_nodes(root).next()?;
    let anchor = offset_of_point(doc, root, live.anchor)?;
    let focus = offset_of_point(doc, root, live.focus)?;
    Some(Selection::new(anchor, focus))
}

/// Set the provider's selection from offsets.
///
/// The start resolves forward and the end backward, so a selection captured
/// from text points comes back on the same nodes. Returns `false` (and
/// leaves the provider untouched) when no text node matches.
pub fn restore(
    doc: &Document,
    root: NodeId,
    provider: &mut dyn SelectionProvider,
    selection: Selection,
) -> bool {
    let start = point_at_offset(doc, root, selection.start, Bias::Forward);
    let live = if selection.is_collapsed() {
        start.map(LiveSelection::caret)
    } else {
        let end = point_at_offset(doc, root, selection.end, Bias::Backward);
        start.zip(end).map(|(s, e)| LiveSelection::new(s, e))
    };

    match live {
        Some(live) => {
            provider.set_current(Some(live));
            true
        }
        None => false,
    }
}

/// Find a selection again in unrelated text by content.
///
/// A range is matched on its selected text, a caret on the text just before
/// it; among several matches the one nearest the old position wins.
pub fn relocate(old_text: &str, old: Selection, new_text: &str) -> Option<Selection> {
    if !old.is_collapsed() {
        let needle = slice_chars(old_text, old.start, old.end);
        if !needle.is_empty() {
            let at = nearest_occurrence(new_text, needle, old.start)?;
            return Some(Selection::new(at, at + char_len(needle)));
        }
    }

    let context_start = old.start.saturating_sub(CURSOR_CONTEXT);
    let context = slice_chars(old_text, context_start, old.start);
    if context.is_empty() {
        return Some(Selection::collapsed(0));
    }
    let at = nearest_occurrence(new_text, context, context_start)?;
    Some(Selection::collapsed(at + char_len(context)))
}

fn nearest_occurrence(haystack: &str, needle: &str, near: usize) -> Option<usize> {
    haystack
        .match_indices(needle)
        .map(|(byte_idx, _)| char_len(&haystack[..byte_idx]))
        .min_by_key(|at| at.abs_diff(near))
}
