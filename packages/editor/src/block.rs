//! # Block Stylist
//!
//! Finds the one block element a selection belongs to and styles or
//! retags it.
//!
//! Candidates are the block-capable elements the selection intersects (a
//! caret counts when it sits inside the element). They are ranked by role:
//!
//! | Role      | Tags                                   | Rank |
//! |-----------|----------------------------------------|------|
//! | Heading   | `h1`..`h6`                             | 3    |
//! | ListItem  | `li`                                   | 3    |
//! | Paragraph | `p`                                    | 2    |
//! | Container | `div`, `section`, `article`, `blockquote` | 1 |
//!
//! Equal ranks go to the deepest candidate, then to the first in document
//! order. The editable root itself is never a candidate.

use crate::errors::{FormatError, FormatResult};
use crate::range::{selection_range, units_in_selection};
use crate::selection::{point_at_offset, Bias, Selection};
use scribe_dom::{Document, ElementData, NodeId, Range};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Heading(u8),
    ListItem,
    Paragraph,
    Container,
}

impl BlockRole {
    pub fn of(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(Self::Heading(1)),
            "h2" => Some(Self::Heading(2)),
            "h3" => Some(Self::Heading(3)),
            "h4" => Some(Self::Heading(4)),
            "h5" => Some(Self::Heading(5)),
            "h6" => Some(Self::Heading(6)),
            "li" => Some(Self::ListItem),
            "p" => Some(Self::Paragraph),
            "div" | "section" | "article" | "blockquote" => Some(Self::Container),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Heading(_) | Self::ListItem => 3,
            Self::Paragraph => 2,
            Self::Container => 1,
        }
    }
}

/// `text-align` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            "justify" => Ok(Alignment::Justify),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

/// Target of a block retag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
}

impl BlockKind {
    fn tag(self) -> String {
        match self {
            BlockKind::Heading(level) => format!("h{}", level),
            BlockKind::Paragraph => "p".to_string(),
        }
    }
}

/// True when `range` reaches into `element`. A collapsed range must lie
/// within the element's boundaries, edges included.
fn touches(doc: &Document, range: &Range, element: NodeId) -> bool {
    let own = doc.content_range(element);
    if range.is_collapsed() {
        doc.compare_points(own.start, range.start) != Ordering::Greater
            && doc.compare_points(range.start, own.end) != Ordering::Greater
    } else {
        doc.compare_points(range.end, own.start) == Ordering::Greater
            && doc.compare_points(range.start, own.end) == Ordering::Less
    }
}

/// Highest-ranked block under `root` the selection touches, among those
/// `accept` lets through
fn best_block(
    doc: &Document,
    root: NodeId,
    range: &Range,
    accept: impl Fn(BlockRole) -> bool,
) -> Option<NodeId> {
    let mut best: Option<(u8, usize, NodeId)> = None;

    for node in doc.descendants(root).skip(1) {
        let Some(role) = doc.tag(node).and_then(BlockRole::of) else {
            continue;
        };
        if !accept(role) || !touches(doc, range, node) {
            continue;
        }
        let key = (role.rank(), doc.depth(node));
        if best.map_or(true, |(rank, depth, _)| key > (rank, depth)) {
            best = Some((key.0, key.1, node));
        }
    }

    best.map(|(_, _, node)| node)
}

/// The block an alignment applies to, or the parent of the selection's
/// first text node when no block-capable element encloses it
pub fn find_block(doc: &Document, root: NodeId, selection: Selection) -> Option<NodeId> {
    let range = selection_range(doc, root, selection)?;
    best_block(doc, root, &range, |_| true).or_else(|| doc.parent(range.start.node))
}

/// Set `text-align` on the selection's block. Returns the styled element.
#[instrument(skip(doc), level = "debug")]
pub fn set_alignment(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    alignment: Alignment,
) -> FormatResult<Option<NodeId>> {
    let Some(block) = find_block(doc, root, selection) else {
        debug!("no block to align");
        return Ok(None);
    };
    let element = doc
        .element_mut(block)
        .ok_or(scribe_dom::DomError::NotAnElement(block))?;
    element.set_style("text-align", alignment.as_str());
    Ok(Some(block))
}

/// Turn the selection's block into a heading or paragraph.
///
/// List items are left alone. When nothing but the root encloses the
/// selection, the root's children holding the selected text are moved into
/// a new block element.
#[instrument(skip(doc), level = "debug")]
pub fn set_block_kind(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    kind: BlockKind,
) -> FormatResult<Option<NodeId>> {
    if let BlockKind::Heading(level) = kind {
        if !(1..=6).contains(&level) {
            return Err(FormatError::InvalidHeadingLevel(level));
        }
    }
    let Some(range) = selection_range(doc, root, selection) else {
        return Ok(None);
    };

    if let Some(block) = best_block(doc, root, &range, |role| role != BlockRole::ListItem) {
        if let Some(element) = doc.element_mut(block) {
            element.tag = kind.tag();
        }
        debug!(block = %block, "retagged block");
        return Ok(Some(block));
    }

    let mut nodes: Vec<NodeId> = units_in_selection(doc, root, selection)
        .into_iter()
        .map(|unit| unit.node)
        .collect();
    if nodes.is_empty() {
        nodes.extend(point_at_offset(doc, root, selection.start, Bias::Forward).map(|p| p.node));
    }

    let mut top: Vec<NodeId> = Vec::new();
    for node in nodes {
        if let Some(child) = top_level_child(doc, root, node) {
            if !top.contains(&child) {
                top.push(child);
            }
        }
    }
    let (Some(first), Some(last)) = (top.first().copied(), top.last().copied()) else {
        return Ok(None);
    };

    let block = doc.transaction(|doc| -> FormatResult<NodeId> {
        let from = doc.index_in_parent(first).ok_or(scribe_dom::DomError::Detached(first))?;
        let to = doc.index_in_parent(last).ok_or(scribe_dom::DomError::Detached(last))?;
        let moved = doc.children(root)[from..=to].to_vec();

        let block = doc.create_element(ElementData::new(kind.tag()));
        doc.insert_child(root, from, block)?;
        for child in moved {
            doc.append_child(block, child)?;
        }
        Ok(block)
    })?;

    debug!(block = %block, "wrapped root content in new block");
    Ok(Some(block))
}

/// The child of `root` that contains `node`
fn top_level_child(doc: &Document, root: NodeId, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|n| doc.parent(*n) == Some(root))
}
