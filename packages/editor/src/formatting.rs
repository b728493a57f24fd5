//! # Toggle Formatting Engine
//!
//! Applies or removes one inline format over a selection.
//!
//! ## Toggle semantics
//!
//! The decision is made once for the whole selection: if every intersected
//! unit already sits directly inside a wrapper carrying the format, the
//! wrappers are removed; otherwise the format is applied. A selection that
//! is only partly formatted therefore always resolves toward applying.
//!
//! ## Application
//!
//! Each unit is wrapped on its own. A unit whose edges do not line up with
//! the selection is split into before / selected / after siblings first and
//! only the selected part is wrapped. Units already carrying the format are
//! left as they are.
//!
//! ## Removal
//!
//! Each wrapper holding an intersected unit is unwrapped (its children move
//! up into its place) and the surrounding text is merged again, so
//! apply → remove gives back the original text nodes. A style wrapper that
//! carries more than the one property only loses that property.
//!
//! Every mutation runs inside a document transaction.

use crate::errors::{FormatError, FormatResult};
use crate::range::{units_in_selection, TextUnit};
use crate::selection::{point_at_offset, Bias, Selection};
use scribe_dom::{Document, ElementData, NodeId, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Tag-based inline formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl FormatTag {
    pub const ALL: [FormatTag; 4] = [
        FormatTag::Bold,
        FormatTag::Italic,
        FormatTag::Underline,
        FormatTag::Strikethrough,
    ];

    /// Tag used for new wrappers
    pub fn tag(self) -> &'static str {
        match self {
            FormatTag::Bold => "strong",
            FormatTag::Italic => "em",
            FormatTag::Underline => "u",
            FormatTag::Strikethrough => "s",
        }
    }

    /// True for the wrapper tag and its legacy equivalents
    pub fn matches(self, tag: &str) -> bool {
        match self {
            FormatTag::Bold => matches!(tag, "strong" | "b"),
            FormatTag::Italic => matches!(tag, "em" | "i"),
            FormatTag::Underline => tag == "u",
            FormatTag::Strikethrough => matches!(tag, "s" | "strike" | "del"),
        }
    }
}

/// A format carried by one wrapper element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InlineFormat {
    Tag(FormatTag),
    Style { property: String, value: String },
}

impl InlineFormat {
    pub fn bold() -> Self {
        Self::Tag(FormatTag::Bold)
    }

    pub fn italic() -> Self {
        Self::Tag(FormatTag::Italic)
    }

    pub fn underline() -> Self {
        Self::Tag(FormatTag::Underline)
    }

    pub fn strikethrough() -> Self {
        Self::Tag(FormatTag::Strikethrough)
    }

    pub fn style(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Style {
            property: property.into().to_ascii_lowercase(),
            value: value.into(),
        }
    }

    pub fn font_size(value: impl Into<String>) -> Self {
        Self::style("font-size", value)
    }

    pub fn font_family(value: impl Into<String>) -> Self {
        Self::style("font-family", value)
    }

    pub fn color(value: impl Into<String>) -> Self {
        Self::style("color", value)
    }

    pub fn highlight(value: impl Into<String>) -> Self {
        Self::style("background-color", value)
    }

    /// Fresh wrapper element for this format
    pub fn wrapper(&self) -> ElementData {
        match self {
            InlineFormat::Tag(tag) => ElementData::new(tag.tag()),
            InlineFormat::Style { property, value } => {
                ElementData::new("span").with_style(property.as_str(), value.as_str())
            }
        }
    }

    /// True when `element` is a wrapper carrying exactly this format
    pub fn is_carried_by(&self, element: &ElementData) -> bool {
        match self {
            InlineFormat::Tag(tag) => tag.matches(&element.tag),
            InlineFormat::Style { property, value } => {
                element.is("span") && element.style(property) == Some(value.as_str())
            }
        }
    }
}

/// What a toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Applied,
    Removed,
    Unchanged,
}

/// Where the cursor goes after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    /// A boundary point in the mutated tree
    Point(Point),
    /// An offset to resolve against the mutated tree
    Offset(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOutcome {
    pub toggle: Toggle,
    pub caret: Option<Caret>,
}

impl FormatOutcome {
    fn unchanged() -> Self {
        Self {
            toggle: Toggle::Unchanged,
            caret: None,
        }
    }
}

/// Tags removed by "clear formatting"
const INLINE_WRAPPERS: &[&str] = &["strong", "b", "em", "i", "u", "s", "strike", "del", "span"];

fn wrapper_of(doc: &Document, root: NodeId, node: NodeId) -> Option<NodeId> {
    doc.parent(node).filter(|parent| *parent != root)
}

/// True when every unit's parent carries `format`
pub fn is_uniform(doc: &Document, root: NodeId, units: &[TextUnit], format: &InlineFormat) -> bool {
    !units.is_empty()
        && units.iter().all(|unit| {
            wrapper_of(doc, root, unit.node)
                .and_then(|parent| doc.element(parent))
                .is_some_and(|element| format.is_carried_by(element))
        })
}

/// Units the selection-intent query looks at. A caret inspects the text it
/// sits at the end of.
fn query_units(doc: &Document, root: NodeId, selection: Selection) -> Vec<TextUnit> {
    if !selection.is_collapsed() {
        return units_in_selection(doc, root, selection);
    }
    point_at_offset(doc, root, selection.start, Bias::Backward)
        .map(|point| TextUnit {
            node: point.node,
            start: selection.start - point.offset,
            end: selection.start - point.offset + doc.text_len(point.node),
        })
        .into_iter()
        .collect()
}

/// Whether `format` is active over the whole selection. Never mutates.
pub fn query_format(doc: &Document, root: NodeId, selection: Selection, format: &InlineFormat) -> bool {
    is_uniform(doc, root, &query_units(doc, root, selection), format)
}

/// Toggle state of every toolbar format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_size: Option<String>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub highlight: Option<String>,
}

/// Answer the selection-intent query for every format at once
pub fn active_formats(doc: &Document, root: NodeId, selection: Selection) -> FormatState {
    let units = query_units(doc, root, selection);
    let tag = |t: FormatTag| is_uniform(doc, root, &units, &InlineFormat::Tag(t));

    FormatState {
        bold: tag(FormatTag::Bold),
        italic: tag(FormatTag::Italic),
        underline: tag(FormatTag::Underline),
        strikethrough: tag(FormatTag::Strikethrough),
        font_size: uniform_style(doc, root, &units, "font-size"),
        font_family: uniform_style(doc, root, &units, "font-family"),
        color: uniform_style(doc, root, &units, "color"),
        highlight: uniform_style(doc, root, &units, "background-color"),
    }
}

/// The value of a style property shared by every unit's wrapper span
fn uniform_style(doc: &Document, root: NodeId, units: &[TextUnit], property: &str) -> Option<String> {
    let mut values = units.iter().map(|unit| {
        wrapper_of(doc, root, unit.node)
            .and_then(|parent| doc.element(parent))
            .filter(|element| element.is("span"))
            .and_then(|element| element.style(property))
    });
    let first = values.next()??;
    values
        .all(|value| value == Some(first))
        .then(|| first.to_string())
}

/// Toggle `format` over `selection`
#[instrument(skip(doc), level = "debug")]
pub fn toggle_format(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    format: &InlineFormat,
) -> FormatResult<FormatOutcome> {
    if selection.is_collapsed() {
        debug!("collapsed selection, nothing to format");
        return Ok(FormatOutcome::unchanged());
    }

    let units = units_in_selection(doc, root, selection);
    if units.is_empty() {
        debug!("selection intersects no text");
        return Ok(FormatOutcome::unchanged());
    }

    if is_uniform(doc, root, &units, format) {
        remove_format(doc, root, selection, &units, format)
    } else {
        apply_format(doc, root, selection, &units, format)
    }
}

fn apply_format(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    units: &[TextUnit],
    format: &InlineFormat,
) -> FormatResult<FormatOutcome> {
    let last_wrapper = doc.transaction(|doc| -> FormatResult<Option<NodeId>> {
        let mut last_wrapper = None;

        for unit in units {
            if wrapper_of(doc, root, unit.node)
                .and_then(|parent| doc.element(parent))
                .is_some_and(|element| format.is_carried_by(element))
            {
                continue;
            }
            let target = isolate(doc, *unit, selection)?;
            let wrapper = doc.create_element(format.wrapper());
            doc.wrap(target, wrapper)?;
            last_wrapper = Some(wrapper);
        }

        Ok(last_wrapper)
    })?;

    debug!(units = units.len(), "applied format");
    let caret = match last_wrapper.and_then(|w| Some((doc.parent(w)?, doc.index_in_parent(w)?))) {
        Some((parent, index)) => Caret::Point(Point::new(parent, index + 1)),
        None => Caret::Offset(selection.end),
    };

    Ok(FormatOutcome {
        toggle: Toggle::Applied,
        caret: Some(caret),
    })
}

/// Split `unit` so that exactly its selected part is one text node
fn isolate(doc: &mut Document, unit: TextUnit, selection: Selection) -> FormatResult<NodeId> {
    let (start, end) = unit.local(selection);
    let len = doc.text_len(unit.node);
    if start >= end || end > len || len != unit.len() {
        return Err(FormatError::Tree(scribe_dom::DomError::OffsetOutOfBounds {
            offset: end,
            len,
        }));
    }

    if start == 0 && end == len {
        return Ok(unit.node);
    }
    if end < len {
        doc.split_text(unit.node, end)?;
    }
    if start > 0 {
        return Ok(doc.split_text(unit.node, start)?);
    }
    Ok(unit.node)
}

fn remove_format(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    units: &[TextUnit],
    format: &InlineFormat,
) -> FormatResult<FormatOutcome> {
    // Wrappers in document order, each once
    let mut wrappers = Vec::new();
    for unit in units {
        if let Some(parent) = wrapper_of(doc, root, unit.node) {
            if !wrappers.contains(&parent) {
                wrappers.push(parent);
            }
        }
    }

    let caret_offset = wrappers
        .last()
        .and_then(|w| end_offset_of(doc, root, *w))
        .unwrap_or(selection.end);

    doc.transaction(|doc| -> FormatResult<()> {
        let mut touched = BTreeSet::new();
        for wrapper in &wrappers {
            let parent = doc.parent(*wrapper).ok_or(scribe_dom::DomError::Detached(*wrapper))?;
            strip_wrapper(doc, *wrapper, format)?;
            touched.insert(parent);
        }
        for parent in touched {
            doc.normalize(parent)?;
        }
        Ok(())
    })?;

    debug!(wrappers = wrappers.len(), "removed format");
    Ok(FormatOutcome {
        toggle: Toggle::Removed,
        caret: Some(Caret::Offset(caret_offset)),
    })
}

/// Drop `format` from `wrapper`: unwrap it, or only delete the style
/// property when the span carries anything else
fn strip_wrapper(doc: &mut Document, wrapper: NodeId, format: &InlineFormat) -> FormatResult<()> {
    if let InlineFormat::Style { property, .. } = format {
        if let Some(element) = doc.element_mut(wrapper) {
            if element.styles.len() > 1 || !element.attributes.is_empty() {
                element.styles.remove(property);
                return Ok(());
            }
        }
    }
    doc.unwrap(wrapper)?;
    Ok(())
}

fn end_offset_of(doc: &Document, root: NodeId, node: NodeId) -> Option<usize> {
    let parent = doc.parent(node)?;
    let index = doc.index_in_parent(node)?;
    crate::selection::offset_of_point(doc, root, Point::new(parent, index + 1))
}

/// Unwrap every inline wrapper around the selected text
#[instrument(skip(doc), level = "debug")]
pub fn clear_formatting(doc: &mut Document, root: NodeId, selection: Selection) -> FormatResult<FormatOutcome> {
    if selection.is_collapsed() {
        return Ok(FormatOutcome::unchanged());
    }
    let units = units_in_selection(doc, root, selection);

    let mut wrappers = Vec::new();
    for unit in &units {
        for ancestor in doc.ancestors(unit.node) {
            if ancestor == root {
                break;
            }
            let is_inline = doc
                .tag(ancestor)
                .is_some_and(|tag| INLINE_WRAPPERS.contains(&tag));
            if !is_inline {
                break;
            }
            if !wrappers.contains(&ancestor) {
                wrappers.push(ancestor);
            }
        }
    }
    if wrappers.is_empty() {
        return Ok(FormatOutcome::unchanged());
    }

    doc.transaction(|doc| -> FormatResult<()> {
        let mut touched = BTreeSet::new();
        // Innermost first so outer wrappers still have their parent
        for wrapper in &wrappers {
            doc.unwrap(*wrapper)?;
        }
        for unit in &units {
            if let Some(parent) = doc.parent(unit.node) {
                touched.insert(parent);
            }
        }
        for parent in touched {
            doc.normalize(parent)?;
        }
        Ok(())
    })?;

    Ok(FormatOutcome {
        toggle: Toggle::Removed,
        caret: Some(Caret::Offset(selection.end)),
    })
}
