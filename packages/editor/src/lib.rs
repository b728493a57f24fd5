//! # Scribe Editor
//!
//! Selection-preserving rich-text formatting engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ commands: toolbar message → Action          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ selection: live selection → offsets         │
//! │ range: offsets → intersected text units     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ formatting | block | structure              │
//! │  - toggle inline wrappers (split + wrap)    │
//! │  - align / retag the enclosing block        │
//! │  - lists, links, images, tables             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: debounced onChange, guarded ingestion │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Offsets across mutations**: selections are carried as character
//!    offsets into the flattened text, which wrapping and splitting never
//!    change
//! 2. **Toggle on uniformity**: remove only when every selected unit already
//!    carries the format; anything partial applies
//! 3. **All or nothing**: every multi-step mutation runs in a document
//!    transaction
//! 4. **No ambient state**: the selection source, clock and command channel
//!    are handed to the editor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_editor::{command_channel, Command, Editor, EditorConfig, MemorySelection, SystemClock};
//!
//! let (toolbar, commands) = command_channel();
//! let mut editor = Editor::new(EditorConfig::default(), MemorySelection::new(), SystemClock)
//!     .with_commands(commands);
//! editor.on_change(|markup| println!("{}", markup));
//!
//! editor.load("Hello World")?;
//! editor.select(6, 11);
//! toolbar.send(Command::new("bold"));
//! editor.drain_commands();
//!
//! assert_eq!(editor.html(), "Hello <strong>World</strong>");
//! editor.flush();
//! ```

mod block;
mod clock;
mod commands;
mod config;
mod editor;
mod errors;
mod formatting;
mod range;
mod selection;
mod structure;
mod sync;

pub use block::{find_block, set_alignment, set_block_kind, Alignment, BlockKind, BlockRole};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{command_channel, Action, Command, CommandReceiver, CommandSender, DEFAULT_HIGHLIGHT};
pub use config::EditorConfig;
pub use editor::{ChangeCallback, ContentUpdate, Editor, Outcome};
pub use errors::{EditorError, FormatError, FormatResult, StructureError, StructureResult};
pub use formatting::{
    active_formats, clear_formatting, is_uniform, query_format, toggle_format, Caret, FormatOutcome,
    FormatState, FormatTag, InlineFormat, Toggle,
};
pub use range::{intersecting_units, selection_range, units_in_selection, TextUnit};
pub use selection::{
    capture, offset_of_point, point_at_offset, relocate, restore, text_spans, Bias, LiveSelection,
    MemorySelection, Selection, SelectionProvider, TextSpan,
};
pub use structure::{
    delete_range, insert_at, insert_image, insert_link, insert_list, insert_table, insert_text,
    remove_link, selected_lines, selected_text, AddressPolicy, ListKind,
};
pub use sync::{ExternalContent, SyncState, Synchronizer};

// Re-export the tree types callers need alongside the engine
pub use scribe_dom::{Document, NodeId, Point, Range};
