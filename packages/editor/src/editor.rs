//! # Editor
//!
//! Owns the document and wires the engine together: a command comes in,
//! the current selection is captured as offsets, the matching engine
//! mutates the tree, the caret is put back and the new markup is handed to
//! the synchronizer for debounced emission.

use crate::block::{set_alignment, set_block_kind, BlockKind};
use crate::clock::Clock;
use crate::commands::{Action, Command, CommandReceiver};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::formatting::{active_formats, clear_formatting, query_format, toggle_format};
use crate::formatting::{Caret, FormatOutcome, FormatState, InlineFormat, Toggle};
use crate::selection::{capture, offset_of_point, relocate, restore, Selection, SelectionProvider};
use crate::structure::{
    insert_image, insert_link, insert_list, insert_table, insert_text, remove_link, AddressPolicy,
};
use crate::sync::{ExternalContent, SyncState, Synchronizer};
use scribe_dom::{Document, NodeId, Point};
use scribe_parser::{parse_with_root, serialize_children};
use tracing::{debug, info, instrument, warn};

/// What a command did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Removed,
    Inserted,
    Aligned,
    /// Recognized, but nothing to do (no selection, collapsed selection, ...)
    Unchanged,
    /// Not a recognized command
    Ignored,
}

/// What happened to content supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentUpdate {
    Applied,
    /// Held until the surface loses focus
    Deferred,
    /// Identical to what the editor already shows
    Unchanged,
}

pub type ChangeCallback = Box<dyn FnMut(&str)>;

pub struct Editor {
    config: EditorConfig,
    doc: Document,
    selection: Box<dyn SelectionProvider>,
    sync: Synchronizer,
    policy: AddressPolicy,
    commands: Option<CommandReceiver>,
    on_change: Option<ChangeCallback>,
}

impl Editor {
    pub fn new(
        config: EditorConfig,
        selection: impl SelectionProvider + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            doc: Document::new(&config.root_tag),
            sync: Synchronizer::new(config.debounce(), clock),
            policy: AddressPolicy::new(config.allowed_schemes.iter().cloned()),
            selection: Box::new(selection),
            commands: None,
            on_change: None,
            config,
        }
    }

    /// Attach the receiving end of a command channel
    pub fn with_commands(mut self, commands: CommandReceiver) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Register the change callback; replaces any earlier one
    pub fn on_change(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    /// Inner markup of the editable root
    pub fn html(&self) -> String {
        serialize_children(&self.doc, self.doc.root())
    }

    /// Flattened text of the editable root
    pub fn text(&self) -> String {
        self.doc.text_content(self.doc.root())
    }

    pub fn sync_state(&self) -> &SyncState {
        self.sync.state()
    }

    /// Current selection as offsets, `None` when nothing inside the root
    /// is selected
    pub fn selection(&self) -> Option<Selection> {
        capture(&self.doc, self.doc.root(), self.selection.as_ref())
    }

    /// Select a character range. Returns `false` when it cannot be placed.
    pub fn select(&mut self, start: usize, end: usize) -> bool {
        let root = self.doc.root();
        restore(&self.doc, root, self.selection.as_mut(), Selection::new(start, end))
    }

    /// Initialize the surface from markup. Nothing is emitted for it.
    #[instrument(skip(self, markup), fields(bytes = markup.len()))]
    pub fn load(&mut self, markup: &str) -> Result<(), EditorError> {
        let doc = parse_with_root(markup, &self.config.root_tag)?;
        self.replace_document(doc);
        info!("loaded content");
        Ok(())
    }

    /// Execute a toolbar command against the current selection
    pub fn execute(&mut self, command: &Command) -> Result<Outcome, EditorError> {
        match Action::from_command(command) {
            Some(action) => self.dispatch(action),
            None => Ok(Outcome::Ignored),
        }
    }

    /// Run every command queued on the attached channel, in order
    pub fn drain_commands(&mut self) -> Vec<Result<Outcome, EditorError>> {
        let queued = self
            .commands
            .as_ref()
            .map(CommandReceiver::drain)
            .unwrap_or_default();
        queued.iter().map(|command| self.execute(command)).collect()
    }

    #[instrument(skip(self), level = "debug")]
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome, EditorError> {
        let Some(selection) = self.selection() else {
            debug!("no selection, command has nothing to act on");
            return Ok(Outcome::Unchanged);
        };
        if action.needs_range() && selection.is_collapsed() {
            debug!("collapsed selection, command has nothing to act on");
            return Ok(Outcome::Unchanged);
        }

        let result = self.run(action, selection);
        match &result {
            Ok(Outcome::Unchanged) | Ok(Outcome::Ignored) => {}
            Ok(outcome) => {
                debug!(?outcome, "command applied");
                self.local_change();
                self.reclaim();
            }
            Err(err) => warn!(%err, "command rejected"),
        }
        result
    }

    fn run(&mut self, action: Action, selection: Selection) -> Result<Outcome, EditorError> {
        let root = self.doc.root();
        let doc = &mut self.doc;

        let (outcome, caret) = match action {
            Action::ToggleFormat(format) => {
                let result = toggle_format(doc, root, selection, &format)?;
                format_result(result)
            }
            Action::ClearFormat => format_result(clear_formatting(doc, root, selection)?),
            Action::Align(alignment) => match set_alignment(doc, root, selection, alignment)? {
                Some(_) => (Outcome::Aligned, None),
                None => (Outcome::Unchanged, None),
            },
            Action::Heading(level) => retag(set_block_kind(doc, root, selection, BlockKind::Heading(level))?),
            Action::Paragraph => retag(set_block_kind(doc, root, selection, BlockKind::Paragraph)?),
            Action::List(kind) => inserted(insert_list(doc, root, selection, kind)?),
            Action::Link(address) => {
                inserted(insert_link(doc, root, selection, &address, None, &self.policy)?)
            }
            Action::Image(src) => inserted(insert_image(doc, root, selection, &src, None, &self.policy)?),
            Action::Table { rows, cols } => inserted(insert_table(
                doc,
                root,
                selection,
                rows,
                cols,
                self.config.max_table_size,
            )?),
            Action::Unlink => match remove_link(doc, root, selection)? {
                true => (Outcome::Removed, None),
                false => (Outcome::Unchanged, None),
            },
        };

        if outcome != Outcome::Unchanged {
            self.place_caret(caret, selection);
        }
        Ok(outcome)
    }

    /// Put the cursor where the engine asked for it, or back on the
    /// original selection
    fn place_caret(&mut self, caret: Option<Caret>, original: Selection) {
        let root = self.doc.root();
        let target = match caret {
            Some(Caret::Point(point)) => offset_of_point(&self.doc, root, point).map(Selection::collapsed),
            Some(Caret::Offset(offset)) => Some(Selection::collapsed(offset)),
            None => Some(original),
        };
        if let Some(target) = target {
            if !restore(&self.doc, root, self.selection.as_mut(), target) {
                debug!(?target, "caret could not be placed");
            }
        }
    }

    /// Replace the selection with typed text
    pub fn insert_text(&mut self, text: &str) -> Result<Outcome, EditorError> {
        let Some(selection) = self.selection() else {
            return Ok(Outcome::Unchanged);
        };
        let root = self.doc.root();
        let caret = insert_text(&mut self.doc, root, selection, text)?;
        restore(&self.doc, root, self.selection.as_mut(), Selection::collapsed(caret));
        self.local_change();
        self.reclaim();
        Ok(Outcome::Inserted)
    }

    /// Compact the arena once detached slots outnumber attached nodes. The
    /// selection is carried across as offsets.
    fn reclaim(&mut self) {
        let live = self.doc.descendants(self.doc.root()).count();
        if self.doc.slot_count() <= live * 2 {
            return;
        }
        let selection = self.selection();
        self.doc.compact();

        let root = self.doc.root();
        let placed = selection.is_some_and(|s| restore(&self.doc, root, self.selection.as_mut(), s));
        if !placed {
            self.selection.set_current(None);
        }
        debug!(slots = self.doc.slot_count(), "compacted document");
    }

    /// Query whether `format` is active over the whole current selection
    pub fn query(&self, format: &InlineFormat) -> bool {
        self.selection()
            .is_some_and(|selection| query_format(&self.doc, self.doc.root(), selection, format))
    }

    pub fn active_formats(&self) -> FormatState {
        self.selection()
            .map(|selection| active_formats(&self.doc, self.doc.root(), selection))
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------
    // Synchronization
    // ---------------------------------------------------------------

    /// Content supplied by the host. Applied now, or held back while the
    /// user is editing.
    #[instrument(skip(self, markup), fields(bytes = markup.len()))]
    pub fn set_content(&mut self, markup: &str) -> Result<ContentUpdate, EditorError> {
        if markup == self.html() {
            debug!("content matches the surface, nothing to apply");
            return Ok(ContentUpdate::Unchanged);
        }
        let doc = parse_with_root(markup, &self.config.root_tag)?;

        match self.sync.receive_external(markup.to_string()) {
            ExternalContent::Deferred => Ok(ContentUpdate::Deferred),
            ExternalContent::Apply(_) => {
                self.apply_external(doc);
                Ok(ContentUpdate::Applied)
            }
        }
    }

    pub fn focus(&mut self) {
        self.sync.focus();
    }

    /// Leave focus and apply any content held back meanwhile
    pub fn blur(&mut self) -> Result<ContentUpdate, EditorError> {
        let Some(markup) = self.sync.blur() else {
            return Ok(ContentUpdate::Unchanged);
        };
        if markup == self.html() {
            return Ok(ContentUpdate::Unchanged);
        }
        let doc = parse_with_root(&markup, &self.config.root_tag)?;
        self.apply_external(doc);
        Ok(ContentUpdate::Applied)
    }

    /// Fire the change callback if the debounce window has passed
    pub fn tick(&mut self) -> bool {
        match self.sync.poll() {
            Some(markup) => {
                self.emit(&markup);
                true
            }
            None => false,
        }
    }

    /// Fire the change callback now if a change is pending
    pub fn flush(&mut self) -> bool {
        match self.sync.flush() {
            Some(markup) => {
                self.emit(&markup);
                true
            }
            None => false,
        }
    }

    pub fn has_pending_change(&self) -> bool {
        self.sync.has_pending()
    }

    fn local_change(&mut self) {
        let markup = self.html();
        self.sync.local_change(markup);
    }

    fn emit(&mut self, markup: &str) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(markup);
        }
    }

    fn apply_external(&mut self, doc: Document) {
        info!("applying external content");
        self.replace_document(doc);
    }

    /// Swap in a new tree under the guard and find the old selection in it
    /// by content
    fn replace_document(&mut self, doc: Document) {
        let old_text = self.text();
        let old_selection = self.selection();

        if let Some(pending) = self.sync.begin_external() {
            self.emit(&pending);
        }
        self.doc = doc;

        let root = self.doc.root();
        let relocated = old_selection.and_then(|old| relocate(&old_text, old, &self.text()));
        let placed = match relocated {
            Some(selection) => restore(&self.doc, root, self.selection.as_mut(), selection),
            None => false,
        };
        if !placed {
            self.selection.set_current(None);
        }

        self.sync.end_external();
    }
}

fn format_result(result: FormatOutcome) -> (Outcome, Option<Caret>) {
    let outcome = match result.toggle {
        Toggle::Applied => Outcome::Applied,
        Toggle::Removed => Outcome::Removed,
        Toggle::Unchanged => Outcome::Unchanged,
    };
    (outcome, result.caret)
}

fn retag(block: Option<NodeId>) -> (Outcome, Option<Caret>) {
    match block {
        Some(_) => (Outcome::Applied, None),
        None => (Outcome::Unchanged, None),
    }
}

fn inserted(caret: Point) -> (Outcome, Option<Caret>) {
    (Outcome::Inserted, Some(Caret::Point(caret)))
}
