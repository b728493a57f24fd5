//! Toolbar commands and the channel that carries them to the editor.
//!
//! Hosts send loosely typed [`Command`] messages (JSON friendly); the
//! editor parses them into [`Action`]s. Anything that does not parse is
//! dropped with a debug log.

use crate::block::Alignment;
use crate::formatting::InlineFormat;
use crate::structure::ListKind;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use tracing::debug;

/// Color used by `highlight` when no value is given
pub const DEFAULT_HIGHLIGHT: &str = "yellow";

/// A named command as sent by a toolbar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Command {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            value: None,
        }
    }

    pub fn with_value(action: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            value: Some(value.into()),
        }
    }
}

/// A recognized command with its value parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ToggleFormat(InlineFormat),
    Align(Alignment),
    List(ListKind),
    Link(String),
    Unlink,
    Image(String),
    Table { rows: usize, cols: usize },
    Heading(u8),
    Paragraph,
    ClearFormat,
}

impl Action {
    /// Parse a command; `None` for unknown actions and missing or
    /// malformed values. Links and images always parse so that a missing
    /// address is rejected by validation instead of ignored.
    pub fn from_command(command: &Command) -> Option<Action> {
        let value = command.value.as_deref().map(str::trim);
        let required = || value.filter(|v| !v.is_empty()).map(str::to_string);

        let action = match command.action.as_str() {
            "bold" => Some(Action::ToggleFormat(InlineFormat::bold())),
            "italic" => Some(Action::ToggleFormat(InlineFormat::italic())),
            "underline" => Some(Action::ToggleFormat(InlineFormat::underline())),
            "strikethrough" => Some(Action::ToggleFormat(InlineFormat::strikethrough())),
            "color" => required().map(|v| Action::ToggleFormat(InlineFormat::color(v))),
            "highlight" => Some(Action::ToggleFormat(InlineFormat::highlight(
                required().unwrap_or_else(|| DEFAULT_HIGHLIGHT.to_string()),
            ))),
            "font-size" => required().map(|v| Action::ToggleFormat(InlineFormat::font_size(v))),
            "font-family" => required().map(|v| Action::ToggleFormat(InlineFormat::font_family(v))),
            "bullet-list" => Some(Action::List(ListKind::Bullet)),
            "ordered-list" => Some(Action::List(ListKind::Ordered)),
            "link" => Some(Action::Link(value.unwrap_or_default().to_string())),
            "unlink" => Some(Action::Unlink),
            "image" => Some(Action::Image(value.unwrap_or_default().to_string())),
            "table" => value.and_then(parse_table_size).map(|(rows, cols)| Action::Table { rows, cols }),
            "heading" => value.and_then(|v| v.parse().ok()).map(Action::Heading),
            "paragraph" => Some(Action::Paragraph),
            "clear-format" => Some(Action::ClearFormat),
            other => other
                .strip_prefix("align-")
                .and_then(|a| a.parse().ok())
                .map(Action::Align),
        };

        if action.is_none() {
            debug!(action = %command.action, value = ?command.value, "ignoring command");
        }
        action
    }

    /// True for actions that need a non-collapsed selection to do anything
    pub fn needs_range(&self) -> bool {
        matches!(self, Action::ToggleFormat(_) | Action::Unlink | Action::ClearFormat)
    }
}

/// `"3x4"` → `(3, 4)`
fn parse_table_size(value: &str) -> Option<(usize, usize)> {
    let (rows, cols) = value.split_once(['x', 'X'])?;
    Some((rows.trim().parse().ok()?, cols.trim().parse().ok()?))
}

/// Sending half of the command channel, held by the toolbar
#[derive(Debug, Clone)]
pub struct CommandSender {
    inner: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Queue a command. Returns `false` once the editor is gone.
    pub fn send(&self, command: Command) -> bool {
        self.inner.send(command).is_ok()
    }
}

/// Receiving half, owned by the editor
#[derive(Debug)]
pub struct CommandReceiver {
    inner: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Every queued command, in the order sent
    pub fn drain(&self) -> Vec<Command> {
        self.inner.try_iter().collect()
    }
}

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel();
    (CommandSender { inner: tx }, CommandReceiver { inner: rx })
}
