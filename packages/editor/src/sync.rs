//! # Content Synchronizer
//!
//! Decides when serialized markup leaves the editor and when external
//! markup may come in.
//!
//! ```text
//!              local change                    poll (deadline passed)
//!   Idle ─────────────────────▶ PendingEmit ───────────────────────▶ Idle (emit)
//!    │                           │  ▲  │
//!    │                           │  └──┘ local change (timer reset)
//!    │ begin_external            │ begin_external (pending markup flushed)
//!    ▼                           ▼
//!   ApplyingExternal ◀───────────┘
//!    │  local changes are ignored here
//!    └──── end_external ────▶ Idle
//! ```
//!
//! Outbound changes are debounced: each local change replaces the pending
//! markup and pushes the deadline out, so a burst of edits produces one
//! emission carrying the final state.
//!
//! Inbound content that arrives while the surface has focus and has been
//! edited since gaining it is held back until `blur`; only the latest held
//! content is kept.

use crate::clock::Clock;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// External content is being written into the tree
    ApplyingExternal,
    /// A local change waits for its quiet period to pass
    PendingEmit { deadline: Instant, markup: String },
}

/// What to do with content supplied by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalContent {
    /// Write it into the tree now
    Apply(String),
    /// Held until focus is lost
    Deferred,
}

pub struct Synchronizer {
    state: SyncState,
    window: Duration,
    clock: Box<dyn Clock>,
    focused: bool,
    edited_since_focus: bool,
    deferred: Option<String>,
}

impl Synchronizer {
    pub fn new(window: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            state: SyncState::Idle,
            window,
            clock: Box::new(clock),
            focused: false,
            edited_since_focus: false,
            deferred: None,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn has_pending(&self) -> bool {
        matches!(self.state, SyncState::PendingEmit { .. })
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// When the pending markup becomes due
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            SyncState::PendingEmit { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Record a local edit. Returns `false` when it was ignored because
    /// external content is being applied.
    pub fn local_change(&mut self, markup: String) -> bool {
        if self.state == SyncState::ApplyingExternal {
            debug!("ignoring change raised while applying external content");
            return false;
        }
        if self.focused {
            self.edited_since_focus = true;
        }
        let deadline = self.clock.now() + self.window;
        self.state = SyncState::PendingEmit { deadline, markup };
        true
    }

    /// Emit the pending markup if its deadline has passed
    pub fn poll(&mut self) -> Option<String> {
        let due = matches!(
            &self.state,
            SyncState::PendingEmit { deadline, .. } if self.clock.now() >= *deadline
        );
        if due {
            self.take_pending()
        } else {
            None
        }
    }

    /// Emit the pending markup now, deadline or not
    pub fn flush(&mut self) -> Option<String> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<String> {
        if !self.has_pending() {
            return None;
        }
        match std::mem::replace(&mut self.state, SyncState::Idle) {
            SyncState::PendingEmit { markup, .. } => {
                info!(bytes = markup.len(), "emitting change");
                Some(markup)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Decide whether host content can be applied right away
    pub fn receive_external(&mut self, markup: String) -> ExternalContent {
        if self.focused && self.edited_since_focus {
            debug!("deferring external content until blur");
            self.deferred = Some(markup);
            return ExternalContent::Deferred;
        }
        ExternalContent::Apply(markup)
    }

    /// Enter the guarded state. Returns pending local markup, which must be
    /// delivered before the external content replaces it.
    pub fn begin_external(&mut self) -> Option<String> {
        let flushed = self.take_pending();
        self.state = SyncState::ApplyingExternal;
        flushed
    }

    pub fn end_external(&mut self) {
        if self.state == SyncState::ApplyingExternal {
            self.state = SyncState::Idle;
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.edited_since_focus = false;
    }

    /// Leave focus. Returns external content held back while focused.
    pub fn blur(&mut self) -> Option<String> {
        self.focused = false;
        self.edited_since_focus = false;
        self.deferred.take()
    }
}
