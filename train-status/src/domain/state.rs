//! Display-ready route state and the published status snapshot.

use serde::Serialize;

/// Suffix appended to a route title when a failed cycle re-serves the
/// previous good state instead of an error.
pub const STALE_MARKER: &str = " ⚠";

/// Text published before the first cycle and after an optimistic reset.
pub const LOADING_TEXT: &str = "Loading train info…";

/// Two-line rendering of one service, as consumed by list-style displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    pub line1: String,
    pub line2: String,
}

/// Display state for one route.
///
/// Immutable once built; each poll cycle replaces the whole value. The
/// entry list is bounded by the formatter, and `empty_message` is what a
/// display shows when `entries` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteState {
    pub title: String,
    pub entries: Vec<ServiceEntry>,
    pub empty_message: String,
}

impl RouteState {
    /// Placeholder state shown until the first fetch completes.
    pub fn loading(title: impl Into<String>) -> Self {
        Self::message(title, "Loading…")
    }

    /// Empty state carrying an explanatory message.
    pub fn message(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
            empty_message: message.into(),
        }
    }

    /// Returns this state with the stale marker on its title.
    ///
    /// Idempotent: re-marking an already marked state changes nothing, so
    /// consecutive failed cycles do not grow the title.
    pub fn with_stale_marker(mut self) -> Self {
        if !self.title.ends_with(STALE_MARKER) {
            self.title.push_str(STALE_MARKER);
        }
        self
    }

    /// Plain-text rendering: title line, then blank-line-separated blocks,
    /// or the empty message when there are no entries.
    pub fn to_text(&self) -> String {
        if self.entries.is_empty() {
            return format!("{}\n{}", self.title, self.empty_message);
        }
        let blocks: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}\n{}", e.line1, e.line2))
            .collect();
        format!("{}\n{}", self.title, blocks.join("\n\n"))
    }
}

/// Broad classification of the published status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKind {
    Loading,
    Ok,
    Error,
}

/// The value the poller publishes after every cycle: the combined text
/// for all routes plus a kind tag, so consumers never have to sniff the
/// text to know whether the last cycle failed.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusSnapshot {
    pub fn loading() -> Self {
        Self {
            text: LOADING_TEXT.to_string(),
            kind: StatusKind::Loading,
        }
    }
}
