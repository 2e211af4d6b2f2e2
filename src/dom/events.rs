//! Synthetic page events fed into the capture core.
//!
//! The host (extension content script, test harness) translates live DOM
//! events into these. Timestamps are caller-supplied milliseconds so the
//! debounce windows are deterministic.

use super::node::NodeId;

/// A raw page interaction, as delivered by the host's DOM listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// `click` on an element.
    Click { target: NodeId, at_ms: u64 },
    /// `input` on a text control (current value, not the delta).
    Input {
        target: NodeId,
        value: String,
        at_ms: u64,
    },
    /// `change` on a control; for `<select>` this carries the chosen value.
    Change {
        target: NodeId,
        value: String,
        at_ms: u64,
    },
    /// Window scroll to absolute `y`.
    Scroll { y: i32, at_ms: u64 },
    /// The page is about to unload. Deliberately produces no step.
    BeforeUnload { at_ms: u64 },
}

impl PageEvent {
    pub fn at_ms(&self) -> u64 {
        match self {
            PageEvent::Click { at_ms, .. }
            | PageEvent::Input { at_ms, .. }
            | PageEvent::Change { at_ms, .. }
            | PageEvent::Scroll { at_ms, .. }
            | PageEvent::BeforeUnload { at_ms } => *at_ms,
        }
    }
}
