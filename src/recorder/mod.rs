//! Interaction recording.
//!
//! This module provides:
//! - An event-driven recorder turning page interaction into action steps
//! - Debouncing/coalescing of text edits and scrolling
//! - Session assembly of steps and parameters into a tool definition

pub mod action_recorder;
pub mod session;

pub use action_recorder::{ActionRecorder, RecorderEvent, RecorderState};
pub use session::RecordingSession;
