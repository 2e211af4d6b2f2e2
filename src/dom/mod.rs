//! In-memory DOM model for the capture core.
//!
//! The live browser DOM is an external collaborator; this module provides the
//! deterministic stand-in the selector engine, recorder and picker operate
//! on: a node arena parsed from an XML page snapshot, plus the synthetic
//! event stream the recorder consumes.

pub mod events;
pub mod node;
pub mod snapshot;

pub use events::PageEvent;
pub use node::{Document, Element, NodeId, Position, Rect};
pub use snapshot::parse_snapshot;
