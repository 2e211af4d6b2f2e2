//! Interactive element picking.
//!
//! This module provides:
//! - Auto-detection of repeating list structures on the page
//! - Automatic field discovery inside a picked item
//! - The pick state machine producing extract steps with live previews
//! - Overlay decorations scoped to the pick and fully reverted on exit

pub mod detect;
pub mod element_picker;
pub mod fields;
pub mod overlay;

pub use detect::{detect_list_groups, CandidateGroup};
pub use element_picker::{ElementPicker, PickerEvent, PickerMode};
pub use fields::detect_fields;
