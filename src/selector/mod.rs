//! Selector generation and matching.

pub mod engine;
pub mod matcher;

pub use engine::{
    element_label, generate_selector, generate_xpath, is_qualifying_class, relative_selector,
    structural_path,
};
pub use matcher::{
    count_matches, matches, query_selector, query_selector_all, Selector, SelectorParseError,
};
