/// Capture tuning knobs shared by the recorder and picker.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Debounce window for text input, per target element (ms)
    pub input_debounce_ms: u64,

    /// Debounce window for scroll events (ms)
    pub scroll_debounce_ms: u64,

    /// Scroll deltas below this are discarded as noise (px)
    pub scroll_noise_px: u32,

    /// Minimum same-tag sibling count to form a list candidate group
    pub min_group_size: usize,

    /// Groups without a shared class need at least this many members
    pub loose_group_min: usize,

    /// Minimum rendered size for a list member to survive filtering (px)
    pub min_item_width: i32,
    pub min_item_height: i32,

    /// List-mode preview depth (items)
    pub preview_items: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            input_debounce_ms: 500,
            scroll_debounce_ms: 300,
            scroll_noise_px: 50,
            min_group_size: 3,
            loose_group_min: 5,
            min_item_width: 30,
            min_item_height: 20,
            preview_items: 3,
        }
    }
}
