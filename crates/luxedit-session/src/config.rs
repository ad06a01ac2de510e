//! Session configuration.

use luxedit_core::ResizeFilter;
use serde::{Deserialize, Serialize};

/// Tunables for an editing session. Every field has a working default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest edge of the interactive preview, in pixels.
    pub preview_max_edge: u32,
    /// Snapshots kept for undo.
    pub history_limit: usize,
    /// Debounced saves this soon after an undo/redo are dropped.
    pub history_debounce_ms: u64,
    /// Resampling for the preview stage.
    pub preview_filter: ResizeFilter,
    /// Resampling for the full-resolution stage.
    pub full_filter: ResizeFilter,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_max_edge: 1000,
            history_limit: 100,
            history_debounce_ms: 500,
            preview_filter: ResizeFilter::Bilinear,
            full_filter: ResizeFilter::Lanczos3,
        }
    }
}
