//! Cross-field frame context threaded explicitly through the header codecs:
//! every later header field that depends on an earlier one reads it off a
//! `FrameState` value instead of a global.

use crate::enums::{FrameType, InterpolationFilter, ReferenceMode, TxMode};

#[derive(Debug, Clone)]
pub struct FrameState {
    pub profile: u8,
    pub frame_type: FrameType,
    pub show_existing_frame: bool,
    pub frame_is_intra: bool,
    pub lossless: bool,
    pub interpolation_filter: InterpolationFilter,
    pub allow_high_precision_mv: bool,
    pub compound_reference_allowed: bool,
    pub reference_mode: ReferenceMode,
    pub tx_mode: TxMode,
    pub header_size_in_bytes: u16,

    pub frame_width: u32,
    pub frame_height: u32,
    pub mi_cols: u32,
    pub mi_rows: u32,
    pub sb64_cols: u32,
    pub sb64_rows: u32,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            profile: 0,
            frame_type: FrameType::Key,
            show_existing_frame: false,
            frame_is_intra: true,
            lossless: false,
            interpolation_filter: InterpolationFilter::EightTap,
            allow_high_precision_mv: false,
            compound_reference_allowed: false,
            reference_mode: ReferenceMode::SingleReference,
            tx_mode: TxMode::Only4x4,
            header_size_in_bytes: 0,
            frame_width: 0,
            frame_height: 0,
            mi_cols: 0,
            mi_rows: 0,
            sb64_cols: 0,
            sb64_rows: 0,
        }
    }
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute `mi_cols`/`mi_rows`/`sb64_cols`/`sb64_rows` from
    /// `frame_width`/`frame_height`. Must be called whenever the frame size
    /// changes (`frame_size`, `frame_size_with_refs`).
    pub fn update_image_size(&mut self) {
        self.mi_cols = (self.frame_width + 7) >> 3;
        self.mi_rows = (self.frame_height + 7) >> 3;
        self.sb64_cols = (self.mi_cols + 7) >> 3;
        self.sb64_rows = (self.mi_rows + 7) >> 3;
    }

    pub fn set_frame_size(&mut self, width: u32, height: u32) {
        self.frame_width = width;
        self.frame_height = height;
        self.update_image_size();
    }

    /// The smallest `log2`of tile columns allowed for the current frame size.
    pub fn min_log2_tile_cols(&self) -> u32 {
        let mut min_log2 = 0u32;
        while (crate::consts::MAX_TILE_WIDTH_B64 << min_log2) < self.sb64_cols {
            min_log2 += 1;
        }
        min_log2
    }

    /// The largest `log2` of tile columns allowed for the current frame size.
    pub fn max_log2_tile_cols(&self) -> u32 {
        let mut max_log2 = 1u32;
        while (self.sb64_cols >> max_log2) >= crate::consts::MIN_TILE_WIDTH_B64 {
            max_log2 += 1;
        }
        max_log2 - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_rounds_up_to_mode_info_blocks() {
        let mut state = FrameState::new();
        state.set_frame_size(65, 64);
        assert_eq!(state.mi_cols, 9);
        assert_eq!(state.mi_rows, 8);
        assert_eq!(state.sb64_cols, 2);
        assert_eq!(state.sb64_rows, 1);
    }

    #[test]
    fn tile_log2_bounds_hold_for_small_frame() {
        let mut state = FrameState::new();
        state.set_frame_size(256, 256);
        assert!(state.min_log2_tile_cols() <= state.max_log2_tile_cols());
    }
}
