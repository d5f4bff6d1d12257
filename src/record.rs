//! The structured record tree the mutator produces and the parser recovers.
//!
//! Every struct here is the concrete stand-in for the schema layer's typed
//! accessors: plain fields instead of getters, `Option`/`Vec` instead of
//! "present?" probes and `size()/at(i)`. Anything the record leaves absent
//! where the header codec expects a value is padded with its VP9 zero
//! default at encode time.

use serde::{Deserialize, Serialize};

use crate::enums::{ColorSpace, FrameType, InterpolationFilter, TxMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VP9SignedInteger {
    pub magnitude: u32,
    pub sign: bool,
}

impl VP9SignedInteger {
    pub fn new(value: i64) -> Self {
        Self {
            magnitude: value.unsigned_abs() as u32,
            sign: value < 0,
        }
    }

    pub fn value(&self) -> i64 {
        let v = self.magnitude as i64;
        if self.sign {
            -v
        } else {
            v
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorConfig {
    pub ten_or_twelve_bit: bool,
    pub color_space: ColorSpace,
    pub color_range: bool,
    pub subsampling_x: bool,
    pub subsampling_y: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub frame_width: u32,
    pub frame_height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSize {
    pub render_and_frame_size_different: bool,
    pub render_width: u32,
    pub render_height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSizeWithRefs {
    pub found_ref: [bool; 3],
    pub frame_size: FrameSize,
    pub render_size: RenderSize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopFilterParams {
    pub loop_filter_level: u8,
    pub loop_filter_sharpness: u8,
    pub loop_filter_delta_enabled: bool,
    pub loop_filter_delta_update: bool,
    pub ref_deltas: [Option<VP9SignedInteger>; 4],
    pub mode_deltas: [Option<VP9SignedInteger>; 2],
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuantizationParams {
    pub base_q_idx: u8,
    pub delta_q_y_dc: Option<VP9SignedInteger>,
    pub delta_q_uv_dc: Option<VP9SignedInteger>,
    pub delta_q_uv_ac: Option<VP9SignedInteger>,
}

impl QuantizationParams {
    /// Lossless iff `base_q_idx == 0` and all three deltas are absent
    /// (empty magnitude).
    pub fn is_lossless(&self) -> bool {
        self.base_q_idx == 0
            && self.delta_q_y_dc.is_none()
            && self.delta_q_uv_dc.is_none()
            && self.delta_q_uv_ac.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SegmentationFeature {
    pub feature_enabled: bool,
    pub feature_value: Option<VP9SignedInteger>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationParams {
    pub segmentation_enabled: bool,
    pub segmentation_update_map: bool,
    pub tree_probs: Vec<Option<u8>>,
    pub segmentation_temporal_update: bool,
    pub pred_probs: Vec<Option<u8>>,
    pub segmentation_update_data: bool,
    pub segmentation_abs_or_delta_update: bool,
    /// Outer index is the segment id (0..8), inner is the feature id
    /// (0..SEG_LVL_MAX).
    pub features: Vec<[SegmentationFeature; crate::consts::SEG_LVL_MAX]>,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            segmentation_enabled: false,
            segmentation_update_map: false,
            tree_probs: Vec::new(),
            segmentation_temporal_update: false,
            pred_probs: Vec::new(),
            segmentation_update_data: false,
            segmentation_abs_or_delta_update: false,
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TileInfo {
    /// Desired `tile_cols_log2`; clamped at encode time to
    /// `[min_log2_tile_cols, max_log2_tile_cols]` for the frame's
    /// `Sb64Cols`.
    pub tile_cols_log2: u32,
    /// Final `tile_rows_log2` value (0, 1, or 2); bits 1 (presence) and 2
    /// (increment) are derived from it.
    pub tile_rows_log2: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UncompressedHeader {
    pub profile_low_bit: u8,
    pub profile_high_bit: u8,

    pub show_existing_frame: bool,
    pub frame_to_show_map_idx: u8,

    pub frame_type: FrameType,
    pub show_frame: bool,
    pub error_resilient_mode: bool,

    pub intra_only: bool,
    pub reset_frame_context: u8,
    pub refresh_frame_flags: u8,
    pub ref_frame_idx: [u8; 3],
    pub ref_frame_sign_bias: [bool; 3],

    pub color_config: Option<ColorConfig>,
    pub frame_size: Option<FrameSize>,
    pub render_size: Option<RenderSize>,
    pub frame_size_with_refs: Option<FrameSizeWithRefs>,

    pub allow_high_precision_mv: bool,
    pub interpolation_filter: InterpolationFilter,

    pub refresh_entropy_probs: bool,
    pub frame_parallel_decoding_mode: bool,
    pub frame_context_idx: u8,

    pub loop_filter_params: LoopFilterParams,
    pub quantization_params: QuantizationParams,
    pub segmentation_params: SegmentationParams,
    pub tile_info: TileInfo,
}

/// A single `update_prob`/`DecodeTermSubexp` pair. The record only
/// carries the decoded delta value; the subexp bit-packing itself is a wire
/// format detail of the compressed-header codec, not part of the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffUpdateProb {
    pub update_prob: bool,
    pub delta: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoefProbUpdate {
    pub update_probs: bool,
    pub probs: Vec<DiffUpdateProb>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MvProbEntry {
    pub update_mv_prob: bool,
    pub mv_prob: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameReferenceMode {
    pub non_single_reference: bool,
    pub reference_select: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressedHeader {
    /// Desired final `tx_mode`; forced to `ONLY_4X4` at encode time when the
    /// frame is lossless.
    pub tx_mode: TxMode,
    pub tx_mode_probs: Vec<DiffUpdateProb>,
    /// Indexed by `tx_size` from `TX_4X4` up to
    /// `tx_mode_to_biggest_tx_size[tx_mode]`.
    pub coef_probs: Vec<CoefProbUpdate>,
    pub skip_prob: Vec<DiffUpdateProb>,

    pub inter_mode_probs: Vec<DiffUpdateProb>,
    pub interp_filter_probs: Vec<DiffUpdateProb>,
    pub is_inter_probs: Vec<DiffUpdateProb>,
    pub frame_reference_mode: FrameReferenceMode,
    pub frame_reference_mode_probs: Vec<DiffUpdateProb>,
    pub y_mode_probs: Vec<DiffUpdateProb>,
    pub partition_probs: Vec<DiffUpdateProb>,
    pub mv_probs: Vec<MvProbEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tile {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VP9Frame {
    pub uncompressed_header: UncompressedHeader,
    /// Absent iff `show_existing_frame`.
    pub compressed_header: Option<CompressedHeader>,
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub frames: Vec<VP9Frame>,
}
