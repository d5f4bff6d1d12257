//! The bit-packed uncompressed header: no Boolean coding, strictly
//! ordered fields with branches driven by `FrameState`.

use crate::bitcode::{BitReader, BitWriter};
use crate::consts::{FRAME_SYNC_CODE, SEG_LVL_MAX, SEGMENTATION_FEATURE_BITS, SEGMENTATION_FEATURE_SIGNED};
use crate::enums::{ColorSpace, FrameType, InterpolationFilter};
use crate::error::Result;
use crate::record::{
    ColorConfig, FrameSize, FrameSizeWithRefs, LoopFilterParams, QuantizationParams, RenderSize,
    SegmentationFeature, SegmentationParams, TileInfo, UncompressedHeader, VP9SignedInteger,
};
use crate::state::FrameState;

fn write_signed(bw: &mut BitWriter, value: VP9SignedInteger, width: u32) {
    bw.write_bits(value.magnitude as u64, width);
    bw.write_bit(value.sign);
}

fn read_signed(br: &mut BitReader, width: u32, field: &'static str) -> Result<VP9SignedInteger> {
    let magnitude = br.read_uint(width, field)? as u32;
    let sign = br.read_bit(field)?;
    Ok(VP9SignedInteger { magnitude, sign })
}

/// Encodes the uncompressed header and leaves a 16-bit zero placeholder for
/// `header_size_in_bytes`, returning its bit position so the caller can
/// patch it once the compressed header's size is known.
pub fn encode(
    bw: &mut BitWriter,
    hdr: &UncompressedHeader,
    state: &mut FrameState,
) -> Result<Option<usize>> {
    bw.write_bits(2, 2); // frame_marker

    bw.write_bits(hdr.profile_low_bit as u64, 1);
    bw.write_bits(hdr.profile_high_bit as u64, 1);
    let profile = ((hdr.profile_high_bit as u32) << 1) | hdr.profile_low_bit as u32;
    state.profile = profile as u8;

    if profile == 3 {
        bw.write_bit(false); // reserved_zero
    }

    bw.write_bit(hdr.show_existing_frame);
    if hdr.show_existing_frame {
        bw.write_bits(hdr.frame_to_show_map_idx as u64, 3);
        state.header_size_in_bytes = 0;
        return Ok(None);
    }

    bw.write_bit(hdr.frame_type == FrameType::Inter);
    bw.write_bit(hdr.show_frame);
    bw.write_bit(hdr.error_resilient_mode);
    state.frame_type = hdr.frame_type;

    let intra_only;
    if hdr.frame_type == FrameType::Key {
        state.frame_is_intra = true;
        intra_only = true;
        bw.write_bits(FRAME_SYNC_CODE as u64, 24);
        encode_color_config(bw, profile, hdr.color_config.as_ref(), state);
        let fs = hdr.frame_size.unwrap_or_default();
        encode_frame_size(bw, fs, state);
        let rs = hdr.render_size.unwrap_or_default();
        encode_render_size(bw, rs);
    } else {
        intra_only = if !hdr.show_frame { hdr.intra_only } else { false };
        if !hdr.show_frame {
            bw.write_bit(hdr.intra_only);
        }
        state.frame_is_intra = intra_only;

        if !hdr.error_resilient_mode {
            bw.write_bits(hdr.reset_frame_context as u64, 2);
        }

        if intra_only {
            bw.write_bits(FRAME_SYNC_CODE as u64, 24);
            if profile > 0 {
                encode_color_config(bw, profile, hdr.color_config.as_ref(), state);
            }
            bw.write_bits(hdr.refresh_frame_flags as u64, 8);
            let fs = hdr.frame_size.unwrap_or_default();
            encode_frame_size(bw, fs, state);
            let rs = hdr.render_size.unwrap_or_default();
            encode_render_size(bw, rs);
        } else {
            bw.write_bits(hdr.refresh_frame_flags as u64, 8);
            for i in 0..3 {
                bw.write_bits(hdr.ref_frame_idx[i] as u64, 3);
                bw.write_bit(hdr.ref_frame_sign_bias[i]);
            }
            state.compound_reference_allowed = (1..3)
                .any(|i| hdr.ref_frame_sign_bias[i] != hdr.ref_frame_sign_bias[0]);

            let refs = hdr.frame_size_with_refs.clone().unwrap_or_default();
            encode_frame_size_with_refs(bw, &refs, state);

            bw.write_bit(hdr.allow_high_precision_mv);
            encode_interpolation_filter(bw, hdr.interpolation_filter, state);
        }
    }

    if !hdr.error_resilient_mode {
        bw.write_bit(hdr.refresh_entropy_probs);
        bw.write_bit(hdr.frame_parallel_decoding_mode);
    }

    bw.write_bits(hdr.frame_context_idx as u64, 2);

    encode_loop_filter_params(bw, &hdr.loop_filter_params);
    encode_quantization_params(bw, &hdr.quantization_params);
    state.lossless = hdr.quantization_params.is_lossless();
    encode_segmentation_params(bw, &hdr.segmentation_params);
    encode_tile_info(bw, &hdr.tile_info, state);

    let marker = bw.bit_pos();
    bw.write_bits(0, 16); // header_size_in_bytes placeholder
    Ok(Some(marker))
}

fn encode_color_config(bw: &mut BitWriter, profile: u32, cc: Option<&ColorConfig>, state: &mut FrameState) {
    let default = ColorConfig::default();
    let cc = cc.unwrap_or(&default);
    if profile >= 2 {
        bw.write_bit(cc.ten_or_twelve_bit);
    }
    bw.write_bits(cc.color_space.as_bits() as u64, 3);
    if cc.color_space != ColorSpace::CsRgb {
        bw.write_bit(cc.color_range);
        if profile == 1 || profile == 3 {
            bw.write_bit(cc.subsampling_x);
            bw.write_bit(cc.subsampling_y);
            bw.write_bit(false); // reserved_zero
        }
    } else if profile == 1 || profile == 3 {
        bw.write_bit(false); // reserved_zero
    }
    let _ = state;
}

fn encode_frame_size(bw: &mut BitWriter, fs: FrameSize, state: &mut FrameState) {
    let width_m1 = fs.frame_width.saturating_sub(1);
    let height_m1 = fs.frame_height.saturating_sub(1);
    bw.write_bits(width_m1 as u64, 16);
    bw.write_bits(height_m1 as u64, 16);
    state.set_frame_size(fs.frame_width, fs.frame_height);
}

fn encode_render_size(bw: &mut BitWriter, rs: RenderSize) {
    bw.write_bit(rs.render_and_frame_size_different);
    if rs.render_and_frame_size_different {
        bw.write_bits(rs.render_width.saturating_sub(1) as u64, 16);
        bw.write_bits(rs.render_height.saturating_sub(1) as u64, 16);
    }
}

fn encode_frame_size_with_refs(bw: &mut BitWriter, refs: &FrameSizeWithRefs, state: &mut FrameState) {
    for i in 0..3 {
        bw.write_bit(refs.found_ref[i]);
    }
    if refs.found_ref.iter().all(|&f| !f) {
        encode_frame_size(bw, refs.frame_size, state);
    }
    encode_render_size(bw, refs.render_size);
}

fn encode_interpolation_filter(bw: &mut BitWriter, filter: InterpolationFilter, state: &mut FrameState) {
    let switchable = filter == InterpolationFilter::Switchable;
    bw.write_bit(switchable);
    if switchable {
        state.interpolation_filter = InterpolationFilter::Switchable;
    } else {
        bw.write_bits(filter.as_raw() as u64, 2);
        state.interpolation_filter = filter;
    }
}

fn encode_loop_filter_params(bw: &mut BitWriter, lf: &LoopFilterParams) {
    bw.write_bits(lf.loop_filter_level as u64, 6);
    bw.write_bits(lf.loop_filter_sharpness as u64, 3);
    bw.write_bit(lf.loop_filter_delta_enabled);
    if lf.loop_filter_delta_enabled {
        bw.write_bit(lf.loop_filter_delta_update);
        if lf.loop_filter_delta_update {
            for slot in &lf.ref_deltas {
                bw.write_bit(slot.is_some());
                if let Some(v) = slot {
                    write_signed(bw, *v, 6);
                }
            }
            for slot in &lf.mode_deltas {
                bw.write_bit(slot.is_some());
                if let Some(v) = slot {
                    write_signed(bw, *v, 6);
                }
            }
        }
    }
}

fn encode_quantization_params(bw: &mut BitWriter, q: &QuantizationParams) {
    bw.write_bits(q.base_q_idx as u64, 8);
    for delta in [q.delta_q_y_dc, q.delta_q_uv_dc, q.delta_q_uv_ac] {
        bw.write_bit(delta.is_some());
        if let Some(v) = delta {
            write_signed(bw, v, 4);
        }
    }
}

fn encode_segmentation_params(bw: &mut BitWriter, seg: &SegmentationParams) {
    bw.write_bit(seg.segmentation_enabled);
    if !seg.segmentation_enabled {
        return;
    }
    bw.write_bit(seg.segmentation_update_map);
    if seg.segmentation_update_map {
        for i in 0..7 {
            let prob = seg.tree_probs.get(i).copied().flatten();
            bw.write_bit(prob.is_some());
            if let Some(p) = prob {
                bw.write_bits(p as u64, 8);
            }
        }
        bw.write_bit(seg.segmentation_temporal_update);
        if seg.segmentation_temporal_update {
            for i in 0..3 {
                let prob = seg.pred_probs.get(i).copied().flatten();
                bw.write_bit(prob.is_some());
                if let Some(p) = prob {
                    bw.write_bits(p as u64, 8);
                }
            }
        }
    }
    bw.write_bit(seg.segmentation_update_data);
    if seg.segmentation_update_data {
        bw.write_bit(seg.segmentation_abs_or_delta_update);
        for s in 0..8 {
            let default_row = [SegmentationFeature::default(); SEG_LVL_MAX];
            let row = seg.features.get(s).copied().unwrap_or(default_row);
            for j in 0..SEG_LVL_MAX {
                let feature = row[j];
                bw.write_bit(feature.feature_enabled);
                if feature.feature_enabled {
                    let bits = SEGMENTATION_FEATURE_BITS[j] as u32;
                    let value = feature.feature_value.unwrap_or_default();
                    bw.write_bits(value.magnitude as u64, bits);
                    if SEGMENTATION_FEATURE_SIGNED[j] {
                        bw.write_bit(value.sign);
                    }
                }
            }
        }
    }
}

fn encode_tile_info(bw: &mut BitWriter, tile_info: &TileInfo, state: &FrameState) {
    let min_log2 = state.min_log2_tile_cols();
    let max_log2 = state.max_log2_tile_cols();
    let target = tile_info.tile_cols_log2.clamp(min_log2, max_log2);
    for _ in min_log2..target {
        bw.write_bit(true);
    }
    if target < max_log2 {
        bw.write_bit(false);
    }

    let rows_present = tile_info.tile_rows_log2 >= 1;
    bw.write_bit(rows_present);
    if rows_present {
        bw.write_bit(tile_info.tile_rows_log2 >= 2);
    }
}

/// Parses the uncompressed header, mirroring [`encode`] field for field.
pub fn parse(br: &mut BitReader, state: &mut FrameState) -> Result<UncompressedHeader> {
    let mut hdr = UncompressedHeader::default();

    let _frame_marker = br.read_uint(2, "frame_marker")?;

    hdr.profile_low_bit = br.read_uint(1, "profile_low_bit")? as u8;
    hdr.profile_high_bit = br.read_uint(1, "profile_high_bit")? as u8;
    let profile = ((hdr.profile_high_bit as u32) << 1) | hdr.profile_low_bit as u32;
    state.profile = profile as u8;

    if profile == 3 {
        let _reserved = br.read_uint(1, "reserved_zero")?;
    }

    hdr.show_existing_frame = br.read_bit("show_existing_frame")?;
    if hdr.show_existing_frame {
        hdr.frame_to_show_map_idx = br.read_uint(3, "frame_to_show_map_idx")? as u8;
        state.header_size_in_bytes = 0;
        return Ok(hdr);
    }

    hdr.frame_type = if br.read_bit("frame_type")? { FrameType::Inter } else { FrameType::Key };
    hdr.show_frame = br.read_bit("show_frame")?;
    hdr.error_resilient_mode = br.read_bit("error_resilient_mode")?;
    state.frame_type = hdr.frame_type;

    let intra_only;
    if hdr.frame_type == FrameType::Key {
        state.frame_is_intra = true;
        intra_only = true;
        let _sync = br.read_uint(24, "frame_sync_code")?;
        hdr.color_config = Some(parse_color_config(br, profile)?);
        let fs = parse_frame_size(br, state)?;
        hdr.frame_size = Some(fs);
        hdr.render_size = Some(parse_render_size(br)?);
    } else {
        intra_only = if !hdr.show_frame { br.read_bit("intra_only")? } else { false };
        hdr.intra_only = intra_only;
        state.frame_is_intra = intra_only;

        if !hdr.error_resilient_mode {
            hdr.reset_frame_context = br.read_uint(2, "reset_frame_context")? as u8;
        }

        if intra_only {
            let _sync = br.read_uint(24, "frame_sync_code")?;
            if profile > 0 {
                hdr.color_config = Some(parse_color_config(br, profile)?);
            }
            hdr.refresh_frame_flags = br.read_uint(8, "refresh_frame_flags")? as u8;
            let fs = parse_frame_size(br, state)?;
            hdr.frame_size = Some(fs);
            hdr.render_size = Some(parse_render_size(br)?);
        } else {
            hdr.refresh_frame_flags = br.read_uint(8, "refresh_frame_flags")? as u8;
            for i in 0..3 {
                hdr.ref_frame_idx[i] = br.read_uint(3, "ref_frame_idx")? as u8;
                hdr.ref_frame_sign_bias[i] = br.read_bit("ref_frame_sign_bias")?;
            }
            state.compound_reference_allowed = (1..3)
                .any(|i| hdr.ref_frame_sign_bias[i] != hdr.ref_frame_sign_bias[0]);

            let refs = parse_frame_size_with_refs(br, state)?;
            hdr.frame_size_with_refs = Some(refs);

            hdr.allow_high_precision_mv = br.read_bit("allow_high_precision_mv")?;
            hdr.interpolation_filter = parse_interpolation_filter(br, state)?;
        }
    }

    if !hdr.error_resilient_mode {
        hdr.refresh_entropy_probs = br.read_bit("refresh_entropy_probs")?;
        hdr.frame_parallel_decoding_mode = br.read_bit("frame_parallel_decoding_mode")?;
    }

    hdr.frame_context_idx = br.read_uint(2, "frame_context_idx")? as u8;

    hdr.loop_filter_params = parse_loop_filter_params(br)?;
    hdr.quantization_params = parse_quantization_params(br)?;
    state.lossless = hdr.quantization_params.is_lossless();
    hdr.segmentation_params = parse_segmentation_params(br)?;
    hdr.tile_info = parse_tile_info(br, state)?;

    let header_size = br.read_uint(16, "header_size_in_bytes")? as u16;
    state.header_size_in_bytes = header_size;

    Ok(hdr)
}

fn parse_color_config(br: &mut BitReader, profile: u32) -> Result<ColorConfig> {
    let mut cc = ColorConfig::default();
    if profile >= 2 {
        cc.ten_or_twelve_bit = br.read_bit("ten_or_twelve_bit")?;
    }
    cc.color_space = ColorSpace::from_bits(br.read_uint(3, "color_space")? as u32);
    if cc.color_space != ColorSpace::CsRgb {
        cc.color_range = br.read_bit("color_range")?;
        if profile == 1 || profile == 3 {
            cc.subsampling_x = br.read_bit("subsampling_x")?;
            cc.subsampling_y = br.read_bit("subsampling_y")?;
            let _reserved = br.read_uint(1, "reserved_zero")?;
        } else {
            cc.subsampling_x = true;
            cc.subsampling_y = true;
        }
    } else if profile == 1 || profile == 3 {
        let _reserved = br.read_uint(1, "reserved_zero")?;
    }
    Ok(cc)
}

fn parse_frame_size(br: &mut BitReader, state: &mut FrameState) -> Result<FrameSize> {
    let width = br.read_uint(16, "frame_width_minus_1")? as u32 + 1;
    let height = br.read_uint(16, "frame_height_minus_1")? as u32 + 1;
    state.set_frame_size(width, height);
    Ok(FrameSize { frame_width: width, frame_height: height })
}

fn parse_render_size(br: &mut BitReader) -> Result<RenderSize> {
    let different = br.read_bit("render_and_frame_size_different")?;
    let mut rs = RenderSize { render_and_frame_size_different: different, ..Default::default() };
    if different {
        rs.render_width = br.read_uint(16, "render_width_minus_1")? as u32 + 1;
        rs.render_height = br.read_uint(16, "render_height_minus_1")? as u32 + 1;
    }
    Ok(rs)
}

fn parse_frame_size_with_refs(br: &mut BitReader, state: &mut FrameState) -> Result<FrameSizeWithRefs> {
    let mut found_ref = [false; 3];
    for slot in &mut found_ref {
        *slot = br.read_bit("frame_size_found_ref")?;
    }
    let frame_size = if found_ref.iter().all(|&f| !f) {
        parse_frame_size(br, state)?
    } else {
        FrameSize { frame_width: state.frame_width, frame_height: state.frame_height }
    };
    let render_size = parse_render_size(br)?;
    Ok(FrameSizeWithRefs { found_ref, frame_size, render_size })
}

fn parse_interpolation_filter(br: &mut BitReader, state: &mut FrameState) -> Result<InterpolationFilter> {
    let switchable = br.read_bit("is_filter_switchable")?;
    let filter = if switchable {
        InterpolationFilter::Switchable
    } else {
        InterpolationFilter::from_raw(br.read_uint(2, "raw_interpolation_filter")? as u32)
    };
    state.interpolation_filter = filter;
    Ok(filter)
}

fn parse_loop_filter_params(br: &mut BitReader) -> Result<LoopFilterParams> {
    let mut lf = LoopFilterParams {
        loop_filter_level: br.read_uint(6, "loop_filter_level")? as u8,
        loop_filter_sharpness: br.read_uint(3, "loop_filter_sharpness")? as u8,
        loop_filter_delta_enabled: br.read_bit("loop_filter_delta_enabled")?,
        ..Default::default()
    };
    if lf.loop_filter_delta_enabled {
        lf.loop_filter_delta_update = br.read_bit("loop_filter_delta_update")?;
        if lf.loop_filter_delta_update {
            for slot in &mut lf.ref_deltas {
                if br.read_bit("update_ref_delta")? {
                    *slot = Some(read_signed(br, 6, "ref_delta")?);
                }
            }
            for slot in &mut lf.mode_deltas {
                if br.read_bit("update_mode_delta")? {
                    *slot = Some(read_signed(br, 6, "mode_delta")?);
                }
            }
        }
    }
    Ok(lf)
}

fn parse_quantization_params(br: &mut BitReader) -> Result<QuantizationParams> {
    let base_q_idx = br.read_uint(8, "base_q_idx")? as u8;
    let mut deltas = [None; 3];
    for (i, field) in ["delta_q_y_dc", "delta_q_uv_dc", "delta_q_uv_ac"].into_iter().enumerate() {
        if br.read_bit(field)? {
            deltas[i] = Some(read_signed(br, 4, field)?);
        }
    }
    Ok(QuantizationParams {
        base_q_idx,
        delta_q_y_dc: deltas[0],
        delta_q_uv_dc: deltas[1],
        delta_q_uv_ac: deltas[2],
    })
}

fn parse_segmentation_params(br: &mut BitReader) -> Result<SegmentationParams> {
    let mut seg = SegmentationParams {
        segmentation_enabled: br.read_bit("segmentation_enabled")?,
        ..SegmentationParams::default()
    };
    if !seg.segmentation_enabled {
        return Ok(seg);
    }
    seg.segmentation_update_map = br.read_bit("segmentation_update_map")?;
    if seg.segmentation_update_map {
        for _ in 0..7 {
            if br.read_bit("prob_coded")? {
                seg.tree_probs.push(Some(br.read_uint(8, "prob")? as u8));
            } else {
                seg.tree_probs.push(None);
            }
        }
        seg.segmentation_temporal_update = br.read_bit("segmentation_temporal_update")?;
        if seg.segmentation_temporal_update {
            for _ in 0..3 {
                if br.read_bit("prob_coded")? {
                    seg.pred_probs.push(Some(br.read_uint(8, "prob")? as u8));
                } else {
                    seg.pred_probs.push(None);
                }
            }
        }
    }
    seg.segmentation_update_data = br.read_bit("segmentation_update_data")?;
    if seg.segmentation_update_data {
        seg.segmentation_abs_or_delta_update = br.read_bit("segmentation_abs_or_delta_update")?;
        for _ in 0..8 {
            let mut row = [SegmentationFeature::default(); SEG_LVL_MAX];
            for (j, slot) in row.iter_mut().enumerate() {
                slot.feature_enabled = br.read_bit("feature_enabled")?;
                if slot.feature_enabled {
                    let bits = SEGMENTATION_FEATURE_BITS[j] as u32;
                    let magnitude = br.read_uint(bits, "feature_value")? as u32;
                    let sign = if SEGMENTATION_FEATURE_SIGNED[j] {
                        br.read_bit("feature_sign")?
                    } else {
                        false
                    };
                    slot.feature_value = Some(VP9SignedInteger { magnitude, sign });
                }
            }
            seg.features.push(row);
        }
    }
    Ok(seg)
}

fn parse_tile_info(br: &mut BitReader, state: &mut FrameState) -> Result<TileInfo> {
    let min_log2 = state.min_log2_tile_cols();
    let max_log2 = state.max_log2_tile_cols();
    let mut tile_cols_log2 = min_log2;
    while tile_cols_log2 < max_log2 {
        if br.read_bit("increment_tile_cols_log2")? {
            tile_cols_log2 += 1;
        } else {
            break;
        }
    }
    let rows_present = br.read_bit("tile_rows_log2")?;
    let tile_rows_log2 = if rows_present {
        1 + br.read_bit("increment_tile_rows_log2")? as u8
    } else {
        0
    };
    Ok(TileInfo { tile_cols_log2, tile_rows_log2 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::VP9SignedInteger;

    #[test]
    fn show_existing_frame_is_minimal() {
        let hdr = UncompressedHeader {
            profile_low_bit: 0,
            profile_high_bit: 0,
            show_existing_frame: true,
            frame_to_show_map_idx: 5,
            ..Default::default()
        };
        let mut state = FrameState::new();
        let mut bw = BitWriter::new();
        let marker = encode(&mut bw, &hdr, &mut state).unwrap();
        assert!(marker.is_none());
        bw.align_to_byte();
        let bytes = bw.finalize();
        assert_eq!(bytes, vec![0x8B]);
        assert_eq!(state.header_size_in_bytes, 0);
    }

    #[test]
    fn lossless_key_frame_round_trips() {
        let hdr = UncompressedHeader {
            profile_low_bit: 0,
            profile_high_bit: 0,
            show_existing_frame: false,
            frame_type: FrameType::Key,
            show_frame: true,
            error_resilient_mode: false,
            color_config: Some(ColorConfig { color_space: ColorSpace::CsRgb, ..Default::default() }),
            frame_size: Some(FrameSize { frame_width: 64, frame_height: 64 }),
            render_size: Some(RenderSize::default()),
            frame_context_idx: 0,
            ..Default::default()
        };
        let mut state = FrameState::new();
        let mut bw = BitWriter::new();
        let marker = encode(&mut bw, &hdr, &mut state).unwrap().unwrap();
        bw.write_bits_at(marker, 0, 16);
        bw.align_to_byte();
        assert!(state.lossless);
        let bytes = bw.finalize();

        let mut br = BitReader::new(&bytes);
        let mut parse_state = FrameState::new();
        let parsed = parse(&mut br, &mut parse_state).unwrap();
        assert_eq!(parsed.frame_size.unwrap().frame_width, 64);
        assert!(parse_state.lossless);
    }

    #[test]
    fn loop_filter_ref_delta_round_trips() {
        let mut lf = LoopFilterParams {
            loop_filter_delta_enabled: true,
            loop_filter_delta_update: true,
            ..Default::default()
        };
        lf.ref_deltas[0] = Some(VP9SignedInteger::new(-5));
        let mut bw = BitWriter::new();
        encode_loop_filter_params(&mut bw, &lf);
        bw.align_to_byte();
        let bytes = bw.finalize();
        let mut br = BitReader::new(&bytes);
        let parsed = parse_loop_filter_params(&mut br).unwrap();
        assert_eq!(parsed.ref_deltas[0].unwrap().value(), -5);
        assert!(parsed.ref_deltas[1].is_none());
    }
}
