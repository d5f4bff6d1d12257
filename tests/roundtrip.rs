//! End-to-end behavioral checks and round-trip invariants that fit more
//! naturally as black-box tests than as unit tests colocated with their
//! module.

use vp9_fuzz_codec::bitcode::{BitReader, BitWriter};
use vp9_fuzz_codec::boolcoder::{BoolDecoder, BoolEncoder};
use vp9_fuzz_codec::enums::{ColorSpace, FrameType};
use vp9_fuzz_codec::frame::uncompressed_header;
use vp9_fuzz_codec::record::{ColorConfig, FrameSize, RenderSize, Tile, UncompressedHeader, VP9Frame};
use vp9_fuzz_codec::state::FrameState;
use vp9_fuzz_codec::{encode_record, parse_record, Record};

#[test]
fn show_existing_frame_emits_a_single_byte() {
    let hdr = UncompressedHeader {
        profile_low_bit: 0,
        profile_high_bit: 0,
        show_existing_frame: true,
        frame_to_show_map_idx: 5,
        ..Default::default()
    };
    let mut state = FrameState::new();
    let mut bw = BitWriter::new();
    let marker = uncompressed_header::encode(&mut bw, &hdr, &mut state).unwrap();
    assert!(marker.is_none());
    bw.align_to_byte();
    let bytes = bw.finalize();

    assert_eq!(bytes, vec![0x8B]);
    assert_eq!(state.header_size_in_bytes, 0);
}

/// A lossless key frame round-trips with `base_q_idx == 0` and no deltas.
#[test]
fn lossless_key_frame_round_trips_as_lossless() {
    let record = Record {
        frames: vec![VP9Frame {
            uncompressed_header: UncompressedHeader {
                frame_type: FrameType::Key,
                show_frame: true,
                error_resilient_mode: false,
                color_config: Some(ColorConfig { color_space: ColorSpace::CsRgb, ..Default::default() }),
                frame_size: Some(FrameSize { frame_width: 64, frame_height: 64 }),
                render_size: Some(RenderSize::default()),
                frame_context_idx: 0,
                ..Default::default()
            },
            compressed_header: Some(Default::default()),
            tiles: vec![Tile { data: Vec::new() }],
        }],
    };

    let bytes = encode_record(&record).unwrap();
    let parsed = parse_record(&bytes).unwrap();
    let hdr = &parsed.frames[0].uncompressed_header;
    assert_eq!(hdr.quantization_params.base_q_idx, 0);
    assert!(hdr.quantization_params.is_lossless());
}

#[test]
fn boolean_literal_round_trips() {
    let mut enc = BoolEncoder::new();
    enc.write_literal(0xA5, 8).unwrap();
    let bytes = enc.finish().unwrap();

    let mut dec = BoolDecoder::new(&bytes).unwrap();
    assert_eq!(dec.read_literal(8).unwrap(), 0xA5);
}

/// Values straddling the subexp size-class boundaries, including the point
/// where the Uniform code's overflow class and its `bit_4` tail kick in.
#[test]
fn term_subexp_boundary_values_round_trip() {
    use vp9_fuzz_codec::boolcoder::{decode_term_subexp, encode_term_subexp};

    for &v in &[63u32, 64, 65, 127, 129, 254] {
        let mut enc = BoolEncoder::new();
        encode_term_subexp(&mut enc, v).unwrap();
        let bytes = enc.finish().unwrap();
        let mut dec = BoolDecoder::new(&bytes).unwrap();
        assert_eq!(decode_term_subexp(&mut dec).unwrap(), v);
    }
}

/// At `Sb64Cols == 5`, the min/max tile-column log2 bounds collapse to 0,
/// so no tile_cols_log2 bits would be emitted at all.
#[test]
fn tile_info_threshold_emits_no_column_bits() {
    let mut state = FrameState::new();
    // Sb64Cols = 5 requires MiCols in (32, 40], e.g. FrameWidth in (253,316].
    state.set_frame_size(300, 8);
    assert_eq!(state.sb64_cols, 5);
    assert_eq!(state.min_log2_tile_cols(), 0);
    assert_eq!(state.max_log2_tile_cols(), 0);
}

#[test]
fn ivf_three_frames_header_count() {
    let frame = VP9Frame {
        uncompressed_header: UncompressedHeader {
            frame_type: FrameType::Key,
            show_frame: true,
            color_config: Some(ColorConfig { color_space: ColorSpace::CsRgb, ..Default::default() }),
            frame_size: Some(FrameSize { frame_width: 16, frame_height: 16 }),
            render_size: Some(RenderSize::default()),
            ..Default::default()
        },
        compressed_header: Some(Default::default()),
        tiles: vec![Tile { data: Vec::new() }],
    };
    let record = Record { frames: vec![frame.clone(), frame.clone(), frame] };
    let bytes = encode_record(&record).unwrap();

    assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 3);
    assert_eq!(&bytes[26..30], b"MICH");

    let parsed = parse_record(&bytes).unwrap();
    assert_eq!(parsed.frames.len(), 3);
}

/// Final byte length is the bit ceiling, and (by construction) every
/// padding bit is zero since `align_to_byte` only ever appends zeros.
#[test]
fn bit_accounting_matches_byte_ceiling() {
    let mut bw = BitWriter::new();
    bw.write_bits(0b101, 3);
    let bit_len_before_align = bw.bit_pos();
    bw.align_to_byte();
    let bytes = bw.finalize();
    assert_eq!(bytes.len(), (bit_len_before_align + 7) / 8);
}

/// Re-encoding a parsed record and parsing it again reproduces the same
/// structured fields that round-tripped the first time.
#[test]
fn encode_parse_identity_on_recovered_fields() {
    let record = Record {
        frames: vec![VP9Frame {
            uncompressed_header: UncompressedHeader {
                frame_type: FrameType::Key,
                show_frame: true,
                color_config: Some(ColorConfig { color_space: ColorSpace::Bt709, color_range: true, ..Default::default() }),
                frame_size: Some(FrameSize { frame_width: 128, frame_height: 96 }),
                render_size: Some(RenderSize::default()),
                ..Default::default()
            },
            compressed_header: Some(Default::default()),
            tiles: vec![Tile { data: vec![1, 2, 3, 4] }],
        }],
    };

    let bytes = encode_record(&record).unwrap();
    let parsed = parse_record(&bytes).unwrap();
    let reencoded = encode_record(&parsed).unwrap();
    let reparsed = parse_record(&reencoded).unwrap();

    assert_eq!(
        parsed.frames[0].uncompressed_header.frame_size,
        reparsed.frames[0].uncompressed_header.frame_size
    );
    assert_eq!(parsed.frames[0].tiles[0].data, reparsed.frames[0].tiles[0].data);
}

/// The parser never reads past the end of the buffer without error.
#[test]
fn reading_past_end_is_an_error_not_a_panic() {
    let mut br = BitReader::new(&[0xFF]);
    br.read_uint(8, "warmup").unwrap();
    assert!(br.read_uint(1, "past_end").is_err());
}
