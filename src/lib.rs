//! Bidirectional VP9/IVF bitstream codec.
//!
//! [`encode_record`] turns a [`record::Record`] into an IVF byte stream;
//! [`parse_record`] is its inverse. Everything below is pure and
//! single-threaded: a frame owns no state beyond its own
//! [`state::FrameState`], so independent [`encode_record`]/[`parse_record`]
//! calls never share mutable state.

pub mod bitcode;
pub mod boolcoder;
pub mod consts;
pub mod enums;
pub mod error;
pub mod frame;
pub mod ivf;
pub mod record;
pub mod state;

pub use error::{Result, Vp9Error};
pub use record::Record;

use ivf::IvfWriter;
use state::FrameState;

/// Encodes every frame in `record` and wraps the result in an IVF
/// container. The container's width/height come from the first frame's
/// `FrameSize`, if any; frames with a different size are still emitted
/// verbatim (IVF itself does not enforce per-frame dimensions).
pub fn encode_record(record: &Record) -> Result<Vec<u8>> {
    let (width, height) = record
        .frames
        .first()
        .and_then(|f| f.uncompressed_header.frame_size)
        .map(|fs| (fs.frame_width as u16, fs.frame_height as u16))
        .unwrap_or((0, 0));

    let mut writer = IvfWriter::new(width, height);
    for vp9_frame in &record.frames {
        let mut state = FrameState::new();
        let bytes = frame::encode_frame(vp9_frame, &mut state)?;
        writer.push_frame(&bytes);
    }
    Ok(writer.finish())
}

/// Parses an IVF byte stream back into a [`Record`], one [`state::FrameState`]
/// per frame.
pub fn parse_record(bytes: &[u8]) -> Result<Record> {
    let (_header, frame_bytes) = ivf::parse(bytes)?;
    let mut frames = Vec::with_capacity(frame_bytes.len());
    for fb in frame_bytes {
        let mut state = FrameState::new();
        frames.push(frame::parse_frame(&fb, &mut state)?);
    }
    Ok(Record { frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{ColorSpace, FrameType};
    use crate::record::{ColorConfig, FrameSize, RenderSize, UncompressedHeader, VP9Frame};

    fn key_frame(width: u32, height: u32) -> VP9Frame {
        VP9Frame {
            uncompressed_header: UncompressedHeader {
                frame_type: FrameType::Key,
                show_frame: true,
                color_config: Some(ColorConfig { color_space: ColorSpace::CsRgb, ..Default::default() }),
                frame_size: Some(FrameSize { frame_width: width, frame_height: height }),
                render_size: Some(RenderSize::default()),
                ..Default::default()
            },
            compressed_header: Some(Default::default()),
            tiles: vec![record::Tile { data: vec![0xAB, 0xCD] }],
        }
    }

    #[test]
    fn single_frame_record_round_trips_through_ivf() {
        let record = Record { frames: vec![key_frame(64, 64)] };
        let bytes = encode_record(&record).unwrap();
        let parsed = parse_record(&bytes).unwrap();

        assert_eq!(parsed.frames.len(), 1);
        let hdr = &parsed.frames[0].uncompressed_header;
        assert_eq!(hdr.frame_type, FrameType::Key);
        assert_eq!(hdr.frame_size.unwrap().frame_width, 64);
        assert_eq!(parsed.frames[0].tiles[0].data, vec![0xAB, 0xCD]);
    }

    #[test]
    fn three_frame_record_sets_ivf_frame_count() {
        let record = Record {
            frames: vec![key_frame(32, 32), key_frame(32, 32), key_frame(32, 32)],
        };
        let bytes = encode_record(&record).unwrap();
        assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 3);
        let parsed = parse_record(&bytes).unwrap();
        assert_eq!(parsed.frames.len(), 3);
    }
}
