//! Top-level per-frame orchestration: sequences the uncompressed
//! header, compressed header, and tile sub-codecs, and owns the
//! `header_size_in_bytes` backpatch.

pub mod compressed_header;
pub mod tile;
pub mod uncompressed_header;

use crate::bitcode::{BitReader, BitWriter};
use crate::error::Result;
use crate::record::VP9Frame;
use crate::state::FrameState;

/// Encodes one VP9 frame (uncompressed header + compressed header + tiles)
/// into a freshly byte-aligned buffer.
pub fn encode_frame(frame: &VP9Frame, state: &mut FrameState) -> Result<Vec<u8>> {
    let mut bw = BitWriter::new();
    let marker = uncompressed_header::encode(&mut bw, &frame.uncompressed_header, state)?;

    if let Some(marker) = marker {
        let compressed_header = frame.compressed_header.clone().unwrap_or_default();
        let compressed = compressed_header::encode(&compressed_header, state)?;
        state.header_size_in_bytes = compressed.len() as u16;
        bw.write_bits_at(marker, state.header_size_in_bytes as u64, 16);
        bw.align_to_byte();
        bw.extend_bytes(&compressed);

        let mut tile_bytes = Vec::new();
        tile::encode(&mut tile_bytes, &frame.tiles);
        bw.extend_bytes(&tile_bytes);
    } else {
        bw.align_to_byte();
    }

    Ok(bw.finalize())
}

/// Parses one VP9 frame out of `bytes`, mirroring [`encode_frame`].
pub fn parse_frame(bytes: &[u8], state: &mut FrameState) -> Result<VP9Frame> {
    let mut br = BitReader::new(bytes);
    let uncompressed_header = uncompressed_header::parse(&mut br, state)?;

    if uncompressed_header.show_existing_frame {
        return Ok(VP9Frame { uncompressed_header, compressed_header: None, tiles: Vec::new() });
    }

    br.align_to_byte();
    let header_size = state.header_size_in_bytes as usize;
    let rest = br.remaining_bytes();
    let (compressed_bytes, tile_bytes) = rest.split_at(header_size.min(rest.len()));

    let compressed_header = Some(compressed_header::parse(compressed_bytes, state)?);
    let tiles = tile::parse(tile_bytes);

    Ok(VP9Frame { uncompressed_header, compressed_header, tiles })
}
