//! The IVF container envelope: a fixed 32-byte file header plus a
//! 12-byte header per frame, all little-endian — the opposite bit order
//! from the big-endian MSB-first uncompressed header, by design.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::consts::ivf as c;
use crate::error::{Result, Vp9Error};

pub struct IvfWriter {
    buf: Vec<u8>,
    frame_count: u16,
}

impl IvfWriter {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buf = Vec::with_capacity(c::FILE_HEADER_LEN);
        buf.extend_from_slice(c::SIGNATURE);
        buf.write_u16::<LittleEndian>(c::VERSION).unwrap();
        buf.write_u16::<LittleEndian>(c::FILE_HEADER_LEN as u16).unwrap();
        buf.extend_from_slice(c::CODEC_FOURCC);
        buf.write_u16::<LittleEndian>(width).unwrap();
        buf.write_u16::<LittleEndian>(height).unwrap();
        buf.write_u32::<LittleEndian>(c::TIMEBASE_DENOMINATOR).unwrap();
        buf.write_u32::<LittleEndian>(c::TIMEBASE_NUMERATOR).unwrap();
        buf.write_u16::<LittleEndian>(0).unwrap(); // frame_count placeholder
        buf.extend_from_slice(c::PADDING);
        buf.write_u16::<LittleEndian>(0).unwrap(); // unused
        debug_assert_eq!(buf.len(), c::FILE_HEADER_LEN);
        Self { buf, frame_count: 0 }
    }

    /// Appends one VP9 frame's 12-byte per-frame header (size, zero
    /// timestamp) followed by its bytes.
    pub fn push_frame(&mut self, frame_bytes: &[u8]) {
        self.buf.write_u32::<LittleEndian>(frame_bytes.len() as u32).unwrap();
        self.buf.write_u64::<LittleEndian>(0).unwrap(); // timestamp
        self.buf.extend_from_slice(frame_bytes);
        self.frame_count += 1;
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf[24..26].copy_from_slice(&self.frame_count.to_le_bytes());
        self.buf
    }
}

pub struct IvfFileHeader {
    pub width: u16,
    pub height: u16,
    pub frame_count: u16,
}

/// Splits an IVF byte stream into its file header and the raw VP9 frame
/// byte slices (per-frame headers consumed, not retained).
pub fn parse(bytes: &[u8]) -> Result<(IvfFileHeader, Vec<Vec<u8>>)> {
    if bytes.len() < c::FILE_HEADER_LEN {
        return Err(Vp9Error::UnexpectedEof { pos: bytes.len() as u64, field: "ivf_file_header" });
    }
    if &bytes[0..4] != c::SIGNATURE {
        return Err(Vp9Error::InvalidConstantValue {
            field: "ivf_signature",
            expected: u32::from_be_bytes(*c::SIGNATURE) as u64,
            actual: u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as u64,
        });
    }

    let mut cursor = Cursor::new(&bytes[4..]);
    let _version = cursor.read_u16::<LittleEndian>().unwrap();
    let header_len = cursor.read_u16::<LittleEndian>().unwrap();
    let mut fourcc = [0u8; 4];
    fourcc.copy_from_slice(&bytes[8..12]);
    let width = cursor.read_u16::<LittleEndian>().unwrap();
    let height = cursor.read_u16::<LittleEndian>().unwrap();
    let _denom = cursor.read_u32::<LittleEndian>().unwrap();
    let _num = cursor.read_u32::<LittleEndian>().unwrap();
    let frame_count = cursor.read_u16::<LittleEndian>().unwrap();

    let mut pos = header_len.max(c::FILE_HEADER_LEN as u16) as usize;
    let mut frames = Vec::new();
    while pos + c::FRAME_HEADER_LEN <= bytes.len() {
        let size = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        let data_start = pos + c::FRAME_HEADER_LEN;
        if data_start + size > bytes.len() {
            return Err(Vp9Error::UnexpectedEof { pos: data_start as u64, field: "ivf_frame_data" });
        }
        frames.push(bytes[data_start..data_start + size].to_vec());
        pos = data_start + size;
    }

    Ok((IvfFileHeader { width, height, frame_count }, frames))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_with_three_frames() {
        let mut writer = IvfWriter::new(64, 64);
        writer.push_frame(&[1, 2, 3]);
        writer.push_frame(&[4, 5]);
        writer.push_frame(&[6]);
        let bytes = writer.finish();

        assert_eq!(&bytes[26..30], c::PADDING);
        assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 3);

        let (header, frames) = parse(&bytes).unwrap();
        assert_eq!(header.width, 64);
        assert_eq!(header.frame_count, 3);
        assert_eq!(frames, vec![vec![1, 2, 3], vec![4, 5], vec![6]]);
    }

    #[test]
    fn rejects_bad_signature() {
        let bytes = vec![0u8; 32];
        assert!(parse(&bytes).is_err());
    }
}
