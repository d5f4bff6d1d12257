//! Error type for the VP9/IVF codec.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Vp9Error>;

/// Failures raised while encoding or parsing a frame.
#[derive(Error, Debug)]
pub enum Vp9Error {
    /// A parser requested bits beyond the end of the input buffer.
    #[error("read past end of buffer at bit position {pos} while reading field `{field}`")]
    UnexpectedEof { pos: u64, field: &'static str },

    /// An optional record sub-message was accessed while absent, on the
    /// parser side this indicates corrupted intermediate state (the
    /// encoder side never raises this — it substitutes default-zero).
    #[error("missing record field `{0}` while reconstructing a record")]
    MissingRecordField(&'static str),

    /// A field whose value the spec mandates (frame_marker, frame_sync_code)
    /// was read with the wrong value.
    #[error("invalid constant in field `{field}`: expected {expected:#x}, got {actual:#x}")]
    InvalidConstantValue {
        field: &'static str,
        expected: u64,
        actual: u64,
    },

    /// The BoolEncoder's fixed scratch buffer was exceeded.
    #[error("bool coder output buffer overflow (capacity {capacity} bytes)")]
    BoolCoderOverflow { capacity: usize },

    /// File I/O failure surfaced by the CLI binaries.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failure surfaced by the CLI binaries.
    #[error("record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
