// Small enums representing the named VP9 field values, encoded as small
// unsigned integers with named constants identical to the VP9
// specification values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    Key = 0,
    Inter = 1,
}

impl Default for FrameType {
    fn default() -> Self {
        FrameType::Key
    }
}

impl FrameType {
    pub fn from_bit(bit: u32) -> Self {
        if bit == 0 { FrameType::Key } else { FrameType::Inter }
    }

    pub fn as_bit(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    Unknown = 0,
    Bt601 = 1,
    Bt709 = 2,
    Smpte170 = 3,
    Smpte240 = 4,
    Bt2020 = 5,
    Reserved = 6,
    CsRgb = 7,
}

impl Default for ColorSpace {
    fn default() -> Self {
        ColorSpace::Unknown
    }
}

impl ColorSpace {
    pub fn from_bits(v: u32) -> Self {
        match v {
            0 => ColorSpace::Unknown,
            1 => ColorSpace::Bt601,
            2 => ColorSpace::Bt709,
            3 => ColorSpace::Smpte170,
            4 => ColorSpace::Smpte240,
            5 => ColorSpace::Bt2020,
            6 => ColorSpace::Reserved,
            _ => ColorSpace::CsRgb,
        }
    }

    pub fn as_bits(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationFilter {
    EightTap = 0,
    EightTapSmooth = 1,
    EightTapSharp = 2,
    Bilinear = 3,
    Switchable = 4,
}

impl Default for InterpolationFilter {
    fn default() -> Self {
        InterpolationFilter::EightTap
    }
}

impl InterpolationFilter {
    pub fn from_raw(v: u32) -> Self {
        match v {
            0 => InterpolationFilter::EightTap,
            1 => InterpolationFilter::EightTapSmooth,
            2 => InterpolationFilter::EightTapSharp,
            _ => InterpolationFilter::Bilinear,
        }
    }

    /// The 2-bit raw encoding used when the filter is not switchable.
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    Only4x4 = 0,
    Allow8x8 = 1,
    Allow16x16 = 2,
    Allow32x32 = 3,
    TxModeSelect = 4,
}

impl Default for TxMode {
    fn default() -> Self {
        TxMode::Only4x4
    }
}

impl TxMode {
    pub fn from_bits(v: u32) -> Self {
        match v {
            0 => TxMode::Only4x4,
            1 => TxMode::Allow8x8,
            2 => TxMode::Allow16x16,
            3 => TxMode::Allow32x32,
            _ => TxMode::TxModeSelect,
        }
    }

    pub fn as_bits(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMode {
    SingleReference = 0,
    CompoundReference = 1,
    ReferenceModeSelect = 2,
}

impl Default for ReferenceMode {
    fn default() -> Self {
        ReferenceMode::SingleReference
    }
}
