//! Track formats and the variable bit-rate table
//!
//! Rotation and translation/scale tracks are quantized to one of a small,
//! closed set of formats. The `*Variable` formats do not pin a bit count
//! themselves; the number of bits per component comes from a separate
//! bit-rate index into [`BIT_RATE_NUM_BITS`].

use serde::{Deserialize, Serialize};

// ============================================================================
// Bit Rates
// ============================================================================

/// Bits per component for each bit-rate index, strictly increasing.
///
/// Three components at the highest rate (3 × 19 = 57 bits) still fit the
/// 8-byte sample slot used by variable tracks.
pub const BIT_RATE_NUM_BITS: [u8; 17] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19,
];

/// Coarsest bit-rate index
pub const LOWEST_BIT_RATE: u8 = 0;

/// Finest bit-rate index
pub const HIGHEST_BIT_RATE: u8 = (BIT_RATE_NUM_BITS.len() - 1) as u8;

/// Sentinel bit rate carried by streams that are not variable-quantized
/// (raw streams and streams quantized to a fixed format)
pub const INVALID_BIT_RATE: u8 = u8::MAX;

/// Look up the number of bits per component for a bit-rate index
#[inline]
pub fn num_bits_at_bit_rate(bit_rate: u8) -> u8 {
    BIT_RATE_NUM_BITS[bit_rate as usize]
}

// ============================================================================
// Rotation Formats
// ============================================================================

/// Storage format for a rotation track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationFormat {
    /// Four f32 components (16 bytes)
    Quat128,
    /// Three f32 components, w reconstructed at decode (12 bytes)
    QuatDropW96,
    /// Three unorm16 components, w reconstructed (6 bytes)
    QuatDropW48,
    /// 11/11/10 unorm components, w reconstructed (4 bytes)
    QuatDropW32,
    /// Three N-bit unorm components where N comes from the bit-rate table,
    /// stored in an 8-byte slot
    QuatDropWVariable,
}

impl RotationFormat {
    /// Packed sample size in bytes
    #[inline]
    pub const fn packed_size(self) -> u32 {
        match self {
            RotationFormat::Quat128 => 16,
            RotationFormat::QuatDropW96 => 12,
            RotationFormat::QuatDropW48 => 6,
            RotationFormat::QuatDropW32 => 4,
            RotationFormat::QuatDropWVariable => 8,
        }
    }

    #[inline]
    pub const fn is_variable(self) -> bool {
        matches!(self, RotationFormat::QuatDropWVariable)
    }

    /// The family this format belongs to
    #[inline]
    pub const fn variant(self) -> RotationVariant {
        match self {
            RotationFormat::Quat128 => RotationVariant::Quat,
            RotationFormat::QuatDropW96
            | RotationFormat::QuatDropW48
            | RotationFormat::QuatDropW32
            | RotationFormat::QuatDropWVariable => RotationVariant::QuatDropW,
        }
    }
}

/// Rotation format family: full quaternion vs drop-w
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationVariant {
    Quat,
    QuatDropW,
}

impl RotationVariant {
    /// The full-precision representative of the family, used to store
    /// constant rotation tracks
    #[inline]
    pub const fn highest_precision(self) -> RotationFormat {
        match self {
            RotationVariant::Quat => RotationFormat::Quat128,
            RotationVariant::QuatDropW => RotationFormat::QuatDropW96,
        }
    }
}

// ============================================================================
// Vector Formats
// ============================================================================

/// Storage format for a translation or scale track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorFormat {
    /// Three f32 components (12 bytes)
    Vector96,
    /// Three unorm16 components (6 bytes)
    Vector48,
    /// 11/11/10 unorm components (4 bytes)
    Vector32,
    /// Three N-bit unorm components in an 8-byte slot
    VectorVariable,
}

impl VectorFormat {
    /// Packed sample size in bytes
    #[inline]
    pub const fn packed_size(self) -> u32 {
        match self {
            VectorFormat::Vector96 => 12,
            VectorFormat::Vector48 => 6,
            VectorFormat::Vector32 => 4,
            VectorFormat::VectorVariable => 8,
        }
    }

    #[inline]
    pub const fn is_variable(self) -> bool {
        matches!(self, VectorFormat::VectorVariable)
    }
}

// ============================================================================
// Track Kinds
// ============================================================================

/// The three kinds of track a bone can animate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Rotation,
    Translation,
    Scale,
}
