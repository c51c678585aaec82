//! Sample packing utilities
//!
//! Provides functions to convert f32 track samples to packed storage formats:
//! - f32x4 / f32x3 → raw little-endian floats (full precision)
//! - f32x3 → unorm16x3, unorm 11/11/10, or unorm Nx3 at an explicit bit count
//!
//! The normalized variants assume input components in `[-1.0, 1.0]`;
//! out-of-range input saturates at the clamped extreme. Quantized components
//! are laid out x, y, z most-significant-bit first, packed tightly across
//! byte boundaries.

use glam::{Vec3, Vec4};

// ============================================================================
// Normalized Quantization
// ============================================================================

/// Quantize a `[-1.0, 1.0]` value to an N-bit unsigned integer
///
/// Maps to `[0.0, 1.0]`, scales by `2^N - 1`, rounds to nearest with ties
/// away from zero.
#[inline]
pub fn quantize_unorm(value: f32, num_bits: u8) -> u32 {
    let max_value = ((1u64 << num_bits) - 1) as f32;
    let clamped = value.clamp(-1.0, 1.0);
    (((clamped * 0.5) + 0.5) * max_value).round() as u32
}

/// Invert [`quantize_unorm`]: scale-and-bias back into `[-1.0, 1.0]`
#[inline]
pub fn dequantize_unorm(value: u32, num_bits: u8) -> f32 {
    let max_value = ((1u64 << num_bits) - 1) as f32;
    ((value as f32 / max_value) * 2.0) - 1.0
}

// ============================================================================
// Full-Precision Packing
// ============================================================================

/// Pack four f32 components as little-endian bytes (16 bytes)
#[inline]
pub fn pack_vector4_128(value: Vec4, out: &mut [u8]) {
    debug_assert!(out.len() >= 16);
    out[0..4].copy_from_slice(&value.x.to_le_bytes());
    out[4..8].copy_from_slice(&value.y.to_le_bytes());
    out[8..12].copy_from_slice(&value.z.to_le_bytes());
    out[12..16].copy_from_slice(&value.w.to_le_bytes());
}

/// Unpack four little-endian f32 components
#[inline]
pub fn unpack_vector4_128(data: &[u8]) -> Vec4 {
    debug_assert!(data.len() >= 16);
    Vec4::new(
        f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
        f32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        f32::from_le_bytes([data[8], data[9], data[10], data[11]]),
        f32::from_le_bytes([data[12], data[13], data[14], data[15]]),
    )
}

/// Pack three f32 components as little-endian bytes (12 bytes)
#[inline]
pub fn pack_vector3_96(value: Vec3, out: &mut [u8]) {
    debug_assert!(out.len() >= 12);
    out[0..4].copy_from_slice(&value.x.to_le_bytes());
    out[4..8].copy_from_slice(&value.y.to_le_bytes());
    out[8..12].copy_from_slice(&value.z.to_le_bytes());
}

/// Unpack three little-endian f32 components
#[inline]
pub fn unpack_vector3_96(data: &[u8]) -> Vec3 {
    debug_assert!(data.len() >= 12);
    Vec3::new(
        f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
        f32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        f32::from_le_bytes([data[8], data[9], data[10], data[11]]),
    )
}

// ============================================================================
// Fixed-Width Normalized Packing
// ============================================================================

/// Pack three `[-1.0, 1.0]` components as unorm16 (6 bytes, big-endian per
/// component)
#[inline]
pub fn pack_vector3_48(value: Vec3, out: &mut [u8]) {
    debug_assert!(out.len() >= 6);
    let x = quantize_unorm(value.x, 16) as u16;
    let y = quantize_unorm(value.y, 16) as u16;
    let z = quantize_unorm(value.z, 16) as u16;
    out[0..2].copy_from_slice(&x.to_be_bytes());
    out[2..4].copy_from_slice(&y.to_be_bytes());
    out[4..6].copy_from_slice(&z.to_be_bytes());
}

/// Unpack three unorm16 components
#[inline]
pub fn unpack_vector3_48(data: &[u8]) -> Vec3 {
    debug_assert!(data.len() >= 6);
    let x = u16::from_be_bytes([data[0], data[1]]) as u32;
    let y = u16::from_be_bytes([data[2], data[3]]) as u32;
    let z = u16::from_be_bytes([data[4], data[5]]) as u32;
    Vec3::new(
        dequantize_unorm(x, 16),
        dequantize_unorm(y, 16),
        dequantize_unorm(z, 16),
    )
}

/// Pack three `[-1.0, 1.0]` components as unorm 11/11/10 in one big-endian
/// u32 (4 bytes)
#[inline]
pub fn pack_vector3_32(value: Vec3, out: &mut [u8]) {
    debug_assert!(out.len() >= 4);
    let x = quantize_unorm(value.x, 11);
    let y = quantize_unorm(value.y, 11);
    let z = quantize_unorm(value.z, 10);
    let word = (x << 21) | (y << 10) | z;
    out[0..4].copy_from_slice(&word.to_be_bytes());
}

/// Unpack three unorm 11/11/10 components
#[inline]
pub fn unpack_vector3_32(data: &[u8]) -> Vec3 {
    debug_assert!(data.len() >= 4);
    let word = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let x = (word >> 21) & 0x7FF;
    let y = (word >> 10) & 0x7FF;
    let z = word & 0x3FF;
    Vec3::new(
        dequantize_unorm(x, 11),
        dequantize_unorm(y, 11),
        dequantize_unorm(z, 10),
    )
}

// ============================================================================
// Variable-Width Normalized Packing
// ============================================================================

/// Pack three `[-1.0, 1.0]` components at an explicit bit count per
/// component, left-aligned MSB-first in an 8-byte slot
pub fn pack_vector3_n(value: Vec3, num_bits: u8, out: &mut [u8]) {
    debug_assert!(num_bits > 0 && (num_bits as u32) * 3 <= 64);
    debug_assert!(out.len() >= 8);
    let n = num_bits as u32;
    let x = quantize_unorm(value.x, num_bits) as u64;
    let y = quantize_unorm(value.y, num_bits) as u64;
    let z = quantize_unorm(value.z, num_bits) as u64;
    let word = (x << (64 - n)) | (y << (64 - n * 2)) | (z << (64 - n * 3));
    out[0..8].copy_from_slice(&word.to_be_bytes());
}

/// Unpack three N-bit components from an 8-byte slot
pub fn unpack_vector3_n(data: &[u8], num_bits: u8) -> Vec3 {
    debug_assert!(num_bits > 0 && (num_bits as u32) * 3 <= 64);
    debug_assert!(data.len() >= 8);
    let n = num_bits as u32;
    let mask = (1u64 << n) - 1;
    let word = u64::from_be_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]);
    let x = ((word >> (64 - n)) & mask) as u32;
    let y = ((word >> (64 - n * 2)) & mask) as u32;
    let z = ((word >> (64 - n * 3)) & mask) as u32;
    Vec3::new(
        dequantize_unorm(x, num_bits),
        dequantize_unorm(y, num_bits),
        dequantize_unorm(z, num_bits),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random f32 in [-1, 1]
    fn lcg_unit(state: &mut u64) -> f32 {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let bits = (*state >> 40) as u32;
        (bits as f32 / 8388607.5) - 1.0
    }

    #[test]
    fn test_quantize_unorm_extremes() {
        assert_eq!(quantize_unorm(-1.0, 8), 0);
        assert_eq!(quantize_unorm(1.0, 8), 255);
        assert_eq!(quantize_unorm(0.0, 16), 32768);
    }

    #[test]
    fn test_quantize_unorm_saturates() {
        assert_eq!(quantize_unorm(-5.0, 10), 0);
        assert_eq!(quantize_unorm(5.0, 10), 1023);
    }

    #[test]
    fn test_vector4_128_exact_roundtrip() {
        let value = Vec4::new(0.25, -0.75, 1.0, -1.0);
        let mut buffer = [0u8; 16];
        pack_vector4_128(value, &mut buffer);
        assert_eq!(unpack_vector4_128(&buffer), value);
    }

    #[test]
    fn test_vector3_96_exact_roundtrip() {
        let value = Vec3::new(123.456, -0.001, 7890.0);
        let mut buffer = [0u8; 12];
        pack_vector3_96(value, &mut buffer);
        assert_eq!(unpack_vector3_96(&buffer), value);
    }

    #[test]
    fn test_vector3_48_layout() {
        // All-ones input saturates every component to 0xFFFF
        let mut buffer = [0u8; 6];
        pack_vector3_48(Vec3::ONE, &mut buffer);
        assert_eq!(buffer, [0xFF; 6]);

        pack_vector3_48(Vec3::NEG_ONE, &mut buffer);
        assert_eq!(buffer, [0x00; 6]);
    }

    #[test]
    fn test_vector3_32_roundtrip_error() {
        let value = Vec3::new(0.3, -0.6, 0.9);
        let mut buffer = [0u8; 4];
        pack_vector3_32(value, &mut buffer);
        let decoded = unpack_vector3_32(&buffer);
        // 10-bit z is the coarsest component
        assert!((decoded - value).abs().max_element() <= 1.0 / 1023.0);
    }

    #[test]
    fn test_vector3_n_msb_first_layout() {
        // 8 bits per component lands each component on a byte boundary
        let mut buffer = [0u8; 8];
        pack_vector3_n(Vec3::new(1.0, -1.0, 0.0), 8, &mut buffer);
        assert_eq!(buffer[0], 0xFF);
        assert_eq!(buffer[1], 0x00);
        assert_eq!(buffer[2], 0x80); // round(0.5 * 255) rounds up
        assert_eq!(&buffer[3..8], &[0u8; 5]);
    }

    #[test]
    fn test_vector3_n_roundtrip_bound() {
        // |unpack(pack(v)) - v| must stay within 2^-(N-1) per component
        let mut state = 0x853c49e6748fea9bu64;
        for num_bits in [3u8, 5, 8, 11, 16, 19] {
            let bound = (2.0f32).powi(-(num_bits as i32 - 1));
            for _ in 0..256 {
                let value = Vec3::new(
                    lcg_unit(&mut state),
                    lcg_unit(&mut state),
                    lcg_unit(&mut state),
                );
                let mut buffer = [0u8; 8];
                pack_vector3_n(value, num_bits, &mut buffer);
                let decoded = unpack_vector3_n(&buffer, num_bits);
                let error = (decoded - value).abs().max_element();
                assert!(
                    error <= bound,
                    "{} bits: error {} exceeds bound {} for {:?}",
                    num_bits,
                    error,
                    bound,
                    value
                );
            }
        }
    }

    #[test]
    fn test_vector3_n_highest_rate_fits_slot() {
        let mut buffer = [0u8; 8];
        pack_vector3_n(Vec3::ONE, 19, &mut buffer);
        let decoded = unpack_vector3_n(&buffer, 19);
        assert!((decoded - Vec3::ONE).abs().max_element() < 1.0e-5);
    }
}
