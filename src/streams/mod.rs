//! Per-bone track streams
//!
//! A track stream owns a contiguous buffer of equal-width samples for a
//! single track, tagged with its format, bit rate, sample rate, and sample
//! count. Bone streams group the rotation, translation, and scale tracks of
//! one skeletal joint together with their default/constant flags.
//!
//! Raw (unquantized) streams hold one `[f32; 4]` per sample (16 bytes);
//! quantized streams hold the packed width implied by their format.

pub(crate) mod quantize;
pub(crate) mod sampling;

#[cfg(test)]
mod tests;

pub use quantize::{
    quantize_fixed_rotation_stream, quantize_fixed_vector_stream, quantize_streams,
    quantize_variable_rotation_stream, quantize_variable_vector_stream,
};
pub use sampling::sample_streams;

use glam::{Quat, Vec3, Vec4};

use crate::clip::AnimationClip;
use crate::formats::{RotationFormat, RotationVariant, VectorFormat, INVALID_BIT_RATE};
use crate::packing::pack_vector4_128;
use crate::transform::quat_ensure_positive_w;

/// Sample width of raw, unquantized streams (one f32x4)
pub const RAW_SAMPLE_SIZE: u32 = 16;

/// Sample slot width of variable-rate streams
pub const VARIABLE_SAMPLE_SIZE: u32 = 8;

/// Per-component tolerance when deciding whether a track's samples are all
/// equal
const CONSTANT_TRACK_THRESHOLD: f32 = 1.0e-5;

// ============================================================================
// Track Streams
// ============================================================================

/// A contiguous buffer of equal-width track samples
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStream<F: Copy> {
    data: Vec<u8>,
    sample_size: u32,
    sample_rate: u32,
    format: F,
    bit_rate: u8,
}

pub type RotationTrackStream = TrackStream<RotationFormat>;
pub type TranslationTrackStream = TrackStream<VectorFormat>;

impl<F: Copy> TrackStream<F> {
    /// Allocate a zeroed stream of `num_samples × sample_size` bytes
    pub fn new(num_samples: u32, sample_size: u32, sample_rate: u32, format: F, bit_rate: u8) -> Self {
        debug_assert!(sample_size > 0);
        Self {
            data: vec![0; num_samples as usize * sample_size as usize],
            sample_size,
            sample_rate,
            format,
            bit_rate,
        }
    }

    #[inline]
    pub fn num_samples(&self) -> u32 {
        (self.data.len() / self.sample_size as usize) as u32
    }

    #[inline]
    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn format(&self) -> F {
        self.format
    }

    /// Bit-rate index; only meaningful on variable-format streams,
    /// [`INVALID_BIT_RATE`] otherwise
    #[inline]
    pub fn bit_rate(&self) -> u8 {
        self.bit_rate
    }

    /// Read a raw sample as its pre-quantization f32x4 value
    #[inline]
    pub fn raw_sample(&self, sample_index: usize) -> Vec4 {
        debug_assert_eq!(self.sample_size, RAW_SAMPLE_SIZE, "raw access on a quantized stream");
        let offset = sample_index * self.sample_size as usize;
        let values: [f32; 4] =
            bytemuck::pod_read_unaligned(&self.data[offset..offset + RAW_SAMPLE_SIZE as usize]);
        Vec4::from_array(values)
    }

    /// Borrow the bytes of one sample
    #[inline]
    pub fn sample(&self, sample_index: usize) -> &[u8] {
        let size = self.sample_size as usize;
        let offset = sample_index * size;
        &self.data[offset..offset + size]
    }

    /// Mutable cursor into one sample, for packers writing quantized output
    #[inline]
    pub fn sample_mut(&mut self, sample_index: usize) -> &mut [u8] {
        let size = self.sample_size as usize;
        let offset = sample_index * size;
        &mut self.data[offset..offset + size]
    }

    /// Deep-copy the stream
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}

// ============================================================================
// Bone Streams
// ============================================================================

/// The tracks of a single skeletal joint
///
/// Exactly one of default / constant / animated holds per track kind:
/// a default track is an empty stream decoding to the identity value, a
/// constant track stores a single sample shared by the whole clip, and an
/// animated track stores one sample per clip sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneStreams {
    pub rotations: RotationTrackStream,
    pub translations: TranslationTrackStream,
    pub scales: TranslationTrackStream,
    pub is_rotation_default: bool,
    pub is_rotation_constant: bool,
    pub is_translation_default: bool,
    pub is_translation_constant: bool,
    pub is_scale_default: bool,
    pub is_scale_constant: bool,
}

impl BoneStreams {
    /// Deep-copy the owned tracks
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    #[inline]
    pub fn is_rotation_animated(&self) -> bool {
        !self.is_rotation_default && !self.is_rotation_constant
    }

    #[inline]
    pub fn is_translation_animated(&self) -> bool {
        !self.is_translation_default && !self.is_translation_constant
    }

    #[inline]
    pub fn is_scale_animated(&self) -> bool {
        !self.is_scale_default && !self.is_scale_constant
    }
}

// ============================================================================
// Stream Extraction
// ============================================================================

/// Build raw bone streams from a reference clip
///
/// The clip's track-length convention is authoritative: an empty track is
/// default and stores no samples. Non-empty tracks whose samples are all
/// equal are constant and compact down to a single sample; a constant value
/// is never demoted to default, even when it happens to equal the identity.
/// Rotations are converted to the representation of the chosen format's
/// variant: drop-w variants store quaternions flipped into the w >= 0
/// hemisphere so decode-side reconstruction recovers the same rotation.
pub fn extract_bone_streams(
    clip: &AnimationClip,
    rotation_format: RotationFormat,
) -> Vec<BoneStreams> {
    let sample_rate = clip.sample_rate();
    let drop_w = rotation_format.variant() == RotationVariant::QuatDropW;

    clip.bones()
        .iter()
        .map(|bone| {
            let rotations: Vec<Quat> = if drop_w {
                bone.rotations.iter().map(|q| quat_ensure_positive_w(*q)).collect()
            } else {
                bone.rotations.clone()
            };
            let (is_rotation_default, is_rotation_constant) = classify_rotations(&rotations);
            let (is_translation_default, is_translation_constant) =
                classify_vectors(&bone.translations);
            let (is_scale_default, is_scale_constant) = classify_vectors(&bone.scales);

            let mut rotation_stream = RotationTrackStream::new(
                stored_samples(rotations.len(), is_rotation_default, is_rotation_constant),
                RAW_SAMPLE_SIZE,
                sample_rate,
                RotationFormat::Quat128,
                INVALID_BIT_RATE,
            );
            for sample_index in 0..rotation_stream.num_samples() as usize {
                pack_vector4_128(
                    Vec4::from(rotations[sample_index]),
                    rotation_stream.sample_mut(sample_index),
                );
            }

            let translation_stream = build_raw_vector_stream(
                &bone.translations,
                sample_rate,
                is_translation_default,
                is_translation_constant,
            );
            let scale_stream = build_raw_vector_stream(
                &bone.scales,
                sample_rate,
                is_scale_default,
                is_scale_constant,
            );

            BoneStreams {
                rotations: rotation_stream,
                translations: translation_stream,
                scales: scale_stream,
                is_rotation_default,
                is_rotation_constant,
                is_translation_default,
                is_translation_constant,
                is_scale_default,
                is_scale_constant,
            }
        })
        .collect()
}

fn stored_samples(track_len: usize, is_default: bool, is_constant: bool) -> u32 {
    if is_default {
        0
    } else if is_constant {
        1
    } else {
        track_len as u32
    }
}

fn build_raw_vector_stream(
    samples: &[Vec3],
    sample_rate: u32,
    is_default: bool,
    is_constant: bool,
) -> TranslationTrackStream {
    let mut stream = TranslationTrackStream::new(
        stored_samples(samples.len(), is_default, is_constant),
        RAW_SAMPLE_SIZE,
        sample_rate,
        VectorFormat::Vector96,
        INVALID_BIT_RATE,
    );
    for sample_index in 0..stream.num_samples() as usize {
        pack_vector4_128(samples[sample_index].extend(0.0), stream.sample_mut(sample_index));
    }
    stream
}

/// Returns `(is_default, is_constant)`; only an empty track is default
fn classify_rotations(samples: &[Quat]) -> (bool, bool) {
    let Some(&first) = samples.first() else {
        return (true, false);
    };
    let is_constant = samples.iter().all(|q| {
        // q and -q are the same rotation
        let q = if q.dot(first) < 0.0 { -*q } else { *q };
        (Vec4::from(q) - Vec4::from(first)).abs().max_element() <= CONSTANT_TRACK_THRESHOLD
    });
    (false, is_constant)
}

/// Returns `(is_default, is_constant)`; only an empty track is default
fn classify_vectors(samples: &[Vec3]) -> (bool, bool) {
    let Some(&first) = samples.first() else {
        return (true, false);
    };
    let is_constant = samples
        .iter()
        .all(|v| (*v - first).abs().max_element() <= CONSTANT_TRACK_THRESHOLD);
    (false, is_constant)
}
