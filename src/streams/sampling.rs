//! Sampling of quantized bone streams
//!
//! Performs the same unpack, lerp, and normalize as the runtime decoder;
//! the quantization search measures its error through this path, so any
//! divergence from the decoder would miscalibrate the search.

use glam::{Quat, Vec3};

use crate::formats::{num_bits_at_bit_rate, RotationFormat, VectorFormat};
use crate::packing::{
    unpack_vector3_32, unpack_vector3_48, unpack_vector3_96, unpack_vector3_n, unpack_vector4_128,
};
use crate::streams::{BoneStreams, RotationTrackStream, TranslationTrackStream};
use crate::transform::{quat_from_positive_w, quat_nlerp, Transform};

/// Map a sample time to the two enclosing sample keys and the blend factor
/// between them, clamped to the track's range
pub(crate) fn interpolation_keys(
    num_samples: u32,
    sample_rate: u32,
    sample_time: f32,
) -> (usize, usize, f32) {
    debug_assert!(num_samples > 0);
    let key = sample_time * sample_rate as f32;
    let key0 = (key.floor() as u32).min(num_samples - 1);
    let key1 = (key0 + 1).min(num_samples - 1);
    let alpha = (key - key0 as f32).clamp(0.0, 1.0);
    (key0 as usize, key1 as usize, alpha)
}

fn unpack_rotation_sample(stream: &RotationTrackStream, sample_index: usize) -> Quat {
    let data = stream.sample(sample_index);
    match stream.format() {
        RotationFormat::Quat128 => {
            let value = unpack_vector4_128(data);
            Quat::from_xyzw(value.x, value.y, value.z, value.w)
        }
        RotationFormat::QuatDropW96 => quat_from_positive_w(unpack_vector3_96(data)),
        RotationFormat::QuatDropW48 => quat_from_positive_w(unpack_vector3_48(data)),
        RotationFormat::QuatDropW32 => quat_from_positive_w(unpack_vector3_32(data)),
        RotationFormat::QuatDropWVariable => quat_from_positive_w(unpack_vector3_n(
            data,
            num_bits_at_bit_rate(stream.bit_rate()),
        )),
    }
}

fn unpack_vector_sample(stream: &TranslationTrackStream, sample_index: usize) -> Vec3 {
    let data = stream.sample(sample_index);
    match stream.format() {
        VectorFormat::Vector96 => unpack_vector3_96(data),
        VectorFormat::Vector48 => unpack_vector3_48(data),
        VectorFormat::Vector32 => unpack_vector3_32(data),
        VectorFormat::VectorVariable => {
            unpack_vector3_n(data, num_bits_at_bit_rate(stream.bit_rate()))
        }
    }
}

/// Sample one rotation track; default tracks decode to the identity
pub(crate) fn sample_rotation(
    stream: &RotationTrackStream,
    is_default: bool,
    sample_time: f32,
) -> Quat {
    if is_default {
        return Quat::IDENTITY;
    }
    let (key0, key1, alpha) =
        interpolation_keys(stream.num_samples(), stream.sample_rate(), sample_time);
    quat_nlerp(
        unpack_rotation_sample(stream, key0),
        unpack_rotation_sample(stream, key1),
        alpha,
    )
}

/// Sample one translation track; default tracks decode to zero
pub(crate) fn sample_translation(
    stream: &TranslationTrackStream,
    is_default: bool,
    sample_time: f32,
) -> Vec3 {
    if is_default {
        return Vec3::ZERO;
    }
    let (key0, key1, alpha) =
        interpolation_keys(stream.num_samples(), stream.sample_rate(), sample_time);
    unpack_vector_sample(stream, key0).lerp(unpack_vector_sample(stream, key1), alpha)
}

/// Sample one scale track; default tracks decode to unit scale
pub(crate) fn sample_scale(
    stream: &TranslationTrackStream,
    is_default: bool,
    sample_time: f32,
) -> Vec3 {
    if is_default {
        return Vec3::ONE;
    }
    let (key0, key1, alpha) =
        interpolation_keys(stream.num_samples(), stream.sample_rate(), sample_time);
    unpack_vector_sample(stream, key0).lerp(unpack_vector_sample(stream, key1), alpha)
}

/// Sample every bone stream into a local-space pose
pub fn sample_streams(streams: &[BoneStreams], sample_time: f32, out_pose: &mut [Transform]) {
    debug_assert_eq!(streams.len(), out_pose.len());
    for (bone, out) in streams.iter().zip(out_pose.iter_mut()) {
        out.rotation = sample_rotation(&bone.rotations, bone.is_rotation_default, sample_time);
        out.translation =
            sample_translation(&bone.translations, bone.is_translation_default, sample_time);
        out.scale = sample_scale(&bone.scales, bone.is_scale_default, sample_time);
    }
}
