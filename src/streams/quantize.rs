//! Track quantization
//!
//! Two layers: fixed-rate quantization rewrites a raw track at a requested
//! format or bit rate, and the variable-rate search drives a greedy
//! precision-escalation loop that raises individual track bit rates until
//! the posed-skeleton error falls under the clip's threshold.

use tracing::{debug, trace, warn};

use crate::bitset::BitSet;
use crate::clip::AnimationClip;
use crate::error_metric::{
    calculate_skeleton_error, calculate_skeleton_error_contribution, BoneTrackError,
};
use crate::formats::{
    num_bits_at_bit_rate, RotationFormat, RotationVariant, TrackType, VectorFormat,
    HIGHEST_BIT_RATE, INVALID_BIT_RATE, LOWEST_BIT_RATE,
};
use crate::packing::{
    pack_vector3_32, pack_vector3_48, pack_vector3_96, pack_vector3_n, pack_vector4_128,
};
use crate::skeleton::{RigidSkeleton, INVALID_BONE_INDEX};
use crate::streams::sampling::sample_streams;
use crate::streams::{
    BoneStreams, RotationTrackStream, TranslationTrackStream, RAW_SAMPLE_SIZE,
    VARIABLE_SAMPLE_SIZE,
};
use crate::transform::Transform;

/// Scanning the whole clip for the globally worst bone is more expensive
/// than stopping at the first offending sample and not noticeably better
const SCAN_WHOLE_CLIP_FOR_BAD_BONE: bool = false;

// ============================================================================
// Fixed-Rate Quantization: Single Streams
// ============================================================================

/// Rewrite a raw rotation track at a fixed format
///
/// Requesting the variable format here is a programmer error; variable
/// tracks go through [`quantize_variable_rotation_stream`].
pub fn quantize_fixed_rotation_stream(
    raw_stream: &RotationTrackStream,
    rotation_format: RotationFormat,
) -> RotationTrackStream {
    debug_assert_eq!(
        raw_stream.sample_size(),
        RAW_SAMPLE_SIZE,
        "unexpected rotation sample size: {}",
        raw_stream.sample_size()
    );

    let num_samples = raw_stream.num_samples();
    let mut quantized_stream = RotationTrackStream::new(
        num_samples,
        rotation_format.packed_size(),
        raw_stream.sample_rate(),
        rotation_format,
        INVALID_BIT_RATE,
    );

    for sample_index in 0..num_samples as usize {
        let rotation = raw_stream.raw_sample(sample_index);
        let out = quantized_stream.sample_mut(sample_index);
        match rotation_format {
            RotationFormat::Quat128 => pack_vector4_128(rotation, out),
            RotationFormat::QuatDropW96 => pack_vector3_96(rotation.truncate(), out),
            RotationFormat::QuatDropW48 => pack_vector3_48(rotation.truncate(), out),
            RotationFormat::QuatDropW32 => pack_vector3_32(rotation.truncate(), out),
            RotationFormat::QuatDropWVariable => {
                debug_assert!(false, "variable rotation format requires a bit rate")
            }
        }
    }

    quantized_stream
}

/// Rewrite a raw rotation track at an explicit bit rate
pub fn quantize_variable_rotation_stream(
    raw_stream: &RotationTrackStream,
    bit_rate: u8,
) -> RotationTrackStream {
    debug_assert_eq!(
        raw_stream.sample_size(),
        RAW_SAMPLE_SIZE,
        "unexpected rotation sample size: {}",
        raw_stream.sample_size()
    );
    debug_assert!(bit_rate <= HIGHEST_BIT_RATE);

    let num_samples = raw_stream.num_samples();
    let mut quantized_stream = RotationTrackStream::new(
        num_samples,
        VARIABLE_SAMPLE_SIZE,
        raw_stream.sample_rate(),
        RotationFormat::QuatDropWVariable,
        bit_rate,
    );

    let num_bits = num_bits_at_bit_rate(bit_rate);
    for sample_index in 0..num_samples as usize {
        let rotation = raw_stream.raw_sample(sample_index);
        pack_vector3_n(
            rotation.truncate(),
            num_bits,
            quantized_stream.sample_mut(sample_index),
        );
    }

    quantized_stream
}

/// Rewrite a raw translation or scale track at a fixed format
pub fn quantize_fixed_vector_stream(
    raw_stream: &TranslationTrackStream,
    vector_format: VectorFormat,
) -> TranslationTrackStream {
    debug_assert_eq!(
        raw_stream.sample_size(),
        RAW_SAMPLE_SIZE,
        "unexpected vector sample size: {}",
        raw_stream.sample_size()
    );
    debug_assert_eq!(raw_stream.format(), VectorFormat::Vector96);

    let num_samples = raw_stream.num_samples();
    let mut quantized_stream = TranslationTrackStream::new(
        num_samples,
        vector_format.packed_size(),
        raw_stream.sample_rate(),
        vector_format,
        INVALID_BIT_RATE,
    );

    for sample_index in 0..num_samples as usize {
        let value = raw_stream.raw_sample(sample_index).truncate();
        let out = quantized_stream.sample_mut(sample_index);
        match vector_format {
            VectorFormat::Vector96 => pack_vector3_96(value, out),
            VectorFormat::Vector48 => pack_vector3_48(value, out),
            VectorFormat::Vector32 => pack_vector3_32(value, out),
            VectorFormat::VectorVariable => {
                debug_assert!(false, "variable vector format requires a bit rate")
            }
        }
    }

    quantized_stream
}

/// Rewrite a raw translation or scale track at an explicit bit rate
pub fn quantize_variable_vector_stream(
    raw_stream: &TranslationTrackStream,
    bit_rate: u8,
) -> TranslationTrackStream {
    debug_assert_eq!(
        raw_stream.sample_size(),
        RAW_SAMPLE_SIZE,
        "unexpected vector sample size: {}",
        raw_stream.sample_size()
    );
    debug_assert_eq!(raw_stream.format(), VectorFormat::Vector96);
    debug_assert!(bit_rate <= HIGHEST_BIT_RATE);

    let num_samples = raw_stream.num_samples();
    let mut quantized_stream = TranslationTrackStream::new(
        num_samples,
        VARIABLE_SAMPLE_SIZE,
        raw_stream.sample_rate(),
        VectorFormat::VectorVariable,
        bit_rate,
    );

    let num_bits = num_bits_at_bit_rate(bit_rate);
    for sample_index in 0..num_samples as usize {
        let value = raw_stream.raw_sample(sample_index).truncate();
        pack_vector3_n(value, num_bits, quantized_stream.sample_mut(sample_index));
    }

    quantized_stream
}

// ============================================================================
// Fixed-Rate Quantization: Batches
// ============================================================================

fn quantize_fixed_rotation_streams(
    bone_streams: &mut [BoneStreams],
    rotation_format: RotationFormat,
) {
    for bone_stream in bone_streams.iter_mut() {
        // Default tracks aren't quantized
        if bone_stream.is_rotation_default {
            continue;
        }
        bone_stream.rotations =
            quantize_fixed_rotation_stream(&bone_stream.rotations, rotation_format);
    }
}

fn quantize_variable_rotation_streams(bone_streams: &mut [BoneStreams], bit_rate: u8) {
    let highest_precision = RotationVariant::QuatDropW.highest_precision();

    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_rotation_default {
            continue;
        }
        // Constant tracks store their single sample at the variant's full
        // precision and stay out of the search
        if bone_stream.is_rotation_constant {
            bone_stream.rotations =
                quantize_fixed_rotation_stream(&bone_stream.rotations, highest_precision);
        } else {
            bone_stream.rotations =
                quantize_variable_rotation_stream(&bone_stream.rotations, bit_rate);
        }
    }
}

fn quantize_fixed_translation_streams(
    bone_streams: &mut [BoneStreams],
    translation_format: VectorFormat,
) {
    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_translation_default {
            continue;
        }
        // Constant translation tracks store the remaining sample with full precision
        let format = if bone_stream.is_translation_constant {
            VectorFormat::Vector96
        } else {
            translation_format
        };
        bone_stream.translations = quantize_fixed_vector_stream(&bone_stream.translations, format);
    }
}

fn quantize_variable_translation_streams(bone_streams: &mut [BoneStreams], bit_rate: u8) {
    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_translation_default {
            continue;
        }
        if bone_stream.is_translation_constant {
            bone_stream.translations =
                quantize_fixed_vector_stream(&bone_stream.translations, VectorFormat::Vector96);
        } else {
            bone_stream.translations =
                quantize_variable_vector_stream(&bone_stream.translations, bit_rate);
        }
    }
}

fn quantize_fixed_scale_streams(bone_streams: &mut [BoneStreams], scale_format: VectorFormat) {
    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_scale_default {
            continue;
        }
        let format = if bone_stream.is_scale_constant {
            VectorFormat::Vector96
        } else {
            scale_format
        };
        bone_stream.scales = quantize_fixed_vector_stream(&bone_stream.scales, format);
    }
}

fn quantize_variable_scale_streams(bone_streams: &mut [BoneStreams], bit_rate: u8) {
    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_scale_default {
            continue;
        }
        if bone_stream.is_scale_constant {
            bone_stream.scales =
                quantize_fixed_vector_stream(&bone_stream.scales, VectorFormat::Vector96);
        } else {
            bone_stream.scales = quantize_variable_vector_stream(&bone_stream.scales, bit_rate);
        }
    }
}

// ============================================================================
// Variable-Rate Search
// ============================================================================

/// Number of samples in the animated tracks
fn animated_num_samples(bone_streams: &[BoneStreams]) -> u32 {
    let mut num_samples = 0;
    for bone_stream in bone_streams {
        if bone_stream.is_rotation_animated() {
            num_samples = num_samples.max(bone_stream.rotations.num_samples());
        }
        if bone_stream.is_translation_animated() {
            num_samples = num_samples.max(bone_stream.translations.num_samples());
        }
        if bone_stream.is_scale_animated() {
            num_samples = num_samples.max(bone_stream.scales.num_samples());
        }
    }
    num_samples
}

fn quantize_variable_streams(
    bone_streams: &mut [BoneStreams],
    rotation_format: RotationFormat,
    translation_format: VectorFormat,
    clip: &AnimationClip,
    skeleton: &RigidSkeleton,
) {
    let num_bones = bone_streams.len();

    // The working copy the search mutates; the raw input streams stay
    // untouched so every requantization starts from full precision
    let mut quantized_streams: Vec<BoneStreams> =
        bone_streams.iter().map(|bone| bone.duplicate()).collect();

    let is_rotation_variable = rotation_format.is_variable();
    let is_translation_variable = translation_format.is_variable();

    // Start every variable track at the coarsest rate
    if is_rotation_variable {
        quantize_variable_rotation_streams(&mut quantized_streams, LOWEST_BIT_RATE);
    } else {
        quantize_fixed_rotation_streams(&mut quantized_streams, rotation_format);
    }

    if is_translation_variable {
        quantize_variable_translation_streams(&mut quantized_streams, LOWEST_BIT_RATE);
        quantize_variable_scale_streams(&mut quantized_streams, LOWEST_BIT_RATE);
    } else {
        quantize_fixed_translation_streams(&mut quantized_streams, translation_format);
        quantize_fixed_scale_streams(&mut quantized_streams, translation_format);
    }

    let num_samples = animated_num_samples(bone_streams);
    let sample_rate = clip.sample_rate() as f32;
    let clip_duration = clip.duration();
    let error_threshold = clip.error_threshold();

    let mut raw_local_pose = vec![Transform::IDENTITY; num_bones];
    let mut lossy_local_pose = vec![Transform::IDENTITY; num_bones];
    let mut error_per_bone = vec![0.0f32; num_bones];
    let mut error_per_stream = vec![BoneTrackError::default(); num_bones];

    // Bones ruled out because every upgrade path along their chain is spent
    let mut low_resolution_bones = BitSet::new(num_bones);

    let mut num_upgrades = 0u32;
    let mut error = f32::MAX;

    while error > error_threshold {
        error = 0.0;

        // Find the first bone anywhere in the clip whose error is above the
        // threshold, scanning bones parents-first within each sample
        let mut bad_bone_index = INVALID_BONE_INDEX;
        let mut worst_clip_error = error_threshold;
        for sample_index in 0..num_samples {
            let sample_time = (sample_index as f32 / sample_rate).min(clip_duration);

            // The reference is the clip itself: the error measured here is
            // end to end, including any loss before quantization
            clip.sample_pose(sample_time, &mut raw_local_pose);
            sample_streams(&quantized_streams, sample_time, &mut lossy_local_pose);
            calculate_skeleton_error(
                skeleton,
                &raw_local_pose,
                &lossy_local_pose,
                &mut error_per_bone,
            );

            for bone_index in 0..num_bones {
                if error_per_bone[bone_index] > worst_clip_error
                    && !low_resolution_bones.test(bone_index)
                {
                    worst_clip_error = error_per_bone[bone_index];
                    error = error_per_bone[bone_index];
                    bad_bone_index = bone_index as u16;
                    break;
                }
            }

            if !SCAN_WHOLE_CLIP_FOR_BAD_BONE && bad_bone_index != INVALID_BONE_INDEX {
                break;
            }
        }

        if bad_bone_index == INVALID_BONE_INDEX {
            // Threshold satisfied, or every remaining offender is flagged
            break;
        }

        // Split the bad bone's error between the tracks along its chain,
        // using the last sample pair we measured
        calculate_skeleton_error_contribution(
            skeleton,
            &raw_local_pose,
            &lossy_local_pose,
            bad_bone_index,
            &mut error_per_stream,
        );

        // Walk from the bad bone up to the root and pick the track with the
        // largest contribution that can still gain precision. Raising an
        // ancestor improves every bone below it.
        let mut target_bone_index = INVALID_BONE_INDEX;
        let mut target_track_type = TrackType::Rotation;
        let mut worst_track_error = 0.0f32;

        let mut current_bone_index = bad_bone_index;
        while current_bone_index != INVALID_BONE_INDEX {
            let bone_stream = &quantized_streams[current_bone_index as usize];
            let track_error = &error_per_stream[current_bone_index as usize];

            let rotation_bit_rate = bone_stream.rotations.bit_rate();
            if is_rotation_variable
                && rotation_bit_rate < HIGHEST_BIT_RATE
                && track_error.rotation > worst_track_error
            {
                target_bone_index = current_bone_index;
                target_track_type = TrackType::Rotation;
                worst_track_error = track_error.rotation;
            }

            let translation_bit_rate = bone_stream.translations.bit_rate();
            if is_translation_variable
                && translation_bit_rate < HIGHEST_BIT_RATE
                && track_error.translation > worst_track_error
            {
                target_bone_index = current_bone_index;
                target_track_type = TrackType::Translation;
                worst_track_error = track_error.translation;
            }

            let scale_bit_rate = bone_stream.scales.bit_rate();
            if is_translation_variable
                && scale_bit_rate < HIGHEST_BIT_RATE
                && track_error.scale > worst_track_error
            {
                target_bone_index = current_bone_index;
                target_track_type = TrackType::Scale;
                worst_track_error = track_error.scale;
            }

            current_bone_index = skeleton.bone(current_bone_index).parent_index;
        }

        if target_bone_index == INVALID_BONE_INDEX {
            // The whole chain is already at full precision; the remaining
            // error comes from a lossy fixed format and cannot be reduced.
            // Rule the bone out and keep going with the rest.
            warn!(
                bone_index = bad_bone_index,
                error, "no upgradable track in chain, flagging bone as low resolution"
            );
            low_resolution_bones.set(bad_bone_index as usize, true);
            continue;
        }

        // Requantize the chosen track one bit rate higher, from the raw input
        let target = target_bone_index as usize;
        let new_bit_rate = match target_track_type {
            TrackType::Rotation => {
                let new_bit_rate = quantized_streams[target].rotations.bit_rate() + 1;
                quantized_streams[target].rotations =
                    quantize_variable_rotation_stream(&bone_streams[target].rotations, new_bit_rate);
                new_bit_rate
            }
            TrackType::Translation => {
                let new_bit_rate = quantized_streams[target].translations.bit_rate() + 1;
                quantized_streams[target].translations = quantize_variable_vector_stream(
                    &bone_streams[target].translations,
                    new_bit_rate,
                );
                new_bit_rate
            }
            TrackType::Scale => {
                let new_bit_rate = quantized_streams[target].scales.bit_rate() + 1;
                quantized_streams[target].scales =
                    quantize_variable_vector_stream(&bone_streams[target].scales, new_bit_rate);
                new_bit_rate
            }
        };
        num_upgrades += 1;
        trace!(
            bone_index = target_bone_index,
            track = ?target_track_type,
            bit_rate = new_bit_rate,
            error,
            "raised track precision"
        );
    }

    // Commit the working copy
    for (bone_stream, quantized) in bone_streams.iter_mut().zip(quantized_streams) {
        *bone_stream = quantized;
    }

    debug!(
        num_upgrades,
        num_low_resolution_bones = low_resolution_bones.count(),
        "variable-rate quantization converged"
    );
}

// ============================================================================
// Entry Point
// ============================================================================

/// Quantize every bone stream in place
///
/// With two fixed formats this is a single batch rewrite. When either
/// format is variable, a greedy search escalates per-track bit rates until
/// the posed-skeleton error drops under the clip's threshold or no further
/// upgrade can help.
///
/// The input streams must be raw (16-byte samples) as produced by
/// [`extract_bone_streams`](crate::streams::extract_bone_streams), with
/// values already in range for the chosen formats.
pub fn quantize_streams(
    bone_streams: &mut [BoneStreams],
    rotation_format: RotationFormat,
    translation_format: VectorFormat,
    clip: &AnimationClip,
    skeleton: &RigidSkeleton,
) {
    debug_assert_eq!(bone_streams.len(), skeleton.num_bones() as usize);
    debug_assert_eq!(bone_streams.len(), clip.num_bones());

    if rotation_format.is_variable() || translation_format.is_variable() {
        quantize_variable_streams(
            bone_streams,
            rotation_format,
            translation_format,
            clip,
            skeleton,
        );
    } else {
        quantize_fixed_rotation_streams(bone_streams, rotation_format);
        quantize_fixed_translation_streams(bone_streams, translation_format);
        quantize_fixed_scale_streams(bone_streams, translation_format);
    }
}
