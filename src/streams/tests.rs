//! Tests for track streams, extraction, sampling, and quantization

use super::*;

use glam::{Quat, Vec3, Vec4};

use crate::clip::{AnimatedBone, AnimationClip};
use crate::formats::{
    RotationFormat, VectorFormat, HIGHEST_BIT_RATE, INVALID_BIT_RATE, LOWEST_BIT_RATE,
};
use crate::packing::pack_vector4_128;
use crate::transform::Transform;

fn clip_with(bones: Vec<AnimatedBone>, num_samples: u32) -> AnimationClip {
    AnimationClip::new(bones, num_samples, 30, 1.0e-3).unwrap()
}

fn sweep_rotations(count: usize, radians: f32) -> Vec<Quat> {
    (0..count)
        .map(|i| Quat::from_rotation_y(i as f32 / (count - 1) as f32 * radians))
        .collect()
}

// ========================================================================
// Track Stream Tests
// ========================================================================

#[test]
fn test_stream_allocation() {
    let stream = RotationTrackStream::new(10, RAW_SAMPLE_SIZE, 30, RotationFormat::Quat128, INVALID_BIT_RATE);
    assert_eq!(stream.num_samples(), 10);
    assert_eq!(stream.sample_size(), 16);
    assert_eq!(stream.sample_rate(), 30);
    assert_eq!(stream.bit_rate(), INVALID_BIT_RATE);
}

#[test]
fn test_raw_sample_roundtrip() {
    let mut stream = RotationTrackStream::new(2, RAW_SAMPLE_SIZE, 30, RotationFormat::Quat128, INVALID_BIT_RATE);
    let value = Vec4::new(0.1, -0.2, 0.3, 0.9);
    pack_vector4_128(value, stream.sample_mut(1));
    assert_eq!(stream.raw_sample(1), value);
    assert_eq!(stream.raw_sample(0), Vec4::ZERO);
}

#[test]
fn test_duplicate_is_deep() {
    let mut stream = TranslationTrackStream::new(1, RAW_SAMPLE_SIZE, 30, VectorFormat::Vector96, INVALID_BIT_RATE);
    pack_vector4_128(Vec4::ONE, stream.sample_mut(0));
    let copy = stream.duplicate();
    pack_vector4_128(Vec4::ZERO, stream.sample_mut(0));
    assert_eq!(copy.raw_sample(0), Vec4::ONE);
    assert_eq!(stream.raw_sample(0), Vec4::ZERO);
}

// ========================================================================
// Extraction Tests
// ========================================================================

#[test]
fn test_extract_classifies_tracks() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: sweep_rotations(8, 0.5),
            translations: vec![Vec3::new(1.0, 2.0, 3.0); 8],
            scales: vec![],
        }],
        8,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let bone = &streams[0];

    assert!(bone.is_rotation_animated());
    assert_eq!(bone.rotations.num_samples(), 8);

    // Eight equal translation samples compact down to one
    assert!(bone.is_translation_constant);
    assert_eq!(bone.translations.num_samples(), 1);

    assert!(bone.is_scale_default);
    assert_eq!(bone.scales.num_samples(), 0);
}

#[test]
fn test_extract_identity_valued_constants_stay_constant() {
    // An authored track whose constant value happens to be the identity is
    // still a constant track; only an empty track is default
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: vec![Quat::IDENTITY; 4],
            translations: vec![Vec3::ZERO; 4],
            scales: vec![Vec3::ONE; 4],
        }],
        4,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let bone = &streams[0];

    assert!(bone.is_rotation_constant && !bone.is_rotation_default);
    assert!(bone.is_translation_constant && !bone.is_translation_default);
    assert!(bone.is_scale_constant && !bone.is_scale_default);
    assert_eq!(bone.rotations.num_samples(), 1);
    assert_eq!(bone.translations.num_samples(), 1);
    assert_eq!(bone.scales.num_samples(), 1);
}

#[test]
fn test_extract_empty_tracks_are_default() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: vec![],
            translations: vec![],
            scales: vec![],
        }],
        4,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let bone = &streams[0];

    assert!(bone.is_rotation_default && !bone.is_rotation_constant);
    assert!(bone.is_translation_default && !bone.is_translation_constant);
    assert!(bone.is_scale_default && !bone.is_scale_constant);
    assert_eq!(bone.rotations.num_samples(), 0);
    assert_eq!(bone.translations.num_samples(), 0);
    assert_eq!(bone.scales.num_samples(), 0);
}

#[test]
fn test_extract_flips_negative_w_for_drop_w() {
    let rotation = -Quat::from_rotation_x(0.8);
    assert!(rotation.w < 0.0);
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: vec![rotation; 2],
            translations: vec![],
            scales: vec![],
        }],
        2,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let stored = streams[0].rotations.raw_sample(0);
    assert!(stored.w >= 0.0);

    // The full-quaternion variant keeps the hemisphere as authored
    let streams = extract_bone_streams(&clip, RotationFormat::Quat128);
    let stored = streams[0].rotations.raw_sample(0);
    assert!(stored.w < 0.0);
}

#[test]
fn test_extract_negated_samples_are_constant() {
    // q and -q encode the same rotation, so the track is constant
    let rotation = Quat::from_rotation_z(0.4);
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: vec![rotation, -rotation, rotation],
            translations: vec![],
            scales: vec![],
        }],
        3,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    assert!(streams[0].is_rotation_constant);
}

// ========================================================================
// Fixed Quantization Tests
// ========================================================================

#[test]
fn test_fixed_rotation_quat128_is_lossless() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: sweep_rotations(4, 1.0),
            translations: vec![],
            scales: vec![],
        }],
        4,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::Quat128);
    let quantized = quantize_fixed_rotation_stream(&streams[0].rotations, RotationFormat::Quat128);

    assert_eq!(quantized.format(), RotationFormat::Quat128);
    assert_eq!(quantized.sample_size(), 16);
    for sample_index in 0..4 {
        assert_eq!(
            quantized.sample(sample_index),
            streams[0].rotations.sample(sample_index)
        );
    }
}

#[test]
fn test_fixed_quantization_is_deterministic() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: sweep_rotations(16, 2.0),
            translations: vec![],
            scales: vec![],
        }],
        16,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let first = quantize_fixed_rotation_stream(&streams[0].rotations, RotationFormat::QuatDropW48);
    let second = quantize_fixed_rotation_stream(&streams[0].rotations, RotationFormat::QuatDropW48);
    assert_eq!(first, second);
}

#[test]
fn test_fixed_vector_formats_size_output() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: vec![],
            translations: vec![Vec3::new(0.5, -0.5, 0.25), Vec3::new(-0.25, 0.75, 0.0)],
            scales: vec![],
        }],
        2,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);

    for (format, size) in [
        (VectorFormat::Vector96, 12),
        (VectorFormat::Vector48, 6),
        (VectorFormat::Vector32, 4),
    ] {
        let quantized = quantize_fixed_vector_stream(&streams[0].translations, format);
        assert_eq!(quantized.sample_size(), size);
        assert_eq!(quantized.num_samples(), 2);
        assert_eq!(quantized.bit_rate(), INVALID_BIT_RATE);
    }
}

#[test]
fn test_variable_quantization_tags_bit_rate() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: sweep_rotations(8, 1.5),
            translations: vec![],
            scales: vec![],
        }],
        8,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);

    for bit_rate in [LOWEST_BIT_RATE, 5, HIGHEST_BIT_RATE] {
        let quantized = quantize_variable_rotation_stream(&streams[0].rotations, bit_rate);
        assert_eq!(quantized.format(), RotationFormat::QuatDropWVariable);
        assert_eq!(quantized.bit_rate(), bit_rate);
        assert_eq!(quantized.sample_size(), VARIABLE_SAMPLE_SIZE);
        assert_eq!(quantized.num_samples(), 8);
    }
}

#[test]
fn test_variable_error_shrinks_with_bit_rate() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: sweep_rotations(8, 2.5),
            translations: vec![],
            scales: vec![],
        }],
        8,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let raw = &streams[0].rotations;

    let error_at = |bit_rate: u8| {
        let quantized = quantize_variable_rotation_stream(raw, bit_rate);
        let mut worst = 0.0f32;
        for sample_index in 0..8 {
            let reference = raw.raw_sample(sample_index);
            let decoded = crate::transform::quat_from_positive_w(
                crate::packing::unpack_vector3_n(
                    quantized.sample(sample_index),
                    crate::formats::num_bits_at_bit_rate(bit_rate),
                ),
            );
            let reference = Quat::from_xyzw(reference.x, reference.y, reference.z, reference.w);
            worst = worst.max(1.0 - decoded.dot(reference).abs());
        }
        worst
    };

    assert!(error_at(LOWEST_BIT_RATE) > error_at(8));
    assert!(error_at(8) > error_at(HIGHEST_BIT_RATE));
    assert!(error_at(HIGHEST_BIT_RATE) < 1.0e-9);
}

// ========================================================================
// Sampling Tests
// ========================================================================

#[test]
fn test_sample_streams_matches_clip_at_full_precision() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: sweep_rotations(8, 1.0),
            translations: (0..8).map(|i| Vec3::new(i as f32 * 0.1, 0.0, 0.0)).collect(),
            scales: vec![],
        }],
        8,
    );
    let mut streams = extract_bone_streams(&clip, RotationFormat::QuatDropW96);
    let skeleton = crate::skeleton::RigidSkeleton::new(vec![crate::skeleton::RigidBone::root(1.0)])
        .unwrap();
    quantize_streams(
        &mut streams,
        RotationFormat::QuatDropW96,
        VectorFormat::Vector96,
        &clip,
        &skeleton,
    );

    let mut clip_pose = [Transform::IDENTITY];
    let mut stream_pose = [Transform::IDENTITY];
    for time in [0.0, 0.05, 0.1, 0.2, 1.0] {
        clip.sample_pose(time, &mut clip_pose);
        sample_streams(&streams, time, &mut stream_pose);
        assert!(
            clip_pose[0]
                .rotation
                .dot(stream_pose[0].rotation)
                .abs()
                > 0.999999,
            "rotation diverged at t = {}",
            time
        );
        assert!(
            (clip_pose[0].translation - stream_pose[0].translation)
                .abs()
                .max_element()
                < 1.0e-6,
            "translation diverged at t = {}",
            time
        );
    }
}

#[test]
fn test_sample_streams_default_tracks_decode_to_identity() {
    let clip = clip_with(
        vec![AnimatedBone {
            rotations: vec![],
            translations: vec![],
            scales: vec![],
        }],
        4,
    );
    let streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
    let mut pose = [Transform::new(
        Quat::from_rotation_x(1.0),
        Vec3::ONE,
        Vec3::splat(5.0),
    )];
    sample_streams(&streams, 0.0, &mut pose);
    assert_eq!(pose[0], Transform::IDENTITY);
}
