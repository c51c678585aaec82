//! Reference animation clip
//!
//! The clip owns the raw, uncompressed per-bone samples and is the ground
//! truth the quantization search measures against. Sampling uses the same
//! interpolation rules as the compressed-stream decoder: linear for
//! translation and scale, normalized linear for rotation.

use std::fmt;

use glam::{Quat, Vec3};

use crate::streams::sampling::interpolation_keys;
use crate::transform::{quat_nlerp, Transform};

/// Raw sample tracks for one bone
///
/// Track lengths are `num_samples` for animated tracks, 1 for constant
/// tracks, or 0 for tracks left at their identity value.
#[derive(Debug, Clone, Default)]
pub struct AnimatedBone {
    pub rotations: Vec<Quat>,
    pub translations: Vec<Vec3>,
    pub scales: Vec<Vec3>,
}

/// Errors that can occur when building a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipError {
    NoSamples,
    InvalidSampleRate,
    /// A track is neither empty, single-sample, nor `num_samples` long
    InvalidTrackLength { bone_index: u16 },
}

impl fmt::Display for ClipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipError::NoSamples => write!(f, "clip must contain at least one sample"),
            ClipError::InvalidSampleRate => write!(f, "sample rate must be non-zero"),
            ClipError::InvalidTrackLength { bone_index } => {
                write!(f, "bone {} has a track of invalid length", bone_index)
            }
        }
    }
}

impl std::error::Error for ClipError {}

/// A reference clip: raw bone tracks, duration, and the error budget the
/// compression must stay under
#[derive(Debug, Clone)]
pub struct AnimationClip {
    bones: Vec<AnimatedBone>,
    num_samples: u32,
    sample_rate: u32,
    error_threshold: f32,
}

impl AnimationClip {
    pub fn new(
        bones: Vec<AnimatedBone>,
        num_samples: u32,
        sample_rate: u32,
        error_threshold: f32,
    ) -> Result<Self, ClipError> {
        if num_samples == 0 {
            return Err(ClipError::NoSamples);
        }
        if sample_rate == 0 {
            return Err(ClipError::InvalidSampleRate);
        }
        for (bone_index, bone) in bones.iter().enumerate() {
            let valid = |len: usize| len == 0 || len == 1 || len == num_samples as usize;
            if !valid(bone.rotations.len())
                || !valid(bone.translations.len())
                || !valid(bone.scales.len())
            {
                return Err(ClipError::InvalidTrackLength {
                    bone_index: bone_index as u16,
                });
            }
        }
        Ok(Self {
            bones,
            num_samples,
            sample_rate,
            error_threshold,
        })
    }

    #[inline]
    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn num_samples(&self) -> u32 {
        self.num_samples
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Clip length in seconds
    #[inline]
    pub fn duration(&self) -> f32 {
        if self.num_samples <= 1 {
            0.0
        } else {
            (self.num_samples - 1) as f32 / self.sample_rate as f32
        }
    }

    #[inline]
    pub fn error_threshold(&self) -> f32 {
        self.error_threshold
    }

    pub fn bones(&self) -> &[AnimatedBone] {
        &self.bones
    }

    /// Sample the reference local-space pose at an arbitrary time
    pub fn sample_pose(&self, sample_time: f32, out_pose: &mut [Transform]) {
        debug_assert_eq!(out_pose.len(), self.bones.len());
        for (bone, out) in self.bones.iter().zip(out_pose.iter_mut()) {
            out.rotation = match bone.rotations.len() {
                0 => Quat::IDENTITY,
                1 => bone.rotations[0],
                len => {
                    let (k0, k1, alpha) =
                        interpolation_keys(len as u32, self.sample_rate, sample_time);
                    quat_nlerp(bone.rotations[k0], bone.rotations[k1], alpha)
                }
            };
            out.translation = match bone.translations.len() {
                0 => Vec3::ZERO,
                1 => bone.translations[0],
                len => {
                    let (k0, k1, alpha) =
                        interpolation_keys(len as u32, self.sample_rate, sample_time);
                    bone.translations[k0].lerp(bone.translations[k1], alpha)
                }
            };
            out.scale = match bone.scales.len() {
                0 => Vec3::ONE,
                1 => bone.scales[0],
                len => {
                    let (k0, k1, alpha) =
                        interpolation_keys(len as u32, self.sample_rate, sample_time);
                    bone.scales[k0].lerp(bone.scales[k1], alpha)
                }
            };
        }
    }
}
