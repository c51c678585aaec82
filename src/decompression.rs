//! Decompression output adapter
//!
//! The decoder writes a pose through a caller-supplied [`OutputWriter`]
//! rather than into a fixed pose type, so the caller keeps its own transform
//! layout. The skip predicates let the decoder elide unpack work for tracks
//! the caller is not interested in.

use glam::{Quat, Vec3};

use crate::streams::sampling::{sample_rotation, sample_scale, sample_translation};
use crate::streams::BoneStreams;

/// Sink for decompressed bone transforms
///
/// Every method has a default: nothing is skipped and writes are dropped.
/// Implementors override the writers they care about and any skip predicate
/// that lets the decoder do less work.
pub trait OutputWriter {
    /// Skip every rotation track
    fn skip_all_bone_rotations(&self) -> bool {
        false
    }

    /// Skip every translation track
    fn skip_all_bone_translations(&self) -> bool {
        false
    }

    /// Skip every scale track
    fn skip_all_bone_scales(&self) -> bool {
        false
    }

    /// Skip a single bone's rotation
    fn skip_bone_rotation(&self, bone_index: u16) -> bool {
        let _ = bone_index;
        false
    }

    /// Skip a single bone's translation
    fn skip_bone_translation(&self, bone_index: u16) -> bool {
        let _ = bone_index;
        false
    }

    /// Skip a single bone's scale
    fn skip_bone_scale(&self, bone_index: u16) -> bool {
        let _ = bone_index;
        false
    }

    /// Receive a decoded rotation
    fn write_bone_rotation(&mut self, bone_index: u16, rotation: Quat) {
        let _ = (bone_index, rotation);
    }

    /// Receive a decoded translation
    fn write_bone_translation(&mut self, bone_index: u16, translation: Vec3) {
        let _ = (bone_index, translation);
    }

    /// Receive a decoded scale
    fn write_bone_scale(&mut self, bone_index: u16, scale: Vec3) {
        let _ = (bone_index, scale);
    }
}

/// Decode the pose at `sample_time` and hand each track value to `writer`
///
/// Default tracks decode to their identity value without touching the
/// stream data; skipped tracks are not unpacked at all.
pub fn decompress_pose<W: OutputWriter>(
    streams: &[BoneStreams],
    sample_time: f32,
    writer: &mut W,
) {
    let skip_rotations = writer.skip_all_bone_rotations();
    let skip_translations = writer.skip_all_bone_translations();
    let skip_scales = writer.skip_all_bone_scales();

    for (bone_index, bone) in streams.iter().enumerate() {
        let bone_index = bone_index as u16;

        if !skip_rotations && !writer.skip_bone_rotation(bone_index) {
            let rotation = sample_rotation(&bone.rotations, bone.is_rotation_default, sample_time);
            writer.write_bone_rotation(bone_index, rotation);
        }

        if !skip_translations && !writer.skip_bone_translation(bone_index) {
            let translation =
                sample_translation(&bone.translations, bone.is_translation_default, sample_time);
            writer.write_bone_translation(bone_index, translation);
        }

        if !skip_scales && !writer.skip_bone_scale(bone_index) {
            let scale = sample_scale(&bone.scales, bone.is_scale_default, sample_time);
            writer.write_bone_scale(bone_index, scale);
        }
    }
}
