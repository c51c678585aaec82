//! Skeletal error metric
//!
//! Local-space quantization error means little on its own: a tiny rotation
//! error on a hip bone moves a foot a long way. The metric therefore chains
//! local poses into object space and measures how far virtual vertices on
//! each bone's shell move between the reference pose and the lossy pose.

use glam::Vec3;

use crate::skeleton::{RigidSkeleton, INVALID_BONE_INDEX};
use crate::transform::Transform;

/// Per-track error contributions for one bone
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoneTrackError {
    pub rotation: f32,
    pub translation: f32,
    pub scale: f32,
}

#[inline]
fn virtual_vertex_error(raw: &Transform, lossy: &Transform, shell_distance: f32) -> f32 {
    // Two probe vertices on the shell; a single probe on the rotation axis
    // would hide the error of that rotation
    let vtx0 = Vec3::new(shell_distance, 0.0, 0.0);
    let vtx1 = Vec3::new(0.0, shell_distance, 0.0);
    let error0 = raw.transform_point(vtx0).distance(lossy.transform_point(vtx0));
    let error1 = raw.transform_point(vtx1).distance(lossy.transform_point(vtx1));
    error0.max(error1)
}

/// Measure the object-space error of every bone between a reference pose
/// and a lossy pose
///
/// Both poses are local space; bones are chained parents-first, which the
/// skeleton's storage order guarantees.
pub fn calculate_skeleton_error(
    skeleton: &RigidSkeleton,
    raw_local_pose: &[Transform],
    lossy_local_pose: &[Transform],
    out_error_per_bone: &mut [f32],
) {
    let num_bones = skeleton.num_bones() as usize;
    debug_assert_eq!(raw_local_pose.len(), num_bones);
    debug_assert_eq!(lossy_local_pose.len(), num_bones);
    debug_assert_eq!(out_error_per_bone.len(), num_bones);

    let mut raw_object_pose = vec![Transform::IDENTITY; num_bones];
    let mut lossy_object_pose = vec![Transform::IDENTITY; num_bones];

    for bone_index in 0..num_bones {
        let bone = skeleton.bone(bone_index as u16);
        if bone.is_root() {
            raw_object_pose[bone_index] = raw_local_pose[bone_index];
            lossy_object_pose[bone_index] = lossy_local_pose[bone_index];
        } else {
            let parent_index = bone.parent_index as usize;
            raw_object_pose[bone_index] =
                raw_local_pose[bone_index].mul(&raw_object_pose[parent_index]);
            lossy_object_pose[bone_index] =
                lossy_local_pose[bone_index].mul(&lossy_object_pose[parent_index]);
        }

        out_error_per_bone[bone_index] = virtual_vertex_error(
            &raw_object_pose[bone_index],
            &lossy_object_pose[bone_index],
            bone.shell_distance,
        );
    }
}

/// Object-space transform of the bone at the bottom of `chain`, built from
/// the raw pose with at most one track substituted from the lossy pose
///
/// `chain` is ordered bottom-up (bad bone first, root last).
fn chain_object_transform(
    raw_local_pose: &[Transform],
    lossy_local_pose: &[Transform],
    chain: &[u16],
    substitute: Option<(u16, SubstituteTrack)>,
) -> Transform {
    let mut object_transform = Transform::IDENTITY;
    for &bone_index in chain.iter().rev() {
        let mut local = raw_local_pose[bone_index as usize];
        if let Some((substitute_bone, track)) = substitute {
            if substitute_bone == bone_index {
                let lossy = &lossy_local_pose[bone_index as usize];
                match track {
                    SubstituteTrack::Rotation => local.rotation = lossy.rotation,
                    SubstituteTrack::Translation => local.translation = lossy.translation,
                    SubstituteTrack::Scale => local.scale = lossy.scale,
                }
            }
        }
        object_transform = local.mul(&object_transform);
    }
    object_transform
}

#[derive(Clone, Copy)]
enum SubstituteTrack {
    Rotation,
    Translation,
    Scale,
}

/// Measure how much each track along the bad bone's ancestor chain
/// contributes to the error observed at the bad bone
///
/// For every chain bone and track kind, the bad bone's virtual vertices are
/// re-posed with only that single track taken from the lossy pose; the
/// resulting displacement is that track's contribution. Bones off the chain
/// are left at zero.
pub fn calculate_skeleton_error_contribution(
    skeleton: &RigidSkeleton,
    raw_local_pose: &[Transform],
    lossy_local_pose: &[Transform],
    bad_bone_index: u16,
    out_error_per_stream: &mut [BoneTrackError],
) {
    let num_bones = skeleton.num_bones() as usize;
    debug_assert_eq!(raw_local_pose.len(), num_bones);
    debug_assert_eq!(lossy_local_pose.len(), num_bones);
    debug_assert_eq!(out_error_per_stream.len(), num_bones);
    debug_assert!((bad_bone_index as usize) < num_bones);

    for track_error in out_error_per_stream.iter_mut() {
        *track_error = BoneTrackError::default();
    }

    let mut chain = Vec::new();
    let mut bone_index = bad_bone_index;
    while bone_index != INVALID_BONE_INDEX {
        chain.push(bone_index);
        bone_index = skeleton.bone(bone_index).parent_index;
    }

    let shell_distance = skeleton.bone(bad_bone_index).shell_distance;
    let reference =
        chain_object_transform(raw_local_pose, lossy_local_pose, &chain, None);

    for &chain_bone in &chain {
        let tracks = [
            SubstituteTrack::Rotation,
            SubstituteTrack::Translation,
            SubstituteTrack::Scale,
        ];
        for track in tracks {
            let substituted = chain_object_transform(
                raw_local_pose,
                lossy_local_pose,
                &chain,
                Some((chain_bone, track)),
            );
            let error = virtual_vertex_error(&reference, &substituted, shell_distance);
            let track_error = &mut out_error_per_stream[chain_bone as usize];
            match track {
                SubstituteTrack::Rotation => track_error.rotation = error,
                SubstituteTrack::Translation => track_error.translation = error,
                SubstituteTrack::Scale => track_error.scale = error,
            }
        }
    }
}
