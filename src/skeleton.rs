//! Rigid skeleton description consumed by the error metric

use std::fmt;

/// Sentinel parent index used by root bones
pub const INVALID_BONE_INDEX: u16 = u16::MAX;

/// A single rigid bone
///
/// `shell_distance` is the distance to the furthest point the bone
/// influences; the error metric measures the displacement of virtual
/// vertices placed on that shell.
#[derive(Debug, Clone, Copy)]
pub struct RigidBone {
    pub parent_index: u16,
    pub shell_distance: f32,
}

impl RigidBone {
    pub fn root(shell_distance: f32) -> Self {
        Self {
            parent_index: INVALID_BONE_INDEX,
            shell_distance,
        }
    }

    pub fn child(parent_index: u16, shell_distance: f32) -> Self {
        Self {
            parent_index,
            shell_distance,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index == INVALID_BONE_INDEX
    }
}

/// Errors that can occur when building a skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonError {
    /// More bones than a u16 index can address
    TooManyBones,
    /// A bone's parent does not precede it in the bone list
    ParentOutOfOrder { bone_index: u16 },
}

impl fmt::Display for SkeletonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkeletonError::TooManyBones => write!(f, "bone count exceeds u16 indexing"),
            SkeletonError::ParentOutOfOrder { bone_index } => {
                write!(f, "bone {} does not appear after its parent", bone_index)
            }
        }
    }
}

impl std::error::Error for SkeletonError {}

/// An ordered list of rigid bones, parents before children
///
/// The topological order is validated on ingest: every parent index is
/// either [`INVALID_BONE_INDEX`] or strictly less than the bone's own
/// index, which makes ancestor walks trivially terminating.
#[derive(Debug, Clone)]
pub struct RigidSkeleton {
    bones: Vec<RigidBone>,
}

impl RigidSkeleton {
    pub fn new(bones: Vec<RigidBone>) -> Result<Self, SkeletonError> {
        if bones.len() >= INVALID_BONE_INDEX as usize {
            return Err(SkeletonError::TooManyBones);
        }
        for (bone_index, bone) in bones.iter().enumerate() {
            if !bone.is_root() && bone.parent_index as usize >= bone_index {
                return Err(SkeletonError::ParentOutOfOrder {
                    bone_index: bone_index as u16,
                });
            }
        }
        Ok(Self { bones })
    }

    #[inline]
    pub fn num_bones(&self) -> u16 {
        self.bones.len() as u16
    }

    #[inline]
    pub fn bone(&self, bone_index: u16) -> &RigidBone {
        &self.bones[bone_index as usize]
    }

    pub fn bones(&self) -> &[RigidBone] {
        &self.bones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_chain() {
        let skeleton = RigidSkeleton::new(vec![
            RigidBone::root(0.1),
            RigidBone::child(0, 0.1),
            RigidBone::child(1, 1.0),
        ])
        .unwrap();
        assert_eq!(skeleton.num_bones(), 3);
        assert!(skeleton.bone(0).is_root());
        assert_eq!(skeleton.bone(2).parent_index, 1);
    }

    #[test]
    fn test_multiple_roots() {
        let skeleton =
            RigidSkeleton::new(vec![RigidBone::root(1.0), RigidBone::root(1.0)]).unwrap();
        assert!(skeleton.bone(1).is_root());
    }

    #[test]
    fn test_rejects_forward_parent() {
        let result = RigidSkeleton::new(vec![RigidBone::child(1, 1.0), RigidBone::root(1.0)]);
        assert_eq!(
            result.unwrap_err(),
            SkeletonError::ParentOutOfOrder { bone_index: 0 }
        );
    }

    #[test]
    fn test_rejects_self_parent() {
        let result = RigidSkeleton::new(vec![RigidBone::root(1.0), RigidBone::child(1, 1.0)]);
        assert_eq!(
            result.unwrap_err(),
            SkeletonError::ParentOutOfOrder { bone_index: 1 }
        );
    }
}
