//! clipquant: variable-bit-rate compression for skeletal animation clips
//!
//! Compresses per-bone rotation, translation, and scale tracks to the
//! smallest footprint that keeps the posed-skeleton error under a
//! user-supplied threshold. The compressor duplicates the bone streams,
//! quantizes every variable track at the coarsest bit rate, then greedily
//! raises the precision of whichever track hurts the posed skeleton the
//! most until the whole clip fits the error budget.
//!
//! # Modules
//!
//! - [`packing`] - Sample packing (f32 → raw / unorm16 / 11-11-10 / unorm N)
//! - [`formats`] - Track formats and the bit-rate table
//! - [`streams`] - Track streams, extraction, sampling, and quantization
//! - [`clip`] - The raw reference clip
//! - [`skeleton`] - Rigid skeleton description
//! - [`error_metric`] - Object-space skeletal error metric
//! - [`decompression`] - Output-writer decode adapter
//!
//! # Usage
//!
//! ```
//! use clipquant::{
//!     extract_bone_streams, quantize_streams, AnimatedBone, AnimationClip, RigidBone,
//!     RigidSkeleton, RotationFormat, VectorFormat,
//! };
//! use glam::{Quat, Vec3};
//!
//! let skeleton = RigidSkeleton::new(vec![RigidBone::root(1.0)]).unwrap();
//! let clip = AnimationClip::new(
//!     vec![AnimatedBone {
//!         rotations: (0..16).map(|i| Quat::from_rotation_y(i as f32 * 0.05)).collect(),
//!         translations: vec![Vec3::new(0.1, 0.2, 0.3)],
//!         scales: vec![],
//!     }],
//!     16,
//!     30,
//!     1.0e-3,
//! )
//! .unwrap();
//!
//! let mut streams = extract_bone_streams(&clip, RotationFormat::QuatDropWVariable);
//! quantize_streams(
//!     &mut streams,
//!     RotationFormat::QuatDropWVariable,
//!     VectorFormat::Vector96,
//!     &clip,
//!     &skeleton,
//! );
//! ```

pub mod bitset;
pub mod clip;
pub mod decompression;
pub mod error_metric;
pub mod formats;
pub mod packing;
pub mod skeleton;
pub mod streams;
pub mod transform;

// Re-exports for consumers
pub use clip::{AnimatedBone, AnimationClip, ClipError};
pub use decompression::{decompress_pose, OutputWriter};
pub use error_metric::{
    calculate_skeleton_error, calculate_skeleton_error_contribution, BoneTrackError,
};
pub use formats::{
    num_bits_at_bit_rate, RotationFormat, RotationVariant, TrackType, VectorFormat,
    BIT_RATE_NUM_BITS, HIGHEST_BIT_RATE, INVALID_BIT_RATE, LOWEST_BIT_RATE,
};
pub use skeleton::{RigidBone, RigidSkeleton, SkeletonError, INVALID_BONE_INDEX};
pub use streams::{
    extract_bone_streams, quantize_streams, sample_streams, BoneStreams, RotationTrackStream,
    TrackStream, TranslationTrackStream,
};
pub use transform::Transform;
