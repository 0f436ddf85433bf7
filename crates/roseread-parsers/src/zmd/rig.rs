//! Bone hierarchy reconstruction
//!
//! Turns the parent-relative bone offsets of a [`Skeleton`] into absolute
//! head/tail positions, ready to build an armature from.

use roseread_core::Vec3;
use serde::{Deserialize, Serialize};

use super::Skeleton;
use crate::traits::{ParseError, ParseResult};

/// Reconstruction options
#[derive(Debug, Clone)]
pub struct RigOptions {
    /// Offset root heads along z so a root never has zero length
    ///
    /// A root's head and tail otherwise coincide, and armature tools drop
    /// zero-length bones.
    pub preserve_root: bool,
    /// Offset added to a root's head z when `preserve_root` is set
    pub root_epsilon: f32,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            preserve_root: true,
            root_epsilon: 1e-5,
        }
    }
}

/// Absolute placement of one bone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonePose {
    pub name: String,
    pub parent: Option<usize>,
    pub head: Vec3,
    pub tail: Vec3,
}

/// Compute absolute head and tail positions for every bone, in index order
///
/// A root (bone 0, or any bone whose parent is -1) has head and tail at its
/// local position. Every other bone starts at its parent's tail and ends at
/// that tail plus its local position.
///
/// Only positions are composed. Stored bone rotations are not applied to
/// child offsets; whether the format expects them to be is unresolved, and
/// the translation-only result matches how these skeletons have always been
/// imported.
pub fn reconstruct(skeleton: &Skeleton, options: &RigOptions) -> ParseResult<Vec<BonePose>> {
    let bone_count = skeleton.bones.len();
    let mut poses: Vec<BonePose> = Vec::with_capacity(bone_count);

    for (index, bone) in skeleton.bones.iter().enumerate() {
        if index == 0 || bone.parent == -1 {
            let mut head = bone.position;
            if options.preserve_root {
                head.z += options.root_epsilon;
            }
            poses.push(BonePose {
                name: bone.name.clone(),
                parent: None,
                head,
                tail: bone.position,
            });
            continue;
        }

        let parent = usize::try_from(bone.parent)
            .ok()
            .filter(|&parent| parent < index)
            .ok_or(ParseError::InvalidHierarchy {
                bone: index,
                parent: bone.parent,
                bone_count,
            })?;

        let head = poses[parent].tail;
        poses.push(BonePose {
            name: bone.name.clone(),
            parent: Some(parent),
            head,
            tail: head + bone.position,
        });
    }

    Ok(poses)
}

/// Place every dummy bone against the reconstructed `bones`
///
/// `bones` is the output of [`reconstruct`] for the same skeleton. Dummy
/// bones attach to their parent's tail exactly like child bones do.
pub fn reconstruct_dummies(skeleton: &Skeleton, bones: &[BonePose]) -> ParseResult<Vec<BonePose>> {
    skeleton
        .dummy_bones
        .iter()
        .enumerate()
        .map(|(index, dummy)| {
            let parent = dummy
                .parent_index()
                .filter(|&parent| parent < bones.len())
                .ok_or(ParseError::InvalidHierarchy {
                    bone: index,
                    parent: dummy.parent,
                    bone_count: bones.len(),
                })?;

            let head = bones[parent].tail;
            Ok(BonePose {
                name: dummy.name.clone(),
                parent: Some(parent),
                head,
                tail: head + dummy.position,
            })
        })
        .collect()
}
