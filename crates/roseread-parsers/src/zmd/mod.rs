// roseread-parsers/src/zmd/mod.rs
//! Skeleton (`.zmd`) decoder
//!
//! Layout:
//! ```text
//! [7-byte identifier]
//! [u32 bone_count]
//! bone_count × [i32 parent][cstring name][3×f32 position][4×f32 rotation w,x,y,z]
//! optional:
//! [u32 dummy_count]
//! dummy_count × [cstring name][i32 parent][3×f32 position][4×f32 rotation, ZMD0003 only]
//! ```
//!
//! Positions are stored in centimetres and scaled to metres on read. The
//! first bone is always treated as a root, whatever parent it stores.

pub mod rig;

use roseread_core::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

pub use rig::{reconstruct, reconstruct_dummies, BonePose, RigOptions};

/// Identifier width in bytes
pub const IDENTIFIER_LEN: usize = 7;

/// Identifier of the revision whose dummy bones carry a rotation
pub const IDENTIFIER_WITH_DUMMY_ROTATION: &str = "ZMD0003";

/// Factor applied to every stored position
pub const POSITION_SCALE: f32 = 0.01;

/// Decoded skeleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    /// Identifier as stored, e.g. `ZMD0002`
    pub identifier: String,
    /// Bones in file order
    pub bones: Vec<Bone>,
    /// Attachment points parented to bones
    pub dummy_bones: Vec<Bone>,
}

impl Skeleton {
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Find a bone and its index by name
    pub fn find_bone(&self, name: &str) -> Option<(usize, &Bone)> {
        self.bones.iter().enumerate().find(|(_, bone)| bone.name == name)
    }

    /// Find a dummy bone by name
    pub fn find_dummy(&self, name: &str) -> Option<&Bone> {
        self.dummy_bones.iter().find(|dummy| dummy.name == name)
    }

    /// Indices of bones with no parent
    pub fn root_bones(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.is_root())
            .map(|(index, _)| index)
            .collect()
    }

    /// Indices of the direct children of a bone
    pub fn children(&self, bone_index: usize) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent_index() == Some(bone_index))
            .map(|(index, _)| index)
            .collect()
    }

    /// Bone indices from `bone_index` up to its root
    ///
    /// The walk stops after `bone_count` steps, so a cyclic hierarchy in an
    /// unvalidated skeleton still terminates.
    pub fn bone_chain_to_root(&self, bone_index: usize) -> Vec<usize> {
        let mut chain = vec![bone_index];
        let mut current = bone_index;

        while let Some(parent) = self.bones.get(current).and_then(Bone::parent_index) {
            if chain.len() > self.bones.len() {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain
    }

    pub fn bone_names(&self) -> Vec<&str> {
        self.bones.iter().map(|bone| bone.name.as_str()).collect()
    }

    /// Check that every bone's parent is -1 or an earlier bone, and that every
    /// dummy bone is parented to an existing bone
    pub fn validate(&self) -> ParseResult<()> {
        let bone_count = self.bones.len();

        for (index, bone) in self.bones.iter().enumerate().skip(1) {
            let earlier = usize::try_from(bone.parent).is_ok_and(|parent| parent < index);
            if bone.parent != -1 && !earlier {
                return Err(ParseError::InvalidHierarchy {
                    bone: index,
                    parent: bone.parent,
                    bone_count,
                });
            }
        }

        for (index, dummy) in self.dummy_bones.iter().enumerate() {
            if !usize::try_from(dummy.parent).is_ok_and(|parent| parent < bone_count) {
                return Err(ParseError::invalid(format!(
                    "dummy bone {index} ({}) has parent {} but the skeleton has {bone_count} bones",
                    dummy.name, dummy.parent
                )));
            }
        }

        Ok(())
    }
}

impl HumanReadable for Skeleton {
    fn to_readable_string(&self) -> String {
        let mut out = format!(
            "Skeleton {}\n  bones: {}\n  dummy bones: {}\n",
            self.identifier,
            self.bones.len(),
            self.dummy_bones.len()
        );
        for (index, bone) in self.bones.iter().enumerate() {
            out.push_str(&format!("  [{index}] {} (parent {})\n", bone.name, bone.parent));
        }
        for dummy in &self.dummy_bones {
            out.push_str(&format!("  dummy {} (parent {})\n", dummy.name, dummy.parent));
        }
        out
    }
}

/// A bone or dummy bone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    /// Parent bone index, -1 for a root
    pub parent: i32,
    pub name: String,
    /// Offset from the parent, in metres
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
}

impl Bone {
    pub fn is_root(&self) -> bool {
        self.parent == -1
    }

    /// Parent as an index, `None` for roots and negative values
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }
}

/// Skeleton decoder
pub struct ZmdParser;

impl ZmdParser {
    pub fn new() -> Self {
        Self
    }

    fn read_bone(cursor: &mut ByteCursor<'_>) -> ParseResult<Bone> {
        let parent = cursor.read_i32()?;
        let name = cursor.read_cstring()?;
        let position = cursor.read_vec3()?.scale(POSITION_SCALE);
        let rotation = cursor.read_quat_wxyz()?;

        Ok(Bone {
            parent,
            name,
            position,
            rotation,
        })
    }

    fn read_dummy(cursor: &mut ByteCursor<'_>, has_rotation: bool) -> ParseResult<Bone> {
        let name = cursor.read_cstring()?;
        let parent = cursor.read_i32()?;
        let position = cursor.read_vec3()?.scale(POSITION_SCALE);
        let rotation = if has_rotation {
            cursor.read_quat_wxyz()?
        } else {
            Quat::IDENTITY
        };

        Ok(Bone {
            parent,
            name,
            position,
            rotation,
        })
    }
}

impl Default for ZmdParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ZmdParser {
    type Output = Skeleton;

    fn name(&self) -> &str {
        "ZMD Skeleton Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["zmd"]
    }

    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<Skeleton> {
        let mut cursor = ByteCursor::new(data);

        let identifier = cursor.read_fixed_string(IDENTIFIER_LEN)?;

        let bone_count = cursor.read_u32()? as usize;
        let mut bones = cursor
            .read_array(bone_count, Self::read_bone)
            .map_err(|e| e.with_context("bones"))?;
        if let Some(root) = bones.first_mut() {
            root.parent = -1;
        }

        // Older files end right after the bone list
        let dummy_bones = if cursor.is_at_end() {
            Vec::new()
        } else {
            let has_rotation = identifier == IDENTIFIER_WITH_DUMMY_ROTATION;
            let dummy_count = cursor.read_u32()? as usize;
            cursor
                .read_array(dummy_count, |c| Self::read_dummy(c, has_rotation))
                .map_err(|e| e.with_context("dummy bones"))?
        };

        let skeleton = Skeleton {
            identifier,
            bones,
            dummy_bones,
        };

        if options.strict_validation {
            skeleton.validate()?;
        }

        Ok(skeleton)
    }
}
