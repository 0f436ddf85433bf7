//! Vertex format bitmask and the attribute read plan derived from it

use serde::{Deserialize, Serialize};

/// Vertex format bits
pub mod flags {
    pub const POSITION: i32 = 1 << 1;
    pub const NORMAL: i32 = 1 << 2;
    pub const COLOR: i32 = 1 << 3;
    pub const BONE_WEIGHT: i32 = 1 << 4;
    pub const BONE_INDEX: i32 = 1 << 5;
    pub const TANGENT: i32 = 1 << 6;
    pub const UV1: i32 = 1 << 7;
    pub const UV2: i32 = 1 << 8;
    pub const UV3: i32 = 1 << 9;
    pub const UV4: i32 = 1 << 10;
}

/// Raw vertex format bitmask as stored in the mesh header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexFormat(pub i32);

impl VertexFormat {
    pub fn bits(self) -> i32 {
        self.0
    }

    /// True when every bit of `flag` is set
    pub fn contains(self, flag: i32) -> bool {
        self.0 & flag == flag
    }

    /// Bone data is present only when both the weight and index bits are set
    pub fn has_bones(self) -> bool {
        self.contains(flags::BONE_WEIGHT | flags::BONE_INDEX)
    }

    pub fn has(self, attribute: VertexAttribute) -> bool {
        match attribute {
            VertexAttribute::Bones => self.has_bones(),
            other => self.contains(other.flag()),
        }
    }

    /// The attributes this format stores, in file order
    pub fn plan(self) -> AttributePlan {
        AttributePlan::new(self)
    }
}

/// One column of per-vertex data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexAttribute {
    Position,
    Normal,
    Color,
    /// Four weights followed by four bone indices, per vertex
    Bones,
    Tangent,
    Uv1,
    Uv2,
    Uv3,
    Uv4,
}

impl VertexAttribute {
    /// Every attribute in the order columns appear in a file
    pub const ORDER: [VertexAttribute; 9] = [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::Color,
        VertexAttribute::Bones,
        VertexAttribute::Tangent,
        VertexAttribute::Uv1,
        VertexAttribute::Uv2,
        VertexAttribute::Uv3,
        VertexAttribute::Uv4,
    ];

    /// Format bits that enable this attribute
    pub fn flag(self) -> i32 {
        match self {
            VertexAttribute::Position => flags::POSITION,
            VertexAttribute::Normal => flags::NORMAL,
            VertexAttribute::Color => flags::COLOR,
            VertexAttribute::Bones => flags::BONE_WEIGHT | flags::BONE_INDEX,
            VertexAttribute::Tangent => flags::TANGENT,
            VertexAttribute::Uv1 => flags::UV1,
            VertexAttribute::Uv2 => flags::UV2,
            VertexAttribute::Uv3 => flags::UV3,
            VertexAttribute::Uv4 => flags::UV4,
        }
    }

    /// Bytes stored per vertex
    pub fn size(self) -> usize {
        match self {
            VertexAttribute::Position | VertexAttribute::Normal | VertexAttribute::Tangent => 12,
            VertexAttribute::Color => 16,
            VertexAttribute::Bones => 16 + 8,
            VertexAttribute::Uv1 | VertexAttribute::Uv2 | VertexAttribute::Uv3 | VertexAttribute::Uv4 => 8,
        }
    }
}

/// Ordered list of the attribute columns to read
///
/// Built from the format once, before any vertex data is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePlan {
    attributes: Vec<VertexAttribute>,
}

impl AttributePlan {
    pub fn new(format: VertexFormat) -> Self {
        let attributes = VertexAttribute::ORDER
            .into_iter()
            .filter(|&attribute| format.has(attribute))
            .collect();
        Self { attributes }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn contains(&self, attribute: VertexAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// Total bytes of attribute data per vertex
    pub fn vertex_size(&self) -> usize {
        self.attributes.iter().map(|attribute| attribute.size()).sum()
    }
}
