// roseread-parsers/src/zms/mod.rs
//! Mesh (`.zms`) decoder
//!
//! Layout:
//! ```text
//! [cstring identifier "ZMS0007" | "ZMS0008"]
//! [i32 format][3×f32 bbox min][3×f32 bbox max]
//! [i16 bone_count][bone_count × i16]
//! [i16 vertex_count]
//! one column of vertex_count entries per attribute enabled by `format`
//! [i16 triangle_count][triangle_count × 3×i16]
//! [i16 material_count][material_count × i16]
//! [i16 strip_count][strip_count × i16]
//! [i16 pool, ZMS0008 only]
//! ```
//!
//! Attribute columns are stored whole (every position, then every normal)
//! rather than interleaved per vertex.

pub mod format;

use std::fmt;

use roseread_core::{BoundingBox, Color4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

pub use format::{flags, AttributePlan, VertexAttribute, VertexFormat};

const IDENTIFIER_PREFIX: &str = "ZMS";

/// Supported mesh revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshVersion {
    /// `ZMS0007`, no pool field
    V7,
    /// `ZMS0008`
    V8,
}

impl MeshVersion {
    /// Resolve an identifier, distinguishing a foreign file from an unknown
    /// revision of this format
    pub fn from_identifier(identifier: &str) -> ParseResult<Self> {
        match identifier {
            "ZMS0007" => Ok(MeshVersion::V7),
            "ZMS0008" => Ok(MeshVersion::V8),
            other if other.starts_with(IDENTIFIER_PREFIX) => Err(ParseError::UnsupportedVersion {
                format: "ZMS",
                version: other.to_string(),
            }),
            other => Err(ParseError::UnrecognizedFormat {
                format: "ZMS",
                found: other.to_string(),
            }),
        }
    }

    pub fn identifier(self) -> &'static str {
        match self {
            MeshVersion::V7 => "ZMS0007",
            MeshVersion::V8 => "ZMS0008",
        }
    }

    /// Whether the trailing pool field is stored
    pub fn has_pool(self) -> bool {
        matches!(self, MeshVersion::V8)
    }
}

impl fmt::Display for MeshVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Per-vertex attribute columns
///
/// A column is `Some` exactly when the mesh format enables it, and then holds
/// one entry per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshAttributes {
    pub positions: Option<Vec<Vec3>>,
    pub normals: Option<Vec<Vec3>>,
    pub colors: Option<Vec<Color4>>,
    pub bone_weights: Option<Vec<[f32; 4]>>,
    pub bone_indices: Option<Vec<[i16; 4]>>,
    pub tangents: Option<Vec<Vec3>>,
    pub uv1: Option<Vec<Vec2>>,
    pub uv2: Option<Vec<Vec2>>,
    pub uv3: Option<Vec<Vec2>>,
    pub uv4: Option<Vec<Vec2>>,
}

impl MeshAttributes {
    /// Read the columns named by `plan`, each `vertex_count` long
    fn read(cursor: &mut ByteCursor<'_>, plan: &AttributePlan, vertex_count: usize) -> ParseResult<Self> {
        let mut attributes = Self::default();

        for &attribute in plan.attributes() {
            let n = vertex_count;
            match attribute {
                VertexAttribute::Position => attributes.positions = Some(cursor.read_array(n, |c| c.read_vec3())?),
                VertexAttribute::Normal => attributes.normals = Some(cursor.read_array(n, |c| c.read_vec3())?),
                VertexAttribute::Color => attributes.colors = Some(cursor.read_array(n, |c| c.read_color4())?),
                VertexAttribute::Bones => {
                    let bones = cursor.read_array(n, |c| Ok((c.read_f32x4()?, c.read_i16x4()?)))?;
                    let (weights, indices): (Vec<_>, Vec<_>) = bones.into_iter().unzip();
                    attributes.bone_weights = Some(weights);
                    attributes.bone_indices = Some(indices);
                }
                VertexAttribute::Tangent => attributes.tangents = Some(cursor.read_array(n, |c| c.read_vec3())?),
                VertexAttribute::Uv1 => attributes.uv1 = Some(cursor.read_array(n, |c| c.read_vec2())?),
                VertexAttribute::Uv2 => attributes.uv2 = Some(cursor.read_array(n, |c| c.read_vec2())?),
                VertexAttribute::Uv3 => attributes.uv3 = Some(cursor.read_array(n, |c| c.read_vec2())?),
                VertexAttribute::Uv4 => attributes.uv4 = Some(cursor.read_array(n, |c| c.read_vec2())?),
            }
        }

        Ok(attributes)
    }
}

/// A single vertex gathered from the attribute columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Option<Vec3>,
    pub normal: Option<Vec3>,
    pub color: Option<Color4>,
    pub bone_weights: Option<[f32; 4]>,
    pub bone_indices: Option<[i16; 4]>,
    pub tangent: Option<Vec3>,
    pub uv1: Option<Vec2>,
    pub uv2: Option<Vec2>,
    pub uv3: Option<Vec2>,
    pub uv4: Option<Vec2>,
}

impl Vertex {
    /// Check if vertex has any non-zero bone weight
    pub fn is_skinned(&self) -> bool {
        self.bone_weights
            .is_some_and(|weights| weights.iter().any(|&w| w > 0.0))
    }
}

/// Decoded mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub version: MeshVersion,
    pub format: VertexFormat,
    pub bounding_box: BoundingBox,
    /// Skeleton bone referenced by each local bone index
    pub bones: Vec<i16>,
    pub vertex_count: usize,
    pub attributes: MeshAttributes,
    /// Triangle list, three vertex indices each
    pub triangles: Vec<[i16; 3]>,
    pub materials: Vec<i16>,
    /// Triangle strip indices
    pub strips: Vec<i16>,
    /// Vertex buffer pool hint; always 0 for `ZMS0007`
    pub pool: i16,
}

impl Mesh {
    pub fn identifier(&self) -> &'static str {
        self.version.identifier()
    }

    pub fn plan(&self) -> AttributePlan {
        self.format.plan()
    }

    pub fn positions_enabled(&self) -> bool {
        self.format.has(VertexAttribute::Position)
    }

    pub fn normals_enabled(&self) -> bool {
        self.format.has(VertexAttribute::Normal)
    }

    pub fn colors_enabled(&self) -> bool {
        self.format.has(VertexAttribute::Color)
    }

    pub fn bones_enabled(&self) -> bool {
        self.format.has_bones()
    }

    pub fn tangents_enabled(&self) -> bool {
        self.format.has(VertexAttribute::Tangent)
    }

    /// Number of UV channels present
    pub fn uv_channel_count(&self) -> usize {
        [VertexAttribute::Uv1, VertexAttribute::Uv2, VertexAttribute::Uv3, VertexAttribute::Uv4]
            .into_iter()
            .filter(|&uv| self.format.has(uv))
            .count()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Gather the attributes of one vertex
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        if index >= self.vertex_count {
            return None;
        }

        fn at<T: Copy>(column: &Option<Vec<T>>, index: usize) -> Option<T> {
            column.as_ref().and_then(|values| values.get(index).copied())
        }

        let a = &self.attributes;
        Some(Vertex {
            position: at(&a.positions, index),
            normal: at(&a.normals, index),
            color: at(&a.colors, index),
            bone_weights: at(&a.bone_weights, index),
            bone_indices: at(&a.bone_indices, index),
            tangent: at(&a.tangents, index),
            uv1: at(&a.uv1, index),
            uv2: at(&a.uv2, index),
            uv3: at(&a.uv3, index),
            uv4: at(&a.uv4, index),
        })
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        (0..self.vertex_count).filter_map(|index| self.vertex(index))
    }

    /// Triangle indices as a flat list
    pub fn indices_flat(&self) -> Vec<i16> {
        self.triangles.iter().flat_map(|t| t.iter().copied()).collect()
    }
}

impl HumanReadable for Mesh {
    fn to_readable_string(&self) -> String {
        let attributes: Vec<String> = self
            .plan()
            .attributes()
            .iter()
            .map(|a| format!("{a:?}"))
            .collect();

        format!(
            "Mesh {}\n  format: {} [{}]\n  bounding box: {:?} .. {:?}\n  bones: {}\n  vertices: {}\n  triangles: {}\n  materials: {}\n  strips: {}\n  pool: {}\n",
            self.version,
            self.format.bits(),
            attributes.join(", "),
            self.bounding_box.min.to_array(),
            self.bounding_box.max.to_array(),
            self.bones.len(),
            self.vertex_count,
            self.triangles.len(),
            self.materials.len(),
            self.strips.len(),
            self.pool,
        )
    }
}

/// Mesh decoder
pub struct ZmsParser;

impl ZmsParser {
    pub fn new() -> Self {
        Self
    }

    fn read_i16_list(cursor: &mut ByteCursor<'_>, what: &str) -> ParseResult<Vec<i16>> {
        let count = cursor.read_count_i16(what)?;
        cursor
            .read_array(count, |c| c.read_i16())
            .map_err(|e| e.with_context(format!("{what} list")))
    }
}

impl Default for ZmsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ZmsParser {
    type Output = Mesh;

    fn name(&self) -> &str {
        "ZMS Mesh Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["zms"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<Mesh> {
        let mut cursor = ByteCursor::new(data);

        let identifier = cursor.read_cstring()?;
        let version = MeshVersion::from_identifier(&identifier)?;

        let format = VertexFormat(cursor.read_i32()?);
        let plan = format.plan();
        let bounding_box = BoundingBox::new(cursor.read_vec3()?, cursor.read_vec3()?);

        let bones = Self::read_i16_list(&mut cursor, "bone")?;

        let vertex_count = cursor.read_count_i16("vertex")?;
        let attributes = MeshAttributes::read(&mut cursor, &plan, vertex_count)
            .map_err(|e| e.with_context("vertex attributes"))?;

        let triangle_count = cursor.read_count_i16("triangle")?;
        let triangles = cursor
            .read_array(triangle_count, |c| c.read_vec3_i16())
            .map_err(|e| e.with_context("triangle list"))?;

        let materials = Self::read_i16_list(&mut cursor, "material")?;
        let strips = Self::read_i16_list(&mut cursor, "strip")?;

        let pool = if version.has_pool() { cursor.read_i16()? } else { 0 };

        Ok(Mesh {
            version,
            format,
            bounding_box,
            bones,
            vertex_count,
            attributes,
            triangles,
            materials,
            strips,
            pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(identifier: &str, format: i32) -> Vec<u8> {
        let mut data = identifier.as_bytes().to_vec();
        data.push(0);
        data.extend_from_slice(&format.to_le_bytes());
        for v in [-1.0f32, -1.0, -1.0, 1.0, 1.0, 1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data
    }

    fn push_i16(data: &mut Vec<u8>, value: i16) {
        data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_f32s(data: &mut Vec<u8>, values: &[f32]) {
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
    }

    /// One-triangle mesh with position and uv1 columns
    fn triangle_mesh(identifier: &str) -> Vec<u8> {
        let mut data = header(identifier, flags::POSITION | flags::UV1);
        push_i16(&mut data, 0); // bones
        push_i16(&mut data, 3); // vertices
        push_f32s(&mut data, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        push_f32s(&mut data, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        push_i16(&mut data, 1); // triangles
        for i in [0, 1, 2] {
            push_i16(&mut data, i);
        }
        push_i16(&mut data, 0); // materials
        push_i16(&mut data, 0); // strips
        data
    }

    #[test]
    fn test_version_seven_has_no_pool() {
        let data = triangle_mesh("ZMS0007");
        let mesh = ZmsParser.parse(&data).unwrap();

        assert_eq!(mesh.version, MeshVersion::V7);
        assert_eq!(mesh.pool, 0);
        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.attributes.positions.as_ref().map(Vec::len), Some(3));
        assert_eq!(mesh.attributes.uv1.as_ref().map(Vec::len), Some(3));
        assert!(mesh.attributes.normals.is_none());
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(mesh.bounding_box.size(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_version_eight_reads_pool() {
        let mut data = triangle_mesh("ZMS0008");
        push_i16(&mut data, 2);
        let mesh = ZmsParser.parse(&data).unwrap();
        assert_eq!(mesh.pool, 2);

        // Without the trailing pool the file is truncated
        let short = triangle_mesh("ZMS0008");
        assert!(ZmsParser.parse(&short).is_err());
    }

    #[test]
    fn test_vertex_gathers_columns() {
        let mesh = ZmsParser.parse(&triangle_mesh("ZMS0007")).unwrap();
        let vertex = mesh.vertex(1).unwrap();

        assert_eq!(vertex.position, Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(vertex.uv1, Some(Vec2::new(1.0, 0.0)));
        assert_eq!(vertex.normal, None);
        assert!(mesh.vertex(3).is_none());
        assert_eq!(mesh.vertices().count(), 3);
    }

    #[test]
    fn test_identifier_classification() {
        assert!(matches!(
            ZmsParser.parse(&triangle_mesh("ZMS0006")),
            Err(ParseError::UnsupportedVersion { .. })
        ));
        assert!(matches!(
            ZmsParser.parse(&triangle_mesh("ZMD0002")),
            Err(ParseError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_negative_vertex_count() {
        let mut data = header("ZMS0007", flags::POSITION);
        push_i16(&mut data, 0);
        push_i16(&mut data, -4);
        assert!(matches!(
            ZmsParser.parse(&data),
            Err(ParseError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_bone_columns_are_paired() {
        let mut data = header("ZMS0008", flags::BONE_WEIGHT | flags::BONE_INDEX);
        push_i16(&mut data, 2);
        push_i16(&mut data, 4);
        push_i16(&mut data, 9);
        push_i16(&mut data, 1); // vertices
        push_f32s(&mut data, &[0.5, 0.5, 0.0, 0.0]);
        for i in [0, 1, 0, 0] {
            push_i16(&mut data, i);
        }
        for _ in 0..3 {
            push_i16(&mut data, 0);
        }
        push_i16(&mut data, 0); // pool

        let mesh = ZmsParser.parse(&data).unwrap();
        assert_eq!(mesh.bones, vec![4, 9]);
        let vertex = mesh.vertex(0).unwrap();
        assert_eq!(vertex.bone_weights, Some([0.5, 0.5, 0.0, 0.0]));
        assert_eq!(vertex.bone_indices, Some([0, 1, 0, 0]));
        assert!(vertex.is_skinned());
    }
}
