//! Mesh decoding against byte streams shaped like the shipped data set
//!
//! Covers:
//! - Static `ZMS0007` meshes (position, normal, uv1)
//! - Skinned `ZMS0008` meshes with a bone lookup list and strips
//! - Identifier classification and truncated input

mod common;

use common::ByteWriter;
use roseread_parsers::zms::{flags, MeshVersion, VertexAttribute, VertexFormat, ZmsParser};
use roseread_parsers::{ParseError, Parser};

struct MeshLayout<'a> {
    identifier: &'a str,
    format: i32,
    bones: &'a [i16],
    vertex_count: i16,
    triangle_count: i16,
    materials: &'a [i16],
    strip_count: i16,
    pool: Option<i16>,
}

fn mesh_bytes(layout: &MeshLayout<'_>) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.cstring(layout.identifier)
        .i32(layout.format)
        .f32s(&[-1.0, -2.0, -3.0])
        .f32s(&[1.0, 2.0, 3.0]);

    w.i16(layout.bones.len() as i16);
    for &bone in layout.bones {
        w.i16(bone);
    }

    w.i16(layout.vertex_count);
    let n = layout.vertex_count.max(0);
    for &attribute in VertexFormat(layout.format).plan().attributes() {
        for i in 0..n {
            let v = f32::from(i);
            match attribute {
                VertexAttribute::Position => w.f32s(&[v, v * 2.0, v * 3.0]),
                VertexAttribute::Normal | VertexAttribute::Tangent => w.f32s(&[0.0, 1.0, 0.0]),
                VertexAttribute::Color => w.f32s(&[1.0, 0.5, 0.25, 1.0]),
                VertexAttribute::Bones => w
                    .f32s(&[0.75, 0.25, 0.0, 0.0])
                    .i16(i % 12)
                    .i16(0)
                    .i16(0)
                    .i16(0),
                _ => w.f32s(&[v / 100.0, 1.0 - v / 100.0]),
            };
        }
    }

    w.i16(layout.triangle_count);
    for t in 0..layout.triangle_count.max(0) {
        let base = (t * 3) % n.max(1);
        w.i16(base).i16((base + 1) % n.max(1)).i16((base + 2) % n.max(1));
    }

    w.i16(layout.materials.len() as i16);
    for &material in layout.materials {
        w.i16(material);
    }

    w.i16(layout.strip_count);
    for s in 0..layout.strip_count.max(0) {
        w.i16(s % n.max(1));
    }

    if let Some(pool) = layout.pool {
        w.i16(pool);
    }
    w.finish()
}

fn static_mesh() -> Vec<u8> {
    mesh_bytes(&MeshLayout {
        identifier: "ZMS0007",
        format: 134,
        bones: &[],
        vertex_count: 183,
        triangle_count: 292,
        materials: &[0, 1, 2],
        strip_count: 0,
        pool: None,
    })
}

fn skinned_mesh() -> Vec<u8> {
    mesh_bytes(&MeshLayout {
        identifier: "ZMS0008",
        format: 182,
        bones: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        vertex_count: 96,
        triangle_count: 120,
        materials: &[],
        strip_count: 474,
        pool: Some(1),
    })
}

mod static_mesh_tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mesh = ZmsParser.parse(&static_mesh()).unwrap();

        assert_eq!(mesh.version, MeshVersion::V7);
        assert_eq!(mesh.identifier(), "ZMS0007");
        assert_eq!(mesh.format.bits(), 134);
        assert_eq!(mesh.vertex_count, 183);
        assert_eq!(mesh.triangle_count(), 292);
        assert_eq!(mesh.materials.len(), 3);
        assert!(mesh.strips.is_empty());
        assert_eq!(mesh.pool, 0);
    }

    #[test]
    fn test_enabled_columns() {
        let mesh = ZmsParser.parse(&static_mesh()).unwrap();

        assert!(mesh.positions_enabled());
        assert!(mesh.normals_enabled());
        assert!(!mesh.colors_enabled());
        assert!(!mesh.bones_enabled());
        assert!(!mesh.tangents_enabled());
        assert_eq!(mesh.uv_channel_count(), 1);

        let a = &mesh.attributes;
        assert_eq!(a.positions.as_ref().map(Vec::len), Some(183));
        assert_eq!(a.normals.as_ref().map(Vec::len), Some(183));
        assert_eq!(a.uv1.as_ref().map(Vec::len), Some(183));
        assert!(a.colors.is_none());
        assert!(a.bone_weights.is_none());
        assert!(a.bone_indices.is_none());
        assert!(a.uv2.is_none());
    }

    #[test]
    fn test_vertex_gather() {
        let mesh = ZmsParser.parse(&static_mesh()).unwrap();
        let vertex = mesh.vertex(10).unwrap();

        let position = vertex.position.unwrap();
        assert_eq!((position.x, position.y, position.z), (10.0, 20.0, 30.0));
        assert!(vertex.color.is_none());
        assert!(!vertex.is_skinned());
        assert_eq!(mesh.vertices().count(), 183);
        assert!(mesh.vertex(183).is_none());
        assert_eq!(mesh.indices_flat().len(), 292 * 3);
    }
}

mod skinned_mesh_tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mesh = ZmsParser.parse(&skinned_mesh()).unwrap();

        assert_eq!(mesh.version, MeshVersion::V8);
        assert_eq!(mesh.bones.len(), 12);
        assert_eq!(mesh.strips.len(), 474);
        assert!(mesh.materials.is_empty());
        assert_eq!(mesh.pool, 1);
    }

    #[test]
    fn test_bone_columns() {
        let mesh = ZmsParser.parse(&skinned_mesh()).unwrap();

        assert!(mesh.bones_enabled());
        let weights = mesh.attributes.bone_weights.as_ref().unwrap();
        let indices = mesh.attributes.bone_indices.as_ref().unwrap();
        assert_eq!(weights.len(), 96);
        assert_eq!(indices.len(), 96);
        assert_eq!(indices[13], [1, 0, 0, 0]);

        let vertex = mesh.vertex(13).unwrap();
        assert!(vertex.is_skinned());
        assert_eq!(vertex.bone_weights, Some([0.75, 0.25, 0.0, 0.0]));
    }

    #[test]
    fn test_missing_pool_is_truncation() {
        let mut data = skinned_mesh();
        data.truncate(data.len() - 2);

        let err = ZmsParser.parse(&data).unwrap_err();
        assert!(matches!(err.root_cause(), ParseError::TruncatedInput { .. }));
    }
}

mod header_tests {
    use super::*;

    #[test]
    fn test_all_columns() {
        let format = flags::POSITION
            | flags::NORMAL
            | flags::COLOR
            | flags::BONE_WEIGHT
            | flags::BONE_INDEX
            | flags::TANGENT
            | flags::UV1
            | flags::UV2
            | flags::UV3
            | flags::UV4;
        let data = mesh_bytes(&MeshLayout {
            identifier: "ZMS0008",
            format,
            bones: &[0],
            vertex_count: 4,
            triangle_count: 1,
            materials: &[0],
            strip_count: 0,
            pool: Some(0),
        });

        let mesh = ZmsParser.parse(&data).unwrap();
        assert_eq!(mesh.uv_channel_count(), 4);
        let vertex = mesh.vertex(3).unwrap();
        assert!(vertex.color.is_some());
        assert!(vertex.tangent.is_some());
        assert_eq!(vertex.uv4.map(|uv| uv.x), Some(0.03));
    }

    #[test]
    fn test_foreign_identifier() {
        let mut data = static_mesh();
        data[..7].copy_from_slice(b"ZMD0003");

        assert!(matches!(
            ZmsParser.parse(&data),
            Err(ParseError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_unknown_revision() {
        let mut data = static_mesh();
        data[..7].copy_from_slice(b"ZMS0006");

        match ZmsParser.parse(&data) {
            Err(ParseError::UnsupportedVersion { version, .. }) => assert_eq!(version, "ZMS0006"),
            other => panic!("expected unsupported version, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_columns() {
        let data = static_mesh();
        // Cut inside the normal column
        let err = ZmsParser.parse(&data[..8 + 4 + 24 + 2 + 2 + 183 * 12 + 100]).unwrap_err();
        assert!(matches!(err.root_cause(), ParseError::TruncatedInput { .. }));
    }
}
