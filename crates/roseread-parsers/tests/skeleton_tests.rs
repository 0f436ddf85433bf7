//! Skeleton decoding and rig reconstruction

mod common;

use common::ByteWriter;
use roseread_core::Vec3;
use roseread_parsers::zmd::{self, RigOptions, ZmdParser};
use roseread_parsers::{ParseError, ParseOptions, Parser};

/// `(parent, name, position in centimetres)`
const BONES: [(i32, &str, [f32; 3]); 6] = [
    (0, "b1_pelvis", [0.0, 0.0, 100.0]),
    (0, "b1_spine", [0.0, 0.0, 20.0]),
    (1, "b1_neck", [0.0, 0.0, 40.0]),
    (2, "b1_head", [0.0, 0.0, 10.0]),
    (1, "b1_l_upperarm", [20.0, 0.0, 30.0]),
    (1, "b1_r_upperarm", [-20.0, 0.0, 30.0]),
];

fn skeleton_bytes(identifier: &str, dummies: &[(&str, i32, [f32; 3])]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.bytes(identifier.as_bytes()).u32(BONES.len() as u32);
    for (parent, name, position) in BONES {
        w.i32(parent).cstring(name).f32s(&position).f32s(&[1.0, 0.0, 0.0, 0.0]);
    }

    w.u32(dummies.len() as u32);
    for &(name, parent, position) in dummies {
        w.cstring(name).i32(parent).f32s(&position);
        if identifier == "ZMD0003" {
            w.f32s(&[0.0, 0.0, 0.0, 1.0]);
        }
    }
    w.finish()
}

fn assert_vec3_near(actual: Vec3, expected: [f32; 3]) {
    let delta = [actual.x - expected[0], actual.y - expected[1], actual.z - expected[2]];
    assert!(
        delta.iter().all(|d| d.abs() < 1e-5),
        "expected {expected:?}, got {:?}",
        actual.to_array()
    );
}

#[test]
fn test_decode_with_rotated_dummies() {
    let data = skeleton_bytes("ZMD0003", &[("p_00", 3, [0.0, 10.0, 0.0]), ("p_01", 4, [5.0, 0.0, 0.0])]);
    let skeleton = ZmdParser.parse(&data).unwrap();

    assert_eq!(skeleton.identifier, "ZMD0003");
    assert_eq!(skeleton.bone_count(), 6);
    assert_eq!(skeleton.bones[0].parent, -1);
    assert_eq!(skeleton.root_bones(), vec![0]);
    assert_eq!(skeleton.children(1), vec![2, 4, 5]);
    assert_eq!(skeleton.bone_chain_to_root(3), vec![3, 2, 1, 0]);
    assert_eq!(skeleton.find_bone("b1_head").map(|(index, _)| index), Some(3));

    assert_eq!(skeleton.dummy_bones.len(), 2);
    let dummy = skeleton.find_dummy("p_00").unwrap();
    assert_eq!(dummy.parent, 3);
    assert_eq!(dummy.rotation.z, 1.0);
    assert_vec3_near(dummy.position, [0.0, 0.1, 0.0]);
}

#[test]
fn test_older_revision_dummies_have_identity_rotation() {
    let data = skeleton_bytes("ZMD0002", &[("p_00", 0, [1.0, 2.0, 3.0])]);
    let skeleton = ZmdParser.parse(&data).unwrap();

    let dummy = &skeleton.dummy_bones[0];
    assert_eq!(dummy.rotation.w, 1.0);
    assert_eq!(dummy.rotation.z, 0.0);
}

#[test]
fn test_reconstruct_chain() {
    let data = skeleton_bytes("ZMD0003", &[("p_00", 3, [0.0, 10.0, 0.0])]);
    let skeleton = ZmdParser.parse(&data).unwrap();
    let poses = zmd::reconstruct(&skeleton, &RigOptions::default()).unwrap();

    assert_eq!(poses.len(), 6);
    assert_eq!(poses[0].parent, None);
    assert_vec3_near(poses[0].tail, [0.0, 0.0, 1.0]);
    assert_vec3_near(poses[0].head, [0.0, 0.0, 1.0 + 1e-5]);

    // Every child starts where its parent ends
    for pose in &poses[1..] {
        let parent = &poses[pose.parent.unwrap()];
        assert_eq!(pose.head, parent.tail);
    }
    assert_vec3_near(poses[3].tail, [0.0, 0.0, 1.7]);
    assert_vec3_near(poses[4].tail, [0.2, 0.0, 1.5]);
    assert_vec3_near(poses[5].tail, [-0.2, 0.0, 1.5]);

    let dummies = zmd::reconstruct_dummies(&skeleton, &poses).unwrap();
    assert_eq!(dummies[0].parent, Some(3));
    assert_vec3_near(dummies[0].tail, [0.0, 0.1, 1.7]);
}

#[test]
fn test_reconstruct_without_root_offset() {
    let skeleton = ZmdParser.parse(&skeleton_bytes("ZMD0002", &[])).unwrap();
    let options = RigOptions {
        preserve_root: false,
        ..RigOptions::default()
    };
    let poses = zmd::reconstruct(&skeleton, &options).unwrap();

    assert_eq!(poses[0].head, poses[0].tail);
}

#[test]
fn test_forward_parent_is_rejected_when_strict() {
    let mut data = skeleton_bytes("ZMD0002", &[]);
    // Parent field of bone 1 sits right after bone 0
    let bone1 = 7 + 4 + 4 + "b1_pelvis".len() + 1 + 12 + 16;
    data[bone1..bone1 + 4].copy_from_slice(&4i32.to_le_bytes());

    match ZmdParser.parse(&data) {
        Err(ParseError::InvalidHierarchy { bone, parent, bone_count }) => {
            assert_eq!((bone, parent, bone_count), (1, 4, 6));
        }
        other => panic!("expected invalid hierarchy, got {other:?}"),
    }

    // Decoding alone succeeds, reconstruction still refuses the bone
    let skeleton = ZmdParser.parse_with_options(&data, &ParseOptions::lenient()).unwrap();
    assert!(matches!(
        zmd::reconstruct(&skeleton, &RigOptions::default()),
        Err(ParseError::InvalidHierarchy { bone: 1, .. })
    ));
}

#[test]
fn test_dummy_parent_out_of_range() {
    let data = skeleton_bytes("ZMD0003", &[("p_00", 6, [0.0, 0.0, 0.0])]);
    assert!(matches!(
        ZmdParser.parse(&data),
        Err(ParseError::InvalidStructure(_))
    ));
}
