//! Map data, lightmap, sprite and archive index decoding

mod common;

use common::ByteWriter;
use roseread_core::Vec3;
use roseread_parsers::idx::IdxParser;
use roseread_parsers::ifo::{IfoParser, MapBlockType};
use roseread_parsers::lit::LitParser;
use roseread_parsers::tsi::TsiParser;
use roseread_parsers::{ParseError, ParseOptions, Parser};

fn placement(w: &mut ByteWriter, name: &str, object_id: i32, position: [f32; 3]) {
    w.string_u8(name).i16(-1).i16(0).i32(2).i32(object_id);
    w.i32(30).i32(31);
    w.f32s(&[0.0, 0.0, 0.0, 1.0]);
    w.f32s(&position).f32s(&[1.0, 1.0, 1.0]);
}

/// Block table followed by the blocks, with offsets patched in afterwards
fn map_bytes(blocks: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(blocks.len() as u32);
    for (block_type, _) in blocks {
        w.u32(*block_type).u32(0);
    }
    for (index, (_, block)) in blocks.iter().enumerate() {
        let offset = w.position() as u32;
        w.patch_u32(4 + index * 8 + 4, offset);
        w.bytes(block);
    }
    w.finish()
}

fn map_info() -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.i32(30).i32(31).i32(1).i32(2);
    w.f32s(&[0.0; 16]);
    w.cstring("Canyon City of Zant");
    w.finish()
}

fn npcs() -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(2);
    placement(&mut w, "[Guide] Arua", 1001, [5200.0, 5300.0, 0.0]);
    w.i32(12).string_u8("3DDATA/NPC/GUIDE.CON");
    placement(&mut w, "[Merchant] Rosa", 1002, [5210.0, 5290.0, 0.0]);
    w.i32(0).string_u8("");
    w.finish()
}

fn water() -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(1);
    placement(&mut w, "", 0, [5000.0, 5000.0, -10.0]);
    w.u32(2).u32(1);
    w.u8(1).f32(-10.0).u8(0).f32(0.0);
    w.finish()
}

fn spawns() -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(1);
    placement(&mut w, "spawn", 0, [5100.0, 5100.0, 0.0]);
    w.string_u8("jelly beans");
    w.u32(2).string_u8("jelly bean").u32(1).u32(3).string_u8("bonfire").u32(2).u32(1);
    w.u32(0);
    w.u32(30).u32(12).u32(500).u32(0);
    w.finish()
}

#[test]
fn test_decode_map_data() {
    let data = map_bytes(&[(0, map_info()), (2, npcs()), (7, water()), (8, spawns())]);
    let map = IfoParser.parse(&data).unwrap();

    let info = map.info.as_ref().unwrap();
    assert_eq!(info.map_position, [30, 31]);
    assert_eq!(info.name, "Canyon City of Zant");

    assert_eq!(map.npcs.len(), 2);
    let guide = map.find_npc("[Guide] Arua").unwrap();
    assert_eq!(guide.ai, 12);
    assert_eq!(guide.file, "3DDATA/NPC/GUIDE.CON");
    assert_eq!(guide.object.position, Vec3::new(5200.0, 5300.0, 0.0));
    assert_eq!(guide.object.rotation.w, 1.0);

    let cells = &map.waters[0].cells;
    assert_eq!((cells.width(), cells.length()), (2, 1));
    assert!(cells.get(0, 0).unwrap().has_water);
    assert!(!cells.get(1, 0).unwrap().has_water);

    let spawn = &map.monster_spawns[0];
    assert_eq!(spawn.name, "jelly beans");
    assert_eq!(spawn.basic_spawns[1].name, "bonfire");
    assert_eq!(spawn.basic_spawns[1].count, 1);
    assert!(spawn.tactical_spawns.is_empty());
    assert_eq!((spawn.interval, spawn.limit, spawn.range), (30, 12, 500));

    let kinds: Vec<MapBlockType> = map.placements().into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(
        kinds,
        vec![MapBlockType::Npc, MapBlockType::Npc, MapBlockType::Water, MapBlockType::MonsterSpawn]
    );
}

#[test]
fn test_duplicate_map_info() {
    let data = map_bytes(&[(0, map_info()), (0, map_info())]);
    let err = IfoParser.parse(&data).unwrap_err();
    assert!(err.to_string().contains("MapInfo"), "{err}");
    assert!(matches!(err.root_cause(), ParseError::InvalidStructure(_)));
}

#[test]
fn test_truncated_block_names_entry() {
    let mut data = map_bytes(&[(2, npcs())]);
    data.truncate(data.len() - 1);

    let err = IfoParser.parse(&data).unwrap_err();
    assert!(err.to_string().contains("entry 1"), "{err}");
}

fn lightmap_bytes(cell: i32, atlas: i32) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.i32(1);
    w.i32(2).i32(7);
    w.string_u8("wall").i32(0).string_u8("wall_LightingMap.dds");
    w.i32(0).i32(64).i32(4).i32(5);
    w.string_u8("roof").i32(1).string_u8("roof_LightingMap.dds");
    w.i32(atlas).i32(64).i32(4).i32(cell);
    w.i32(1).string_u8("Object_32_32.dds");
    w.finish()
}

#[test]
fn test_decode_lightmap() {
    let lightmap = LitParser.parse(&lightmap_bytes(6, 0)).unwrap();

    assert_eq!(lightmap.part_count(), 2);
    let object = lightmap.find_object(7).unwrap();
    let roof = &object.parts[1];
    assert_eq!(roof.cell_position(), Some((2, 1)));
    assert_eq!(lightmap.atlas_file(roof), Some("Object_32_32.dds"));
}

#[test]
fn test_lightmap_bad_references_need_lenient() {
    for data in [lightmap_bytes(16, 0), lightmap_bytes(6, 1)] {
        assert!(matches!(LitParser.parse(&data), Err(ParseError::InvalidStructure(_))));
        assert!(LitParser.parse_with_options(&data, &ParseOptions::lenient()).is_ok());
    }
}

fn sprite(w: &mut ByteWriter, sheet: u16, name: &str, start: [u32; 2], end: [u32; 2]) {
    w.u16(sheet).u32(start[0]).u32(start[1]).u32(end[0]).u32(end[1]).u32(0xFFFF_FFFF);
    let mut padded = [0u8; 32];
    padded[..name.len()].copy_from_slice(name.as_bytes());
    w.bytes(&padded);
}

fn sprite_bytes(second_sheet_id: u16) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u16(2);
    w.string_u16("3DDATA/CONTROL/RES/UI00.DDS").u32(0);
    w.string_u16("3DDATA/CONTROL/RES/UI01.DDS").u32(0xFF00FF);
    w.u16(3);
    w.u16(2);
    sprite(&mut w, 0, "UI00_BTN_OK", [0, 0], [64, 24]);
    sprite(&mut w, 0, "UI00_BTN_CANCEL", [64, 0], [128, 24]);
    w.u16(1);
    sprite(&mut w, second_sheet_id, "UI01_GAUGE_HP", [0, 100], [200, 110]);
    w.finish()
}

#[test]
fn test_decode_sprites() {
    let info = TsiParser.parse(&sprite_bytes(1)).unwrap();

    assert_eq!(info.sheets.len(), 2);
    assert_eq!(info.sprite_count(), 3);
    assert_eq!(info.sheets[1].color_key, 0xFF00FF);

    let (sheet, gauge) = info.find_sprite("UI01_GAUGE_HP").unwrap();
    assert_eq!(sheet.path, "3DDATA/CONTROL/RES/UI01.DDS");
    assert_eq!(gauge.size(), [200, 10]);
    assert!(info.find_sprite("UI02_MISSING").is_none());
}

#[test]
fn test_sprite_sheet_mismatch_needs_lenient() {
    let data = sprite_bytes(0);
    let err = TsiParser.parse(&data).unwrap_err();
    assert!(err.to_string().contains("UI01_GAUGE_HP"), "{err}");
    assert!(TsiParser.parse_with_options(&data, &ParseOptions::lenient()).is_ok());
}

fn vfs_file(w: &mut ByteWriter, path: &str, is_deleted: bool) {
    w.string_u16(path).i32(0).i32(1024).i32(1024);
    w.u8(is_deleted as u8).u8(0).u8(0).i32(1).i32(0);
}

/// Two archives whose file tables follow both headers
fn index_bytes(delete_count: i32) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.i32(118).i32(120).i32(2);
    w.string_u16("DATA.VFS");
    let first = w.position();
    w.i32(0);
    w.string_u16("MAP.VFS");
    let second = w.position();
    w.i32(0);

    let offset = w.position() as u32;
    w.patch_u32(first, offset);
    w.i32(2).i32(delete_count).i32(0);
    vfs_file(&mut w, r"3DDATA\STB\LIST_NPC.STB", false);
    vfs_file(&mut w, r"3DDATA\STB\OLD.STB", true);

    let offset = w.position() as u32;
    w.patch_u32(second, offset);
    w.i32(1).i32(0).i32(0);
    vfs_file(&mut w, r"3DDATA\MAPS\JUNON\JPT01\30_30.HIM", false);
    w.finish()
}

#[test]
fn test_decode_vfs_index() {
    let index = IdxParser.parse(&index_bytes(1)).unwrap();

    assert_eq!((index.base_version, index.current_version), (118, 120));
    assert_eq!(index.archives.len(), 2);
    assert_eq!(index.file_count(), 3);
    assert_eq!(index.archives[0].files[0].path, "3DDATA/STB/LIST_NPC.STB");

    let (archive, file) = index.find("3ddata/maps/junon/jpt01/30_30.him").unwrap();
    assert_eq!(archive.name, "MAP.VFS");
    assert_eq!(file.size, 1024);
    assert!(index.find(r"3DDATA\STB\OLD.STB").is_none());
}

#[test]
fn test_delete_count_needs_lenient() {
    let data = index_bytes(0);
    let err = IdxParser.parse(&data).unwrap_err();
    assert!(err.to_string().contains("DATA.VFS"), "{err}");
    assert!(IdxParser.parse_with_options(&data, &ParseOptions::lenient()).is_ok());
}

#[test]
fn test_file_table_past_end() {
    let mut data = index_bytes(1);
    // First archive header: 12-byte version block, 2-byte length, "DATA.VFS"
    data[22..26].copy_from_slice(&9999u32.to_le_bytes());

    let err = IdxParser.parse(&data).unwrap_err();
    assert!(err.to_string().contains("file table of DATA.VFS"), "{err}");
    assert!(matches!(err.root_cause(), ParseError::TruncatedInput { .. }));
}
