// roseread-parsers/src/ifo.rs
//! Map data (`.ifo`) decoder
//!
//! Each map block of a zone has an `.ifo` file next to its `.him` and
//! `.til` that places objects, NPCs, sounds, water and spawns. Like a zone
//! file it starts with a block table, `[u32 block_count]` followed by
//! `block_count × (u32 type, u32 offset)`, and each block is decoded after
//! seeking to its offset.
//!
//! Map info and ocean blocks have their own layout. Every other block is
//! `[u32 n]` entries, each a common placement record followed by the
//! block's extra fields.

use std::fmt;

use roseread_core::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Block kinds listed in the block table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapBlockType {
    MapInfo = 0,
    Object = 1,
    Npc = 2,
    Building = 3,
    Sound = 4,
    Effect = 5,
    Animation = 6,
    Water = 7,
    MonsterSpawn = 8,
    Ocean = 9,
    Warp = 10,
    CollisionObject = 11,
    EventObject = 12,
}

impl TryFrom<u32> for MapBlockType {
    type Error = ParseError;

    fn try_from(value: u32) -> ParseResult<Self> {
        Ok(match value {
            0 => MapBlockType::MapInfo,
            1 => MapBlockType::Object,
            2 => MapBlockType::Npc,
            3 => MapBlockType::Building,
            4 => MapBlockType::Sound,
            5 => MapBlockType::Effect,
            6 => MapBlockType::Animation,
            7 => MapBlockType::Water,
            8 => MapBlockType::MonsterSpawn,
            9 => MapBlockType::Ocean,
            10 => MapBlockType::Warp,
            11 => MapBlockType::CollisionObject,
            12 => MapBlockType::EventObject,
            other => {
                return Err(ParseError::UnrecognizedFormat {
                    format: "IFO block type",
                    found: other.to_string(),
                })
            }
        })
    }
}

impl fmt::Display for MapBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Placement shared by every entry of a list block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub name: String,
    pub warp_id: i16,
    pub event_id: i16,
    pub object_type: i32,
    /// Row of the block's model list (or NPC / warp table)
    pub object_id: i32,
    pub map_position: [i32; 2],
    pub rotation: Quat,
    pub position: Vec3,
    pub scale: Vec3,
}

impl MapObject {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            name: cursor.read_string_u8()?,
            warp_id: cursor.read_i16()?,
            event_id: cursor.read_i16()?,
            object_type: cursor.read_i32()?,
            object_id: cursor.read_i32()?,
            map_position: cursor.read_vec2_i32()?,
            rotation: cursor.read_quat_xyzw()?,
            position: cursor.read_vec3()?,
            scale: cursor.read_vec3()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNpc {
    pub object: MapObject,
    pub ai: i32,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSound {
    pub object: MapObject,
    pub file: String,
    pub range: i32,
    pub interval: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEffect {
    pub object: MapObject,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEvent {
    pub object: MapObject,
    pub function_name: String,
    pub file: String,
}

/// One cell of a water plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterCell {
    pub has_water: bool,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapWater {
    pub object: MapObject,
    pub cells: Grid<WaterCell>,
}

/// Monster kind and count of one spawn entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub name: String,
    pub monster: u32,
    pub count: u32,
}

impl SpawnEntry {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            name: cursor.read_string_u8()?,
            monster: cursor.read_u32()?,
            count: cursor.read_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    pub object: MapObject,
    pub name: String,
    pub basic_spawns: Vec<SpawnEntry>,
    pub tactical_spawns: Vec<SpawnEntry>,
    pub interval: u32,
    pub limit: u32,
    pub range: u32,
    pub tactical_variable: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OceanPatch {
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ocean {
    pub size: f32,
    pub patches: Vec<OceanPatch>,
}

/// Contents of the map info block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    pub map_position: [i32; 2],
    pub zone_position: [i32; 2],
    /// Row-major 4 × 4 matrix, unused by the client
    pub world_matrix: [f32; 16],
    pub name: String,
}

/// Decoded map data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub info: Option<MapInfo>,
    pub objects: Vec<MapObject>,
    pub npcs: Vec<MapNpc>,
    pub buildings: Vec<MapObject>,
    pub sounds: Vec<MapSound>,
    pub effects: Vec<MapEffect>,
    pub animations: Vec<MapObject>,
    pub waters: Vec<MapWater>,
    pub monster_spawns: Vec<MonsterSpawn>,
    pub oceans: Vec<Ocean>,
    pub warps: Vec<MapObject>,
    pub collision_objects: Vec<MapObject>,
    pub events: Vec<MapEvent>,
}

impl MapData {
    /// Every placement with the block it came from, in block order
    pub fn placements(&self) -> Vec<(MapBlockType, &MapObject)> {
        let mut all = Vec::new();
        all.extend(self.objects.iter().map(|o| (MapBlockType::Object, o)));
        all.extend(self.npcs.iter().map(|n| (MapBlockType::Npc, &n.object)));
        all.extend(self.buildings.iter().map(|o| (MapBlockType::Building, o)));
        all.extend(self.sounds.iter().map(|s| (MapBlockType::Sound, &s.object)));
        all.extend(self.effects.iter().map(|e| (MapBlockType::Effect, &e.object)));
        all.extend(self.animations.iter().map(|o| (MapBlockType::Animation, o)));
        all.extend(self.waters.iter().map(|w| (MapBlockType::Water, &w.object)));
        all.extend(self.monster_spawns.iter().map(|m| (MapBlockType::MonsterSpawn, &m.object)));
        all.extend(self.warps.iter().map(|o| (MapBlockType::Warp, o)));
        all.extend(self.collision_objects.iter().map(|o| (MapBlockType::CollisionObject, o)));
        all.extend(self.events.iter().map(|e| (MapBlockType::EventObject, &e.object)));
        all
    }

    pub fn find_npc(&self, name: &str) -> Option<&MapNpc> {
        self.npcs.iter().find(|npc| npc.object.name == name)
    }

    fn read_block(&mut self, cursor: &mut ByteCursor<'_>, block: MapBlockType) -> ParseResult<()> {
        match block {
            MapBlockType::MapInfo => {
                let info = MapInfo {
                    map_position: cursor.read_vec2_i32()?,
                    zone_position: cursor.read_vec2_i32()?,
                    world_matrix: read_matrix(cursor)?,
                    name: cursor.read_cstring()?,
                };
                if self.info.replace(info).is_some() {
                    return Err(ParseError::invalid("duplicate MapInfo block"));
                }
            }
            MapBlockType::Ocean => {
                let size = cursor.read_f32()?;
                let count = cursor.read_count_u32("ocean patch")?;
                let patches = cursor.read_array(count, |c| {
                    Ok(OceanPatch {
                        start: c.read_vec3()?,
                        end: c.read_vec3()?,
                    })
                })?;
                self.oceans.push(Ocean { size, patches });
            }
            _ => {
                let count = cursor.read_count_u32("entry")?;
                for index in 0..count {
                    self.read_entry(cursor, block)
                        .map_err(|e| e.with_context(format!("entry {index}")))?;
                }
            }
        }
        Ok(())
    }

    fn read_entry(&mut self, cursor: &mut ByteCursor<'_>, block: MapBlockType) -> ParseResult<()> {
        let object = MapObject::read(cursor)?;

        match block {
            MapBlockType::MapInfo | MapBlockType::Ocean => {
                return Err(ParseError::invalid(format!("{block} block has no entries")))
            }
            MapBlockType::Object => self.objects.push(object),
            MapBlockType::Building => self.buildings.push(object),
            MapBlockType::Animation => self.animations.push(object),
            MapBlockType::Warp => self.warps.push(object),
            MapBlockType::CollisionObject => self.collision_objects.push(object),
            MapBlockType::Npc => self.npcs.push(MapNpc {
                object,
                ai: cursor.read_i32()?,
                file: cursor.read_string_u8()?,
            }),
            MapBlockType::Sound => self.sounds.push(MapSound {
                object,
                file: cursor.read_string_u8()?,
                range: cursor.read_i32()?,
                interval: cursor.read_i32()?,
            }),
            MapBlockType::Effect => self.effects.push(MapEffect {
                object,
                file: cursor.read_string_u8()?,
            }),
            MapBlockType::EventObject => self.events.push(MapEvent {
                object,
                function_name: cursor.read_string_u8()?,
                file: cursor.read_string_u8()?,
            }),
            MapBlockType::Water => {
                let width = cursor.read_count_u32("water width")?;
                let length = cursor.read_count_u32("water length")?;
                let cells = Grid::read_rows(cursor, width, length, |c| {
                    Ok(WaterCell {
                        has_water: c.read_bool()?,
                        height: c.read_f32()?,
                    })
                })?;
                self.waters.push(MapWater { object, cells });
            }
            MapBlockType::MonsterSpawn => {
                let name = cursor.read_string_u8()?;
                let basic_count = cursor.read_count_u32("basic spawn")?;
                let basic_spawns = cursor.read_array(basic_count, SpawnEntry::read)?;
                let tactical_count = cursor.read_count_u32("tactical spawn")?;
                let tactical_spawns = cursor.read_array(tactical_count, SpawnEntry::read)?;
                self.monster_spawns.push(MonsterSpawn {
                    object,
                    name,
                    basic_spawns,
                    tactical_spawns,
                    interval: cursor.read_u32()?,
                    limit: cursor.read_u32()?,
                    range: cursor.read_u32()?,
                    tactical_variable: cursor.read_u32()?,
                });
            }
        }
        Ok(())
    }
}

fn read_matrix(cursor: &mut ByteCursor<'_>) -> ParseResult<[f32; 16]> {
    let mut matrix = [0.0; 16];
    for value in &mut matrix {
        *value = cursor.read_f32()?;
    }
    Ok(matrix)
}

impl HumanReadable for MapData {
    fn to_readable_string(&self) -> String {
        let mut out = match &self.info {
            Some(info) => format!(
                "Map data {} at {:?} (zone {:?})\n",
                info.name, info.map_position, info.zone_position
            ),
            None => "Map data\n".to_string(),
        };
        out.push_str(&format!(
            "  objects: {}\n  buildings: {}\n  npcs: {}\n  sounds: {}\n  effects: {}\n  animations: {}\n  waters: {}\n  monster spawns: {}\n  oceans: {}\n  warps: {}\n  collision objects: {}\n  events: {}\n",
            self.objects.len(),
            self.buildings.len(),
            self.npcs.len(),
            self.sounds.len(),
            self.effects.len(),
            self.animations.len(),
            self.waters.len(),
            self.monster_spawns.len(),
            self.oceans.len(),
            self.warps.len(),
            self.collision_objects.len(),
            self.events.len(),
        ));
        out
    }
}

/// Map data decoder
pub struct IfoParser;

impl IfoParser {
    pub fn new() -> Self {
        Self
    }

    fn read_block_table(cursor: &mut ByteCursor<'_>) -> ParseResult<Vec<(MapBlockType, u64)>> {
        let block_count = cursor.read_count_u32("block")?;
        cursor.read_array(block_count, |c| {
            let block_type = MapBlockType::try_from(c.read_u32()?)?;
            Ok((block_type, u64::from(c.read_u32()?)))
        })
    }
}

impl Default for IfoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for IfoParser {
    type Output = MapData;

    fn name(&self) -> &str {
        "IFO Map Data Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["ifo"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<MapData> {
        let mut cursor = ByteCursor::new(data);
        let table = Self::read_block_table(&mut cursor)?;

        let mut map = MapData::default();
        for (block, offset) in table {
            cursor.seek(offset)?;
            map.read_block(&mut cursor, block)
                .map_err(|e| e.with_context(format!("{block} block at offset {offset}")))?;
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_types() {
        assert_eq!(MapBlockType::try_from(8).unwrap(), MapBlockType::MonsterSpawn);
        assert!(matches!(
            MapBlockType::try_from(13),
            Err(ParseError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_empty_block_table() {
        let map = IfoParser.parse(&0u32.to_le_bytes()).unwrap();
        assert_eq!(map, MapData::default());
        assert!(map.placements().is_empty());
    }

    #[test]
    fn test_ocean_block() {
        let mut data = Vec::new();
        for v in [1u32, 9, 12] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&250.0f32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        for v in [0.0f32, 0.0, 10.0, 160.0, 160.0, 10.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }

        let map = IfoParser.parse(&data).unwrap();
        assert_eq!(map.oceans.len(), 1);
        assert_eq!(map.oceans[0].size, 250.0);
        assert_eq!(map.oceans[0].patches[0].end, Vec3::new(160.0, 160.0, 10.0));
    }
}
