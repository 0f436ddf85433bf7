// roseread-parsers/src/zon.rs
//! Zone (`.zon`) decoder
//!
//! A zone file starts with a block table, `[i32 block_count]` followed by
//! `block_count × (i32 type, i32 offset)`. Each block is decoded after
//! seeking to its absolute offset, so the table order does not matter.
//!
//! | Type | Block        | Contents |
//! |------|--------------|----------|
//! | 0    | Basic info   | zone type, grid dimensions, start, position grid |
//! | 1    | Spawn points | `[i32 n] n × (3×f32, string_u8 name)` |
//! | 2    | Textures     | `[i32 n] n × string_u8` |
//! | 3    | Tiles        | `[i32 n] n × 7×i32` |
//! | 4    | Economy      | names, flags and consumption rates |
//!
//! Every block must be present.

use std::fmt;

use roseread_core::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Zone category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    Grass = 0,
    Mountain = 1,
    MountainVillage = 2,
    BoatVillage = 3,
    Login = 4,
    MountainGorge = 5,
    Beach = 6,
    JunonDungeon = 7,
    LunaSnow = 8,
    Birth = 9,
    JunonField = 10,
    LunaDungeon = 11,
    EldeonField = 12,
    EldeonField2 = 13,
    JunonPyramids = 14,
}

impl TryFrom<i32> for ZoneType {
    type Error = ParseError;

    fn try_from(value: i32) -> ParseResult<Self> {
        Ok(match value {
            0 => ZoneType::Grass,
            1 => ZoneType::Mountain,
            2 => ZoneType::MountainVillage,
            3 => ZoneType::BoatVillage,
            4 => ZoneType::Login,
            5 => ZoneType::MountainGorge,
            6 => ZoneType::Beach,
            7 => ZoneType::JunonDungeon,
            8 => ZoneType::LunaSnow,
            9 => ZoneType::Birth,
            10 => ZoneType::JunonField,
            11 => ZoneType::LunaDungeon,
            12 => ZoneType::EldeonField,
            13 => ZoneType::EldeonField2,
            14 => ZoneType::JunonPyramids,
            other => {
                return Err(ParseError::UnrecognizedFormat {
                    format: "ZON zone type",
                    found: other.to_string(),
                })
            }
        })
    }
}

/// Block kinds listed in the block table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneBlockType {
    BasicInfo = 0,
    SpawnPoints = 1,
    Textures = 2,
    Tiles = 3,
    Economy = 4,
}

impl TryFrom<i32> for ZoneBlockType {
    type Error = ParseError;

    fn try_from(value: i32) -> ParseResult<Self> {
        match value {
            0 => Ok(ZoneBlockType::BasicInfo),
            1 => Ok(ZoneBlockType::SpawnPoints),
            2 => Ok(ZoneBlockType::Textures),
            3 => Ok(ZoneBlockType::Tiles),
            4 => Ok(ZoneBlockType::Economy),
            other => Err(ParseError::UnrecognizedFormat {
                format: "ZON block type",
                found: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ZoneBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Texture orientation of a zone tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileRotation {
    Unknown = 0,
    None = 1,
    FlipHorizontal = 2,
    FlipVertical = 3,
    Flip = 4,
    Clockwise90 = 5,
    CounterClockwise90 = 6,
}

impl TryFrom<i32> for TileRotation {
    type Error = ParseError;

    fn try_from(value: i32) -> ParseResult<Self> {
        match value {
            0 => Ok(TileRotation::Unknown),
            1 => Ok(TileRotation::None),
            2 => Ok(TileRotation::FlipHorizontal),
            3 => Ok(TileRotation::FlipVertical),
            4 => Ok(TileRotation::Flip),
            5 => Ok(TileRotation::Clockwise90),
            6 => Ok(TileRotation::CounterClockwise90),
            other => Err(ParseError::invalid(format!("invalid tile rotation {other}"))),
        }
    }
}

/// One cell of the zone's position grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZonePosition {
    pub is_used: bool,
    pub position: Vec2,
}

/// Named location in the zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub name: String,
}

/// Blend of two texture layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTile {
    pub layer1: i32,
    pub layer2: i32,
    pub offset1: i32,
    pub offset2: i32,
    pub blend: bool,
    pub rotation: TileRotation,
    pub tile_type: i32,
}

impl ZoneTile {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            layer1: cursor.read_i32()?,
            layer2: cursor.read_i32()?,
            offset1: cursor.read_i32()?,
            offset2: cursor.read_i32()?,
            blend: cursor.read_bool32()?,
            rotation: TileRotation::try_from(cursor.read_i32()?)?,
            tile_type: cursor.read_i32()?,
        })
    }
}

/// Gameplay parameters of a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    pub name: String,
    pub is_underground: bool,
    pub background_music: String,
    pub sky: String,
    pub economy_tick_rate: i32,
    pub population_base: i32,
    pub population_growth_rate: i32,
    pub metal_consumption: i32,
    pub stone_consumption: i32,
    pub wood_consumption: i32,
    pub leather_consumption: i32,
    pub cloth_consumption: i32,
    pub alchemy_consumption: i32,
    pub chemical_consumption: i32,
    pub industrial_consumption: i32,
    pub medicine_consumption: i32,
    pub food_consumption: i32,
}

impl Economy {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            name: cursor.read_string_u8()?,
            is_underground: cursor.read_bool32()?,
            background_music: cursor.read_string_u8()?,
            sky: cursor.read_string_u8()?,
            economy_tick_rate: cursor.read_i32()?,
            population_base: cursor.read_i32()?,
            population_growth_rate: cursor.read_i32()?,
            metal_consumption: cursor.read_i32()?,
            stone_consumption: cursor.read_i32()?,
            wood_consumption: cursor.read_i32()?,
            leather_consumption: cursor.read_i32()?,
            cloth_consumption: cursor.read_i32()?,
            alchemy_consumption: cursor.read_i32()?,
            chemical_consumption: cursor.read_i32()?,
            industrial_consumption: cursor.read_i32()?,
            medicine_consumption: cursor.read_i32()?,
            food_consumption: cursor.read_i32()?,
        })
    }
}

/// Contents of the basic info block
#[derive(Debug)]
struct BasicInfo {
    zone_type: ZoneType,
    grid_count: i32,
    grid_size: f32,
    start_position: [i32; 2],
    positions: Grid<ZonePosition>,
}

impl BasicInfo {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        let zone_type = ZoneType::try_from(cursor.read_i32()?)?;
        let width = cursor.read_count_i32("width")?;
        let length = cursor.read_count_i32("length")?;
        let grid_count = cursor.read_i32()?;
        let grid_size = cursor.read_f32()?;
        let start_position = cursor.read_vec2_i32()?;

        // Positions are stored column by column
        let positions = Grid::read_columns(cursor, width, length, |c| {
            Ok(ZonePosition {
                is_used: c.read_bool()?,
                position: c.read_vec2()?,
            })
        })?;

        Ok(Self {
            zone_type,
            grid_count,
            grid_size,
            start_position,
            positions,
        })
    }
}

/// Decoded zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_type: ZoneType,
    pub grid_count: i32,
    /// World units per grid cell
    pub grid_size: f32,
    pub start_position: [i32; 2],
    pub positions: Grid<ZonePosition>,
    pub spawn_points: Vec<SpawnPoint>,
    pub textures: Vec<String>,
    pub tiles: Vec<ZoneTile>,
    pub economy: Economy,
}

impl Zone {
    pub fn width(&self) -> usize {
        self.positions.width()
    }

    pub fn length(&self) -> usize {
        self.positions.length()
    }

    pub fn find_spawn_point(&self, name: &str) -> Option<&SpawnPoint> {
        self.spawn_points.iter().find(|spawn| spawn.name == name)
    }
}

impl HumanReadable for Zone {
    fn to_readable_string(&self) -> String {
        let mut out = format!(
            "Zone {:?} ({})\n  grid: {}x{} x {} (size {})\n  start: {:?}\n  spawn points: {}\n  textures: {}\n  tiles: {}\n",
            self.zone_type,
            self.economy.name,
            self.width(),
            self.length(),
            self.grid_count,
            self.grid_size,
            self.start_position,
            self.spawn_points.len(),
            self.textures.len(),
            self.tiles.len(),
        );
        for spawn in &self.spawn_points {
            out.push_str(&format!("    {} at {:?}\n", spawn.name, spawn.position.to_array()));
        }
        out.push_str(&format!(
            "  underground: {}\n  music: {}\n  sky: {}\n  population: {} (+{})\n",
            self.economy.is_underground,
            self.economy.background_music,
            self.economy.sky,
            self.economy.population_base,
            self.economy.population_growth_rate,
        ));
        out
    }
}

/// Zone decoder
pub struct ZonParser;

impl ZonParser {
    pub fn new() -> Self {
        Self
    }

    fn read_block_table(cursor: &mut ByteCursor<'_>) -> ParseResult<Vec<(ZoneBlockType, u64)>> {
        let block_count = cursor.read_count_i32("block")?;
        cursor.read_array(block_count, |c| {
            let block_type = ZoneBlockType::try_from(c.read_i32()?)?;
            let offset = c.read_i32()?;
            let offset = u64::try_from(offset)
                .map_err(|_| ParseError::invalid(format!("{block_type} block has negative offset {offset}")))?;
            Ok((block_type, offset))
        })
    }
}

impl Default for ZonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks decoded so far, each filled at most once
#[derive(Default)]
struct ZoneBlocks {
    basic_info: Option<BasicInfo>,
    spawn_points: Option<Vec<SpawnPoint>>,
    textures: Option<Vec<String>>,
    tiles: Option<Vec<ZoneTile>>,
    economy: Option<Economy>,
}

impl ZoneBlocks {
    fn read_block(&mut self, cursor: &mut ByteCursor<'_>, block: ZoneBlockType) -> ParseResult<()> {
        match block {
            ZoneBlockType::BasicInfo => fill(&mut self.basic_info, block, BasicInfo::read(cursor)?),
            ZoneBlockType::SpawnPoints => {
                let count = cursor.read_count_i32("spawn point")?;
                let spawn_points = cursor.read_array(count, |c| {
                    Ok(SpawnPoint {
                        position: c.read_vec3()?,
                        name: c.read_string_u8()?,
                    })
                })?;
                fill(&mut self.spawn_points, block, spawn_points)
            }
            ZoneBlockType::Textures => {
                let count = cursor.read_count_i32("texture")?;
                let textures = cursor.read_array(count, |c| c.read_string_u8())?;
                fill(&mut self.textures, block, textures)
            }
            ZoneBlockType::Tiles => {
                let count = cursor.read_count_i32("tile")?;
                let tiles = cursor.read_array(count, ZoneTile::read)?;
                fill(&mut self.tiles, block, tiles)
            }
            ZoneBlockType::Economy => fill(&mut self.economy, block, Economy::read(cursor)?),
        }
    }

    fn finish(self) -> ParseResult<Zone> {
        let basic_info = required(self.basic_info, ZoneBlockType::BasicInfo)?;

        Ok(Zone {
            zone_type: basic_info.zone_type,
            grid_count: basic_info.grid_count,
            grid_size: basic_info.grid_size,
            start_position: basic_info.start_position,
            positions: basic_info.positions,
            spawn_points: required(self.spawn_points, ZoneBlockType::SpawnPoints)?,
            textures: required(self.textures, ZoneBlockType::Textures)?,
            tiles: required(self.tiles, ZoneBlockType::Tiles)?,
            economy: required(self.economy, ZoneBlockType::Economy)?,
        })
    }
}

fn fill<T>(slot: &mut Option<T>, block: ZoneBlockType, value: T) -> ParseResult<()> {
    if slot.replace(value).is_some() {
        return Err(ParseError::invalid(format!("duplicate {block} block")));
    }
    Ok(())
}

fn required<T>(slot: Option<T>, block: ZoneBlockType) -> ParseResult<T> {
    slot.ok_or_else(|| ParseError::MissingField(format!("{block} block")))
}

impl Parser for ZonParser {
    type Output = Zone;

    fn name(&self) -> &str {
        "ZON Zone Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["zon"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<Zone> {
        let mut cursor = ByteCursor::new(data);
        let table = Self::read_block_table(&mut cursor)?;

        let mut blocks = ZoneBlocks::default();
        for (block, offset) in table {
            cursor.seek(offset)?;
            blocks
                .read_block(&mut cursor, block)
                .map_err(|e| e.with_context(format!("{block} block at offset {offset}")))?;
        }

        blocks.finish()
    }
}
