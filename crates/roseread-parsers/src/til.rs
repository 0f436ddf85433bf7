//! Tile map (`.til`) decoder
//!
//! Layout: `[i32 width][i32 length]` then `length × width` tiles of
//! `[u8 brush_id][u8 tile_index][u8 tile_set][i32 tile_id]`, row-major.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridWindow};
use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseOptions, ParseResult, Parser};

/// Tiles per patch side
pub const PATCH_SIZE: usize = 16;

/// One terrain tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub brush_id: u8,
    pub tile_index: u8,
    pub tile_set: u8,
    /// Index into the zone's tile list
    pub tile_id: i32,
}

impl Tile {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            brush_id: cursor.read_u8()?,
            tile_index: cursor.read_u8()?,
            tile_set: cursor.read_u8()?,
            tile_id: cursor.read_i32()?,
        })
    }
}

/// Decoded tile map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub tiles: Grid<Tile>,
}

impl TileMap {
    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn length(&self) -> usize {
        self.tiles.length()
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        self.tiles.get(x, y)
    }

    /// The 16 × 16 block of tiles at patch coordinates `(x, y)`
    pub fn patch(&self, x: usize, y: usize) -> Option<GridWindow<'_, Tile>> {
        self.tiles.block(x, y, PATCH_SIZE)
    }

    /// Distinct brushes used by any tile
    pub fn brush_ids(&self) -> BTreeSet<u8> {
        self.tiles.iter().map(|tile| tile.brush_id).collect()
    }
}

impl HumanReadable for TileMap {
    fn to_readable_string(&self) -> String {
        format!(
            "Tile map {}x{}\n  tiles: {}\n  distinct brushes: {}\n",
            self.width(),
            self.length(),
            self.tiles.len(),
            self.brush_ids().len()
        )
    }
}

/// Tile map decoder
pub struct TilParser;

impl TilParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TilParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for TilParser {
    type Output = TileMap;

    fn name(&self) -> &str {
        "TIL Tile Map Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["til"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<TileMap> {
        let mut cursor = ByteCursor::new(data);

        let width = cursor.read_count_i32("width")?;
        let length = cursor.read_count_i32("length")?;
        let tiles = Grid::read_rows(&mut cursor, width, length, Tile::read)
            .map_err(|e| e.with_context("tiles"))?;

        Ok(TileMap { tiles })
    }
}
