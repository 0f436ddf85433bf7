// roseread-parsers/src/tsi.rs
//! Sprite information (`.tsi`) decoder
//!
//! Layout:
//! ```text
//! [u16 sheet_count] sheet_count × [string_u16 path][u32 color_key]
//! [u16 total_sprite_count]
//! sheet_count × [u16 sprite_count]
//!     sprite_count × [u16 sheet][2×u32 start][2×u32 end][u32 color][32-byte name]
//! ```
//!
//! Sprites are grouped by sheet in sheet order. Each sprite repeats the
//! index of the sheet it belongs to.

use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Width of a sprite name in bytes
pub const SPRITE_NAME_LEN: usize = 32;

/// Rectangle of a sprite sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub name: String,
    /// Sheet index the file stores for this sprite
    pub sheet: u16,
    pub start: [u32; 2],
    pub end: [u32; 2],
    pub color: u32,
}

impl Sprite {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        let sheet = cursor.read_u16()?;
        let start = cursor.read_vec2_u32()?;
        let end = cursor.read_vec2_u32()?;
        let color = cursor.read_u32()?;
        let name = cursor.read_fixed_string(SPRITE_NAME_LEN)?;
        Ok(Self {
            name,
            sheet,
            start,
            end,
            color,
        })
    }

    /// Width and height in pixels; zero when `end` is before `start`
    pub fn size(&self) -> [u32; 2] {
        [
            self.end[0].saturating_sub(self.start[0]),
            self.end[1].saturating_sub(self.start[1]),
        ]
    }
}

/// Texture holding a set of sprites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub path: String,
    /// Color treated as transparent
    pub color_key: u32,
    pub sprites: Vec<Sprite>,
}

/// Decoded sprite information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteInfo {
    pub sheets: Vec<SpriteSheet>,
    /// Total the file declares, kept as stored
    pub declared_sprite_count: u16,
}

impl SpriteInfo {
    pub fn sprite_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.sprites.len()).sum()
    }

    /// Find a sprite and the sheet holding it by name
    pub fn find_sprite(&self, name: &str) -> Option<(&SpriteSheet, &Sprite)> {
        self.sheets
            .iter()
            .find_map(|sheet| sheet.sprites.iter().find(|sprite| sprite.name == name).map(|sprite| (sheet, sprite)))
    }

    /// Check the declared total and every sprite's sheet index
    pub fn validate(&self) -> ParseResult<()> {
        if usize::from(self.declared_sprite_count) != self.sprite_count() {
            return Err(ParseError::invalid(format!(
                "declared {} sprites but the sheets hold {}",
                self.declared_sprite_count,
                self.sprite_count()
            )));
        }

        for (index, sheet) in self.sheets.iter().enumerate() {
            if let Some(sprite) = sheet.sprites.iter().find(|sprite| usize::from(sprite.sheet) != index) {
                return Err(ParseError::invalid(format!(
                    "sprite {} is listed under sheet {index} but names sheet {}",
                    sprite.name, sprite.sheet
                )));
            }
        }

        Ok(())
    }
}

impl HumanReadable for SpriteInfo {
    fn to_readable_string(&self) -> String {
        let mut out = format!(
            "Sprite information\n  sheets: {}\n  sprites: {}\n",
            self.sheets.len(),
            self.sprite_count()
        );
        for sheet in &self.sheets {
            out.push_str(&format!("    {} ({} sprites)\n", sheet.path, sheet.sprites.len()));
        }
        out
    }
}

/// Sprite information decoder
pub struct TsiParser;

impl TsiParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TsiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for TsiParser {
    type Output = SpriteInfo;

    fn name(&self) -> &str {
        "TSI Sprite Info Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["tsi"]
    }

    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<SpriteInfo> {
        let mut cursor = ByteCursor::new(data);

        let sheet_count = cursor.read_count_u16()?;
        let mut sheets = cursor
            .read_array(sheet_count, |c| {
                Ok(SpriteSheet {
                    path: c.read_string_u16()?,
                    color_key: c.read_u32()?,
                    sprites: Vec::new(),
                })
            })
            .map_err(|e| e.with_context("sheets"))?;

        let declared_sprite_count = cursor.read_u16()?;
        for (index, sheet) in sheets.iter_mut().enumerate() {
            let sprite_count = cursor.read_count_u16()?;
            sheet.sprites = cursor
                .read_array(sprite_count, Sprite::read)
                .map_err(|e| e.with_context(format!("sprites of sheet {index}")))?;
        }

        let info = SpriteInfo {
            sheets,
            declared_sprite_count,
        };
        if options.strict_validation {
            info.validate()?;
        }

        Ok(info)
    }
}
