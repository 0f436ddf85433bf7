// roseread-parsers/src/lit.rs
//! Lightmap index (`.lit`) decoder
//!
//! Lighting is baked into atlas textures. A lightmap index says, for every
//! part of every placed object, which atlas holds its lightmap and which
//! cell of that atlas it occupies.
//!
//! Layout:
//! ```text
//! [i32 object_count]
//! object_count × [i32 part_count][i32 object_id]
//!     part_count × [string_u8 name][i32 part_id][string_u8 file]
//!                  [i32 atlas][i32 pixels_per_part][i32 parts_per_width][i32 cell]
//! [i32 file_count] file_count × string_u8
//! ```

use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Lightmap placement of one object part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightmapPart {
    pub name: String,
    pub id: i32,
    pub file: String,
    /// Index into [`Lightmap::files`]
    pub atlas: i32,
    pub pixels_per_part: i32,
    /// Cells per atlas row
    pub parts_per_width: i32,
    /// Row-major cell within the atlas
    pub cell: i32,
}

impl LightmapPart {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            name: cursor.read_string_u8()?,
            id: cursor.read_i32()?,
            file: cursor.read_string_u8()?,
            atlas: cursor.read_i32()?,
            pixels_per_part: cursor.read_i32()?,
            parts_per_width: cursor.read_i32()?,
            cell: cursor.read_i32()?,
        })
    }

    /// Column and row of the part's cell; `None` for an unplaced part
    pub fn cell_position(&self) -> Option<(u32, u32)> {
        let per_row = u32::try_from(self.parts_per_width).ok().filter(|&n| n > 0)?;
        let cell = u32::try_from(self.cell).ok()?;
        Some((cell % per_row, cell / per_row))
    }

    /// UV offset and scale of the part's cell within its atlas
    pub fn uv_rect(&self) -> Option<([f32; 2], f32)> {
        let (column, row) = self.cell_position()?;
        let scale = 1.0 / self.parts_per_width as f32;
        Some(([column as f32 * scale, row as f32 * scale], scale))
    }
}

/// Lightmapped object and its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightmapObject {
    pub id: i32,
    pub parts: Vec<LightmapPart>,
}

/// Decoded lightmap index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lightmap {
    pub objects: Vec<LightmapObject>,
    /// Atlas texture file names
    pub files: Vec<String>,
}

impl Lightmap {
    pub fn part_count(&self) -> usize {
        self.objects.iter().map(|object| object.parts.len()).sum()
    }

    /// Atlas file of a part
    pub fn atlas_file(&self, part: &LightmapPart) -> Option<&str> {
        let index = usize::try_from(part.atlas).ok()?;
        self.files.get(index).map(String::as_str)
    }

    pub fn find_object(&self, id: i32) -> Option<&LightmapObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// Check that every part names an existing atlas and a cell inside it
    pub fn validate(&self) -> ParseResult<()> {
        for object in &self.objects {
            for part in &object.parts {
                if self.atlas_file(part).is_none() {
                    return Err(ParseError::invalid(format!(
                        "object {} part {} uses atlas {} of {}",
                        object.id,
                        part.name,
                        part.atlas,
                        self.files.len()
                    )));
                }
                let inside = part
                    .cell_position()
                    .is_some_and(|(_, row)| i64::from(row) < i64::from(part.parts_per_width));
                if !inside {
                    return Err(ParseError::invalid(format!(
                        "object {} part {} has cell {} outside a {}-wide atlas",
                        object.id, part.name, part.cell, part.parts_per_width
                    )));
                }
            }
        }
        Ok(())
    }
}

impl HumanReadable for Lightmap {
    fn to_readable_string(&self) -> String {
        let mut out = format!(
            "Lightmap index\n  objects: {}\n  parts: {}\n  atlases: {}\n",
            self.objects.len(),
            self.part_count(),
            self.files.len()
        );
        for file in &self.files {
            out.push_str(&format!("    {file}\n"));
        }
        out
    }
}

/// Lightmap index decoder
pub struct LitParser;

impl LitParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LitParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for LitParser {
    type Output = Lightmap;

    fn name(&self) -> &str {
        "LIT Lightmap Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["lit"]
    }

    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<Lightmap> {
        let mut cursor = ByteCursor::new(data);

        let object_count = cursor.read_count_i32("object")?;
        let objects = cursor
            .read_array(object_count, |c| {
                let part_count = c.read_count_i32("part")?;
                let id = c.read_i32()?;
                let parts = c.read_array(part_count, LightmapPart::read)?;
                Ok(LightmapObject { id, parts })
            })
            .map_err(|e| e.with_context("objects"))?;

        let file_count = cursor.read_count_i32("file")?;
        let files = cursor
            .read_array(file_count, |c| c.read_string_u8())
            .map_err(|e| e.with_context("atlas files"))?;

        let lightmap = Lightmap { objects, files };
        if options.strict_validation {
            lightmap.validate()?;
        }

        Ok(lightmap)
    }
}
