// roseread-parsers/src/him.rs
//! Heightmap (`.him`) decoder
//!
//! Layout:
//! ```text
//! [i32 width][i32 length][i32 grid_count][f32 patch_scale]
//! [length × width f32 heights, row-major]
//! [string_u8 patch_name]
//! [i32 patch_count = 256][16 × 16 × (f32 max, f32 min)]
//! [i32 quad_count = 85][quad_count × (f32 max, f32 min)]
//! ```
//!
//! Patches are 16 × 16 blocks of the height grid with their height bounds
//! stored alongside. Quad patches are a quadtree over the patches: one root,
//! then 2×2, 4×4 and 8×8 cells.
//!
//! Strict decoding cross-checks both stored partitions: every patch against
//! its height samples, and the quad list against the bounds merged from the
//! stored patches. The quad list is compared as a multiset since its file
//! order is not known.

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridWindow};
use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Patches per side
pub const PATCHES_PER_SIDE: usize = 16;

/// Number of stored patches
pub const PATCH_COUNT: usize = PATCHES_PER_SIDE * PATCHES_PER_SIDE;

/// Quadtree cells per side at each level, coarsest first
const QUAD_LEVELS: [usize; 4] = [1, 2, 4, 8];

/// Number of quad patches, `1 + 4 + 16 + 64`
pub const QUAD_PATCH_COUNT: usize = 85;

/// Allowed difference between stored and computed patch bounds
const BOUNDS_TOLERANCE: f32 = 1e-3;

/// Height range of a patch or quad patch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchBounds {
    pub max: f32,
    pub min: f32,
}

impl PatchBounds {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            max: cursor.read_f32()?,
            min: cursor.read_f32()?,
        })
    }

    /// Bounds of a set of heights; `None` when empty
    pub fn of<'a>(heights: impl IntoIterator<Item = &'a f32>) -> Option<Self> {
        heights.into_iter().fold(None, |bounds, &h| {
            Some(match bounds {
                None => Self { max: h, min: h },
                Some(Self { max, min }) => Self {
                    max: max.max(h),
                    min: min.min(h),
                },
            })
        })
    }

    fn merge(self, other: Self) -> Self {
        Self {
            max: self.max.max(other.max),
            min: self.min.min(other.min),
        }
    }

    fn approx_eq(&self, other: &Self) -> bool {
        (self.max - other.max).abs() <= BOUNDS_TOLERANCE && (self.min - other.min).abs() <= BOUNDS_TOLERANCE
    }
}

/// Decoded heightmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heightmap {
    pub grid_count: i32,
    pub patch_scale: f32,
    pub heights: Grid<f32>,
    pub patch_name: String,
    /// Stored bounds of each 16 × 16 patch
    pub patches: Grid<PatchBounds>,
    /// Stored quad patch bounds, in file order
    pub quad_patches: Vec<PatchBounds>,
}

impl Heightmap {
    pub fn width(&self) -> usize {
        self.heights.width()
    }

    pub fn length(&self) -> usize {
        self.heights.length()
    }

    pub fn min_height(&self) -> Option<f32> {
        PatchBounds::of(&self.heights).map(|b| b.min)
    }

    pub fn max_height(&self) -> Option<f32> {
        PatchBounds::of(&self.heights).map(|b| b.max)
    }

    /// Height samples per patch edge, when the grid is `16 · g + 1` samples
    /// on each side
    ///
    /// Neighbouring patches share their edge samples.
    pub fn patch_size(&self) -> Option<usize> {
        let cells = self.width().checked_sub(1)?;
        let size = cells / PATCHES_PER_SIDE;
        let regular = size > 0
            && cells % PATCHES_PER_SIDE == 0
            && self.length() == self.width();
        regular.then_some(size)
    }

    /// Height samples covered by patch `(x, y)`
    pub fn patch_heights(&self, x: usize, y: usize) -> Option<GridWindow<'_, f32>> {
        let size = self.patch_size()?;
        if x >= PATCHES_PER_SIDE || y >= PATCHES_PER_SIDE {
            return None;
        }
        self.heights.window(x * size, y * size, size + 1, size + 1)
    }

    /// Bounds of patch `(x, y)` computed from the height grid
    pub fn computed_patch_bounds(&self, x: usize, y: usize) -> Option<PatchBounds> {
        PatchBounds::of(self.patch_heights(x, y)?.iter())
    }

    /// Quad patch bounds derived from the stored patches, coarsest level
    /// first and row-major within a level
    pub fn derived_quad_patches(&self) -> Vec<PatchBounds> {
        let mut quads = Vec::with_capacity(QUAD_PATCH_COUNT);

        for cells in QUAD_LEVELS {
            let span = PATCHES_PER_SIDE / cells;
            for qy in 0..cells {
                for qx in 0..cells {
                    let merged = self
                        .patches
                        .window(qx * span, qy * span, span, span)
                        .and_then(|window| window.iter().copied().reduce(PatchBounds::merge));
                    quads.extend(merged);
                }
            }
        }

        quads
    }

    /// Check that the stored quad patches are exactly the merged patch bounds,
    /// in any order
    fn validate_quad_patches(&self) -> ParseResult<()> {
        let mut unmatched = self.derived_quad_patches();

        for (index, stored) in self.quad_patches.iter().enumerate() {
            let Some(found) = unmatched.iter().position(|derived| stored.approx_eq(derived)) else {
                return Err(ParseError::invalid(format!(
                    "quad patch {index} stores bounds {}..{} which no patch group spans",
                    stored.min, stored.max
                )));
            };
            unmatched.swap_remove(found);
        }

        Ok(())
    }

    /// Compare every stored patch with the bounds of its height samples
    fn validate_patches(&self) -> ParseResult<()> {
        if self.patch_size().is_none() {
            return Ok(());
        }

        for y in 0..PATCHES_PER_SIDE {
            for x in 0..PATCHES_PER_SIDE {
                let (Some(stored), Some(computed)) = (self.patches.get(x, y), self.computed_patch_bounds(x, y))
                else {
                    continue;
                };
                if !stored.approx_eq(&computed) {
                    return Err(ParseError::invalid(format!(
                        "patch ({x}, {y}) stores bounds {}..{} but its heights span {}..{}",
                        stored.min, stored.max, computed.min, computed.max
                    )));
                }
            }
        }

        Ok(())
    }
}

impl HumanReadable for Heightmap {
    fn to_readable_string(&self) -> String {
        format!(
            "Heightmap {}x{}\n  grid count: {}\n  patch scale: {}\n  heights: {:?} .. {:?}\n  patch name: {:?}\n  patches: {}\n  quad patches: {}\n",
            self.width(),
            self.length(),
            self.grid_count,
            self.patch_scale,
            self.min_height(),
            self.max_height(),
            self.patch_name,
            self.patches.len(),
            self.quad_patches.len(),
        )
    }
}

/// Heightmap decoder
pub struct HimParser;

impl HimParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HimParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for HimParser {
    type Output = Heightmap;

    fn name(&self) -> &str {
        "HIM Heightmap Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["him"]
    }

    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<Heightmap> {
        let mut cursor = ByteCursor::new(data);

        let width = cursor.read_count_i32("width")?;
        let length = cursor.read_count_i32("length")?;
        let grid_count = cursor.read_i32()?;
        let patch_scale = cursor.read_f32()?;

        let heights = Grid::read_rows(&mut cursor, width, length, |c| c.read_f32())
            .map_err(|e| e.with_context("height grid"))?;

        let patch_name = cursor.read_string_u8()?;

        let patch_count = cursor.read_count_i32("patch")?;
        if patch_count != PATCH_COUNT {
            return Err(ParseError::invalid(format!(
                "expected {PATCH_COUNT} patches, found {patch_count}"
            )));
        }
        let patches = Grid::read_rows(&mut cursor, PATCHES_PER_SIDE, PATCHES_PER_SIDE, PatchBounds::read)
            .map_err(|e| e.with_context("patches"))?;

        let quad_count = cursor.read_count_i32("quad patch")?;
        if quad_count != QUAD_PATCH_COUNT {
            return Err(ParseError::invalid(format!(
                "expected {QUAD_PATCH_COUNT} quad patches, found {quad_count}"
            )));
        }
        let quad_patches = cursor
            .read_array(quad_count, PatchBounds::read)
            .map_err(|e| e.with_context("quad patches"))?;

        let heightmap = Heightmap {
            grid_count,
            patch_scale,
            heights,
            patch_name,
            patches,
            quad_patches,
        };

        if options.strict_validation {
            heightmap.validate_patches()?;
            heightmap.validate_quad_patches()?;
        }

        Ok(heightmap)
    }
}
