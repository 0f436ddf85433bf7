//! Format registry: maps file extensions to decoders.
//!
//! The set of formats is closed, so the registry is a plain enum rather
//! than a runtime table. [`parse_path`] picks the decoder for a path and
//! returns the decoded record wrapped in [`Asset`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::him::{Heightmap, HimParser};
use crate::idx::{IdxParser, VfsIndex};
use crate::ifo::{IfoParser, MapData};
use crate::lit::{Lightmap, LitParser};
use crate::stb::{DataTable, StbParser};
use crate::stl::{StlParser, StringTable};
use crate::til::{TilParser, TileMap};
use crate::traits::{HumanReadable, ParseError, ParseOptions, Parser};
use crate::tsi::{SpriteInfo, TsiParser};
use crate::zmd::{Skeleton, ZmdParser};
use crate::zmo::{Motion, ZmoParser};
use crate::zms::{Mesh, ZmsParser};
use crate::zon::{ZonParser, Zone};
use crate::zsc::{ModelList, ZscParser};

static ZMD: ZmdParser = ZmdParser;
static ZMS: ZmsParser = ZmsParser;
static HIM: HimParser = HimParser;
static TIL: TilParser = TilParser;
static ZON: ZonParser = ZonParser;
static STL: StlParser = StlParser;
static STB: StbParser = StbParser;
static ZMO: ZmoParser = ZmoParser;
static ZSC: ZscParser = ZscParser;
static IFO: IfoParser = IfoParser;
static LIT: LitParser = LitParser;
static TSI: TsiParser = TsiParser;
static IDX: IdxParser = IdxParser;

/// Every asset format with a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssetKind {
    Skeleton,
    Mesh,
    Heightmap,
    TileMap,
    Zone,
    StringTable,
    DataTable,
    Motion,
    ModelList,
    MapData,
    Lightmap,
    SpriteInfo,
    VfsIndex,
}

impl AssetKind {
    pub const ALL: [AssetKind; 13] = [
        AssetKind::Skeleton,
        AssetKind::Mesh,
        AssetKind::Heightmap,
        AssetKind::TileMap,
        AssetKind::Zone,
        AssetKind::StringTable,
        AssetKind::DataTable,
        AssetKind::Motion,
        AssetKind::ModelList,
        AssetKind::MapData,
        AssetKind::Lightmap,
        AssetKind::SpriteInfo,
        AssetKind::VfsIndex,
    ];

    /// Lowercase file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Skeleton => "zmd",
            AssetKind::Mesh => "zms",
            AssetKind::Heightmap => "him",
            AssetKind::TileMap => "til",
            AssetKind::Zone => "zon",
            AssetKind::StringTable => "stl",
            AssetKind::DataTable => "stb",
            AssetKind::Motion => "zmo",
            AssetKind::ModelList => "zsc",
            AssetKind::MapData => "ifo",
            AssetKind::Lightmap => "lit",
            AssetKind::SpriteInfo => "tsi",
            AssetKind::VfsIndex => "idx",
        }
    }

    /// Name of the decoder for this kind
    pub fn parser_name(self) -> &'static str {
        match self {
            AssetKind::Skeleton => ZMD.name(),
            AssetKind::Mesh => ZMS.name(),
            AssetKind::Heightmap => HIM.name(),
            AssetKind::TileMap => TIL.name(),
            AssetKind::Zone => ZON.name(),
            AssetKind::StringTable => STL.name(),
            AssetKind::DataTable => STB.name(),
            AssetKind::Motion => ZMO.name(),
            AssetKind::ModelList => ZSC.name(),
            AssetKind::MapData => IFO.name(),
            AssetKind::Lightmap => LIT.name(),
            AssetKind::SpriteInfo => TSI.name(),
            AssetKind::VfsIndex => IDX.name(),
        }
    }

    /// Case-insensitive lookup; a leading dot is ignored
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(extension))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(&path.extension()?.to_string_lossy())
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Skeleton => "skeleton",
            AssetKind::Mesh => "mesh",
            AssetKind::Heightmap => "heightmap",
            AssetKind::TileMap => "tile map",
            AssetKind::Zone => "zone",
            AssetKind::StringTable => "string table",
            AssetKind::DataTable => "data table",
            AssetKind::Motion => "motion",
            AssetKind::ModelList => "model list",
            AssetKind::MapData => "map data",
            AssetKind::Lightmap => "lightmap",
            AssetKind::SpriteInfo => "sprite info",
            AssetKind::VfsIndex => "vfs index",
        };
        f.write_str(name)
    }
}

/// A decoded file of any supported format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Asset {
    Skeleton(Skeleton),
    Mesh(Mesh),
    Heightmap(Heightmap),
    TileMap(TileMap),
    Zone(Zone),
    StringTable(StringTable),
    DataTable(DataTable),
    Motion(Motion),
    ModelList(ModelList),
    MapData(MapData),
    Lightmap(Lightmap),
    SpriteInfo(SpriteInfo),
    VfsIndex(VfsIndex),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Skeleton(_) => AssetKind::Skeleton,
            Asset::Mesh(_) => AssetKind::Mesh,
            Asset::Heightmap(_) => AssetKind::Heightmap,
            Asset::TileMap(_) => AssetKind::TileMap,
            Asset::Zone(_) => AssetKind::Zone,
            Asset::StringTable(_) => AssetKind::StringTable,
            Asset::DataTable(_) => AssetKind::DataTable,
            Asset::Motion(_) => AssetKind::Motion,
            Asset::ModelList(_) => AssetKind::ModelList,
            Asset::MapData(_) => AssetKind::MapData,
            Asset::Lightmap(_) => AssetKind::Lightmap,
            Asset::SpriteInfo(_) => AssetKind::SpriteInfo,
            Asset::VfsIndex(_) => AssetKind::VfsIndex,
        }
    }
}

impl HumanReadable for Asset {
    fn to_readable_string(&self) -> String {
        match self {
            Asset::Skeleton(skeleton) => skeleton.to_readable_string(),
            Asset::Mesh(mesh) => mesh.to_readable_string(),
            Asset::Heightmap(heightmap) => heightmap.to_readable_string(),
            Asset::TileMap(tile_map) => tile_map.to_readable_string(),
            Asset::Zone(zone) => zone.to_readable_string(),
            Asset::StringTable(table) => table.to_readable_string(),
            Asset::DataTable(table) => table.to_readable_string(),
            Asset::Motion(motion) => motion.to_readable_string(),
            Asset::ModelList(models) => models.to_readable_string(),
            Asset::MapData(map) => map.to_readable_string(),
            Asset::Lightmap(lightmap) => lightmap.to_readable_string(),
            Asset::SpriteInfo(sprites) => sprites.to_readable_string(),
            Asset::VfsIndex(index) => index.to_readable_string(),
        }
    }

    /// JSON of the wrapped record, without the variant tag
    fn to_json(&self) -> serde_json::Value {
        match self {
            Asset::Skeleton(skeleton) => skeleton.to_json(),
            Asset::Mesh(mesh) => mesh.to_json(),
            Asset::Heightmap(heightmap) => heightmap.to_json(),
            Asset::TileMap(tile_map) => tile_map.to_json(),
            Asset::Zone(zone) => zone.to_json(),
            Asset::StringTable(table) => table.to_json(),
            Asset::DataTable(table) => table.to_json(),
            Asset::Motion(motion) => motion.to_json(),
            Asset::ModelList(models) => models.to_json(),
            Asset::MapData(map) => map.to_json(),
            Asset::Lightmap(lightmap) => lightmap.to_json(),
            Asset::SpriteInfo(sprites) => sprites.to_json(),
            Asset::VfsIndex(index) => index.to_json(),
        }
    }
}

/// Decoder information for display
#[derive(Debug, Clone, Serialize)]
pub struct ParserInfo {
    pub kind: AssetKind,
    pub name: &'static str,
    pub extension: &'static str,
}

/// Every registered decoder
pub fn list() -> Vec<ParserInfo> {
    AssetKind::ALL
        .into_iter()
        .map(|kind| ParserInfo {
            kind,
            name: kind.parser_name(),
            extension: kind.extension(),
        })
        .collect()
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("No parser available for path: {0}")]
    NoParserForPath(PathBuf),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Decode `path` with the decoder matching its extension
pub fn parse_path(path: &Path, options: &ParseOptions) -> Result<Asset, RegistryError> {
    let kind = AssetKind::from_path(path).ok_or_else(|| RegistryError::NoParserForPath(path.to_path_buf()))?;
    tracing::debug!(path = %path.display(), %kind, "Selected parser");

    let asset = match kind {
        AssetKind::Skeleton => Asset::Skeleton(ZMD.parse_file_with_options(path, options)?),
        AssetKind::Mesh => Asset::Mesh(ZMS.parse_file_with_options(path, options)?),
        AssetKind::Heightmap => Asset::Heightmap(HIM.parse_file_with_options(path, options)?),
        AssetKind::TileMap => Asset::TileMap(TIL.parse_file_with_options(path, options)?),
        AssetKind::Zone => Asset::Zone(ZON.parse_file_with_options(path, options)?),
        AssetKind::StringTable => Asset::StringTable(STL.parse_file_with_options(path, options)?),
        AssetKind::DataTable => Asset::DataTable(STB.parse_file_with_options(path, options)?),
        AssetKind::Motion => Asset::Motion(ZMO.parse_file_with_options(path, options)?),
        AssetKind::ModelList => Asset::ModelList(ZSC.parse_file_with_options(path, options)?),
        AssetKind::MapData => Asset::MapData(IFO.parse_file_with_options(path, options)?),
        AssetKind::Lightmap => Asset::Lightmap(LIT.parse_file_with_options(path, options)?),
        AssetKind::SpriteInfo => Asset::SpriteInfo(TSI.parse_file_with_options(path, options)?),
        AssetKind::VfsIndex => Asset::VfsIndex(IDX.parse_file_with_options(path, options)?),
    };

    Ok(asset)
}
