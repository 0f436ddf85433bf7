//! roseread-parsers
//!
//! Decoders for the binary asset formats of the ROSE Online client.
//!
//! # Supported Formats
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | ZMD    | `.zmd`    | Skeleton (bone hierarchy and dummy bones) |
//! | ZMS    | `.zms`    | Mesh with a bitmask-selected vertex layout |
//! | HIM    | `.him`    | Terrain heightmap with patch bounds |
//! | TIL    | `.til`    | Terrain tile map |
//! | ZON    | `.zon`    | Zone definition (block table) |
//! | STL    | `.stl`    | Localized string table |
//! | STB    | `.stb`    | Data table of string cells |
//! | ZMO    | `.zmo`    | Motion (per-bone animation channels) |
//! | ZSC    | `.zsc`    | Model list (meshes, materials, part trees) |
//! | IFO    | `.ifo`    | Map data (placed objects of one block) |
//! | LIT    | `.lit`    | Lightmap atlas index |
//! | TSI    | `.tsi`    | Sprite sheet rectangles |
//! | IDX    | `.idx`    | Virtual file system index |
//!
//! Every decoder works on a complete in-memory byte slice and returns an
//! owned record or a [`ParseError`]. Strings are strict EUC-KR.
//!
//! # Example
//!
//! ```rust,ignore
//! use roseread_parsers::{zmd, Parser, ZmdParser};
//!
//! let skeleton = ZmdParser::new().parse_file("MALE.ZMD".as_ref())?;
//! let poses = zmd::reconstruct(&skeleton, &zmd::RigOptions::default())?;
//!
//! println!("{} bones", poses.len());
//! ```

pub mod traits;
pub mod logging;
pub mod io;
pub mod grid;
pub mod registry;
pub mod zmd;
pub mod zms;
pub mod him;
pub mod til;
pub mod zon;
pub mod stl;
pub mod stb;
pub mod zmo;
pub mod zsc;
pub mod ifo;
pub mod lit;
pub mod tsi;
pub mod idx;

// Re-export main types
pub use traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

pub use registry::{list as list_parsers, parse_path, Asset, AssetKind, ParserInfo, RegistryError};

pub use grid::{Grid, GridWindow};
pub use io::ByteCursor;
pub use zmd::{Bone, BonePose, RigOptions, Skeleton, ZmdParser};
pub use zms::{Mesh, MeshVersion, Vertex, VertexAttribute, VertexFormat, ZmsParser};
pub use him::{Heightmap, HimParser, PatchBounds};
pub use til::{Tile, TilParser, TileMap};
pub use zon::{Economy, SpawnPoint, Zone, ZoneTile, ZoneType, ZonParser};
pub use stl::{Language, StlParser, StringRow, StringTable, StringTableKind};
pub use stb::{DataRow, DataTable, StbParser};
pub use zmo::{ChannelFrames, ChannelType, Motion, MotionChannel, ZmoParser};
pub use zsc::{Model, ModelList, ModelMaterial, ModelPart, ZscParser};
pub use ifo::{IfoParser, MapBlockType, MapData, MapObject};
pub use lit::{Lightmap, LightmapObject, LightmapPart, LitParser};
pub use tsi::{Sprite, SpriteInfo, SpriteSheet, TsiParser};
pub use idx::{IdxParser, VfsArchive, VfsFile, VfsIndex};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
