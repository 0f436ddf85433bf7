// roseread-parsers/src/zsc.rs
//! Model list (`.zsc`) decoder
//!
//! A model list names the meshes, materials and effects used by a group of
//! models, then describes each model as parts binding one mesh to one
//! material.
//!
//! Layout:
//! ```text
//! [u16 n] n × cstring mesh path
//! [u16 n] n × material
//! [u16 n] n × cstring effect path
//! [u16 n] n × model:
//!     [u32 radius][2×i32 center]
//!     [u16 part_count]            (a model with no parts ends here)
//!     part_count × [u16 mesh][u16 material] properties
//!     [u16 effect_count]
//!     effect_count × [u16 effect][u16 effect_type] properties
//!     [3×f32 bounds min][3×f32 bounds max]
//! ```
//!
//! Properties are a list of `[u8 id][u8 size][value]` entries closed by a
//! zero id.

use roseread_core::{BoundingBox, Color3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Property ids
mod property {
    pub const END: u8 = 0;
    pub const POSITION: u8 = 1;
    pub const ROTATION: u8 = 2;
    pub const SCALE: u8 = 3;
    pub const AXIS_ROTATION: u8 = 4;
    pub const BONE_INDEX: u8 = 5;
    pub const DUMMY_INDEX: u8 = 6;
    pub const PARENT: u8 = 7;
    pub const COLLISION: u8 = 29;
    pub const ANIMATION_PATH: u8 = 30;
    pub const RANGE: u8 = 31;
    pub const USE_LIGHTMAP: u8 = 32;
}

/// Material blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    None = 0,
    Custom = 1,
    Normal = 2,
    Lighten = 3,
}

impl TryFrom<u16> for BlendMode {
    type Error = ParseError;

    fn try_from(value: u16) -> ParseResult<Self> {
        match value {
            0 => Ok(BlendMode::None),
            1 => Ok(BlendMode::Custom),
            2 => Ok(BlendMode::Normal),
            3 => Ok(BlendMode::Lighten),
            other => Err(ParseError::invalid(format!("invalid blend mode {other}"))),
        }
    }
}

/// Material glow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlowType {
    None = 0,
    NotSet = 1,
    Simple = 2,
    Light = 3,
    Texture = 4,
    TextureLight = 5,
    Alpha = 6,
}

impl TryFrom<u16> for GlowType {
    type Error = ParseError;

    fn try_from(value: u16) -> ParseResult<Self> {
        match value {
            0 => Ok(GlowType::None),
            1 => Ok(GlowType::NotSet),
            2 => Ok(GlowType::Simple),
            3 => Ok(GlowType::Light),
            4 => Ok(GlowType::Texture),
            5 => Ok(GlowType::TextureLight),
            6 => Ok(GlowType::Alpha),
            other => Err(ParseError::invalid(format!("invalid glow type {other}"))),
        }
    }
}

/// How an effect attached to a model is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    Normal = 0,
    DayNight = 1,
    LightContainer = 2,
}

impl From<u16> for EffectType {
    /// Unknown values are treated as [`EffectType::Normal`]
    fn from(value: u16) -> Self {
        match value {
            1 => EffectType::DayNight,
            2 => EffectType::LightContainer,
            _ => EffectType::Normal,
        }
    }
}

/// Render state of a texture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMaterial {
    pub path: String,
    pub is_skin: bool,
    pub alpha_enabled: bool,
    pub two_sided: bool,
    pub alpha_test_enabled: bool,
    pub alpha_ref: u16,
    pub z_write_enabled: bool,
    pub z_test_enabled: bool,
    pub blend_mode: BlendMode,
    pub specular_enabled: bool,
    pub alpha: f32,
    pub glow_type: GlowType,
    pub glow_color: Color3,
}

impl ModelMaterial {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            path: cursor.read_cstring()?,
            is_skin: cursor.read_bool16()?,
            alpha_enabled: cursor.read_bool16()?,
            two_sided: cursor.read_bool16()?,
            alpha_test_enabled: cursor.read_bool16()?,
            alpha_ref: cursor.read_u16()?,
            z_write_enabled: cursor.read_bool16()?,
            z_test_enabled: cursor.read_bool16()?,
            blend_mode: BlendMode::try_from(cursor.read_u16()?)?,
            specular_enabled: cursor.read_bool16()?,
            alpha: cursor.read_f32()?,
            glow_type: GlowType::try_from(cursor.read_u16()?)?,
            glow_color: cursor.read_color3()?,
        })
    }
}

/// One mesh and material pair of a model
///
/// Properties the file leaves out are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPart {
    pub mesh: u16,
    pub material: u16,
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
    pub axis_rotation: Option<Quat>,
    pub bone_index: Option<i16>,
    pub dummy_index: Option<i16>,
    /// Index of the parent part within the same model
    pub parent: Option<u16>,
    pub collision: Option<u16>,
    pub animation_path: Option<String>,
    pub range: Option<u16>,
    pub use_lightmap: Option<bool>,
}

/// Effect placed on a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEffect {
    pub effect: u16,
    pub effect_type: EffectType,
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
    pub parent: Option<u16>,
}

/// A model assembled from parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub radius: u32,
    pub center: [i32; 2],
    pub parts: Vec<ModelPart>,
    pub effects: Vec<ModelEffect>,
    /// `None` for a model with no parts, which stores no bounds
    pub bounds: Option<BoundingBox>,
}

/// Decoded model list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub meshes: Vec<String>,
    pub materials: Vec<ModelMaterial>,
    pub effects: Vec<String>,
    pub models: Vec<Model>,
}

impl ModelList {
    /// Mesh path used by a part
    pub fn mesh_path(&self, part: &ModelPart) -> Option<&str> {
        self.meshes.get(usize::from(part.mesh)).map(String::as_str)
    }

    pub fn material(&self, part: &ModelPart) -> Option<&ModelMaterial> {
        self.materials.get(usize::from(part.material))
    }

    /// Mesh paths of every part of model `index`, in part order
    pub fn model_meshes(&self, index: usize) -> Vec<&str> {
        self.models
            .get(index)
            .map(|model| model.parts.iter().filter_map(|part| self.mesh_path(part)).collect())
            .unwrap_or_default()
    }

    /// Check every mesh, material, effect and parent reference
    pub fn validate(&self) -> ParseResult<()> {
        for (model_index, model) in self.models.iter().enumerate() {
            for (part_index, part) in model.parts.iter().enumerate() {
                let at = || format!("model {model_index} part {part_index}");
                check_index("mesh", part.mesh, self.meshes.len(), at)?;
                check_index("material", part.material, self.materials.len(), at)?;
                if let Some(parent) = part.parent {
                    // Parent ids count from 1; 0 means no parent
                    check_index("parent part", parent, model.parts.len() + 1, at)?;
                }
            }
            for (effect_index, effect) in model.effects.iter().enumerate() {
                check_index("effect", effect.effect, self.effects.len(), || {
                    format!("model {model_index} effect {effect_index}")
                })?;
            }
        }
        Ok(())
    }
}

fn check_index(what: &str, index: u16, len: usize, at: impl Fn() -> String) -> ParseResult<()> {
    if usize::from(index) < len {
        return Ok(());
    }
    Err(ParseError::invalid(format!("{} uses {what} {index} of {len}", at())))
}

impl HumanReadable for ModelList {
    fn to_readable_string(&self) -> String {
        let parts: usize = self.models.iter().map(|model| model.parts.len()).sum();
        format!(
            "Model list\n  meshes: {}\n  materials: {}\n  effects: {}\n  models: {}\n  parts: {}\n",
            self.meshes.len(),
            self.materials.len(),
            self.effects.len(),
            self.models.len(),
            parts,
        )
    }
}

/// Model list decoder
pub struct ZscParser;

impl ZscParser {
    pub fn new() -> Self {
        Self
    }

    /// Run `read` for each property until the end marker
    ///
    /// `read` returns false for a property it does not decode; that property
    /// is skipped by its stored size when `skip_unknown` is set and is an
    /// error otherwise.
    fn read_properties(
        cursor: &mut ByteCursor<'_>,
        skip_unknown: bool,
        mut read: impl FnMut(&mut ByteCursor<'_>, u8, u8) -> ParseResult<bool>,
    ) -> ParseResult<()> {
        loop {
            let id = cursor.read_u8()?;
            if id == property::END {
                return Ok(());
            }
            let size = cursor.read_u8()?;

            if !read(cursor, id, size)? {
                if !skip_unknown {
                    return Err(ParseError::UnrecognizedFormat {
                        format: "ZSC property",
                        found: id.to_string(),
                    });
                }
                cursor.read_bytes(usize::from(size))?;
            }
        }
    }

    fn read_part(cursor: &mut ByteCursor<'_>, options: &ParseOptions) -> ParseResult<ModelPart> {
        let mut part = ModelPart {
            mesh: cursor.read_u16()?,
            material: cursor.read_u16()?,
            ..ModelPart::default()
        };

        Self::read_properties(cursor, !options.strict_validation, |c, id, size| {
            match id {
                property::POSITION => part.position = Some(c.read_vec3()?),
                property::ROTATION => part.rotation = Some(c.read_quat_wxyz()?),
                property::SCALE => part.scale = Some(c.read_vec3()?),
                property::AXIS_ROTATION => part.axis_rotation = Some(c.read_quat_wxyz()?),
                property::BONE_INDEX => part.bone_index = Some(c.read_i16()?),
                property::DUMMY_INDEX => part.dummy_index = Some(c.read_i16()?),
                property::PARENT => part.parent = Some(c.read_u16()?),
                property::COLLISION => part.collision = Some(c.read_u16()?),
                property::ANIMATION_PATH => part.animation_path = Some(c.read_fixed_string(usize::from(size))?),
                property::RANGE => part.range = Some(c.read_u16()?),
                property::USE_LIGHTMAP => part.use_lightmap = Some(c.read_bool16()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        Ok(part)
    }

    fn read_effect(cursor: &mut ByteCursor<'_>) -> ParseResult<ModelEffect> {
        let mut effect = ModelEffect {
            effect: cursor.read_u16()?,
            effect_type: EffectType::from(cursor.read_u16()?),
            position: None,
            rotation: None,
            scale: None,
            parent: None,
        };

        // Effects only use the placement properties; anything else is skipped
        Self::read_properties(cursor, true, |c, id, _| {
            match id {
                property::POSITION => effect.position = Some(c.read_vec3()?),
                property::ROTATION => effect.rotation = Some(c.read_quat_wxyz()?),
                property::SCALE => effect.scale = Some(c.read_vec3()?),
                property::PARENT => effect.parent = Some(c.read_u16()?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        Ok(effect)
    }

    fn read_model(cursor: &mut ByteCursor<'_>, options: &ParseOptions) -> ParseResult<Model> {
        let radius = cursor.read_u32()?;
        let center = cursor.read_vec2_i32()?;

        let part_count = cursor.read_count_u16()?;
        if part_count == 0 {
            return Ok(Model {
                radius,
                center,
                parts: Vec::new(),
                effects: Vec::new(),
                bounds: None,
            });
        }

        let parts = cursor.read_array(part_count, |c| Self::read_part(c, options))?;
        let effect_count = cursor.read_count_u16()?;
        let effects = cursor.read_array(effect_count, Self::read_effect)?;
        let bounds = BoundingBox::new(cursor.read_vec3()?, cursor.read_vec3()?);

        Ok(Model {
            radius,
            center,
            parts,
            effects,
            bounds: Some(bounds),
        })
    }
}

impl Default for ZscParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ZscParser {
    type Output = ModelList;

    fn name(&self) -> &str {
        "ZSC Model List Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["zsc"]
    }

    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<ModelList> {
        let mut cursor = ByteCursor::new(data);

        let mesh_count = cursor.read_count_u16()?;
        let meshes = cursor
            .read_array(mesh_count, |c| c.read_cstring())
            .map_err(|e| e.with_context("mesh paths"))?;

        let material_count = cursor.read_count_u16()?;
        let materials = cursor
            .read_array(material_count, ModelMaterial::read)
            .map_err(|e| e.with_context("materials"))?;

        let effect_count = cursor.read_count_u16()?;
        let effects = cursor
            .read_array(effect_count, |c| c.read_cstring())
            .map_err(|e| e.with_context("effect paths"))?;

        let model_count = cursor.read_count_u16()?;
        let mut models = Vec::with_capacity(ByteCursor::capacity_for::<Model>(model_count, cursor.remaining()));
        for index in 0..model_count {
            let model = Self::read_model(&mut cursor, options).map_err(|e| e.with_context(format!("model {index}")))?;
            models.push(model);
        }

        let list = ModelList {
            meshes,
            materials,
            effects,
            models,
        };

        if options.strict_validation {
            list.validate()?;
        }

        Ok(list)
    }
}
