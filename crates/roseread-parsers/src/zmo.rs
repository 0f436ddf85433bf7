// roseread-parsers/src/zmo.rs
//! Motion (`.zmo`) decoder
//!
//! Layout:
//! ```text
//! [8-byte identifier "ZMO0002"]
//! [u32 fps][u32 frame_count][u32 channel_count]
//! channel_count × [u32 channel_type][u32 target_index]
//! frame_count × channel_count × value
//! ```
//!
//! Frame values are interleaved: every frame stores one value per channel,
//! in channel order. The value width depends on the channel type.

use std::fmt;

use roseread_core::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};
use crate::zmd::Skeleton;

/// Identifier width in bytes, including the padding NUL
pub const IDENTIFIER_LEN: usize = 8;

/// The only supported revision
pub const IDENTIFIER: &str = "ZMO0002";

/// Animated property of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Channel with no per-frame data
    None = 1 << 0,
    Position = 1 << 1,
    Rotation = 1 << 2,
    Normal = 1 << 3,
    Alpha = 1 << 4,
    Uv1 = 1 << 5,
    Uv2 = 1 << 6,
    Uv3 = 1 << 7,
    Uv4 = 1 << 8,
    Texture = 1 << 9,
    Scale = 1 << 10,
}

impl ChannelType {
    /// Bytes stored per frame
    pub fn value_size(self) -> usize {
        match self {
            ChannelType::None => 0,
            ChannelType::Alpha | ChannelType::Texture | ChannelType::Scale => 4,
            ChannelType::Uv1 | ChannelType::Uv2 | ChannelType::Uv3 | ChannelType::Uv4 => 8,
            ChannelType::Position | ChannelType::Normal => 12,
            ChannelType::Rotation => 16,
        }
    }
}

impl TryFrom<u32> for ChannelType {
    type Error = ParseError;

    fn try_from(value: u32) -> ParseResult<Self> {
        Ok(match value {
            0x001 => ChannelType::None,
            0x002 => ChannelType::Position,
            0x004 => ChannelType::Rotation,
            0x008 => ChannelType::Normal,
            0x010 => ChannelType::Alpha,
            0x020 => ChannelType::Uv1,
            0x040 => ChannelType::Uv2,
            0x080 => ChannelType::Uv3,
            0x100 => ChannelType::Uv4,
            0x200 => ChannelType::Texture,
            0x400 => ChannelType::Scale,
            other => {
                return Err(ParseError::UnrecognizedFormat {
                    format: "ZMO channel type",
                    found: format!("{other:#x}"),
                })
            }
        })
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-frame values of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "frames")]
pub enum ChannelFrames {
    None,
    Position(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Normal(Vec<Vec3>),
    Alpha(Vec<f32>),
    Uv1(Vec<Vec2>),
    Uv2(Vec<Vec2>),
    Uv3(Vec<Vec2>),
    Uv4(Vec<Vec2>),
    Texture(Vec<f32>),
    Scale(Vec<f32>),
}

impl ChannelFrames {
    fn with_capacity(channel_type: ChannelType, capacity: usize) -> Self {
        match channel_type {
            ChannelType::None => ChannelFrames::None,
            ChannelType::Position => ChannelFrames::Position(Vec::with_capacity(capacity)),
            ChannelType::Rotation => ChannelFrames::Rotation(Vec::with_capacity(capacity)),
            ChannelType::Normal => ChannelFrames::Normal(Vec::with_capacity(capacity)),
            ChannelType::Alpha => ChannelFrames::Alpha(Vec::with_capacity(capacity)),
            ChannelType::Uv1 => ChannelFrames::Uv1(Vec::with_capacity(capacity)),
            ChannelType::Uv2 => ChannelFrames::Uv2(Vec::with_capacity(capacity)),
            ChannelType::Uv3 => ChannelFrames::Uv3(Vec::with_capacity(capacity)),
            ChannelType::Uv4 => ChannelFrames::Uv4(Vec::with_capacity(capacity)),
            ChannelType::Texture => ChannelFrames::Texture(Vec::with_capacity(capacity)),
            ChannelType::Scale => ChannelFrames::Scale(Vec::with_capacity(capacity)),
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelFrames::None => ChannelType::None,
            ChannelFrames::Position(_) => ChannelType::Position,
            ChannelFrames::Rotation(_) => ChannelType::Rotation,
            ChannelFrames::Normal(_) => ChannelType::Normal,
            ChannelFrames::Alpha(_) => ChannelType::Alpha,
            ChannelFrames::Uv1(_) => ChannelType::Uv1,
            ChannelFrames::Uv2(_) => ChannelType::Uv2,
            ChannelFrames::Uv3(_) => ChannelType::Uv3,
            ChannelFrames::Uv4(_) => ChannelType::Uv4,
            ChannelFrames::Texture(_) => ChannelType::Texture,
            ChannelFrames::Scale(_) => ChannelType::Scale,
        }
    }

    /// Number of stored frames; always 0 for [`ChannelFrames::None`]
    pub fn len(&self) -> usize {
        match self {
            ChannelFrames::None => 0,
            ChannelFrames::Position(v) | ChannelFrames::Normal(v) => v.len(),
            ChannelFrames::Rotation(v) => v.len(),
            ChannelFrames::Uv1(v) | ChannelFrames::Uv2(v) | ChannelFrames::Uv3(v) | ChannelFrames::Uv4(v) => v.len(),
            ChannelFrames::Alpha(v) | ChannelFrames::Texture(v) | ChannelFrames::Scale(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one frame's value and append it
    fn push_frame(&mut self, cursor: &mut ByteCursor<'_>) -> ParseResult<()> {
        match self {
            ChannelFrames::None => {}
            ChannelFrames::Position(v) | ChannelFrames::Normal(v) => v.push(cursor.read_vec3()?),
            ChannelFrames::Rotation(v) => v.push(cursor.read_quat_xyzw()?),
            ChannelFrames::Uv1(v) | ChannelFrames::Uv2(v) | ChannelFrames::Uv3(v) | ChannelFrames::Uv4(v) => {
                v.push(cursor.read_vec2()?)
            }
            ChannelFrames::Alpha(v) | ChannelFrames::Texture(v) | ChannelFrames::Scale(v) => {
                v.push(cursor.read_f32()?)
            }
        }
        Ok(())
    }
}

/// Animation track targeting one bone or mesh property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionChannel {
    /// Bone index for skeletal channels, otherwise the animated object
    pub target: u32,
    pub frames: ChannelFrames,
}

impl MotionChannel {
    pub fn channel_type(&self) -> ChannelType {
        self.frames.channel_type()
    }
}

/// Decoded motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub identifier: String,
    pub fps: u32,
    pub frame_count: u32,
    pub channels: Vec<MotionChannel>,
}

impl Motion {
    /// Playback length in seconds; `None` when the frame rate is zero
    pub fn duration_secs(&self) -> Option<f32> {
        (self.fps > 0).then(|| self.frame_count as f32 / self.fps as f32)
    }

    /// Channel of the given type targeting `target`
    pub fn channel(&self, channel_type: ChannelType, target: u32) -> Option<&MotionChannel> {
        self.channels
            .iter()
            .find(|channel| channel.target == target && channel.channel_type() == channel_type)
    }

    /// Position of bone `target` at `frame`, if the motion animates it
    pub fn position_at(&self, target: u32, frame: usize) -> Option<Vec3> {
        match &self.channel(ChannelType::Position, target)?.frames {
            ChannelFrames::Position(frames) => frames.get(frame).copied(),
            _ => None,
        }
    }

    /// Rotation of bone `target` at `frame`, if the motion animates it
    pub fn rotation_at(&self, target: u32, frame: usize) -> Option<Quat> {
        match &self.channel(ChannelType::Rotation, target)?.frames {
            ChannelFrames::Rotation(frames) => frames.get(frame).copied(),
            _ => None,
        }
    }

    /// Check that every position and rotation channel targets a bone or
    /// dummy bone of `skeleton`
    pub fn validate_for_skeleton(&self, skeleton: &Skeleton) -> ParseResult<()> {
        let targets = skeleton.bones.len() + skeleton.dummy_bones.len();

        for (index, channel) in self.channels.iter().enumerate() {
            let skeletal = matches!(channel.channel_type(), ChannelType::Position | ChannelType::Rotation);
            if skeletal && !usize::try_from(channel.target).is_ok_and(|target| target < targets) {
                return Err(ParseError::invalid(format!(
                    "channel {index} ({}) targets bone {} but the skeleton has {targets} bones and dummies",
                    channel.channel_type(),
                    channel.target
                )));
            }
        }

        Ok(())
    }
}

impl HumanReadable for Motion {
    fn to_readable_string(&self) -> String {
        let mut out = format!(
            "Motion {}\n  fps: {}\n  frames: {}\n  duration: {}\n  channels: {}\n",
            self.identifier,
            self.fps,
            self.frame_count,
            self.duration_secs().map_or_else(|| "-".to_string(), |secs| format!("{secs:.2}s")),
            self.channels.len(),
        );
        for channel in &self.channels {
            out.push_str(&format!("    {} -> {}\n", channel.channel_type(), channel.target));
        }
        out
    }
}

/// Motion decoder
pub struct ZmoParser;

impl ZmoParser {
    pub fn new() -> Self {
        Self
    }

    fn read_identifier(cursor: &mut ByteCursor<'_>) -> ParseResult<String> {
        let identifier = cursor.read_fixed_string(IDENTIFIER_LEN)?;
        if identifier == IDENTIFIER {
            Ok(identifier)
        } else if identifier.starts_with("ZMO") {
            Err(ParseError::UnsupportedVersion {
                format: "ZMO",
                version: identifier,
            })
        } else {
            Err(ParseError::UnrecognizedFormat {
                format: "ZMO",
                found: identifier,
            })
        }
    }
}

impl Default for ZmoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ZmoParser {
    type Output = Motion;

    fn name(&self) -> &str {
        "ZMO Motion Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["zmo"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<Motion> {
        let mut cursor = ByteCursor::new(data);

        let identifier = Self::read_identifier(&mut cursor)?;
        let fps = cursor.read_u32()?;
        let frame_count = cursor.read_u32()?;
        let channel_count = cursor.read_count_u32("channel")?;

        let channel_types = cursor
            .read_array(channel_count, |c| Ok((ChannelType::try_from(c.read_u32()?)?, c.read_u32()?)))
            .map_err(|e| e.with_context("channel table"))?;

        // Bound the reservation by what the frame data could actually hold
        let frame_size: usize = channel_types.iter().map(|(channel_type, _)| channel_type.value_size()).sum();
        let reserve = if frame_size == 0 {
            0
        } else {
            (frame_count as usize).min(cursor.remaining() / frame_size)
        };

        let mut channels: Vec<MotionChannel> = channel_types
            .into_iter()
            .map(|(channel_type, target)| MotionChannel {
                target,
                frames: ChannelFrames::with_capacity(channel_type, reserve),
            })
            .collect();

        for frame in 0..frame_count {
            for channel in &mut channels {
                channel
                    .frames
                    .push_frame(&mut cursor)
                    .map_err(|e| e.with_context(format!("frame {frame}")))?;
            }
        }

        Ok(Motion {
            identifier,
            fps,
            frame_count,
            channels,
        })
    }
}
