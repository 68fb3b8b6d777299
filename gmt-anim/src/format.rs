//! Wire formats for curve payloads.
//!
//! Each curve record stores a `(property, format)` code pair. The low byte of
//! `format` selects the value space (0 rotation, 1 position, 4 pattern pairs,
//! 5 single-byte patterns) and the high half-word is a per-space selector.
//! Several code pairs change meaning between container generations: in
//! Kenzan-era files (version 0x10001) rotation payloads are IEEE floats or
//! halfs, afterwards they are 16384-scaled int16. [`parse_format`] resolves a
//! code pair against the container version into an exhaustive [`CurveFormat`].

use crate::{Error, GmtVersion};
use std::fmt;

/// Value space of a curve, independent of how it is packed on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CurveType {
    Location,
    Rotation,
    /// Hand pose pattern: (start, end) index pairs.
    PatternHand,
    /// Single-byte auxiliary pattern.
    PatternUnk,
    /// Single-byte face pattern.
    PatternFace,
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurveType::Location => "location",
            CurveType::Rotation => "rotation",
            CurveType::PatternHand => "hand pattern",
            CurveType::PatternUnk => "pattern",
            CurveType::PatternFace => "face pattern",
        };
        f.write_str(s)
    }
}

/// Which components of the value a curve carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CurveChannel {
    /// Full vector or quaternion.
    All,
    X,
    Y,
    Z,
    /// One rotation axis plus W.
    Xw,
    Yw,
    Zw,
    LeftHand,
    RightHand,
    /// Numbered pattern channel.
    Other(u16),
}

/// Concrete on-disk encoding of a curve's values.
///
/// Code pairs, `(property, format)` with the format's minor byte last:
/// position `6/·1` (vec3 f32) and `4/major 1|2|4 ·1` (single axis f32);
/// rotation `1/·0` (xyz f32, w reconstructed), `2/·0` (quat f16 or i16/16384
/// by generation), `0x10..0x12/·0` (axis+w f32), `0x13..0x15/·0` (axis+w f16
/// or i16/16384 by generation), `0x1E/·0` (packed u32); patterns
/// `0x1C/·4` (i16 pairs), `0x1D/·5` and `0x1F/·5` (i8). Pattern codes
/// outside this table decode as [`CurveFormat::PatRaw`], one i8 per
/// keyframe with the original codes kept for re-emission.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CurveFormat {
    PosVec3,
    PosX,
    PosY,
    PosZ,
    RotQuatXyzFloat,
    RotQuatHalfFloat,
    RotQuatScaled,
    RotQuatIntScaled,
    RotXwFloat,
    RotYwFloat,
    RotZwFloat,
    RotXwHalfFloat,
    RotYwHalfFloat,
    RotZwHalfFloat,
    RotXwScaled,
    RotYwScaled,
    RotZwScaled,
    PatHand { channel: u16 },
    PatUnk { channel: u16 },
    PatFace { channel: u16 },
    PatRaw { property: u32, format: u32 },
}

impl CurveFormat {
    pub fn kind(self) -> CurveType {
        match self {
            CurveFormat::PosVec3 | CurveFormat::PosX | CurveFormat::PosY | CurveFormat::PosZ => {
                CurveType::Location
            }
            CurveFormat::PatHand { .. } => CurveType::PatternHand,
            CurveFormat::PatUnk { .. } => CurveType::PatternUnk,
            CurveFormat::PatFace { .. } | CurveFormat::PatRaw { .. } => CurveType::PatternFace,
            _ => CurveType::Rotation,
        }
    }

    pub fn channel(self) -> CurveChannel {
        match self {
            CurveFormat::PosVec3
            | CurveFormat::RotQuatXyzFloat
            | CurveFormat::RotQuatHalfFloat
            | CurveFormat::RotQuatScaled
            | CurveFormat::RotQuatIntScaled => CurveChannel::All,
            CurveFormat::PosX => CurveChannel::X,
            CurveFormat::PosY => CurveChannel::Y,
            CurveFormat::PosZ => CurveChannel::Z,
            CurveFormat::RotXwFloat | CurveFormat::RotXwHalfFloat | CurveFormat::RotXwScaled => {
                CurveChannel::Xw
            }
            CurveFormat::RotYwFloat | CurveFormat::RotYwHalfFloat | CurveFormat::RotYwScaled => {
                CurveChannel::Yw
            }
            CurveFormat::RotZwFloat | CurveFormat::RotZwHalfFloat | CurveFormat::RotZwScaled => {
                CurveChannel::Zw
            }
            CurveFormat::PatHand { channel } => match channel {
                0 => CurveChannel::LeftHand,
                1 => CurveChannel::RightHand,
                n => CurveChannel::Other(n),
            },
            CurveFormat::PatUnk { channel } | CurveFormat::PatFace { channel } => {
                CurveChannel::Other(channel)
            }
            CurveFormat::PatRaw { format, .. } => CurveChannel::Other((format >> 16) as u16),
        }
    }

    /// The format actually written into a container of `version`.
    ///
    /// Rotation formats the engines only ever read (legacy xyz float, packed
    /// int) re-encode as the version's full-quaternion format, and
    /// scaled/half variants swap to whichever the version's generation uses,
    /// so the written code pair always parses back to the written payload.
    pub fn normalized(self, version: GmtVersion) -> CurveFormat {
        let second_gen = version > GmtVersion::Kenzan;
        match self {
            CurveFormat::RotQuatXyzFloat
            | CurveFormat::RotQuatIntScaled
            | CurveFormat::RotQuatHalfFloat
            | CurveFormat::RotQuatScaled => {
                if second_gen {
                    CurveFormat::RotQuatScaled
                } else {
                    CurveFormat::RotQuatHalfFloat
                }
            }
            CurveFormat::RotXwHalfFloat | CurveFormat::RotXwScaled => {
                if second_gen {
                    CurveFormat::RotXwScaled
                } else {
                    CurveFormat::RotXwHalfFloat
                }
            }
            CurveFormat::RotYwHalfFloat | CurveFormat::RotYwScaled => {
                if second_gen {
                    CurveFormat::RotYwScaled
                } else {
                    CurveFormat::RotYwHalfFloat
                }
            }
            CurveFormat::RotZwHalfFloat | CurveFormat::RotZwScaled => {
                if second_gen {
                    CurveFormat::RotZwScaled
                } else {
                    CurveFormat::RotZwHalfFloat
                }
            }
            other => other,
        }
    }
}

/// Resolves a curve record's code pair against the container version.
///
/// Position and rotation codes outside the table are an error; pattern-space
/// codes outside it fall back to a generic one-byte pattern that keeps the
/// raw codes.
pub fn parse_format(property: u32, format: u32, version: GmtVersion) -> Result<CurveFormat, Error> {
    let minor = format & 0xFF;
    let major = format >> 16;
    let second_gen = version > GmtVersion::Kenzan;
    let unknown = Err(Error::UnknownFormat { property, format });

    match minor {
        0 => match (property, major) {
            (1, _) => Ok(CurveFormat::RotQuatXyzFloat),
            (2, _) => Ok(if second_gen {
                CurveFormat::RotQuatScaled
            } else {
                CurveFormat::RotQuatHalfFloat
            }),
            (0x10, 1) => Ok(CurveFormat::RotXwFloat),
            (0x11, 2) => Ok(CurveFormat::RotYwFloat),
            (0x12, 3) => Ok(CurveFormat::RotZwFloat),
            (0x13, 1) => Ok(if second_gen {
                CurveFormat::RotXwScaled
            } else {
                CurveFormat::RotXwHalfFloat
            }),
            (0x14, 2) => Ok(if second_gen {
                CurveFormat::RotYwScaled
            } else {
                CurveFormat::RotYwHalfFloat
            }),
            (0x15, 3) => Ok(if second_gen {
                CurveFormat::RotZwScaled
            } else {
                CurveFormat::RotZwHalfFloat
            }),
            (0x1E, _) => Ok(CurveFormat::RotQuatIntScaled),
            _ => unknown,
        },
        1 => match (property, major) {
            (4, 1) => Ok(CurveFormat::PosX),
            (4, 2) => Ok(CurveFormat::PosY),
            (4, 4) => Ok(CurveFormat::PosZ),
            (6, _) => Ok(CurveFormat::PosVec3),
            _ => unknown,
        },
        4 if property == 0x1C && major <= 3 => Ok(CurveFormat::PatHand {
            channel: major as u16,
        }),
        5 if property == 0x1D => Ok(CurveFormat::PatUnk {
            channel: major as u16,
        }),
        5 if property == 0x1F => Ok(CurveFormat::PatFace {
            channel: major as u16,
        }),
        _ => Ok(CurveFormat::PatRaw { property, format }),
    }
}

/// Packs a format back into its `(property, format)` code pair.
pub fn pack_format(format: CurveFormat) -> (u32, u32) {
    match format {
        CurveFormat::PosVec3 => (6, 1),
        CurveFormat::PosX => (4, (1 << 16) | 1),
        CurveFormat::PosY => (4, (2 << 16) | 1),
        CurveFormat::PosZ => (4, (4 << 16) | 1),
        CurveFormat::RotQuatXyzFloat => (1, 0),
        CurveFormat::RotQuatHalfFloat | CurveFormat::RotQuatScaled => (2, 0),
        CurveFormat::RotQuatIntScaled => (0x1E, 0),
        CurveFormat::RotXwFloat => (0x10, 1 << 16),
        CurveFormat::RotYwFloat => (0x11, 2 << 16),
        CurveFormat::RotZwFloat => (0x12, 3 << 16),
        CurveFormat::RotXwHalfFloat | CurveFormat::RotXwScaled => (0x13, 1 << 16),
        CurveFormat::RotYwHalfFloat | CurveFormat::RotYwScaled => (0x14, 2 << 16),
        CurveFormat::RotZwHalfFloat | CurveFormat::RotZwScaled => (0x15, 3 << 16),
        CurveFormat::PatHand { channel } => (0x1C, (u32::from(channel) << 16) | 4),
        CurveFormat::PatUnk { channel } => (0x1D, (u32::from(channel) << 16) | 5),
        CurveFormat::PatFace { channel } => (0x1F, (u32::from(channel) << 16) | 5),
        CurveFormat::PatRaw { property, format } => (property, format),
    }
}
