//! In-memory animation model.
//!
//! Containers decode into plain owned data: a [`GmtFile`] holds animations,
//! animations hold bones, bones hold at most one location and one rotation
//! curve plus any number of pattern curves. The flat tables of the container
//! (names, graphs, bone maps) are codec details and are rebuilt from this
//! tree on every write.

use crate::{CurveChannel, CurveFormat, CurveType, GmtVersion, Name, VectorVersion};
use glam::{Quat, Vec3};

/// One keyframe payload. The variant must match the curve's format family:
/// locations carry [`KeyValue::Vec3`] or [`KeyValue::Axis`], rotations
/// [`KeyValue::Quat`] or [`KeyValue::AxisW`], patterns the integer variants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum KeyValue {
    /// Full location.
    Vec3(Vec3),
    /// Single location axis.
    Axis(f32),
    /// Full rotation, stored x/y/z/w.
    Quat(Quat),
    /// One rotation axis plus w.
    AxisW(f32, f32),
    /// Hand pattern pair: index at this keyframe and at the next.
    HandPattern(i16, i16),
    /// Single-byte pattern value.
    BytePattern(i8),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub value: KeyValue,
}

impl Keyframe {
    pub fn new(frame: u32, value: KeyValue) -> Self {
        Self { frame, value }
    }
}

/// A keyframe curve for one property of one bone.
///
/// `format` is the wire format the curve was decoded with and is kept so a
/// read-modify-write cycle re-emits the same encoding (the writer swaps in a
/// version-appropriate format only where the original one is write-only, see
/// [`CurveFormat::normalized`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub format: CurveFormat,
    /// Trailer of the keyframe-time table, preserved verbatim from the
    /// source file; -1 for curves created in memory.
    pub delimiter: i16,
    pub keyframes: Vec<Keyframe>,
}

impl Curve {
    pub fn new(format: CurveFormat) -> Self {
        Self {
            format,
            delimiter: -1,
            keyframes: Vec::new(),
        }
    }

    pub fn with_keyframes(format: CurveFormat, keyframes: Vec<Keyframe>) -> Self {
        Self {
            format,
            delimiter: -1,
            keyframes,
        }
    }

    /// Identity location curve: a single zero vector at frame 0.
    pub fn identity_location() -> Self {
        Self::with_keyframes(
            CurveFormat::PosVec3,
            vec![Keyframe::new(0, KeyValue::Vec3(Vec3::ZERO))],
        )
    }

    /// Identity rotation curve: a single identity quaternion at frame 0.
    pub fn identity_rotation() -> Self {
        Self::with_keyframes(
            CurveFormat::RotQuatScaled,
            vec![Keyframe::new(0, KeyValue::Quat(Quat::IDENTITY))],
        )
    }

    pub fn kind(&self) -> CurveType {
        self.format.kind()
    }

    pub fn channel(&self) -> CurveChannel {
        self.format.channel()
    }

    /// Frame of the last keyframe, 0 for an empty curve.
    pub fn end_frame(&self) -> u32 {
        self.keyframes.last().map_or(0, |kf| kf.frame)
    }
}

/// All curves animating one bone.
#[derive(Clone, Debug, Default)]
pub struct Bone {
    pub name: Name,
    pub location: Option<Curve>,
    pub rotation: Option<Curve>,
    pub patterns_hand: Vec<Curve>,
    pub patterns_unk: Vec<Curve>,
    pub patterns_face: Vec<Curve>,
}

impl Bone {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Curves in emission order: location, rotation, then patterns.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.location
            .iter()
            .chain(self.rotation.iter())
            .chain(self.patterns_hand.iter())
            .chain(self.patterns_unk.iter())
            .chain(self.patterns_face.iter())
    }

    pub fn curve_count(&self) -> usize {
        self.curves().count()
    }
}

#[derive(Clone, Debug)]
pub struct Animation {
    pub name: Name,
    pub frame_rate: f32,
    /// Frame of the last keyframe across all curves. Despite the container
    /// calling it a frame count, it is the end frame; recomputed on write.
    pub end_frame: u32,
    /// Two opaque words from the animation record with no known meaning.
    /// Preserved across a read-modify-write cycle.
    pub unknown_indices: [u32; 2],
    pub bones: Vec<Bone>,
}

impl Animation {
    pub fn new(name: Name, frame_rate: f32) -> Self {
        Self {
            name,
            frame_rate,
            end_frame: 0,
            unknown_indices: [0, 0],
            bones: Vec::new(),
        }
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name.as_str() == name)
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        self.bones.iter_mut().find(|b| b.name.as_str() == name)
    }

    /// Recomputes the end frame from the curves.
    pub fn computed_end_frame(&self) -> u32 {
        self.bones
            .iter()
            .flat_map(|b| b.curves())
            .map(|c| c.end_frame())
            .max()
            .unwrap_or(0)
    }

    pub fn curve_count(&self) -> usize {
        self.bones.iter().map(|b| b.curve_count()).sum()
    }
}

#[derive(Clone, Debug)]
pub struct GmtFile {
    pub name: Name,
    pub version: GmtVersion,
    pub big_endian: bool,
    pub flags: u32,
    pub animations: Vec<Animation>,
}

impl GmtFile {
    pub fn new(name: Name, version: GmtVersion) -> Self {
        Self {
            name,
            version,
            big_endian: true,
            flags: 0,
            animations: Vec::new(),
        }
    }

    /// The primary animation. Multi-animation files exist but tooling
    /// operates on the first.
    pub fn animation(&self) -> Option<&Animation> {
        self.animations.first()
    }

    /// Root-motion policy implied by the container alone: versions before
    /// Ishin have no vector bone, and among Ishin-version files the
    /// dragon-engine ones are recognized by their `sync_c_n` bone.
    pub fn vector_version(&self) -> VectorVersion {
        if self.version < GmtVersion::Ishin {
            return VectorVersion::NoVector;
        }
        let has_sync = self
            .animations
            .iter()
            .any(|a| a.bone("sync_c_n").is_some());
        if has_sync {
            VectorVersion::DragonVector
        } else {
            VectorVersion::OldVector
        }
    }
}
