//! IFA static face-pose codec.
//!
//! An IFA file stores one location and rotation per face bone, with the
//! parent bone recorded by name: a 0x20-byte header (magic `GSFA`, endian
//! byte, version, data size, bone count) followed by 0x60-byte records of
//! name, parent name, location and rotation. Conversions to and from the
//! curve model treat each bone as a pair of one-keyframe curves.

use crate::{
    Animation, Bone, Curve, CurveFormat, Error, KeyValue, Keyframe, Name, Reader, RestSkeleton,
    Writer, algebra,
};
use glam::{Quat, Vec3};
use log::{debug, warn};

const MAGIC: &[u8; 4] = b"GSFA";
const HEADER_SIZE: usize = 0x20;
const BONE_RECORD_SIZE: usize = 0x60;
const VERSION: u32 = 0x10001;

/// Root of the face rig; exports require it in the target skeleton.
const FACE_ROOT: &str = "face";

#[derive(Clone, Debug, PartialEq)]
pub struct IfaBone {
    pub name: Name,
    pub parent: Name,
    pub location: Vec3,
    /// Stored x, y, z, w.
    pub rotation: Quat,
}

#[derive(Clone, Debug)]
pub struct IfaFile {
    pub big_endian: bool,
    pub bones: Vec<IfaBone>,
}

impl IfaFile {
    pub fn new() -> Self {
        IfaFile {
            big_endian: true,
            bones: Vec::new(),
        }
    }

    /// Expands the pose into an animation: every bone gets a location and a
    /// rotation curve with a single keyframe at frame 0.
    pub fn to_animation(&self, name: Name, frame_rate: f32) -> Animation {
        let mut anm = Animation::new(name, frame_rate);
        for bone in &self.bones {
            let mut out = Bone::new(bone.name.clone());
            out.location = Some(Curve::with_keyframes(
                CurveFormat::PosVec3,
                vec![Keyframe::new(0, KeyValue::Vec3(bone.location))],
            ));
            out.rotation = Some(Curve::with_keyframes(
                CurveFormat::RotQuatScaled,
                vec![Keyframe::new(0, KeyValue::Quat(bone.rotation))],
            ));
            anm.bones.push(out);
        }
        anm
    }

    /// Captures a pose from the first keyframe of every face bone in the
    /// animation. Bones outside the face subtree are ignored; face bones
    /// missing either curve are skipped with a warning. Fails if the
    /// skeleton has no face root at all.
    pub fn from_animation(anm: &Animation, skeleton: &RestSkeleton) -> Result<IfaFile, Error> {
        if !skeleton.contains(FACE_ROOT) {
            return Err(Error::MissingBone {
                bone: FACE_ROOT.to_owned(),
            });
        }

        let mut bones = Vec::new();
        for bone in &anm.bones {
            if !skeleton.is_descendant_of(bone.name.as_str(), FACE_ROOT) {
                continue;
            }
            let (Some(location), Some(rotation)) = (&bone.location, &bone.rotation) else {
                warn!(
                    "face bone '{}' is missing a location or rotation curve, skipped",
                    bone.name
                );
                continue;
            };

            let location = algebra::neutralize(location);
            let rotation = algebra::neutralize(rotation);
            let first = location
                .keyframes
                .first()
                .map(|kf| kf.value)
                .zip(rotation.keyframes.first().map(|kf| kf.value));
            let Some((KeyValue::Vec3(loc), KeyValue::Quat(rot))) = first else {
                warn!("face bone '{}' has no usable keyframes, skipped", bone.name);
                continue;
            };

            let parent = skeleton
                .parent_of(bone.name.as_str())
                .map(Name::from)
                .unwrap_or_default();
            bones.push(IfaBone {
                name: bone.name.clone(),
                parent,
                location: loc,
                rotation: rot,
            });
        }

        Ok(IfaFile {
            big_endian: true,
            bones,
        })
    }
}

impl Default for IfaFile {
    fn default() -> Self {
        Self::new()
    }
}

pub fn read_ifa(bytes: &[u8]) -> Result<IfaFile, Error> {
    let mut r = Reader::new(bytes);

    let magic = r.read_bytes(4)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into_owned(),
            found: String::from_utf8_lossy(magic).into_owned(),
        });
    }

    r.skip(1)?;
    let big_endian = r.read_u8()? != 0;
    r.set_endian(big_endian);
    r.skip(2)?;
    let version = r.read_u32()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion { version });
    }
    let _data_size = r.read_u32()?;
    let bone_count = r.read_u32()? as usize;

    debug!("ifa: {bone_count} bone(s)");

    let mut bones = Vec::with_capacity(bone_count);
    for i in 0..bone_count {
        r.seek(HEADER_SIZE + i * BONE_RECORD_SIZE)?;
        let name = Name::read(&mut r)?;
        let parent = Name::read(&mut r)?;
        let location = Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?);
        let rotation = Quat::from_xyzw(
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
        );
        bones.push(IfaBone {
            name,
            parent,
            location,
            rotation,
        });
    }

    Ok(IfaFile { big_endian, bones })
}

pub fn write_ifa(file: &IfaFile) -> Result<Vec<u8>, Error> {
    let mut w = Writer::new(file.big_endian);

    w.write_bytes(MAGIC);
    w.write_u8(2);
    w.write_u8(u8::from(file.big_endian));
    w.write_u16(0);
    w.write_u32(VERSION);
    w.write_u32(0); // data size, patched below
    w.write_u32(file.bones.len() as u32);
    w.write_u32(0);
    w.write_u32(0);
    w.write_u32(0);

    for bone in &file.bones {
        bone.name.write(&mut w);
        bone.parent.write(&mut w);
        w.write_f32(bone.location.x);
        w.write_f32(bone.location.y);
        w.write_f32(bone.location.z);
        w.write_f32(bone.rotation.x);
        w.write_f32(bone.rotation.y);
        w.write_f32(bone.rotation.z);
        w.write_f32(bone.rotation.w);
        w.write_u32(0);
    }

    let data_size = w.len();
    w.seek(0xC);
    w.write_u32(data_size as u32);

    Ok(w.into_bytes())
}
