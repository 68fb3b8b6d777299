//! CMT camera-animation codec.
//!
//! A CMT file is a 0x20-byte header followed by 0x10-byte animation records
//! and, per animation, a run of 32-byte frames: position, field of view,
//! focus point and roll. Frames are stored densely at the animation's frame
//! rate; there is no keyframe sharing.

use crate::{CmtVersion, Error, Reader, Writer};
use glam::{Mat3, Quat, Vec3};
use log::debug;

const MAGIC: &[u8; 4] = b"CMTP";
const HEADER_SIZE: usize = 0x20;
const ANM_RECORD_SIZE: usize = 0x10;
const FRAME_SIZE: usize = 32;

/// Record formats with this bit set pack their frames; only the plain
/// float layout is supported.
const FORMAT_PACKED: u32 = 0x10000;

/// One camera sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CmtFrame {
    pub position: Vec3,
    /// Horizontal field of view in radians.
    pub fov: f32,
    pub focus: Vec3,
    /// Rotation around the view axis in radians.
    pub roll: f32,
}

impl CmtFrame {
    /// Orientation of a camera that looks along its local -Z from
    /// `position` toward `focus` with +Y up, then rolls around the view
    /// axis. Falls back to an unrolled identity when position and focus
    /// coincide.
    pub fn view_orientation(&self) -> Quat {
        look_toward(self.focus - self.position) * Quat::from_rotation_z(self.roll)
    }

    /// Inverse of [`view_orientation`](Self::view_orientation): places the
    /// focus point `focus_distance` units along the view direction and
    /// extracts the roll left over after the look-at part of `orientation`.
    pub fn from_view(position: Vec3, orientation: Quat, fov: f32, focus_distance: f32) -> Self {
        let forward = orientation * Vec3::NEG_Z;
        let focus = position + forward * focus_distance;
        let residual = look_toward(forward).inverse() * orientation;
        let roll = 2.0 * residual.z.atan2(residual.w);
        CmtFrame {
            position,
            fov,
            focus,
            roll,
        }
    }
}

/// Unrolled look-at: local -Z along `dir`, +Y as close to world +Y as the
/// direction allows.
fn look_toward(dir: Vec3) -> Quat {
    let forward = dir.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let back = -forward;
    let mut right = Vec3::Y.cross(back);
    if right.length_squared() < 1e-12 {
        right = Vec3::X;
    } else {
        right = right.normalize();
    }
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize()
}

#[derive(Clone, Debug)]
pub struct CmtAnimation {
    pub frame_rate: f32,
    /// Record format word, kept verbatim.
    pub format: u32,
    pub frames: Vec<CmtFrame>,
}

impl CmtAnimation {
    pub fn new(frame_rate: f32) -> Self {
        CmtAnimation {
            frame_rate,
            format: 0,
            frames: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CmtFile {
    pub version: CmtVersion,
    pub big_endian: bool,
    pub animations: Vec<CmtAnimation>,
}

impl CmtFile {
    pub fn new(version: CmtVersion) -> Self {
        CmtFile {
            version,
            big_endian: true,
            animations: Vec::new(),
        }
    }
}

pub fn read_cmt(bytes: &[u8]) -> Result<CmtFile, Error> {
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
    let version = CmtVersion::from_raw(r.read_u32()?)?;
    let _data_size = r.read_u32()?;
    let anm_count = r.read_u32()? as usize;

    debug!("cmt: version {version:?}, {anm_count} animation(s)");

    let mut animations = Vec::with_capacity(anm_count);
    for i in 0..anm_count {
        r.seek(HEADER_SIZE + i * ANM_RECORD_SIZE)?;
        let frame_rate = r.read_f32()?;
        let frame_count = r.read_u32()? as usize;
        let data_offset = r.read_u32()? as usize;
        let format = r.read_u32()?;
        if format & FORMAT_PACKED != 0 {
            return Err(Error::InvalidValue {
                message: format!("camera animation {i} uses packed format {format:#x}"),
            });
        }

        r.seek(data_offset)?;
        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            let position = Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?);
            let fov = r.read_f32()?;
            let focus = Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?);
            let roll = r.read_f32()?;
            frames.push(CmtFrame {
                position,
                fov,
                focus,
                roll,
            });
        }

        animations.push(CmtAnimation {
            frame_rate,
            format,
            frames,
        });
    }

    Ok(CmtFile {
        version,
        big_endian,
        animations,
    })
}

pub fn write_cmt(file: &CmtFile) -> Result<Vec<u8>, Error> {
    let mut w = Writer::new(file.big_endian);

    w.write_bytes(MAGIC);
    w.write_u8(2);
    w.write_u8(u8::from(file.big_endian));
    w.write_u16(0);
    w.write_u32(file.version.raw());
    w.write_u32(0); // data size, patched below
    w.write_u32(file.animations.len() as u32);
    w.write_u32(0);
    w.write_u32(0);
    w.write_u32(0);

    let mut data_offset = HEADER_SIZE + ANM_RECORD_SIZE * file.animations.len();
    for (i, anm) in file.animations.iter().enumerate() {
        if anm.format & FORMAT_PACKED != 0 {
            return Err(Error::InvalidValue {
                message: format!("camera animation {i} uses packed format {:#x}", anm.format),
            });
        }
        w.write_f32(anm.frame_rate);
        w.write_u32(anm.frames.len() as u32);
        w.write_u32(data_offset as u32);
        w.write_u32(anm.format);
        data_offset += FRAME_SIZE * anm.frames.len();
    }

    for anm in &file.animations {
        for frame in &anm.frames {
            w.write_f32(frame.position.x);
            w.write_f32(frame.position.y);
            w.write_f32(frame.position.z);
            w.write_f32(frame.fov);
            w.write_f32(frame.focus.x);
            w.write_f32(frame.focus.y);
            w.write_f32(frame.focus.z);
            w.write_f32(frame.roll);
        }
    }

    let data_size = w.len();
    w.seek(0xC);
    w.write_u32(data_size as u32);

    Ok(w.into_bytes())
}
