//! Bridge between the curve model and a host rig's channel tracks.
//!
//! A channel track is the host-side unit of animation: one scalar keyframe
//! sequence addressed by bone name, channel and array index. Import turns a
//! file-space animation into host-space tracks (axis remap plus rest-pose
//! re-basing, §`transform`); export runs the inverse and re-packs the
//! result into a single-animation container for a target game preset,
//! including the preset's root-motion split, hand-pattern clamp and
//! single-axis channel compression.
//!
//! Track keyframes are `(time, value)` pairs ordered by time. Times are in
//! frames; export truncates them to whole frames.

use crate::{
    Animation, Bone, Context, Curve, CurveFormat, Error, GamePreset, GmtFile, GmtVersion,
    KeyValue, Keyframe, Name, RestSkeleton, VectorVersion, algebra, transform,
};
use glam::{Quat, Vec3};
use log::{debug, warn};
use std::fmt;

const CENTER_BONE: &str = "center_c_n";
const VECTOR_BONE: &str = "vector_c_n";
const SCALE_BONE: &str = "scale";

/// Hand patterns above this index do not exist outside the dragon engine.
const MAX_OLD_HAND_PATTERN: f32 = 17.0;

/// Host channel addressed by a track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelName {
    Location,
    RotationQuaternion,
    Pat1LeftHand,
    Pat1RightHand,
    Pat1Unk(u16),
    Pat2Unk(u16),
    Pat3Unk(u16),
}

impl ChannelName {
    /// Parses the textual channel names (`location`, `rotation_quaternion`,
    /// `pat1_left_hand`, `pat2_unk_3`, ...).
    pub fn parse(s: &str) -> Option<ChannelName> {
        match s {
            "location" => Some(ChannelName::Location),
            "rotation_quaternion" => Some(ChannelName::RotationQuaternion),
            "pat1_left_hand" => Some(ChannelName::Pat1LeftHand),
            "pat1_right_hand" => Some(ChannelName::Pat1RightHand),
            _ => {
                let numbered = |prefix: &str| s.strip_prefix(prefix)?.parse::<u16>().ok();
                if let Some(n) = numbered("pat1_unk_") {
                    Some(ChannelName::Pat1Unk(n))
                } else if let Some(n) = numbered("pat2_unk_") {
                    Some(ChannelName::Pat2Unk(n))
                } else {
                    numbered("pat3_unk_").map(ChannelName::Pat3Unk)
                }
            }
        }
    }

    pub fn is_pattern(&self) -> bool {
        !matches!(
            self,
            ChannelName::Location | ChannelName::RotationQuaternion
        )
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelName::Location => f.write_str("location"),
            ChannelName::RotationQuaternion => f.write_str("rotation_quaternion"),
            ChannelName::Pat1LeftHand => f.write_str("pat1_left_hand"),
            ChannelName::Pat1RightHand => f.write_str("pat1_right_hand"),
            ChannelName::Pat1Unk(n) => write!(f, "pat1_unk_{n}"),
            ChannelName::Pat2Unk(n) => write!(f, "pat2_unk_{n}"),
            ChannelName::Pat3Unk(n) => write!(f, "pat3_unk_{n}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackInterpolation {
    Linear,
    Constant,
}

/// One scalar keyframe sequence on the host side. Location tracks use array
/// indices 0..=2 (x, y, z), rotation tracks 0..=3 in host order (w, x, y,
/// z), pattern tracks a single track at index 0.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelTrack {
    pub bone: String,
    pub channel: ChannelName,
    pub index: usize,
    /// `(time, value)` pairs ordered by time.
    pub keyframes: Vec<(f32, f32)>,
    pub interpolation: TrackInterpolation,
}

impl ChannelTrack {
    pub fn new(bone: impl Into<String>, channel: ChannelName, index: usize) -> Self {
        let interpolation = if channel.is_pattern() {
            TrackInterpolation::Constant
        } else {
            TrackInterpolation::Linear
        };
        ChannelTrack {
            bone: bone.into(),
            channel,
            index,
            keyframes: Vec::new(),
            interpolation,
        }
    }

    /// Evaluates the track at an arbitrary time: linear or step between the
    /// bounding keys, constant outside the keyed range. Empty tracks
    /// evaluate to zero.
    pub fn evaluate(&self, time: f32) -> f32 {
        let kfs = &self.keyframes;
        let (Some(first), Some(last)) = (kfs.first(), kfs.last()) else {
            return 0.0;
        };
        if time <= first.0 {
            return first.1;
        }
        if time >= last.0 {
            return last.1;
        }
        let mut i = 0;
        while i + 1 < kfs.len() && kfs[i + 1].0 <= time {
            i += 1;
        }
        let (t0, v0) = kfs[i];
        let (t1, v1) = kfs[i + 1];
        match self.interpolation {
            TrackInterpolation::Constant => v0,
            TrackInterpolation::Linear => {
                if t1 <= t0 {
                    v0
                } else {
                    v0 + (v1 - v0) * ((time - t0) / (t1 - t0))
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImportSettings {
    /// Fold the vector bone's root motion into the center bone before
    /// conversion.
    pub merge_vector: bool,
    /// Cutscene (auth) or gameplay semantics for the merge.
    pub context: Context,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            merge_vector: true,
            context: Context::Motion,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportSettings {
    pub preset: GamePreset,
    /// Cutscene (auth) or gameplay semantics for the root-motion split.
    pub context: Context,
    /// Name stamped on the container and its animation.
    pub name: Name,
    pub frame_rate: f32,
}

impl ExportSettings {
    pub fn new(preset: GamePreset, name: Name) -> Self {
        ExportSettings {
            preset,
            context: Context::Motion,
            name,
            frame_rate: 30.0,
        }
    }
}

/// Converts a file-space animation into host channel tracks.
///
/// Bones missing from the skeleton and curves without keyframes are skipped
/// with a warning.
pub fn import_animation(
    anm: &Animation,
    vector_version: VectorVersion,
    skeleton: &RestSkeleton,
    settings: &ImportSettings,
) -> Result<Vec<ChannelTrack>, Error> {
    debug!(
        "import '{}': {} bone(s), {:?}",
        anm.name,
        anm.bones.len(),
        vector_version
    );

    let mut anm = anm.clone();
    if settings.merge_vector {
        let is_auth = settings.context.is_auth();
        with_root_pair(&mut anm, |center, vector| {
            algebra::merge_vector(center, vector, vector_version, is_auth)
        })?;
    }

    let mut tracks = Vec::new();
    for bone in &anm.bones {
        let name = bone.name.as_str();
        let Some(pose) = skeleton.pose(name) else {
            warn!("bone '{}' not found in the target skeleton, skipped", bone.name);
            continue;
        };
        let parent = skeleton.parent_pose(name);
        let parent_basis = transform::uses_parent_basis(skeleton, name);

        if let Some(curve) = &bone.location {
            if curve.keyframes.is_empty() {
                warn!("bone '{}' has an empty location curve, skipped", bone.name);
            } else {
                let curve = algebra::neutralize(curve);
                let mut axes = [
                    ChannelTrack::new(name, ChannelName::Location, 0),
                    ChannelTrack::new(name, ChannelName::Location, 1),
                    ChannelTrack::new(name, ChannelName::Location, 2),
                ];
                for kf in &curve.keyframes {
                    let KeyValue::Vec3(v) = kf.value else {
                        continue;
                    };
                    let host = transform::rebase_location_to_host(
                        pose,
                        parent,
                        transform::position_to_host(v),
                    );
                    let time = kf.frame as f32;
                    axes[0].keyframes.push((time, host.x));
                    axes[1].keyframes.push((time, host.y));
                    axes[2].keyframes.push((time, host.z));
                }
                tracks.extend(axes);
            }
        }

        if let Some(curve) = &bone.rotation {
            if curve.keyframes.is_empty() {
                warn!("bone '{}' has an empty rotation curve, skipped", bone.name);
            } else {
                let curve = algebra::neutralize(curve);
                let mut comps = [
                    ChannelTrack::new(name, ChannelName::RotationQuaternion, 0),
                    ChannelTrack::new(name, ChannelName::RotationQuaternion, 1),
                    ChannelTrack::new(name, ChannelName::RotationQuaternion, 2),
                    ChannelTrack::new(name, ChannelName::RotationQuaternion, 3),
                ];
                for kf in &curve.keyframes {
                    let KeyValue::Quat(q) = kf.value else {
                        continue;
                    };
                    let remapped = transform::rotation_to_host(q);
                    let host = if parent_basis {
                        transform::rebase_rotation_to_host_dragon(pose, parent, remapped)
                    } else {
                        transform::rebase_rotation_to_host(pose, remapped)
                    };
                    let time = kf.frame as f32;
                    comps[0].keyframes.push((time, host.w));
                    comps[1].keyframes.push((time, host.x));
                    comps[2].keyframes.push((time, host.y));
                    comps[3].keyframes.push((time, host.z));
                }
                tracks.extend(comps);
            }
        }

        let patterns = bone
            .patterns_hand
            .iter()
            .chain(&bone.patterns_unk)
            .chain(&bone.patterns_face);
        for curve in patterns {
            if curve.keyframes.is_empty() {
                warn!("bone '{}' has an empty pattern curve, skipped", bone.name);
                continue;
            }
            let Some(channel) = pattern_channel(curve.format) else {
                warn!(
                    "bone '{}' has a non-pattern curve among its patterns, skipped",
                    bone.name
                );
                continue;
            };
            let mut track = ChannelTrack::new(name, channel, 0);
            for kf in &curve.keyframes {
                let value = match kf.value {
                    KeyValue::HandPattern(start, _) => f32::from(start),
                    KeyValue::BytePattern(v) => f32::from(v),
                    _ => continue,
                };
                track.keyframes.push((kf.frame as f32, value));
            }
            tracks.push(track);
        }
    }

    Ok(tracks)
}

/// Converts host channel tracks back into a single-animation container for
/// the preset in `settings`.
pub fn export_animation(
    tracks: &[ChannelTrack],
    skeleton: &RestSkeleton,
    settings: &ExportSettings,
) -> Result<GmtFile, Error> {
    if tracks.is_empty() {
        return Err(Error::NoAnimationData);
    }

    let preset = settings.preset;
    let version = preset.version();
    let dragon_target = preset.is_dragon_engine();

    // Group tracks per bone, preserving first-appearance order. Empty
    // tracks would otherwise shadow the rest-default fill below.
    let mut groups: Vec<(&str, Vec<&ChannelTrack>)> = Vec::new();
    for track in tracks {
        if track.keyframes.is_empty() {
            warn!("track {}/{} has no keyframes, skipped", track.bone, track.channel);
            continue;
        }
        match groups.iter_mut().find(|(n, _)| *n == track.bone.as_str()) {
            Some((_, list)) => list.push(track),
            None => groups.push((track.bone.as_str(), vec![track])),
        }
    }

    debug!(
        "export: {} track(s) in {} bone group(s), preset {preset:?}",
        tracks.len(),
        groups.len()
    );

    let mut anm = Animation::new(settings.name.clone(), settings.frame_rate);
    for (bone_name, group) in &groups {
        let Some(pose) = skeleton.pose(bone_name) else {
            warn!("bone '{bone_name}' not found in the target skeleton, skipped");
            continue;
        };
        let parent = skeleton.parent_pose(bone_name);
        let parent_basis = transform::uses_parent_basis(skeleton, bone_name);
        let mut bone = Bone::new(Name::from(*bone_name));

        let location: Vec<&&ChannelTrack> = group
            .iter()
            .filter(|t| t.channel == ChannelName::Location)
            .collect();
        if !location.is_empty() {
            let mut keyframes = Vec::new();
            for time in union_times(&location) {
                let mut v = [0.0f32; 3];
                for track in &location {
                    if track.index < 3 {
                        v[track.index] = track.evaluate(time);
                    }
                }
                let file_v = transform::position_to_file(transform::rebase_location_to_file(
                    pose,
                    parent,
                    Vec3::from(v),
                ));
                keyframes.push(Keyframe::new(time as u32, KeyValue::Vec3(file_v)));
            }
            bone.location = Some(Curve::with_keyframes(CurveFormat::PosVec3, keyframes));
        }

        let rotation: Vec<&&ChannelTrack> = group
            .iter()
            .filter(|t| t.channel == ChannelName::RotationQuaternion)
            .collect();
        if !rotation.is_empty() {
            let mut keyframes = Vec::new();
            for time in union_times(&rotation) {
                let mut v = [1.0f32, 0.0, 0.0, 0.0];
                for track in &rotation {
                    if track.index < 4 {
                        v[track.index] = track.evaluate(time);
                    }
                }
                let host = Quat::from_xyzw(v[1], v[2], v[3], v[0]);
                let unbased = if parent_basis {
                    transform::rebase_rotation_to_file_dragon(pose, parent, host)
                } else {
                    transform::rebase_rotation_to_file(pose, host)
                };
                let file_q = transform::rotation_to_file(unbased);
                keyframes.push(Keyframe::new(time as u32, KeyValue::Quat(file_q)));
            }
            bone.rotation = Some(Curve::with_keyframes(CurveFormat::RotQuatScaled, keyframes));
        }

        for track in group.iter().filter(|t| t.channel.is_pattern()) {
            let Some(format) = pattern_format(track.channel) else {
                continue;
            };
            let frames: Vec<u32> = track.keyframes.iter().map(|&(t, _)| t as u32).collect();
            let values: Vec<f32> = track.keyframes.iter().map(|&(_, v)| v).collect();
            let keyframes = match format {
                CurveFormat::PatHand { .. } => frames
                    .iter()
                    .enumerate()
                    .map(|(i, &frame)| {
                        let start = values[i];
                        let end = values.get(i + 1).copied().unwrap_or(start);
                        Keyframe::new(frame, KeyValue::HandPattern(start as i16, end as i16))
                    })
                    .collect(),
                _ => frames
                    .iter()
                    .zip(&values)
                    .map(|(&frame, &v)| Keyframe::new(frame, KeyValue::BytePattern(v as i8)))
                    .collect(),
            };
            let curve = Curve::with_keyframes(format, keyframes);
            match format {
                CurveFormat::PatHand { .. } => bone.patterns_hand.push(curve),
                CurveFormat::PatUnk { .. } => bone.patterns_unk.push(curve),
                _ => bone.patterns_face.push(curve),
            }
        }

        anm.bones.push(bone);
    }

    // Ishin-tier targets outside the dragon engine expect a leading scale
    // bone with identity motion.
    if version == GmtVersion::Ishin && !dragon_target {
        let mut scale = Bone::new(Name::from(SCALE_BONE));
        scale.location = Some(Curve::identity_location());
        scale.rotation = Some(Curve::identity_rotation());
        anm.bones.insert(0, scale);
    }

    let vector_version = preset.vector_version();
    if vector_version != VectorVersion::NoVector {
        let is_auth = settings.context.is_auth();
        with_root_pair(&mut anm, |center, vector| {
            algebra::split_vector(center, vector, vector_version, is_auth);
            Ok(())
        })?;
    }

    if !dragon_target {
        clamp_hand_patterns(&mut anm);
    }

    for bone in &mut anm.bones {
        if let Some(curve) = &bone.location {
            bone.location = Some(compress_location(curve));
        }
        if let Some(curve) = &bone.rotation {
            bone.rotation = Some(compress_rotation(curve));
        }
    }

    anm.end_frame = anm.computed_end_frame();

    let mut file = GmtFile::new(settings.name.clone(), version);
    file.animations.push(anm);
    Ok(file)
}

/// Runs `f` with the center and vector bones borrowed out of the
/// animation; does nothing unless both are present.
fn with_root_pair<F>(anm: &mut Animation, f: F) -> Result<(), Error>
where
    F: FnOnce(&mut Bone, &mut Bone) -> Result<(), Error>,
{
    let center = anm.bones.iter().position(|b| b.name.as_str() == CENTER_BONE);
    let vector = anm.bones.iter().position(|b| b.name.as_str() == VECTOR_BONE);
    let (Some(ci), Some(vi)) = (center, vector) else {
        return Ok(());
    };
    if ci == vi {
        return Ok(());
    }
    let mut vector_bone = std::mem::take(&mut anm.bones[vi]);
    let result = f(&mut anm.bones[ci], &mut vector_bone);
    anm.bones[vi] = vector_bone;
    result
}

fn pattern_channel(format: CurveFormat) -> Option<ChannelName> {
    match format {
        CurveFormat::PatHand { channel: 0 } => Some(ChannelName::Pat1LeftHand),
        CurveFormat::PatHand { channel: 1 } => Some(ChannelName::Pat1RightHand),
        CurveFormat::PatHand { channel } => Some(ChannelName::Pat1Unk(channel)),
        CurveFormat::PatUnk { channel } => Some(ChannelName::Pat2Unk(channel)),
        CurveFormat::PatFace { channel } => Some(ChannelName::Pat3Unk(channel)),
        CurveFormat::PatRaw { format, .. } => Some(ChannelName::Pat3Unk((format >> 16) as u16)),
        _ => None,
    }
}

fn pattern_format(channel: ChannelName) -> Option<CurveFormat> {
    match channel {
        ChannelName::Pat1LeftHand => Some(CurveFormat::PatHand { channel: 0 }),
        ChannelName::Pat1RightHand => Some(CurveFormat::PatHand { channel: 1 }),
        ChannelName::Pat1Unk(n) => Some(CurveFormat::PatHand { channel: n }),
        ChannelName::Pat2Unk(n) => Some(CurveFormat::PatUnk { channel: n }),
        ChannelName::Pat3Unk(n) => Some(CurveFormat::PatFace { channel: n }),
        _ => None,
    }
}

/// Sorted, de-duplicated union of the keyframe times of a track group.
fn union_times(tracks: &[&&ChannelTrack]) -> Vec<f32> {
    let mut times: Vec<f32> = tracks
        .iter()
        .flat_map(|t| t.keyframes.iter().map(|&(time, _)| time))
        .collect();
    times.sort_by(f32::total_cmp);
    times.dedup();
    times
}

fn clamp_hand_patterns(anm: &mut Animation) {
    for bone in &mut anm.bones {
        for curve in &mut bone.patterns_hand {
            for kf in &mut curve.keyframes {
                if let KeyValue::HandPattern(start, end) = &mut kf.value {
                    if f32::from(*start) > MAX_OLD_HAND_PATTERN {
                        *start = 0;
                    }
                    if f32::from(*end) > MAX_OLD_HAND_PATTERN {
                        *end = 0;
                    }
                }
            }
        }
    }
}

/// Collapses a location curve whose values are zero on at least two axes to
/// the matching single-axis format. An all-zero curve keeps X.
fn compress_location(curve: &Curve) -> Curve {
    let mut vectors = Vec::with_capacity(curve.keyframes.len());
    for kf in &curve.keyframes {
        match kf.value {
            KeyValue::Vec3(v) => vectors.push(v),
            _ => return curve.clone(),
        }
    }

    let zero = [
        vectors.iter().all(|v| v.x == 0.0),
        vectors.iter().all(|v| v.y == 0.0),
        vectors.iter().all(|v| v.z == 0.0),
    ];
    if zero.iter().filter(|&&z| z).count() < 2 {
        return curve.clone();
    }

    let axis = zero.iter().position(|&z| !z).unwrap_or(0);
    let format = [CurveFormat::PosX, CurveFormat::PosY, CurveFormat::PosZ][axis];
    let keyframes = curve
        .keyframes
        .iter()
        .zip(&vectors)
        .map(|(kf, v)| Keyframe::new(kf.frame, KeyValue::Axis(v[axis])))
        .collect();
    Curve::with_keyframes(format, keyframes)
}

/// Collapses a rotation curve whose x/y/z are zero on at least two axes to
/// the matching axis+w pair format. An all-zero curve keeps X.
fn compress_rotation(curve: &Curve) -> Curve {
    let mut quats = Vec::with_capacity(curve.keyframes.len());
    for kf in &curve.keyframes {
        match kf.value {
            KeyValue::Quat(q) => quats.push(q),
            _ => return curve.clone(),
        }
    }

    let zero = [
        quats.iter().all(|q| q.x == 0.0),
        quats.iter().all(|q| q.y == 0.0),
        quats.iter().all(|q| q.z == 0.0),
    ];
    if zero.iter().filter(|&&z| z).count() < 2 {
        return curve.clone();
    }

    let axis = zero.iter().position(|&z| !z).unwrap_or(0);
    let format = [
        CurveFormat::RotXwScaled,
        CurveFormat::RotYwScaled,
        CurveFormat::RotZwScaled,
    ][axis];
    let keyframes = curve
        .keyframes
        .iter()
        .zip(&quats)
        .map(|(kf, q)| {
            let component = [q.x, q.y, q.z][axis];
            Keyframe::new(kf.frame, KeyValue::AxisW(component, q.w))
        })
        .collect();
    Curve::with_keyframes(format, keyframes)
}
