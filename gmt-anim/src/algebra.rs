//! Curve algebra: channel neutralization, keyframe-aligned addition and the
//! root-motion split/merge between a center bone and its vector bone.
//!
//! Addition works on the union of both keyframe sets. A side that has no
//! keyframe at a given frame is sampled between its bounding keys, linearly
//! for locations and spherically for rotations, with constant extrapolation
//! outside its range. All operations borrow their inputs and return owned
//! curves.

use crate::{Bone, Curve, CurveChannel, CurveFormat, CurveType, Error, KeyValue, Keyframe,
    VectorVersion};
use glam::{Quat, Vec3};

/// Expands single-channel curves to their full-value form: location X/Y/Z
/// to a vector with the other axes zero, rotation axis+w pairs to a
/// quaternion with the other two axes zero. Full-channel and pattern curves
/// pass through unchanged, so the operation is idempotent.
pub fn neutralize(curve: &Curve) -> Curve {
    let full = |axis: usize| {
        let keyframes = curve
            .keyframes
            .iter()
            .map(|kf| match kf.value {
                KeyValue::Axis(v) => {
                    let mut vec = Vec3::ZERO;
                    vec[axis] = v;
                    Keyframe::new(kf.frame, KeyValue::Vec3(vec))
                }
                other => Keyframe::new(kf.frame, other),
            })
            .collect();
        Curve::with_keyframes(CurveFormat::PosVec3, keyframes)
    };
    let quat = |axis: usize| {
        let keyframes = curve
            .keyframes
            .iter()
            .map(|kf| match kf.value {
                KeyValue::AxisW(v, w) => {
                    let mut q = [0.0f32; 4];
                    q[axis] = v;
                    q[3] = w;
                    Keyframe::new(kf.frame, KeyValue::Quat(Quat::from_xyzw(q[0], q[1], q[2], q[3])))
                }
                other => Keyframe::new(kf.frame, other),
            })
            .collect();
        // Half-float pairs stay in the half family; everything else lands on
        // the scaled quaternion, which keeps the explicit w of float pairs.
        let format = match curve.format {
            CurveFormat::RotXwHalfFloat | CurveFormat::RotYwHalfFloat
            | CurveFormat::RotZwHalfFloat => CurveFormat::RotQuatHalfFloat,
            _ => CurveFormat::RotQuatScaled,
        };
        Curve::with_keyframes(format, keyframes)
    };

    match (curve.kind(), curve.channel()) {
        (CurveType::Location, CurveChannel::X) => full(0),
        (CurveType::Location, CurveChannel::Y) => full(1),
        (CurveType::Location, CurveChannel::Z) => full(2),
        (CurveType::Rotation, CurveChannel::Xw) => quat(0),
        (CurveType::Rotation, CurveChannel::Yw) => quat(1),
        (CurveType::Rotation, CurveChannel::Zw) => quat(2),
        _ => curve.clone(),
    }
}

/// Combines two optional curves of the same kind into one.
///
/// Both absent yields the identity curve of `expected`; exactly one present
/// yields a copy of it; both present yields the frame-union combination,
/// vector sum for locations and the quaternion product `a * b` (in that
/// order) for rotations. Pattern curves cannot be combined.
pub fn add_curves(
    a: Option<&Curve>,
    b: Option<&Curve>,
    expected: CurveType,
) -> Result<Curve, Error> {
    let (a, b) = match (a, b) {
        (None, None) => {
            return match expected {
                CurveType::Location => Ok(Curve::identity_location()),
                CurveType::Rotation => Ok(Curve::identity_rotation()),
                other => Err(Error::IncompatibleCurveTypes {
                    left: other.to_string(),
                    right: other.to_string(),
                }),
            };
        }
        (Some(one), None) | (None, Some(one)) => return Ok(one.clone()),
        (Some(a), Some(b)) => (a, b),
    };

    if a.kind() != b.kind() {
        return Err(Error::IncompatibleCurveTypes {
            left: a.kind().to_string(),
            right: b.kind().to_string(),
        });
    }
    if !matches!(a.kind(), CurveType::Location | CurveType::Rotation) {
        return Err(Error::IncompatibleCurveTypes {
            left: a.kind().to_string(),
            right: b.kind().to_string(),
        });
    }

    let mut a = neutralize(a);
    let mut b = neutralize(b);
    let identity = |c: &mut Curve| {
        if c.keyframes.is_empty() {
            c.keyframes.push(match c.kind() {
                CurveType::Location => Keyframe::new(0, KeyValue::Vec3(Vec3::ZERO)),
                _ => Keyframe::new(0, KeyValue::Quat(Quat::IDENTITY)),
            });
        }
    };
    identity(&mut a);
    identity(&mut b);

    let end = a.end_frame().max(b.end_frame());
    let mut keyframes = Vec::new();
    for frame in 0..=end {
        let at_a = a.keyframes.iter().find(|kf| kf.frame == frame);
        let at_b = b.keyframes.iter().find(|kf| kf.frame == frame);
        if at_a.is_none() && at_b.is_none() {
            continue;
        }
        let va = at_a.map_or_else(|| sample(&a.keyframes, frame), |kf| kf.value);
        let vb = at_b.map_or_else(|| sample(&b.keyframes, frame), |kf| kf.value);
        let value = match (va, vb) {
            (KeyValue::Vec3(x), KeyValue::Vec3(y)) => KeyValue::Vec3(x + y),
            (KeyValue::Quat(x), KeyValue::Quat(y)) => KeyValue::Quat(x * y),
            _ => {
                return Err(Error::IncompatibleCurveTypes {
                    left: a.kind().to_string(),
                    right: b.kind().to_string(),
                });
            }
        };
        keyframes.push(Keyframe::new(frame, value));
    }

    let format = match a.kind() {
        CurveType::Location => CurveFormat::PosVec3,
        _ => CurveFormat::RotQuatScaled,
    };
    Ok(Curve::with_keyframes(format, keyframes))
}

/// Samples a neutralized, non-empty keyframe list at a frame that is not
/// necessarily a key. Interpolates between the nearest keys on either side,
/// holding the first/last value outside the keyed range.
fn sample(keyframes: &[Keyframe], frame: u32) -> KeyValue {
    if let Some(kf) = keyframes.iter().find(|kf| kf.frame == frame) {
        return kf.value;
    }
    let less = keyframes
        .iter()
        .filter(|kf| kf.frame < frame)
        .max_by_key(|kf| kf.frame)
        .unwrap_or(&keyframes[0]);
    let more = keyframes
        .iter()
        .filter(|kf| kf.frame > frame)
        .min_by_key(|kf| kf.frame)
        .unwrap_or(&keyframes[keyframes.len() - 1]);
    if less.frame == more.frame {
        return less.value;
    }
    let t = (frame - less.frame) as f32 / (more.frame - less.frame) as f32;
    match (less.value, more.value) {
        (KeyValue::Vec3(a), KeyValue::Vec3(b)) => KeyValue::Vec3(a.lerp(b, t)),
        (KeyValue::Quat(a), KeyValue::Quat(b)) => KeyValue::Quat(a.slerp(b, t)),
        _ => less.value,
    }
}

/// Folds the vector bone's motion into the center bone and resets the
/// vector bone to identity curves.
///
/// Authored cutscene data on the old vector scheme already carries the full
/// motion on the center bone, so only the reset applies there.
pub fn merge_vector(
    center: &mut Bone,
    vector: &mut Bone,
    version: VectorVersion,
    is_auth: bool,
) -> Result<(), Error> {
    if version == VectorVersion::NoVector {
        return Ok(());
    }
    let combine = match version {
        VectorVersion::OldVector => !is_auth,
        VectorVersion::DragonVector => true,
        VectorVersion::NoVector => false,
    };
    if combine {
        center.location = Some(add_curves(
            center.location.as_ref(),
            vector.location.as_ref(),
            CurveType::Location,
        )?);
        center.rotation = Some(add_curves(
            center.rotation.as_ref(),
            vector.rotation.as_ref(),
            CurveType::Rotation,
        )?);
    }
    vector.location = Some(Curve::identity_location());
    vector.rotation = Some(Curve::identity_rotation());
    Ok(())
}

/// Inverse of [`merge_vector`]: copies the center bone's motion onto the
/// vector bone, then restricts each to its half of the split. Under the old
/// scheme the vector bone keeps the horizontal part and (outside authored
/// cutscenes) the center keeps only the vertical part; under the dragon
/// scheme the vector bone takes everything.
pub fn split_vector(center: &mut Bone, vector: &mut Bone, version: VectorVersion, is_auth: bool) {
    if version == VectorVersion::NoVector {
        return;
    }
    vector.location = center.location.clone();
    vector.rotation = center.rotation.clone();

    match version {
        VectorVersion::OldVector => {
            vector.location = vector.location.as_ref().map(project_horizontal);
            if !is_auth {
                center.location = center.location.as_ref().map(project_vertical);
                center.rotation = Some(Curve::identity_rotation());
            }
        }
        VectorVersion::DragonVector => {
            center.location = Some(Curve::identity_location());
            center.rotation = Some(Curve::identity_rotation());
        }
        VectorVersion::NoVector => {}
    }
}

/// Zeroes the vertical (Y) channel of a location curve. A pure-Y curve
/// collapses to a single zero keyframe; X and Z channel curves are
/// unaffected.
pub fn project_horizontal(curve: &Curve) -> Curve {
    match (curve.kind(), curve.channel()) {
        (CurveType::Location, CurveChannel::All) => map_vectors(curve, |v| Vec3::new(v.x, 0.0, v.z)),
        (CurveType::Location, CurveChannel::Y) => zeroed_axis(curve),
        _ => curve.clone(),
    }
}

/// Zeroes the horizontal (X and Z) channels of a location curve. A pure-X
/// or pure-Z curve collapses to a single zero keyframe; Y channel curves
/// are unaffected.
pub fn project_vertical(curve: &Curve) -> Curve {
    match (curve.kind(), curve.channel()) {
        (CurveType::Location, CurveChannel::All) => map_vectors(curve, |v| Vec3::new(0.0, v.y, 0.0)),
        (CurveType::Location, CurveChannel::X | CurveChannel::Z) => zeroed_axis(curve),
        _ => curve.clone(),
    }
}

fn map_vectors(curve: &Curve, f: impl Fn(Vec3) -> Vec3) -> Curve {
    let keyframes = curve
        .keyframes
        .iter()
        .map(|kf| match kf.value {
            KeyValue::Vec3(v) => Keyframe::new(kf.frame, KeyValue::Vec3(f(v))),
            other => Keyframe::new(kf.frame, other),
        })
        .collect();
    let mut out = Curve::with_keyframes(curve.format, keyframes);
    out.delimiter = curve.delimiter;
    out
}

fn zeroed_axis(curve: &Curve) -> Curve {
    Curve::with_keyframes(curve.format, vec![Keyframe::new(0, KeyValue::Axis(0.0))])
}
