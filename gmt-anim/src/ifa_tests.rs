use crate::{
    Animation, Bone, BonePose, Curve, CurveFormat, Error, IfaBone, IfaFile, KeyValue, Keyframe,
    Name, RestSkeleton, read_ifa, write_ifa,
};
use glam::{Quat, Vec3};

fn sample_file() -> IfaFile {
    let mut file = IfaFile::new();
    file.bones.push(IfaBone {
        name: Name::new("mabuta_l"),
        parent: Name::new("face"),
        location: Vec3::new(0.25, -1.0, 2.0),
        rotation: Quat::from_xyzw(0.5, 0.0, 0.0, 0.5),
    });
    file.bones.push(IfaBone {
        name: Name::new("kuti_l"),
        parent: Name::new("mabuta_l"),
        location: Vec3::new(0.0, 0.5, 0.0),
        rotation: Quat::IDENTITY,
    });
    file
}

fn face_skeleton() -> RestSkeleton {
    let mut skeleton = RestSkeleton::new();
    skeleton.insert("face", BonePose::identity(None));
    skeleton.insert("mabuta_l", BonePose::identity(Some("face")));
    skeleton.insert("kuti_l", BonePose::identity(Some("mabuta_l")));
    skeleton.insert("kosi_c_n", BonePose::identity(None));
    skeleton
}

#[test]
fn round_trip_preserves_bones() {
    let file = sample_file();
    let bytes = write_ifa(&file).expect("write");
    // Header plus two 0x60 records, no padding; the header stores the size.
    assert_eq!(bytes.len(), 0x20 + 2 * 0x60);
    assert_eq!(&bytes[0xC..0x10], &[0, 0, 0, 0xE0]);

    let back = read_ifa(&bytes).expect("read");
    assert!(back.big_endian);
    assert_eq!(back.bones, file.bones);
}

#[test]
fn rewriting_a_read_file_is_byte_identical() {
    let first = write_ifa(&sample_file()).expect("first write");
    let reread = read_ifa(&first).expect("read");
    let second = write_ifa(&reread).expect("second write");
    assert_eq!(first, second);
}

#[test]
fn rejects_wrong_magic() {
    let bytes = *b"GSFX\x02\x01\x00\x00\x00\x01\x00\x01";
    match read_ifa(&bytes) {
        Err(Error::InvalidMagic { found, .. }) => assert_eq!(found, "GSFX"),
        other => panic!("expected InvalidMagic, got {other:?}"),
    }
}

#[test]
fn rejects_other_versions() {
    let bytes = *b"GSFA\x02\x01\x00\x00\x00\x02\x00\x00";
    match read_ifa(&bytes) {
        Err(Error::UnsupportedVersion { version }) => assert_eq!(version, 0x2_0000),
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn to_animation_expands_single_keyframe_curves() {
    let anm = sample_file().to_animation(Name::new("pose"), 30.0);
    assert_eq!(anm.name.as_str(), "pose");
    assert_eq!(anm.frame_rate, 30.0);
    assert_eq!(anm.bones.len(), 2);
    assert_eq!(anm.computed_end_frame(), 0);

    let bone = anm.bone("mabuta_l").expect("bone");
    let location = bone.location.as_ref().expect("location");
    assert_eq!(location.format, CurveFormat::PosVec3);
    assert_eq!(
        location.keyframes,
        vec![Keyframe::new(0, KeyValue::Vec3(Vec3::new(0.25, -1.0, 2.0)))]
    );
    let rotation = bone.rotation.as_ref().expect("rotation");
    assert_eq!(rotation.format, CurveFormat::RotQuatScaled);
    assert_eq!(
        rotation.keyframes,
        vec![Keyframe::new(
            0,
            KeyValue::Quat(Quat::from_xyzw(0.5, 0.0, 0.0, 0.5))
        )]
    );
}

#[test]
fn from_animation_captures_face_bones_only() {
    let mut eyelid = Bone::new(Name::new("mabuta_l"));
    // A single-axis curve must neutralize into the captured vector.
    eyelid.location = Some(Curve::with_keyframes(
        CurveFormat::PosY,
        vec![Keyframe::new(0, KeyValue::Axis(0.5))],
    ));
    eyelid.rotation = Some(Curve::with_keyframes(
        CurveFormat::RotQuatScaled,
        vec![Keyframe::new(0, KeyValue::Quat(Quat::IDENTITY))],
    ));

    let mut mouth = Bone::new(Name::new("kuti_l"));
    mouth.location = Some(Curve::with_keyframes(
        CurveFormat::PosVec3,
        vec![Keyframe::new(0, KeyValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))],
    ));
    mouth.rotation = Some(Curve::with_keyframes(
        CurveFormat::RotQuatScaled,
        vec![Keyframe::new(0, KeyValue::Quat(Quat::from_xyzw(0.5, 0.0, 0.0, 0.5)))],
    ));

    let mut hip = Bone::new(Name::new("kosi_c_n"));
    hip.location = Some(Curve::identity_location());
    hip.rotation = Some(Curve::identity_rotation());

    let mut anm = Animation::new(Name::new("pose"), 30.0);
    anm.bones.push(eyelid);
    anm.bones.push(mouth);
    anm.bones.push(hip);

    let file = IfaFile::from_animation(&anm, &face_skeleton()).expect("capture");
    assert_eq!(file.bones.len(), 2);

    assert_eq!(file.bones[0].name.as_str(), "mabuta_l");
    assert_eq!(file.bones[0].parent.as_str(), "face");
    assert_eq!(file.bones[0].location, Vec3::new(0.0, 0.5, 0.0));

    assert_eq!(file.bones[1].name.as_str(), "kuti_l");
    assert_eq!(file.bones[1].parent.as_str(), "mabuta_l");
    assert_eq!(file.bones[1].location, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(file.bones[1].rotation, Quat::from_xyzw(0.5, 0.0, 0.0, 0.5));
}

#[test]
fn from_animation_skips_bones_missing_curves() {
    let mut rotation_only = Bone::new(Name::new("mabuta_l"));
    rotation_only.rotation = Some(Curve::identity_rotation());

    let mut keyframeless = Bone::new(Name::new("kuti_l"));
    keyframeless.location = Some(Curve::new(CurveFormat::PosVec3));
    keyframeless.rotation = Some(Curve::new(CurveFormat::RotQuatScaled));

    let mut anm = Animation::new(Name::new("pose"), 30.0);
    anm.bones.push(rotation_only);
    anm.bones.push(keyframeless);

    let file = IfaFile::from_animation(&anm, &face_skeleton()).expect("capture");
    assert!(file.bones.is_empty());
}

#[test]
fn from_animation_requires_a_face_root() {
    let mut skeleton = RestSkeleton::new();
    skeleton.insert("kosi_c_n", BonePose::identity(None));

    let anm = Animation::new(Name::new("pose"), 30.0);
    match IfaFile::from_animation(&anm, &skeleton) {
        Err(Error::MissingBone { bone }) => assert_eq!(bone, "face"),
        other => panic!("expected MissingBone, got {other:?}"),
    }
}
