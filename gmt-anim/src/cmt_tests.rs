use crate::{CmtAnimation, CmtFile, CmtFrame, CmtVersion, Error, read_cmt, write_cmt};
use glam::Vec3;

fn sample_file() -> CmtFile {
    let mut cut_a = CmtAnimation::new(30.0);
    cut_a.frames.push(CmtFrame {
        position: Vec3::new(1.0, 2.0, 3.0),
        fov: 0.9,
        focus: Vec3::new(4.0, 5.0, 6.0),
        roll: 0.1,
    });
    cut_a.frames.push(CmtFrame {
        position: Vec3::new(1.5, 2.5, 3.5),
        fov: 0.8,
        focus: Vec3::new(4.0, 5.0, 7.0),
        roll: -0.2,
    });

    let mut cut_b = CmtAnimation::new(60.0);
    cut_b.frames.push(CmtFrame {
        position: Vec3::ZERO,
        fov: 1.2,
        focus: Vec3::new(0.0, 0.0, -10.0),
        roll: 0.0,
    });

    let mut file = CmtFile::new(CmtVersion::Yakuza5);
    file.animations.push(cut_a);
    file.animations.push(cut_b);
    file
}

fn u32_be(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(raw)
}

#[test]
fn round_trip_preserves_frames() {
    let file = sample_file();
    let bytes = write_cmt(&file).expect("write");
    // The header stores the total size; camera files carry no padding.
    assert_eq!(u32_be(&bytes, 0xC) as usize, bytes.len());

    let back = read_cmt(&bytes).expect("read");
    assert_eq!(back.version, CmtVersion::Yakuza5);
    assert!(back.big_endian);
    assert_eq!(back.animations.len(), 2);
    assert_eq!(back.animations[0].frame_rate, 30.0);
    assert_eq!(back.animations[0].frames, file.animations[0].frames);
    assert_eq!(back.animations[1].frame_rate, 60.0);
    assert_eq!(back.animations[1].frames, file.animations[1].frames);
}

#[test]
fn rewriting_a_read_file_is_byte_identical() {
    let first = write_cmt(&sample_file()).expect("first write");
    let reread = read_cmt(&first).expect("read");
    let second = write_cmt(&reread).expect("second write");
    assert_eq!(first, second);
}

#[test]
fn rejects_wrong_magic() {
    let bytes = *b"CMTQ\x02\x01\x00\x00\x00\x04\x00\x00";
    match read_cmt(&bytes) {
        Err(Error::InvalidMagic { found, .. }) => assert_eq!(found, "CMTQ"),
        other => panic!("expected InvalidMagic, got {other:?}"),
    }
}

#[test]
fn rejects_unknown_versions() {
    let bytes = *b"CMTP\x02\x01\x00\x00\x00\x03\x00\x00";
    match read_cmt(&bytes) {
        Err(Error::UnsupportedVersion { version }) => assert_eq!(version, 0x3_0000),
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn rejects_packed_formats_on_read() {
    let mut bytes = write_cmt(&sample_file()).expect("write");
    // Format word of the first animation record.
    bytes[0x2C..0x30].copy_from_slice(&0x1_0000u32.to_be_bytes());
    match read_cmt(&bytes) {
        Err(Error::InvalidValue { message }) => assert!(message.contains("packed")),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn rejects_packed_formats_on_write() {
    let mut file = sample_file();
    file.animations[1].format = 0x1_0000;
    match write_cmt(&file) {
        Err(Error::InvalidValue { message }) => assert!(message.contains("packed")),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

fn assert_vec3(got: Vec3, want: Vec3) {
    assert!(
        (got - want).length() < 1e-5,
        "got {got:?}, expected {want:?}"
    );
}

#[test]
fn view_orientation_looks_at_the_focus() {
    let frame = CmtFrame {
        position: Vec3::ZERO,
        fov: 1.0,
        focus: Vec3::new(0.0, 0.0, -5.0),
        roll: 0.0,
    };
    // Looking down -Z with no roll is the identity orientation.
    let q = frame.view_orientation();
    assert_vec3(q * Vec3::NEG_Z, Vec3::NEG_Z);
    assert_vec3(q * Vec3::Y, Vec3::Y);

    let side = CmtFrame {
        focus: Vec3::new(5.0, 0.0, 0.0),
        ..frame
    };
    let q = side.view_orientation();
    assert_vec3(q * Vec3::NEG_Z, Vec3::X);
    assert_vec3(q * Vec3::Y, Vec3::Y);
}

#[test]
fn roll_turns_around_the_view_axis() {
    let frame = CmtFrame {
        position: Vec3::ZERO,
        fov: 1.0,
        focus: Vec3::new(0.0, 0.0, -5.0),
        roll: std::f32::consts::FRAC_PI_2,
    };
    let q = frame.view_orientation();
    // The view direction is unchanged; the camera's up tips over.
    assert_vec3(q * Vec3::NEG_Z, Vec3::NEG_Z);
    assert_vec3(q * Vec3::Y, Vec3::NEG_X);
}

#[test]
fn from_view_inverts_view_orientation() {
    let frame = CmtFrame {
        position: Vec3::new(1.0, 2.0, 3.0),
        fov: 0.9,
        focus: Vec3::new(4.0, 0.0, -2.0),
        roll: 0.4,
    };
    let distance = (frame.focus - frame.position).length();
    let back = CmtFrame::from_view(frame.position, frame.view_orientation(), frame.fov, distance);

    assert_eq!(back.position, frame.position);
    assert_eq!(back.fov, frame.fov);
    assert_vec3(back.focus, frame.focus);
    assert!((back.roll - frame.roll).abs() < 1e-5, "roll {}", back.roll);
}

#[test]
fn from_view_handles_a_vertical_view() {
    // Straight up leaves no horizon to level against; the fallback basis
    // must still round-trip the roll.
    let frame = CmtFrame {
        position: Vec3::ZERO,
        fov: 1.0,
        focus: Vec3::new(0.0, 8.0, 0.0),
        roll: 0.3,
    };
    let back = CmtFrame::from_view(frame.position, frame.view_orientation(), frame.fov, 8.0);
    assert_vec3(back.focus, frame.focus);
    assert!((back.roll - frame.roll).abs() < 1e-5, "roll {}", back.roll);
}
