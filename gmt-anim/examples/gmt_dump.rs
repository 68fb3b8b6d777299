//! Prints the structure of a GMT, CMT or IFA file.
//!
//! Usage: `gmt_dump <file> [--keyframes]`. The container kind is taken from
//! the file extension; anything that is not `.cmt` or `.ifa` is read as GMT.

use gmt_anim::{Bone, Curve, KeyValue, read_cmt, read_gmt, read_ifa};
use std::path::PathBuf;

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut keyframes = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--keyframes" => {
                keyframes = true;
                i += 1;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let Some(path) = positional.first().map(PathBuf::from) else {
        eprintln!("usage: gmt_dump <file.gmt|file.cmt|file.ifa> [--keyframes]");
        std::process::exit(2);
    };

    let bytes = std::fs::read(&path).expect("read input");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "cmt" => dump_cmt(&bytes, keyframes),
        "ifa" => dump_ifa(&bytes),
        _ => dump_gmt(&bytes, keyframes),
    }
}

fn dump_gmt(bytes: &[u8], keyframes: bool) {
    let file = read_gmt(bytes).expect("parse gmt");
    println!(
        "gmt '{}' version {:?} {}, flags {:#x}, {} animation(s)",
        file.name,
        file.version,
        endian(file.big_endian),
        file.flags,
        file.animations.len()
    );
    for anm in &file.animations {
        println!(
            "  animation '{}': {} fps, ends at frame {}, {} bone(s)",
            anm.name,
            anm.frame_rate,
            anm.end_frame,
            anm.bones.len()
        );
        for bone in &anm.bones {
            println!("    {}", bone.name);
            dump_bone(bone, keyframes);
        }
    }
}

fn dump_bone(bone: &Bone, keyframes: bool) {
    let labelled = [("location", bone.location.as_ref()), ("rotation", bone.rotation.as_ref())];
    for (label, curve) in labelled {
        if let Some(curve) = curve {
            dump_curve(label, curve, keyframes);
        }
    }
    let patterns = [
        ("pat1", &bone.patterns_hand),
        ("pat2", &bone.patterns_unk),
        ("pat3", &bone.patterns_face),
    ];
    for (label, curves) in patterns {
        for curve in curves {
            dump_curve(label, curve, keyframes);
        }
    }
}

fn dump_curve(label: &str, curve: &Curve, keyframes: bool) {
    println!(
        "      {label} {:?}, {} keyframe(s)",
        curve.format,
        curve.keyframes.len()
    );
    if keyframes {
        for kf in &curve.keyframes {
            println!("        {}: {}", kf.frame, value(kf.value));
        }
    }
}

fn value(v: KeyValue) -> String {
    match v {
        KeyValue::Vec3(v) => format!("({}, {}, {})", v.x, v.y, v.z),
        KeyValue::Axis(a) => format!("{a}"),
        KeyValue::Quat(q) => format!("({}, {}, {}, {})", q.x, q.y, q.z, q.w),
        KeyValue::AxisW(a, w) => format!("({a}, {w})"),
        KeyValue::HandPattern(start, end) => format!("{start} -> {end}"),
        KeyValue::BytePattern(b) => format!("{b}"),
    }
}

fn dump_cmt(bytes: &[u8], keyframes: bool) {
    let file = read_cmt(bytes).expect("parse cmt");
    println!(
        "cmt version {:?} {}, {} animation(s)",
        file.version,
        endian(file.big_endian),
        file.animations.len()
    );
    for (i, anm) in file.animations.iter().enumerate() {
        println!(
            "  animation {i}: {} fps, format {:#x}, {} frame(s)",
            anm.frame_rate,
            anm.format,
            anm.frames.len()
        );
        if keyframes {
            for (frame, f) in anm.frames.iter().enumerate() {
                println!(
                    "    {frame}: position ({}, {}, {}) focus ({}, {}, {}) roll {} fov {}",
                    f.position.x,
                    f.position.y,
                    f.position.z,
                    f.focus.x,
                    f.focus.y,
                    f.focus.z,
                    f.roll,
                    f.fov
                );
            }
        }
    }
}

fn dump_ifa(bytes: &[u8]) {
    let file = read_ifa(bytes).expect("parse ifa");
    println!("ifa {}, {} bone(s)", endian(file.big_endian), file.bones.len());
    for bone in &file.bones {
        println!(
            "  {} (parent {}): location ({}, {}, {}), rotation ({}, {}, {}, {})",
            bone.name,
            bone.parent,
            bone.location.x,
            bone.location.y,
            bone.location.z,
            bone.rotation.x,
            bone.rotation.y,
            bone.rotation.z,
            bone.rotation.w
        );
    }
}

fn endian(big: bool) -> &'static str {
    if big { "big-endian" } else { "little-endian" }
}
