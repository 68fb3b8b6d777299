//! GMT container codec.
//!
//! Layout: a 0x80-byte header with eight (count, offset) table descriptors,
//! then 0x40-byte animation records, a table of absolute graph pointers,
//! graph data (shared keyframe-time tables), 32-byte name records, animation
//! maps, bone maps, 16-byte curve records and finally the curve payloads.
//! The byte order is declared by the header and applies to every multi-byte
//! field.
//!
//! The writer never trusts derived state: flat name/graph/curve tables are
//! rebuilt from the animation tree on every write, graphs are de-duplicated
//! by keyframe-time equality, and bones without curves are dropped.

use crate::{
    Animation, Bone, Curve, CurveFormat, CurveType, Error, GmtFile, GmtVersion, KeyValue, Keyframe,
    Name, Reader, Writer, pack_format, parse_format,
};
use glam::{Quat, Vec3};
use log::{debug, warn};

const MAGIC: &[u8; 4] = b"GSGT";
const HEADER_SIZE: usize = 0x80;
const ANM_RECORD_SIZE: usize = 0x40;
const CURVE_RECORD_SIZE: usize = 0x10;

// Packed-quaternion field masks (applied after the 2-bit axis tag is shifted
// out) and the matching scale constants. The fields are not shifted down;
// the constants (2^-30, 2^-20, 2^-10) compensate for their bit positions.
const PACK_MASK_HIGH: u32 = 0x3FF0_0000;
const PACK_MASK_MID: u32 = 0x000F_FC00;
const PACK_MASK_LOW: u32 = 0x0000_03FF;
const PACK_SCALE_HIGH: f32 = f32::from_bits(0x3080_0000);
const PACK_SCALE_MID: f32 = f32::from_bits(0x3580_0000);
const PACK_SCALE_LOW: f32 = f32::from_bits(0x3A80_0000);

/// Shared keyframe-time table. Exists only inside the codec; curves own
/// their keyframes and graphs are rebuilt on write.
#[derive(Clone, Debug, PartialEq)]
struct Graph {
    times: Vec<u32>,
    delimiter: i16,
}

pub fn read_gmt(bytes: &[u8]) -> Result<GmtFile, Error> {
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
    // Reject unknown versions before any table is touched.
    let version = GmtVersion::from_raw(r.read_u32()?)?;
    let _file_size = r.read_u32()?;
    let file_name = Name::read(&mut r)?;

    let anm_count = r.read_u32()? as usize;
    let anm_offset = r.read_u32()? as usize;
    let graph_count = r.read_u32()? as usize;
    let graph_offset = r.read_u32()? as usize;
    let _graph_data_size = r.read_u32()?;
    let _graph_data_offset = r.read_u32()?;
    let name_count = r.read_u32()? as usize;
    let name_offset = r.read_u32()? as usize;
    let _anm_map_count = r.read_u32()?;
    let anm_map_offset = r.read_u32()? as usize;
    let bone_map_count = r.read_u32()? as usize;
    let bone_map_offset = r.read_u32()? as usize;
    let curve_count = r.read_u32()? as usize;
    let curve_offset = r.read_u32()? as usize;
    let _anm_data_size = r.read_u32()?;
    let _anm_data_offset = r.read_u32()?;
    r.skip(12)?;
    let flags = r.read_u32()?;

    debug!(
        "gmt '{file_name}': version {version:?}, {anm_count} animation(s), {bone_map_count} bone(s), {curve_count} curve(s), {graph_count} graph(s)"
    );

    let mut names = Vec::with_capacity(name_count);
    for i in 0..name_count {
        r.seek(name_offset + i * 32)?;
        names.push(Name::read(&mut r)?);
    }

    let mut graphs = Vec::with_capacity(graph_count);
    for i in 0..graph_count {
        r.seek(graph_offset + i * 4)?;
        let data_at = r.read_u32()? as usize;
        r.seek(data_at)?;
        let time_count = r.read_u16()? as usize;
        let mut times = Vec::with_capacity(time_count);
        for _ in 0..time_count {
            times.push(u32::from(r.read_u16()?));
        }
        let delimiter = r.read_i16()?;
        graphs.push(Graph { times, delimiter });
    }

    let mut curves = Vec::with_capacity(curve_count);
    for i in 0..curve_count {
        r.seek(curve_offset + i * CURVE_RECORD_SIZE)?;
        let graph_index = r.read_u32()? as usize;
        let data_offset = r.read_u32()? as usize;
        let property = r.read_u32()?;
        let format_code = r.read_u32()?;

        let graph = graphs.get(graph_index).ok_or_else(|| Error::InvalidValue {
            message: format!(
                "curve {i} references graph {graph_index} of {}",
                graphs.len()
            ),
        })?;

        let format = parse_format(property, format_code, version)?;
        r.seek(data_offset)?;
        let values = decode_values(&mut r, format, graph.times.len())?;

        let keyframes = graph
            .times
            .iter()
            .zip(values)
            .map(|(&frame, value)| Keyframe::new(frame, value))
            .collect();
        curves.push(Curve {
            format,
            delimiter: graph.delimiter,
            keyframes,
        });
    }

    let mut bones = Vec::with_capacity(bone_map_count);
    for i in 0..bone_map_count {
        r.seek(bone_map_offset + i * 4)?;
        let start = r.read_u16()? as usize;
        let count = r.read_u16()? as usize;

        let name = names
            .get(anm_count + i)
            .cloned()
            .ok_or_else(|| Error::InvalidValue {
                message: format!("bone {i} has no name record"),
            })?;
        let mut bone = Bone::new(name);
        for n in 0..count {
            let curve = curves.get(start + n).cloned().ok_or_else(|| {
                Error::InvalidValue {
                    message: format!(
                        "bone '{}' references curve {} of {}",
                        bone.name,
                        start + n,
                        curves.len()
                    ),
                }
            })?;
            attach_curve(&mut bone, curve);
        }
        bones.push(bone);
    }

    let mut animations = Vec::with_capacity(anm_count);
    for i in 0..anm_count {
        r.seek(anm_offset + i * ANM_RECORD_SIZE)?;
        r.skip(4)?;
        let end_frame = r.read_u32()?;
        let _name_index = r.read_u32()?;
        let frame_rate = r.read_f32()?;
        let index1 = r.read_u32()?;
        let index2 = r.read_u32()?;
        // The remaining record fields (bone map range, curve/graph counts,
        // data sizes and offsets) are informational; the maps below are the
        // source of truth.

        let name = names.get(i).cloned().ok_or_else(|| Error::InvalidValue {
            message: format!("animation {i} has no name record"),
        })?;

        r.seek(anm_map_offset + i * 4)?;
        let start = r.read_u16()? as usize;
        let count = r.read_u16()? as usize;

        let mut anm_bones = Vec::with_capacity(count);
        for b in 0..count {
            let index = start
                .checked_sub(anm_count)
                .map(|s| s + b)
                .ok_or_else(|| Error::InvalidValue {
                    message: format!("animation '{name}' has a bone map start below {anm_count}"),
                })?;
            let bone_total = bones.len();
            let bone = bones.get_mut(index).ok_or_else(|| Error::InvalidValue {
                message: format!("animation '{name}' references bone {index} of {bone_total}"),
            })?;
            anm_bones.push(std::mem::take(bone));
        }

        animations.push(Animation {
            name,
            frame_rate,
            end_frame,
            unknown_indices: [index1, index2],
            bones: anm_bones,
        });
    }

    Ok(GmtFile {
        name: file_name,
        version,
        big_endian,
        flags,
        animations,
    })
}

/// First location and rotation curve win their slot; pattern curves append.
fn attach_curve(bone: &mut Bone, curve: Curve) {
    match curve.kind() {
        CurveType::Location => {
            if bone.location.is_none() {
                bone.location = Some(curve);
            } else {
                warn!(
                    "bone '{}' has more than one location curve, keeping the first",
                    bone.name
                );
            }
        }
        CurveType::Rotation => {
            if bone.rotation.is_none() {
                bone.rotation = Some(curve);
            } else {
                warn!(
                    "bone '{}' has more than one rotation curve, keeping the first",
                    bone.name
                );
            }
        }
        CurveType::PatternHand => bone.patterns_hand.push(curve),
        CurveType::PatternUnk => bone.patterns_unk.push(curve),
        CurveType::PatternFace => bone.patterns_face.push(curve),
    }
}

fn decode_values(
    r: &mut Reader<'_>,
    format: CurveFormat,
    count: usize,
) -> Result<Vec<KeyValue>, Error> {
    let mut values = Vec::with_capacity(count);
    match format {
        CurveFormat::PosVec3 => {
            for _ in 0..count {
                let x = r.read_f32()?;
                let y = r.read_f32()?;
                let z = r.read_f32()?;
                values.push(KeyValue::Vec3(Vec3::new(x, y, z)));
            }
        }
        CurveFormat::PosX | CurveFormat::PosY | CurveFormat::PosZ => {
            for _ in 0..count {
                values.push(KeyValue::Axis(r.read_f32()?));
            }
        }
        CurveFormat::RotQuatScaled => {
            for _ in 0..count {
                let mut q = [0.0f32; 4];
                for v in &mut q {
                    *v = f32::from(r.read_i16()?) / 16_384.0;
                }
                values.push(KeyValue::Quat(Quat::from_xyzw(q[0], q[1], q[2], q[3])));
            }
        }
        CurveFormat::RotQuatHalfFloat => {
            for _ in 0..count {
                let x = r.read_f16()?;
                let y = r.read_f16()?;
                let z = r.read_f16()?;
                let w = r.read_f16()?;
                values.push(KeyValue::Quat(Quat::from_xyzw(x, y, z, w)));
            }
        }
        CurveFormat::RotQuatXyzFloat => {
            for _ in 0..count {
                let x = r.read_f32()?;
                let y = r.read_f32()?;
                let z = r.read_f32()?;
                let w = (1.0 - (x * x + y * y + z * z)).max(0.0).sqrt();
                values.push(KeyValue::Quat(Quat::from_xyzw(x, y, z, w)));
            }
        }
        CurveFormat::RotXwFloat | CurveFormat::RotYwFloat | CurveFormat::RotZwFloat => {
            for _ in 0..count {
                let axis = r.read_f32()?;
                let w = r.read_f32()?;
                values.push(KeyValue::AxisW(axis, w));
            }
        }
        CurveFormat::RotXwHalfFloat | CurveFormat::RotYwHalfFloat | CurveFormat::RotZwHalfFloat => {
            for _ in 0..count {
                let axis = r.read_f16()?;
                let w = r.read_f16()?;
                values.push(KeyValue::AxisW(axis, w));
            }
        }
        CurveFormat::RotXwScaled | CurveFormat::RotYwScaled | CurveFormat::RotZwScaled => {
            for _ in 0..count {
                let axis = f32::from(r.read_i16()?) / 16_384.0;
                let w = f32::from(r.read_i16()?) / 16_384.0;
                values.push(KeyValue::AxisW(axis, w));
            }
        }
        CurveFormat::RotQuatIntScaled => {
            let mut base = [0.0f32; 4];
            for v in &mut base {
                *v = f32::from(r.read_i16()?) / 32_768.0;
            }
            let mut scale = [0.0f32; 4];
            for v in &mut scale {
                *v = f32::from(r.read_u16()?) / 32_768.0;
            }
            for _ in 0..count {
                let packed = r.read_u32()?;
                let dropped = (packed & 3) as usize;
                let f = packed >> 2;
                let fields = [
                    (f & PACK_MASK_HIGH) as f32 * PACK_SCALE_HIGH,
                    (f & PACK_MASK_MID) as f32 * PACK_SCALE_MID,
                    (f & PACK_MASK_LOW) as f32 * PACK_SCALE_LOW,
                ];

                let mut q = [0.0f32; 4];
                let mut next = 0;
                for (i, slot) in q.iter_mut().enumerate() {
                    if i == dropped {
                        continue;
                    }
                    *slot = fields[next] * scale[i] + base[i];
                    next += 1;
                }
                let kept: f32 = q
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != dropped)
                    .map(|(_, v)| v * v)
                    .sum();
                q[dropped] = (1.0 - kept).max(0.0).sqrt();

                values.push(KeyValue::Quat(Quat::from_xyzw(q[0], q[1], q[2], q[3])));
            }
        }
        CurveFormat::PatHand { .. } => {
            for _ in 0..count {
                let start = r.read_i16()?;
                let end = r.read_i16()?;
                values.push(KeyValue::HandPattern(start, end));
            }
        }
        CurveFormat::PatUnk { .. } | CurveFormat::PatFace { .. } | CurveFormat::PatRaw { .. } => {
            for _ in 0..count {
                values.push(KeyValue::BytePattern(r.read_i8()?));
            }
        }
    }
    Ok(values)
}

fn expect_vec3(kf: &Keyframe) -> Result<Vec3, Error> {
    match kf.value {
        KeyValue::Vec3(v) => Ok(v),
        _ => Err(value_mismatch(kf, "full location")),
    }
}

fn expect_axis(kf: &Keyframe) -> Result<f32, Error> {
    match kf.value {
        KeyValue::Axis(v) => Ok(v),
        _ => Err(value_mismatch(kf, "single-axis location")),
    }
}

fn expect_quat(kf: &Keyframe) -> Result<Quat, Error> {
    match kf.value {
        KeyValue::Quat(q) => Ok(q),
        _ => Err(value_mismatch(kf, "full rotation")),
    }
}

fn expect_axis_w(kf: &Keyframe) -> Result<(f32, f32), Error> {
    match kf.value {
        KeyValue::AxisW(axis, w) => Ok((axis, w)),
        _ => Err(value_mismatch(kf, "axis+w rotation")),
    }
}

fn expect_hand(kf: &Keyframe) -> Result<(i16, i16), Error> {
    match kf.value {
        KeyValue::HandPattern(s, e) => Ok((s, e)),
        _ => Err(value_mismatch(kf, "hand pattern")),
    }
}

fn expect_byte(kf: &Keyframe) -> Result<i8, Error> {
    match kf.value {
        KeyValue::BytePattern(v) => Ok(v),
        _ => Err(value_mismatch(kf, "byte pattern")),
    }
}

fn value_mismatch(kf: &Keyframe, expected: &str) -> Error {
    Error::InvalidValue {
        message: format!("keyframe at frame {} does not carry a {expected} value", kf.frame),
    }
}

fn encode_values(w: &mut Writer, format: CurveFormat, curve: &Curve) -> Result<(), Error> {
    match format {
        CurveFormat::PosVec3 => {
            for kf in &curve.keyframes {
                let v = expect_vec3(kf)?;
                w.write_f32(v.x);
                w.write_f32(v.y);
                w.write_f32(v.z);
            }
        }
        CurveFormat::PosX | CurveFormat::PosY | CurveFormat::PosZ => {
            for kf in &curve.keyframes {
                w.write_f32(expect_axis(kf)?);
            }
        }
        CurveFormat::RotQuatScaled => {
            for kf in &curve.keyframes {
                let q = expect_quat(kf)?;
                for v in [q.x, q.y, q.z, q.w] {
                    w.write_i16((v * 16_384.0) as i16);
                }
            }
        }
        CurveFormat::RotQuatHalfFloat => {
            for kf in &curve.keyframes {
                let q = expect_quat(kf)?;
                for v in [q.x, q.y, q.z, q.w] {
                    w.write_f16(v);
                }
            }
        }
        CurveFormat::RotXwScaled | CurveFormat::RotYwScaled | CurveFormat::RotZwScaled => {
            for kf in &curve.keyframes {
                let (axis, quat_w) = expect_axis_w(kf)?;
                w.write_i16((axis * 16_384.0) as i16);
                w.write_i16((quat_w * 16_384.0) as i16);
            }
        }
        CurveFormat::RotXwFloat | CurveFormat::RotYwFloat | CurveFormat::RotZwFloat => {
            for kf in &curve.keyframes {
                let (axis, quat_w) = expect_axis_w(kf)?;
                w.write_f32(axis);
                w.write_f32(quat_w);
            }
        }
        CurveFormat::RotXwHalfFloat | CurveFormat::RotYwHalfFloat | CurveFormat::RotZwHalfFloat => {
            for kf in &curve.keyframes {
                let (axis, quat_w) = expect_axis_w(kf)?;
                w.write_f16(axis);
                w.write_f16(quat_w);
            }
        }
        CurveFormat::PatHand { .. } => {
            for kf in &curve.keyframes {
                let (start, end) = expect_hand(kf)?;
                w.write_i16(start);
                w.write_i16(end);
            }
        }
        CurveFormat::PatUnk { .. } | CurveFormat::PatFace { .. } | CurveFormat::PatRaw { .. } => {
            for kf in &curve.keyframes {
                w.write_i8(expect_byte(kf)?);
            }
        }
        CurveFormat::RotQuatXyzFloat | CurveFormat::RotQuatIntScaled => {
            return Err(Error::InvalidValue {
                message: format!("{format:?} is a read-only format"),
            });
        }
    }
    Ok(())
}

/// Per-animation layout computed during the rebuild pass.
struct AnimLayout {
    /// Indices into the flat curve list.
    curves: std::ops::Range<usize>,
    /// Indices of emitted bones, flat across all animations.
    bones: std::ops::Range<usize>,
    /// Distinct graphs used by this animation, first occurrence order.
    graph_ids: Vec<usize>,
    end_frame: u32,
}

pub fn write_gmt(file: &GmtFile) -> Result<Vec<u8>, Error> {
    let version = file.version;
    let big_endian = file.big_endian;

    // Rebuild pass: names, flat bone/curve lists, de-duplicated graphs.
    let mut names: Vec<&Name> = file.animations.iter().map(|a| &a.name).collect();
    let mut flat_bones: Vec<&Bone> = Vec::new();
    let mut flat_curves: Vec<&Curve> = Vec::new();
    let mut curve_graph: Vec<usize> = Vec::new();
    let mut graphs: Vec<Graph> = Vec::new();
    let mut layouts: Vec<AnimLayout> = Vec::with_capacity(file.animations.len());

    for anm in &file.animations {
        let bone_start = flat_bones.len();
        let curve_start = flat_curves.len();
        let mut graph_ids = Vec::new();
        let mut end_frame = 0u32;

        for bone in &anm.bones {
            if bone.curve_count() == 0 {
                continue;
            }
            flat_bones.push(bone);
            for curve in bone.curves() {
                let times = curve_times(curve)?;
                end_frame = end_frame.max(times.last().copied().unwrap_or(0));

                let graph_id = match graphs.iter().position(|g| g.times == times) {
                    Some(id) => id,
                    None => {
                        graphs.push(Graph {
                            times,
                            delimiter: curve.delimiter,
                        });
                        graphs.len() - 1
                    }
                };
                if !graph_ids.contains(&graph_id) {
                    graph_ids.push(graph_id);
                }
                curve_graph.push(graph_id);
                flat_curves.push(curve);
            }
        }

        names.extend(
            anm.bones
                .iter()
                .filter(|b| b.curve_count() > 0)
                .map(|b| &b.name),
        );
        layouts.push(AnimLayout {
            curves: curve_start..flat_curves.len(),
            bones: bone_start..flat_bones.len(),
            graph_ids,
            end_frame,
        });
    }

    // Section buffers with offsets still relative to their own section.
    let mut graphs_buf = Writer::new(big_endian);
    let mut graph_rel = Vec::with_capacity(graphs.len());
    let mut graph_sizes = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        graph_rel.push(graphs_buf.pos());
        let start = graphs_buf.pos();
        graphs_buf.write_u16(cast_u16(graph.times.len(), "graph keyframe count")?);
        for &t in &graph.times {
            graphs_buf.write_u16(cast_u16(t as usize, "keyframe time")?);
        }
        graphs_buf.write_i16(graph.delimiter);
        graph_sizes.push(graphs_buf.pos() - start);
    }
    graphs_buf.align(0x40);

    let mut names_buf = Writer::new(big_endian);
    for name in &names {
        name.write(&mut names_buf);
    }

    let mut anm_maps = Writer::new(big_endian);
    let mut name_cursor = file.animations.len();
    for layout in &layouts {
        anm_maps.write_u16(cast_u16(name_cursor, "animation map start")?);
        anm_maps.write_u16(cast_u16(layout.bones.len(), "animation bone count")?);
        name_cursor += layout.bones.len();
    }
    anm_maps.align(0x20);

    let mut bone_maps = Writer::new(big_endian);
    let mut curve_cursor = 0usize;
    for bone in &flat_bones {
        bone_maps.write_u16(cast_u16(curve_cursor, "bone map start")?);
        bone_maps.write_u16(cast_u16(bone.curve_count(), "bone curve count")?);
        curve_cursor += bone.curve_count();
    }
    bone_maps.align(0x20);

    let mut data_buf = Writer::new(big_endian);
    let mut data_rel = Vec::with_capacity(flat_curves.len());
    let mut data_sizes = Vec::with_capacity(flat_curves.len());
    for curve in &flat_curves {
        let start = data_buf.pos();
        data_rel.push(start);
        encode_values(&mut data_buf, curve.format.normalized(version), curve)?;
        data_sizes.push(data_buf.pos() - start);
    }
    data_buf.align(0x40);

    // Absolute section offsets.
    let anm_alloc = ANM_RECORD_SIZE * file.animations.len();
    let graph_table_len = round_up(4 * graphs.len(), 0x10);
    let graphs_off = HEADER_SIZE + anm_alloc + graph_table_len;
    let names_off = graphs_off + graphs_buf.len();
    let anm_maps_off = names_off + names_buf.len();
    let bone_maps_off = anm_maps_off + anm_maps.len();
    let curves_off = bone_maps_off + bone_maps.len();
    let data_off = curves_off + CURVE_RECORD_SIZE * flat_curves.len();

    let graph_abs: Vec<usize> = graph_rel.iter().map(|&o| o + graphs_off).collect();
    let data_abs: Vec<usize> = data_rel.iter().map(|&o| o + data_off).collect();

    let mut graph_table = Writer::new(big_endian);
    for &off in &graph_abs {
        graph_table.write_u32(off as u32);
    }
    graph_table.align(0x10);

    let mut curves_buf = Writer::new(big_endian);
    for (i, curve) in flat_curves.iter().enumerate() {
        curves_buf.write_u32(curve_graph[i] as u32);
        curves_buf.write_u32(data_abs[i] as u32);
        let (property, format_code) = pack_format(curve.format.normalized(version));
        curves_buf.write_u32(property);
        curves_buf.write_u32(format_code);
    }

    let mut anms_buf = Writer::new(big_endian);
    for (i, (anm, layout)) in file.animations.iter().zip(&layouts).enumerate() {
        anms_buf.write_u32(0);
        anms_buf.write_u32(layout.end_frame);
        anms_buf.write_u32(i as u32);
        anms_buf.write_f32(anm.frame_rate);
        anms_buf.write_u32(anm.unknown_indices[0]);
        anms_buf.write_u32(anm.unknown_indices[1]);
        anms_buf.write_u32(layout.bones.start as u32);
        anms_buf.write_u32(layout.bones.len() as u32);
        anms_buf.write_u32(layout.curves.len() as u32);
        anms_buf.write_u32(layout.graph_ids.first().copied().unwrap_or(0) as u32);
        anms_buf.write_u32(layout.graph_ids.len() as u32);

        let data_size: usize = layout.curves.clone().map(|c| data_sizes[c]).sum();
        anms_buf.write_u32(data_size as u32);
        anms_buf.write_u32(
            layout
                .curves
                .clone()
                .next()
                .map_or(0, |c| data_abs[c] as u32),
        );

        let graph_size: usize = layout.graph_ids.iter().map(|&g| graph_sizes[g]).sum();
        anms_buf.write_u32(graph_size as u32);
        anms_buf.write_u32(
            layout
                .graph_ids
                .first()
                .map_or(0, |&g| graph_abs[g] as u32),
        );

        anms_buf.write_u32(0);
    }

    // Header and final assembly.
    let mut out = Writer::new(big_endian);
    out.write_bytes(MAGIC);
    out.write_u8(2);
    out.write_u8(u8::from(big_endian));
    out.write_u16(0);
    out.write_u32(version.raw());
    out.write_u32(0); // file size, patched below
    file.name.write(&mut out);

    out.write_u32(file.animations.len() as u32);
    out.write_u32(HEADER_SIZE as u32);
    out.write_u32(graphs.len() as u32);
    out.write_u32((HEADER_SIZE + anm_alloc) as u32);
    out.write_u32(graphs_buf.len() as u32);
    out.write_u32(graphs_off as u32);
    out.write_u32(names.len() as u32);
    out.write_u32(names_off as u32);
    out.write_u32(file.animations.len() as u32);
    out.write_u32(anm_maps_off as u32);
    out.write_u32(flat_bones.len() as u32);
    out.write_u32(bone_maps_off as u32);
    out.write_u32(flat_curves.len() as u32);
    out.write_u32(curves_off as u32);
    out.write_u32(data_buf.len() as u32);
    out.write_u32(data_off as u32);
    out.write_u32(0);
    out.write_u32(0);
    out.write_u32(0);
    out.write_u32(file.flags);

    out.write_bytes(&anms_buf.into_bytes());
    out.write_bytes(&graph_table.into_bytes());
    out.write_bytes(&graphs_buf.into_bytes());
    out.write_bytes(&names_buf.into_bytes());
    out.write_bytes(&anm_maps.into_bytes());
    out.write_bytes(&bone_maps.into_bytes());
    out.write_bytes(&curves_buf.into_bytes());
    out.write_bytes(&data_buf.into_bytes());

    let file_size = out.len();
    out.seek(0xC);
    out.write_u32(file_size as u32);
    out.align(0x100);

    Ok(out.into_bytes())
}

fn curve_times(curve: &Curve) -> Result<Vec<u32>, Error> {
    let mut times = Vec::with_capacity(curve.keyframes.len());
    for kf in &curve.keyframes {
        if kf.frame > u32::from(u16::MAX) {
            return Err(Error::InvalidValue {
                message: format!("keyframe time {} does not fit 16 bits", kf.frame),
            });
        }
        times.push(kf.frame);
    }
    Ok(times)
}

fn cast_u16(value: usize, what: &str) -> Result<u16, Error> {
    u16::try_from(value).map_err(|_| Error::InvalidValue {
        message: format!("{what} {value} does not fit 16 bits"),
    })
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}
