use crate::{Error, Reader, Writer};

#[test]
fn reader_switches_endianness_mid_stream() {
    let bytes = [0x12, 0x34, 0x12, 0x34];
    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_u16().expect("big"), 0x1234);
    r.set_endian(false);
    assert_eq!(r.read_u16().expect("little"), 0x3412);
}

#[test]
fn reader_rejects_reads_past_the_end() {
    let bytes = [0u8; 4];
    let mut r = Reader::new(&bytes);
    r.seek(2).expect("seek");
    match r.read_u32() {
        Err(Error::OutOfBounds { offset, len, size }) => {
            assert_eq!(offset, 2);
            assert_eq!(len, 4);
            assert_eq!(size, 4);
        }
        other => panic!("expected OutOfBounds, got {other:?}"),
    }
}

#[test]
fn reader_rejects_seek_past_the_end() {
    let bytes = [0u8; 4];
    let mut r = Reader::new(&bytes);
    assert!(r.seek(4).is_ok(), "seek to end is allowed");
    assert!(r.seek(5).is_err());
}

#[test]
fn reader_decodes_half_floats() {
    // 1.0 and -2.0 as binary16.
    let bytes = [0x3C, 0x00, 0xC0, 0x00];
    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_f16().expect("first"), 1.0);
    assert_eq!(r.read_f16().expect("second"), -2.0);
}

#[test]
fn reader_signed_reads() {
    let bytes = [0xFF, 0xFE, 0x80];
    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_i16().expect("i16"), -2);
    assert_eq!(r.read_i8().expect("i8"), -128);
}

#[test]
fn writer_backpatches_without_growing() {
    let mut w = Writer::new(true);
    w.write_u32(0);
    w.write_u32(0xAABBCCDD);
    w.seek(0);
    w.write_u32(8);
    let bytes = w.into_bytes();
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[..4], &[0, 0, 0, 8]);
    assert_eq!(&bytes[4..], &[0xAA, 0xBB, 0xCC, 0xDD]);
}

#[test]
fn writer_overwrite_spanning_the_end_extends() {
    let mut w = Writer::new(true);
    w.write_u16(0x0102);
    w.seek(1);
    w.write_u16(0x0304);
    assert_eq!(w.into_bytes(), vec![0x01, 0x03, 0x04]);
}

#[test]
fn writer_aligns_with_zero_padding() {
    let mut w = Writer::new(true);
    w.write_bytes(&[1, 2, 3]);
    w.align(0x10);
    assert_eq!(w.len(), 0x10);
    assert_eq!(w.pos(), 0x10);
    let bytes = w.into_bytes();
    assert!(bytes[3..].iter().all(|&b| b == 0));
}

#[test]
fn writer_align_on_boundary_is_a_no_op() {
    let mut w = Writer::new(true);
    w.write_bytes(&[0; 0x20]);
    w.align(0x20);
    assert_eq!(w.len(), 0x20);
}

#[test]
fn writer_little_endian_words() {
    let mut w = Writer::new(false);
    w.write_u16(0x1234);
    w.write_u32(0xAABBCCDD);
    assert_eq!(w.into_bytes(), vec![0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA]);
}

#[test]
fn writer_reader_round_trip() {
    let mut w = Writer::new(true);
    w.write_i16(-1234);
    w.write_f32(3.5);
    w.write_f16(0.25);
    let bytes = w.into_bytes();

    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_i16().expect("i16"), -1234);
    assert_eq!(r.read_f32().expect("f32"), 3.5);
    assert_eq!(r.read_f16().expect("f16"), 0.25);
}
