//! Bounds-checked binary cursors for the GMT container family.
//!
//! The containers declare their byte order in the header, so both halves
//! carry a runtime endianness flag that can be switched mid-stream once the
//! flag byte has been read. All reads fail with [`Error::OutOfBounds`]
//! instead of panicking; writes grow the buffer as needed.

use crate::Error;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;

#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    cursor: usize,
    big_endian: bool,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cursor: 0,
            big_endian: true,
        }
    }

    pub(crate) fn set_endian(&mut self, big_endian: bool) {
        self.big_endian = big_endian;
    }

    pub(crate) fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.bytes.len() {
            return Err(Error::OutOfBounds {
                offset: pos,
                len: 0,
                size: self.bytes.len(),
            });
        }
        self.cursor = pos;
        Ok(())
    }

    pub(crate) fn skip(&mut self, count: usize) -> Result<(), Error> {
        self.seek(self.cursor + count)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.cursor.checked_add(len).ok_or(Error::OutOfBounds {
            offset: self.cursor,
            len,
            size: self.bytes.len(),
        })?;
        if end > self.bytes.len() {
            return Err(Error::OutOfBounds {
                offset: self.cursor,
                len,
                size: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.take(len)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, Error> {
        let b = self.take(2)?;
        Ok(if self.big_endian {
            BigEndian::read_u16(b)
        } else {
            LittleEndian::read_u16(b)
        })
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(self.read_u16()? as i16)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, Error> {
        let b = self.take(4)?;
        Ok(if self.big_endian {
            BigEndian::read_u32(b)
        } else {
            LittleEndian::read_u32(b)
        })
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads an IEEE binary16 value and widens it to f32.
    pub(crate) fn read_f16(&mut self) -> Result<f32, Error> {
        Ok(f16::from_bits(self.read_u16()?).to_f32())
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Writer {
    buf: Vec<u8>,
    cursor: usize,
    big_endian: bool,
}

impl Writer {
    pub(crate) fn new(big_endian: bool) -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
            big_endian,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.cursor
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Moves the cursor; writing after a backwards seek overwrites in place.
    /// Used for the file-size back-patch.
    pub(crate) fn seek(&mut self, pos: usize) {
        self.cursor = pos;
    }

    /// Zero-pads the buffer so its length is a multiple of `align` and moves
    /// the cursor to the end.
    pub(crate) fn align(&mut self, align: usize) {
        let rem = self.buf.len() % align;
        if rem != 0 {
            self.buf.resize(self.buf.len() + align - rem, 0);
        }
        self.cursor = self.buf.len();
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.cursor + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
    }

    pub(crate) fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub(crate) fn write_i8(&mut self, value: i8) {
        self.write_u8(value as u8);
    }

    pub(crate) fn write_u16(&mut self, value: u16) {
        let mut b = [0u8; 2];
        if self.big_endian {
            BigEndian::write_u16(&mut b, value);
        } else {
            LittleEndian::write_u16(&mut b, value);
        }
        self.write_bytes(&b);
    }

    pub(crate) fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    pub(crate) fn write_u32(&mut self, value: u32) {
        let mut b = [0u8; 4];
        if self.big_endian {
            BigEndian::write_u32(&mut b, value);
        } else {
            LittleEndian::write_u32(&mut b, value);
        }
        self.write_bytes(&b);
    }

    pub(crate) fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Narrows to IEEE binary16 (round to nearest even) before writing.
    pub(crate) fn write_f16(&mut self, value: f32) {
        self.write_u16(f16::from_f32(value).to_bits());
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
