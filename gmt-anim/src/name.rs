//! 32-byte checksummed name records.
//!
//! Bone, animation and file names are stored as a `u16` checksum followed by
//! 30 bytes of NUL-padded Shift-JIS. The checksum is the wrapping byte sum of
//! the encoded name; it is derived data, so [`Name`] recomputes it at
//! construction and on read rather than trusting the stored value.

use crate::{Error, Reader, Writer};
use encoding_rs::SHIFT_JIS;
use std::fmt;

const PAYLOAD_LEN: usize = 30;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name {
    value: String,
    checksum: u16,
}

impl Name {
    /// Builds a name, truncating the value so its Shift-JIS encoding fits the
    /// 30-byte payload.
    pub fn new(value: impl Into<String>) -> Self {
        let mut value: String = value.into();
        let mut encoded = encode(&value);
        while encoded.len() > PAYLOAD_LEN {
            value.pop();
            encoded = encode(&value);
        }
        let checksum = byte_sum(&encoded);
        Self { value, checksum }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, Error> {
        // The stored checksum is derived data; skip it and recompute.
        reader.skip(2)?;
        let raw = reader.read_bytes(PAYLOAD_LEN)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(PAYLOAD_LEN);
        let (value, _, _) = SHIFT_JIS.decode(&raw[..end]);
        Ok(Self::new(value.into_owned()))
    }

    pub(crate) fn write(&self, writer: &mut Writer) {
        let encoded = encode(&self.value);
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..encoded.len()].copy_from_slice(&encoded);
        writer.write_u16(self.checksum);
        writer.write_bytes(&payload);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn encode(value: &str) -> Vec<u8> {
    let (bytes, _, _) = SHIFT_JIS.encode(value);
    bytes.into_owned()
}

fn byte_sum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
}
