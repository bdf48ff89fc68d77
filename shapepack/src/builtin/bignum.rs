//! Arbitrary-precision integer converter (spec §4.D "scalar & built-in
//! converters" names an arbitrary-precision integer among the built-ins
//! without committing to a representation). The pack has no grounded
//! arbitrary-precision crate (no `num-bigint`/`rust_decimal` anywhere in
//! the examples), so rather than fabricate a dependency this is a plain
//! sign-magnitude byte buffer, wire-encoded as a `Bin` payload: one sign
//! byte followed by the little-endian magnitude. See `DESIGN.md`.

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::TypeShape;

/// An arbitrary-precision integer, stored as a sign flag plus a
/// little-endian magnitude with no leading zero bytes (beyond a single
/// zero byte representing the value zero itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigInt {
    negative: bool,
    magnitude_le: Vec<u8>,
}

impl BigInt {
    pub fn from_i128(value: i128) -> Self {
        let negative = value < 0;
        let mut magnitude = value.unsigned_abs();
        let mut bytes = Vec::new();
        if magnitude == 0 {
            bytes.push(0);
        }
        while magnitude > 0 {
            bytes.push((magnitude & 0xff) as u8);
            magnitude >>= 8;
        }
        BigInt { negative: negative && !bytes.iter().all(|&b| b == 0), magnitude_le: bytes }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude_le(&self) -> &[u8] {
        &self.magnitude_le
    }
}

pub struct BigIntConverter {
    shape: TypeShape,
}

impl BigIntConverter {
    pub fn new() -> Self {
        BigIntConverter { shape: TypeShape::Primitive }
    }
}

impl Default for BigIntConverter {
    fn default() -> Self {
        BigIntConverter::new()
    }
}

impl Converter<BigInt> for BigIntConverter {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &BigInt) -> Result<()> {
        let mut payload = Vec::with_capacity(1 + value.magnitude_le.len());
        payload.push(if value.negative { 1 } else { 0 });
        payload.extend_from_slice(&value.magnitude_le);
        StreamWriter::new(buffer).write_bytes(&payload);
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<BigInt> {
        let payload = BufferedReader::new(buffer).read_bytes()?;
        let (sign, magnitude) = payload
            .split_first()
            .ok_or_else(|| Error::invalid_data("empty payload for arbitrary-precision integer"))?;
        let negative = match sign {
            0 => false,
            1 => true,
            other => return Err(Error::invalid_data(format!("invalid bignum sign byte {other}"))),
        };
        Ok(BigInt { negative, magnitude_le: magnitude.to_vec() })
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}
