//! Bulk converters for homogeneous primitive arrays (spec §4.C). A plain
//! object/array converter would look up a per-element converter from the
//! cache and dispatch through the visitor for every item; for arrays of
//! `bool`/integers/floats that overhead dominates the actual encode cost.
//! These converters still emit the exact same wire shape (an `Array` header
//! followed by individually-tagged element tokens — MessagePack has no
//! distinct typed-array format) but skip the cache/visitor round-trip and
//! reserve one write span for the whole array up front instead of one per
//! element. No SIMD: a scalar loop over the reserved span is enough to
//! remove the dispatch overhead that actually mattered.

use byteorder::{BigEndian, ByteOrder};

use crate::error::Result;
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::token;

/// A primitive type that can be packed into a pre-sized span in minimal
/// MessagePack form.
pub trait BulkElement: Copy + Sized {
    /// Upper bound on the encoded width of one element (format byte plus
    /// payload), used to size the reserved span.
    const MAX_WIDTH: usize;

    /// Encode `self` into `out` (at least `MAX_WIDTH` bytes), returning the
    /// number of bytes actually used.
    fn encode_into(self, out: &mut [u8]) -> usize;

    fn decode_one(reader: &mut BufferedReader) -> Result<Self>;
}

impl BulkElement for bool {
    const MAX_WIDTH: usize = 1;
    fn encode_into(self, out: &mut [u8]) -> usize {
        out[0] = if self { token::TRUE } else { token::FALSE };
        1
    }
    fn decode_one(reader: &mut BufferedReader) -> Result<Self> {
        reader.read_bool()
    }
}

macro_rules! bulk_unsigned {
    ($ty:ty, $read:ident) => {
        impl BulkElement for $ty {
            const MAX_WIDTH: usize = 9;
            fn encode_into(self, out: &mut [u8]) -> usize {
                encode_unsigned(self as u64, out)
            }
            fn decode_one(reader: &mut BufferedReader) -> Result<Self> {
                reader.$read()
            }
        }
    };
}

macro_rules! bulk_signed {
    ($ty:ty, $read:ident) => {
        impl BulkElement for $ty {
            const MAX_WIDTH: usize = 9;
            fn encode_into(self, out: &mut [u8]) -> usize {
                encode_signed(self as i128, out)
            }
            fn decode_one(reader: &mut BufferedReader) -> Result<Self> {
                reader.$read()
            }
        }
    };
}

bulk_unsigned!(u8, read_u8);
bulk_unsigned!(u16, read_u16);
bulk_unsigned!(u32, read_u32);
bulk_unsigned!(u64, read_u64);
bulk_signed!(i8, read_i8);
bulk_signed!(i16, read_i16);
bulk_signed!(i32, read_i32);
bulk_signed!(i64, read_i64);

impl BulkElement for f32 {
    const MAX_WIDTH: usize = 5;
    fn encode_into(self, out: &mut [u8]) -> usize {
        out[0] = token::FLOAT32;
        BigEndian::write_f32(&mut out[1..5], self);
        5
    }
    fn decode_one(reader: &mut BufferedReader) -> Result<Self> {
        reader.read_f32()
    }
}

impl BulkElement for f64 {
    const MAX_WIDTH: usize = 9;
    fn encode_into(self, out: &mut [u8]) -> usize {
        out[0] = token::FLOAT64;
        BigEndian::write_f64(&mut out[1..9], self);
        9
    }
    fn decode_one(reader: &mut BufferedReader) -> Result<Self> {
        reader.read_f64()
    }
}

fn encode_unsigned(value: u64, out: &mut [u8]) -> usize {
    if value <= token::FIXINT_POSITIVE_MAX as u64 {
        out[0] = value as u8;
        1
    } else if value <= u8::MAX as u64 {
        out[0] = token::UINT8;
        out[1] = value as u8;
        2
    } else if value <= u16::MAX as u64 {
        out[0] = token::UINT16;
        BigEndian::write_u16(&mut out[1..3], value as u16);
        3
    } else if value <= u32::MAX as u64 {
        out[0] = token::UINT32;
        BigEndian::write_u32(&mut out[1..5], value as u32);
        5
    } else {
        out[0] = token::UINT64;
        BigEndian::write_u64(&mut out[1..9], value);
        9
    }
}

fn encode_signed(value: i128, out: &mut [u8]) -> usize {
    if (0..=token::FIXINT_POSITIVE_MAX as i128).contains(&value) {
        out[0] = value as u8;
        1
    } else if (-32..0).contains(&value) {
        out[0] = (value as i8) as u8;
        1
    } else if value >= i8::MIN as i128 && value < 0 {
        out[0] = token::INT8;
        out[1] = (value as i8) as u8;
        2
    } else if value >= 0 {
        encode_unsigned(value as u64, out)
    } else if value >= i16::MIN as i128 {
        out[0] = token::INT16;
        BigEndian::write_i16(&mut out[1..3], value as i16);
        3
    } else if value >= i32::MIN as i128 {
        out[0] = token::INT32;
        BigEndian::write_i32(&mut out[1..5], value as i32);
        5
    } else {
        out[0] = token::INT64;
        BigEndian::write_i64(&mut out[1..9], value as i64);
        9
    }
}

/// Write an array of primitives, reserving one span for the whole payload
/// instead of one `get_span` call per element.
pub fn write_bulk_array<T: BulkElement>(buffer: &mut SegmentBuffer, items: &[T]) {
    StreamWriter::new(buffer).write_array_header(items.len() as u32);
    if items.is_empty() {
        return;
    }
    let span = buffer.get_span(items.len() * T::MAX_WIDTH);
    let mut offset = 0;
    for item in items {
        offset += item.encode_into(&mut span[offset..]);
    }
    let written = offset;
    buffer.advance_write(written);
}

/// Read an array header followed by `count` primitives of the same type.
pub fn read_bulk_array<T: BulkElement>(buffer: &mut SegmentBuffer) -> Result<Vec<T>> {
    let mut reader = BufferedReader::new(buffer);
    let count = reader.read_array_header()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(T::decode_one(&mut reader)?);
    }
    Ok(out)
}
