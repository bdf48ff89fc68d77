//! The streaming write side (spec §4.A/§4.B): encodes values directly into a
//! [`SegmentBuffer`]'s tail via `get_span`/`advance_write`, choosing the
//! shortest wire representation for each value (minimal-form integers,
//! fixed-size family selection for extensions).

use byteorder::{BigEndian, ByteOrder};

use crate::io::buffer::SegmentBuffer;
use crate::token;

pub struct StreamWriter<'b> {
    buffer: &'b mut SegmentBuffer,
}

impl<'b> StreamWriter<'b> {
    pub fn new(buffer: &'b mut SegmentBuffer) -> Self {
        StreamWriter { buffer }
    }

    fn put(&mut self, bytes: &[u8]) {
        let span = self.buffer.get_span(bytes.len());
        span[..bytes.len()].copy_from_slice(bytes);
        self.buffer.advance_write(bytes.len());
    }

    pub fn write_nil(&mut self) {
        self.put(&[token::NIL]);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.put(&[if value { token::TRUE } else { token::FALSE }]);
    }

    /// Encode a signed integer in the shortest form that round-trips it.
    pub fn write_integer(&mut self, value: i128) {
        if (0..=token::FIXINT_POSITIVE_MAX as i128).contains(&value) {
            self.put(&[value as u8]);
            return;
        }
        if (-32..0).contains(&value) {
            self.put(&[(value as i8) as u8]);
            return;
        }
        if value >= 0 {
            let v = value as u64;
            if v <= u8::MAX as u64 {
                self.put(&[token::UINT8, v as u8]);
            } else if v <= u16::MAX as u64 {
                let mut buf = [0u8; 3];
                buf[0] = token::UINT16;
                BigEndian::write_u16(&mut buf[1..], v as u16);
                self.put(&buf);
            } else if v <= u32::MAX as u64 {
                let mut buf = [0u8; 5];
                buf[0] = token::UINT32;
                BigEndian::write_u32(&mut buf[1..], v as u32);
                self.put(&buf);
            } else {
                let mut buf = [0u8; 9];
                buf[0] = token::UINT64;
                BigEndian::write_u64(&mut buf[1..], v);
                self.put(&buf);
            }
        } else {
            let v = value as i64;
            if v >= i8::MIN as i64 {
                self.put(&[token::INT8, v as i8 as u8]);
            } else if v >= i16::MIN as i64 {
                let mut buf = [0u8; 3];
                buf[0] = token::INT16;
                BigEndian::write_i16(&mut buf[1..], v as i16);
                self.put(&buf);
            } else if v >= i32::MIN as i64 {
                let mut buf = [0u8; 5];
                buf[0] = token::INT32;
                BigEndian::write_i32(&mut buf[1..], v as i32);
                self.put(&buf);
            } else {
                let mut buf = [0u8; 9];
                buf[0] = token::INT64;
                BigEndian::write_i64(&mut buf[1..], v);
                self.put(&buf);
            }
        }
    }

    /// Encode an unsigned integer, preferring the unsigned family even for
    /// values that would also fit a signed form (matches the teacher's
    /// `write_uint` convention of never emitting a signed tag for unsigned
    /// inputs).
    pub fn write_unsigned(&mut self, value: u64) {
        if value <= token::FIXINT_POSITIVE_MAX as u64 {
            self.put(&[value as u8]);
        } else if value <= u8::MAX as u64 {
            self.put(&[token::UINT8, value as u8]);
        } else if value <= u16::MAX as u64 {
            let mut buf = [0u8; 3];
            buf[0] = token::UINT16;
            BigEndian::write_u16(&mut buf[1..], value as u16);
            self.put(&buf);
        } else if value <= u32::MAX as u64 {
            let mut buf = [0u8; 5];
            buf[0] = token::UINT32;
            BigEndian::write_u32(&mut buf[1..], value as u32);
            self.put(&buf);
        } else {
            let mut buf = [0u8; 9];
            buf[0] = token::UINT64;
            BigEndian::write_u64(&mut buf[1..], value);
            self.put(&buf);
        }
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut buf = [0u8; 5];
        buf[0] = token::FLOAT32;
        BigEndian::write_f32(&mut buf[1..], value);
        self.put(&buf);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut buf = [0u8; 9];
        buf[0] = token::FLOAT64;
        BigEndian::write_f64(&mut buf[1..], value);
        self.put(&buf);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_string_bytes(value.as_bytes());
    }

    pub fn write_string_bytes(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len <= 31 {
            self.put(&[token::FIXSTR_MASK | len as u8]);
        } else if len <= u8::MAX as usize {
            self.put(&[token::STR8, len as u8]);
        } else if len <= u16::MAX as usize {
            let mut header = [0u8; 3];
            header[0] = token::STR16;
            BigEndian::write_u16(&mut header[1..], len as u16);
            self.put(&header);
        } else {
            let mut header = [0u8; 5];
            header[0] = token::STR32;
            BigEndian::write_u32(&mut header[1..], len as u32);
            self.put(&header);
        }
        self.put(bytes);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len <= u8::MAX as usize {
            self.put(&[token::BIN8, len as u8]);
        } else if len <= u16::MAX as usize {
            let mut header = [0u8; 3];
            header[0] = token::BIN16;
            BigEndian::write_u16(&mut header[1..], len as u16);
            self.put(&header);
        } else {
            let mut header = [0u8; 5];
            header[0] = token::BIN32;
            BigEndian::write_u32(&mut header[1..], len as u32);
            self.put(&header);
        }
        self.put(bytes);
    }

    pub fn write_array_header(&mut self, len: u32) {
        if len <= 15 {
            self.put(&[token::FIXARRAY_MASK | len as u8]);
        } else if len <= u16::MAX as u32 {
            let mut header = [0u8; 3];
            header[0] = token::ARRAY16;
            BigEndian::write_u16(&mut header[1..], len as u16);
            self.put(&header);
        } else {
            let mut header = [0u8; 5];
            header[0] = token::ARRAY32;
            BigEndian::write_u32(&mut header[1..], len);
            self.put(&header);
        }
    }

    pub fn write_map_header(&mut self, len: u32) {
        if len <= 15 {
            self.put(&[token::FIXMAP_MASK | len as u8]);
        } else if len <= u16::MAX as u32 {
            let mut header = [0u8; 3];
            header[0] = token::MAP16;
            BigEndian::write_u16(&mut header[1..], len as u16);
            self.put(&header);
        } else {
            let mut header = [0u8; 5];
            header[0] = token::MAP32;
            BigEndian::write_u32(&mut header[1..], len);
            self.put(&header);
        }
    }

    /// Write an extension, choosing a `FixExt` family when the payload
    /// length is exactly 1/2/4/8/16 bytes and falling back to `Ext8/16/32`
    /// otherwise.
    pub fn write_extension(&mut self, tag: i8, payload: &[u8]) {
        let len = payload.len();
        match len {
            1 => self.put(&[token::FIXEXT1, tag as u8]),
            2 => self.put(&[token::FIXEXT2, tag as u8]),
            4 => self.put(&[token::FIXEXT4, tag as u8]),
            8 => self.put(&[token::FIXEXT8, tag as u8]),
            16 => self.put(&[token::FIXEXT16, tag as u8]),
            _ if len <= u8::MAX as usize => self.put(&[token::EXT8, len as u8, tag as u8]),
            _ if len <= u16::MAX as usize => {
                let mut header = [0u8; 4];
                header[0] = token::EXT16;
                BigEndian::write_u16(&mut header[1..3], len as u16);
                header[3] = tag as u8;
                self.put(&header);
            }
            _ => {
                let mut header = [0u8; 6];
                header[0] = token::EXT32;
                BigEndian::write_u32(&mut header[1..5], len as u32);
                header[5] = tag as u8;
                self.put(&header);
            }
        }
        self.put(payload);
    }

    /// Write raw already-encoded bytes verbatim (e.g. an unused-data packet
    /// captured during a prior decode).
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.put(bytes);
    }
}
