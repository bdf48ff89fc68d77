//! The streaming layer (spec §4.A): token-at-a-time decoding over a
//! [`SegmentBuffer`]. Every read either fully commits (consumes exactly the
//! bytes of one token) or leaves the buffer completely untouched and
//! reports [`DecodeResult::InsufficientBuffer`] so the caller can fetch more
//! bytes and retry from the same logical position.
//!
//! Holding a `StreamReader` requires `&mut SegmentBuffer`, so the Rust
//! borrow checker itself enforces the "at most one outstanding reader"
//! rental discipline the spec calls for (§4.B, §5) — no runtime bookkeeping
//! needed.

use byteorder::{BigEndian, ByteOrder};

use crate::io::buffer::SegmentBuffer;
use crate::io::decode_result::DecodeResult;
use crate::token::{self, TokenKind};

pub struct StreamReader<'b> {
    buffer: &'b mut SegmentBuffer,
}

impl<'b> StreamReader<'b> {
    pub fn new(buffer: &'b mut SegmentBuffer) -> Self {
        StreamReader { buffer }
    }

    fn peek_first_byte(&self) -> DecodeResult<u8> {
        match self.buffer.peek_first_byte() {
            Some(b) => DecodeResult::Success(b),
            None => DecodeResult::InsufficientBuffer,
        }
    }

    /// Peek `count` bytes without consuming, for sizing a variable-length
    /// token before committing to reading it.
    fn peek_exact(&self, count: usize) -> DecodeResult<Vec<u8>> {
        match self.buffer.try_peek_take(count) {
            Some(bytes) => DecodeResult::Success(bytes),
            None => DecodeResult::InsufficientBuffer,
        }
    }

    fn take_exact(&mut self, count: usize) -> DecodeResult<Vec<u8>> {
        match self.buffer.try_take(count) {
            Some(bytes) => DecodeResult::Success(bytes),
            None => DecodeResult::InsufficientBuffer,
        }
    }

    /// Peek the next format byte and classify its token kind, without
    /// consuming anything.
    pub fn peek_next_type(&self) -> DecodeResult<TokenKind> {
        self.peek_first_byte().map(token::classify)
    }

    /// Consume a `Nil` token if present; otherwise leave the buffer
    /// untouched and report `false` so callers (e.g. the Nullable
    /// converter) can fall through to the element converter.
    pub fn try_read_nil(&mut self) -> DecodeResult<bool> {
        match self.peek_first_byte() {
            DecodeResult::Success(b) if b == token::NIL => {
                self.buffer.commit_peek(1);
                DecodeResult::Success(true)
            }
            DecodeResult::Success(_) => DecodeResult::Success(false),
            DecodeResult::InsufficientBuffer => DecodeResult::InsufficientBuffer,
            other => other.map(|_| unreachable!()),
        }
    }

    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        match self.peek_first_byte() {
            DecodeResult::Success(token::TRUE) => {
                self.buffer.commit_peek(1);
                DecodeResult::Success(true)
            }
            DecodeResult::Success(token::FALSE) => {
                self.buffer.commit_peek(1);
                DecodeResult::Success(false)
            }
            DecodeResult::Success(other) => DecodeResult::TokenMismatch {
                expected: TokenKind::Bool,
                found: token::classify(other),
            },
            DecodeResult::InsufficientBuffer => DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        }
    }

    /// Read any integer format, widened to `i128` (large enough to hold the
    /// full `u64`/`i64` range). Callers narrow to the requested width and
    /// perform range checks.
    pub fn read_integer(&mut self) -> DecodeResult<i128> {
        let first = match self.peek_first_byte() {
            DecodeResult::Success(b) => b,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        };

        if first <= token::FIXINT_POSITIVE_MAX {
            self.buffer.commit_peek(1);
            return DecodeResult::Success(first as i128);
        }
        if first & token::FIXINT_NEGATIVE_MASK == token::FIXINT_NEGATIVE_MASK {
            self.buffer.commit_peek(1);
            return DecodeResult::Success((first as i8) as i128);
        }

        let payload_width = match first {
            token::UINT8 | token::INT8 => 1,
            token::UINT16 | token::INT16 => 2,
            token::UINT32 | token::INT32 => 4,
            token::UINT64 | token::INT64 => 8,
            other => {
                return DecodeResult::TokenMismatch {
                    expected: TokenKind::Integer,
                    found: token::classify(other),
                }
            }
        };

        let whole = match self.peek_exact(1 + payload_width) {
            DecodeResult::Success(bytes) => bytes,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            other => return other.map(|_: Vec<u8>| unreachable!()),
        };
        let payload = &whole[1..];

        let value: i128 = match first {
            token::UINT8 => payload[0] as i128,
            token::UINT16 => BigEndian::read_u16(payload) as i128,
            token::UINT32 => BigEndian::read_u32(payload) as i128,
            token::UINT64 => BigEndian::read_u64(payload) as i128,
            token::INT8 => (payload[0] as i8) as i128,
            token::INT16 => BigEndian::read_i16(payload) as i128,
            token::INT32 => BigEndian::read_i32(payload) as i128,
            token::INT64 => BigEndian::read_i64(payload) as i128,
            _ => unreachable!(),
        };

        self.buffer.commit_peek(whole.len());
        DecodeResult::Success(value)
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        let whole = match self.peek_exact(5) {
            DecodeResult::Success(bytes) => bytes,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            other => return other.map(|_: Vec<u8>| unreachable!()),
        };
        if whole[0] != token::FLOAT32 {
            return DecodeResult::TokenMismatch {
                expected: TokenKind::Float32,
                found: token::classify(whole[0]),
            };
        }
        let value = BigEndian::read_f32(&whole[1..]);
        self.buffer.commit_peek(5);
        DecodeResult::Success(value)
    }

    pub fn read_f64(&mut self) -> DecodeResult<f64> {
        let whole = match self.peek_exact(9) {
            DecodeResult::Success(bytes) => bytes,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            other => return other.map(|_: Vec<u8>| unreachable!()),
        };
        if whole[0] != token::FLOAT64 {
            return DecodeResult::TokenMismatch {
                expected: TokenKind::Float64,
                found: token::classify(whole[0]),
            };
        }
        let value = BigEndian::read_f64(&whole[1..]);
        self.buffer.commit_peek(9);
        DecodeResult::Success(value)
    }

    /// Number of header bytes (beyond the format byte) and the decoded
    /// payload length, for the `Str`/`Bin`/`Array`/`Map` families.
    fn variable_length_header(&self, first: u8, fixed_mask: u8, fixed_bits: u8, kind: TokenKind, table: &[(u8, usize)]) -> DecodeResult<(usize, u32)> {
        if first & fixed_mask == fixed_bits {
            return DecodeResult::Success((0, (first & !fixed_mask) as u32));
        }
        for &(code, width) in table {
            if first == code {
                return match self.peek_exact(1 + width) {
                    DecodeResult::Success(whole) => {
                        let len = match width {
                            1 => whole[1] as u32,
                            2 => BigEndian::read_u16(&whole[1..]) as u32,
                            4 => BigEndian::read_u32(&whole[1..]),
                            _ => unreachable!(),
                        };
                        DecodeResult::Success((width, len))
                    }
                    DecodeResult::InsufficientBuffer => DecodeResult::InsufficientBuffer,
                    other => other.map(|_: Vec<u8>| unreachable!()),
                };
            }
        }
        DecodeResult::TokenMismatch {
            expected: kind,
            found: token::classify(first),
        }
    }

    fn read_length_prefixed(&mut self, fixed_mask: u8, fixed_bits: u8, kind: TokenKind, table: &[(u8, usize)]) -> DecodeResult<Vec<u8>> {
        let first = match self.peek_first_byte() {
            DecodeResult::Success(b) => b,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        };
        let (extra, len) = match self.variable_length_header(first, fixed_mask, fixed_bits, kind, table) {
            DecodeResult::Success(v) => v,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            DecodeResult::TokenMismatch { expected, found } => return DecodeResult::TokenMismatch { expected, found },
            DecodeResult::EndOfStream => unreachable!(),
        };
        let total = 1 + extra + len as usize;
        let whole = match self.take_exact(total) {
            DecodeResult::Success(bytes) => bytes,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            other => return other.map(|_: Vec<u8>| unreachable!()),
        };
        DecodeResult::Success(whole[(1 + extra)..].to_vec())
    }

    /// Raw UTF-8 bytes of a `Str` token (the caller validates UTF-8 and/or
    /// builds a `String`).
    pub fn read_string_bytes(&mut self) -> DecodeResult<Vec<u8>> {
        self.read_length_prefixed(
            0xe0,
            token::FIXSTR_MASK,
            TokenKind::String,
            &[(token::STR8, 1), (token::STR16, 2), (token::STR32, 4)],
        )
    }

    /// Zero-copy string payload: only succeeds when the whole token (header
    /// and payload together) lies within the head chunk. Returns `Some` and
    /// commits the read in that case; returns `Success(None)` with the
    /// buffer completely untouched when the token is available but spans a
    /// chunk boundary, so the caller can fall back to `read_string_bytes`
    /// without losing data.
    pub fn try_read_string_span(&mut self) -> DecodeResult<Option<Vec<u8>>> {
        let first = match self.peek_first_byte() {
            DecodeResult::Success(b) => b,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        };
        let (extra, len) = match self.variable_length_header(
            first,
            0xe0,
            token::FIXSTR_MASK,
            TokenKind::String,
            &[(token::STR8, 1), (token::STR16, 2), (token::STR32, 4)],
        ) {
            DecodeResult::Success(v) => v,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            DecodeResult::TokenMismatch { expected, found } => return DecodeResult::TokenMismatch { expected, found },
            DecodeResult::EndOfStream => unreachable!(),
        };
        let header_len = 1 + extra;
        let total = header_len + len as usize;
        if self.buffer.len() < total {
            return DecodeResult::InsufficientBuffer;
        }
        match self.buffer.try_peek_contiguous(total) {
            Some(whole) => {
                let payload = whole[header_len..].to_vec();
                self.buffer.commit_peek(total);
                DecodeResult::Success(Some(payload))
            }
            None => DecodeResult::Success(None),
        }
    }

    pub fn read_bytes(&mut self) -> DecodeResult<Vec<u8>> {
        self.read_length_prefixed(0x00, 0xff, TokenKind::Binary, &[(token::BIN8, 1), (token::BIN16, 2), (token::BIN32, 4)])
    }

    pub fn read_array_header(&mut self) -> DecodeResult<u32> {
        let first = match self.peek_first_byte() {
            DecodeResult::Success(b) => b,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        };
        match self.variable_length_header(
            first,
            0xf0,
            token::FIXARRAY_MASK,
            TokenKind::Array,
            &[(token::ARRAY16, 2), (token::ARRAY32, 4)],
        ) {
            DecodeResult::Success((extra, len)) => {
                let _ = self.take_exact(1 + extra);
                DecodeResult::Success(len)
            }
            DecodeResult::InsufficientBuffer => DecodeResult::InsufficientBuffer,
            DecodeResult::TokenMismatch { expected, found } => DecodeResult::TokenMismatch { expected, found },
            DecodeResult::EndOfStream => unreachable!(),
        }
    }

    pub fn read_map_header(&mut self) -> DecodeResult<u32> {
        let first = match self.peek_first_byte() {
            DecodeResult::Success(b) => b,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        };
        match self.variable_length_header(
            first,
            0xf0,
            token::FIXMAP_MASK,
            TokenKind::Map,
            &[(token::MAP16, 2), (token::MAP32, 4)],
        ) {
            DecodeResult::Success((extra, len)) => {
                let _ = self.take_exact(1 + extra);
                DecodeResult::Success(len)
            }
            DecodeResult::InsufficientBuffer => DecodeResult::InsufficientBuffer,
            DecodeResult::TokenMismatch { expected, found } => DecodeResult::TokenMismatch { expected, found },
            DecodeResult::EndOfStream => unreachable!(),
        }
    }

    /// Extension header `(tag, payload length)`. Does not consume the
    /// payload itself.
    pub fn read_extension_header(&mut self) -> DecodeResult<(i8, u32)> {
        let first = match self.peek_first_byte() {
            DecodeResult::Success(b) => b,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            _ => unreachable!(),
        };
        let (header_extra, fixed_payload_len): (usize, Option<u32>) = match first {
            token::FIXEXT1 => (0, Some(1)),
            token::FIXEXT2 => (0, Some(2)),
            token::FIXEXT4 => (0, Some(4)),
            token::FIXEXT8 => (0, Some(8)),
            token::FIXEXT16 => (0, Some(16)),
            token::EXT8 => (1, None),
            token::EXT16 => (2, None),
            token::EXT32 => (4, None),
            other => {
                return DecodeResult::TokenMismatch {
                    expected: TokenKind::Extension,
                    found: token::classify(other),
                }
            }
        };

        let len_header_bytes = 1 + header_extra;
        let whole = match self.peek_exact(len_header_bytes + 1) {
            // +1 for the tag byte which always immediately follows the length field(s)
            DecodeResult::Success(bytes) => bytes,
            DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
            other => return other.map(|_: Vec<u8>| unreachable!()),
        };

        let payload_len = match fixed_payload_len {
            Some(n) => n,
            None => match header_extra {
                1 => whole[1] as u32,
                2 => BigEndian::read_u16(&whole[1..3]) as u32,
                4 => BigEndian::read_u32(&whole[1..5]),
                _ => unreachable!(),
            },
        };
        let tag = whole[len_header_bytes] as i8;
        let total_header = len_header_bytes + 1;
        let _ = self.take_exact(total_header);
        DecodeResult::Success((tag, payload_len))
    }

    /// Read exactly `n` raw bytes (extension payloads, unused-data capture).
    pub fn read_raw(&mut self, n: usize) -> DecodeResult<Vec<u8>> {
        self.take_exact(n)
    }

    /// Skip exactly one value, including composites, without allocating a
    /// stack: a scalar counter of "structures still owed" grows on
    /// encountering an array/map header and shrinks by one per value
    /// consumed, terminating when it returns to zero.
    pub fn skip(&mut self) -> DecodeResult<()> {
        let mut owed: u64 = 1;
        while owed > 0 {
            let kind = match self.peek_next_type() {
                DecodeResult::Success(k) => k,
                DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
                other => return other.map(|_: TokenKind| unreachable!()),
            };
            match kind {
                TokenKind::Nil => {
                    if let DecodeResult::InsufficientBuffer = self.try_read_nil() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Bool => {
                    if let DecodeResult::InsufficientBuffer = self.read_bool() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Integer => {
                    if let DecodeResult::InsufficientBuffer = self.read_integer() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Float32 => {
                    if let DecodeResult::InsufficientBuffer = self.read_f32() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Float64 => {
                    if let DecodeResult::InsufficientBuffer = self.read_f64() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::String => {
                    if let DecodeResult::InsufficientBuffer = self.read_string_bytes() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Binary => {
                    if let DecodeResult::InsufficientBuffer = self.read_bytes() {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Extension => {
                    let (_, len) = match self.read_extension_header() {
                        DecodeResult::Success(v) => v,
                        DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
                        other => return other.map(|_: (i8, u32)| unreachable!()),
                    };
                    if let DecodeResult::InsufficientBuffer = self.read_raw(len as usize) {
                        return DecodeResult::InsufficientBuffer;
                    }
                }
                TokenKind::Array => {
                    let len = match self.read_array_header() {
                        DecodeResult::Success(v) => v,
                        DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
                        other => return other.map(|_: u32| unreachable!()),
                    };
                    owed += len as u64;
                }
                TokenKind::Map => {
                    let len = match self.read_map_header() {
                        DecodeResult::Success(v) => v,
                        DecodeResult::InsufficientBuffer => return DecodeResult::InsufficientBuffer,
                        other => return other.map(|_: u32| unreachable!()),
                    };
                    owed += 2 * len as u64;
                }
            }
            owed -= 1;
        }
        DecodeResult::Success(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::buffer::SegmentBuffer;

    fn reader_over(bytes: &[u8]) -> SegmentBuffer {
        let mut buf = SegmentBuffer::new();
        buf.extend_from_slice(bytes);
        buf
    }

    #[test]
    fn reads_positive_fixint() {
        let mut buf = reader_over(&[0x05]);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_integer(), DecodeResult::Success(5));
        assert!(buf.is_empty());
    }

    #[test]
    fn reads_negative_fixint() {
        let mut buf = reader_over(&[0xff]);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_integer(), DecodeResult::Success(-1));
    }

    #[test]
    fn reads_uint8() {
        let mut buf = reader_over(&[0xcc, 0x82]);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_integer(), DecodeResult::Success(130));
    }

    #[test]
    fn insufficient_buffer_leaves_cursor_untouched() {
        let mut buf = reader_over(&[0xcc]);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_integer(), DecodeResult::InsufficientBuffer);
        assert_eq!(buf.len(), 1);
        buf.extend_from_slice(&[0x82]);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_integer(), DecodeResult::Success(130));
    }

    #[test]
    fn reads_fixstr() {
        let mut buf = reader_over(&[0xa3, b'f', b'o', b'o']);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_string_bytes(), DecodeResult::Success(b"foo".to_vec()));
    }

    #[test]
    fn array_header_then_elements() {
        let mut buf = reader_over(&[0x92, 0x01, 0x02]);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.read_array_header(), DecodeResult::Success(2));
        assert_eq!(r.read_integer(), DecodeResult::Success(1));
        assert_eq!(r.read_integer(), DecodeResult::Success(2));
    }

    #[test]
    fn skip_consumes_nested_composite() {
        // [1, [2, 3], "x"]
        let mut buf = reader_over(&[0x93, 0x01, 0x92, 0x02, 0x03, 0xa1, b'x']);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(r.skip(), DecodeResult::Success(()));
        assert!(buf.is_empty());
    }

    #[test]
    fn token_mismatch_reports_kinds() {
        let mut buf = reader_over(&[0xa1, b'x']);
        let mut r = StreamReader::new(&mut buf);
        assert_eq!(
            r.read_bool(),
            DecodeResult::TokenMismatch {
                expected: TokenKind::Bool,
                found: TokenKind::String
            }
        );
    }
}
