//! The buffered convenience layer over [`StreamReader`] (spec §4.B):
//! converters that only ever operate on a fully-materialized buffer (the
//! synchronous `serialize`/`deserialize` entry points) call through here
//! instead of matching on `DecodeResult` themselves. `InsufficientBuffer`
//! and `EndOfStream` both become [`Error`]s, since there is no more data
//! coming.

use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::decode_result::DecodeResult;
use crate::io::reader::StreamReader;
use crate::token::TokenKind;

pub struct BufferedReader<'b> {
    inner: StreamReader<'b>,
}

fn fail_fast<T>(result: DecodeResult<T>) -> Result<T> {
    match result {
        DecodeResult::Success(v) => Ok(v),
        DecodeResult::InsufficientBuffer | DecodeResult::EndOfStream => {
            Err(Error::invalid_data("unexpected end of input"))
        }
        DecodeResult::TokenMismatch { expected, found } => Err(Error::invalid_data(format!(
            "expected a {expected:?} token but found a {found:?} token"
        ))),
    }
}

impl<'b> BufferedReader<'b> {
    pub fn new(buffer: &'b mut SegmentBuffer) -> Self {
        BufferedReader { inner: StreamReader::new(buffer) }
    }

    pub fn peek_next_type(&self) -> Result<TokenKind> {
        fail_fast(self.inner.peek_next_type())
    }

    pub fn read_nil(&mut self) -> Result<bool> {
        fail_fast(self.inner.try_read_nil())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        fail_fast(self.inner.read_bool())
    }

    fn read_integer_checked(&mut self, min: i128, max: i128) -> Result<i128> {
        let value = fail_fast(self.inner.read_integer())?;
        if value < min || value > max {
            return Err(Error::invalid_data(format!("integer {value} out of range")));
        }
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_integer_checked(0, u8::MAX as i128).map(|v| v as u8)
    }
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_integer_checked(0, u16::MAX as i128).map(|v| v as u16)
    }
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_integer_checked(0, u32::MAX as i128).map(|v| v as u32)
    }
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_integer_checked(0, u64::MAX as i128).map(|v| v as u64)
    }
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_integer_checked(i8::MIN as i128, i8::MAX as i128).map(|v| v as i8)
    }
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_integer_checked(i16::MIN as i128, i16::MAX as i128).map(|v| v as i16)
    }
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_integer_checked(i32::MIN as i128, i32::MAX as i128).map(|v| v as i32)
    }
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_integer_checked(i64::MIN as i128, i64::MAX as i128).map(|v| v as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        fail_fast(self.inner.read_f32())
    }
    pub fn read_f64(&mut self) -> Result<f64> {
        fail_fast(self.inner.read_f64())
    }

    /// A UTF-16 code unit, per the wire convention of encoding `char` as an
    /// unsigned 16-bit integer (spec §4.D).
    pub fn read_char(&mut self) -> Result<char> {
        let unit = self.read_u16()?;
        char::from_u32(unit as u32).ok_or_else(|| Error::invalid_data(format!("{unit} is not a valid scalar value")))
    }

    pub fn read_string(&mut self) -> Result<String> {
        if let Some(span) = fail_fast(self.inner.try_read_string_span())? {
            return String::from_utf8(span).map_err(|e| Error::invalid_data(format!("invalid utf-8: {e}")));
        }
        let bytes = fail_fast(self.inner.read_string_bytes())?;
        String::from_utf8(bytes).map_err(|e| Error::invalid_data(format!("invalid utf-8: {e}")))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        fail_fast(self.inner.read_bytes())
    }

    pub fn read_array_header(&mut self) -> Result<u32> {
        fail_fast(self.inner.read_array_header())
    }

    pub fn read_map_header(&mut self) -> Result<u32> {
        fail_fast(self.inner.read_map_header())
    }

    pub fn read_extension_header(&mut self) -> Result<(i8, u32)> {
        fail_fast(self.inner.read_extension_header())
    }

    pub fn read_raw(&mut self, n: usize) -> Result<Vec<u8>> {
        fail_fast(self.inner.read_raw(n))
    }

    pub fn skip(&mut self) -> Result<()> {
        fail_fast(self.inner.skip())
    }
}
