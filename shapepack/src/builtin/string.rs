//! `String` and `char` converters (spec §4.D). `char` is encoded as an
//! unsigned 16-bit code unit per the wire convention; values outside the
//! BMP are rejected on write rather than silently truncated.

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::TypeShape;

pub struct StringConverter {
    shape: TypeShape,
}

impl StringConverter {
    pub fn new() -> Self {
        StringConverter { shape: TypeShape::Primitive }
    }
}

impl Default for StringConverter {
    fn default() -> Self {
        StringConverter::new()
    }
}

impl Converter<String> for StringConverter {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &String) -> Result<()> {
        StreamWriter::new(buffer).write_string(value);
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<String> {
        BufferedReader::new(buffer).read_string()
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

pub struct CharConverter {
    shape: TypeShape,
}

impl CharConverter {
    pub fn new() -> Self {
        CharConverter { shape: TypeShape::Primitive }
    }
}

impl Default for CharConverter {
    fn default() -> Self {
        CharConverter::new()
    }
}

impl Converter<char> for CharConverter {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &char) -> Result<()> {
        let code = *value as u32;
        if code > u16::MAX as u32 {
            return Err(Error::unsupported_type(format!("'{value}' is outside the basic multilingual plane")));
        }
        StreamWriter::new(buffer).write_unsigned(code as u64);
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<char> {
        BufferedReader::new(buffer).read_char()
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}
