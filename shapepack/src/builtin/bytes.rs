//! `Vec<u8>` converter, using the `Bin` token family (spec §4.D) rather
//! than a bulk-array-of-u8, since raw byte buffers are common enough to
//! warrant their own wire family with no per-element tagging overhead.

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::Result;
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::TypeShape;
use crate::token::TokenKind;

pub struct BytesConverter {
    shape: TypeShape,
}

impl BytesConverter {
    pub fn new() -> Self {
        BytesConverter { shape: TypeShape::Primitive }
    }
}

impl Default for BytesConverter {
    fn default() -> Self {
        BytesConverter::new()
    }
}

impl Converter<Vec<u8>> for BytesConverter {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &Vec<u8>) -> Result<()> {
        StreamWriter::new(buffer).write_bytes(value);
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<Vec<u8>> {
        if BufferedReader::new(buffer).peek_next_type()? == TokenKind::Array {
            let len = BufferedReader::new(buffer).read_array_header()?;
            let mut out = Vec::with_capacity(len as usize);
            for _ in 0..len {
                out.push(BufferedReader::new(buffer).read_u8()?);
            }
            return Ok(out);
        }
        BufferedReader::new(buffer).read_bytes()
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let conv = BytesConverter::new();
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        let payload = vec![1u8, 2, 3, 4, 5];
        conv.write(&mut ctx, &mut buf, &payload).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), payload);
    }

    #[test]
    fn decodes_array_of_integers_as_bytes() {
        let conv = BytesConverter::new();
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        let mut w = StreamWriter::new(&mut buf);
        w.write_array_header(3);
        w.write_integer(10);
        w.write_integer(20);
        w.write_integer(255);
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), vec![10u8, 20, 255]);
    }
}
