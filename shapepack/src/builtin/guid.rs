//! `uuid::Uuid` converter (spec §4.D, supplemented feature — grounded on
//! `damus-io-notedeck`'s use of `uuid` for identity values). Encoded as a
//! 16-byte `Bin` payload; there is no dedicated GUID wire type, so this
//! rides the same binary family raw byte buffers use.

use uuid::Uuid;

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::TypeShape;

pub struct GuidConverter {
    shape: TypeShape,
}

impl GuidConverter {
    pub fn new() -> Self {
        GuidConverter { shape: TypeShape::Primitive }
    }
}

impl Default for GuidConverter {
    fn default() -> Self {
        GuidConverter::new()
    }
}

impl Converter<Uuid> for GuidConverter {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &Uuid) -> Result<()> {
        StreamWriter::new(buffer).write_bytes(value.as_bytes());
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<Uuid> {
        let bytes = BufferedReader::new(buffer).read_bytes()?;
        let array: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::invalid_data(format!("expected 16 bytes for a guid, found {}", bytes.len())))?;
        Ok(Uuid::from_bytes(array))
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_round_trips() {
        let conv = GuidConverter::new();
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        let value = Uuid::new_v4();
        conv.write(&mut ctx, &mut buf, &value).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), value);
    }

    #[test]
    fn wrong_length_payload_is_rejected() {
        let conv = GuidConverter::new();
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        StreamWriter::new(&mut buf).write_bytes(&[1, 2, 3]);
        assert!(conv.read(&mut ctx, &mut buf).is_err());
    }
}
