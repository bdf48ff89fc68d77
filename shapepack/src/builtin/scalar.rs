//! Converters for the scalar primitives (spec §4.D): bool, the signed and
//! unsigned integer widths, and both float widths. All of them reuse the
//! minimal-form encode/decode already written for the bulk-array fast path
//! (`bulk::BulkElement`) — a scalar is just an array of one, minus the
//! array header.

use std::marker::PhantomData;

use crate::bulk::BulkElement;
use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::Result;
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::shape::TypeShape;

pub struct ScalarConverter<T> {
    shape: TypeShape,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ScalarConverter<T> {
    pub fn new() -> Self {
        ScalarConverter { shape: TypeShape::Primitive, _marker: PhantomData }
    }
}

impl<T> Default for ScalarConverter<T> {
    fn default() -> Self {
        ScalarConverter::new()
    }
}

impl<T: BulkElement + Send + Sync + 'static> Converter<T> for ScalarConverter<T> {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &T) -> Result<()> {
        let span = buffer.get_span(T::MAX_WIDTH);
        let written = value.encode_into(span);
        buffer.advance_write(written);
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<T> {
        let mut reader = BufferedReader::new(buffer);
        T::decode_one(&mut reader)
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}
