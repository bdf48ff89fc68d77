//! Double-dispatch visitor over `TypeShape` (spec §4.E): given a shape and
//! the already-resolved converters for whatever it's composed of, builds
//! the concrete converter for the composite. Object and union shapes hand
//! off to `object::*`/`union` respectively, since their construction needs
//! more than one element converter; the container shapes (`Nullable`,
//! `Enumerable`, `Dictionary`) are built directly here.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::shape::TypeShape;

pub struct NullableConverter<T> {
    shape: TypeShape,
    inner: Arc<dyn Converter<T>>,
}

impl<T: Send + Sync + 'static> Converter<Option<T>> for NullableConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &Option<T>) -> Result<()> {
        match value {
            Some(inner) => self.inner.write(ctx, buffer, inner),
            None => {
                crate::io::writer::StreamWriter::new(buffer).write_nil();
                Ok(())
            }
        }
    }

    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<Option<T>> {
        let mut reader = crate::io::buffered_reader::BufferedReader::new(buffer);
        let saw_nil = reader.read_nil()?;
        if saw_nil {
            Ok(None)
        } else {
            self.inner.read(ctx, buffer).map(Some)
        }
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

pub struct EnumerableConverter<T> {
    shape: TypeShape,
    element: Arc<dyn Converter<T>>,
}

impl<T: Send + Sync + 'static> Converter<Vec<T>> for EnumerableConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &Vec<T>) -> Result<()> {
        ctx.enter(|ctx| {
            crate::io::writer::StreamWriter::new(buffer).write_array_header(value.len() as u32);
            for item in value {
                self.element.write(ctx, buffer, item)?;
            }
            Ok(())
        })
    }

    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<Vec<T>> {
        ctx.enter(|ctx| {
            let len = crate::io::buffered_reader::BufferedReader::new(buffer).read_array_header()?;
            let mut out = Vec::with_capacity(len as usize);
            for _ in 0..len {
                out.push(self.element.read(ctx, buffer)?);
            }
            Ok(out)
        })
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

pub struct DictionaryConverter<T> {
    shape: TypeShape,
    value: Arc<dyn Converter<T>>,
}

impl<T: Send + Sync + 'static> Converter<IndexMap<String, T>> for DictionaryConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &IndexMap<String, T>) -> Result<()> {
        ctx.enter(|ctx| {
            crate::io::writer::StreamWriter::new(buffer).write_map_header(value.len() as u32);
            for (key, val) in value {
                crate::io::writer::StreamWriter::new(buffer).write_string(key);
                self.value.write(ctx, buffer, val)?;
            }
            Ok(())
        })
    }

    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<IndexMap<String, T>> {
        ctx.enter(|ctx| {
            let len = crate::io::buffered_reader::BufferedReader::new(buffer).read_map_header()?;
            let mut out = IndexMap::with_capacity(len as usize);
            for _ in 0..len {
                let key = crate::io::buffered_reader::BufferedReader::new(buffer).read_string()?;
                let val = self.value.read(ctx, buffer)?;
                if out.insert(key.clone(), val).is_some() {
                    return Err(Error::double_property_assignment(key));
                }
            }
            Ok(out)
        })
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

/// Builds the non-object, non-union composite converters directly; object
/// and union shapes are built by their own modules (`object::*`, `union`)
/// since they need the full property/alternative list, not just one
/// element converter.
pub struct StandardVisitor;

impl StandardVisitor {
    pub fn visit_nullable<T: Send + Sync + 'static>(inner_type: std::any::TypeId, inner: Arc<dyn Converter<T>>) -> Arc<dyn Converter<Option<T>>> {
        Arc::new(NullableConverter { shape: TypeShape::Nullable { inner: inner_type }, inner })
    }

    pub fn visit_enumerable<T: Send + Sync + 'static>(element_type: std::any::TypeId, element: Arc<dyn Converter<T>>) -> Arc<dyn Converter<Vec<T>>> {
        Arc::new(EnumerableConverter { shape: TypeShape::Enumerable { element: element_type }, element })
    }

    pub fn visit_dictionary<T: Send + Sync + 'static>(value_type: std::any::TypeId, value: Arc<dyn Converter<T>>) -> Arc<dyn Converter<IndexMap<String, T>>> {
        Arc::new(DictionaryConverter { shape: TypeShape::Dictionary { value: value_type }, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::scalar::ScalarConverter;

    #[test]
    fn nullable_round_trips_both_cases() {
        let conv = StandardVisitor::visit_nullable(std::any::TypeId::of::<i32>(), Arc::new(ScalarConverter::<i32>::new()) as Arc<dyn Converter<i32>>);
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        conv.write(&mut ctx, &mut buf, &Some(5)).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), Some(5));
        conv.write(&mut ctx, &mut buf, &None).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), None);
    }

    #[test]
    fn enumerable_round_trips() {
        let conv = StandardVisitor::visit_enumerable(std::any::TypeId::of::<i32>(), Arc::new(ScalarConverter::<i32>::new()) as Arc<dyn Converter<i32>>);
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        let values = vec![1, 2, 3];
        conv.write(&mut ctx, &mut buf, &values).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), values);
    }

    #[test]
    fn dictionary_round_trips_and_rejects_duplicate_keys() {
        let conv = StandardVisitor::visit_dictionary(std::any::TypeId::of::<i32>(), Arc::new(ScalarConverter::<i32>::new()) as Arc<dyn Converter<i32>>);
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        let mut map = IndexMap::new();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);
        conv.write(&mut ctx, &mut buf, &map).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), map);

        // A hand-crafted map with a duplicate key must be rejected on read.
        let mut dup = SegmentBuffer::new();
        crate::io::writer::StreamWriter::new(&mut dup).write_map_header(2);
        crate::io::writer::StreamWriter::new(&mut dup).write_string("x");
        crate::io::writer::StreamWriter::new(&mut dup).write_integer(1);
        crate::io::writer::StreamWriter::new(&mut dup).write_string("x");
        crate::io::writer::StreamWriter::new(&mut dup).write_integer(2);
        assert!(conv.read(&mut ctx, &mut dup).is_err());
    }
}
