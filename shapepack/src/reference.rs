//! Reference preservation (spec §4.I): when enabled, object converters
//! register each value they serialize under an incrementing index and emit
//! a library-reserved extension backreference (`token::EXT_REFERENCE`) for
//! any value already seen, instead of re-encoding it. On read, the same
//! index space is rebuilt by storing the actual decoded value behind each
//! index, so a backreference can be resolved back to a clone of the
//! already-materialized value rather than merely validated as present.

use std::any::Any;

use byteorder::{BigEndian, ByteOrder};
use hashbrown::HashMap;

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::TypeShape;
use crate::token::EXT_REFERENCE;

/// Identity key used to detect a value seen before. Schema-driven object
/// converters key this off the pointer identity of the boxed value being
/// written; built purely from `usize` so the table carries no lifetime.
pub type IdentityKey = usize;

#[derive(Default)]
pub struct ReferenceTable {
    write_seen: HashMap<IdentityKey, u32>,
    read_values: Vec<Box<dyn Any + Send + Sync>>,
    next_index: u32,
}

impl ReferenceTable {
    pub fn new() -> Self {
        ReferenceTable::default()
    }

    /// Called before writing an object. Returns `Some(index)` if this
    /// identity was already written (the caller should emit a
    /// backreference instead), or registers it fresh and returns `None`.
    pub fn register_write(&mut self, identity: IdentityKey) -> Option<u32> {
        if let Some(&index) = self.write_seen.get(&identity) {
            return Some(index);
        }
        let index = self.next_index;
        self.next_index += 1;
        self.write_seen.insert(identity, index);
        None
    }

    /// Called when a fresh (non-backreference) object is read. Stores the
    /// decoded value under the next slot so a later backreference can
    /// resolve to a clone of it.
    pub fn register_read_value<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> u32 {
        let index = self.read_values.len() as u32;
        self.read_values.push(Box::new(value));
        index
    }

    /// Resolve a backreference to a clone of the value registered at
    /// `index`, failing if the index was never registered or its stored
    /// type doesn't match `T`.
    pub fn resolve_read_value<T: Clone + Send + Sync + 'static>(&self, index: u32) -> Result<T> {
        let boxed = self
            .read_values
            .get(index as usize)
            .ok_or_else(|| Error::invalid_data(format!("reference index {index} was never registered")))?;
        boxed
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::invalid_data(format!("reference index {index} resolved to a value of an unexpected type")))
    }
}

/// Wraps another converter with reference-preservation bookkeeping (spec
/// §4.I): the first time a given value (by pointer identity) is written, it
/// is encoded normally and registered; subsequent writes of the same
/// identity emit an `EXT_REFERENCE` backreference instead. On read, a
/// backreference resolves to a clone of the value materialized earlier in
/// the same call; anything else is decoded normally and registered.
///
/// Only active when the context carries a `ReferenceTable`
/// (`CacheOptions::track_references`); otherwise this delegates straight
/// through to the inner converter.
pub struct ReferencingConverter<T> {
    inner: std::sync::Arc<dyn Converter<T>>,
}

impl<T> ReferencingConverter<T> {
    pub fn new(inner: std::sync::Arc<dyn Converter<T>>) -> Self {
        ReferencingConverter { inner }
    }
}

impl<T: Clone + Send + Sync + 'static> Converter<T> for ReferencingConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &T) -> Result<()> {
        if ctx.references_mut().is_none() {
            return self.inner.write(ctx, buffer, value);
        }
        let identity = value as *const T as usize;
        let seen = ctx.references_mut().and_then(|refs| refs.register_write(identity));
        match seen {
            Some(index) => {
                let mut payload = [0u8; 4];
                BigEndian::write_u32(&mut payload, index);
                StreamWriter::new(buffer).write_extension(EXT_REFERENCE, &payload);
                Ok(())
            }
            None => self.inner.write(ctx, buffer, value),
        }
    }

    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<T> {
        if ctx.references_mut().is_none() {
            return self.inner.read(ctx, buffer);
        }
        if BufferedReader::new(buffer).peek_next_type()? == crate::token::TokenKind::Extension {
            let (tag, len) = BufferedReader::new(buffer).read_extension_header()?;
            if tag == EXT_REFERENCE {
                let payload = BufferedReader::new(buffer).read_raw(len as usize)?;
                let index = BigEndian::read_u32(&payload);
                return ctx
                    .references_mut()
                    .expect("checked above")
                    .resolve_read_value::<T>(index);
            }
            return Err(Error::invalid_data(format!("unexpected extension tag {tag} where a value or backreference was expected")));
        }
        let value = self.inner.read(ctx, buffer)?;
        ctx.references_mut().expect("checked above").register_read_value(value.clone());
        Ok(value)
    }

    fn shape(&self) -> &TypeShape {
        self.inner.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_of_an_identity_returns_none() {
        let mut table = ReferenceTable::new();
        assert_eq!(table.register_write(42), None);
    }

    #[test]
    fn repeated_identity_returns_the_same_index() {
        let mut table = ReferenceTable::new();
        assert_eq!(table.register_write(42), None);
        assert_eq!(table.register_write(7), None);
        assert_eq!(table.register_write(42), Some(0));
    }

    #[test]
    fn resolving_an_unregistered_index_errors() {
        let table = ReferenceTable::new();
        assert!(table.resolve_read_value::<i32>(0).is_err());
    }

    #[test]
    fn resolving_a_registered_index_returns_a_clone_of_the_value() {
        let mut table = ReferenceTable::new();
        let idx = table.register_read_value(7i32);
        assert_eq!(table.resolve_read_value::<i32>(idx).unwrap(), 7);
    }

    #[test]
    fn resolving_with_the_wrong_type_errors() {
        let mut table = ReferenceTable::new();
        let idx = table.register_read_value(7i32);
        assert!(table.resolve_read_value::<String>(idx).is_err());
    }

    #[test]
    fn referencing_converter_deduplicates_repeated_identity_on_write() {
        use crate::builtin::scalar::ScalarConverter;
        use std::sync::Arc;

        let conv = ReferencingConverter::new(Arc::new(ScalarConverter::<i32>::new()) as Arc<dyn Converter<i32>>);
        let mut ctx = SerializeContext::default().with_reference_tracking();
        let mut buf = SegmentBuffer::new();
        let value = 99i32;
        conv.write(&mut ctx, &mut buf, &value).unwrap();
        conv.write(&mut ctx, &mut buf, &value).unwrap();

        let first = conv.read(&mut ctx, &mut buf).unwrap();
        let second = conv.read(&mut ctx, &mut buf).unwrap();
        assert_eq!(first, 99);
        assert_eq!(second, 99);
    }
}
