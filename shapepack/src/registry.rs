//! Ties a concrete Rust type to the converter that knows how to read and
//! write it, so derive-generated object/union converters can ask for "the
//! converter for this field's type" without knowing whether that type is a
//! primitive, a built-in, or another derived struct. Every `Shaped`
//! implementation goes through the same [`ConverterCache`], so a type
//! referenced from several fields (or recursively from itself) is only
//! built once.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::builtin::bignum::{BigInt, BigIntConverter};
use crate::builtin::bytes::BytesConverter;
use crate::builtin::date::DateTimeConverter;
use crate::builtin::guid::GuidConverter;
use crate::builtin::scalar::ScalarConverter;
use crate::builtin::string::{CharConverter, StringConverter};
use crate::cache::ConverterCache;
use crate::converter::Converter;
use crate::shape::TypeShape;
use crate::visitor::StandardVisitor;

/// A Rust type with a known `TypeShape` and a way to produce its converter.
/// Implemented by hand for primitives and built-ins here, and generated by
/// `#[derive(MsgShape)]` for structs, enums, and unions.
pub trait Shaped: Sized + Send + Sync + 'static {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>>;
}

macro_rules! shaped_scalar {
    ($ty:ty) => {
        impl Shaped for $ty {
            fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
                cache.get_or_init(TypeShape::Primitive, |_| Arc::new(ScalarConverter::<$ty>::new()))
            }
        }
    };
}

shaped_scalar!(bool);
shaped_scalar!(i8);
shaped_scalar!(i16);
shaped_scalar!(i32);
shaped_scalar!(i64);
shaped_scalar!(u8);
shaped_scalar!(u16);
shaped_scalar!(u32);
shaped_scalar!(u64);
shaped_scalar!(f32);
shaped_scalar!(f64);

impl Shaped for String {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(TypeShape::Primitive, |_| Arc::new(StringConverter::new()))
    }
}

impl Shaped for char {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(TypeShape::Primitive, |_| Arc::new(CharConverter::new()))
    }
}

impl Shaped for Vec<u8> {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(TypeShape::Primitive, |_| Arc::new(BytesConverter::new()))
    }
}

impl Shaped for chrono::DateTime<chrono::Utc> {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(TypeShape::Primitive, |_| Arc::new(DateTimeConverter::new()))
    }
}

impl Shaped for uuid::Uuid {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(TypeShape::Primitive, |_| Arc::new(GuidConverter::new()))
    }
}

impl Shaped for BigInt {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(TypeShape::Primitive, |_| Arc::new(BigIntConverter::new()))
    }
}

impl<T: Shaped> Shaped for Option<T> {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(
            TypeShape::Nullable { inner: std::any::TypeId::of::<T>() },
            |cache| StandardVisitor::visit_nullable(std::any::TypeId::of::<T>(), T::converter(cache)),
        )
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(
            TypeShape::Enumerable { element: std::any::TypeId::of::<T>() },
            |cache| StandardVisitor::visit_enumerable(std::any::TypeId::of::<T>(), T::converter(cache)),
        )
    }
}

impl<T: Shaped> Shaped for IndexMap<String, T> {
    fn converter(cache: &ConverterCache) -> Arc<dyn Converter<Self>> {
        cache.get_or_init(
            TypeShape::Dictionary { value: std::any::TypeId::of::<T>() },
            |cache| StandardVisitor::visit_dictionary(std::any::TypeId::of::<T>(), T::converter(cache)),
        )
    }
}
