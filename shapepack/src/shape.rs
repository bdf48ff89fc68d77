//! The type-shape descriptor (spec §3, §4.E): a schema-driven converter is
//! built once by inspecting a `TypeShape`, not by re-deriving structure from
//! each value at encode time. `Converter` implementations are keyed by
//! `TypeId` in the cache, but the *shape* of how to walk a type — what its
//! properties are, whether it is a dictionary, a nullable wrapper, a union
//! of alternatives — comes from this enum.

use std::any::TypeId;
use std::borrow::Cow;

/// One property of an `Object` shape.
#[derive(Debug, Clone)]
pub struct PropertyShape {
    /// Positional key used by the keyed-array object layout (§4.F).
    pub key: u32,
    /// Name used by the property-map object layout (§4.F).
    pub name: Cow<'static, str>,
    pub type_id: TypeId,
    pub required: bool,
    /// Whether omitting this property when it holds the shape's default
    /// value is allowed (array-layout default-elision, §4.G).
    pub elidable: bool,
}

/// How a constructor for an `Object` shape expects its arguments staged
/// before being invoked (§4.F "constructor argument staging").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorShape {
    /// All properties are supplied positionally, in declaration order.
    Positional,
    /// Properties are staged by name and bound after construction (e.g. via
    /// setters), tolerating partial/out-of-order arrival.
    ByName,
}

/// Layout an `Object` shape should be encoded with (§4.F, §4.G, Open
/// Question in §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLayout {
    /// A MessagePack array, positional by integer key; supports eliding a
    /// maximal run of trailing default-valued properties.
    KeyedArray,
    /// A MessagePack map, keyed by property name.
    PropertyMap,
}

/// A union discriminator value (§4.H): either the declared base type
/// itself (written as `Nil`), or an integer/string alias for a registered
/// subtype. Integer and string aliases for the same subtype round-trip
/// independently of one another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alias {
    Base,
    Integer(i64),
    Text(Cow<'static, str>),
}

/// A single named alternative of a `Union` shape (§4.H).
#[derive(Debug, Clone)]
pub struct UnionAlternative {
    pub alias: Alias,
    pub type_id: TypeId,
}

/// Describes how a type should be converted, independent of any specific
/// value. Built once per `TypeId` and handed to the cache's converter
/// factory.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// A built-in scalar (bool, integers, floats, string, bytes, char,
    /// date/time, GUID, arbitrary-precision integer).
    Primitive,
    /// A closed set of named integer values.
    Enum { variant_type_id: TypeId },
    /// Wraps another shape, additionally permitting `Nil` on the wire.
    Nullable { inner: TypeId },
    /// A homogeneous sequence (`Vec<T>`-like).
    Enumerable { element: TypeId },
    /// A homogeneous string-keyed map.
    Dictionary { value: TypeId },
    /// A user-defined record type.
    Object {
        properties: Vec<PropertyShape>,
        constructor: ConstructorShape,
        layout: ObjectLayout,
        /// Whether unknown properties encountered on read should be
        /// captured into an `UnusedDataPacket` for lossless round-trip
        /// (§4.J) instead of being silently discarded.
        preserve_unused_data: bool,
    },
    /// A closed set of alternative sub-types, discriminated by alias on the
    /// wire (§4.H).
    Union { alternatives: Vec<UnionAlternative> },
}

impl TypeShape {
    pub fn is_object(&self) -> bool {
        matches!(self, TypeShape::Object { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_shape_reports_is_object() {
        let shape = TypeShape::Object {
            properties: Vec::new(),
            constructor: ConstructorShape::Positional,
            layout: ObjectLayout::KeyedArray,
            preserve_unused_data: false,
        };
        assert!(shape.is_object());
        assert!(!TypeShape::Primitive.is_object());
    }
}
