//! The converter seam (spec §3, §4.E): every type that can cross the wire
//! implements `Converter`, whether hand-written (the `builtin` module) or
//! generated by the visitor from a `TypeShape`. Converters are looked up
//! and cached by `TypeId`, so the trait itself is object-safe and the cache
//! stores `Box<dyn Converter<T>>` behind an `Any`-erased key.

use std::any::Any;

use crate::context::SerializeContext;
use crate::error::Result;
use crate::io::buffer::SegmentBuffer;
use crate::shape::TypeShape;

/// Synchronous read/write for one Rust type against the wire format.
pub trait Converter<T>: Send + Sync {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &T) -> Result<()>;
    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<T>;

    /// The shape this converter was built from, so the cache can answer
    /// introspection questions (e.g. for diagnostics) without re-deriving it.
    fn shape(&self) -> &TypeShape;

    /// Whether this converter has meaningfully different behavior in the
    /// async path (e.g. a bulk primitive converter might not, while a large
    /// object graph converter might want to yield between properties).
    /// Defaults to `false`: most converters just reuse the sync path with
    /// an async-aware buffer underneath.
    fn prefer_async(&self) -> bool {
        false
    }
}

/// Erased handle stored in the converter cache, letting heterogeneous
/// `Converter<T>` instances live behind one `TypeId`-keyed map.
pub trait ErasedConverter: Send + Sync + Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static, C: Converter<T> + 'static> ErasedConverter for C {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Async counterpart of `Converter`, used by the streaming entry points
/// (§5, §6.2). Implemented in terms of the same `TypeShape` but suspending
/// at buffer fetch/flush boundaries via the `io::async_io` readers/writers
/// rather than requiring the whole value to already be resident.
#[async_trait::async_trait]
pub trait AsyncConverter<T>: Send + Sync {
    async fn write_async<S>(
        &self,
        ctx: &mut SerializeContext,
        writer: &mut crate::io::async_io::AsyncWriter<'_, S>,
        value: &T,
    ) -> Result<()>
    where
        S: crate::io::async_io::AsyncByteSink + Send;

    async fn read_async<S>(
        &self,
        ctx: &mut SerializeContext,
        reader: &mut crate::io::async_io::AsyncReader<'_, S>,
    ) -> Result<T>
    where
        S: crate::io::async_io::AsyncByteSource + Send;
}
