//! Public entry points (spec §6.2): the handful of functions a consumer
//! actually calls, tying the converter cache, the per-call context, and the
//! sync/async I/O layers together. Schema-specific converters (hand-written
//! in `builtin`, or generated by `shapepack-derive`) are supplied by the
//! caller; this module only owns the buffer/context plumbing around them.

use crate::cache::ConverterCache;
use crate::context::{CancellationToken, SerializeContext};
use crate::converter::{AsyncConverter, Converter};
use crate::error::Result;
use crate::io::async_io::{AsyncByteSink, AsyncByteSource, AsyncReader, AsyncWriter};
use crate::io::buffer::SegmentBuffer;
use crate::options::CacheOptions;
use crate::shape::TypeShape;

fn context_for(options: CacheOptions) -> SerializeContext {
    let mut ctx = SerializeContext::new(CancellationToken::new());
    ctx.max_depth = options.max_depth();
    ctx.unflushed_bytes_threshold = options.unflushed_bytes_threshold();
    if options.track_references() {
        ctx = ctx.with_reference_tracking();
    }
    ctx.with_options(options)
}

/// Encode `value` to a standalone byte vector.
pub fn serialize<T>(converter: &dyn Converter<T>, value: &T, options: CacheOptions) -> Result<Vec<u8>> {
    let mut ctx = context_for(options);
    let mut buffer = SegmentBuffer::new();
    converter.write(&mut ctx, &mut buffer, value)?;
    Ok(buffer.drain_to_vec())
}

/// Decode a value previously produced by [`serialize`]. Trailing bytes
/// beyond the single encoded value are ignored, mirroring how a caller
/// reading one value out of a larger stream would use [`deserialize_from`].
pub fn deserialize<T>(converter: &dyn Converter<T>, bytes: &[u8], options: CacheOptions) -> Result<T> {
    let mut ctx = context_for(options);
    let mut buffer = SegmentBuffer::new();
    buffer.extend_from_slice(bytes);
    converter.read(&mut ctx, &mut buffer)
}

/// Decode one value directly out of a [`SegmentBuffer`] that may hold more
/// data after it (e.g. a shared connection buffer).
pub fn deserialize_from<T>(converter: &dyn Converter<T>, buffer: &mut SegmentBuffer, options: CacheOptions) -> Result<T> {
    let mut ctx = context_for(options);
    converter.read(&mut ctx, buffer)
}

/// Resolve (building and caching if necessary) the converter for `T`. Thin
/// wrapper over [`ConverterCache::get_or_init`] so callers don't need to
/// import `cache` directly.
pub fn converter_for<T, F>(cache: &ConverterCache, shape: TypeShape, build: F) -> std::sync::Arc<dyn Converter<T>>
where
    T: 'static,
    F: FnOnce(&ConverterCache) -> std::sync::Arc<dyn Converter<T>>,
{
    cache.get_or_init(shape, build)
}

/// Stream-encode `value` to `sink`, suspending at flush boundaries rather
/// than requiring the whole encoded form to be buffered up front.
pub async fn serialize_async<T, S>(
    converter: &(impl AsyncConverter<T> + ?Sized),
    sink: S,
    value: &T,
    options: CacheOptions,
) -> Result<()>
where
    S: AsyncByteSink + Send,
    T: Send + Sync,
{
    let mut ctx = context_for(options);
    let mut buffer = SegmentBuffer::new();
    let mut writer = AsyncWriter::new(&mut buffer, sink);
    converter.write_async(&mut ctx, &mut writer, value).await?;
    writer.flush(&ctx).await
}

/// Stream-decode a value from `source`, suspending to fetch more bytes
/// whenever the converter needs data that hasn't arrived yet.
pub async fn deserialize_async<T, S>(
    converter: &(impl AsyncConverter<T> + ?Sized),
    source: S,
    options: CacheOptions,
) -> Result<T>
where
    S: AsyncByteSource + Send,
    T: Send + Sync,
{
    let mut ctx = context_for(options);
    let mut buffer = SegmentBuffer::new();
    let mut reader = AsyncReader::new(&mut buffer, source);
    converter.read_async(&mut ctx, &mut reader).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::scalar::ScalarConverter;

    #[test]
    fn serialize_then_deserialize_round_trips() {
        let converter = ScalarConverter::<i32>::new();
        let bytes = serialize(&converter, &42, CacheOptions::default()).unwrap();
        let value: i32 = deserialize(&converter, &bytes, CacheOptions::default()).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn converter_for_builds_once_per_cache() {
        let cache = ConverterCache::new();
        let mut calls = 0;
        let _ = converter_for::<i32, _>(&cache, TypeShape::Primitive, |_| {
            calls += 1;
            std::sync::Arc::new(ScalarConverter::<i32>::new())
        });
        let _ = converter_for::<i32, _>(&cache, TypeShape::Primitive, |_| {
            calls += 1;
            std::sync::Arc::new(ScalarConverter::<i32>::new())
        });
        assert_eq!(calls, 1);
    }
}
