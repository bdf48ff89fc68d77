//! Async pairing of the streaming layer with an external byte source/sink
//! (spec §5). The teacher's networking layer (`net::endpoint`, `net::channel`)
//! polls non-blocking sockets and batches into a transmit buffer by hand;
//! here the same "keep going until you'd block, then suspend" shape is
//! expressed with `async`/`await` instead of manual `WouldBlock` handling,
//! since the schema-driven (de)serializer has no socket of its own — it
//! only ever suspends at the two points named in the spec: fetching more
//! input, or flushing output past a threshold.

use crate::context::SerializeContext;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::decode_result::DecodeResult;
use crate::io::reader::StreamReader;
use crate::io::writer::StreamWriter;

/// An external byte source a deserializer can pull more input from.
/// Returning `Ok(0)` signals end of stream.
#[async_trait::async_trait]
pub trait AsyncByteSource {
    async fn fetch_more(&mut self, into: &mut Vec<u8>) -> Result<usize>;
}

/// An external byte sink a serializer can push completed output to.
#[async_trait::async_trait]
pub trait AsyncByteSink {
    async fn flush_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Suspends at the fetch boundary only: retries a streaming read, calling
/// `source.fetch_more` and re-filling the buffer whenever the streaming
/// layer reports [`DecodeResult::InsufficientBuffer`]. A single outstanding
/// `AsyncReader` per buffer enforces the "reader rental" discipline — the
/// `&mut SegmentBuffer` borrow makes a second concurrent reader a compile
/// error.
pub struct AsyncReader<'b, S> {
    buffer: &'b mut SegmentBuffer,
    source: S,
}

impl<'b, S: AsyncByteSource> AsyncReader<'b, S> {
    pub fn new(buffer: &'b mut SegmentBuffer, source: S) -> Self {
        AsyncReader { buffer, source }
    }

    async fn fetch_until<T>(
        &mut self,
        ctx: &SerializeContext,
        mut attempt: impl FnMut(&mut StreamReader) -> DecodeResult<T>,
    ) -> Result<T> {
        loop {
            ctx.check_cancelled()?;
            match attempt(&mut StreamReader::new(self.buffer)) {
                DecodeResult::Success(v) => return Ok(v),
                DecodeResult::EndOfStream => return Err(Error::invalid_data("unexpected end of stream")),
                DecodeResult::TokenMismatch { expected, found } => {
                    return Err(Error::invalid_data(format!(
                        "expected a {expected:?} token but found a {found:?} token"
                    )))
                }
                DecodeResult::InsufficientBuffer => {
                    tracing::trace!(buffered = self.buffer.len(), "async reader: suspending to fetch more input");
                    let mut scratch = Vec::new();
                    let n = self.source.fetch_more(&mut scratch).await?;
                    if n == 0 {
                        return Err(Error::invalid_data("source exhausted mid-token"));
                    }
                    self.buffer.extend_from_slice(&scratch);
                }
            }
        }
    }

    pub async fn read_u32(&mut self, ctx: &SerializeContext) -> Result<u32> {
        self.fetch_until(ctx, |r| r.read_integer()).await.and_then(|v| {
            u32::try_from(v).map_err(|_| Error::invalid_data(format!("integer {v} out of range for u32")))
        })
    }

    pub async fn read_string(&mut self, ctx: &SerializeContext) -> Result<String> {
        let bytes = self.fetch_until(ctx, |r| r.read_string_bytes()).await?;
        String::from_utf8(bytes).map_err(|e| Error::invalid_data(format!("invalid utf-8: {e}")))
    }

    pub async fn read_array_header(&mut self, ctx: &SerializeContext) -> Result<u32> {
        self.fetch_until(ctx, |r| r.read_array_header()).await
    }

    pub async fn read_map_header(&mut self, ctx: &SerializeContext) -> Result<u32> {
        self.fetch_until(ctx, |r| r.read_map_header()).await
    }

    pub async fn skip(&mut self, ctx: &SerializeContext) -> Result<()> {
        self.fetch_until(ctx, |r| r.skip()).await
    }

    /// Borrow the fully-buffered convenience layer for the bytes already
    /// on hand, without suspending. Useful once a caller has confirmed
    /// (e.g. via a preceding header read) that the remainder of a value is
    /// already resident.
    pub fn buffered(&mut self) -> BufferedReader<'_> {
        BufferedReader::new(self.buffer)
    }
}

/// Suspends at the flush boundary: accumulates writes in the buffer and
/// only calls `sink.flush_bytes` once the unflushed byte count set in the
/// [`SerializeContext`] is exceeded, matching the spec's "batch until a
/// configured unflushed-bytes threshold" rule.
pub struct AsyncWriter<'b, S> {
    buffer: &'b mut SegmentBuffer,
    sink: S,
}

impl<'b, S: AsyncByteSink> AsyncWriter<'b, S> {
    pub fn new(buffer: &'b mut SegmentBuffer, sink: S) -> Self {
        AsyncWriter { buffer, sink }
    }

    pub fn writer(&mut self) -> StreamWriter<'_> {
        StreamWriter::new(self.buffer)
    }

    /// Flush if the buffer has grown past `ctx`'s threshold. Call after
    /// each top-level value during a streaming serialize.
    pub async fn maybe_flush(&mut self, ctx: &SerializeContext) -> Result<()> {
        if self.buffer.len() >= ctx.unflushed_bytes_threshold {
            self.flush(ctx).await?;
        }
        Ok(())
    }

    pub async fn flush(&mut self, ctx: &SerializeContext) -> Result<()> {
        ctx.check_cancelled()?;
        let pending = self.buffer.drain_to_vec();
        if !pending.is_empty() {
            tracing::trace!(bytes = pending.len(), "async writer: flushing buffered output to sink");
            self.sink.flush_bytes(&pending).await?;
        }
        Ok(())
    }
}
