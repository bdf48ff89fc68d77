//! Schema-driven MessagePack serialization core.
//!
//! A value's Rust type never appears on the wire; instead each type is
//! described once as a [`shape::TypeShape`], and a [`converter::Converter`]
//! built from that shape does the actual encoding/decoding. Converters are
//! resolved once per `TypeId` and cached (`cache`), so a schema with shared
//! or recursive types only pays the construction cost once.
//!
//! Module map:
//! - [`token`], [`chunk`], [`chunk_pool`] — wire format constants and the
//!   pooled chunked byte storage both I/O directions are built on.
//! - [`io`] — the streaming reader/writer (`io::reader`, `io::writer`), the
//!   fully-buffered convenience layer (`io::buffered_reader`), and the async
//!   pairing with an external source/sink (`io::async_io`).
//! - [`bulk`] — fixed-width element arrays encoded without a cache lookup
//!   per element.
//! - [`context`] — per-call recursion depth, cancellation, and reference
//!   tracking.
//! - [`reference`] — identity tracking for reference-preserving converters.
//! - [`shape`] — the `TypeShape` descriptor vocabulary.
//! - [`converter`] — the `Converter`/`AsyncConverter` seam.
//! - [`builtin`] — hand-written converters for primitives and well-known
//!   foreign types (strings, bytes, timestamps, GUIDs, big integers).
//! - [`cache`] — the `TypeId`-keyed converter cache.
//! - [`visitor`] — generic converters built purely from a shape
//!   (nullable, enumerable, dictionary) without per-type codegen.
//! - [`object`] — the two object wire layouts and unused-data capture,
//!   shared by derive-generated per-struct converters.
//! - [`union`] — the alias-dispatched sub-type converter.
//! - [`options`] — tunables for the cache and the I/O layers.
//! - [`registry`] — the `Shaped` trait binding a concrete Rust type to its
//!   converter, implemented by hand here for primitives/built-ins and by
//!   `shapepack-derive` for generated types.
//! - [`api`] — the public serialize/deserialize entry points.

pub mod api;
pub mod builtin;
pub mod bulk;
pub mod cache;
pub mod chunk;
pub mod chunk_pool;
pub mod context;
pub mod converter;
pub mod error;
pub mod io;
pub mod object;
pub mod options;
pub mod reference;
pub mod registry;
pub mod shape;
pub mod token;
pub mod union;
pub mod visitor;

pub use cache::ConverterCache;
pub use context::SerializeContext;
pub use converter::{AsyncConverter, Converter};
pub use error::{Error, ErrorCode, Result};
pub use options::{CacheOptions, CacheOptionsBuilder};
pub use registry::Shaped;
pub use shape::TypeShape;
