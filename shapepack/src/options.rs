//! Tunables for the converter cache and the streaming I/O layers (spec
//! §4.E.2). Plain builder, not a config file: callers construct one
//! `CacheOptions` up front and hand it to `api::converter_for`/`api::serialize`.

use crate::context::{DEFAULT_MAX_DEPTH, DEFAULT_UNFLUSHED_BYTES_THRESHOLD};

pub const DEFAULT_MAX_ASYNC_BUFFER: usize = 1024 * 1024;

/// When a default-valued property should still be written to the wire,
/// rather than elided (array layout) or omitted (map layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializeDefaultValues {
    #[default]
    Never,
    Always,
    Required,
    ValueTypes,
    ReferenceTypes,
}

/// How an array-of-arrays is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiDimensionalArrayFormat {
    #[default]
    Nested,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    max_depth: u32,
    unflushed_bytes_threshold: usize,
    track_references: bool,
    serialize_default_values: SerializeDefaultValues,
    deserialize_default_values: bool,
    serialize_enum_values_by_name: bool,
    intern_strings: bool,
    multi_dimensional_array_format: MultiDimensionalArrayFormat,
    perf_over_schema_stability: bool,
    ignore_key_attributes: bool,
    property_naming_policy: Option<fn(&str) -> String>,
    max_async_buffer: usize,
}

impl CacheOptions {
    pub fn builder() -> CacheOptionsBuilder {
        CacheOptionsBuilder::default()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn unflushed_bytes_threshold(&self) -> usize {
        self.unflushed_bytes_threshold
    }

    pub fn track_references(&self) -> bool {
        self.track_references
    }

    pub fn serialize_default_values(&self) -> SerializeDefaultValues {
        self.serialize_default_values
    }

    pub fn deserialize_default_values(&self) -> bool {
        self.deserialize_default_values
    }

    pub fn serialize_enum_values_by_name(&self) -> bool {
        self.serialize_enum_values_by_name
    }

    pub fn intern_strings(&self) -> bool {
        self.intern_strings
    }

    pub fn multi_dimensional_array_format(&self) -> MultiDimensionalArrayFormat {
        self.multi_dimensional_array_format
    }

    pub fn perf_over_schema_stability(&self) -> bool {
        self.perf_over_schema_stability
    }

    pub fn ignore_key_attributes(&self) -> bool {
        self.ignore_key_attributes
    }

    pub fn property_naming_policy(&self) -> Option<fn(&str) -> String> {
        self.property_naming_policy
    }

    pub fn max_async_buffer(&self) -> usize {
        self.max_async_buffer
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptionsBuilder::default().build()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheOptionsBuilder {
    max_depth: u32,
    unflushed_bytes_threshold: usize,
    track_references: bool,
    serialize_default_values: SerializeDefaultValues,
    deserialize_default_values: bool,
    serialize_enum_values_by_name: bool,
    intern_strings: bool,
    multi_dimensional_array_format: MultiDimensionalArrayFormat,
    perf_over_schema_stability: bool,
    ignore_key_attributes: bool,
    property_naming_policy: Option<fn(&str) -> String>,
    max_async_buffer: usize,
}

impl CacheOptionsBuilder {
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn unflushed_bytes_threshold(mut self, threshold: usize) -> Self {
        self.unflushed_bytes_threshold = threshold;
        self
    }

    pub fn track_references(mut self, track: bool) -> Self {
        self.track_references = track;
        self
    }

    pub fn serialize_default_values(mut self, mode: SerializeDefaultValues) -> Self {
        self.serialize_default_values = mode;
        self
    }

    pub fn deserialize_default_values(mut self, replace_missing_with_default: bool) -> Self {
        self.deserialize_default_values = replace_missing_with_default;
        self
    }

    pub fn serialize_enum_values_by_name(mut self, by_name: bool) -> Self {
        self.serialize_enum_values_by_name = by_name;
        self
    }

    pub fn intern_strings(mut self, intern: bool) -> Self {
        self.intern_strings = intern;
        self
    }

    pub fn multi_dimensional_array_format(mut self, format: MultiDimensionalArrayFormat) -> Self {
        self.multi_dimensional_array_format = format;
        self
    }

    pub fn perf_over_schema_stability(mut self, prefer_perf: bool) -> Self {
        self.perf_over_schema_stability = prefer_perf;
        self
    }

    pub fn ignore_key_attributes(mut self, ignore: bool) -> Self {
        self.ignore_key_attributes = ignore;
        self
    }

    pub fn property_naming_policy(mut self, policy: Option<fn(&str) -> String>) -> Self {
        self.property_naming_policy = policy;
        self
    }

    pub fn max_async_buffer(mut self, max: usize) -> Self {
        self.max_async_buffer = max;
        self
    }

    pub fn build(self) -> CacheOptions {
        CacheOptions {
            max_depth: self.max_depth,
            unflushed_bytes_threshold: self.unflushed_bytes_threshold,
            track_references: self.track_references,
            serialize_default_values: self.serialize_default_values,
            deserialize_default_values: self.deserialize_default_values,
            serialize_enum_values_by_name: self.serialize_enum_values_by_name,
            intern_strings: self.intern_strings,
            multi_dimensional_array_format: self.multi_dimensional_array_format,
            perf_over_schema_stability: self.perf_over_schema_stability,
            ignore_key_attributes: self.ignore_key_attributes,
            property_naming_policy: self.property_naming_policy,
            max_async_buffer: self.max_async_buffer,
        }
    }
}

impl Default for CacheOptionsBuilder {
    fn default() -> Self {
        CacheOptionsBuilder {
            max_depth: DEFAULT_MAX_DEPTH,
            unflushed_bytes_threshold: DEFAULT_UNFLUSHED_BYTES_THRESHOLD,
            track_references: false,
            serialize_default_values: SerializeDefaultValues::default(),
            deserialize_default_values: false,
            serialize_enum_values_by_name: false,
            intern_strings: false,
            multi_dimensional_array_format: MultiDimensionalArrayFormat::default(),
            perf_over_schema_stability: false,
            ignore_key_attributes: false,
            property_naming_policy: None,
            max_async_buffer: DEFAULT_MAX_ASYNC_BUFFER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_context_defaults() {
        let opts = CacheOptions::default();
        assert_eq!(opts.max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(opts.unflushed_bytes_threshold(), DEFAULT_UNFLUSHED_BYTES_THRESHOLD);
        assert!(!opts.track_references());
        assert_eq!(opts.serialize_default_values(), SerializeDefaultValues::Never);
        assert!(!opts.deserialize_default_values());
        assert!(!opts.serialize_enum_values_by_name());
        assert_eq!(opts.multi_dimensional_array_format(), MultiDimensionalArrayFormat::Nested);
        assert_eq!(opts.max_async_buffer(), DEFAULT_MAX_ASYNC_BUFFER);
    }

    #[test]
    fn builder_overrides_fields() {
        let opts = CacheOptions::builder()
            .max_depth(8)
            .track_references(true)
            .serialize_default_values(SerializeDefaultValues::Always)
            .serialize_enum_values_by_name(true)
            .build();
        assert_eq!(opts.max_depth(), 8);
        assert!(opts.track_references());
        assert_eq!(opts.serialize_default_values(), SerializeDefaultValues::Always);
        assert!(opts.serialize_enum_values_by_name());
    }
}
