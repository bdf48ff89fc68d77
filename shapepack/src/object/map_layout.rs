//! Property-map object layout (spec §4.F): properties are written as a
//! MessagePack map keyed by name. Unlike the keyed-array layout, any subset
//! of properties can be omitted — not just a trailing run — since presence
//! is determined by key lookup rather than position.

use hashbrown::HashSet;

use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;

pub fn write_header(buffer: &mut SegmentBuffer, present_count: usize) {
    StreamWriter::new(buffer).write_map_header(present_count as u32);
}

pub fn write_property_name(buffer: &mut SegmentBuffer, name: &str) {
    StreamWriter::new(buffer).write_string(name);
}

pub fn read_header(buffer: &mut SegmentBuffer) -> Result<u32> {
    BufferedReader::new(buffer).read_map_header()
}

pub fn read_property_name(buffer: &mut SegmentBuffer) -> Result<String> {
    BufferedReader::new(buffer).read_string()
}

/// Tracks which property names have been seen while reading one object, so
/// a derive-generated `read` can reject a key appearing twice in the same
/// map (spec §7, `ErrorCode::DoublePropertyAssignment`).
#[derive(Default)]
pub struct SeenProperties(HashSet<String>);

impl SeenProperties {
    pub fn new() -> Self {
        SeenProperties::default()
    }

    /// Records `name` as seen. Errors if it was already recorded.
    pub fn mark(&mut self, name: &str) -> Result<()> {
        if !self.0.insert(name.to_string()) {
            return Err(Error::double_property_assignment(name.to_string()));
        }
        Ok(())
    }
}
