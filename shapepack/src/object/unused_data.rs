//! Unused-data packet (spec §4.J): properties an older schema doesn't know
//! about are captured as raw, still-encoded bytes instead of being
//! silently discarded, so round-tripping an object through a consumer that
//! predates a newer field doesn't lose that field. A shape opts in via
//! `TypeShape::Object { preserve_unused_data: true, .. }`.

use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::decode_result::DecodeResult;
use crate::io::reader::StreamReader;
use crate::io::writer::StreamWriter;

/// One captured-but-unrecognized entry. `key` is the property name for the
/// map layout, or `None` for a trailing positional entry in the array
/// layout (recognized purely by arriving past the known property count).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnusedDataPacket {
    entries: Vec<(Option<String>, Vec<u8>)>,
}

impl UnusedDataPacket {
    pub fn new() -> Self {
        UnusedDataPacket::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_named(&mut self, name: String, raw: Vec<u8>) {
        self.entries.push((Some(name), raw));
    }

    pub fn push_positional(&mut self, raw: Vec<u8>) {
        self.entries.push((None, raw));
    }

    pub fn entries(&self) -> &[(Option<String>, Vec<u8>)] {
        &self.entries
    }

    /// Re-emit every captured entry. For the map layout the caller has
    /// already written the header counting these entries in; for the array
    /// layout these simply extend the array with the original trailing
    /// values.
    pub fn write_all(&self, buffer: &mut SegmentBuffer) {
        for (name, raw) in &self.entries {
            if let Some(name) = name {
                StreamWriter::new(buffer).write_string(name);
            }
            StreamWriter::new(buffer).write_raw(raw);
        }
    }
}

/// Capture the next full value (of whatever shape) as raw encoded bytes,
/// consuming it from the buffer in the process.
pub fn capture_raw_value(buffer: &mut SegmentBuffer) -> Result<Vec<u8>> {
    let before = buffer.len();
    let snapshot = buffer
        .try_peek_take(before)
        .expect("try_peek_take(len()) always succeeds");
    match StreamReader::new(buffer).skip() {
        DecodeResult::Success(()) => {}
        DecodeResult::InsufficientBuffer => {
            return Err(Error::invalid_data("unexpected end of input while capturing unused data"))
        }
        DecodeResult::EndOfStream => return Err(Error::invalid_data("unexpected end of stream while capturing unused data")),
        DecodeResult::TokenMismatch { .. } => unreachable!("skip() never mismatches its own classification"),
    }
    let consumed = before - buffer.len();
    Ok(snapshot[..consumed].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::writer::StreamWriter as W;

    #[test]
    fn captures_a_scalar_value() {
        let mut buf = SegmentBuffer::new();
        W::new(&mut buf).write_integer(42);
        let raw = capture_raw_value(&mut buf).unwrap();
        assert!(buf.is_empty());
        // The captured bytes still decode to the same value.
        let mut replay = SegmentBuffer::new();
        replay.extend_from_slice(&raw);
        assert_eq!(
            crate::io::buffered_reader::BufferedReader::new(&mut replay).read_i64().unwrap(),
            42
        );
    }

    #[test]
    fn captures_a_nested_composite() {
        let mut buf = SegmentBuffer::new();
        {
            let mut w = W::new(&mut buf);
            w.write_array_header(2);
            w.write_string("x");
            w.write_integer(1);
        }
        let raw = capture_raw_value(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(raw.len(), 1 + 2 + 2); // fixarray byte + fixstr(1+1) + fixint
    }

    #[test]
    fn packet_round_trips_named_entries() {
        let mut packet = UnusedDataPacket::new();
        packet.push_named("legacy_field".to_string(), vec![0x01]);
        assert!(!packet.is_empty());
        let mut buf = SegmentBuffer::new();
        packet.write_all(&mut buf);
        let mut reader = crate::io::buffered_reader::BufferedReader::new(&mut buf);
        assert_eq!(reader.read_string().unwrap(), "legacy_field");
    }
}
