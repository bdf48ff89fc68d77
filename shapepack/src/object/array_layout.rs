//! Keyed-array object layout (spec §4.G): properties are written
//! positionally, by declaration order, as a plain MessagePack array. A
//! maximal trailing run of properties still holding their default value
//! can be omitted entirely, shrinking the array — the open question of
//! whether an *all-default* object collapses to a zero-length array or is
//! better served by falling back to the map layout is resolved in
//! `DESIGN.md`.
//!
//! These functions only handle the header bookkeeping; derive-generated
//! `Converter` impls iterate their own fields and call `write_header`/
//! `read_header` to know how many properties to actually emit or expect.

use crate::error::Result;
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::token::TokenKind;

/// The wire form an array-layout object was actually decoded from. A plain
/// `Array` is the form this layout writes; `Map` is the map-downgraded form
/// spec §4.G requires decoders to still accept (an integer-keyed map, e.g.
/// produced by a writer that chose to emit one for schema-evolution
/// tolerance). This layout never *writes* the map form itself.
pub enum HeaderForm {
    Array(u32),
    Map(u32),
}

/// Number of trailing `true` (= "holds its default value and is elidable")
/// entries in declaration order.
pub fn trailing_elidable_count(is_default: &[bool]) -> usize {
    is_default.iter().rev().take_while(|&&d| d).count()
}

/// Write the array header for `total_properties` declared properties,
/// eliding the maximal elidable trailing run described by `is_default`
/// (indexed the same as the full property list). Returns how many leading
/// properties the caller should actually write.
pub fn write_header(buffer: &mut SegmentBuffer, total_properties: usize, is_default: &[bool]) -> usize {
    debug_assert_eq!(total_properties, is_default.len());
    let elided = trailing_elidable_count(is_default);
    let emitted = total_properties - elided;
    StreamWriter::new(buffer).write_array_header(emitted as u32);
    emitted
}

/// Read the array-layout header, accepting either the plain array form this
/// layout writes or a map-downgraded form (integer keys) per spec §4.G.
pub fn read_header(buffer: &mut SegmentBuffer) -> Result<HeaderForm> {
    if BufferedReader::new(buffer).peek_next_type()? == TokenKind::Map {
        let len = BufferedReader::new(buffer).read_map_header()?;
        Ok(HeaderForm::Map(len))
    } else {
        let len = BufferedReader::new(buffer).read_array_header()?;
        Ok(HeaderForm::Array(len))
    }
}

/// Read one integer property key out of a map-downgraded array-layout object.
pub fn read_map_key(buffer: &mut SegmentBuffer) -> Result<u32> {
    BufferedReader::new(buffer).read_u32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elides_only_a_trailing_run() {
        // [false, true, true] -> trailing run of 2 elidable defaults.
        assert_eq!(trailing_elidable_count(&[false, true, true]), 2);
        // A non-default property in the middle stops the run from the end.
        assert_eq!(trailing_elidable_count(&[true, false, true]), 1);
    }

    #[test]
    fn write_header_emits_reduced_count() {
        let mut buf = SegmentBuffer::new();
        let emitted = write_header(&mut buf, 4, &[false, false, true, true]);
        assert_eq!(emitted, 2);
        assert!(matches!(read_header(&mut buf).unwrap(), HeaderForm::Array(2)));
    }

    #[test]
    fn all_default_elides_to_a_zero_length_array() {
        let mut buf = SegmentBuffer::new();
        let emitted = write_header(&mut buf, 3, &[true, true, true]);
        assert_eq!(emitted, 0);
        assert!(matches!(read_header(&mut buf).unwrap(), HeaderForm::Array(0)));
    }

    #[test]
    fn accepts_a_map_downgraded_header() {
        let mut buf = SegmentBuffer::new();
        StreamWriter::new(&mut buf).write_map_header(2);
        match read_header(&mut buf).unwrap() {
            HeaderForm::Map(len) => assert_eq!(len, 2),
            HeaderForm::Array(_) => panic!("expected a map header"),
        }
    }
}
