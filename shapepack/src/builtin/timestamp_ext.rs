//! The MessagePack timestamp extension (type `-1`, spec §4.A): encodes a
//! `(seconds, nanoseconds)` pair in the narrowest of three wire widths.
//! `date.rs` builds `chrono` conversions on top of this; this module only
//! knows about the raw components so it's testable without pulling in a
//! date/time library's own round-trip edge cases.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::token::EXT_TIMESTAMP;

pub fn write_timestamp(buffer: &mut SegmentBuffer, seconds: i64, nanos: u32) -> Result<()> {
    if nanos >= 1_000_000_000 {
        return Err(Error::invalid_data(format!("nanosecond component {nanos} out of range")));
    }
    let mut writer = StreamWriter::new(buffer);
    if nanos == 0 && (0..=u32::MAX as i64).contains(&seconds) {
        let mut payload = [0u8; 4];
        BigEndian::write_u32(&mut payload, seconds as u32);
        writer.write_extension(EXT_TIMESTAMP, &payload);
    } else if (0..(1i64 << 34)).contains(&seconds) {
        let combined = ((nanos as u64) << 34) | (seconds as u64);
        let mut payload = [0u8; 8];
        BigEndian::write_u64(&mut payload, combined);
        writer.write_extension(EXT_TIMESTAMP, &payload);
    } else {
        let mut payload = [0u8; 12];
        BigEndian::write_u32(&mut payload[0..4], nanos);
        BigEndian::write_i64(&mut payload[4..12], seconds);
        writer.write_extension(EXT_TIMESTAMP, &payload);
    }
    Ok(())
}

pub fn read_timestamp(buffer: &mut SegmentBuffer) -> Result<(i64, u32)> {
    let mut reader = BufferedReader::new(buffer);
    let (tag, len) = reader.read_extension_header()?;
    if tag != EXT_TIMESTAMP {
        return Err(Error::invalid_data(format!("expected timestamp extension tag {EXT_TIMESTAMP}, found {tag}")));
    }
    let payload = reader.read_raw(len as usize)?;
    match payload.len() {
        4 => Ok((BigEndian::read_u32(&payload) as i64, 0)),
        8 => {
            let combined = BigEndian::read_u64(&payload);
            let seconds = (combined & 0x3_ffff_ffff) as i64;
            let nanos = (combined >> 34) as u32;
            Ok((seconds, nanos))
        }
        12 => {
            let nanos = BigEndian::read_u32(&payload[0..4]);
            let seconds = BigEndian::read_i64(&payload[4..12]);
            Ok((seconds, nanos))
        }
        other => Err(Error::invalid_data(format!("unsupported timestamp payload length {other}"))),
    }
}
