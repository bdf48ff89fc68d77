//! `chrono::DateTime<Utc>` converter built on the timestamp extension
//! (spec §4.D, supplemented feature — the distilled spec names "date/time"
//! among the built-in scalars without picking a concrete type; `chrono` is
//! the pack's established choice, e.g. `damus-io-notedeck`).

use chrono::{DateTime, TimeZone, Utc};

use crate::builtin::timestamp_ext::{read_timestamp, write_timestamp};
use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::shape::TypeShape;

pub struct DateTimeConverter {
    shape: TypeShape,
}

impl DateTimeConverter {
    pub fn new() -> Self {
        DateTimeConverter { shape: TypeShape::Primitive }
    }
}

impl Default for DateTimeConverter {
    fn default() -> Self {
        DateTimeConverter::new()
    }
}

impl Converter<DateTime<Utc>> for DateTimeConverter {
    fn write(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &DateTime<Utc>) -> Result<()> {
        write_timestamp(buffer, value.timestamp(), value.timestamp_subsec_nanos())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<DateTime<Utc>> {
        let (seconds, nanos) = read_timestamp(buffer)?;
        Utc.timestamp_opt(seconds, nanos)
            .single()
            .ok_or_else(|| Error::invalid_data(format!("timestamp ({seconds}, {nanos}) is out of range")))
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}
