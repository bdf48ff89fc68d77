//! Wire codec and buffer layers (spec §4.A, §4.B).

pub mod async_io;
pub mod buffer;
pub mod buffered_reader;
pub mod decode_result;
pub mod reader;
pub mod writer;
