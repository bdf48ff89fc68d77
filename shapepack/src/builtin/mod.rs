//! Hand-written converters for the built-in scalar and near-scalar types
//! (spec §4.D).

pub mod bignum;
pub mod bytes;
pub mod date;
pub mod enum_conv;
pub mod guid;
pub mod scalar;
pub mod string;
pub mod timestamp_ext;
