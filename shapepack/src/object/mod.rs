//! Object converter building blocks (spec §4.F, §4.G, §4.J): the two wire
//! layouts and the unused-data capture/replay used by both. Full per-struct
//! `Converter` implementations are generated by `shapepack-derive`, which
//! calls into these modules rather than re-deriving the bookkeeping itself.

pub mod arg_state;
pub mod array_layout;
pub mod map_layout;
pub mod unused_data;
