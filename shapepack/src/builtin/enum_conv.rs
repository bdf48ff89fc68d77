//! Converter for `Enum` shapes (spec §4.D): a closed set of named integer
//! values. Written as the minimal-form integer discriminant by default, or
//! as a string (the variant's declared name) when
//! `CacheOptions::serialize_enum_values_by_name` is set. Types derive
//! `WireEnum` (by hand here; `shapepack-derive` can grow a derive for it
//! alongside `MsgShape` if a consuming schema needs one) to say which
//! integer and name a variant maps to and back.

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::TypeShape;
use crate::token::TokenKind;

pub trait WireEnum: Copy + Sized {
    fn discriminant(&self) -> i64;
    fn from_discriminant(value: i64) -> Option<Self>;
    fn name(&self) -> &'static str;
    /// `(name, discriminant)` for every variant, in declaration order.
    fn variants() -> &'static [(&'static str, i64)];
    fn type_name() -> &'static str;
}

pub struct EnumConverter<T> {
    shape: TypeShape,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: WireEnum> EnumConverter<T> {
    pub fn new(variant_type_id: std::any::TypeId) -> Self {
        EnumConverter {
            shape: TypeShape::Enum { variant_type_id },
            _marker: std::marker::PhantomData,
        }
    }
}

fn from_name<T: WireEnum>(name: &str) -> Option<T> {
    T::variants()
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .or_else(|| T::variants().iter().find(|(candidate, _)| candidate.eq_ignore_ascii_case(name)))
        .and_then(|(_, discriminant)| T::from_discriminant(*discriminant))
}

impl<T: WireEnum + Send + Sync + 'static> Converter<T> for EnumConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &T) -> Result<()> {
        if ctx.options().serialize_enum_values_by_name() {
            StreamWriter::new(buffer).write_string(value.name());
        } else {
            StreamWriter::new(buffer).write_integer(value.discriminant() as i128);
        }
        Ok(())
    }

    fn read(&self, _ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<T> {
        match BufferedReader::new(buffer).peek_next_type()? {
            TokenKind::String => {
                let text = BufferedReader::new(buffer).read_string()?;
                // Case-sensitive match first (tried inside from_name), then
                // case-insensitive; if neither matches, fall back to treating
                // the text itself as a stringified ordinal.
                from_name::<T>(&text)
                    .or_else(|| text.parse::<i64>().ok().and_then(T::from_discriminant))
                    .ok_or_else(|| Error::unknown_alias(format!("\"{text}\" is not a valid {} variant name", T::type_name())))
            }
            _ => {
                let raw = BufferedReader::new(buffer).read_i64()?;
                T::from_discriminant(raw).ok_or_else(|| Error::unknown_alias(format!("{raw} is not a valid {} discriminant", T::type_name())))
            }
        }
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CacheOptions;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Suit {
        Clubs,
        Diamonds,
        Hearts,
        Spades,
    }

    impl WireEnum for Suit {
        fn discriminant(&self) -> i64 {
            *self as i64
        }
        fn from_discriminant(value: i64) -> Option<Self> {
            match value {
                0 => Some(Suit::Clubs),
                1 => Some(Suit::Diamonds),
                2 => Some(Suit::Hearts),
                3 => Some(Suit::Spades),
                _ => None,
            }
        }
        fn name(&self) -> &'static str {
            match self {
                Suit::Clubs => "Clubs",
                Suit::Diamonds => "Diamonds",
                Suit::Hearts => "Hearts",
                Suit::Spades => "Spades",
            }
        }
        fn variants() -> &'static [(&'static str, i64)] {
            &[("Clubs", 0), ("Diamonds", 1), ("Hearts", 2), ("Spades", 3)]
        }
        fn type_name() -> &'static str {
            "Suit"
        }
    }

    #[test]
    fn round_trips_a_variant() {
        let conv = EnumConverter::<Suit>::new(std::any::TypeId::of::<Suit>());
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        conv.write(&mut ctx, &mut buf, &Suit::Hearts).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), Suit::Hearts);
    }

    #[test]
    fn unknown_discriminant_errors() {
        let conv = EnumConverter::<Suit>::new(std::any::TypeId::of::<Suit>());
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        StreamWriter::new(&mut buf).write_integer(99);
        assert!(conv.read(&mut ctx, &mut buf).is_err());
    }

    #[test]
    fn named_mode_round_trips_by_string() {
        let conv = EnumConverter::<Suit>::new(std::any::TypeId::of::<Suit>());
        let mut ctx = SerializeContext::new(crate::context::CancellationToken::new())
            .with_options(CacheOptions::builder().serialize_enum_values_by_name(true).build());
        let mut buf = SegmentBuffer::new();
        conv.write(&mut ctx, &mut buf, &Suit::Spades).unwrap();
        let mut replay = SegmentBuffer::new();
        replay.extend_from_slice(&buf.drain_to_vec());
        assert_eq!(BufferedReader::new(&mut replay).peek_next_type().unwrap(), TokenKind::String);
        assert_eq!(conv.read(&mut ctx, &mut replay).unwrap(), Suit::Spades);
    }

    #[test]
    fn named_mode_read_is_case_insensitive_and_falls_back_to_ordinal() {
        let conv = EnumConverter::<Suit>::new(std::any::TypeId::of::<Suit>());
        let mut ctx = SerializeContext::default();

        let mut buf = SegmentBuffer::new();
        StreamWriter::new(&mut buf).write_string("hearts");
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), Suit::Hearts);

        let mut buf = SegmentBuffer::new();
        StreamWriter::new(&mut buf).write_integer(3);
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), Suit::Spades);
    }
}
