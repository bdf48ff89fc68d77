//! Sub-type dispatcher for `Union` shapes (spec §4.H): the wire
//! representation is a 2-element array `[alias, payload]`. `alias` is
//! `Nil` for the declared base type, or an integer/string discriminator for
//! a registered subtype — the same subtype can round-trip through either
//! alias form independently, so lookup tries whichever token kind the
//! discriminator actually decoded as.

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::io::buffer::SegmentBuffer;
use crate::io::buffered_reader::BufferedReader;
use crate::io::writer::StreamWriter;
use crate::shape::{Alias, TypeShape, UnionAlternative};
use crate::token::TokenKind;

pub struct UnionAlternativeBinding<T> {
    pub alias: Alias,
    pub matches: fn(&T) -> bool,
    pub write_payload: fn(&mut SerializeContext, &mut SegmentBuffer, &T) -> Result<()>,
    pub construct: fn(&mut SerializeContext, &mut SegmentBuffer) -> Result<T>,
}

pub struct UnionConverter<T> {
    shape: TypeShape,
    alternatives: Vec<UnionAlternativeBinding<T>>,
}

impl<T> UnionConverter<T> {
    pub fn new(alternatives: Vec<UnionAlternativeBinding<T>>, shape_alternatives: Vec<UnionAlternative>) -> Self {
        UnionConverter { shape: TypeShape::Union { alternatives: shape_alternatives }, alternatives }
    }
}

impl<T: Send + Sync + 'static> Converter<T> for UnionConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &T) -> Result<()> {
        let binding = self
            .alternatives
            .iter()
            .find(|a| (a.matches)(value))
            .ok_or_else(|| Error::unsupported_type("value did not match any union alternative"))?;
        ctx.enter(|ctx| {
            StreamWriter::new(buffer).write_array_header(2);
            match &binding.alias {
                Alias::Base => StreamWriter::new(buffer).write_nil(),
                Alias::Integer(tag) => StreamWriter::new(buffer).write_integer(*tag as i128),
                Alias::Text(alias) => StreamWriter::new(buffer).write_string(alias),
            }
            (binding.write_payload)(ctx, buffer, value)
        })
    }

    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<T> {
        ctx.enter(|ctx| {
            let len = BufferedReader::new(buffer).read_array_header()?;
            if len < 2 {
                return Err(Error::arity_mismatch(format!("union values are at least a 2-element array, found {len} elements")));
            }
            let discriminator_kind = BufferedReader::new(buffer).peek_next_type()?;
            let binding = match discriminator_kind {
                TokenKind::Nil => {
                    BufferedReader::new(buffer).read_nil()?;
                    self.alternatives.iter().find(|a| a.alias == Alias::Base)
                }
                TokenKind::Integer => {
                    let tag = BufferedReader::new(buffer).read_i64()?;
                    self.alternatives.iter().find(|a| a.alias == Alias::Integer(tag))
                }
                TokenKind::String => {
                    let text = BufferedReader::new(buffer).read_string()?;
                    self.alternatives.iter().find(|a| a.alias == Alias::Text(text.clone().into()))
                }
                other => {
                    return Err(Error::invalid_data(format!("union discriminator must be nil, an integer, or a string, found {other:?}")))
                }
            };
            let binding = binding.ok_or_else(|| {
                tracing::debug!(?discriminator_kind, "union converter: no alternative matches this discriminator");
                Error::unknown_alias("no registered union alternative matches this discriminator")
            })?;
            let value = (binding.construct)(ctx, buffer)?;
            for _ in 0..(len - 2) {
                BufferedReader::new(buffer).skip()?;
            }
            Ok(value)
        })
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}
