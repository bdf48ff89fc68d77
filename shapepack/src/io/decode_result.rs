//! Result discipline for the streaming layer (spec §4.A): a read either
//! succeeds, needs more bytes, has hit the end of the source, or found a
//! format byte that doesn't match what the caller expected.

use crate::token::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult<T> {
    Success(T),
    InsufficientBuffer,
    EndOfStream,
    TokenMismatch { expected: TokenKind, found: TokenKind },
}

impl<T> DecodeResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeResult::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodeResult<U> {
        match self {
            DecodeResult::Success(v) => DecodeResult::Success(f(v)),
            DecodeResult::InsufficientBuffer => DecodeResult::InsufficientBuffer,
            DecodeResult::EndOfStream => DecodeResult::EndOfStream,
            DecodeResult::TokenMismatch { expected, found } => DecodeResult::TokenMismatch { expected, found },
        }
    }
}
