//! Closed error taxonomy surfaced at every converter boundary (spec §7).

use std::borrow::Cow;
use std::fmt;

/// A single step in a decode/encode breadcrumb trail. Advisory only: tests
/// must assert on [`Error::code`], never on the rendered text.
#[derive(Debug, Clone, Default)]
pub struct Breadcrumb {
    /// Byte offset consumed so far when the error was raised (decode only).
    pub offset: Option<usize>,
    /// Recursion depth at the point of failure.
    pub depth: Option<u32>,
    /// Property path accumulated while descending into an object (encode or decode).
    pub property_path: Vec<Cow<'static, str>>,
}

impl Breadcrumb {
    pub fn push_property(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.property_path.push(name.into());
        self
    }
}

/// Closed set of error codes a converter may raise. New variants are a
/// breaking change by design — callers are expected to match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unspecified,
    InvalidData,
    UnexpectedNil,
    DepthExceeded,
    ArityMismatch,
    MissingRequiredProperty,
    DoublePropertyAssignment,
    UnknownAlias,
    UnsupportedType,
    Cancelled,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Unspecified => "Unspecified",
            ErrorCode::InvalidData => "InvalidData",
            ErrorCode::UnexpectedNil => "UnexpectedNil",
            ErrorCode::DepthExceeded => "DepthExceeded",
            ErrorCode::ArityMismatch => "ArityMismatch",
            ErrorCode::MissingRequiredProperty => "MissingRequiredProperty",
            ErrorCode::DoublePropertyAssignment => "DoublePropertyAssignment",
            ErrorCode::UnknownAlias => "UnknownAlias",
            ErrorCode::UnsupportedType => "UnsupportedType",
            ErrorCode::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// The library's single error type. Every converter, the cache, the codec
/// and the union dispatcher raise this.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: Cow<'static, str>,
    pub breadcrumb: Breadcrumb,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Error {
            code,
            message: message.into(),
            breadcrumb: Breadcrumb::default(),
            source: None,
        }
    }

    pub fn invalid_data(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::InvalidData, message)
    }

    pub fn unexpected_nil(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::UnexpectedNil, message)
    }

    pub fn depth_exceeded(max_depth: u32) -> Self {
        Self::new(
            ErrorCode::DepthExceeded,
            format!("recursion depth exceeded configured maximum of {max_depth}"),
        )
        .with_depth(max_depth)
    }

    pub fn arity_mismatch(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ArityMismatch, message)
    }

    pub fn missing_required_property(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::MissingRequiredProperty,
            format!("missing required property `{name}`"),
        )
        .with_property(name)
    }

    pub fn double_property_assignment(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::DoublePropertyAssignment,
            format!("property `{name}` was assigned twice in the same object"),
        )
        .with_property(name)
    }

    pub fn unknown_alias(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::UnknownAlias, message)
    }

    pub fn unsupported_type(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::UnsupportedType, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "operation cancelled")
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.breadcrumb.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.breadcrumb.depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.breadcrumb = std::mem::take(&mut self.breadcrumb).push_property(name);
        self
    }
}

impl From<std::io::Error> for Error {
    fn from(io_error: std::io::Error) -> Self {
        Error {
            code: ErrorCode::Unspecified,
            message: Cow::Borrowed("byte source/sink I/O failure"),
            breadcrumb: Breadcrumb::default(),
            source: Some(Box::new(io_error)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
