use alloc::string::{String, ToString};
use core::fmt::Display;

use pm_expr::Type;
use thiserror::Error;

// -----------------------------------------------------------------------------
// UnsupportedType

/// No text conversion strategy exists for a type.
///
/// Once returned for a type, a registry keeps returning it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no text conversion strategy for `{ty}`")]
pub struct UnsupportedType {
    ty: Type,
}

impl UnsupportedType {
    /// Creates the error for `ty`.
    #[inline]
    pub const fn new(ty: Type) -> Self {
        Self { ty }
    }

    /// Returns the unsupported type.
    #[inline]
    pub const fn ty(&self) -> Type {
        self.ty
    }
}

// -----------------------------------------------------------------------------
// ConversionError

/// A failed conversion between a value and its text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConversionError {
    #[error("cannot parse {input:?} as `{ty}`: {message}")]
    Parse {
        ty: Type,
        input: String,
        message: String,
    },

    #[error("cannot render `{ty}` as text: {message}")]
    Render { ty: Type, message: String },

    #[error("the value passed to the `{expected}` strategy has another type")]
    ValueType { expected: Type },
}

impl ConversionError {
    /// A parse failure of `input` into a `V`.
    pub fn parse<V: ?Sized + 'static>(input: &str, message: impl Display) -> Self {
        ConversionError::Parse {
            ty: Type::of::<V>(),
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// A render failure of a `V`.
    pub fn render<V: ?Sized + 'static>(message: impl Display) -> Self {
        ConversionError::Render {
            ty: Type::of::<V>(),
            message: message.to_string(),
        }
    }

    /// Returns the type of the conversion.
    pub fn ty(&self) -> Type {
        match self {
            ConversionError::Parse { ty, .. } | ConversionError::Render { ty, .. } => *ty,
            ConversionError::ValueType { expected } => *expected,
        }
    }
}

// -----------------------------------------------------------------------------
// TextError

/// Any failure of a registry text operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedType),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
