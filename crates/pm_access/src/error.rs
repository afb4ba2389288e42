use alloc::borrow::Cow;
use alloc::string::String;

use pm_expr::{ArgumentError, CompileError, MemberError, Type};
use pm_text::{ConversionError, TextError, UnsupportedType};
use thiserror::Error;

// -----------------------------------------------------------------------------
// ShapeError

/// A lambda that is not a single-parameter member access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShapeError {
    #[error("an accessor lambda takes exactly one parameter, found {found}")]
    ParameterCount { found: usize },

    #[error("the accessor parameter is a `{found}`, expected `{expected}`")]
    ParameterType { expected: Type, found: Type },

    #[error("the accessor body must read a member of its parameter, found `{body}`")]
    NotMemberAccess { body: String },

    #[error("member `{member}` belongs to `{owner}`, expected a member of `{expected}`")]
    ForeignMember {
        member: Cow<'static, str>,
        owner: Type,
        expected: Type,
    },
}

// -----------------------------------------------------------------------------
// BuildError

/// A failure to build an accessor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

// -----------------------------------------------------------------------------
// AccessError

/// The reason of an [`AccessError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessErrorKind {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Member(#[from] MemberError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedType),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("no such property")]
    Unknown,
}

impl From<TextError> for AccessErrorKind {
    fn from(err: TextError) -> Self {
        match err {
            TextError::Unsupported(err) => AccessErrorKind::Unsupported(err),
            TextError::Conversion(err) => AccessErrorKind::Conversion(err),
        }
    }
}

/// A failed get or set, tagged with the property name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot access property `{member}`")]
pub struct AccessError {
    member: Cow<'static, str>,
    #[source]
    kind: AccessErrorKind,
}

impl AccessError {
    /// Creates an error for `member`.
    #[inline]
    pub fn new(member: impl Into<Cow<'static, str>>, kind: impl Into<AccessErrorKind>) -> Self {
        Self {
            member: member.into(),
            kind: kind.into(),
        }
    }

    /// Returns the property name.
    #[inline]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Returns the reason.
    #[inline]
    pub fn kind(&self) -> &AccessErrorKind {
        &self.kind
    }

    /// Consumes the error, returning the reason.
    #[inline]
    pub fn into_kind(self) -> AccessErrorKind {
        self.kind
    }

    /// Returns `true` if a text conversion failed.
    #[inline]
    pub fn is_conversion(&self) -> bool {
        matches!(self.kind, AccessErrorKind::Conversion(_))
    }

    /// Returns `true` if no strategy exists for the value type.
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, AccessErrorKind::Unsupported(_))
    }
}

/// Moves type errors of an erased member write into the argument category.
pub(crate) fn member_error(err: MemberError) -> AccessErrorKind {
    match err {
        MemberError::WrongTarget { owner, .. } => {
            ArgumentError::WrongTarget { expected: owner }.into()
        }
        MemberError::ValueType {
            expected, found, ..
        } => ArgumentError::TypeMismatch {
            argument: "value",
            expected,
            found,
        }
        .into(),
        err => AccessErrorKind::Member(err),
    }
}
