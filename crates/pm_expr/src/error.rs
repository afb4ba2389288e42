use alloc::borrow::Cow;
use alloc::string::String;

use thiserror::Error;

use crate::Type;

// -----------------------------------------------------------------------------
// ArgumentError

/// An invalid argument passed to an expression or accessor operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArgumentError {
    #[error("`{argument}` must contain at least one expression")]
    Empty { argument: &'static str },

    #[error("`{argument}` expects {expected} parameter(s), found {found}")]
    ParameterCount {
        argument: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("`{argument}` has a parameter of type `{found}`, incompatible with `{expected}`")]
    IncompatibleParameter {
        argument: &'static str,
        expected: Type,
        found: Type,
    },

    #[error("`{argument}` must produce `{expected}`, found `{found}`")]
    ResultType {
        argument: &'static str,
        expected: Type,
        found: Type,
    },

    #[error("the target is not a `{expected}`")]
    WrongTarget { expected: Type },

    #[error("`{argument}` expects a value of type `{expected}`, found `{found}`")]
    TypeMismatch {
        argument: &'static str,
        expected: Type,
        found: Type,
    },
}

// -----------------------------------------------------------------------------
// MemberError

/// A failure of a type-erased member read or write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MemberError {
    #[error("member `{member}` belongs to `{owner}`, the target is not an instance of it")]
    WrongTarget {
        member: Cow<'static, str>,
        owner: Type,
    },

    #[error("member `{member}` holds `{expected}`, found a `{found}`")]
    ValueType {
        member: Cow<'static, str>,
        expected: Type,
        found: Type,
    },

    #[error("member `{member}` is read-only")]
    ReadOnly { member: Cow<'static, str> },
}

// -----------------------------------------------------------------------------
// CompileError

/// A failure while turning an expression into executable closures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    #[error("parameter `{name}: {ty}` is not bound by any enclosing lambda")]
    UnboundParameter { name: Cow<'static, str>, ty: Type },

    #[error("{context}: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        context: &'static str,
        expected: Type,
        found: Type,
    },

    #[error("member `{member}` of `{owner}` cannot be read from a `{found}`")]
    InvalidTarget {
        member: Cow<'static, str>,
        owner: Type,
        found: Type,
    },

    #[error("member `{member}` is read-only")]
    ReadOnly { member: Cow<'static, str> },

    #[error("member `{member}` holds `{found}`, expected `{expected}`")]
    MemberType {
        member: Cow<'static, str>,
        expected: Type,
        found: Type,
    },

    #[error("expected a lambda of {expected} parameter(s), found {found}")]
    Arity { expected: usize, found: usize },

    #[error("`{node}` nodes cannot be compiled in this position")]
    Unsupported { node: &'static str },
}

// -----------------------------------------------------------------------------
// EvalError

/// A failure while evaluating a compiled expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
    #[error("expected {expected} argument(s), found {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument #{index} is not a `{expected}`")]
    ArgumentType { index: usize, expected: Type },

    #[error("member `{member}` cannot be read, the value is not a `{owner}`")]
    MemberTarget {
        member: Cow<'static, str>,
        owner: Type,
    },

    #[error("argument of type `{ty}` is borrowed and cannot be returned by value")]
    BorrowedArgument { ty: Type },

    #[error("operator `{op}` cannot be applied to {found}")]
    Operand { op: &'static str, found: String },

    #[error("condition evaluated to {found}, not a bool")]
    NotBoolean { found: &'static str },

    #[error("`{left}` and `{right}` values cannot be compared")]
    Incomparable {
        left: &'static str,
        right: &'static str,
    },

    #[error("division by zero")]
    DivideByZero,

    #[error("integer overflow in `{op}`")]
    Overflow { op: &'static str },

    #[error("function `{name}` failed: {message}")]
    Function {
        name: Cow<'static, str>,
        message: String,
    },
}
