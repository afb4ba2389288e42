#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod compile;
mod error;
mod expr;
mod member;
mod toolkit;
mod types;
mod value;

pub mod visit;

// -----------------------------------------------------------------------------
// Top-level exports

pub use compile::{CompiledLambda, Predicate};
pub use error::{ArgumentError, CompileError, EvalError, MemberError};
pub use expr::{BinaryOp, Expr, Function, Lambda, MemberAccess, MergeOperator, Param, UnaryOp};
pub use member::{Member, MemberId, MemberRef, Property};
pub use toolkit::{merge_all, merge_expressions, replace_parameter};
pub use types::{ShortName, Type};
pub use value::{AnyValue, Value};
pub use visit::{ExprRewriter, ExprVisitor};
