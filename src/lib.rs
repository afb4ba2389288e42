#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use pm_access as access;
pub use pm_expr as expr;
pub use pm_text as text;
pub use pm_utils as utils;

/// The most used items of every crate.
pub mod prelude {
    pub use pm_access::capability::{
        DynPropertyAccess, ErasedAccess, ErasedTextAccess, ObjectAccess, PropertyAccess,
        PropertyInfo, TextAccess, ValueAccess,
    };
    pub use pm_access::{AccessError, Accessor, AccessorTable, BuildError, DynAccessor};
    pub use pm_expr::{
        AnyValue, Expr, Lambda, MemberRef, MergeOperator, Param, Property, Type, merge_all,
        merge_expressions, property, replace_parameter,
    };
    pub use pm_text::{ConversionRegistry, TextConverter};
}
