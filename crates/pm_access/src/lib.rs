#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod accessor;
mod dynamic;
mod error;
mod shape;
mod table;

pub mod capability;

// -----------------------------------------------------------------------------
// Top-level exports

pub use accessor::Accessor;
pub use dynamic::DynAccessor;
pub use error::{AccessError, AccessErrorKind, BuildError, ShapeError};
pub use table::AccessorTable;
