#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// Environment, paths and locks.
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod env;
mod error;
mod macros;
mod registry;
mod strategy;

// -----------------------------------------------------------------------------
// Top-level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use env::{expand_env, expand_with};
pub use error::{ConversionError, TextError, UnsupportedType};
pub use registry::{ConversionRegistry, RoundTrip};
pub use strategy::{ErasedStrategy, StrategySource, TextConverter, TextStrategy};
