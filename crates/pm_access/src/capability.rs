//! Provide the capability traits implemented by accessors.
//!
//! Each trait covers one axis: typed values, boxed values, fully erased
//! values, and text. [`PropertyAccess`] and [`DynPropertyAccess`] bundle the
//! axes needed for heterogeneous collections and are implemented for every
//! type implementing their parts.

use alloc::string::String;
use core::any::Any;

use pm_expr::{AnyValue, MemberId, Type};

use crate::AccessError;

/// Describes the property behind an accessor.
pub trait PropertyInfo: Send + Sync {
    /// Returns the member identity.
    fn id(&self) -> &MemberId;

    /// Returns the type of the property value.
    fn value_type(&self) -> Type;

    /// Returns the property name.
    #[inline]
    fn name(&self) -> &str {
        self.id().name()
    }

    /// Returns the type declaring the property.
    #[inline]
    fn owner_type(&self) -> Type {
        self.id().owner()
    }
}

/// Typed access to a `V` property of `T`.
pub trait ValueAccess<T, V>: PropertyInfo {
    fn get(&self, target: &T) -> V;

    fn set(&self, target: &mut T, value: V);
}

/// Access to a property of `T` with a boxed value.
pub trait ObjectAccess<T>: PropertyInfo {
    fn get_boxed(&self, target: &T) -> Result<AnyValue, AccessError>;

    /// Fails if `value` is not of the property type.
    fn set_boxed(&self, target: &mut T, value: AnyValue) -> Result<(), AccessError>;
}

/// Access with both the owner and the value erased.
pub trait ErasedAccess: PropertyInfo {
    /// Fails if `target` is not of the owner type.
    fn get_any(&self, target: &dyn Any) -> Result<AnyValue, AccessError>;

    /// Fails if `target` is not of the owner type or `value` not of the
    /// property type.
    fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), AccessError>;
}

/// Text access to a property of `T`.
pub trait TextAccess<T>: PropertyInfo {
    fn get_text(&self, target: &T) -> Result<String, AccessError>;

    fn set_text(&self, target: &mut T, text: &str) -> Result<(), AccessError>;

    /// Assigns `default` instead when `text` does not parse or the value
    /// type has no text strategy.
    fn set_text_or_default(
        &self,
        target: &mut T,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError>;
}

/// Text access with the owner erased.
pub trait ErasedTextAccess: PropertyInfo {
    fn get_text_any(&self, target: &dyn Any) -> Result<String, AccessError>;

    fn set_text_any(&self, target: &mut dyn Any, text: &str) -> Result<(), AccessError>;

    /// Assigns `default` instead when `text` does not parse or the value
    /// type has no text strategy. A `default` that is not the property's
    /// value type is an `ArgumentError`.
    fn set_text_or_default_any(
        &self,
        target: &mut dyn Any,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError>;
}

/// Boxed and text access to a property of `T`.
pub trait PropertyAccess<T>: ObjectAccess<T> + TextAccess<T> {}

impl<T, A: ObjectAccess<T> + TextAccess<T> + ?Sized> PropertyAccess<T> for A {}

/// Erased value and text access.
pub trait DynPropertyAccess: ErasedAccess + ErasedTextAccess {}

impl<A: ErasedAccess + ErasedTextAccess + ?Sized> DynPropertyAccess for A {}
