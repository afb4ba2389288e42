//! Provide [`DynAccessor`], an accessor built from a member descriptor
//! without static knowledge of the owner or value type.

use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::hash::{Hash, Hasher};

use pm_expr::{AnyValue, ArgumentError, CompileError, MemberId, MemberRef, Type};
use pm_text::{ConversionRegistry, ErasedStrategy};

use crate::capability::{ErasedAccess, ErasedTextAccess, ObjectAccess, PropertyInfo, TextAccess};
use crate::error::member_error;
use crate::{AccessError, AccessErrorKind, BuildError};

/// A fully erased accessor.
///
/// Reads and writes go through the erased operations of the member
/// descriptor; text goes through the erased strategy of the value type.
///
/// # Examples
///
/// ```
/// use pm_access::DynAccessor;
/// use pm_access::capability::{ErasedAccess, ErasedTextAccess};
/// use pm_expr::{AnyValue, property};
///
/// #[derive(Default)]
/// struct Target { retries: u8 }
///
/// let retries = DynAccessor::from_member(property!(Target, retries: u8).into_ref()).unwrap();
/// let mut target = Target::default();
///
/// retries.set_text_any(&mut target, "3").unwrap();
/// assert_eq!(target.retries, 3);
/// assert_eq!(retries.get_any(&target).unwrap().take::<u8>().unwrap(), 3);
/// assert!(retries.set_any(&mut target, AnyValue::new(3_u32)).is_err());
/// ```
#[derive(Clone)]
pub struct DynAccessor {
    member: MemberRef,
    registry: Option<Arc<ConversionRegistry>>,
}

impl DynAccessor {
    /// Creates an accessor for a writable member.
    pub fn from_member(member: MemberRef) -> Result<Self, BuildError> {
        if !member.is_writable() {
            return Err(CompileError::ReadOnly {
                member: member.id().name_cow(),
            }
            .into());
        }
        Ok(Self::new_unchecked(member, None))
    }

    pub(crate) fn new_unchecked(member: MemberRef, registry: Option<Arc<ConversionRegistry>>) -> Self {
        Self { member, registry }
    }

    /// Binds the accessor to `registry` for text operations.
    #[inline]
    pub fn with_registry(mut self, registry: Arc<ConversionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Returns the registry used for text operations.
    #[inline]
    pub fn registry(&self) -> &ConversionRegistry {
        match &self.registry {
            Some(registry) => registry,
            None => ConversionRegistry::global(),
        }
    }

    /// Returns the member descriptor.
    #[inline]
    pub fn member(&self) -> &MemberRef {
        &self.member
    }

    fn error(&self, kind: impl Into<AccessErrorKind>) -> AccessError {
        AccessError::new(self.member.id().name_cow(), kind)
    }

    fn strategy(&self) -> Result<Arc<ErasedStrategy>, AccessError> {
        self.registry()
            .strategy_of(self.member.value_type())
            .map_err(|err| self.error(err))
    }

    fn write(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), AccessError> {
        self.member
            .set_any(target, value)
            .map_err(|err| self.error(member_error(err)))
    }
}

impl PartialEq for DynAccessor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.member.id() == other.member.id()
    }
}

impl Eq for DynAccessor {}

impl Hash for DynAccessor {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.id().hash(state);
    }
}

impl fmt::Debug for DynAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynAccessor")
            .field("member", &self.member.id())
            .field("value", &self.member.value_type())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Capabilities

impl PropertyInfo for DynAccessor {
    #[inline]
    fn id(&self) -> &MemberId {
        self.member.id()
    }

    #[inline]
    fn value_type(&self) -> Type {
        self.member.value_type()
    }
}

impl ErasedAccess for DynAccessor {
    fn get_any(&self, target: &dyn Any) -> Result<AnyValue, AccessError> {
        self.member
            .get_any(target)
            .map_err(|err| self.error(member_error(err)))
    }

    fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), AccessError> {
        self.write(target, value)
    }
}

impl ErasedTextAccess for DynAccessor {
    fn get_text_any(&self, target: &dyn Any) -> Result<String, AccessError> {
        let value = self.get_any(target)?;
        self.strategy()?
            .render_any(value.as_any())
            .map_err(|err| self.error(err))
    }

    fn set_text_any(&self, target: &mut dyn Any, text: &str) -> Result<(), AccessError> {
        let value = self.strategy()?.parse_any(text).map_err(|err| self.error(err))?;
        self.write(target, value)
    }

    fn set_text_or_default_any(
        &self,
        target: &mut dyn Any,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError> {
        let expected = self.member.value_type();
        if default.ty() != expected {
            return Err(self.error(ArgumentError::TypeMismatch {
                argument: "default",
                expected,
                found: default.ty(),
            }));
        }
        let parsed = self
            .strategy()
            .and_then(|strategy| strategy.parse_any(text).map_err(|err| self.error(err)));
        let value = match parsed {
            Ok(value) => value,
            Err(err) => {
                log::debug!(
                    "property `{}`: {}, assigning the default",
                    self.member.name(),
                    err.kind()
                );
                default
            }
        };
        self.write(target, value)
    }
}

impl<T: Any> ObjectAccess<T> for DynAccessor {
    #[inline]
    fn get_boxed(&self, target: &T) -> Result<AnyValue, AccessError> {
        self.get_any(target)
    }

    #[inline]
    fn set_boxed(&self, target: &mut T, value: AnyValue) -> Result<(), AccessError> {
        self.set_any(target, value)
    }
}

impl<T: Any> TextAccess<T> for DynAccessor {
    #[inline]
    fn get_text(&self, target: &T) -> Result<String, AccessError> {
        self.get_text_any(target)
    }

    #[inline]
    fn set_text(&self, target: &mut T, text: &str) -> Result<(), AccessError> {
        self.set_text_any(target, text)
    }

    #[inline]
    fn set_text_or_default(
        &self,
        target: &mut T,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError> {
        self.set_text_or_default_any(target, text, default)
    }
}

// -----------------------------------------------------------------------------
// Tests
