//! Provide reflective member descriptors.
//!
//! A member descriptor names one property of one owner type and knows how to
//! read and write it on a type-erased target. [`Property`] is the typed
//! implementation; expressions and accessors hold it as a [`MemberRef`].

use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use crate::{AnyValue, MemberError, Type};

// -----------------------------------------------------------------------------
// MemberId

/// The identity of a member: its declaring type and its name.
///
/// Two descriptors of the same member compare equal even when they are
/// different instances.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MemberId {
    owner: Type,
    name: Cow<'static, str>,
}

impl MemberId {
    /// Creates a member id.
    #[inline]
    pub fn new(owner: Type, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    /// Returns the declaring type.
    #[inline(always)]
    pub const fn owner(&self) -> Type {
        self.owner
    }

    /// Returns the member name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member name as an owned `Cow`, cheap for static names.
    #[inline]
    pub fn name_cow(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner.path(), self.name)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner.name(), self.name)
    }
}

// -----------------------------------------------------------------------------
// Member

/// A reflective description of one readable, possibly writable, member.
///
/// Reads and writes are type-erased and checked: a target that is not an
/// instance of the owner type, or a value of the wrong type, is rejected.
pub trait Member: Any + Send + Sync {
    /// Returns the identity of the member.
    fn id(&self) -> &MemberId;

    /// Returns the type of the member value.
    fn value_type(&self) -> Type;

    /// Returns `true` if the member can be assigned.
    fn is_writable(&self) -> bool;

    /// Reads the member from `target`.
    fn get_any(&self, target: &dyn Any) -> Result<AnyValue, MemberError>;

    /// Assigns `value` to the member of `target`.
    fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), MemberError>;

    /// Returns `self` as `&dyn Any`, used to recover the typed descriptor.
    fn as_any(&self) -> &dyn Any;
}

/// A shared member descriptor.
pub type MemberRef = Arc<dyn Member>;

impl dyn Member {
    /// Returns the member name.
    #[inline]
    pub fn name(&self) -> &str {
        self.id().name()
    }

    /// Returns the declaring type.
    #[inline]
    pub fn owner(&self) -> Type {
        self.id().owner()
    }

    /// Downcasts the descriptor to its concrete type.
    #[inline]
    pub fn downcast_ref<M: Member>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }
}

impl fmt::Debug for dyn Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.id(), self.value_type().name())
    }
}

// -----------------------------------------------------------------------------
// Property

/// A typed member of `T` holding a `V`.
///
/// Built from a getter and an optional setter function, usually through the
/// [`property!`](crate::property) macro.
///
/// # Examples
///
/// ```
/// use pm_expr::{Property, property};
///
/// #[derive(Default)]
/// struct Monitor { host: String, timeout_ms: u32 }
///
/// let timeout = property!(Monitor, timeout_ms: u32);
/// let mut monitor = Monitor::default();
///
/// timeout.set(&mut monitor, 250).unwrap();
/// assert_eq!(timeout.get(&monitor), 250);
///
/// let host = Property::<Monitor, String>::read_only("host", |p| p.host.clone());
/// assert!(host.set(&mut monitor, "localhost".into()).is_err());
/// ```
pub struct Property<T, V> {
    id: MemberId,
    get: fn(&T) -> V,
    set: Option<fn(&mut T, V)>,
}

impl<T: Any, V: Any + Clone + Send + Sync> Property<T, V> {
    /// Creates a readable and writable property.
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>, get: fn(&T) -> V, set: fn(&mut T, V)) -> Self {
        Self {
            id: MemberId::new(Type::of::<T>(), name),
            get,
            set: Some(set),
        }
    }

    /// Creates a property without setter.
    #[inline]
    pub fn read_only(name: impl Into<Cow<'static, str>>, get: fn(&T) -> V) -> Self {
        Self {
            id: MemberId::new(Type::of::<T>(), name),
            get,
            set: None,
        }
    }

    /// Returns the getter function.
    #[inline(always)]
    pub fn getter(&self) -> fn(&T) -> V {
        self.get
    }

    /// Returns the setter function, if the property is writable.
    #[inline(always)]
    pub fn setter(&self) -> Option<fn(&mut T, V)> {
        self.set
    }

    /// Reads the property.
    #[inline]
    pub fn get(&self, target: &T) -> V {
        (self.get)(target)
    }

    /// Assigns the property.
    pub fn set(&self, target: &mut T, value: V) -> Result<(), MemberError> {
        match self.set {
            Some(set) => {
                set(target, value);
                Ok(())
            }
            None => Err(MemberError::ReadOnly {
                member: self.id.name_cow(),
            }),
        }
    }

    /// Wraps the property into a shared [`MemberRef`].
    #[inline]
    pub fn into_ref(self) -> MemberRef {
        Arc::new(self)
    }

    fn wrong_target(&self) -> MemberError {
        MemberError::WrongTarget {
            member: self.id.name_cow(),
            owner: self.id.owner(),
        }
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> Member for Property<T, V> {
    #[inline]
    fn id(&self) -> &MemberId {
        &self.id
    }

    #[inline]
    fn value_type(&self) -> Type {
        Type::of::<V>()
    }

    #[inline]
    fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    fn get_any(&self, target: &dyn Any) -> Result<AnyValue, MemberError> {
        match target.downcast_ref::<T>() {
            Some(target) => Ok(AnyValue::new((self.get)(target))),
            None => Err(self.wrong_target()),
        }
    }

    fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), MemberError> {
        let Some(set) = self.set else {
            return Err(MemberError::ReadOnly {
                member: self.id.name_cow(),
            });
        };
        let Some(target) = target.downcast_mut::<T>() else {
            return Err(self.wrong_target());
        };
        match value.take::<V>() {
            Ok(value) => {
                set(target, value);
                Ok(())
            }
            Err(value) => Err(MemberError::ValueType {
                member: self.id.name_cow(),
                expected: Type::of::<V>(),
                found: value.ty(),
            }),
        }
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T, V> Clone for Property<T, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            get: self.get,
            set: self.set,
        }
    }
}

impl<T, V> fmt::Debug for Property<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("writable", &self.set.is_some())
            .finish()
    }
}

/// Builds a [`Property`] for a struct field.
///
/// The field value is cloned on read. Add `read_only` to omit the setter.
///
/// ```
/// use pm_expr::{Member, property};
///
/// struct Target { address: String, port: u16 }
///
/// let port = property!(Target, port: u16);
/// let address = property!(Target, address: String, read_only);
///
/// assert!(port.is_writable());
/// assert!(!address.is_writable());
/// assert_eq!(address.id().name(), "address");
/// ```
#[macro_export]
macro_rules! property {
    ($owner:ty, $field:ident : $value:ty) => {
        $crate::Property::<$owner, $value>::new(
            ::core::stringify!($field),
            |target: &$owner| ::core::clone::Clone::clone(&target.$field),
            |target: &mut $owner, value: $value| target.$field = value,
        )
    };
    ($owner:ty, $field:ident : $value:ty, read_only) => {
        $crate::Property::<$owner, $value>::read_only(
            ::core::stringify!($field),
            |target: &$owner| ::core::clone::Clone::clone(&target.$field),
        )
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{Member, MemberId, MemberRef, Property};
    use crate::{AnyValue, MemberError, Type};

    #[derive(Default)]
    struct Sample {
        label: String,
        count: i32,
    }

    #[test]
    fn identity_ignores_descriptor_instance() {
        let a = property!(Sample, count: i32);
        let b = property!(Sample, count: i32);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id(), &MemberId::new(Type::of::<Sample>(), "count"));
        assert_ne!(a.id(), property!(Sample, label: String).id());
    }

    #[test]
    fn erased_round_trip() {
        let member: MemberRef = property!(Sample, label: String).into_ref();
        let mut sample = Sample::default();

        member
            .set_any(&mut sample, AnyValue::new(String::from("gateway")))
            .unwrap();
        let value = member.get_any(&sample).unwrap();
        assert_eq!(value.take::<String>().unwrap(), "gateway");
        assert_eq!(member.name(), "label");
    }

    #[test]
    fn erased_checks_are_loud() {
        let member: MemberRef = property!(Sample, count: i32).into_ref();
        let mut sample = Sample::default();

        let err = member.set_any(&mut sample, AnyValue::new(1_i64)).unwrap_err();
        assert!(matches!(err, MemberError::ValueType { .. }));

        let mut other = 0_u8;
        let err = member.set_any(&mut other, AnyValue::new(1_i32)).unwrap_err();
        assert!(matches!(err, MemberError::WrongTarget { .. }));
        assert!(member.get_any(&other).is_err());
        assert_eq!(sample.count, 0);
    }

    #[test]
    fn read_only_rejects_writes() {
        let member = Property::<Sample, i32>::read_only("count", |s| s.count);
        let mut sample = Sample::default();
        assert!(!member.is_writable());
        assert!(matches!(
            member.set_any(&mut sample, AnyValue::new(3_i32)),
            Err(MemberError::ReadOnly { .. })
        ));
    }

    #[test]
    fn typed_descriptor_is_recoverable() {
        let member: MemberRef = property!(Sample, count: i32).into_ref();
        assert!(member.downcast_ref::<Property<Sample, i32>>().is_some());
        assert!(member.downcast_ref::<Property<Sample, i64>>().is_none());
    }
}
