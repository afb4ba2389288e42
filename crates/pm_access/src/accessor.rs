//! Provide [`Accessor`], the typed compiled accessor.

use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::hash::{Hash, Hasher};

use pm_expr::{AnyValue, ArgumentError, Lambda, MemberId, MemberRef, Param, Property, Type};
use pm_text::{ConversionRegistry, TextStrategy};

use crate::capability::{
    ErasedAccess, ErasedTextAccess, ObjectAccess, PropertyInfo, TextAccess, ValueAccess,
};
use crate::shape::{Getter, Setter, assign_lambda, compile_getter, compile_setter, member_access};
use crate::{AccessError, AccessErrorKind, BuildError, DynAccessor};

// -----------------------------------------------------------------------------
// Accessor

/// Compiled get and set functions for a `V` property of `T`.
///
/// Built from a lambda `|p: T| p.member`. The setter is compiled from the
/// synthesized assignment `|p: T, value: V| p.member = value`. A
/// [`Property<T, V>`] member contributes its own functions; any other
/// [`Member`](pm_expr::Member) is accessed through its erased operations;
/// every read or write then panics if that member breaks its contract, see
/// [`get`](Self::get).
///
/// Two accessors are equal when they access the same member, no matter how
/// their lambdas were written.
///
/// Text operations use [`ConversionRegistry::global`] unless another
/// registry is bound with [`with_registry`](Self::with_registry).
///
/// # Examples
///
/// ```
/// use pm_access::Accessor;
/// use pm_expr::{Lambda, Param, property};
///
/// #[derive(Default)]
/// struct Monitor { host: String, count: u32 }
///
/// let count = property!(Monitor, count: u32).into_ref();
/// let p = Param::new::<Monitor>("p");
/// let accessor = Accessor::<Monitor, u32>::compile(&Lambda::new([p.clone()], p.member(&count))).unwrap();
///
/// let mut monitor = Monitor::default();
/// accessor.set(&mut monitor, 4);
/// assert_eq!(accessor.get(&monitor), 4);
///
/// accessor.set_text(&mut monitor, "16").unwrap();
/// assert_eq!(accessor.get_text(&monitor).unwrap(), "16");
///
/// accessor.set_text_or_default(&mut monitor, "not-a-number", 5).unwrap();
/// assert_eq!(monitor.count, 5);
/// ```
pub struct Accessor<T, V> {
    member: MemberRef,
    get: Getter<T, V>,
    set: Setter<T, V>,
    registry: Option<Arc<ConversionRegistry>>,
}

impl<T: Any, V: Any + Clone + Send + Sync> Accessor<T, V> {
    /// Compiles an accessor from `|p: T| p.member`.
    ///
    /// # Errors
    ///
    /// - [`ShapeError`](crate::ShapeError) if the lambda does not take one
    ///   `T` or its body is not a member read on that parameter.
    /// - [`CompileError`](pm_expr::CompileError) if the member value is not
    ///   a `V` or the member is read-only.
    pub fn compile(lambda: &Lambda) -> Result<Self, BuildError> {
        let (param, access) = member_access::<T>(lambda)?;
        let get = compile_getter::<T, V>(lambda)?;
        let set = compile_setter::<T, V>(&assign_lambda::<V>(param, access))?;
        log::trace!("compiled accessor for `{}`", access.member().id());
        Ok(Self {
            member: access.member().clone(),
            get,
            set,
            registry: None,
        })
    }

    /// Compiles an accessor for a member descriptor.
    ///
    /// Builds `|target: T| target.member` and compiles it like
    /// [`compile`](Self::compile).
    pub fn from_member(member: MemberRef) -> Result<Self, BuildError> {
        let target = Param::new::<T>("target");
        Self::compile(&Lambda::new([target.clone()], target.member(&member)))
    }

    /// Compiles an accessor for a property.
    #[inline]
    pub fn from_property(property: Property<T, V>) -> Result<Self, BuildError> {
        Self::from_member(property.into_ref())
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

    /// Returns the member identity.
    #[inline]
    pub fn id(&self) -> &MemberId {
        self.member.id()
    }

    /// Returns the property name.
    #[inline]
    pub fn name(&self) -> &str {
        self.member.name()
    }

    /// Returns an erased accessor for the same member and registry.
    pub fn to_dyn(&self) -> DynAccessor {
        DynAccessor::new_unchecked(self.member.clone(), self.registry.clone())
    }

    fn error(&self, kind: impl Into<AccessErrorKind>) -> AccessError {
        AccessError::new(self.member.id().name_cow(), kind)
    }

    // -------------------------------------------------------------------------
    // Typed values

    /// Reads the property.
    ///
    /// # Panics
    ///
    /// Panics if a custom member descriptor fails a read it declared valid.
    #[inline]
    pub fn get(&self, target: &T) -> V {
        (self.get)(target)
    }

    /// Assigns the property.
    ///
    /// # Panics
    ///
    /// Panics if a custom member descriptor fails a write it declared valid.
    #[inline]
    pub fn set(&self, target: &mut T, value: V) {
        (self.set)(target, value);
    }

    // -------------------------------------------------------------------------
    // Boxed values

    /// Reads the property as a boxed value.
    #[inline]
    pub fn get_boxed(&self, target: &T) -> AnyValue {
        AnyValue::new((self.get)(target))
    }

    /// Assigns a boxed value, failing if it is not a `V`.
    pub fn set_boxed(&self, target: &mut T, value: AnyValue) -> Result<(), AccessError> {
        let value = self.unbox(value, "value")?;
        (self.set)(target, value);
        Ok(())
    }

    /// Reads the property of a type-erased target.
    pub fn get_any(&self, target: &dyn Any) -> Result<AnyValue, AccessError> {
        Ok(self.get_boxed(self.downcast(target)?))
    }

    /// Assigns the property of a type-erased target.
    pub fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), AccessError> {
        let target = self.downcast_mut(target)?;
        self.set_boxed(target, value)
    }

    fn unbox(&self, value: AnyValue, argument: &'static str) -> Result<V, AccessError> {
        value.take::<V>().map_err(|value| {
            self.error(ArgumentError::TypeMismatch {
                argument,
                expected: Type::of::<V>(),
                found: value.ty(),
            })
        })
    }

    fn downcast<'a>(&self, target: &'a dyn Any) -> Result<&'a T, AccessError> {
        target.downcast_ref::<T>().ok_or_else(|| {
            self.error(ArgumentError::WrongTarget {
                expected: Type::of::<T>(),
            })
        })
    }

    fn downcast_mut<'a>(&self, target: &'a mut dyn Any) -> Result<&'a mut T, AccessError> {
        target.downcast_mut::<T>().ok_or_else(|| {
            self.error(ArgumentError::WrongTarget {
                expected: Type::of::<T>(),
            })
        })
    }

    // -------------------------------------------------------------------------
    // Text

    fn strategy(&self) -> Result<TextStrategy<V>, AccessError> {
        self.registry()
            .strategy::<V>()
            .map_err(|err| self.error(err))
    }

    /// Renders the property as text.
    pub fn get_text(&self, target: &T) -> Result<String, AccessError> {
        self.strategy()?
            .render(&(self.get)(target))
            .map_err(|err| self.error(err))
    }

    /// Parses `text` and assigns the result.
    ///
    /// The target is left untouched when parsing fails.
    pub fn set_text(&self, target: &mut T, text: &str) -> Result<(), AccessError> {
        let value = self.strategy()?.parse(text).map_err(|err| self.error(err))?;
        (self.set)(target, value);
        Ok(())
    }

    /// Parses `text` and assigns the result, or assigns `default` if no
    /// value comes out of `text`.
    ///
    /// Both a failed parse and a value type without strategy fall back to
    /// `default`. Returns `Ok` in every case; the `Result` is kept for the
    /// erased variants.
    pub fn set_text_or_default(&self, target: &mut T, text: &str, default: V) -> Result<(), AccessError> {
        let parsed = self
            .strategy()
            .and_then(|strategy| strategy.parse(text).map_err(|err| self.error(err)));
        let value = match parsed {
            Ok(value) => value,
            Err(err) => {
                log::debug!("property `{}`: {}, assigning the default", self.name(), err.kind());
                default
            }
        };
        (self.set)(target, value);
        Ok(())
    }

    /// Renders the property of a type-erased target.
    pub fn get_text_any(&self, target: &dyn Any) -> Result<String, AccessError> {
        self.get_text(self.downcast(target)?)
    }

    /// Parses `text` into the property of a type-erased target.
    pub fn set_text_any(&self, target: &mut dyn Any, text: &str) -> Result<(), AccessError> {
        let target = self.downcast_mut(target)?;
        self.set_text(target, text)
    }

    /// Like [`set_text_or_default`](Self::set_text_or_default) with an
    /// erased target and a boxed default.
    pub fn set_text_or_default_any(
        &self,
        target: &mut dyn Any,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError> {
        let target = self.downcast_mut(target)?;
        let default = self.unbox(default, "default")?;
        self.set_text_or_default(target, text, default)
    }
}

impl<T, V> Clone for Accessor<T, V> {
    fn clone(&self) -> Self {
        Self {
            member: self.member.clone(),
            get: self.get.clone(),
            set: self.set.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<T, V> PartialEq for Accessor<T, V> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.member.id() == other.member.id()
    }
}

impl<T, V> Eq for Accessor<T, V> {}

impl<T, V> Hash for Accessor<T, V> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.id().hash(state);
    }
}

impl<T, V> fmt::Debug for Accessor<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("member", &self.member.id())
            .field("value", &self.member.value_type())
            .finish()
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> TryFrom<Property<T, V>> for Accessor<T, V> {
    type Error = BuildError;

    #[inline]
    fn try_from(property: Property<T, V>) -> Result<Self, BuildError> {
        Self::from_property(property)
    }
}

// -----------------------------------------------------------------------------
// Capabilities

impl<T: Any, V: Any + Clone + Send + Sync> PropertyInfo for Accessor<T, V> {
    #[inline]
    fn id(&self) -> &MemberId {
        self.member.id()
    }

    #[inline]
    fn value_type(&self) -> Type {
        Type::of::<V>()
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> ValueAccess<T, V> for Accessor<T, V> {
    #[inline]
    fn get(&self, target: &T) -> V {
        (self.get)(target)
    }

    #[inline]
    fn set(&self, target: &mut T, value: V) {
        (self.set)(target, value);
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> ObjectAccess<T> for Accessor<T, V> {
    #[inline]
    fn get_boxed(&self, target: &T) -> Result<AnyValue, AccessError> {
        Ok(Accessor::get_boxed(self, target))
    }

    #[inline]
    fn set_boxed(&self, target: &mut T, value: AnyValue) -> Result<(), AccessError> {
        Accessor::set_boxed(self, target, value)
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> ErasedAccess for Accessor<T, V> {
    #[inline]
    fn get_any(&self, target: &dyn Any) -> Result<AnyValue, AccessError> {
        Accessor::get_any(self, target)
    }

    #[inline]
    fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), AccessError> {
        Accessor::set_any(self, target, value)
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> TextAccess<T> for Accessor<T, V> {
    #[inline]
    fn get_text(&self, target: &T) -> Result<String, AccessError> {
        Accessor::get_text(self, target)
    }

    #[inline]
    fn set_text(&self, target: &mut T, text: &str) -> Result<(), AccessError> {
        Accessor::set_text(self, target, text)
    }

    fn set_text_or_default(
        &self,
        target: &mut T,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError> {
        let default = self.unbox(default, "default")?;
        Accessor::set_text_or_default(self, target, text, default)
    }
}

impl<T: Any, V: Any + Clone + Send + Sync> ErasedTextAccess for Accessor<T, V> {
    #[inline]
    fn get_text_any(&self, target: &dyn Any) -> Result<String, AccessError> {
        Accessor::get_text_any(self, target)
    }

    #[inline]
    fn set_text_any(&self, target: &mut dyn Any, text: &str) -> Result<(), AccessError> {
        Accessor::set_text_any(self, target, text)
    }

    #[inline]
    fn set_text_or_default_any(
        &self,
        target: &mut dyn Any,
        text: &str,
        default: AnyValue,
    ) -> Result<(), AccessError> {
        Accessor::set_text_or_default_any(self, target, text, default)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use core::any::Any;
    use core::hash::BuildHasher;

    use pm_expr::{AnyValue, ArgumentError, Expr, Lambda, Member, MemberError, MemberId, Param};
    use pm_expr::{Property, Type, property};
    use pm_text::{ConversionError, ConversionRegistry, TextConverter};
    use pm_utils::hash::FixedHashState;

    use super::Accessor;
    use crate::capability::{ErasedTextAccess, ObjectAccess, TextAccess};
    use crate::{AccessErrorKind, BuildError, ShapeError};

    #[derive(Default)]
    struct Session {
        user: String,
        port: u16,
        level: Level,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum Level {
        #[default]
        Low,
        High,
    }

    struct LevelText;

    impl TextConverter<Level> for LevelText {
        fn parse(&self, text: &str) -> Result<Level, ConversionError> {
            match text {
                "low" => Ok(Level::Low),
                "high" => Ok(Level::High),
                _ => Err(ConversionError::parse::<Level>(text, "expected `low` or `high`")),
            }
        }

        fn render(&self, value: &Level) -> Result<String, ConversionError> {
            Ok(String::from(match value {
                Level::Low => "low",
                Level::High => "high",
            }))
        }
    }

    /// A hand-written descriptor of `Session::port`.
    struct PortMember {
        id: MemberId,
        writable: bool,
    }

    impl PortMember {
        fn new(writable: bool) -> Arc<dyn Member> {
            Arc::new(Self {
                id: MemberId::new(Type::of::<Session>(), "port"),
                writable,
            })
        }

        fn wrong_target(&self) -> MemberError {
            MemberError::WrongTarget {
                member: self.id.name_cow(),
                owner: self.id.owner(),
            }
        }
    }

    impl Member for PortMember {
        fn id(&self) -> &MemberId {
            &self.id
        }

        fn value_type(&self) -> Type {
            Type::of::<u16>()
        }

        fn is_writable(&self) -> bool {
            self.writable
        }

        fn get_any(&self, target: &dyn Any) -> Result<AnyValue, MemberError> {
            let session = target.downcast_ref::<Session>().ok_or_else(|| self.wrong_target())?;
            Ok(AnyValue::new(session.port))
        }

        fn set_any(&self, target: &mut dyn Any, value: AnyValue) -> Result<(), MemberError> {
            if !self.writable {
                return Err(MemberError::ReadOnly {
                    member: self.id.name_cow(),
                });
            }
            let session = target.downcast_mut::<Session>().ok_or_else(|| self.wrong_target())?;
            session.port = value.take::<u16>().map_err(|value| MemberError::ValueType {
                member: self.id.name_cow(),
                expected: Type::of::<u16>(),
                found: value.ty(),
            })?;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn port_with(name: &'static str) -> Accessor<Session, u16> {
        let member = property!(Session, port: u16).into_ref();
        let param = Param::new::<Session>(name);
        Accessor::compile(&Lambda::new([param.clone()], param.member(&member))).unwrap()
    }

    #[test]
    fn typed_round_trip() {
        let port = port_with("s");
        let mut session = Session::default();
        port.set(&mut session, 8080);
        assert_eq!(port.get(&session), 8080);
        assert_eq!(session.port, 8080);
        assert_eq!(port.name(), "port");
    }

    #[test]
    fn identity_ignores_parameter_names() {
        let a = port_with("a");
        let b = port_with("session");
        assert_eq!(a, b);

        let state = FixedHashState;
        assert_eq!(state.hash_one(&a), state.hash_one(&b));

        let user = Accessor::from_property(property!(Session, user: String)).unwrap();
        assert_ne!(a.id(), user.id());
    }

    #[test]
    fn custom_member_descriptors_compile() {
        let port = Accessor::<Session, u16>::from_member(PortMember::new(true)).unwrap();
        let mut session = Session::default();

        port.set(&mut session, 80);
        assert_eq!(session.port, 80);
        assert_eq!(port.get(&session), 80);

        port.set_text(&mut session, "443").unwrap();
        assert_eq!(port.get_text(&session).unwrap(), "443");
        assert_eq!(port, port_with("s"));

        assert!(matches!(
            Accessor::<Session, u16>::from_member(PortMember::new(false)),
            Err(BuildError::Compile(pm_expr::CompileError::ReadOnly { .. }))
        ));
        assert!(matches!(
            Accessor::<Session, u32>::from_member(PortMember::new(true)),
            Err(BuildError::Compile(pm_expr::CompileError::MemberType { .. }))
        ));
    }

    #[test]
    fn boxed_values_are_checked() {
        let port = port_with("s");
        let mut session = Session::default();

        port.set_boxed(&mut session, AnyValue::new(22_u16)).unwrap();
        assert_eq!(session.port, 22);

        let err = port.set_boxed(&mut session, AnyValue::new(22_u32)).unwrap_err();
        assert!(matches!(
            err.kind(),
            AccessErrorKind::Argument(ArgumentError::TypeMismatch { argument: "value", .. })
        ));
        assert_eq!(session.port, 22);

        let err = port.get_any(&String::new()).unwrap_err();
        assert!(matches!(
            err.kind(),
            AccessErrorKind::Argument(ArgumentError::WrongTarget { .. })
        ));
        let boxed = ObjectAccess::get_boxed(&port, &session).unwrap();
        assert_eq!(boxed.take::<u16>().unwrap(), 22);
    }

    #[test]
    fn text_uses_the_bound_registry() {
        let registry = Arc::new(ConversionRegistry::new());
        assert!(registry.register_converter::<Level, _>(LevelText));

        let level = Accessor::from_property(property!(Session, level: Level))
            .unwrap()
            .with_registry(registry);
        let mut session = Session::default();

        level.set_text(&mut session, "high").unwrap();
        assert_eq!(session.level, Level::High);
        assert_eq!(level.get_text(&session).unwrap(), "high");

        level.set_text_or_default(&mut session, "medium", Level::Low).unwrap();
        assert_eq!(session.level, Level::Low);

        let erased = level.to_dyn();
        erased.set_text_any(&mut session, "high").unwrap();
        assert_eq!(session.level, Level::High);
    }

    #[test]
    fn defaulted_text_set() {
        let port = port_with("s");
        let mut session = Session::default();

        port.set_text_or_default(&mut session, "not-a-number", 5).unwrap();
        assert_eq!(session.port, 5);

        let err = port.set_text(&mut session, "not-a-number").unwrap_err();
        assert!(err.is_conversion());
        assert_eq!(err.member(), "port");
        assert_eq!(session.port, 5);

        TextAccess::set_text_or_default(&port, &mut session, "70000", AnyValue::new(6_u16)).unwrap();
        assert_eq!(session.port, 6);

        let err = port
            .set_text_or_default_any(&mut session, "1", AnyValue::new("1"))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            AccessErrorKind::Argument(ArgumentError::TypeMismatch { argument: "default", .. })
        ));
    }

    #[test]
    fn unsupported_type_falls_back_to_default() {
        let registry = Arc::new(ConversionRegistry::empty());
        let port = port_with("s").with_registry(registry);
        let mut session = Session::default();

        port.set_text_or_default(&mut session, "not-a-number", 5).unwrap();
        assert_eq!(session.port, 5);

        assert!(port.set_text(&mut session, "1").unwrap_err().is_unsupported());
        assert_eq!(session.port, 5);
    }

    #[test]
    fn invalid_lambdas_are_rejected() {
        let port = property!(Session, port: u16).into_ref();
        let s = Param::new::<Session>("s");

        let constant = Lambda::new([s.clone()], Expr::constant(1_u16));
        assert!(matches!(
            Accessor::<Session, u16>::compile(&constant),
            Err(BuildError::Shape(ShapeError::NotMemberAccess { .. }))
        ));

        let getter = Lambda::new([s.clone()], s.member(&port));
        assert!(matches!(
            Accessor::<Session, u32>::compile(&getter),
            Err(BuildError::Compile(_))
        ));

        let user = Property::<Session, String>::read_only("user", |s| s.user.clone());
        assert!(matches!(
            Accessor::from_property(user),
            Err(BuildError::Compile(pm_expr::CompileError::ReadOnly { .. }))
        ));
    }
}
