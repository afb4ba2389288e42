//! Provide [`AnyValue`], a checked type-erased box, and [`Value`], the
//! dynamic scalar produced by expression evaluation.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;
use core::cmp::Ordering;
use core::fmt;

use crate::Type;

// -----------------------------------------------------------------------------
// Erased storage

trait ErasedValue: Any + Send + Sync {
    fn clone_boxed(&self) -> Box<dyn ErasedValue>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<V: Any + Clone + Send + Sync> ErasedValue for V {
    #[inline]
    fn clone_boxed(&self) -> Box<dyn ErasedValue> {
        Box::new(self.clone())
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -----------------------------------------------------------------------------
// AnyValue

/// An owned value of any `Clone + Send + Sync` type, tagged with its [`Type`].
///
/// This is the boundary between typed and type-erased access: every
/// downcast is checked, and a mismatch hands the value back instead of
/// truncating or converting it.
///
/// # Examples
///
/// ```
/// use pm_expr::AnyValue;
///
/// let boxed = AnyValue::new(42_u16);
/// assert!(boxed.is::<u16>());
/// assert_eq!(boxed.downcast_ref::<u16>(), Some(&42));
///
/// // Wrong type: the value comes back untouched.
/// let boxed = boxed.take::<u32>().unwrap_err();
/// assert_eq!(boxed.take::<u16>().unwrap(), 42);
/// ```
pub struct AnyValue {
    ty: Type,
    value: Box<dyn ErasedValue>,
}

impl AnyValue {
    /// Box a value.
    #[inline]
    pub fn new<V: Any + Clone + Send + Sync>(value: V) -> Self {
        Self {
            ty: Type::of::<V>(),
            value: Box::new(value),
        }
    }

    /// Returns the [`Type`] of the boxed value.
    #[inline(always)]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    /// Returns `true` if the boxed value is a `V`.
    #[inline]
    pub fn is<V: Any>(&self) -> bool {
        self.ty.is::<V>()
    }

    /// Returns the boxed value as `&dyn Any`.
    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        self.value.as_any()
    }

    /// Returns the boxed value as `&mut dyn Any`.
    #[inline]
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self.value.as_any_mut()
    }

    /// Downcasts the value to type `V` by reference.
    #[inline]
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.as_any().downcast_ref::<V>()
    }

    /// Downcasts the value to type `V` by mutable reference.
    #[inline]
    pub fn downcast_mut<V: Any>(&mut self) -> Option<&mut V> {
        self.as_any_mut().downcast_mut::<V>()
    }

    /// Unboxes the value as a `V`.
    ///
    /// If the underlying value is not of type `V`, returns `Err(self)`.
    pub fn take<V: Any>(self) -> Result<V, Self> {
        if !self.is::<V>() {
            return Err(self);
        }
        match self.value.into_any().downcast::<V>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("type id checked above"),
        }
    }
}

impl Clone for AnyValue {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            ty: self.ty,
            value: self.value.clone_boxed(),
        }
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyValue({})", self.ty)
    }
}

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed value flowing through an evaluated expression.
///
/// Primitive payloads are lifted into the matching scalar variant,
/// everything else stays an [`Value::Object`].
///
/// # Examples
///
/// ```
/// use pm_expr::{AnyValue, Value};
///
/// assert_eq!(Value::from_any(AnyValue::new(7_u8)), Value::UInt(7));
/// assert_eq!(Value::from(true), Value::Bool(true));
/// assert!(Value::Int(3) < Value::Float(3.5));
/// ```
#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Object(AnyValue),
}

macro_rules! lift_scalars {
    ($value:ident => $( $variant:ident: $($ty:ty),+ ; )*) => {
        $($(
            let $value = match $value.take::<$ty>() {
                Ok(v) => return Value::$variant(v.into()),
                Err(v) => v,
            };
        )+)*
    };
}

macro_rules! lift_scalar_refs {
    ($value:ident => $( $variant:ident: $($ty:ty),+ ; )*) => {
        $($(
            if let Some(v) = $value.downcast_ref::<$ty>() {
                return Some(Value::$variant((*v).into()));
            }
        )+)*
    };
}

impl Value {
    /// Lift a boxed value, scalar payloads become scalar variants.
    pub fn from_any(value: AnyValue) -> Self {
        let value = match value.take::<()>() {
            Ok(()) => return Value::Unit,
            Err(v) => v,
        };
        let value = match value.take::<String>() {
            Ok(text) => return Value::Text(text),
            Err(v) => v,
        };
        lift_scalars! { value =>
            Bool: bool;
            Int: i8, i16, i32, i64;
            UInt: u8, u16, u32, u64;
            Float: f32, f64;
        }
        match value.take::<usize>() {
            Ok(v) => Value::UInt(v as u64),
            Err(value) => match value.take::<isize>() {
                Ok(v) => Value::Int(v as i64),
                Err(value) => Value::Object(value),
            },
        }
    }

    /// Lift a borrowed scalar, returns `None` for non-scalar types.
    pub fn from_ref(value: &dyn Any) -> Option<Self> {
        if value.is::<()>() {
            return Some(Value::Unit);
        }
        if let Some(text) = value.downcast_ref::<String>() {
            return Some(Value::Text(text.clone()));
        }
        lift_scalar_refs! { value =>
            Bool: bool;
            Int: i8, i16, i32, i64;
            UInt: u8, u16, u32, u64;
            Float: f32, f64;
        }
        if let Some(v) = value.downcast_ref::<usize>() {
            return Some(Value::UInt(*v as u64));
        }
        if let Some(v) = value.downcast_ref::<isize>() {
            return Some(Value::Int(*v as i64));
        }
        None
    }

    /// Box this value again.
    ///
    /// Scalars are boxed with their canonical type (`i64`, `u64`, `f64`, ...).
    pub fn into_any(self) -> AnyValue {
        match self {
            Value::Unit => AnyValue::new(()),
            Value::Bool(v) => AnyValue::new(v),
            Value::Int(v) => AnyValue::new(v),
            Value::UInt(v) => AnyValue::new(v),
            Value::Float(v) => AnyValue::new(v),
            Value::Text(v) => AnyValue::new(v),
            Value::Object(v) => v,
        }
    }

    /// Returns the static [`Type`] of the payload.
    pub fn ty(&self) -> Type {
        match self {
            Value::Unit => Type::of::<()>(),
            Value::Bool(_) => Type::of::<bool>(),
            Value::Int(_) => Type::of::<i64>(),
            Value::UInt(_) => Type::of::<u64>(),
            Value::Float(_) => Type::of::<f64>(),
            Value::Text(_) => Type::of::<String>(),
            Value::Object(v) => v.ty(),
        }
    }

    /// Returns the boolean payload, if any.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// A short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Object(_) => "object",
        }
    }

    /// Compare two values.
    ///
    /// Numeric variants compare across each other, objects never compare.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Unit, Unit) => Some(Ordering::Equal),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (UInt(a), UInt(b)) => Some(a.cmp(b)),
            (Int(a), UInt(b)) => Some(compare_signed(*a, *b)),
            (UInt(a), Int(b)) => Some(compare_signed(*b, *a).reverse()),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Float(a), UInt(b)) => a.partial_cmp(&(*b as f64)),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (UInt(a), Float(b)) => (*a as f64).partial_cmp(b),
            _ => None,
        }
    }
}

#[inline]
fn compare_signed(a: i64, b: u64) -> Ordering {
    if a < 0 {
        Ordering::Less
    } else {
        (a as u64).cmp(&b)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Object(v) => write!(f, "<{}>", v.ty().name()),
        }
    }
}

macro_rules! impl_from_scalar {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )+
    };
}

impl_from_scalar!(Bool: bool);
impl_from_scalar!(Int: i8, i16, i32, i64);
impl_from_scalar!(UInt: u8, u16, u32, u64);
impl_from_scalar!(Float: f32, f64);

impl From<()> for Value {
    #[inline]
    fn from((): ()) -> Self {
        Value::Unit
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<AnyValue> for Value {
    #[inline]
    fn from(value: AnyValue) -> Self {
        Value::from_any(value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cmp::Ordering;

    use super::{AnyValue, Value};

    #[test]
    fn take_mismatch_returns_value() {
        let boxed = AnyValue::new(String::from("eth0"));
        let boxed = boxed.take::<&str>().unwrap_err();
        assert!(boxed.is::<String>());
        assert_eq!(boxed.take::<String>().unwrap(), "eth0");
    }

    #[test]
    fn clone_is_deep() {
        let mut a = AnyValue::new(vec![1_u8, 2]);
        let b = a.clone();
        a.downcast_mut::<Vec<u8>>().unwrap().push(3);
        assert_eq!(b.downcast_ref::<Vec<u8>>().unwrap(), &[1, 2]);
        assert_eq!(a.downcast_ref::<Vec<u8>>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn lift_scalars() {
        assert_eq!(Value::from_any(AnyValue::new(-3_i8)), Value::Int(-3));
        assert_eq!(Value::from_any(AnyValue::new(3_usize)), Value::UInt(3));
        assert_eq!(Value::from_any(AnyValue::new(1.5_f32)), Value::Float(1.5));
        assert!(matches!(
            Value::from_any(AnyValue::new(vec![1_u8])),
            Value::Object(_)
        ));
        assert_eq!(Value::from_ref(&true), Some(Value::Bool(true)));
        assert_eq!(Value::from_ref(&vec![1_u8]), None);
    }

    #[test]
    fn mixed_numeric_comparison() {
        assert_eq!(Value::Int(-1).compare(&Value::UInt(0)), Some(Ordering::Less));
        assert_eq!(Value::UInt(5).compare(&Value::Int(5)), Some(Ordering::Equal));
        assert_eq!(Value::Float(2.0), Value::Int(2));
        assert_eq!(Value::Text("a".into()).compare(&Value::Int(1)), None);
    }
}
