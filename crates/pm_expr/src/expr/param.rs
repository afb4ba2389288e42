use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU64, Ordering};

use super::Expr;
use crate::{MemberRef, Type};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

// -----------------------------------------------------------------------------
// Param

/// A named, typed binder of a [`Lambda`](crate::Lambda).
///
/// Every `Param` created by [`Param::new`] has a process-unique identity.
/// Clones share it, so a parameter and the references to it in a body
/// compare equal, while two parameters with the same name and type do not.
///
/// ```
/// use pm_expr::Param;
///
/// let a = Param::new::<u32>("x");
/// let b = Param::new::<u32>("x");
///
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
#[derive(Clone)]
pub struct Param(Arc<ParamData>);

struct ParamData {
    id: u64,
    name: Cow<'static, str>,
    ty: Type,
}

impl Param {
    /// Creates a fresh parameter of type `T`.
    #[inline]
    pub fn new<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_type(name, Type::of::<T>())
    }

    /// Creates a fresh parameter of a runtime-known type.
    pub fn with_type(name: impl Into<Cow<'static, str>>, ty: Type) -> Self {
        Self(Arc::new(ParamData {
            id: NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            ty,
        }))
    }

    /// Returns the process-unique identity of the parameter.
    #[inline(always)]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Returns the parameter name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the parameter name as an owned `Cow`.
    #[inline]
    pub fn name_cow(&self) -> Cow<'static, str> {
        self.0.name.clone()
    }

    /// Returns the parameter type.
    #[inline(always)]
    pub fn ty(&self) -> Type {
        self.0.ty
    }

    /// Returns a reference to this parameter as an expression.
    #[inline]
    pub fn to_expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }

    /// Shorthand for `self.to_expr().member(member)`.
    #[inline]
    pub fn member(&self, member: &MemberRef) -> Expr {
        self.to_expr().member(member)
    }
}

impl PartialEq for Param {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Param {}

impl Hash for Param {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}: {}", self.0.name, self.0.id, self.0.ty.name())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl From<&Param> for Expr {
    #[inline]
    fn from(param: &Param) -> Self {
        param.to_expr()
    }
}
