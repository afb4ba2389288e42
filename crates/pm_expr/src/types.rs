//! Provide [`Type`], the runtime descriptor of a Rust type.

use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Type

/// The base representation of a Rust type.
///
/// Includes a [`TypeId`] and the compiler-provided type path.
/// Equality and hashing rely purely on the [`TypeId`].
///
/// # Examples
///
/// ```
/// # use core::any::TypeId;
/// use pm_expr::Type;
///
/// let ty = Type::of::<String>();
///
/// assert!(ty.is::<String>());
/// assert_eq!(ty.id(), TypeId::of::<String>());
/// assert_eq!(ty.name().to_string(), "String");
/// ```
#[derive(Copy, Clone)]
pub struct Type {
    type_id: TypeId,
    type_path: &'static str,
}

impl Type {
    /// Creates a new [`Type`] for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the type.
    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.type_id
    }

    /// Check if the given type matches this one.
    ///
    /// This only compares the [`TypeId`] of the types.
    #[inline(always)]
    pub fn is<T: Any>(&self) -> bool {
        TypeId::of::<T>() == self.type_id
    }

    /// Returns the full type path, e.g. `alloc::string::String`.
    ///
    /// The exact text is only meant for diagnostics.
    #[inline(always)]
    pub const fn path(&self) -> &'static str {
        self.type_path
    }

    /// Returns the type name with every module path dropped.
    ///
    /// ```
    /// use pm_expr::Type;
    ///
    /// assert_eq!(Type::of::<Option<String>>().name().to_string(), "Option<String>");
    /// assert_eq!(Type::of::<(u8, String)>().name().to_string(), "(u8, String)");
    /// ```
    #[inline]
    pub const fn name(&self) -> ShortName {
        ShortName(self.type_path)
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Type {}

impl Hash for Type {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_path)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_path)
    }
}

// -----------------------------------------------------------------------------
// ShortName

/// A type path displayed without module prefixes, see [`Type::name`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShortName(&'static str);

impl ShortName {
    /// Returns the full path this name was taken from.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.0
    }
}

#[inline]
fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while !rest.is_empty() {
            let end = rest.find(|c: char| !is_path_char(c)).unwrap_or(rest.len());
            let (segment, tail) = rest.split_at(end);
            match segment.rfind("::") {
                Some(index) => f.write_str(&segment[index + 2..])?,
                None => f.write_str(segment)?,
            }
            let end = tail.find(is_path_char).unwrap_or(tail.len());
            f.write_str(&tail[..end])?;
            rest = &tail[end..];
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
