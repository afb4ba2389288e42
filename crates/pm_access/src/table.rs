//! Provide [`AccessorTable`], accessors of one owner type keyed by name.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use pm_expr::{MemberRef, Type};
use pm_utils::hash::{FixedHashState, HashMap};

use crate::capability::PropertyAccess;
use crate::{AccessError, AccessErrorKind, BuildError, DynAccessor, ShapeError};

/// A named collection of accessors for the properties of `T`.
///
/// Entries keep their insertion order, which is the order of
/// [`names`](Self::names) and [`dump`](Self::dump).
///
/// # Examples
///
/// ```
/// use pm_access::{Accessor, AccessorTable};
/// use pm_expr::property;
///
/// #[derive(Default)]
/// struct Endpoint { host: String, port: u16 }
///
/// let table = AccessorTable::new()
///     .with(Accessor::from_property(property!(Endpoint, host: String)).unwrap())
///     .with(Accessor::from_property(property!(Endpoint, port: u16)).unwrap());
///
/// let mut endpoint = Endpoint::default();
/// table.load(&mut endpoint, [("host", "example.org"), ("port", "8080")]).unwrap();
/// assert_eq!(endpoint.port, 8080);
///
/// let dumped = table.dump(&endpoint).unwrap();
/// assert_eq!(dumped[0], ("host".to_owned(), "example.org".to_owned()));
/// ```
pub struct AccessorTable<T> {
    entries: Vec<Box<dyn PropertyAccess<T>>>,
    index: HashMap<String, usize>,
}

impl<T: Any> AccessorTable<T> {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::with_hasher(FixedHashState),
        }
    }

    /// Builds a table of erased accessors, one per member.
    ///
    /// Fails if a member is not declared by `T` or is read-only.
    pub fn from_members(members: impl IntoIterator<Item = MemberRef>) -> Result<Self, BuildError> {
        let expected = Type::of::<T>();
        let mut table = Self::new();
        for member in members {
            if member.owner() != expected {
                return Err(ShapeError::ForeignMember {
                    member: member.id().name_cow(),
                    owner: member.owner(),
                    expected,
                }
                .into());
            }
            table.insert(DynAccessor::from_member(member)?);
        }
        Ok(table)
    }

    /// Adds an accessor, replacing and returning the one with the same name.
    pub fn insert<A>(&mut self, accessor: A) -> Option<Box<dyn PropertyAccess<T>>>
    where
        A: PropertyAccess<T> + 'static,
    {
        let accessor: Box<dyn PropertyAccess<T>> = Box::new(accessor);
        match self.index.get(accessor.name()) {
            Some(&slot) => Some(core::mem::replace(&mut self.entries[slot], accessor)),
            None => {
                self.index.insert(accessor.name().to_owned(), self.entries.len());
                self.entries.push(accessor);
                None
            }
        }
    }

    /// Adds an accessor and returns the table.
    #[inline]
    pub fn with<A>(mut self, accessor: A) -> Self
    where
        A: PropertyAccess<T> + 'static,
    {
        self.insert(accessor);
        self
    }

    /// Returns the accessor of the property `name`.
    pub fn get(&self, name: &str) -> Option<&dyn PropertyAccess<T>> {
        let slot = *self.index.get(name)?;
        Some(&*self.entries[slot])
    }

    /// Returns `true` if the table has an accessor named `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over the property names in insertion order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|accessor| accessor.name())
    }

    /// Iterates over the accessors in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &dyn PropertyAccess<T>> {
        self.entries
            .iter()
            .map(|accessor| -> &dyn PropertyAccess<T> { &**accessor })
    }

    /// Returns the number of accessors.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigns each `(name, text)` pair to `target`, in order.
    ///
    /// Stops at the first failure; pairs before it stay assigned. An unknown
    /// name fails with [`AccessErrorKind::Unknown`].
    pub fn load<N, S>(
        &self,
        target: &mut T,
        pairs: impl IntoIterator<Item = (N, S)>,
    ) -> Result<(), AccessError>
    where
        N: AsRef<str>,
        S: AsRef<str>,
    {
        for (name, text) in pairs {
            let name = name.as_ref();
            let Some(accessor) = self.get(name) else {
                return Err(AccessError::new(name.to_owned(), AccessErrorKind::Unknown));
            };
            accessor.set_text(target, text.as_ref())?;
        }
        Ok(())
    }

    /// Renders every property of `target` as `(name, text)` pairs.
    pub fn dump(&self, target: &T) -> Result<Vec<(String, String)>, AccessError> {
        self.entries
            .iter()
            .map(|accessor| Ok((accessor.name().to_owned(), accessor.get_text(target)?)))
            .collect()
    }
}

impl<T: Any> Default for AccessorTable<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any> fmt::Debug for AccessorTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::borrow::ToOwned;
    use alloc::string::String;
    use alloc::vec;
    use core::net::Ipv4Addr;

    use pm_expr::{AnyValue, Property, property};

    use super::AccessorTable;
    use crate::{Accessor, AccessErrorKind, BuildError, ShapeError};

    #[derive(Default)]
    struct Route {
        gateway: Option<String>,
        metric: u32,
        via: Option<Ipv4Addr>,
    }

    struct Host {
        address: Ipv4Addr,
    }

    fn routes() -> AccessorTable<Route> {
        AccessorTable::from_members([
            property!(Route, metric: u32).into_ref(),
            Property::<Route, Ipv4Addr>::new(
                "via",
                |r| r.via.unwrap_or(Ipv4Addr::UNSPECIFIED),
                |r, v| r.via = Some(v),
            )
            .into_ref(),
        ])
        .unwrap()
    }

    #[test]
    fn load_and_dump_in_order() {
        let table = routes();
        let mut route = Route::default();
        table
            .load(&mut route, [("via", "10.0.0.1"), ("metric", "20")])
            .unwrap();
        assert_eq!(route.via, Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(route.metric, 20);
        assert_eq!(
            table.dump(&route).unwrap(),
            vec![
                ("metric".to_owned(), "20".to_owned()),
                ("via".to_owned(), "10.0.0.1".to_owned()),
            ]
        );
        assert!(route.gateway.is_none());
    }

    #[test]
    fn load_stops_at_first_failure() {
        let table = routes();
        let mut route = Route::default();

        let err = table
            .load(&mut route, [("metric", "5"), ("gateway", "x"), ("via", "10.0.0.1")])
            .unwrap_err();
        assert_eq!(err.member(), "gateway");
        assert_eq!(err.kind(), &AccessErrorKind::Unknown);
        assert_eq!(route.metric, 5);
        assert!(route.via.is_none());

        let err = table.load(&mut route, [("metric", "-1")]).unwrap_err();
        assert!(err.is_conversion());
        assert_eq!(route.metric, 5);
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut table = routes();
        let typed = Accessor::from_property(property!(Route, metric: u32)).unwrap();
        assert!(table.insert(typed).is_some());
        assert_eq!(table.len(), 2);
        assert_eq!(table.names().collect::<vec::Vec<_>>(), ["metric", "via"]);

        let metric = table.get("metric").unwrap();
        let mut route = Route::default();
        metric.set_boxed(&mut route, AnyValue::new(7_u32)).unwrap();
        assert_eq!(route.metric, 7);
        assert_eq!(metric.value_type(), pm_expr::Type::of::<u32>());
    }

    #[test]
    fn foreign_members_are_rejected() {
        let address =
            Property::<Host, Ipv4Addr>::new("address", |h| h.address, |h, a| h.address = a);
        let err = AccessorTable::<Route>::from_members([address.into_ref()]).unwrap_err();
        assert!(matches!(err, BuildError::Shape(ShapeError::ForeignMember { .. })));
        assert!(AccessorTable::<Host>::default().is_empty());
    }
}
