use core::any::TypeId;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::hash::PassThroughState;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`].
///
/// Type ids are already hashes, so keys go through [`PassThroughState`].
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
/// use pm_utils::TypeIdMap;
///
/// let mut map = TypeIdMap::new();
/// map.insert(TypeId::of::<u32>(), "u32");
///
/// assert_eq!(map.get(&TypeId::of::<u32>()), Some(&"u32"));
/// assert_eq!(map.get(&TypeId::of::<i32>()), None);
/// ```
pub struct TypeIdMap<V>(HashMap<TypeId, V, PassThroughState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty map.
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(PassThroughState))
    }

    /// Returns the value of `type_id`.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// Returns the value of `type_id`, inserting `f()` first if absent.
    pub fn get_or_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> &mut V {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => entry.insert(f()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Inserts a value, returning the previous one.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId, value: V) -> Option<V> {
        self.0.insert(type_id, value)
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::TypeIdMap;

    #[test]
    fn get_or_insert_runs_factory_once() {
        let mut map = TypeIdMap::new();
        let mut calls = 0;
        for _ in 0..3 {
            map.get_or_insert(TypeId::of::<str>(), || {
                calls += 1;
                calls
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(map.get(&TypeId::of::<str>()), Some(&1));
    }

    #[test]
    fn insert_replaces() {
        let mut map = TypeIdMap::default();
        assert_eq!(map.insert(TypeId::of::<bool>(), 'a'), None);
        assert_eq!(map.insert(TypeId::of::<bool>(), 'b'), Some('a'));
        assert_eq!(map.len(), 1);
    }
}
