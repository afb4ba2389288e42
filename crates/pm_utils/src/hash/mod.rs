//! Provide the hash states and the `HashMap` alias used across the workspace.

mod hasher;

pub use hasher::{FixedHashState, PassThroughHasher, PassThroughState};

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
///
/// # Examples
///
/// ```
/// use pm_utils::hash::HashMap;
///
/// let mut map: HashMap<&str, u32> = HashMap::default();
/// map.insert("port", 80);
/// assert_eq!(map.get("port"), Some(&80));
/// ```
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;
