//! Provide the two hash states of the workspace.
//!
//! [`FixedHashState`] seeds `foldhash` with a constant so name-keyed tables
//! hash the same way in every run. [`PassThroughState`] keeps keys that are
//! already hashes, such as `TypeId`, as they are.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

const SEED: u64 = 0x3C6E_F372_FE94_F82B;

/// Builds `foldhash` hashers from a constant seed.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use pm_utils::hash::FixedHashState;
///
/// assert_eq!(FixedHashState.hash_one("mtu"), FixedHashState.hash_one("mtu"));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(SEED).build_hasher()
    }
}

// -----------------------------------------------------------------------------
// PassThroughState

/// Folds the written words into the hash without mixing.
///
/// Only meant for keys that write a single, uniformly distributed word.
#[derive(Copy, Clone, Default, Debug)]
pub struct PassThroughHasher(u64);

impl Hasher for PassThroughHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write_u64(&mut self, word: u64) {
        self.0 ^= word;
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0_u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.write_u64(u64::from_le_bytes(word));
        }
    }
}

/// Builds [`PassThroughHasher`]s.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use pm_utils::hash::PassThroughState;
///
/// assert_eq!(PassThroughState.hash_one(42_u64), 42);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct PassThroughState;

impl BuildHasher for PassThroughState {
    type Hasher = PassThroughHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        PassThroughHasher(0)
    }
}

// -----------------------------------------------------------------------------
// Tests
