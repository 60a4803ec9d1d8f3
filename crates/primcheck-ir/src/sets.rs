//! Fixed-capacity bit sets over node and edge identities.
//!
//! Both set types hold ids in `0..SET_CAPACITY`. Graph construction rejects
//! instances whose node or edge count exceeds the capacity, so every id a
//! well-formed graph hands out fits.

use serde::{Serialize, Serializer};
use std::fmt;

/// Number of distinct ids a set can hold.
pub const SET_CAPACITY: usize = 64;

macro_rules! id_set {
    ($(#[$meta:meta])* $name:ident, $iter:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// The empty set.
            pub const fn empty() -> Self {
                Self(0)
            }

            /// The set `{0, 1, ..., count - 1}`.
            pub fn full(count: usize) -> Self {
                debug_assert!(count <= SET_CAPACITY);
                if count >= SET_CAPACITY {
                    Self(u64::MAX)
                } else {
                    Self((1u64 << count) - 1)
                }
            }

            pub fn singleton(id: usize) -> Self {
                let mut set = Self::empty();
                set.insert(id);
                set
            }

            pub const fn from_bits(bits: u64) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> u64 {
                self.0
            }

            /// Insert `id`, returning `true` if it was not already present.
            pub fn insert(&mut self, id: usize) -> bool {
                debug_assert!(id < SET_CAPACITY, "id {id} exceeds set capacity");
                let mask = 1u64 << id;
                let fresh = self.0 & mask == 0;
                self.0 |= mask;
                fresh
            }

            pub fn remove(&mut self, id: usize) -> bool {
                if id >= SET_CAPACITY {
                    return false;
                }
                let mask = 1u64 << id;
                let present = self.0 & mask != 0;
                self.0 &= !mask;
                present
            }

            pub fn contains(self, id: usize) -> bool {
                id < SET_CAPACITY && self.0 & (1u64 << id) != 0
            }

            pub fn len(self) -> usize {
                self.0.count_ones() as usize
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn is_subset(self, other: Self) -> bool {
                self.0 & !other.0 == 0
            }

            pub fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            pub fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            pub fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            /// Smallest id in the set.
            pub fn first(self) -> Option<usize> {
                if self.0 == 0 {
                    None
                } else {
                    Some(self.0.trailing_zeros() as usize)
                }
            }

            /// Ids in ascending order.
            pub fn iter(self) -> $iter {
                $iter(self.0)
            }
        }

        /// Ascending iterator over the ids of a set.
        #[derive(Debug, Clone)]
        pub struct $iter(u64);

        impl Iterator for $iter {
            type Item = usize;

            fn next(&mut self) -> Option<usize> {
                if self.0 == 0 {
                    return None;
                }
                let id = self.0.trailing_zeros() as usize;
                self.0 &= self.0 - 1;
                Some(id)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                let n = self.0.count_ones() as usize;
                (n, Some(n))
            }
        }

        impl ExactSizeIterator for $iter {}

        impl IntoIterator for $name {
            type Item = usize;
            type IntoIter = $iter;

            fn into_iter(self) -> $iter {
                self.iter()
            }
        }

        impl FromIterator<usize> for $name {
            fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
                let mut set = Self::empty();
                for id in iter {
                    set.insert(id);
                }
                set
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(self.iter())
            }
        }
    };
}

id_set!(
    /// A set of node ids.
    NodeSet,
    NodeSetIter
);

id_set!(
    /// A set of edge ids.
    EdgeSet,
    EdgeSetIter
);

/// Render a set as `{p0, p3}` using `prefix` for each id.
pub(crate) fn write_ids(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    ids: impl Iterator<Item = usize>,
) -> fmt::Result {
    write!(f, "{{")?;
    for (i, id) in ids.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{prefix}{id}")?;
    }
    write!(f, "}}")
}
