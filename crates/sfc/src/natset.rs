//! Ordered set of small non-negative integers used as a face key throughout
//! the hull and curve-information machinery.
//!
//! Backed by a `BTreeSet<u32>` plus a cached XOR-fold hash, maintained
//! incrementally on insert/remove so that using a `NatSet` as a `HashMap`
//! key stays cheap. The bit width is 64 rather than 32: curves built on
//! high-dimensional root polytopes produce vertex indices that would alias
//! too often in a narrower fold.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

const HASH_BITS: u32 = 64;

#[derive(Debug, Clone, Default, Eq)]
pub struct NatSet {
    data: BTreeSet<u32>,
    hash: u64,
}

fn bit(v: u32) -> u64 {
    1u64 << (v % HASH_BITS)
}

impl NatSet {
    pub fn new() -> Self {
        NatSet::default()
    }

    pub fn singleton(v: u32) -> Self {
        let mut s = NatSet::new();
        s.insert(v);
        s
    }

    pub fn from_iter(values: impl IntoIterator<Item = u32>) -> Self {
        let mut s = NatSet::new();
        for v in values {
            s.insert(v);
        }
        s
    }

    pub fn insert(&mut self, v: u32) -> bool {
        if self.data.insert(v) {
            self.hash ^= bit(v);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, v: u32) -> bool {
        if self.data.remove(&v) {
            self.hash ^= bit(v);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, v: u32) -> bool {
        self.data.contains(&v)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an arbitrary element; only meaningful when the set is known
    /// to be non-empty.
    pub fn any_element(&self) -> Option<u32> {
        self.data.iter().next().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.data.iter().copied()
    }

    /// `{ b - v | v in self }`.
    pub fn reverse_at(&self, b: u32) -> NatSet {
        NatSet::from_iter(self.data.iter().map(|&v| b - v))
    }

    pub fn union(&self, other: &NatSet) -> NatSet {
        let mut out = self.clone();
        for v in other.iter() {
            out.insert(v);
        }
        out
    }

    /// Lexicographic three-way comparison of the ascending element lists.
    pub fn compare(&self, other: &NatSet) -> std::cmp::Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl PartialEq for NatSet {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl PartialOrd for NatSet {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for NatSet {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.compare(other)
    }
}

impl Hash for NatSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl FromIterator<u32> for NatSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        NatSet::from_iter(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_at_seed_scenario() {
        let s = NatSet::from_iter([0, 1, 4]);
        let r = s.reverse_at(5);
        assert_eq!(r, NatSet::from_iter([1, 4, 5]));
        assert_eq!(r.reverse_at(5), s);
    }

    #[test]
    fn hash_independent_of_insertion_order() {
        let a = NatSet::from_iter([3, 1, 7, 2]);
        let b = NatSet::from_iter([7, 2, 1, 3]);
        assert_eq!(a, b);

        use std::collections::hash_map::DefaultHasher;
        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn compare_is_lexicographic() {
        let a = NatSet::from_iter([0, 1]);
        let b = NatSet::from_iter([0, 1, 2]);
        let c = NatSet::from_iter([0, 2]);
        assert_eq!(a.compare(&b), std::cmp::Ordering::Less);
        assert_eq!(a.compare(&c), std::cmp::Ordering::Less);
        assert_eq!(b.compare(&c), std::cmp::Ordering::Less);
    }

    #[test]
    fn remove_toggles_hash_back() {
        let mut s = NatSet::from_iter([2, 9, 40]);
        let before = s.clone();
        s.insert(15);
        s.remove(15);
        assert_eq!(s, before);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn reverse_at_is_involution(values in proptest::collection::vec(0u32..50, 0..10), b in 50u32..100) {
            let s = NatSet::from_iter(values);
            prop_assert_eq!(s.reverse_at(b).reverse_at(b), s);
        }

        #[test]
        fn hash_is_independent_of_insertion_order(
            values in proptest::collection::vec(0u32..64, 0..12),
        ) {
            let mut shuffled = values.clone();
            shuffled.reverse();
            let a = NatSet::from_iter(values);
            let b = NatSet::from_iter(shuffled);
            prop_assert_eq!(&a, &b);

            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut ha = DefaultHasher::new();
            a.hash(&mut ha);
            let mut hb = DefaultHasher::new();
            b.hash(&mut hb);
            prop_assert_eq!(ha.finish(), hb.finish());
        }
    }
}
