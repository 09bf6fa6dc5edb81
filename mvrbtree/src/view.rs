//! Navigable range views over a tree.
//!
//! A view is a pair of fences (`lo`, `hi`, each a [`Bound`]) plus a
//! direction flag. All navigation delegates to the tree's floor and ceiling
//! primitives and then drops results that fall outside the fences. A
//! descending view swaps lowest with highest, ceiling with floor and higher
//! with lower.
//!
//! [`SubMap`] borrows the tree shared; [`SubMapMut`] borrows it exclusively
//! and can insert and remove within its range.

use std::cell::Cell;
use std::cmp::Ordering;
use std::ops::Bound;

use crate::error::TreeError;
use crate::iter::{Iter, Keys, Values};
use crate::tree::{KeyOrder, MvrbTree, Position};

/// Fences and direction of a view.
#[derive(Debug, Clone)]
pub struct RangeSpec<K> {
    lo: Bound<K>,
    hi: Bound<K>,
    descending: bool,
}

fn bound_key<K>(bound: &Bound<K>) -> Option<&K> {
    match bound {
        Bound::Included(key) | Bound::Excluded(key) => Some(key),
        Bound::Unbounded => None,
    }
}

impl<K> RangeSpec<K> {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `lo` is greater than `hi`.
    pub fn new(
        lo: Bound<K>,
        hi: Bound<K>,
        descending: bool,
        order: &KeyOrder<K>,
    ) -> Result<Self, TreeError> {
        if let (Some(l), Some(h)) = (bound_key(&lo), bound_key(&hi)) {
            if order.compare(l, h) == Ordering::Greater {
                return Err(TreeError::InvalidArgument(
                    "range start is greater than range end".to_string(),
                ));
            }
        }
        Ok(Self { lo, hi, descending })
    }

    #[must_use]
    pub const fn lo(&self) -> &Bound<K> {
        &self.lo
    }

    #[must_use]
    pub const fn hi(&self) -> &Bound<K> {
        &self.hi
    }

    #[must_use]
    pub const fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn too_low(&self, key: &K, order: &KeyOrder<K>) -> bool {
        match &self.lo {
            Bound::Unbounded => false,
            Bound::Included(lo) => order.compare(key, lo) == Ordering::Less,
            Bound::Excluded(lo) => order.compare(key, lo) != Ordering::Greater,
        }
    }

    pub fn too_high(&self, key: &K, order: &KeyOrder<K>) -> bool {
        match &self.hi {
            Bound::Unbounded => false,
            Bound::Included(hi) => order.compare(key, hi) == Ordering::Greater,
            Bound::Excluded(hi) => order.compare(key, hi) != Ordering::Less,
        }
    }

    pub fn in_range(&self, key: &K, order: &KeyOrder<K>) -> bool {
        !self.too_low(key, order) && !self.too_high(key, order)
    }

    /// Whether `key` lies between the fence keys, ignoring exclusivity.
    fn in_closed_range(&self, key: &K, order: &KeyOrder<K>) -> bool {
        let above_lo =
            bound_key(&self.lo).is_none_or(|lo| order.compare(key, lo) != Ordering::Less);
        let below_hi =
            bound_key(&self.hi).is_none_or(|hi| order.compare(key, hi) != Ordering::Greater);
        above_lo && below_hi
    }

    /// Whether a nested view may use `bound` as one of its fences.
    fn admits(&self, bound: &Bound<K>, order: &KeyOrder<K>) -> bool {
        match bound {
            Bound::Unbounded => true,
            Bound::Included(key) => self.in_range(key, order),
            Bound::Excluded(key) => self.in_closed_range(key, order),
        }
    }

    fn reject_too_high<V>(&self, tree: &MvrbTree<K, V>, position: Position) -> Option<Position> {
        let key = tree.key_at(position)?;
        (!self.too_high(key, tree.order())).then_some(position)
    }

    fn reject_too_low<V>(&self, tree: &MvrbTree<K, V>, position: Position) -> Option<Position> {
        let key = tree.key_at(position)?;
        (!self.too_low(key, tree.order())).then_some(position)
    }

    fn abs_lowest<V>(&self, tree: &MvrbTree<K, V>) -> Option<Position> {
        let position = match &self.lo {
            Bound::Unbounded => tree.first_position(),
            Bound::Included(lo) => tree.ceiling_position(lo, true),
            Bound::Excluded(lo) => tree.ceiling_position(lo, false),
        }?;
        self.reject_too_high(tree, position)
    }

    fn abs_highest<V>(&self, tree: &MvrbTree<K, V>) -> Option<Position> {
        let position = match &self.hi {
            Bound::Unbounded => tree.last_position(),
            Bound::Included(hi) => tree.floor_position(hi, true),
            Bound::Excluded(hi) => tree.floor_position(hi, false),
        }?;
        self.reject_too_low(tree, position)
    }

    fn abs_ceiling<V>(&self, tree: &MvrbTree<K, V>, key: &K, inclusive: bool) -> Option<Position> {
        if self.too_low(key, tree.order()) {
            return self.abs_lowest(tree);
        }
        let position = tree.ceiling_position(key, inclusive)?;
        self.reject_too_high(tree, position)
    }

    fn abs_floor<V>(&self, tree: &MvrbTree<K, V>, key: &K, inclusive: bool) -> Option<Position> {
        if self.too_high(key, tree.order()) {
            return self.abs_highest(tree);
        }
        let position = tree.floor_position(key, inclusive)?;
        self.reject_too_low(tree, position)
    }

    pub(crate) fn first<V>(&self, tree: &MvrbTree<K, V>) -> Option<Position> {
        if self.descending {
            self.abs_highest(tree)
        } else {
            self.abs_lowest(tree)
        }
    }

    pub(crate) fn last<V>(&self, tree: &MvrbTree<K, V>) -> Option<Position> {
        if self.descending {
            self.abs_lowest(tree)
        } else {
            self.abs_highest(tree)
        }
    }

    /// First position at or after `key` in view order.
    pub(crate) fn ceiling<V>(&self, tree: &MvrbTree<K, V>, key: &K) -> Option<Position> {
        if self.descending {
            self.abs_floor(tree, key, true)
        } else {
            self.abs_ceiling(tree, key, true)
        }
    }

    /// Last position at or before `key` in view order.
    pub(crate) fn floor<V>(&self, tree: &MvrbTree<K, V>, key: &K) -> Option<Position> {
        if self.descending {
            self.abs_ceiling(tree, key, true)
        } else {
            self.abs_floor(tree, key, true)
        }
    }

    /// First position strictly after `key` in view order.
    pub(crate) fn higher<V>(&self, tree: &MvrbTree<K, V>, key: &K) -> Option<Position> {
        if self.descending {
            self.abs_floor(tree, key, false)
        } else {
            self.abs_ceiling(tree, key, false)
        }
    }

    /// Last position strictly before `key` in view order.
    pub(crate) fn lower<V>(&self, tree: &MvrbTree<K, V>, key: &K) -> Option<Position> {
        if self.descending {
            self.abs_ceiling(tree, key, false)
        } else {
            self.abs_floor(tree, key, false)
        }
    }

    pub(crate) fn iter<'a, V>(&self, tree: &'a MvrbTree<K, V>) -> Iter<'a, K, V> {
        Iter::new(tree, self.first(tree), self.last(tree), self.descending)
    }

    fn count<V>(&self, tree: &MvrbTree<K, V>) -> usize {
        Iter::new(tree, self.abs_lowest(tree), self.abs_highest(tree), false).count()
    }
}

impl<K: Clone> RangeSpec<K> {
    /// A nested range. `first`/`last` are in view order; an unbounded side
    /// keeps this range's fence.
    ///
    /// # Errors
    ///
    /// Returns `KeyOutOfRange` if a bound lies outside this range and
    /// `InvalidArgument` if the nested range is inverted.
    fn narrow(
        &self,
        first: Bound<K>,
        last: Bound<K>,
        order: &KeyOrder<K>,
    ) -> Result<Self, TreeError> {
        let (lo, hi) = if self.descending {
            (last, first)
        } else {
            (first, last)
        };
        if !self.admits(&lo, order) || !self.admits(&hi, order) {
            return Err(TreeError::KeyOutOfRange);
        }
        let lo = match lo {
            Bound::Unbounded => self.lo.clone(),
            bound => bound,
        };
        let hi = match hi {
            Bound::Unbounded => self.hi.clone(),
            bound => bound,
        };
        Self::new(lo, hi, self.descending, order)
    }

    fn reversed(&self) -> Self {
        Self {
            lo: self.lo.clone(),
            hi: self.hi.clone(),
            descending: !self.descending,
        }
    }
}

/// Entry count of a view, recomputed only after the tree changes.
#[derive(Debug, Default)]
struct SizeCache {
    cached: Cell<Option<(u64, usize)>>,
}

impl SizeCache {
    fn get_or_count(&self, mod_count: u64, count: impl FnOnce() -> usize) -> usize {
        if let Some((at, size)) = self.cached.get() {
            if at == mod_count {
                return size;
            }
        }
        let size = count();
        self.cached.set(Some((mod_count, size)));
        size
    }
}

/// A read-only view of the entries within a key range.
pub struct SubMap<'a, K, V> {
    tree: &'a MvrbTree<K, V>,
    range: RangeSpec<K>,
    size: SizeCache,
}

impl<'a, K, V> SubMap<'a, K, V> {
    pub(crate) fn new(
        tree: &'a MvrbTree<K, V>,
        lo: Bound<K>,
        hi: Bound<K>,
        descending: bool,
    ) -> Result<Self, TreeError> {
        let range = RangeSpec::new(lo, hi, descending, tree.order())?;
        Ok(Self::from_range(tree, range))
    }

    /// A view whose fences cannot be inverted (at least one side unbounded).
    pub(crate) fn unchecked(
        tree: &'a MvrbTree<K, V>,
        lo: Bound<K>,
        hi: Bound<K>,
        descending: bool,
    ) -> Self {
        Self::from_range(tree, RangeSpec { lo, hi, descending })
    }

    fn from_range(tree: &'a MvrbTree<K, V>, range: RangeSpec<K>) -> Self {
        Self {
            tree,
            range,
            size: SizeCache::default(),
        }
    }

    #[must_use]
    pub const fn range(&self) -> &RangeSpec<K> {
        &self.range
    }

    #[must_use]
    pub const fn is_descending(&self) -> bool {
        self.range.descending
    }

    fn entry(&self, position: Option<Position>) -> Option<(&'a K, &'a V)> {
        self.tree.entry_at(position?)
    }

    /// Number of entries in range, cached until the tree changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
            .get_or_count(self.tree.mod_count(), || self.range.count(self.tree))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.first(self.tree).is_none()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.range.in_range(key, self.tree.order()) && self.tree.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&'a V> {
        if !self.range.in_range(key, self.tree.order()) {
            return None;
        }
        self.tree.get(key)
    }

    #[must_use]
    pub fn first_entry(&self) -> Option<(&'a K, &'a V)> {
        self.entry(self.range.first(self.tree))
    }

    #[must_use]
    pub fn last_entry(&self) -> Option<(&'a K, &'a V)> {
        self.entry(self.range.last(self.tree))
    }

    pub fn first_key(&self) -> Result<&'a K, TreeError> {
        self.first_entry().map(|(k, _)| k).ok_or(TreeError::NoSuchElement)
    }

    pub fn last_key(&self) -> Result<&'a K, TreeError> {
        self.last_entry().map(|(k, _)| k).ok_or(TreeError::NoSuchElement)
    }

    #[must_use]
    pub fn ceiling_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.range.ceiling(self.tree, key))
    }

    #[must_use]
    pub fn floor_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.range.floor(self.tree, key))
    }

    #[must_use]
    pub fn higher_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.range.higher(self.tree, key))
    }

    #[must_use]
    pub fn lower_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.range.lower(self.tree, key))
    }

    #[must_use]
    pub fn ceiling_key(&self, key: &K) -> Option<&'a K> {
        self.ceiling_entry(key).map(|(k, _)| k)
    }

    #[must_use]
    pub fn floor_key(&self, key: &K) -> Option<&'a K> {
        self.floor_entry(key).map(|(k, _)| k)
    }

    #[must_use]
    pub fn higher_key(&self, key: &K) -> Option<&'a K> {
        self.higher_entry(key).map(|(k, _)| k)
    }

    #[must_use]
    pub fn lower_key(&self, key: &K) -> Option<&'a K> {
        self.lower_entry(key).map(|(k, _)| k)
    }

    /// Entries in view order.
    #[must_use]
    pub fn iter(&self) -> Iter<'a, K, V> {
        self.range.iter(self.tree)
    }

    #[must_use]
    pub fn keys(&self) -> Keys<'a, K, V> {
        Keys::new(self.iter())
    }

    #[must_use]
    pub fn values(&self) -> Values<'a, K, V> {
        Values::new(self.iter())
    }
}

impl<'a, K: Clone, V> SubMap<'a, K, V> {
    /// A nested view from `first` to `last`, both given in this view's order.
    ///
    /// # Errors
    ///
    /// Returns `KeyOutOfRange` if a bound lies outside this view and
    /// `InvalidArgument` if `first` comes after `last`.
    pub fn sub_map(&self, first: Bound<K>, last: Bound<K>) -> Result<Self, TreeError> {
        let range = self.range.narrow(first, last, self.tree.order())?;
        Ok(Self::from_range(self.tree, range))
    }

    /// A nested view of the entries before `last` in view order.
    pub fn head_map(&self, last: Bound<K>) -> Result<Self, TreeError> {
        self.sub_map(Bound::Unbounded, last)
    }

    /// A nested view of the entries after `first` in view order.
    pub fn tail_map(&self, first: Bound<K>) -> Result<Self, TreeError> {
        self.sub_map(first, Bound::Unbounded)
    }

    /// The same range in the opposite order.
    #[must_use]
    pub fn descending_map(&self) -> Self {
        Self::from_range(self.tree, self.range.reversed())
    }

    #[must_use]
    pub fn key_set(&self) -> KeySet<'a, K, V> {
        KeySet::new(Self::from_range(self.tree, self.range.clone()))
    }

    #[must_use]
    pub fn descending_key_set(&self) -> KeySet<'a, K, V> {
        KeySet::new(self.descending_map())
    }
}

impl<'a, K, V> IntoIterator for &SubMap<'a, K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view of a key range that can insert and remove entries.
pub struct SubMapMut<'a, K, V> {
    tree: &'a mut MvrbTree<K, V>,
    range: RangeSpec<K>,
    size: SizeCache,
}

impl<'a, K, V> SubMapMut<'a, K, V> {
    pub(crate) fn new(
        tree: &'a mut MvrbTree<K, V>,
        lo: Bound<K>,
        hi: Bound<K>,
    ) -> Result<Self, TreeError> {
        let range = RangeSpec::new(lo, hi, false, tree.order())?;
        Ok(Self {
            tree,
            range,
            size: SizeCache::default(),
        })
    }

    pub(crate) fn unchecked(tree: &'a mut MvrbTree<K, V>, lo: Bound<K>, hi: Bound<K>) -> Self {
        Self {
            tree,
            range: RangeSpec {
                lo,
                hi,
                descending: false,
            },
            size: SizeCache::default(),
        }
    }

    #[must_use]
    pub const fn range(&self) -> &RangeSpec<K> {
        &self.range
    }

    /// Insert a pair whose key lies in range.
    ///
    /// # Errors
    ///
    /// Returns `KeyOutOfRange` without touching the tree if `key` is outside
    /// the view.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        if !self.range.in_range(&key, self.tree.order()) {
            return Err(TreeError::KeyOutOfRange);
        }
        self.tree.insert(key, value)
    }

    /// Remove `key` if it lies in range.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if !self.range.in_range(key, self.tree.order()) {
            return None;
        }
        self.tree.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        if !self.range.in_range(key, self.tree.order()) {
            return None;
        }
        self.tree.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.range.in_range(key, self.tree.order()) {
            return None;
        }
        self.tree.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.range.in_range(key, self.tree.order()) && self.tree.contains_key(key)
    }

    /// Number of entries in range, cached until the tree changes.
    #[must_use]
    pub fn len(&self) -> usize {
        let tree: &MvrbTree<K, V> = self.tree;
        self.size
            .get_or_count(tree.mod_count(), || self.range.count(tree))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.first(&*self.tree).is_none()
    }

    #[must_use]
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.tree.entry_at(self.range.first(&*self.tree)?)
    }

    #[must_use]
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.tree.entry_at(self.range.last(&*self.tree)?)
    }

    /// Remove and return the smallest entry in range.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let position = self.range.first(&*self.tree)?;
        let removal = self.tree.delete_at(position);
        Some((removal.key, removal.value))
    }

    /// Remove and return the largest entry in range.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let position = self.range.last(&*self.tree)?;
        let removal = self.tree.delete_at(position);
        Some((removal.key, removal.value))
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.range.iter(&*self.tree)
    }
}

impl<K: Clone, V> SubMapMut<'_, K, V> {
    /// A read-only view over the same range.
    #[must_use]
    pub fn as_view(&self) -> SubMap<'_, K, V> {
        SubMap::from_range(&*self.tree, self.range.clone())
    }
}

/// A navigable set view over the keys of a [`SubMap`].
pub struct KeySet<'a, K, V> {
    map: SubMap<'a, K, V>,
}

impl<'a, K, V> KeySet<'a, K, V> {
    pub(crate) const fn new(map: SubMap<'a, K, V>) -> Self {
        Self { map }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn first(&self) -> Result<&'a K, TreeError> {
        self.map.first_key()
    }

    pub fn last(&self) -> Result<&'a K, TreeError> {
        self.map.last_key()
    }

    #[must_use]
    pub fn ceiling(&self, key: &K) -> Option<&'a K> {
        self.map.ceiling_key(key)
    }

    #[must_use]
    pub fn floor(&self, key: &K) -> Option<&'a K> {
        self.map.floor_key(key)
    }

    #[must_use]
    pub fn higher(&self, key: &K) -> Option<&'a K> {
        self.map.higher_key(key)
    }

    #[must_use]
    pub fn lower(&self, key: &K) -> Option<&'a K> {
        self.map.lower_key(key)
    }

    #[must_use]
    pub fn iter(&self) -> Keys<'a, K, V> {
        self.map.keys()
    }
}

impl<K: Clone, V> KeySet<'_, K, V> {
    /// The same keys in the opposite order.
    #[must_use]
    pub fn descending(&self) -> Self {
        Self::new(self.map.descending_map())
    }

    pub fn sub_set(&self, first: Bound<K>, last: Bound<K>) -> Result<Self, TreeError> {
        self.map.sub_map(first, last).map(Self::new)
    }

    pub fn head_set(&self, last: Bound<K>) -> Result<Self, TreeError> {
        self.map.head_map(last).map(Self::new)
    }

    pub fn tail_set(&self, first: Bound<K>) -> Result<Self, TreeError> {
        self.map.tail_map(first).map(Self::new)
    }
}

impl<'a, K, V> IntoIterator for &KeySet<'a, K, V> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
