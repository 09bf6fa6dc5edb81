//! Tree pages: red-black nodes holding several sorted key/value slots.
//!
//! A page keeps its keys and values in two parallel vectors bounded by a
//! fixed capacity. Nodes live in the tree's arena and link to each other by
//! `NodeId`.

use std::cmp::Ordering;

use crate::config::split_point;
use crate::tree::order::KeyOrder;

/// Pages with at least this many slots are searched by bisection; smaller
/// pages are scanned linearly.
pub const BINARY_SEARCH_THRESHOLD: usize = 10;

/// Index of a page in the tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Red-black node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Outcome of searching one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSearch {
    /// Matching slot on a hit, otherwise the first slot whose key is greater
    /// than the search key (the insertion point).
    pub slot: usize,
    /// Whether `slot` holds a key equal to the search key.
    pub found: bool,
}

impl PageSearch {
    const fn hit(slot: usize) -> Self {
        Self { slot, found: true }
    }

    const fn miss(slot: usize) -> Self {
        Self { slot, found: false }
    }
}

/// A red-black node holding an ordered batch of key/value pairs.
#[derive(Debug)]
pub struct Page<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    capacity: usize,
    pub(crate) color: Color,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// False once the arena slot has been released.
    alive: bool,
}

impl<K, V> Page<K, V> {
    /// Create an empty, unlinked black page.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            capacity,
            color: Color::Black,
            parent: None,
            left: None,
            right: None,
            alive: true,
        }
    }

    /// Number of occupied slots.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no slot is occupied.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty() is not const-stable
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Maximum number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots.
    #[must_use]
    pub fn free_space(&self) -> usize {
        self.capacity.saturating_sub(self.keys.len())
    }

    /// Whether every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Slots kept by this page when it splits.
    #[must_use]
    pub fn split_items(&self, load_factor: f32) -> usize {
        split_point(self.capacity, load_factor)
    }

    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }

    /// Key at `slot`, or `None` when `slot >= len()`.
    #[must_use]
    pub fn key(&self, slot: usize) -> Option<&K> {
        self.keys.get(slot)
    }

    /// Value at `slot`, or `None` when `slot >= len()`.
    #[must_use]
    pub fn value(&self, slot: usize) -> Option<&V> {
        self.values.get(slot)
    }

    pub fn value_mut(&mut self, slot: usize) -> Option<&mut V> {
        self.values.get_mut(slot)
    }

    /// All keys in slot order.
    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// All values in slot order.
    #[must_use]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Insert a pair at `slot`, shifting later slots right.
    ///
    /// The caller guarantees `slot <= len() < capacity()`.
    pub fn insert(&mut self, slot: usize, key: K, value: V) {
        debug_assert!(slot <= self.keys.len());
        debug_assert!(!self.is_full(), "insert into a full page");
        self.keys.insert(slot, key);
        self.values.insert(slot, value);
    }

    /// Append a pair; used when filling pages from sorted input.
    pub fn push(&mut self, key: K, value: V) {
        debug_assert!(!self.is_full(), "push into a full page");
        self.keys.push(key);
        self.values.push(value);
    }

    /// Remove the pair at `slot`, shifting later slots left.
    pub fn remove(&mut self, slot: usize) -> (K, V) {
        (self.keys.remove(slot), self.values.remove(slot))
    }

    /// Replace the value at `slot`, returning the old one.
    pub fn replace_value(&mut self, slot: usize, value: V) -> V {
        std::mem::replace(&mut self.values[slot], value)
    }

    /// Move the slots from `at` onwards into a new unlinked page of the same
    /// capacity.
    #[must_use]
    pub fn split_off(&mut self, at: usize) -> Self {
        let mut sibling = Self::new(self.capacity);
        sibling.keys.extend(self.keys.drain(at..));
        sibling.values.extend(self.values.drain(at..));
        sibling
    }

    /// Take over `other`'s slots wholesale, leaving `other` empty.
    ///
    /// Links and color are untouched.
    pub fn copy_from(&mut self, other: &mut Self) {
        self.keys = std::mem::take(&mut other.keys);
        self.values = std::mem::take(&mut other.values);
    }

    /// Drop all content and links and mark the slot as free.
    pub(crate) fn release(&mut self) {
        self.keys = Vec::new();
        self.values = Vec::new();
        self.color = Color::Black;
        self.parent = None;
        self.left = None;
        self.right = None;
        self.alive = false;
    }

    /// Search this page for `key`.
    ///
    /// Keys outside `[first_key, last_key]` return slot `0` or `len()`
    /// without scanning.
    pub fn search(&self, key: &K, order: &KeyOrder<K>) -> PageSearch {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return PageSearch::miss(0);
        };

        match order.compare(key, first) {
            Ordering::Less => return PageSearch::miss(0),
            Ordering::Equal => return PageSearch::hit(0),
            Ordering::Greater => {}
        }
        match order.compare(key, last) {
            Ordering::Greater => return PageSearch::miss(self.keys.len()),
            Ordering::Equal => return PageSearch::hit(self.keys.len() - 1),
            Ordering::Less => {}
        }

        if self.keys.len() >= BINARY_SEARCH_THRESHOLD {
            return match self.keys.binary_search_by(|stored| order.compare(stored, key)) {
                Ok(slot) => PageSearch::hit(slot),
                Err(slot) => PageSearch::miss(slot),
            };
        }

        for (slot, stored) in self.keys.iter().enumerate().skip(1) {
            match order.compare(key, stored) {
                Ordering::Equal => return PageSearch::hit(slot),
                Ordering::Less => return PageSearch::miss(slot),
                Ordering::Greater => {}
            }
        }
        PageSearch::miss(self.keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(capacity: usize, keys: &[i32]) -> Page<i32, String> {
        let mut page = Page::new(capacity);
        for &k in keys {
            page.push(k, format!("v{k}"));
        }
        page
    }

    #[test]
    fn test_search_linear() {
        let page = page_with(8, &[10, 20, 30, 40]);
        let order = KeyOrder::natural();

        assert_eq!(page.search(&5, &order), PageSearch::miss(0));
        assert_eq!(page.search(&10, &order), PageSearch::hit(0));
        assert_eq!(page.search(&25, &order), PageSearch::miss(2));
        assert_eq!(page.search(&30, &order), PageSearch::hit(2));
        assert_eq!(page.search(&40, &order), PageSearch::hit(3));
        assert_eq!(page.search(&45, &order), PageSearch::miss(4));
    }

    #[test]
    fn test_search_binary() {
        let keys: Vec<i32> = (0..20).map(|i| i * 10).collect();
        let page = page_with(32, &keys);
        let order = KeyOrder::natural();

        assert_eq!(page.search(&70, &order), PageSearch::hit(7));
        assert_eq!(page.search(&75, &order), PageSearch::miss(8));
        assert_eq!(page.search(&190, &order), PageSearch::hit(19));
        assert_eq!(page.search(&-1, &order), PageSearch::miss(0));
    }

    #[test]
    fn test_search_empty_page() {
        let page: Page<i32, String> = Page::new(4);
        assert_eq!(page.search(&1, &KeyOrder::natural()), PageSearch::miss(0));
    }

    #[test]
    fn test_search_custom_order() {
        let mut page: Page<i32, ()> = Page::new(4);
        for k in [30, 20, 10] {
            page.push(k, ());
        }
        let order = KeyOrder::custom(|a: &i32, b: &i32| b.cmp(a));
        assert_eq!(page.search(&20, &order), PageSearch::hit(1));
        assert_eq!(page.search(&25, &order), PageSearch::miss(1));
    }

    #[test]
    fn test_insert_and_remove_shift_slots() {
        let mut page = page_with(4, &[10, 30]);
        page.insert(1, 20, "v20".to_string());
        assert_eq!(page.keys(), &[10, 20, 30]);
        assert_eq!(page.free_space(), 1);

        let (k, v) = page.remove(0);
        assert_eq!((k, v.as_str()), (10, "v10"));
        assert_eq!(page.keys(), &[20, 30]);
        assert_eq!(page.values(), &["v20".to_string(), "v30".to_string()]);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let page = page_with(4, &[1, 2]);
        assert_eq!(page.key(1), Some(&2));
        assert!(page.key(2).is_none());
        assert!(page.value(5).is_none());
    }

    #[test]
    fn test_split_off() {
        let mut page = page_with(4, &[1, 2, 3, 4]);
        assert!(page.is_full());
        let sibling = page.split_off(page.split_items(0.7));
        assert_eq!(page.keys(), &[1, 2]);
        assert_eq!(sibling.keys(), &[3, 4]);
        assert_eq!(sibling.capacity(), 4);
    }

    #[test]
    fn test_copy_from() {
        let mut target = page_with(4, &[1]);
        let mut source = page_with(4, &[7, 8]);
        target.copy_from(&mut source);
        assert_eq!(target.keys(), &[7, 8]);
        assert!(source.is_empty());
    }

    #[test]
    fn test_release() {
        let mut page = page_with(4, &[1, 2]);
        page.color = Color::Red;
        page.left = Some(NodeId(3));
        page.release();
        assert!(!page.is_alive());
        assert!(page.is_empty());
        assert!(page.left.is_none());
        assert_eq!(page.color, Color::Black);
    }
}
