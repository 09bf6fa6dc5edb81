//! Key ordering: natural `Ord` or a caller-supplied comparator.

use std::cmp::Ordering;
use std::sync::Arc;

/// A shareable comparison function.
pub type Comparator<K> = Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

/// The ordering a tree uses for its keys.
///
/// Only [`natural`](Self::natural) needs `K: Ord`; a custom order works for
/// any key type.
pub enum KeyOrder<K> {
    /// The key type's own `Ord`, captured when the order is built.
    Natural(fn(&K, &K) -> Ordering),
    /// A custom total order.
    Custom(Comparator<K>),
}

impl<K: Ord> KeyOrder<K> {
    /// The key type's own ordering.
    #[must_use]
    pub fn natural() -> Self {
        Self::Natural(K::cmp)
    }
}

impl<K> KeyOrder<K> {
    /// Wrap a closure as a custom order.
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(compare))
    }

    #[must_use]
    pub const fn is_natural(&self) -> bool {
        matches!(self, Self::Natural(_))
    }

    /// Compare two keys under this order.
    #[inline]
    pub fn compare(&self, a: &K, b: &K) -> Ordering {
        match self {
            Self::Natural(compare) => compare(a, b),
            Self::Custom(compare) => compare(a, b),
        }
    }
}

impl<K> Clone for KeyOrder<K> {
    fn clone(&self) -> Self {
        match self {
            Self::Natural(compare) => Self::Natural(*compare),
            Self::Custom(compare) => Self::Custom(Arc::clone(compare)),
        }
    }
}

impl<K> std::fmt::Debug for KeyOrder<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Natural(_) => write!(f, "Natural"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
