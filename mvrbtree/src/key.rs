//! Composite keys for multi-column index lookups.
//!
//! A `CompositeKey` is an ordered list of heterogeneous `KeyValue`
//! components. Two composite keys compare over their common prefix only: if
//! every component of the shorter key equals the matching component of the
//! longer one, the keys compare `Equal`. A short key can therefore act as a
//! partial-match lookup against longer stored keys (see
//! `PartialSearchMode`).
//!
//! # Usage constraint
//!
//! Because prefix-equal keys are `==`, a tree must never hold both a short
//! key and a longer key extending it as two distinct entries. Store keys of a
//! single arity per tree and use shorter keys only for lookups.
//!
//! # Sentinels
//!
//! `KeyValue::AlwaysLess` and `KeyValue::AlwaysGreater` order below / above
//! every other component. They are fence posts for open-ended ranges, e.g.
//! all keys starting with `1` lie strictly between `(1, AlwaysLess)` and
//! `(1, AlwaysGreater)`. They are never stored as real keys.

use std::cmp::Ordering;

/// Component kind discriminants, in cross-kind sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueKind {
    AlwaysLess = 0x00,
    Null = 0x01,
    Boolean = 0x02,
    Integer = 0x03,
    Float = 0x04,
    Text = 0x05,
    Bytes = 0x06,
    AlwaysGreater = 0xFF,
}

impl TryFrom<u8> for ValueKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::AlwaysLess),
            0x01 => Ok(Self::Null),
            0x02 => Ok(Self::Boolean),
            0x03 => Ok(Self::Integer),
            0x04 => Ok(Self::Float),
            0x05 => Ok(Self::Text),
            0x06 => Ok(Self::Bytes),
            0xFF => Ok(Self::AlwaysGreater),
            _ => Err(value),
        }
    }
}

/// One component of a composite key.
///
/// Components of different kinds order by `ValueKind`. Floats use
/// `f64::total_cmp`, so `NaN` has a fixed place in the order.
#[derive(Debug, Clone)]
pub enum KeyValue {
    /// Orders below every other component.
    AlwaysLess,
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Orders above every other component.
    AlwaysGreater,
}

impl KeyValue {
    /// Get the kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::AlwaysLess => ValueKind::AlwaysLess,
            Self::Null => ValueKind::Null,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::AlwaysGreater => ValueKind::AlwaysGreater,
        }
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            // Sentinels ignore the other side except against themselves.
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlwaysLess => write!(f, "-inf"),
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(bytes) => {
                write!(f, "0x")?;
                bytes.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
            }
            Self::AlwaysGreater => write!(f, "+inf"),
        }
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// An ordered list of key components compared by common prefix.
#[derive(Debug, Clone, Default)]
pub struct CompositeKey {
    keys: Vec<KeyValue>,
}

impl CompositeKey {
    /// Create an empty composite key.
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Create a composite key from its components.
    #[must_use]
    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<KeyValue>,
    {
        Self {
            keys: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A one-component key that compares above every real key.
    #[must_use]
    pub fn always_greater() -> Self {
        Self {
            keys: vec![KeyValue::AlwaysGreater],
        }
    }

    /// A one-component key that compares below every real key.
    #[must_use]
    pub fn always_less() -> Self {
        Self {
            keys: vec![KeyValue::AlwaysLess],
        }
    }

    /// Append a component. Appending another composite key appends its
    /// components, so composite keys never nest.
    pub fn add_key(&mut self, key: impl Into<Self>) {
        self.keys.extend(key.into().keys);
    }

    /// Builder form of `add_key`.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Self>) -> Self {
        self.add_key(key);
        self
    }

    /// The components in order.
    #[must_use]
    pub fn keys(&self) -> &[KeyValue] {
        &self.keys
    }

    /// Number of components.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the key has no components.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty() is not const-stable
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.keys
            .iter()
            .zip(&other.keys)
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CompositeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompositeKey {}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}")?;
        }
        write!(f, "]")
    }
}

impl From<KeyValue> for CompositeKey {
    fn from(value: KeyValue) -> Self {
        Self { keys: vec![value] }
    }
}

macro_rules! single_component_key {
    ($($source:ty),*) => {
        $(
            impl From<$source> for CompositeKey {
                fn from(value: $source) -> Self {
                    Self::from(KeyValue::from(value))
                }
            }
        )*
    };
}

single_component_key!(bool, i64, i32, f64, &str, String, Vec<u8>);

impl From<Vec<KeyValue>> for CompositeKey {
    fn from(keys: Vec<KeyValue>) -> Self {
        Self { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: &[KeyValue]) -> CompositeKey {
        CompositeKey::from(values.to_vec())
    }

    #[test]
    fn test_prefix_compares_equal() {
        let prefix = CompositeKey::from(1);
        let stored = CompositeKey::from(1).with_key("a");
        assert_eq!(prefix.cmp(&stored), Ordering::Equal);
        assert_eq!(stored.cmp(&prefix), Ordering::Equal);
    }

    #[test]
    fn test_first_difference_decides() {
        let a = CompositeKey::from(1).with_key("b");
        let b = CompositeKey::from(1).with_key("c").with_key(0);
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(b.cmp(&a), Ordering::Greater);

        let c = CompositeKey::from(2);
        assert_eq!(a.cmp(&c), Ordering::Less);
    }

    #[test]
    fn test_add_key_flattens() {
        let mut outer = CompositeKey::from(1);
        outer.add_key(CompositeKey::from("x").with_key(true));
        assert_eq!(outer.len(), 3);
        assert_eq!(
            outer.keys(),
            &[KeyValue::Integer(1), KeyValue::Text("x".into()), KeyValue::Boolean(true)]
        );
    }

    #[test]
    fn test_sentinels_fence_a_prefix() {
        let low = CompositeKey::from(1).with_key(KeyValue::AlwaysLess);
        let high = CompositeKey::from(1).with_key(KeyValue::AlwaysGreater);
        for suffix in ["", "a", "zzzz"] {
            let stored = CompositeKey::from(1).with_key(suffix);
            assert!(low < stored, "low fence must sort before {stored}");
            assert!(stored < high, "high fence must sort after {stored}");
        }
        assert!(high < CompositeKey::from(2).with_key(""));
        assert!(CompositeKey::from(0).with_key("zzz") < low);
    }

    #[test]
    fn test_sentinel_keys_bound_everything() {
        let greater = CompositeKey::always_greater();
        let less = CompositeKey::always_less();
        for value in [
            KeyValue::Null,
            KeyValue::Boolean(false),
            KeyValue::Integer(i64::MAX),
            KeyValue::Float(f64::INFINITY),
            KeyValue::Text("zzz".into()),
            KeyValue::Bytes(vec![0xFF; 4]),
        ] {
            let k = key(&[value]);
            assert!(greater > k);
            assert!(less < k);
        }
        assert_eq!(greater.cmp(&CompositeKey::always_greater()), Ordering::Equal);
    }

    #[test]
    fn test_cross_kind_order() {
        assert!(KeyValue::Null < KeyValue::Boolean(false));
        assert!(KeyValue::Boolean(true) < KeyValue::Integer(i64::MIN));
        assert!(KeyValue::Integer(i64::MAX) < KeyValue::Float(f64::NEG_INFINITY));
        assert!(KeyValue::Float(1.0) < KeyValue::Text(String::new()));
        assert!(KeyValue::Text("z".into()) < KeyValue::Bytes(Vec::new()));
    }

    #[test]
    fn test_value_kind_try_from() {
        assert_eq!(ValueKind::try_from(0x03), Ok(ValueKind::Integer));
        assert_eq!(ValueKind::try_from(0xFF), Ok(ValueKind::AlwaysGreater));
        assert_eq!(ValueKind::try_from(0x42), Err(0x42));
    }

    #[test]
    fn test_display() {
        let k = CompositeKey::from(1).with_key("a").with_key(KeyValue::AlwaysGreater);
        assert_eq!(k.to_string(), "[1, \"a\", +inf]");
        assert_eq!(KeyValue::Bytes(vec![0x0a, 0xff]).to_string(), "0x0aff");
        assert_eq!(KeyValue::Bytes(Vec::new()).to_string(), "0x");
    }
}
