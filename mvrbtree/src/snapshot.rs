//! Snapshot save and restore.
//!
//! A snapshot is a self-contained byte stream:
//!
//! ```text
//! +-------+---------+-------------+-----------------------+---------+
//! | MVRB  | version | count (u64) | key, value, key, ...  | CRC32   |
//! +-------+---------+-------------+-----------------------+---------+
//! ```
//!
//! Integers are little-endian. The CRC32 covers every byte before it.
//! Entries are written in key order so restore can bulk-build the tree.

use std::io::{Read, Write};

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::key::{CompositeKey, KeyValue, ValueKind};
use crate::tree::{KeyOrder, MvrbTree};

/// Leading bytes of every snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"MVRB";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_SIZE: usize = SNAPSHOT_MAGIC.len() + 1 + 8;
const CHECKSUM_SIZE: usize = 4;

/// Errors from writing or reading snapshots.
#[derive(Debug)]
pub enum SnapshotError {
    /// I/O error.
    Io(std::io::Error),
    /// The stream does not start with the snapshot magic.
    BadMagic,
    /// The stream was written by an unknown format version.
    UnsupportedVersion(u8),
    /// The stored checksum does not match the content.
    ChecksumMismatch { expected: u32, actual: u32 },
    /// The stream ended in the middle of a field.
    Truncated,
    /// A field holds a value its type cannot represent.
    InvalidEncoding(String),
    /// The decoded entries could not be rebuilt into a tree.
    Tree(TreeError),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "snapshot I/O error: {e}"),
            Self::BadMagic => write!(f, "not a snapshot: bad magic"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported snapshot version: {v}"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "snapshot checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}"
                )
            }
            Self::Truncated => write!(f, "snapshot is truncated"),
            Self::InvalidEncoding(message) => write!(f, "invalid snapshot encoding: {message}"),
            Self::Tree(e) => write!(f, "snapshot rebuild failed: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Tree(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TreeError> for SnapshotError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

/// Cursor over the payload of a snapshot.
pub struct SnapshotReader<'a> {
    bytes: &'a [u8],
}

impl<'a> SnapshotReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len()
    }

    /// Consume exactly `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        if len > self.bytes.len() {
            return Err(SnapshotError::Truncated);
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SnapshotError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u64(&mut self) -> Result<u64, SnapshotError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Read a `u64` length prefix.
    pub fn read_len(&mut self) -> Result<usize, SnapshotError> {
        let len = self.read_u64()?;
        usize::try_from(len)
            .map_err(|_| SnapshotError::InvalidEncoding(format!("length {len} too large")))
    }
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

/// Types that can be stored in a snapshot.
pub trait SnapshotCodec: Sized {
    /// Append this value's encoding to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode one value, consuming exactly the bytes `encode` wrote.
    fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError>;
}

macro_rules! fixed_width_codec {
    ($($int:ty),*) => {
        $(
            impl SnapshotCodec for $int {
                fn encode(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError> {
                    Ok(<$int>::from_le_bytes(input.take_array()?))
                }
            }
        )*
    };
}

fixed_width_codec!(i32, i64, u32, u64);

impl SnapshotCodec for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError> {
        match input.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SnapshotError::InvalidEncoding(format!(
                "boolean byte 0x{other:02x}"
            ))),
        }
    }
}

impl SnapshotCodec for Vec<u8> {
    fn encode(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        out.extend_from_slice(self);
    }

    fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError> {
        let len = input.read_len()?;
        Ok(input.take(len)?.to_vec())
    }
}

impl SnapshotCodec for String {
    fn encode(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        out.extend_from_slice(self.as_bytes());
    }

    fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError> {
        let len = input.read_len()?;
        let bytes = input.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| SnapshotError::InvalidEncoding(format!("string is not UTF-8: {e}")))
    }
}

impl SnapshotCodec for KeyValue {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.kind() as u8);
        match self {
            Self::AlwaysLess | Self::Null | Self::AlwaysGreater => {}
            Self::Boolean(b) => b.encode(out),
            Self::Integer(i) => i.encode(out),
            Self::Float(x) => out.extend_from_slice(&x.to_le_bytes()),
            Self::Text(s) => s.encode(out),
            Self::Bytes(b) => b.encode(out),
        }
    }

    fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError> {
        let tag = input.read_u8()?;
        let kind = ValueKind::try_from(tag)
            .map_err(|t| SnapshotError::InvalidEncoding(format!("value kind 0x{t:02x}")))?;
        Ok(match kind {
            ValueKind::AlwaysLess => Self::AlwaysLess,
            ValueKind::Null => Self::Null,
            ValueKind::Boolean => Self::Boolean(bool::decode(input)?),
            ValueKind::Integer => Self::Integer(i64::decode(input)?),
            ValueKind::Float => Self::Float(f64::from_le_bytes(input.take_array()?)),
            ValueKind::Text => Self::Text(String::decode(input)?),
            ValueKind::Bytes => Self::Bytes(Vec::<u8>::decode(input)?),
            ValueKind::AlwaysGreater => Self::AlwaysGreater,
        })
    }
}

impl SnapshotCodec for CompositeKey {
    fn encode(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        for key in self.keys() {
            key.encode(out);
        }
    }

    fn decode(input: &mut SnapshotReader<'_>) -> Result<Self, SnapshotError> {
        let len = input.read_len()?;
        // Every component takes at least its kind byte.
        if len > input.remaining() {
            return Err(SnapshotError::Truncated);
        }
        let mut keys = Vec::with_capacity(len);
        for _ in 0..len {
            keys.push(KeyValue::decode(input)?);
        }
        Ok(Self::from(keys))
    }
}

impl<K: SnapshotCodec, V: SnapshotCodec> MvrbTree<K, V> {
    /// Write every entry, in key order, to `writer`.
    pub fn write_snapshot<W: Write>(&self, writer: &mut W) -> Result<(), SnapshotError> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + CHECKSUM_SIZE);
        bytes.extend_from_slice(&SNAPSHOT_MAGIC);
        bytes.push(SNAPSHOT_VERSION);
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for (key, value) in self {
            key.encode(&mut bytes);
            value.encode(&mut bytes);
        }

        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());

        writer.write_all(&bytes)?;
        writer.flush()?;
        tracing::debug!(entries = self.len(), bytes = bytes.len(), "wrote snapshot");
        Ok(())
    }
}

impl<K: SnapshotCodec + Ord, V: SnapshotCodec> MvrbTree<K, V> {
    /// Rebuild a naturally ordered tree from a snapshot written by
    /// [`write_snapshot`](Self::write_snapshot).
    ///
    /// # Errors
    ///
    /// Fails on a bad header, a checksum mismatch, malformed or trailing
    /// bytes, or entries that are not strictly increasing.
    pub fn read_snapshot<R: Read>(
        reader: &mut R,
        config: TreeConfig,
    ) -> Result<Self, SnapshotError> {
        Self::read_snapshot_with_order(reader, config, KeyOrder::natural())
    }
}

impl<K: SnapshotCodec, V: SnapshotCodec> MvrbTree<K, V> {
    /// Rebuild a tree ordered by `order`. A tree created with a comparator
    /// must be restored with the same comparator, since its snapshot lists
    /// entries in that order.
    ///
    /// # Errors
    ///
    /// Same as [`read_snapshot`](Self::read_snapshot), with "strictly
    /// increasing" judged by `order`.
    pub fn read_snapshot_with_order<R: Read>(
        reader: &mut R,
        config: TreeConfig,
        order: KeyOrder<K>,
    ) -> Result<Self, SnapshotError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(if bytes.starts_with(&SNAPSHOT_MAGIC) {
                SnapshotError::Truncated
            } else {
                SnapshotError::BadMagic
            });
        }
        if bytes[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
            return Err(SnapshotError::BadMagic);
        }

        let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(trailer);
        let expected = u32::from_le_bytes(stored);
        let actual = crc32fast::hash(content);
        if expected != actual {
            tracing::warn!(expected, actual, "snapshot checksum mismatch");
            return Err(SnapshotError::ChecksumMismatch { expected, actual });
        }

        let mut input = SnapshotReader::new(&content[SNAPSHOT_MAGIC.len()..]);
        let version = input.read_u8()?;
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
        let count = input.read_len()?;

        let mut entries = Vec::with_capacity(count.min(input.remaining()));
        for _ in 0..count {
            let key = K::decode(&mut input)?;
            let value = V::decode(&mut input)?;
            entries.push((key, value));
        }
        if input.remaining() != 0 {
            return Err(SnapshotError::InvalidEncoding(format!(
                "{} trailing bytes after {count} entries",
                input.remaining()
            )));
        }

        let tree = Self::from_sorted_with_order(config, order, entries)?;
        tracing::debug!(entries = count, "restored snapshot");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> MvrbTree<i64, String> {
        let mut tree = MvrbTree::with_config(TreeConfig::new(4)).expect("valid config");
        for k in 0..50 {
            tree.insert(k * 3, format!("value-{k}"))
                .expect("insert should succeed");
        }
        tree
    }

    fn snapshot_bytes<K: SnapshotCodec, V: SnapshotCodec>(tree: &MvrbTree<K, V>) -> Vec<u8> {
        let mut bytes = Vec::new();
        tree.write_snapshot(&mut bytes).expect("write to Vec");
        bytes
    }

    #[test]
    fn test_restore_preserves_entries() {
        let tree = sample_tree();
        let bytes = snapshot_bytes(&tree);
        assert_eq!(&bytes[..4], b"MVRB");

        let restored: MvrbTree<i64, String> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::new(8))
                .expect("valid snapshot");
        assert_eq!(restored.len(), tree.len());
        assert!(restored.iter().eq(tree.iter()));
        assert!(restored.check_invariants().is_empty());
    }

    #[test]
    fn test_empty_tree_snapshot() {
        let tree: MvrbTree<u32, bool> = MvrbTree::new();
        let bytes = snapshot_bytes(&tree);
        assert_eq!(bytes.len(), HEADER_SIZE + CHECKSUM_SIZE);

        let restored: MvrbTree<u32, bool> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::default())
                .expect("valid snapshot");
        assert!(restored.is_empty());
    }

    #[test]
    fn test_composite_keys_snapshot() {
        let mut tree = MvrbTree::with_config(TreeConfig::new(4)).expect("valid config");
        tree.insert(CompositeKey::from(1).with_key("a"), vec![1u8, 2])
            .expect("insert should succeed");
        tree.insert(CompositeKey::from(1).with_key(2.5), Vec::new())
            .expect("insert should succeed");
        tree.insert(CompositeKey::from(false).with_key(KeyValue::Null), vec![9])
            .expect("insert should succeed");

        let bytes = snapshot_bytes(&tree);
        let restored: MvrbTree<CompositeKey, Vec<u8>> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::new(4))
                .expect("valid snapshot");
        assert!(restored.iter().eq(tree.iter()));
    }

    #[test]
    fn test_custom_order_snapshot() {
        let reversed = |a: &i64, b: &i64| b.cmp(a);
        let mut tree =
            MvrbTree::with_comparator(TreeConfig::new(4), reversed).expect("valid config");
        for key in 0..10_i64 {
            tree.insert(key, u64::try_from(key).expect("non-negative"))
                .expect("insert should succeed");
        }
        let bytes = snapshot_bytes(&tree);

        let natural =
            MvrbTree::<i64, u64>::read_snapshot(&mut bytes.as_slice(), TreeConfig::new(4));
        assert!(matches!(
            natural,
            Err(SnapshotError::Tree(TreeError::InvalidArgument(_)))
        ));

        let restored = MvrbTree::<i64, u64>::read_snapshot_with_order(
            &mut bytes.as_slice(),
            TreeConfig::new(4),
            KeyOrder::custom(reversed),
        )
        .expect("valid snapshot");
        assert!(restored.iter().eq(tree.iter()));
        assert_eq!(restored.first_key(), Ok(&9));
        assert!(restored.check_invariants().is_empty());
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = snapshot_bytes(&sample_tree());
        let middle = bytes.len() / 2;
        bytes[middle] ^= 0xFF;

        let result: Result<MvrbTree<i64, String>, _> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::default());
        assert!(matches!(result, Err(SnapshotError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = snapshot_bytes(&sample_tree());
        bytes[0] = b'X';
        let result: Result<MvrbTree<i64, String>, _> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::default());
        assert!(matches!(result, Err(SnapshotError::BadMagic)));

        let mut bytes = snapshot_bytes(&sample_tree());
        bytes[4] = 99;
        let end = bytes.len() - CHECKSUM_SIZE;
        let checksum = crc32fast::hash(&bytes[..end]);
        bytes[end..].copy_from_slice(&checksum.to_le_bytes());
        let result: Result<MvrbTree<i64, String>, _> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::default());
        assert!(matches!(result, Err(SnapshotError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = snapshot_bytes(&sample_tree());
        let result: Result<MvrbTree<i64, String>, _> =
            MvrbTree::read_snapshot(&mut &bytes[..6], TreeConfig::default());
        assert!(matches!(result, Err(SnapshotError::Truncated)));
    }

    #[test]
    fn test_mismatched_value_type_rejected() {
        let bytes = snapshot_bytes(&sample_tree());
        // Values were written as strings; reading them as booleans fails.
        let result: Result<MvrbTree<i64, bool>, _> =
            MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::default());
        assert!(matches!(result, Err(SnapshotError::InvalidEncoding(_))));
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("tree.snapshot");
        let tree = sample_tree();

        let mut file = std::fs::File::create(&path).expect("create snapshot file");
        tree.write_snapshot(&mut file).expect("write snapshot");
        drop(file);

        let mut file = std::fs::File::open(&path).expect("open snapshot file");
        let restored: MvrbTree<i64, String> =
            MvrbTree::read_snapshot(&mut file, TreeConfig::default()).expect("read snapshot");
        assert_eq!(restored.get(&147), Some(&"value-49".to_string()));
        assert_eq!(restored.len(), 50);
    }
}
