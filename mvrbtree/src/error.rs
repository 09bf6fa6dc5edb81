//! Errors surfaced by tree, view and cursor operations.

use crate::config::ConfigError;

/// Errors that can occur during tree operations.
///
/// A key that is simply absent is not an error; lookups return `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// An argument violates the operation's contract (e.g. `from > to` in a
    /// range, unsorted bulk-build input, invalid page configuration).
    InvalidArgument(String),
    /// A key or bound lies outside the fences of a range view.
    KeyOutOfRange,
    /// The tree's internal structure is inconsistent.
    CorruptTree(String),
    /// The tree was modified behind a cursor's back.
    ConcurrentModification,
    /// A cursor method was called in the wrong order.
    IllegalState(&'static str),
    /// Navigation on an empty tree or view.
    NoSuchElement,
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::KeyOutOfRange => write!(f, "key out of range"),
            Self::CorruptTree(message) => write!(f, "corrupt tree: {message}"),
            Self::ConcurrentModification => write!(f, "concurrent modification detected"),
            Self::IllegalState(message) => write!(f, "illegal state: {message}"),
            Self::NoSuchElement => write!(f, "no such element"),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<ConfigError> for TreeError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}
