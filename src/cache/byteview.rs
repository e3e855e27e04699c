//! Byte View Module
//!
//! Immutable byte buffer used as the cached value type.

use std::fmt;

use bytes::Bytes;

use crate::cache::SizedValue;

// == Byte View ==
/// An immutable view over cached bytes.
///
/// Construction copies its input and `to_vec` hands out a fresh copy, so
/// nothing outside the cache can mutate a stored value. Clones share the
/// underlying buffer.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    // == Constructor ==
    /// Creates a view holding a copy of `data`.
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    // == Length ==
    /// Returns the number of bytes held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // == Copy Out ==
    /// Returns a copy of the held bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Borrows the held bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl SizedValue for ByteView {
    fn size(&self) -> usize {
        self.len()
    }
}

impl From<Vec<u8>> for ByteView {
    /// Takes ownership of a buffer the caller no longer holds, so no copy is needed.
    fn from(data: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }
}

impl From<&str> for ByteView {
    fn from(data: &str) -> Self {
        Self::new(data.as_bytes())
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView").field("len", &self.len()).finish()
    }
}
