//! Clustering keys and prefixes.
//!
//! A clustering key distinguishes rows within a partition and has exactly as
//! many components as the schema declares clustering columns. A prefix has
//! at most that many; strict prefixes address ranges of rows and are what
//! range tombstones are keyed by. Ordering is never intrinsic: it comes from
//! the schema's [`ClusteringComparator`].

mod comparator;

use std::fmt;

use bytes::Bytes;
pub use comparator::ClusteringComparator;

use crate::{error::SchemaError, schema::Schema};

/// One component of a clustering key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClusteringValue {
    /// Signed integer component.
    Int(i64),
    /// UTF-8 text component.
    Text(String),
    /// Opaque byte component.
    Blob(Bytes),
}

impl fmt::Debug for ClusteringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusteringValue::Int(v) => write!(f, "{v}"),
            ClusteringValue::Text(v) => write!(f, "{v:?}"),
            ClusteringValue::Blob(v) => write!(f, "0x{}", hex(v)),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl From<i64> for ClusteringValue {
    fn from(v: i64) -> Self {
        ClusteringValue::Int(v)
    }
}

impl From<i32> for ClusteringValue {
    fn from(v: i32) -> Self {
        ClusteringValue::Int(i64::from(v))
    }
}

impl From<&str> for ClusteringValue {
    fn from(v: &str) -> Self {
        ClusteringValue::Text(v.to_owned())
    }
}

impl From<String> for ClusteringValue {
    fn from(v: String) -> Self {
        ClusteringValue::Text(v)
    }
}

impl From<Bytes> for ClusteringValue {
    fn from(v: Bytes) -> Self {
        ClusteringValue::Blob(v)
    }
}

/// Zero or more leading clustering components.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ClusteringPrefix(Vec<ClusteringValue>);

impl ClusteringPrefix {
    /// Build a prefix from components.
    pub fn new(components: Vec<ClusteringValue>) -> Self {
        Self(components)
    }

    /// The empty prefix, addressing the whole partition.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the prefix has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the components.
    pub fn components(&self) -> &[ClusteringValue] {
        &self.0
    }

    /// Whether the prefix names a single row under `schema`.
    pub fn is_full(&self, schema: &Schema) -> bool {
        self.0.len() == schema.clustering_key_size()
    }

    /// Consume into components.
    pub fn into_components(self) -> Vec<ClusteringValue> {
        self.0
    }
}

impl fmt::Debug for ClusteringPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<V: Into<ClusteringValue>> FromIterator<V> for ClusteringPrefix {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A full clustering key: exactly one component per clustering column.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClusteringKey(ClusteringPrefix);

impl ClusteringKey {
    /// Build a key, checking its arity against `schema`.
    pub fn new(schema: &Schema, components: Vec<ClusteringValue>) -> Result<Self, SchemaError> {
        Self::from_prefix(schema, ClusteringPrefix::new(components))
    }

    /// Promote a prefix that is full under `schema`.
    pub fn from_prefix(schema: &Schema, prefix: ClusteringPrefix) -> Result<Self, SchemaError> {
        if !prefix.is_full(schema) {
            return Err(SchemaError::KeyArity {
                expected: schema.clustering_key_size(),
                got: prefix.len(),
            });
        }
        Ok(Self(prefix))
    }

    /// Key of the single row of a schema without clustering columns.
    pub fn empty() -> Self {
        Self(ClusteringPrefix::empty())
    }

    /// Borrow the key's components.
    pub fn components(&self) -> &[ClusteringValue] {
        self.0.components()
    }

    /// The leading `len` components.
    pub fn prefix_view(&self, len: usize) -> &[ClusteringValue] {
        &self.0.components()[..len]
    }

    /// Borrow as a prefix.
    pub fn as_prefix(&self) -> &ClusteringPrefix {
        &self.0
    }

    /// Consume into a prefix.
    pub fn into_prefix(self) -> ClusteringPrefix {
        self.0
    }
}

impl fmt::Debug for ClusteringKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusteringKey{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::two_level_schema;

    #[test]
    fn key_arity_is_checked() {
        let schema = two_level_schema();
        assert!(ClusteringKey::new(&schema, vec![1.into(), "a".into()]).is_ok());
        assert_eq!(
            ClusteringKey::new(&schema, vec![1.into()]),
            Err(SchemaError::KeyArity {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn prefix_view_borrows_leading_components() {
        let schema = two_level_schema();
        let key = ClusteringKey::new(&schema, vec![7.into(), "x".into()]).expect("key");
        assert_eq!(key.prefix_view(1), &[ClusteringValue::Int(7)]);
        assert_eq!(key.prefix_view(0), &[] as &[ClusteringValue]);
        assert!(key.as_prefix().is_full(&schema));
        let p: ClusteringPrefix = [7i64].into_iter().collect();
        assert!(!p.is_full(&schema));
    }

    #[test]
    fn debug_is_compact() {
        let p = ClusteringPrefix::new(vec![
            1.into(),
            "a".into(),
            Bytes::from_static(&[0xab]).into(),
        ]);
        assert_eq!(format!("{p:?}"), "[1, \"a\", 0xab]");
    }
}
