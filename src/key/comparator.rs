use std::cmp::Ordering;

use super::ClusteringValue;
use crate::schema::ClusteringOrder;

/// Schema-bound ordering over clustering keys and prefixes.
///
/// Built once per schema and borrowed by every lookup. Components compare by
/// value, reversed for descending columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusteringComparator {
    orders: Vec<ClusteringOrder>,
}

impl ClusteringComparator {
    /// Comparator for clustering columns with the given orders.
    pub fn new(orders: Vec<ClusteringOrder>) -> Self {
        Self { orders }
    }

    /// Number of clustering components.
    pub fn size(&self) -> usize {
        self.orders.len()
    }

    fn compare_component(&self, idx: usize, a: &ClusteringValue, b: &ClusteringValue) -> Ordering {
        let ord = a.cmp(b);
        match self.orders.get(idx) {
            Some(ClusteringOrder::Desc) => ord.reverse(),
            _ => ord,
        }
    }

    fn compare_common(&self, a: &[ClusteringValue], b: &[ClusteringValue]) -> Ordering {
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(idx, (x, y))| self.compare_component(idx, x, y))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Total order over keys and prefixes: component-wise, and a prefix
    /// sorts before every longer prefix it is a prefix of.
    pub fn compare(&self, a: &[ClusteringValue], b: &[ClusteringValue]) -> Ordering {
        self.compare_common(a, b).then_with(|| a.len().cmp(&b.len()))
    }

    /// Order that only looks at the components both sides have, so a key
    /// compares equal to each of its prefixes. Used to position range bounds.
    pub fn compare_prefix_equal(&self, a: &[ClusteringValue], b: &[ClusteringValue]) -> Ordering {
        self.compare_common(a, b)
    }

    /// Exact equality under this comparator.
    pub fn equal(&self, a: &[ClusteringValue], b: &[ClusteringValue]) -> bool {
        self.compare(a, b).is_eq()
    }
}
