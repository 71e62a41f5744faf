//! In-memory sort combinator
//!
//! A `Sort<R>` wraps a strict "a precedes b" comparator. Sorts combine left
//! to right: the first sort that orders the pair decides, full ties keep
//! their original relative order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type PrecedesFn<R> = Arc<dyn Fn(&R, &R) -> bool + Send + Sync>;

/// Strict ordering over values of type `R`
pub struct Sort<R> {
    precedes: PrecedesFn<R>,
}

impl<R> Clone for Sort<R> {
    fn clone(&self) -> Self {
        Self {
            precedes: Arc::clone(&self.precedes),
        }
    }
}

impl<R> fmt::Debug for Sort<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sort").finish_non_exhaustive()
    }
}

impl<R: 'static> Sort<R> {
    /// Sort from a strict "precedes" comparator
    pub fn custom(precedes: impl Fn(&R, &R) -> bool + Send + Sync + 'static) -> Self {
        Self {
            precedes: Arc::new(precedes),
        }
    }

    /// Sort on an optional key with a comparator for present values.
    ///
    /// Present values precede absent ones; two absent values tie.
    pub fn custom_optional<K: 'static>(
        key: impl Fn(&R) -> Option<K> + Send + Sync + 'static,
        precedes: impl Fn(&K, &K) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::custom(move |a, b| match (key(a), key(b)) {
            (Some(a), Some(b)) => precedes(&a, &b),
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    pub fn ascending<K: PartialOrd + 'static>(key: impl Fn(&R) -> K + Send + Sync + 'static) -> Self {
        Self::custom(move |a, b| key(a) < key(b))
    }

    pub fn descending<K: PartialOrd + 'static>(key: impl Fn(&R) -> K + Send + Sync + 'static) -> Self {
        Self::custom(move |a, b| key(a) > key(b))
    }

    /// Ascending on an optional key: present values first
    pub fn ascending_optional<K: PartialOrd + 'static>(
        key: impl Fn(&R) -> Option<K> + Send + Sync + 'static,
    ) -> Self {
        Self::custom_optional(key, |a: &K, b: &K| a < b)
    }

    /// Descending on an optional key: absent values first
    pub fn descending_optional<K: PartialOrd + 'static>(
        key: impl Fn(&R) -> Option<K> + Send + Sync + 'static,
    ) -> Self {
        Self::custom(move |a, b| match (key(a), key(b)) {
            (Some(a), Some(b)) => a > b,
            (None, Some(_)) => true,
            (_, None) => false,
        })
    }

    /// Combine sorts: the first one that orders the pair decides
    pub fn combine(sorts: impl IntoIterator<Item = Sort<R>>) -> Self {
        let sorts: Vec<Sort<R>> = sorts.into_iter().collect();
        Self::custom(move |a, b| {
            for sort in &sorts {
                if sort.precedes(a, b) {
                    return true;
                }
                if sort.precedes(b, a) {
                    return false;
                }
            }
            false
        })
    }

    /// This sort, then `next` for ties
    pub fn then(self, next: Sort<R>) -> Self {
        Self::combine([self, next])
    }

    pub fn precedes(&self, a: &R, b: &R) -> bool {
        (self.precedes)(a, b)
    }

    /// Total ordering view: ties are `Equal`
    pub fn ordering(&self, a: &R, b: &R) -> Ordering {
        if self.precedes(a, b) {
            Ordering::Less
        } else if self.precedes(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Stable sort in place
    pub fn sort_slice(&self, items: &mut [R]) {
        items.sort_by(|a, b| self.ordering(a, b));
    }

    /// Stable sort of any collection into a vector
    pub fn sorted(&self, items: impl IntoIterator<Item = R>) -> Vec<R> {
        let mut items: Vec<R> = items.into_iter().collect();
        self.sort_slice(&mut items);
        items
    }
}
