//! Store-level sort keys
//!
//! A sort descriptor names one attribute, a direction and an optional value
//! comparator. The store reduces a list of them to one `Sort` over records.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::convert::StoragePrimitive;
use crate::schema::{Attribute, Entity};
use crate::store::{RecordHandle, StorageValue};

use super::combinator::Sort;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Comparator over present stored values
pub type ValueComparator = Arc<dyn Fn(&StorageValue, &StorageValue) -> Ordering + Send + Sync>;

/// Untyped sort key as carried by a fetch request
#[derive(Clone)]
pub struct SortKey {
    pub attribute: String,
    pub direction: SortDirection,
    pub comparator: Option<ValueComparator>,
}

impl SortKey {
    pub fn new(attribute: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            attribute: attribute.into(),
            direction,
            comparator: None,
        }
    }

    /// Reduce to a sort over records.
    ///
    /// Present values precede absent ones ascending, absent values precede
    /// present ones descending, two absent values tie.
    pub fn to_sort(&self) -> Sort<RecordHandle> {
        let attribute = self.attribute.clone();
        let direction = self.direction;
        let comparator = self.comparator.clone();

        Sort::custom(move |a: &RecordHandle, b: &RecordHandle| {
            let lhs = a.read(&attribute);
            let rhs = b.read(&attribute);
            match (lhs.is_null(), rhs.is_null()) {
                (false, false) => {
                    let ordering = match &comparator {
                        Some(compare) => compare(&lhs, &rhs),
                        None => lhs.compare(&rhs).unwrap_or(Ordering::Equal),
                    };
                    match direction {
                        SortDirection::Asc => ordering == Ordering::Less,
                        SortDirection::Desc => ordering == Ordering::Greater,
                    }
                }
                (false, true) => direction == SortDirection::Asc,
                (true, false) => direction == SortDirection::Desc,
                (true, true) => false,
            }
        })
    }

    /// Combine keys into one record sort
    pub fn combine(keys: &[SortKey]) -> Sort<RecordHandle> {
        Sort::combine(keys.iter().map(SortKey::to_sort))
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey")
            .field("attribute", &self.attribute)
            .field("direction", &self.direction)
            .field("custom_comparator", &self.comparator.is_some())
            .finish()
    }
}

/// Typed sort key over entity `E`
pub struct SortDescriptor<E> {
    key: SortKey,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SortDescriptor<E> {
    pub fn key(&self) -> &SortKey {
        &self.key
    }

    pub fn into_key(self) -> SortKey {
        self.key
    }
}

impl<E> Clone for SortDescriptor<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for SortDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SortDescriptor").field(&self.key).finish()
    }
}

impl<E: Entity, S: StoragePrimitive> Attribute<E, S> {
    fn sort_descriptor(
        &self,
        direction: SortDirection,
        comparator: Option<ValueComparator>,
    ) -> SortDescriptor<E> {
        SortDescriptor {
            key: SortKey {
                attribute: self.storage_name().to_string(),
                direction,
                comparator,
            },
            _entity: PhantomData,
        }
    }

    pub fn ascending(&self) -> SortDescriptor<E> {
        self.sort_descriptor(SortDirection::Asc, None)
    }

    pub fn descending(&self) -> SortDescriptor<E> {
        self.sort_descriptor(SortDirection::Desc, None)
    }

    /// Ascending with a caller-supplied comparator over present values
    pub fn ascending_by(
        &self,
        compare: impl Fn(&S::Comparand, &S::Comparand) -> Ordering + Send + Sync + 'static,
    ) -> SortDescriptor<E> {
        self.sort_descriptor(SortDirection::Asc, Some(typed_comparator::<S>(compare)))
    }

    /// Descending with a caller-supplied comparator over present values
    pub fn descending_by(
        &self,
        compare: impl Fn(&S::Comparand, &S::Comparand) -> Ordering + Send + Sync + 'static,
    ) -> SortDescriptor<E> {
        self.sort_descriptor(SortDirection::Desc, Some(typed_comparator::<S>(compare)))
    }
}

fn typed_comparator<S: StoragePrimitive>(
    compare: impl Fn(&S::Comparand, &S::Comparand) -> Ordering + Send + Sync + 'static,
) -> ValueComparator {
    Arc::new(move |a: &StorageValue, b: &StorageValue| {
        match (
            <S::Comparand as StoragePrimitive>::from_storage(a),
            <S::Comparand as StoragePrimitive>::from_storage(b),
        ) {
            (Some(a), Some(b)) => compare(&a, &b),
            _ => Ordering::Equal,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: Option<f64>) -> RecordHandle {
        let record = RecordHandle::detached("Duck");
        if let Some(score) = score {
            record.write("score", StorageValue::Double(score));
        }
        record
    }

    fn scores(records: &[RecordHandle]) -> Vec<StorageValue> {
        records.iter().map(|r| r.read("score")).collect()
    }

    #[test]
    fn test_ascending_absent_last() {
        let records = vec![record(None), record(Some(3.0)), record(Some(1.0))];
        let sorted = SortKey::new("score", SortDirection::Asc).to_sort().sorted(records);
        assert_eq!(
            scores(&sorted),
            [StorageValue::Double(1.0), StorageValue::Double(3.0), StorageValue::Null]
        );
    }

    #[test]
    fn test_descending_absent_first() {
        let records = vec![record(Some(1.0)), record(None), record(Some(3.0))];
        let sorted = SortKey::new("score", SortDirection::Desc).to_sort().sorted(records);
        assert_eq!(
            scores(&sorted),
            [StorageValue::Null, StorageValue::Double(3.0), StorageValue::Double(1.0)]
        );
    }

    #[test]
    fn test_custom_comparator() {
        let mut key = SortKey::new("score", SortDirection::Asc);
        // Distance from 2
        key.comparator = Some(Arc::new(|a: &StorageValue, b: &StorageValue| {
            let da = (a.as_f64().unwrap_or(0.0) - 2.0).abs();
            let db = (b.as_f64().unwrap_or(0.0) - 2.0).abs();
            da.total_cmp(&db)
        }));
        let records = vec![record(Some(10.0)), record(Some(1.5)), record(Some(4.0))];
        let sorted = key.to_sort().sorted(records);
        assert_eq!(
            scores(&sorted),
            [StorageValue::Double(1.5), StorageValue::Double(4.0), StorageValue::Double(10.0)]
        );
    }
}
