//! Rust types that map one-to-one onto a storage kind

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::schema::AttributeKind;
use crate::store::{RecordId, StorageValue};

/// A Rust type with a direct storage representation.
///
/// `Option<T>` is the optional form of `T`; absent reads as `None`.
pub trait StoragePrimitive: Clone + Send + Sync + 'static {
    /// Storage kind this type maps to
    const KIND: AttributeKind;

    /// Whether the attribute may be absent
    const OPTIONAL: bool = false;

    /// Type of operands this attribute is compared against in predicates
    type Comparand: StoragePrimitive;

    fn into_storage(self) -> StorageValue;

    /// Decode a stored value. Returns `None` for a kind mismatch or for an
    /// absent value of a required type.
    fn from_storage(value: &StorageValue) -> Option<Self>;
}

macro_rules! storage_primitive {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl StoragePrimitive for $ty {
            const KIND: AttributeKind = AttributeKind::$kind;
            type Comparand = Self;

            fn into_storage(self) -> StorageValue {
                StorageValue::$variant(self)
            }

            fn from_storage(value: &StorageValue) -> Option<Self> {
                match value {
                    StorageValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

storage_primitive!(bool, Boolean, Bool);
storage_primitive!(i16, Integer16, Int16);
storage_primitive!(i32, Integer32, Int32);
storage_primitive!(i64, Integer64, Int64);
storage_primitive!(f64, Double, Double);
storage_primitive!(String, String, String);
storage_primitive!(Vec<u8>, Binary, Binary);
storage_primitive!(DateTime<Utc>, Date, Date);
storage_primitive!(Uuid, Uuid, Uuid);
storage_primitive!(RecordId, ToOne, Reference);

impl StoragePrimitive for Vec<RecordId> {
    const KIND: AttributeKind = AttributeKind::ToMany;
    type Comparand = Self;

    fn into_storage(self) -> StorageValue {
        StorageValue::References(self)
    }

    fn from_storage(value: &StorageValue) -> Option<Self> {
        match value {
            StorageValue::References(ids) => Some(ids.clone()),
            // An unset to-many relationship is empty
            StorageValue::Null => Some(Vec::new()),
            _ => None,
        }
    }
}

impl<T: StoragePrimitive<Comparand = T>> StoragePrimitive for Option<T> {
    const KIND: AttributeKind = T::KIND;
    const OPTIONAL: bool = true;
    type Comparand = T;

    fn into_storage(self) -> StorageValue {
        match self {
            Some(value) => value.into_storage(),
            None => StorageValue::Null,
        }
    }

    fn from_storage(value: &StorageValue) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        T::from_storage(value).map(Some)
    }
}

/// Primitives with a total order in the store, usable in range comparisons
pub trait Ordered: StoragePrimitive {}

impl Ordered for i16 {}
impl Ordered for i32 {}
impl Ordered for i64 {}
impl Ordered for f64 {}
impl Ordered for String {}
impl Ordered for DateTime<Utc> {}

/// Fixed-width integer storage that an `i64` domain value narrows into
pub trait FixedWidth: StoragePrimitive<Comparand = Self> + Copy + Into<i64> + TryFrom<i64> {
    /// Clamp `value` to this width's bounds
    fn saturate(value: i64) -> Self;
}

impl FixedWidth for i16 {
    fn saturate(value: i64) -> Self {
        value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
    }
}

impl FixedWidth for i32 {
    fn saturate(value: i64) -> Self {
        value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}
