//! Typed predicate constructors
//!
//! Comparisons are built from attribute selectors, so the operand type and
//! the entity are checked at compile time:
//!
//! ```ignore
//! Player::score().gt(10.0) & Player::name().has_no_prefix("Desp")
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr, Not, Range, RangeInclusive};

use crate::convert::{Ordered, StoragePrimitive};
use crate::schema::{Attribute, Entity};
use crate::store::StorageValue;

use super::ast::{Expression, Operand, Operator};
use super::compile::{compile, NativeFilter};

/// A predicate over records of entity `E`
pub struct Predicate<E> {
    expression: Expression,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Predicate<E> {
    fn wrap(expression: Expression) -> Self {
        Self {
            expression,
            _entity: PhantomData,
        }
    }

    /// Always-true predicate
    pub fn always() -> Self {
        Self::wrap(Expression::Constant(true))
    }

    /// Always-false predicate
    pub fn never() -> Self {
        Self::wrap(Expression::Constant(false))
    }

    pub fn and(self, other: Predicate<E>) -> Self {
        Self::wrap(self.expression.and(other.expression))
    }

    pub fn or(self, other: Predicate<E>) -> Self {
        Self::wrap(self.expression.or(other.expression))
    }

    pub fn negate(self) -> Self {
        Self::wrap(self.expression.negate())
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn into_expression(self) -> Expression {
        self.expression
    }

    /// Compile to the native filter syntax
    pub fn compile(&self) -> NativeFilter {
        compile(&self.expression)
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self::wrap(self.expression.clone())
    }
}

impl<E> PartialEq for Predicate<E> {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expression).finish()
    }
}

impl<E> fmt::Display for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compile().render())
    }
}

impl<E> BitAnd for Predicate<E> {
    type Output = Predicate<E>;

    fn bitand(self, rhs: Predicate<E>) -> Predicate<E> {
        self.and(rhs)
    }
}

impl<E> BitOr for Predicate<E> {
    type Output = Predicate<E>;

    fn bitor(self, rhs: Predicate<E>) -> Predicate<E> {
        self.or(rhs)
    }
}

impl<E> Not for Predicate<E> {
    type Output = Predicate<E>;

    fn not(self) -> Predicate<E> {
        self.negate()
    }
}

/// Operand of `is_in` / `is_not_in` after lowering to storage values
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    /// Any of the listed values
    List(Vec<StorageValue>),
    /// `lower..=upper`
    Closed(StorageValue, StorageValue),
    /// `lower..upper`
    HalfOpen(StorageValue, StorageValue),
}

/// Values accepted by `is_in` / `is_not_in` for comparand type `T`:
/// arrays, vectors, closed ranges and half-open ranges.
pub trait MembershipOperand<T> {
    fn into_membership(self) -> Membership;
}

fn lower<T: StoragePrimitive, V: Into<T>>(value: V) -> StorageValue {
    Into::<T>::into(value).into_storage()
}

impl<T: StoragePrimitive, V: Into<T>, const N: usize> MembershipOperand<T> for [V; N] {
    fn into_membership(self) -> Membership {
        Membership::List(self.into_iter().map(lower::<T, V>).collect())
    }
}

impl<T: StoragePrimitive, V: Into<T>> MembershipOperand<T> for Vec<V> {
    fn into_membership(self) -> Membership {
        Membership::List(self.into_iter().map(lower::<T, V>).collect())
    }
}

impl<T: StoragePrimitive + Ordered, V: Into<T>> MembershipOperand<T> for RangeInclusive<V> {
    fn into_membership(self) -> Membership {
        let (start, end) = self.into_inner();
        Membership::Closed(lower::<T, V>(start), lower::<T, V>(end))
    }
}

impl<T: StoragePrimitive + Ordered, V: Into<T>> MembershipOperand<T> for Range<V> {
    fn into_membership(self) -> Membership {
        Membership::HalfOpen(lower::<T, V>(self.start), lower::<T, V>(self.end))
    }
}

/// Regular expression operand of `matches` / `does_not_match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<E: Entity, S: StoragePrimitive> Attribute<E, S> {
    fn compare(&self, operator: Operator, operand: Operand) -> Predicate<E> {
        Predicate::wrap(Expression::comparison(self.storage_name(), operator, operand))
    }

    fn compare_value(&self, operator: Operator, value: S::Comparand) -> Predicate<E> {
        self.compare(operator, Operand::Value(value.into_storage()))
    }

    pub fn eq(&self, value: impl Into<S::Comparand>) -> Predicate<E> {
        self.compare_value(Operator::Equal, value.into())
    }

    pub fn ne(&self, value: impl Into<S::Comparand>) -> Predicate<E> {
        self.compare_value(Operator::NotEqual, value.into())
    }

    /// Membership in a list or range.
    ///
    /// An empty list compiles to `FALSEPREDICATE`.
    pub fn is_in<M: MembershipOperand<S::Comparand>>(&self, operand: M) -> Predicate<E> {
        match operand.into_membership() {
            Membership::List(values) if values.is_empty() => Predicate::never(),
            Membership::List(values) => self.compare(Operator::In, Operand::List(values)),
            Membership::Closed(lower, upper) => {
                self.compare(Operator::Between, Operand::Bounds(lower, upper))
            }
            Membership::HalfOpen(lower, upper) => {
                self.compare(Operator::WithinHalfOpen, Operand::Bounds(lower, upper))
            }
        }
    }

    /// Negated membership.
    ///
    /// An empty list compiles to `TRUEPREDICATE`.
    pub fn is_not_in<M: MembershipOperand<S::Comparand>>(&self, operand: M) -> Predicate<E> {
        match operand.into_membership() {
            Membership::List(values) if values.is_empty() => Predicate::always(),
            Membership::List(values) => self.compare(Operator::In, Operand::List(values)).negate(),
            Membership::Closed(lower, upper) => self
                .compare(Operator::Between, Operand::Bounds(lower, upper))
                .negate(),
            Membership::HalfOpen(lower, upper) => {
                self.compare(Operator::OutsideHalfOpen, Operand::Bounds(lower, upper))
            }
        }
    }
}

impl<E: Entity, S> Attribute<E, S>
where
    S: StoragePrimitive,
    S::Comparand: Ordered,
{
    pub fn gt(&self, value: impl Into<S::Comparand>) -> Predicate<E> {
        self.compare_value(Operator::Greater, value.into())
    }

    pub fn ge(&self, value: impl Into<S::Comparand>) -> Predicate<E> {
        self.compare_value(Operator::GreaterOrEqual, value.into())
    }

    pub fn lt(&self, value: impl Into<S::Comparand>) -> Predicate<E> {
        self.compare_value(Operator::Less, value.into())
    }

    pub fn le(&self, value: impl Into<S::Comparand>) -> Predicate<E> {
        self.compare_value(Operator::LessOrEqual, value.into())
    }
}

impl<E: Entity, T: StoragePrimitive<Comparand = T>> Attribute<E, Option<T>> {
    /// Attribute is absent
    pub fn is_nil(&self) -> Predicate<E> {
        self.compare(Operator::Equal, Operand::Value(StorageValue::Null))
    }

    /// Attribute is present
    pub fn is_not_nil(&self) -> Predicate<E> {
        self.compare(Operator::NotEqual, Operand::Value(StorageValue::Null))
    }
}

impl<E: Entity, S> Attribute<E, S>
where
    S: StoragePrimitive<Comparand = String>,
{
    fn compare_text(&self, operator: Operator, text: String) -> Predicate<E> {
        self.compare(operator, Operand::Value(StorageValue::String(text)))
    }

    pub fn has_prefix(&self, prefix: impl Into<String>) -> Predicate<E> {
        self.compare_text(Operator::BeginsWith, prefix.into())
    }

    pub fn has_no_prefix(&self, prefix: impl Into<String>) -> Predicate<E> {
        self.has_prefix(prefix).negate()
    }

    pub fn has_suffix(&self, suffix: impl Into<String>) -> Predicate<E> {
        self.compare_text(Operator::EndsWith, suffix.into())
    }

    pub fn has_no_suffix(&self, suffix: impl Into<String>) -> Predicate<E> {
        self.has_suffix(suffix).negate()
    }

    pub fn contains(&self, text: impl Into<String>) -> Predicate<E> {
        self.compare_text(Operator::Contains, text.into())
    }

    pub fn does_not_contain(&self, text: impl Into<String>) -> Predicate<E> {
        self.contains(text).negate()
    }

    /// Whole-string regular expression match
    pub fn matches(&self, pattern: Pattern) -> Predicate<E> {
        self.compare_text(Operator::Matches, pattern.0)
    }

    pub fn does_not_match(&self, pattern: Pattern) -> Predicate<E> {
        self.matches(pattern).negate()
    }
}
