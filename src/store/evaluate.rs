//! Predicate evaluation against in-memory records
//!
//! Null semantics:
//! - `== nil` matches absent values, `!= nil` matches present ones
//! - `!= v` matches absent values
//! - every other comparison is false on an absent value
//!
//! MATCHES is a full-string match.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;

use crate::predicate::{Comparison, Expression, Operand, Operator};

use super::errors::{StoreError, StoreResult};
use super::record::RecordHandle;
use super::value::StorageValue;

/// Evaluates expressions against records, caching compiled patterns
#[derive(Debug, Default)]
pub struct PredicateEvaluator {
    patterns: HashMap<String, Regex>,
}

impl PredicateEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `record` satisfies `expression`
    pub fn matches(&mut self, record: &RecordHandle, expression: &Expression) -> StoreResult<bool> {
        match expression {
            Expression::Constant(value) => Ok(*value),
            Expression::Comparison(comparison) => self.matches_comparison(record, comparison),
            Expression::And(children) => {
                for child in children {
                    if !self.matches(record, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expression::Or(children) => {
                for child in children {
                    if self.matches(record, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expression::Not(inner) => Ok(!self.matches(record, inner)?),
        }
    }

    fn matches_comparison(
        &mut self,
        record: &RecordHandle,
        comparison: &Comparison,
    ) -> StoreResult<bool> {
        let actual = record.read(&comparison.attribute);

        match (&comparison.operator, &comparison.operand) {
            (Operator::Equal, Operand::Value(expected)) => Ok(equals(&actual, expected)),
            (Operator::NotEqual, Operand::Value(expected)) => Ok(!equals(&actual, expected)),
            _ if actual.is_null() => Ok(false),
            (Operator::Greater, Operand::Value(bound)) => {
                Ok(ordering(&actual, bound) == Some(Ordering::Greater))
            }
            (Operator::GreaterOrEqual, Operand::Value(bound)) => Ok(matches!(
                ordering(&actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            (Operator::Less, Operand::Value(bound)) => {
                Ok(ordering(&actual, bound) == Some(Ordering::Less))
            }
            (Operator::LessOrEqual, Operand::Value(bound)) => Ok(matches!(
                ordering(&actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            )),
            (Operator::In, Operand::List(values)) => {
                Ok(values.iter().any(|value| actual.matches(value)))
            }
            (Operator::Between, Operand::Bounds(low, high)) => Ok(at_least(&actual, low)
                && matches!(
                    ordering(&actual, high),
                    Some(Ordering::Less | Ordering::Equal)
                )),
            (Operator::WithinHalfOpen, Operand::Bounds(low, high)) => {
                Ok(at_least(&actual, low) && ordering(&actual, high) == Some(Ordering::Less))
            }
            (Operator::OutsideHalfOpen, Operand::Bounds(low, high)) => {
                Ok(ordering(&actual, low) == Some(Ordering::Less) || at_least(&actual, high))
            }
            (Operator::BeginsWith, Operand::Value(pattern)) => {
                Ok(text_test(&actual, pattern, |text, p| text.starts_with(p)))
            }
            (Operator::EndsWith, Operand::Value(pattern)) => {
                Ok(text_test(&actual, pattern, |text, p| text.ends_with(p)))
            }
            (Operator::Contains, Operand::Value(pattern)) => {
                Ok(text_test(&actual, pattern, |text, p| text.contains(p)))
            }
            (Operator::Matches, Operand::Value(pattern)) => {
                let (Some(text), Some(pattern)) = (actual.as_str(), pattern.as_str()) else {
                    return Ok(false);
                };
                Ok(self.pattern(pattern)?.is_match(text))
            }
            // Operator and operand shapes that the builder never pairs
            _ => Ok(false),
        }
    }

    fn pattern(&mut self, pattern: &str) -> StoreResult<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
                StoreError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: err.to_string(),
                }
            })?;
            self.patterns.insert(pattern.to_string(), regex);
        }
        self.patterns
            .get(pattern)
            .ok_or_else(|| StoreError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern cache miss".to_string(),
            })
    }
}

fn equals(actual: &StorageValue, expected: &StorageValue) -> bool {
    match (actual.is_null(), expected.is_null()) {
        (true, true) => true,
        (false, false) => actual.matches(expected),
        _ => false,
    }
}

fn ordering(actual: &StorageValue, bound: &StorageValue) -> Option<Ordering> {
    if bound.is_null() {
        return None;
    }
    actual.compare(bound)
}

fn at_least(actual: &StorageValue, bound: &StorageValue) -> bool {
    matches!(
        ordering(actual, bound),
        Some(Ordering::Greater | Ordering::Equal)
    )
}

fn text_test(actual: &StorageValue, pattern: &StorageValue, test: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.as_str(), pattern.as_str()) {
        (Some(text), Some(pattern)) => test(text, pattern),
        _ => false,
    }
}
