//! Validation rules for domain values
//!
//! A binding holds an ordered list of rules. `validate_all` runs them in
//! registration order and stops at the first failure.

use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::error::{BindError, BindResult};

type CheckFn<V> = Arc<dyn Fn(&V) -> Result<(), String> + Send + Sync>;

/// One validation rule over values of type `V`
pub struct Rule<V> {
    check: CheckFn<V>,
}

impl<V> Clone for Rule<V> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
        }
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").finish_non_exhaustive()
    }
}

impl<V: 'static> Rule<V> {
    /// Rule from a check returning the failure description
    pub fn new(check: impl Fn(&V) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            check: Arc::new(check),
        }
    }

    /// Rule that fails with `description` whenever `predicate` is false
    pub fn satisfying(
        description: impl Into<String>,
        predicate: impl Fn(&V) -> bool + Send + Sync + 'static,
    ) -> Self {
        let description = description.into();
        Self::new(move |value| {
            if predicate(value) {
                Ok(())
            } else {
                Err(description.clone())
            }
        })
    }

    pub fn validate(&self, value: &V) -> BindResult<()> {
        (self.check)(value).map_err(BindError::ValidationFailed)
    }

    /// Lift this rule to optional values: `None` passes, `Some(v)` is checked
    pub fn when_present(self) -> Rule<Option<V>> {
        let check = self.check;
        Rule::new(move |value: &Option<V>| match value {
            Some(inner) => check(inner),
            None => Ok(()),
        })
    }
}

/// Run `rules` in order, stopping at the first failure
pub fn validate_all<V>(rules: &[Rule<V>], value: &V) -> BindResult<()> {
    for rule in rules {
        (rule.check)(value).map_err(BindError::ValidationFailed)?;
    }
    Ok(())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z0-9a-z._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$")
            .expect("email regex is valid")
    })
}

impl Rule<String> {
    /// Not empty once surrounding whitespace is trimmed
    pub fn not_empty() -> Self {
        Self::new(|value: &String| {
            if value.trim().is_empty() {
                Err(format!("{} should not be empty", value))
            } else {
                Ok(())
            }
        })
    }

    pub fn has_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |value: &String| {
            if value.starts_with(&prefix) {
                Ok(())
            } else {
                Err(format!("{} should start with {}", value, prefix))
            }
        })
    }

    pub fn has_suffix(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        Self::new(move |value: &String| {
            if value.ends_with(&suffix) {
                Ok(())
            } else {
                Err(format!("{} should end with {}", value, suffix))
            }
        })
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        Self::new(move |value: &String| {
            if value.contains(&needle) {
                Ok(())
            } else {
                Err(format!("{} should contain {}", value, needle))
            }
        })
    }

    pub fn does_not_contain(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        Self::new(move |value: &String| {
            if value.contains(&needle) {
                Err(format!("{} should not contain {}", value, needle))
            } else {
                Ok(())
            }
        })
    }

    /// Exactly `count` characters
    pub fn count(count: usize) -> Self {
        Self::new(move |value: &String| {
            if value.chars().count() == count {
                Ok(())
            } else {
                Err(format!("{} should have {} character(s)", value, count))
            }
        })
    }

    pub fn is_email() -> Self {
        Self::new(|value: &String| {
            if email_regex().is_match(value) {
                Ok(())
            } else {
                Err(format!("{} is not a valid email", value))
            }
        })
    }
}

impl<V> Rule<V>
where
    V: PartialOrd + fmt::Display + Send + Sync + 'static,
{
    /// Within a closed range
    pub fn is_in(range: RangeInclusive<V>) -> Self {
        Self::new(move |value: &V| {
            if range.contains(value) {
                Ok(())
            } else {
                Err(format!(
                    "Value {} is not within {}..={}",
                    value,
                    range.start(),
                    range.end()
                ))
            }
        })
    }

    /// Within a half-open range
    pub fn is_in_half_open(range: Range<V>) -> Self {
        Self::new(move |value: &V| {
            if range.contains(value) {
                Ok(())
            } else {
                Err(format!(
                    "Value {} is not within {}..{}",
                    value, range.start, range.end
                ))
            }
        })
    }

    pub fn greater_than(bound: V) -> Self {
        Self::new(move |value: &V| {
            if *value > bound {
                Ok(())
            } else {
                Err(format!("Value {} is not greater than {}", value, bound))
            }
        })
    }

    pub fn greater_than_or_equal_to(bound: V) -> Self {
        Self::new(move |value: &V| {
            if *value >= bound {
                Ok(())
            } else {
                Err(format!(
                    "Value {} is not greater than or equal to {}",
                    value, bound
                ))
            }
        })
    }

    pub fn lesser_than(bound: V) -> Self {
        Self::new(move |value: &V| {
            if *value < bound {
                Ok(())
            } else {
                Err(format!("Value {} is not lesser than {}", value, bound))
            }
        })
    }

    pub fn lesser_than_or_equal_to(bound: V) -> Self {
        Self::new(move |value: &V| {
            if *value <= bound {
                Ok(())
            } else {
                Err(format!(
                    "Value {} is not lesser than or equal to {}",
                    value, bound
                ))
            }
        })
    }
}

impl<T: 'static> Rule<Option<T>> {
    pub fn not_none() -> Self {
        Self::new(|value: &Option<T>| {
            if value.is_some() {
                Ok(())
            } else {
                Err("Nil value not allowed for this field".to_string())
            }
        })
    }
}
