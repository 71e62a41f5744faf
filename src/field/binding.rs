//! Field bindings
//!
//! A binding ties a typed attribute selector to a conversion between its
//! storage primitive `S` and a domain type `D`, plus ordered validation
//! rules, an optional default and an optional uniqueness constraint.
//!
//! For every value `v` accepted by `validate`, `set(v)` followed by
//! `current_value` yields `v` again.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::convert::validation::validate_all;
use crate::convert::{Codec, Converter, FixedWidth, Overflow, Rule, StoragePrimitive};
use crate::error::{BindError, BindResult};
use crate::observability::{log_event, metrics, Event};
use crate::predicate::{Expression, Operand, Operator};
use crate::query::{execute, FetchRequest};
use crate::schema::{Attribute, Entity};
use crate::store::RecordHandle;

type DefaultFn<D> = Arc<dyn Fn() -> D + Send + Sync>;

/// Binding of attribute `S` of entity `E` to domain type `D`
pub struct FieldBinding<E, S, D> {
    attribute: Attribute<E, S>,
    /// Storage name, resolved against the registration table at construction
    name: &'static str,
    converter: Converter<S, D>,
    rules: Vec<Rule<D>>,
    default: Option<DefaultFn<D>>,
    unique: bool,
}

impl<E, S, D> Clone for FieldBinding<E, S, D> {
    fn clone(&self) -> Self {
        Self {
            attribute: self.attribute,
            name: self.name,
            converter: self.converter.clone(),
            rules: self.rules.clone(),
            default: self.default.clone(),
            unique: self.unique,
        }
    }
}

impl<E, S, D> fmt::Debug for FieldBinding<E, S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("attribute", &self.name)
            .field("rules", &self.rules.len())
            .field("has_default", &self.default.is_some())
            .field("unique", &self.unique)
            .finish()
    }
}

/// A binding is also its attribute selector, so predicates and sort keys
/// can be built straight from it.
impl<E, S, D> Deref for FieldBinding<E, S, D> {
    type Target = Attribute<E, S>;

    fn deref(&self) -> &Attribute<E, S> {
        &self.attribute
    }
}

impl<E: Entity, S: StoragePrimitive> FieldBinding<E, S, S> {
    /// Domain type equals the storage primitive
    pub fn new(attribute: Attribute<E, S>) -> Self {
        Self::custom(attribute, Converter::identity())
    }
}

impl<E: Entity, T: StoragePrimitive<Comparand = T>> FieldBinding<E, Option<T>, T> {
    /// Optional storage read as a required domain value. An absent value
    /// fails conversion unless a default is set.
    pub fn unwrapped(attribute: Attribute<E, Option<T>>) -> Self {
        Self::custom(attribute, Converter::unwrapped())
    }
}

impl<E: Entity, N: FixedWidth> FieldBinding<E, N, i64> {
    /// `i64` domain over a narrower integer. `overflow` decides whether an
    /// out-of-range value is rejected or clamped to the storage bounds.
    pub fn narrowing(attribute: Attribute<E, N>, overflow: Overflow) -> Self {
        Self::custom(attribute, Converter::narrowing(overflow))
    }
}

impl<E: Entity, D: Send + Sync + 'static> FieldBinding<E, Vec<u8>, D> {
    /// Composite value encoded to binary storage by `codec`
    pub fn codec<C: Codec<D>>(attribute: Attribute<E, Vec<u8>>, codec: C) -> Self {
        Self::custom(attribute, Converter::codec(codec))
    }
}

impl<E: Entity, D: Send + Sync + 'static> FieldBinding<E, Option<Vec<u8>>, Option<D>> {
    /// Optional composite value; absent storage reads as `None`
    pub fn optional_codec<C: Codec<D>>(attribute: Attribute<E, Option<Vec<u8>>>, codec: C) -> Self {
        Self::custom(attribute, Converter::optional_codec(codec))
    }
}

impl<E: Entity, S: StoragePrimitive, D> FieldBinding<E, S, D>
where
    D: TryFrom<S> + Into<S> + Clone + 'static,
    <D as TryFrom<S>>::Error: fmt::Display,
{
    /// Domain type converted through `TryFrom<S>` and `Into<S>`
    pub fn raw(attribute: Attribute<E, S>) -> Self {
        Self::custom(attribute, Converter::raw())
    }
}

impl<E: Entity, S: StoragePrimitive, D: 'static> FieldBinding<E, S, D> {
    /// # Panics
    ///
    /// Panics when `attribute` is not registered on `E` with the kind of `S`.
    pub fn custom(attribute: Attribute<E, S>, converter: Converter<S, D>) -> Self {
        Self {
            name: attribute.storage_name(),
            attribute,
            converter,
            rules: Vec::new(),
            default: None,
            unique: false,
        }
    }

    /// Value returned when the stored value cannot be converted
    pub fn with_default(mut self, default: D) -> Self
    where
        D: Clone + Send + Sync,
    {
        self.default = Some(Arc::new(move || default.clone()));
        self
    }

    /// Append a validation rule; rules run in registration order
    pub fn validated_by(mut self, rule: Rule<D>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Reject values already held by another record of the same entity
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn attribute(&self) -> &Attribute<E, S> {
        &self.attribute
    }

    /// Checked storage name of the attribute
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Converted value of `record`, or the default when conversion fails
    pub fn current_value(&self, record: &RecordHandle) -> BindResult<D> {
        match (self.convert_stored(record), &self.default) {
            (Err(_), Some(default)) => Ok(default()),
            (result, _) => result,
        }
    }

    fn convert_stored(&self, record: &RecordHandle) -> BindResult<D> {
        let name = self.name;
        let raw = record.read(name);
        let stored = S::from_storage(&raw).ok_or_else(|| {
            BindError::output_conversion(
                name,
                format!("expected {}, found {}", S::KIND.type_name(), raw.type_name()),
            )
        })?;
        self.converter
            .output(stored)
            .map_err(|err| BindError::output_conversion(name, err.reason()))
    }

    /// Run the rules, then the uniqueness check
    pub fn validate(&self, value: &D, record: &RecordHandle) -> BindResult<()> {
        if let Err(err) = validate_all(&self.rules, value) {
            metrics().increment_validation_rejections();
            log_event(
                Event::ValidationRejected,
                &[
                    ("attribute", self.name),
                    ("entity", E::NAME),
                    ("reason", &err.to_string()),
                ],
            );
            return Err(err);
        }

        if self.unique {
            self.check_unique(value, record)?;
        }
        Ok(())
    }

    fn check_unique(&self, value: &D, record: &RecordHandle) -> BindResult<()> {
        let name = self.name;
        let stored = self
            .converter
            .store(value)
            .map_err(|err| BindError::store_conversion(name, err.reason()))?
            .into_storage();

        let context = record
            .context()
            .or_else(E::default_context)
            .ok_or(BindError::ConfigurationMissing)?;

        let request = FetchRequest::new(E::NAME)
            .with_predicate(Expression::comparison(
                name,
                Operator::Equal,
                Operand::Value(stored.clone()),
            ))
            .with_limit(2);

        let taken = execute(&context, &request)?
            .iter()
            .any(|other| other != record);
        if !taken {
            return Ok(());
        }

        metrics().increment_unique_violations();
        let value = stored.to_string();
        log_event(
            Event::UniqueViolation,
            &[("attribute", name), ("entity", E::NAME), ("value", &value)],
        );
        Err(BindError::UniqueConstraintViolated {
            field: name.to_string(),
            value,
            model: E::model_name().to_string(),
        })
    }

    /// Validate, convert and write. The record is untouched on any failure.
    pub fn set(&self, value: D, record: &RecordHandle) -> BindResult<()> {
        self.validate(&value, record)?;
        let stored = self
            .converter
            .store(&value)
            .map_err(|err| BindError::store_conversion(self.name, err.reason()))?;
        record.write(self.name, stored.into_storage());
        Ok(())
    }
}

impl<E: Entity, S: StoragePrimitive, T: 'static> FieldBinding<E, S, Option<T>> {
    /// Rule over the present value; `None` always passes
    pub fn validated_when_present(self, rule: Rule<T>) -> Self {
        self.validated_by(rule.when_present())
    }
}

impl<E: Entity> FieldBinding<E, bool, bool> {
    /// Negate a boolean field through `set`
    pub fn toggle(&self, record: &RecordHandle) -> BindResult<()> {
        let current = self.current_value(record)?;
        self.set(!current, record)
    }
}
