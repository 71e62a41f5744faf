//! Bidirectional conversion between a storage primitive and a domain value
//!
//! A converter pairs two functions:
//! - output: storage primitive `S` to domain value `D`
//! - store: domain value `D` to storage primitive `S`
//!
//! For every `d` with `store(d) = Ok(s)`, `output(s)` yields a value equal
//! to `d`. A saturating narrowing converter is the one exception, and only
//! for values outside the storage bounds.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::codec::Codec;
use super::primitive::{FixedWidth, StoragePrimitive};

/// A conversion failure with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ConvertError {
    reason: String,
}

impl ConvertError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// What a narrowing converter does with a value outside the storage bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Store conversion fails
    #[default]
    Reject,
    /// Clamp to the nearest storage bound
    Saturate,
}

type OutputFn<S, D> = Arc<dyn Fn(S) -> Result<D, ConvertError> + Send + Sync>;
type StoreFn<S, D> = Arc<dyn Fn(&D) -> Result<S, ConvertError> + Send + Sync>;

/// Converter between storage primitive `S` and domain type `D`
pub struct Converter<S, D> {
    output: OutputFn<S, D>,
    store: StoreFn<S, D>,
}

impl<S, D> Clone for Converter<S, D> {
    fn clone(&self) -> Self {
        Self {
            output: Arc::clone(&self.output),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S, D> fmt::Debug for Converter<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").finish_non_exhaustive()
    }
}

impl<S: StoragePrimitive, D: 'static> Converter<S, D> {
    /// Converter from caller-supplied functions
    pub fn custom(
        output: impl Fn(S) -> Result<D, ConvertError> + Send + Sync + 'static,
        store: impl Fn(&D) -> Result<S, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            output: Arc::new(output),
            store: Arc::new(store),
        }
    }

    /// Domain type converted with `TryFrom<S>` and `Into<S>`.
    ///
    /// Suits enums stored by raw value.
    pub fn raw() -> Self
    where
        D: TryFrom<S> + Into<S> + Clone,
        <D as TryFrom<S>>::Error: fmt::Display,
    {
        Self::custom(
            |stored| D::try_from(stored).map_err(|e| ConvertError::new(e.to_string())),
            |value: &D| Ok(value.clone().into()),
        )
    }

    /// Storage to domain
    pub fn output(&self, stored: S) -> Result<D, ConvertError> {
        (self.output)(stored)
    }

    /// Domain to storage
    pub fn store(&self, value: &D) -> Result<S, ConvertError> {
        (self.store)(value)
    }
}

impl<S: StoragePrimitive> Converter<S, S> {
    /// Domain type equals storage type
    pub fn identity() -> Self {
        Self::custom(Ok, |value: &S| Ok(value.clone()))
    }
}

impl<T: StoragePrimitive<Comparand = T>> Converter<Option<T>, T> {
    /// Optional storage exposed as a required domain value.
    ///
    /// An absent stored value is an output conversion failure.
    pub fn unwrapped() -> Self {
        Self::custom(
            |stored: Option<T>| stored.ok_or_else(|| ConvertError::new("value is absent")),
            |value: &T| Ok(Some(value.clone())),
        )
    }
}

impl<N: FixedWidth> Converter<N, i64> {
    /// `i64` domain value over a narrower integer column
    pub fn narrowing(overflow: Overflow) -> Self {
        Self::custom(
            |stored: N| Ok(stored.into()),
            move |value: &i64| match N::try_from(*value) {
                Ok(narrow) => Ok(narrow),
                Err(_) => match overflow {
                    Overflow::Reject => Err(ConvertError::new(format!(
                        "{} does not fit in {}",
                        value,
                        N::KIND.type_name()
                    ))),
                    Overflow::Saturate => Ok(N::saturate(*value)),
                },
            },
        )
    }
}

impl<D: Send + Sync + 'static> Converter<Vec<u8>, D> {
    /// Composite domain value stored as bytes through `codec`
    pub fn codec<C: Codec<D>>(codec: C) -> Self {
        let codec = Arc::new(codec);
        let decoder = Arc::clone(&codec);
        Self::custom(
            move |bytes: Vec<u8>| decoder.decode(&bytes),
            move |value: &D| codec.encode(value),
        )
    }
}

impl<D: Send + Sync + 'static> Converter<Option<Vec<u8>>, Option<D>> {
    /// Optional composite value; absence maps to `None` both ways
    pub fn optional_codec<C: Codec<D>>(codec: C) -> Self {
        let codec = Arc::new(codec);
        let decoder = Arc::clone(&codec);
        Self::custom(
            move |bytes: Option<Vec<u8>>| bytes.map(|b| decoder.decode(&b)).transpose(),
            move |value: &Option<D>| value.as_ref().map(|v| codec.encode(v)).transpose(),
        )
    }
}
