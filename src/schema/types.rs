//! Entity schema definitions
//!
//! Supported attribute kinds:
//! - boolean, integer16, integer32, integer64, double
//! - string, binary, date, uuid
//! - to_one and to_many relationships

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::convert::StoragePrimitive;
use crate::store::StorageValue;

use super::errors::{SchemaError, SchemaResult};

/// Storage kind of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Boolean,
    Integer16,
    Integer32,
    Integer64,
    Double,
    String,
    Binary,
    Date,
    Uuid,
    /// To-one relationship holding a record id
    ToOne,
    /// Ordered to-many relationship holding record ids
    ToMany,
}

impl AttributeKind {
    /// Returns the kind name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeKind::Boolean => "boolean",
            AttributeKind::Integer16 => "integer16",
            AttributeKind::Integer32 => "integer32",
            AttributeKind::Integer64 => "integer64",
            AttributeKind::Double => "double",
            AttributeKind::String => "string",
            AttributeKind::Binary => "binary",
            AttributeKind::Date => "date",
            AttributeKind::Uuid => "uuid",
            AttributeKind::ToOne => "to_one",
            AttributeKind::ToMany => "to_many",
        }
    }

    /// Returns true when a non-null `value` can be held by this kind
    pub fn accepts(&self, value: &StorageValue) -> bool {
        matches!(
            (self, value),
            (AttributeKind::Boolean, StorageValue::Bool(_))
                | (AttributeKind::Integer16, StorageValue::Int16(_))
                | (AttributeKind::Integer32, StorageValue::Int32(_))
                | (AttributeKind::Integer64, StorageValue::Int64(_))
                | (AttributeKind::Double, StorageValue::Double(_))
                | (AttributeKind::String, StorageValue::String(_))
                | (AttributeKind::Binary, StorageValue::Binary(_))
                | (AttributeKind::Date, StorageValue::Date(_))
                | (AttributeKind::Uuid, StorageValue::Uuid(_))
                | (AttributeKind::ToOne, StorageValue::Reference(_))
                | (AttributeKind::ToMany, StorageValue::References(_))
        )
    }
}

/// Attribute definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub kind: AttributeKind,
    /// Whether the attribute may be absent
    pub optional: bool,
}

impl AttributeDef {
    pub fn required(kind: AttributeKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub fn optional(kind: AttributeKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }
}

/// Registration table of one entity: storage attribute names and kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    entity: String,
    attributes: BTreeMap<String, AttributeDef>,
}

impl EntitySchema {
    /// Start an empty schema for `entity`
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Register a required attribute
    pub fn attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes
            .insert(name.into(), AttributeDef::required(kind));
        self
    }

    /// Register an optional attribute
    pub fn optional(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes
            .insert(name.into(), AttributeDef::optional(kind));
        self
    }

    /// Register a to-one relationship (always optional)
    pub fn to_one(self, name: impl Into<String>) -> Self {
        self.optional(name, AttributeKind::ToOne)
    }

    /// Register an ordered to-many relationship
    pub fn to_many(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::ToMany)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeDef)> {
        self.attributes.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Check that `name` is registered with the kind and optionality of `S`
    pub fn check<S: StoragePrimitive>(&self, name: &str) -> SchemaResult<&AttributeDef> {
        let def = self
            .attributes
            .get(name)
            .ok_or_else(|| SchemaError::UnknownAttribute {
                entity: self.entity.clone(),
                attribute: name.to_string(),
            })?;

        if def.kind != S::KIND {
            return Err(SchemaError::KindMismatch {
                entity: self.entity.clone(),
                attribute: name.to_string(),
                expected: def.kind.type_name(),
                found: S::KIND.type_name(),
            });
        }

        // Relationships carry their own optionality
        let relationship = matches!(def.kind, AttributeKind::ToOne | AttributeKind::ToMany);
        if !relationship && def.optional != S::OPTIONAL {
            return Err(SchemaError::OptionalityMismatch {
                entity: self.entity.clone(),
                attribute: name.to_string(),
                optional: def.optional,
            });
        }

        Ok(def)
    }
}
