//! Record conformance checks
//!
//! A record conforms to its schema when:
//! - every attribute it holds is registered
//! - every held value matches the registered kind
//! - every required attribute is present (to-many relationships read
//!   absent as empty)

use crate::store::RecordHandle;

use super::errors::{SchemaError, SchemaResult};
use super::types::{AttributeKind, EntitySchema};

/// Validates records against an entity schema
pub struct SchemaValidator;

impl SchemaValidator {
    /// Check one record. Returns the first violation found, in attribute
    /// name order.
    pub fn validate_record(schema: &EntitySchema, record: &RecordHandle) -> SchemaResult<()> {
        let attributes = record.attributes();

        for name in attributes.keys() {
            if schema.get(name).is_none() {
                return Err(SchemaError::UnknownAttribute {
                    entity: schema.entity().to_string(),
                    attribute: name.clone(),
                });
            }
        }

        for (name, def) in schema.attributes() {
            match attributes.get(name) {
                None => {
                    if !def.optional && def.kind != AttributeKind::ToMany {
                        return Err(Self::invalid(schema, name, "required attribute is missing"));
                    }
                }
                Some(value) => {
                    if !def.kind.accepts(value) {
                        return Err(Self::invalid(
                            schema,
                            name,
                            format!(
                                "expected {}, found {}",
                                def.kind.type_name(),
                                value.type_name()
                            ),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn invalid(schema: &EntitySchema, attribute: &str, reason: impl Into<String>) -> SchemaError {
        SchemaError::RecordInvalid {
            entity: schema.entity().to_string(),
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}
