//! Schema document validation.
//!
//! This module checks a parsed [`Document`] for duplicate definitions before
//! it is resolved. Reference checks happen during resolution.

use crate::document::{Definition, Document, SchemaDef};
use crate::error::SchemaError;
use std::collections::HashSet;

/// Validates a parsed document for consistency.
///
/// # Arguments
/// * `document` - The document to validate
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the issue.
///
/// # Errors
/// Returns `SchemaError` if validation fails.
pub fn validate_document(document: &Document) -> Result<(), SchemaError> {
    let mut schema_names = HashSet::new();
    for schema in &document.schemas {
        if !schema_names.insert(schema.name.as_str()) {
            return Err(SchemaError::duplicate("schema", &schema.name));
        }
        if schema.name.contains('.') {
            return Err(SchemaError::Validation {
                message: format!("schema name '{}' must not contain '.'", schema.name),
            });
        }
        validate_schema(schema)?;
    }

    let mut conversion_names = HashSet::new();
    for conversion in &document.conversions {
        if !conversion_names.insert(conversion.name.as_str()) {
            return Err(SchemaError::duplicate("conversion", &conversion.name));
        }

        let mut targets = HashSet::new();
        for mapping in &conversion.mappings {
            if !targets.insert(mapping.to.as_str()) {
                return Err(SchemaError::Validation {
                    message: format!(
                        "Duplicate mapping target '{}' in conversion '{}'",
                        mapping.to, conversion.name
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Validates the definitions of one schema block.
fn validate_schema(schema: &SchemaDef) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();

    for definition in &schema.definitions {
        if !seen.insert(definition.name()) {
            return Err(SchemaError::duplicate(
                definition.kind(),
                format!("{}.{}", schema.name, definition.name()),
            ));
        }

        match definition {
            Definition::Struct(struct_def) => {
                let mut fields = HashSet::new();
                for field in &struct_def.fields {
                    if !fields.insert(field.name.as_str()) {
                        return Err(SchemaError::duplicate(
                            "field",
                            format!("{}.{}", struct_def.name, field.name),
                        ));
                    }
                }
            }
            Definition::Enum(enum_def) => {
                let mut values = HashSet::new();
                for value in &enum_def.values {
                    if !values.insert(value.as_str()) {
                        return Err(SchemaError::Validation {
                            message: format!(
                                "Duplicate enum value '{}' in enum '{}'",
                                value, enum_def.name
                            ),
                        });
                    }
                }
            }
            Definition::Typedef(_) => {}
        }
    }

    Ok(())
}
