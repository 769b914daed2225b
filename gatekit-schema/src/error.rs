//! Error types for schema parsing and resolution.

use thiserror::Error;

/// Error type for schema document parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Unknown element encountered.
    #[error("unknown element '{element}' in context '{context}'")]
    UnknownElement {
        /// Element name.
        element: String,
        /// Parent context.
        context: String,
    },

    /// Malformed type expression.
    #[error("invalid type expression '{expr}': {message}")]
    InvalidTypeExpr {
        /// Offending expression.
        expr: String,
        /// What went wrong.
        message: String,
    },

    /// Invalid document structure.
    #[error("invalid document structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Error type for schema validation and resolution.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Type reference could not be resolved.
    #[error("type '{name}' not found (referenced from '{context}')")]
    TypeNotFound {
        /// Referenced type name.
        name: String,
        /// Where the reference appeared.
        context: String,
    },

    /// Schema qualifier could not be resolved.
    #[error("schema '{name}' not found")]
    SchemaNotFound {
        /// Schema name.
        name: String,
    },

    /// A struct was required but something else was referenced.
    #[error("'{name}' is a {kind}, expected a struct")]
    NotAStruct {
        /// Referenced name.
        name: String,
        /// Actual kind.
        kind: String,
    },

    /// Mapping source path does not name a field.
    #[error("field path '{path}' not found in struct '{structure}'")]
    FieldNotFound {
        /// Source path as written.
        path: String,
        /// Struct the path was walked from.
        structure: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (schema, struct, field, etc.).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// Circular type reference.
    #[error("circular type reference detected: {path}")]
    CircularReference {
        /// Path of the circular reference.
        path: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown element error.
    pub fn unknown_element(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
            context: context.into(),
        }
    }

    /// Creates an invalid type expression error.
    pub fn type_expr(expr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTypeExpr {
            expr: expr.into(),
            message: message.into(),
        }
    }
}

impl SchemaError {
    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a type-not-found error.
    pub fn type_not_found(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::TypeNotFound {
            name: name.into(),
            context: context.into(),
        }
    }
}
