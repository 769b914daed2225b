//! # Gatekit Schema
//!
//! IDL schema model and schema-document loading.
//!
//! This crate provides:
//! - Field-tree type definitions consumed by the type converter
//! - XML schema-document parsing
//! - Document validation
//! - Resolution of named references into complete field trees

pub mod document;
pub mod error;
pub mod ir;
pub mod parser;
pub mod types;
pub mod validation;

pub use document::{Document, TypeExpr};
pub use error::{ParseError, SchemaError};
pub use ir::{ResolvedConversion, ResolvedMapping, SchemaIr};
pub use parser::{parse_document, parse_document_file};
pub use types::{EnumSpec, FieldSpec, PrimitiveType, StructSpec, TypeSpec, TypedefSpec};
pub use validation::validate_document;
