//! # Gatekit Codegen
//!
//! Conversion-function generation between IDL schemas.
//!
//! This crate provides:
//! - The type converter that maps a source field tree onto a destination
//!   field tree, producing structured statements
//! - Field mapping tables with override and fallback semantics
//! - Namespace resolution for named types
//! - Rust rendering of the generated statements

pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod generator;
pub mod mapping;
pub mod path;
pub mod render;
pub mod resolver;
pub mod statement;

pub use config::ConverterConfig;
pub use converter::{TypeConverter, generate_conversion};
pub use error::{CodegenError, ConvertError, ResolveError};
pub use generator::Generator;
pub use mapping::{FieldMappingEntry, FieldMappingTable};
pub use path::{PathParseError, QualifiedPath};
pub use render::RustRenderer;
pub use resolver::{ModulePathResolver, NamespaceResolver, StaticResolver};
pub use statement::{Statement, StatementSink};

/// Generates Rust conversion code from a schema document string.
///
/// # Arguments
/// * `xml` - Schema document content
/// * `resolver` - Namespace resolver for named types
///
/// # Returns
/// Generated Rust code as a string.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation, or generation fails.
pub fn generate_from_xml(
    xml: &str,
    resolver: &dyn NamespaceResolver,
) -> Result<String, CodegenError> {
    let document = gatekit_schema::parse_document(xml)?;
    gatekit_schema::validate_document(&document)?;
    let ir = gatekit_schema::SchemaIr::from_document(&document)?;
    Generator::new(&ir, resolver).generate()
}

/// Generates Rust conversion code from a schema document file.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(
    path: &std::path::Path,
    resolver: &dyn NamespaceResolver,
) -> Result<String, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_xml(&xml, resolver)
}

/// Generates Rust conversion code from `input` and writes it to `output`.
///
/// Intended for build scripts.
///
/// # Errors
/// Returns `CodegenError` if generation or writing fails.
pub fn generate_file(
    input: &std::path::Path,
    output: &std::path::Path,
    resolver: &dyn NamespaceResolver,
) -> Result<(), CodegenError> {
    let code = generate_from_file(input, resolver)?;
    std::fs::write(output, code)?;
    Ok(())
}
