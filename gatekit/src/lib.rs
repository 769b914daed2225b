//! # Gatekit
//!
//! Schema-driven conversion code generation for API gateways.
//!
//! A gateway sits between a public endpoint schema and one or more internal
//! client schemas. The two evolve independently, so every request and
//! response must be converted field by field. Gatekit generates those
//! conversion functions from schema documents.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gatekit::prelude::*;
//!
//! let resolver = ModulePathResolver::new("crate::idl");
//! let code = generate_from_file(Path::new("idl/gateway.xml"), &resolver)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Schema model, document parsing and validation
//! - [`codegen`] - Type converter, mapping tables and Rust rendering

pub mod prelude;

/// Schema model and document parsing.
pub mod schema {
    pub use gatekit_schema::*;
}

/// Conversion code generation.
pub mod codegen {
    pub use gatekit_codegen::*;
}

// Re-export commonly used items at the crate root
pub use gatekit_codegen::{
    CodegenError, ConvertError, ConverterConfig, FieldMappingEntry, FieldMappingTable, Generator,
    ModulePathResolver, NamespaceResolver, QualifiedPath, StaticResolver, TypeConverter,
    generate_conversion, generate_file, generate_from_file, generate_from_xml,
};
pub use gatekit_schema::{FieldSpec, PrimitiveType, SchemaIr, StructSpec, TypeSpec};
