//! Prelude module for convenient imports.
//!
//! ```ignore
//! use gatekit::prelude::*;
//! ```

// Schema types
pub use gatekit_schema::{
    Document, EnumSpec, FieldSpec, ParseError, PrimitiveType, SchemaError, SchemaIr, StructSpec,
    TypeSpec, TypedefSpec, parse_document, parse_document_file, validate_document,
};

// Converter types
pub use gatekit_codegen::statement::{
    Access, Allocation, Binding, Condition, Expr, Place, Root, Statement, StatementSink, walk,
};
pub use gatekit_codegen::{
    CodegenError, ConvertError, ConverterConfig, FieldMappingEntry, FieldMappingTable, Generator,
    ModulePathResolver, NamespaceResolver, QualifiedPath, ResolveError, RustRenderer,
    StaticResolver, TypeConverter, generate_conversion, generate_file, generate_from_file,
    generate_from_xml,
};
