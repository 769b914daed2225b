//! Main code generator.

use crate::config::ConverterConfig;
use crate::converter::TypeConverter;
use crate::error::CodegenError;
use crate::mapping::FieldMappingTable;
use crate::render::RustRenderer;
use crate::resolver::NamespaceResolver;
use gatekit_schema::{ResolvedConversion, SchemaIr, StructSpec};
use tracing::{info, warn};

/// Main code generator that produces a Rust module of conversion functions.
pub struct Generator<'a> {
    ir: &'a SchemaIr,
    resolver: &'a dyn NamespaceResolver,
    config: ConverterConfig,
}

impl<'a> Generator<'a> {
    /// Creates a new generator for the given schema IR.
    #[must_use]
    pub fn new(ir: &'a SchemaIr, resolver: &'a dyn NamespaceResolver) -> Self {
        Self {
            ir,
            resolver,
            config: ConverterConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    /// Generates the complete module.
    ///
    /// With `fail_fast` unset, conversions that fail are logged and left
    /// out of the output.
    ///
    /// # Errors
    /// Returns `CodegenError` for an invalid configuration, or for the first
    /// failing conversion when `fail_fast` is set.
    pub fn generate(&self) -> Result<String, CodegenError> {
        self.config.validate()?;

        let converter = TypeConverter::new(self.resolver).with_config(self.config.clone());
        let renderer = RustRenderer::new(&self.config);

        let mut output = String::new();
        output.push_str(&self.generate_header());

        let mut generated = 0usize;
        let mut skipped = 0usize;
        for conversion in &self.ir.conversions {
            match self.generate_conversion(&converter, &renderer, conversion) {
                Ok(code) => {
                    output.push('\n');
                    output.push_str(&code);
                    generated += 1;
                }
                Err(err) if !self.config.fail_fast => {
                    warn!(conversion = %conversion.name, error = %err, "skipping conversion");
                    skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(generated, skipped, "generated conversion module");
        Ok(output)
    }

    /// Generates the module header.
    fn generate_header(&self) -> String {
        let mut output = String::new();
        output.push_str("// Code generated by gatekit. DO NOT EDIT.\n");
        output.push_str("//\n");
        for (name, file) in &self.ir.schemas {
            output.push_str(&format!("// schema {name}: {file}\n"));
        }
        output
    }

    fn generate_conversion(
        &self,
        converter: &TypeConverter<'_>,
        renderer: &RustRenderer<'_>,
        conversion: &ResolvedConversion,
    ) -> Result<String, CodegenError> {
        let table = FieldMappingTable::from_resolved(&conversion.mappings)?;
        let statements = converter
            .generate(&conversion.source.fields, &conversion.dest.fields, &table)
            .map_err(|source| CodegenError::Convert {
                conversion: conversion.name.clone(),
                source,
            })?;

        let source_type = struct_type(converter, &conversion.source)?;
        let dest_type = struct_type(converter, &conversion.dest)?;
        Ok(renderer.render_function(&conversion.name, &source_type, &dest_type, &statements))
    }
}

fn struct_type(converter: &TypeConverter<'_>, spec: &StructSpec) -> Result<String, CodegenError> {
    Ok(converter.qualified_name(&spec.name, &spec.schema_file)?)
}
