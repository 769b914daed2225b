//! Resolved representation for code generation.
//!
//! This module turns a raw [`Document`] into fully resolved field trees:
//! every named reference is replaced by its definition, typedef chains are
//! kept as [`TypeSpec::Typedef`] nodes, and each declared conversion is paired
//! with its source and destination structs and resolved mapping fields.

use crate::document::{ConversionDef, Definition, Document, SchemaDef, TypeExpr};
use crate::error::SchemaError;
use crate::types::{EnumSpec, FieldSpec, StructSpec, TypeSpec, TypedefSpec};
use std::collections::HashMap;

/// Resolved schema document.
#[derive(Debug, Clone)]
pub struct SchemaIr {
    /// Schema blocks as `(name, file)` in document order.
    pub schemas: Vec<(String, String)>,
    /// Resolved named types keyed by `schema.Type`.
    pub types: HashMap<String, TypeSpec>,
    /// Resolved conversions in document order.
    pub conversions: Vec<ResolvedConversion>,
}

impl SchemaIr {
    /// Resolves a parsed document.
    ///
    /// # Errors
    /// Returns `SchemaError` if a reference cannot be resolved, a type
    /// refers to itself, or a conversion names something other than a struct.
    pub fn from_document(document: &Document) -> Result<Self, SchemaError> {
        let mut resolver = TypeResolver::new(document);

        for schema in &document.schemas {
            for definition in &schema.definitions {
                resolver.resolve_named(schema, definition.name())?;
            }
        }

        let conversions = document
            .conversions
            .iter()
            .map(|c| ResolvedConversion::from_conversion_def(c, &mut resolver))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schemas: document
                .schemas
                .iter()
                .map(|s| (s.name.clone(), s.file.clone()))
                .collect(),
            types: resolver.cache,
            conversions,
        })
    }

    /// Gets a resolved type by qualified name (`schema.Type`).
    #[must_use]
    pub fn get_type(&self, qualified: &str) -> Option<&TypeSpec> {
        self.types.get(qualified)
    }

    /// Gets a resolved struct by qualified name.
    #[must_use]
    pub fn get_struct(&self, qualified: &str) -> Option<&StructSpec> {
        match self.types.get(qualified) {
            Some(TypeSpec::Struct(s)) => Some(s),
            _ => None,
        }
    }

    /// Gets a resolved conversion by name.
    #[must_use]
    pub fn get_conversion(&self, name: &str) -> Option<&ResolvedConversion> {
        self.conversions.iter().find(|c| c.name == name)
    }
}

/// Conversion with both structs and all mapping fields resolved.
#[derive(Debug, Clone)]
pub struct ResolvedConversion {
    /// Conversion function name.
    pub name: String,
    /// Source struct.
    pub source: StructSpec,
    /// Destination struct.
    pub dest: StructSpec,
    /// Resolved field mappings.
    pub mappings: Vec<ResolvedMapping>,
}

impl ResolvedConversion {
    fn from_conversion_def(
        def: &ConversionDef,
        resolver: &mut TypeResolver<'_>,
    ) -> Result<Self, SchemaError> {
        let context = format!("conversion '{}'", def.name);
        let source = resolver.resolve_struct_ref(&def.from, &context)?;
        let dest = resolver.resolve_struct_ref(&def.to, &context)?;

        let mappings = def
            .mappings
            .iter()
            .map(|m| {
                let source_path: Vec<String> = m.from.split('.').map(str::to_string).collect();
                let mut chain = Vec::new();
                find_field_path(&source, &source_path, &mut chain).ok_or_else(|| {
                    SchemaError::FieldNotFound {
                        path: m.from.clone(),
                        structure: source.name.clone(),
                    }
                })?;
                let (field, parents) = chain
                    .split_last()
                    .ok_or_else(|| SchemaError::FieldNotFound {
                        path: m.from.clone(),
                        structure: source.name.clone(),
                    })?;
                Ok(ResolvedMapping {
                    to: m.to.clone(),
                    from: source_path,
                    field: (*field).clone(),
                    parents_optional: parents.iter().map(|p| p.is_optional()).collect(),
                    override_source: m.override_source,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok(Self {
            name: def.name.clone(),
            source,
            dest,
            mappings,
        })
    }
}

/// Field mapping whose source field has been located.
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    /// Destination path as declared.
    pub to: String,
    /// Source path segments, relative to the source struct.
    pub from: Vec<String>,
    /// Source field at the end of the path.
    pub field: FieldSpec,
    /// Optionality of each field walked through before `field`.
    pub parents_optional: Vec<bool>,
    /// True if the mapped field takes precedence over a same-named field.
    pub override_source: bool,
}

/// Walks a dotted field path through nested structs, collecting every field
/// on the way.
fn find_field_path<'a>(
    root: &'a StructSpec,
    path: &[String],
    chain: &mut Vec<&'a FieldSpec>,
) -> Option<()> {
    let (first, rest) = path.split_first()?;
    let field = root.get_field(first)?;
    chain.push(field);
    if rest.is_empty() {
        return Some(());
    }
    match field.ty.resolved() {
        TypeSpec::Struct(inner) => find_field_path(inner, rest, chain),
        _ => None,
    }
}

/// Resolves named references with memoisation and cycle detection.
struct TypeResolver<'a> {
    document: &'a Document,
    cache: HashMap<String, TypeSpec>,
    stack: Vec<String>,
}

impl<'a> TypeResolver<'a> {
    fn new(document: &'a Document) -> Self {
        Self {
            document,
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn resolve_struct_ref(&mut self, reference: &str, context: &str) -> Result<StructSpec, SchemaError> {
        let Some((schema_name, type_name)) = reference.split_once('.') else {
            return Err(SchemaError::type_not_found(reference, context));
        };
        let document = self.document;
        let schema = document
            .get_schema(schema_name)
            .ok_or_else(|| SchemaError::SchemaNotFound {
                name: schema_name.to_string(),
            })?;
        match self.resolve_named(schema, type_name)? {
            TypeSpec::Struct(s) => Ok(s),
            other => Err(SchemaError::NotAStruct {
                name: reference.to_string(),
                kind: other.kind_name().to_string(),
            }),
        }
    }

    /// Resolves a (possibly schema-qualified) name seen from `schema`.
    fn resolve_named(&mut self, schema: &'a SchemaDef, name: &str) -> Result<TypeSpec, SchemaError> {
        let document = self.document;
        let (schema, local) = match name.split_once('.') {
            Some((qualifier, local)) => {
                let target = document.get_schema(qualifier).ok_or_else(|| {
                    SchemaError::SchemaNotFound {
                        name: qualifier.to_string(),
                    }
                })?;
                (target, local)
            }
            None => (schema, name),
        };

        let key = format!("{}.{}", schema.name, local);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        if self.stack.contains(&key) {
            let mut path = self.stack.join(" -> ");
            path.push_str(" -> ");
            path.push_str(&key);
            return Err(SchemaError::CircularReference { path });
        }

        let definition = schema
            .get_definition(local)
            .ok_or_else(|| SchemaError::type_not_found(local, schema.name.as_str()))?;

        self.stack.push(key.clone());
        let resolved = self.resolve_definition(schema, definition);
        self.stack.pop();
        let resolved = resolved?;

        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_definition(
        &mut self,
        schema: &'a SchemaDef,
        definition: &Definition,
    ) -> Result<TypeSpec, SchemaError> {
        match definition {
            Definition::Struct(def) => {
                let mut spec = StructSpec::new(&def.name, &schema.file);
                for field in &def.fields {
                    let ty = self.resolve_expr(schema, &field.ty)?;
                    spec.add_field(FieldSpec {
                        name: field.name.clone(),
                        ty,
                        required: field.required,
                        schema_file: schema.file.clone(),
                    });
                }
                Ok(TypeSpec::Struct(spec))
            }
            Definition::Enum(def) => {
                let mut spec = EnumSpec::new(&def.name, &schema.file);
                spec.values.clone_from(&def.values);
                Ok(TypeSpec::Enum(spec))
            }
            Definition::Typedef(def) => {
                let target = self.resolve_expr(schema, &def.target)?;
                Ok(TypeSpec::Typedef(TypedefSpec::new(
                    &def.name,
                    &schema.file,
                    target,
                )))
            }
        }
    }

    fn resolve_expr(&mut self, schema: &'a SchemaDef, expr: &TypeExpr) -> Result<TypeSpec, SchemaError> {
        Ok(match expr {
            TypeExpr::Primitive(p) => TypeSpec::Primitive(*p),
            TypeExpr::Binary => TypeSpec::Binary,
            TypeExpr::Named(name) => self.resolve_named(schema, name)?,
            TypeExpr::List(inner) => TypeSpec::list(self.resolve_expr(schema, inner)?),
            TypeExpr::Set(inner) => TypeSpec::set(self.resolve_expr(schema, inner)?),
            TypeExpr::Map(key, value) => TypeSpec::map(
                self.resolve_expr(schema, key)?,
                self.resolve_expr(schema, value)?,
            ),
        })
    }
}

/// Converts a string to snake_case.
///
/// Runs of capitals are kept together (`UUID` -> `uuid`, `MDEntryPx` ->
/// `md_entry_px`).
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            result.push('_');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_lower);
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }

    result
}

/// Converts a string to PascalCase.
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}
