//! Raw schema document definitions.
//!
//! This module contains the unresolved data structures produced by the
//! parser: schema blocks with their named definitions, and conversion
//! declarations. Type references are kept as [`TypeExpr`] until the
//! document is resolved into a [`crate::ir::SchemaIr`].

use crate::error::ParseError;
use crate::types::PrimitiveType;
use std::collections::HashMap;
use std::fmt;

/// A complete schema document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Schema blocks in document order.
    pub schemas: Vec<SchemaDef>,
    /// Declared conversions in document order.
    pub conversions: Vec<ConversionDef>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a schema block by name.
    #[must_use]
    pub fn get_schema(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.iter().find(|s| s.name == name)
    }
}

/// One schema block, corresponding to a single IDL file.
#[derive(Debug, Clone)]
pub struct SchemaDef {
    /// Short name used in qualified references (`name.Type`).
    pub name: String,
    /// Schema file identifier, fed to namespace resolution.
    pub file: String,
    /// Named definitions in declaration order.
    pub definitions: Vec<Definition>,
    /// Definition lookup map (built as definitions are added).
    definition_map: HashMap<String, usize>,
}

impl SchemaDef {
    /// Creates an empty schema block.
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            definitions: Vec::new(),
            definition_map: HashMap::new(),
        }
    }

    /// Adds a definition to the schema.
    pub fn add_definition(&mut self, definition: Definition) {
        let name = definition.name().to_string();
        let index = self.definitions.len();
        self.definitions.push(definition);
        self.definition_map.entry(name).or_insert(index);
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get_definition(&self, name: &str) -> Option<&Definition> {
        self.definition_map
            .get(name)
            .map(|&idx| &self.definitions[idx])
    }
}

/// Named definition variants.
#[derive(Debug, Clone)]
pub enum Definition {
    /// Struct definition.
    Struct(StructDef),
    /// Enum definition.
    Enum(EnumDef),
    /// Typedef definition.
    Typedef(TypedefDef),
}

impl Definition {
    /// Returns the name of the definition.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(s) => &s.name,
            Self::Enum(e) => &e.name,
            Self::Typedef(t) => &t.name,
        }
    }

    /// Returns a short tag naming the kind of definition.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Struct(_) => "struct",
            Self::Enum(_) => "enum",
            Self::Typedef(_) => "typedef",
        }
    }
}

/// Raw struct definition.
#[derive(Debug, Clone)]
pub struct StructDef {
    /// Struct name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    /// Creates a new struct definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the struct.
    pub fn add_field(&mut self, field: FieldDef) {
        self.fields.push(field);
    }
}

/// Raw field definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub ty: TypeExpr,
    /// True if the field is always populated.
    pub required: bool,
}

/// Raw enum definition.
#[derive(Debug, Clone)]
pub struct EnumDef {
    /// Enum name.
    pub name: String,
    /// Value names.
    pub values: Vec<String>,
}

/// Raw typedef definition.
#[derive(Debug, Clone)]
pub struct TypedefDef {
    /// Alias name.
    pub name: String,
    /// Aliased type.
    pub target: TypeExpr,
}

/// Declared conversion between two structs.
#[derive(Debug, Clone)]
pub struct ConversionDef {
    /// Name of the generated conversion function.
    pub name: String,
    /// Qualified source struct reference (`schema.Type`).
    pub from: String,
    /// Qualified destination struct reference (`schema.Type`).
    pub to: String,
    /// Field mappings keyed by destination path.
    pub mappings: Vec<MappingDef>,
}

/// Declared field mapping.
#[derive(Debug, Clone)]
pub struct MappingDef {
    /// Destination path (`Owner.Address`).
    pub to: String,
    /// Source path, dot separated (`Request.User`).
    pub from: String,
    /// True if the mapped field takes precedence over a same-named field.
    pub override_source: bool,
}

/// Unresolved type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Primitive scalar.
    Primitive(PrimitiveType),
    /// Byte sequence.
    Binary,
    /// Reference to a named definition, optionally schema-qualified.
    Named(String),
    /// `list[T]`.
    List(Box<TypeExpr>),
    /// `set[T]`.
    Set(Box<TypeExpr>),
    /// `map[K, V]`.
    Map(Box<TypeExpr>, Box<TypeExpr>),
}

impl TypeExpr {
    /// Parses a type expression such as `map[string, list[Address]]`.
    ///
    /// # Errors
    /// Returns `ParseError::InvalidTypeExpr` if the expression is malformed.
    pub fn parse(expr: &str) -> Result<Self, ParseError> {
        let mut parser = ExprParser { input: expr, pos: 0 };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != expr.len() {
            return Err(ParseError::type_expr(expr, "unexpected trailing input"));
        }
        Ok(parsed)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.idl_name()),
            Self::Binary => f.write_str("binary"),
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "list[{inner}]"),
            Self::Set(inner) => write!(f, "set[{inner}]"),
            Self::Map(key, value) => write!(f, "map[{key}, {value}]"),
        }
    }
}

/// Recursive-descent reader over a type expression.
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn skip_ws(&mut self) {
        while let Some(c) = self.input[self.pos..].chars().next() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, token: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.input[self.pos..].starts_with(token) {
            self.pos += token.len_utf8();
            Ok(())
        } else {
            Err(ParseError::type_expr(
                self.input,
                format!("expected '{token}' at offset {}", self.pos),
            ))
        }
    }

    fn ident(&mut self) -> Result<&str, ParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.input[self.pos..].chars().next() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(ParseError::type_expr(
                self.input,
                format!("expected type name at offset {start}"),
            ));
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let name = self.ident()?.to_string();
        match name.as_str() {
            "list" => {
                self.expect('[')?;
                let inner = self.parse_type()?;
                self.expect(']')?;
                Ok(TypeExpr::List(Box::new(inner)))
            }
            "set" => {
                self.expect('[')?;
                let inner = self.parse_type()?;
                self.expect(']')?;
                Ok(TypeExpr::Set(Box::new(inner)))
            }
            "map" => {
                self.expect('[')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect(']')?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            "binary" => Ok(TypeExpr::Binary),
            other => Ok(PrimitiveType::from_idl_name(other)
                .map_or_else(|| TypeExpr::Named(name.clone()), TypeExpr::Primitive)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_expr_primitives() {
        assert_eq!(
            TypeExpr::parse("string").expect("parse"),
            TypeExpr::Primitive(PrimitiveType::String)
        );
        assert_eq!(TypeExpr::parse(" binary ").expect("parse"), TypeExpr::Binary);
        assert_eq!(
            TypeExpr::parse("bar.Address").expect("parse"),
            TypeExpr::Named("bar.Address".to_string())
        );
    }

    #[test]
    fn test_type_expr_nested() {
        let expr = TypeExpr::parse("map[string, list[Address]]").expect("parse");
        assert_eq!(
            expr,
            TypeExpr::Map(
                Box::new(TypeExpr::Primitive(PrimitiveType::String)),
                Box::new(TypeExpr::List(Box::new(TypeExpr::Named(
                    "Address".to_string()
                ))))
            )
        );
        assert_eq!(expr.to_string(), "map[string, list[Address]]");
    }

    #[test]
    fn test_type_expr_errors() {
        assert!(TypeExpr::parse("").is_err());
        assert!(TypeExpr::parse("list[string").is_err());
        assert!(TypeExpr::parse("map[string]").is_err());
        assert!(TypeExpr::parse("string extra").is_err());
    }

    #[test]
    fn test_schema_definition_lookup() {
        let mut schema = SchemaDef::new("bar", "clients/bar/bar.thrift");
        schema.add_definition(Definition::Struct(StructDef::new("Request")));
        schema.add_definition(Definition::Enum(EnumDef {
            name: "Color".to_string(),
            values: vec!["RED".to_string()],
        }));

        assert_eq!(
            schema.get_definition("Request").map(Definition::kind),
            Some("struct")
        );
        assert_eq!(
            schema.get_definition("Color").map(Definition::kind),
            Some("enum")
        );
        assert!(schema.get_definition("Missing").is_none());
    }
}
