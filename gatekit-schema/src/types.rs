//! Resolved schema type definitions.
//!
//! This module contains the field trees the converter walks: a closed set of
//! type variants, named struct/enum/typedef definitions, and the fields that
//! hang off structs. Every named definition remembers the schema file it was
//! declared in so generated code can qualify its type name.

/// IDL primitive (scalar) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Boolean.
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
}

impl PrimitiveType {
    /// Returns the Rust type name for this primitive.
    #[must_use]
    pub const fn rust_type(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "f64",
            Self::String => "String",
        }
    }

    /// Returns the IDL type name.
    #[must_use]
    pub const fn idl_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "double",
            Self::String => "string",
        }
    }

    /// Parses a primitive type from its IDL name.
    #[must_use]
    pub fn from_idl_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "i8" | "byte" => Some(Self::I8),
            "i16" => Some(Self::I16),
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "double" => Some(Self::Double),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

/// Type variants of a schema field tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Scalar primitive.
    Primitive(PrimitiveType),
    /// Raw byte sequence.
    Binary,
    /// Named enumeration.
    Enum(EnumSpec),
    /// Named struct with ordered fields.
    Struct(StructSpec),
    /// Named alias of another type.
    Typedef(TypedefSpec),
    /// Ordered sequence of elements.
    List(Box<TypeSpec>),
    /// Key/value mapping.
    Map {
        /// Key type.
        key: Box<TypeSpec>,
        /// Value type.
        value: Box<TypeSpec>,
    },
    /// Unordered set of elements.
    Set(Box<TypeSpec>),
}

impl TypeSpec {
    /// Creates a list type.
    #[must_use]
    pub fn list(element: TypeSpec) -> Self {
        Self::List(Box::new(element))
    }

    /// Creates a map type.
    #[must_use]
    pub fn map(key: TypeSpec, value: TypeSpec) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Creates a set type.
    #[must_use]
    pub fn set(element: TypeSpec) -> Self {
        Self::Set(Box::new(element))
    }

    /// Follows typedef aliases down to the underlying type.
    #[must_use]
    pub fn resolved(&self) -> &TypeSpec {
        let mut current = self;
        while let Self::Typedef(alias) = current {
            current = &alias.target;
        }
        current
    }

    /// Returns a short tag naming the variant.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Binary => "binary",
            Self::Enum(_) => "enum",
            Self::Struct(_) => "struct",
            Self::Typedef(_) => "typedef",
            Self::List(_) => "list",
            Self::Map { .. } => "map",
            Self::Set(_) => "set",
        }
    }

    /// Returns the declared name of a named type.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(&e.name),
            Self::Struct(s) => Some(&s.name),
            Self::Typedef(t) => Some(&t.name),
            Self::Primitive(p) => Some(p.idl_name()),
            _ => None,
        }
    }

    /// Returns the schema file a named type was declared in.
    #[must_use]
    pub fn schema_file(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(&e.schema_file),
            Self::Struct(s) => Some(&s.schema_file),
            Self::Typedef(t) => Some(&t.schema_file),
            _ => None,
        }
    }

    /// Returns true for list, map, and set types.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map { .. } | Self::Set(_))
    }

    /// Returns true if this is a struct type.
    #[must_use]
    pub const fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Returns true if this is the string primitive.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveType::String))
    }
}

impl From<PrimitiveType> for TypeSpec {
    fn from(prim: PrimitiveType) -> Self {
        Self::Primitive(prim)
    }
}

/// Struct definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StructSpec {
    /// Struct name.
    pub name: String,
    /// Schema file the struct was declared in.
    pub schema_file: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl StructSpec {
    /// Creates a new struct definition with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>, schema_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_file: schema_file.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the struct.
    pub fn add_field(&mut self, field: FieldSpec) {
        self.fields.push(field);
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Enum definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpec {
    /// Enum name.
    pub name: String,
    /// Schema file the enum was declared in.
    pub schema_file: String,
    /// Declared value names.
    pub values: Vec<String>,
}

impl EnumSpec {
    /// Creates a new enum definition.
    #[must_use]
    pub fn new(name: impl Into<String>, schema_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_file: schema_file.into(),
            values: Vec::new(),
        }
    }
}

/// Typedef (alias) definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefSpec {
    /// Alias name.
    pub name: String,
    /// Schema file the alias was declared in.
    pub schema_file: String,
    /// Aliased type.
    pub target: Box<TypeSpec>,
}

impl TypedefSpec {
    /// Creates a new typedef.
    #[must_use]
    pub fn new(name: impl Into<String>, schema_file: impl Into<String>, target: TypeSpec) -> Self {
        Self {
            name: name.into(),
            schema_file: schema_file.into(),
            target: Box::new(target),
        }
    }
}

/// Field definition within a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name, unique within its struct.
    pub name: String,
    /// Field type.
    pub ty: TypeSpec,
    /// True if the field is always populated.
    pub required: bool,
    /// Schema file the enclosing struct was declared in.
    pub schema_file: String,
}

impl FieldSpec {
    /// Creates a required field.
    #[must_use]
    pub fn required(name: impl Into<String>, ty: impl Into<TypeSpec>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            required: true,
            schema_file: String::new(),
        }
    }

    /// Creates an optional field.
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: impl Into<TypeSpec>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            required: false,
            schema_file: String::new(),
        }
    }

    /// Sets the schema file, builder style.
    #[must_use]
    pub fn in_file(mut self, schema_file: impl Into<String>) -> Self {
        self.schema_file = schema_file.into();
        self
    }

    /// Returns true if the field may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        !self.required
    }
}
