//! Field-tree type converter.
//!
//! Given a source and a destination field tree, the converter decides for
//! every destination field where its value comes from and emits the
//! statements that copy it across. Resolution per field, at qualified
//! destination path `P`:
//!
//! - same-name source field only: use it.
//! - mapping entry at `P` only: use the mapped source field.
//! - both, `override_source` set: the mapped field is primary. When it is
//!   optional, the same-name field is the fallback.
//! - both, `override_source` unset: the same-name field is primary. When it
//!   is optional, the mapped field is the fallback.
//! - neither: [`ConvertError::Resolution`].
//!
//! Emission is driven by the destination type. Scalars assign the fallback
//! first and then overwrite from the primary when present. Structs allocate
//! and recurse. Lists and maps allocate, then loop over the selected source
//! with a flag chosen once before the loop when struct elements have a
//! fallback.

use crate::config::ConverterConfig;
use crate::context::ConversionContext;
use crate::error::{ConvertError, ResolveError};
use crate::mapping::FieldMappingTable;
use crate::path::QualifiedPath;
use crate::resolver::NamespaceResolver;
use crate::statement::{Allocation, Binding, Condition, Expr, Place, Statement, StatementSink};
use gatekit_schema::{FieldSpec, PrimitiveType, StructSpec, TypeSpec};
use tracing::{debug, trace};

/// A candidate source value for one destination slot.
#[derive(Debug, Clone)]
struct SourceRef<'a> {
    ty: &'a TypeSpec,
    optional: bool,
    place: Place,
}

impl<'a> SourceRef<'a> {
    fn from_field(field: &'a FieldSpec, place: Place) -> Self {
        Self {
            ty: &field.ty,
            optional: field.is_optional(),
            place,
        }
    }

    fn element(ty: &'a TypeSpec, place: Place) -> Self {
        Self {
            ty,
            optional: false,
            place,
        }
    }
}

/// Outcome of resolving one destination field.
#[derive(Debug)]
struct Resolution<'a> {
    primary: SourceRef<'a>,
    fallback: Option<SourceRef<'a>>,
}

impl<'a> Resolution<'a> {
    const fn direct(primary: SourceRef<'a>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    fn sources(&self) -> impl Iterator<Item = &SourceRef<'a>> {
        std::iter::once(&self.primary).chain(self.fallback.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateKind {
    List,
    Map,
}

impl AggregateKind {
    const fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

/// Generates conversion statements between two field trees.
pub struct TypeConverter<'r> {
    resolver: &'r dyn NamespaceResolver,
    config: ConverterConfig,
}

impl<'r> TypeConverter<'r> {
    /// Creates a converter with the default configuration.
    #[must_use]
    pub fn new(resolver: &'r dyn NamespaceResolver) -> Self {
        Self {
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

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Generates the statements that populate `dest_fields` from
    /// `source_fields`.
    ///
    /// Statements follow destination field declaration order. Nothing is
    /// returned on failure.
    ///
    /// # Errors
    /// Returns `ConvertError` carrying the destination path of the first
    /// field that could not be converted.
    pub fn generate(
        &self,
        source_fields: &[FieldSpec],
        dest_fields: &[FieldSpec],
        mappings: &FieldMappingTable,
    ) -> Result<Vec<Statement>, ConvertError> {
        let ctx = ConversionContext::root(mappings);
        let mut sink = StatementSink::new();
        self.convert_fields(&ctx, source_fields, dest_fields, &mut sink)?;

        debug!(
            fields = dest_fields.len(),
            mappings = mappings.len(),
            statements = sink.len(),
            "generated field conversion"
        );
        Ok(sink.into_statements())
    }

    /// Returns `namespace::name` for a named type declared in `schema_file`.
    ///
    /// # Errors
    /// Returns the resolver's error unchanged.
    pub fn qualified_name(&self, name: &str, schema_file: &str) -> Result<String, ResolveError> {
        let namespace = self.resolver.resolve_namespace(schema_file)?;
        if namespace.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{namespace}::{name}"))
        }
    }

    /// Returns the target-language type name for a non-aggregate type.
    ///
    /// # Errors
    /// Returns `ConvertError::PackageResolution` if a named type's namespace
    /// is unknown, or `ConvertError::UnsupportedType` for aggregates.
    pub fn type_name(&self, ty: &TypeSpec, path: &QualifiedPath) -> Result<String, ConvertError> {
        match ty {
            TypeSpec::Primitive(prim) => Ok(prim.rust_type().to_string()),
            TypeSpec::Binary => Ok("Vec<u8>".to_string()),
            TypeSpec::Enum(spec) => self.qualified(&spec.name, &spec.schema_file, path),
            TypeSpec::Struct(spec) => self.qualified(&spec.name, &spec.schema_file, path),
            TypeSpec::Typedef(spec) => self.qualified(&spec.name, &spec.schema_file, path),
            TypeSpec::List(_) | TypeSpec::Map { .. } | TypeSpec::Set(_) => Err(
                ConvertError::unsupported(path, format!("{} has no element name", ty.kind_name())),
            ),
        }
    }

    fn qualified(
        &self,
        name: &str,
        schema_file: &str,
        path: &QualifiedPath,
    ) -> Result<String, ConvertError> {
        self.qualified_name(name, schema_file)
            .map_err(|source| ConvertError::PackageResolution {
                path: path.clone(),
                schema_file: schema_file.to_string(),
                source,
            })
    }

    fn convert_fields<'a>(
        &self,
        ctx: &ConversionContext<'a>,
        source_fields: &'a [FieldSpec],
        dest_fields: &[FieldSpec],
        sink: &mut StatementSink,
    ) -> Result<(), ConvertError> {
        for dest in dest_fields {
            let path = ctx.dest_path().field(&dest.name);
            let resolution = resolve_field(ctx, source_fields, dest, &path)?;
            trace!(
                path = %path,
                source = %resolution.primary.place,
                fallback = resolution.fallback.is_some(),
                depth = ctx.depth(),
                "resolved field"
            );

            let target = ctx.dest().field(&dest.name, dest.is_optional());
            self.convert_field(ctx, dest, &path, &target, &resolution, sink)?;
        }
        Ok(())
    }

    fn convert_field<'a>(
        &self,
        ctx: &ConversionContext<'a>,
        dest: &FieldSpec,
        path: &QualifiedPath,
        target: &Place,
        resolution: &Resolution<'a>,
        sink: &mut StatementSink,
    ) -> Result<(), ConvertError> {
        match &dest.ty {
            TypeSpec::Primitive(_) | TypeSpec::Enum(_) | TypeSpec::Typedef(_) => {
                self.convert_scalar(dest, path, target, resolution, sink)
            }
            TypeSpec::Binary => convert_binary(path, target, resolution, sink),
            TypeSpec::Struct(spec) => {
                self.convert_struct_field(ctx, spec, path, target, resolution, sink)
            }
            TypeSpec::List(element) => self.convert_aggregate(
                ctx,
                AggregateKind::List,
                element,
                path,
                target,
                resolution,
                sink,
            ),
            TypeSpec::Map { key, value } => {
                if !key.resolved().is_string() {
                    return Err(ConvertError::unsupported(
                        path,
                        format!("map keys must be strings, found {}", key.resolved().kind_name()),
                    ));
                }
                self.convert_aggregate(ctx, AggregateKind::Map, value, path, target, resolution, sink)
            }
            TypeSpec::Set(_) => Err(ConvertError::unsupported(path, "set types are not supported")),
        }
    }

    fn convert_scalar(
        &self,
        dest: &FieldSpec,
        path: &QualifiedPath,
        target: &Place,
        resolution: &Resolution<'_>,
        sink: &mut StatementSink,
    ) -> Result<(), ConvertError> {
        let type_name = self.type_name(&dest.ty, path)?;
        for source in resolution.sources() {
            check_compatible(&dest.ty, source.ty, path)?;
        }

        let optional = dest.is_optional();
        emit_with_fallback(optional, target, resolution, sink, |source| Expr::Cast {
            type_name: type_name.clone(),
            value: source.place.clone(),
            optional,
        });
        Ok(())
    }

    fn convert_struct_field<'a>(
        &self,
        ctx: &ConversionContext<'a>,
        spec: &StructSpec,
        path: &QualifiedPath,
        target: &Place,
        resolution: &Resolution<'a>,
        sink: &mut StatementSink,
    ) -> Result<(), ConvertError> {
        let absent = vec![Statement::assign(target.clone(), Expr::Null)];
        let otherwise = match &resolution.fallback {
            Some(fallback) => self.struct_from(ctx, spec, path, target, fallback, absent)?,
            None => absent,
        };
        let statements = self.struct_from(ctx, spec, path, target, &resolution.primary, otherwise)?;
        sink.extend(statements);
        Ok(())
    }

    /// Converts a struct from `source`, guarded by a presence check when the
    /// source may be absent.
    fn struct_from<'a>(
        &self,
        ctx: &ConversionContext<'a>,
        spec: &StructSpec,
        path: &QualifiedPath,
        target: &Place,
        source: &SourceRef<'a>,
        otherwise: Vec<Statement>,
    ) -> Result<Vec<Statement>, ConvertError> {
        let body = self.struct_body(ctx, spec, path, target, source)?;
        if source.optional {
            Ok(vec![Statement::Conditional {
                condition: Condition::IsPresent(source.place.clone()),
                then_branch: body,
                else_branch: otherwise,
            }])
        } else {
            Ok(body)
        }
    }

    fn struct_body<'a>(
        &self,
        ctx: &ConversionContext<'a>,
        spec: &StructSpec,
        path: &QualifiedPath,
        target: &Place,
        source: &SourceRef<'a>,
    ) -> Result<Vec<Statement>, ConvertError> {
        let TypeSpec::Struct(source_spec) = source.ty.resolved() else {
            return Err(ConvertError::mismatch(
                path,
                "struct",
                source.ty.resolved().kind_name(),
            ));
        };
        let type_name = self.qualified(&spec.name, &spec.schema_file, path)?;

        let child = ctx.descend(path.clone(), target.clone(), source.place.clone());
        let mut sink = StatementSink::new();
        sink.push(Statement::Allocate {
            target: target.clone(),
            allocation: Allocation::Struct { type_name },
            size_hint: None,
        });
        self.convert_fields(&child, &source_spec.fields, &spec.fields, &mut sink)?;
        Ok(sink.into_statements())
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_aggregate<'a>(
        &self,
        ctx: &ConversionContext<'a>,
        kind: AggregateKind,
        dest_value: &TypeSpec,
        path: &QualifiedPath,
        target: &Place,
        resolution: &Resolution<'a>,
        sink: &mut StatementSink,
    ) -> Result<(), ConvertError> {
        if dest_value.resolved().is_aggregate() {
            return Err(ConvertError::unsupported(
                path,
                format!(
                    "{} of {} is not supported",
                    kind.name(),
                    dest_value.resolved().kind_name()
                ),
            ));
        }
        let element_type = self.type_name(dest_value, path)?;
        let primary_element = source_element(kind, &resolution.primary, path)?;
        let fallback_element = match &resolution.fallback {
            Some(fallback) => Some(source_element(kind, fallback, path)?),
            None => None,
        };

        let config = &self.config;
        let struct_value = match dest_value {
            TypeSpec::Struct(spec) => Some(spec),
            _ => None,
        };

        // Pick the source aggregate once, before the loop.
        let mut staging = Vec::new();
        let mut flag = None;
        let iterable = match &resolution.fallback {
            Some(fallback) => {
                let suffix = path.to_ident();
                let selected = Place::local(
                    format!("{}_{suffix}", config.source_list_local),
                    fallback.optional,
                );
                staging.push(Statement::assign(
                    selected.clone(),
                    Expr::Read(fallback.place.clone()),
                ));

                let mut select = vec![Statement::assign(
                    selected.clone(),
                    Expr::Read(resolution.primary.place.clone()),
                )];
                if struct_value.is_some() {
                    let name = format!("{}_{suffix}", config.override_flag_local);
                    staging.push(Statement::assign(
                        Place::local(name.clone(), false),
                        Expr::Bool(false),
                    ));
                    select.push(Statement::assign(
                        Place::local(name.clone(), false),
                        Expr::Bool(true),
                    ));
                    flag = Some(name);
                }
                staging.push(Statement::when(
                    Condition::IsPresent(resolution.primary.place.clone()),
                    select,
                ));
                selected
            }
            None => resolution.primary.place.clone(),
        };

        let (binding, element_target, element_path) = match kind {
            AggregateKind::List => (
                Binding::Index {
                    index: config.index_binding.clone(),
                    value: config.value_binding.clone(),
                },
                target.index(&config.index_binding),
                path.index(),
            ),
            AggregateKind::Map => (
                Binding::Key {
                    key: config.key_binding.clone(),
                    value: config.value_binding.clone(),
                },
                target.key(&config.key_binding),
                path.key(),
            ),
        };
        let value = Place::local(config.value_binding.clone(), false);

        let body = match struct_value {
            Some(spec) => {
                let primary = SourceRef::element(primary_element, value.clone());
                let primary_body =
                    self.struct_body(ctx, spec, &element_path, &element_target, &primary)?;
                match (&flag, fallback_element) {
                    (Some(flag), Some(fallback_element)) => {
                        let fallback = SourceRef::element(fallback_element, value.clone());
                        let fallback_body =
                            self.struct_body(ctx, spec, &element_path, &element_target, &fallback)?;
                        vec![Statement::Conditional {
                            condition: Condition::Flag(flag.clone()),
                            then_branch: primary_body,
                            else_branch: fallback_body,
                        }]
                    }
                    _ => primary_body,
                }
            }
            None => {
                for element in std::iter::once(primary_element).chain(fallback_element) {
                    check_compatible(dest_value, element, &element_path)?;
                }
                vec![Statement::assign(
                    element_target,
                    Expr::Cast {
                        type_name: element_type.clone(),
                        value,
                        optional: false,
                    },
                )]
            }
        };

        let boxed = struct_value.is_some();
        let allocation = match kind {
            AggregateKind::List => Allocation::List {
                element: element_type,
                boxed,
            },
            AggregateKind::Map => Allocation::Map {
                value: element_type,
                boxed,
            },
        };
        let fill = vec![
            Statement::Allocate {
                target: target.clone(),
                allocation,
                size_hint: Some(iterable.clone()),
            },
            Statement::Loop {
                iterable: iterable.clone(),
                binding,
                body,
            },
        ];

        sink.extend(staging);
        if iterable.optional {
            sink.push(Statement::Conditional {
                condition: Condition::IsPresent(iterable),
                then_branch: fill,
                else_branch: vec![Statement::assign(target.clone(), Expr::Null)],
            });
        } else {
            sink.extend(fill);
        }

        trace!(
            path = %path,
            kind = kind.name(),
            override_flag = flag.is_some(),
            "converted aggregate"
        );
        Ok(())
    }
}

/// Generates conversion statements with the default configuration.
///
/// # Errors
/// Returns `ConvertError` if any destination field cannot be converted.
pub fn generate_conversion(
    source_fields: &[FieldSpec],
    dest_fields: &[FieldSpec],
    mappings: &FieldMappingTable,
    resolver: &dyn NamespaceResolver,
) -> Result<Vec<Statement>, ConvertError> {
    TypeConverter::new(resolver).generate(source_fields, dest_fields, mappings)
}

fn resolve_field<'a>(
    ctx: &ConversionContext<'a>,
    source_fields: &'a [FieldSpec],
    dest: &FieldSpec,
    path: &QualifiedPath,
) -> Result<Resolution<'a>, ConvertError> {
    let same_name = source_fields
        .iter()
        .find(|field| field.name == dest.name)
        .map(|field| {
            SourceRef::from_field(field, ctx.source().field(&field.name, field.is_optional()))
        });

    match (same_name, ctx.mapping(path)) {
        (None, None) => Err(ConvertError::Resolution { path: path.clone() }),
        (Some(same_name), None) => Ok(Resolution::direct(same_name)),
        (None, Some(entry)) => Ok(Resolution::direct(SourceRef::from_field(
            &entry.field,
            entry.source_place(),
        ))),
        (Some(same_name), Some(entry)) => {
            let mapped = SourceRef::from_field(&entry.field, entry.source_place());
            let (primary, secondary) = if entry.override_source {
                (mapped, same_name)
            } else {
                (same_name, mapped)
            };
            let fallback = if primary.optional {
                Some(secondary)
            } else {
                None
            };
            Ok(Resolution { primary, fallback })
        }
    }
}

/// Emits `target = value(source)` with the fallback written first and the
/// primary written over it when present.
fn emit_with_fallback<'a>(
    guard: bool,
    target: &Place,
    resolution: &Resolution<'a>,
    sink: &mut StatementSink,
    value: impl Fn(&SourceRef<'a>) -> Expr,
) {
    let assign = |source: &SourceRef<'a>| Statement::assign(target.clone(), value(source));
    let guarded = |source: &SourceRef<'a>| {
        Statement::when(
            Condition::IsPresent(source.place.clone()),
            vec![assign(source)],
        )
    };

    match &resolution.fallback {
        Some(fallback) => {
            sink.push(if guard {
                guarded(fallback)
            } else {
                assign(fallback)
            });
            sink.push(guarded(&resolution.primary));
        }
        None if guard => sink.push(guarded(&resolution.primary)),
        None => sink.push(assign(&resolution.primary)),
    }
}

fn convert_binary(
    path: &QualifiedPath,
    target: &Place,
    resolution: &Resolution<'_>,
    sink: &mut StatementSink,
) -> Result<(), ConvertError> {
    for source in resolution.sources() {
        match source.ty.resolved() {
            TypeSpec::Binary | TypeSpec::Primitive(PrimitiveType::String) => {}
            other => return Err(ConvertError::mismatch(path, "binary", other.kind_name())),
        }
    }
    emit_with_fallback(false, target, resolution, sink, |source| {
        Expr::Bytes(source.place.clone())
    });
    Ok(())
}

/// Returns the element (or map value) type of an aggregate source.
fn source_element<'a>(
    kind: AggregateKind,
    source: &SourceRef<'a>,
    path: &QualifiedPath,
) -> Result<&'a TypeSpec, ConvertError> {
    let element: &'a TypeSpec = match (kind, source.ty.resolved()) {
        (_, TypeSpec::Set(_)) => {
            return Err(ConvertError::unsupported(path, "set types are not supported"));
        }
        (AggregateKind::List, TypeSpec::List(element)) => &**element,
        (AggregateKind::Map, TypeSpec::Map { key, value }) => {
            if !key.resolved().is_string() {
                return Err(ConvertError::unsupported(
                    path,
                    format!("map keys must be strings, found {}", key.resolved().kind_name()),
                ));
            }
            &**value
        }
        (_, other) => return Err(ConvertError::mismatch(path, kind.name(), other.kind_name())),
    };

    if element.resolved().is_aggregate() {
        return Err(ConvertError::unsupported(
            path,
            format!(
                "{} of {} is not supported",
                kind.name(),
                element.resolved().kind_name()
            ),
        ));
    }
    Ok(element)
}

const fn is_scalar(ty: &TypeSpec) -> bool {
    !ty.is_aggregate() && !ty.is_struct()
}

/// Checks that a source can be cast to a whole-value destination.
fn check_compatible(
    dest: &TypeSpec,
    source: &TypeSpec,
    path: &QualifiedPath,
) -> Result<(), ConvertError> {
    let expected = dest.resolved();
    let found = source.resolved();
    let compatible = if is_scalar(expected) {
        is_scalar(found)
    } else {
        expected.kind_name() == found.kind_name()
    };

    if compatible {
        Ok(())
    } else {
        Err(ConvertError::mismatch(path, expected.kind_name(), found.kind_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldMappingEntry;
    use crate::resolver::StaticResolver;
    use crate::statement::walk;
    use gatekit_schema::{EnumSpec, TypedefSpec};

    const FILE: &str = "a.thrift";

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with(FILE, "crate::a")
            .with("b.thrift", "crate::b")
    }

    fn string_field(name: &str, required: bool) -> FieldSpec {
        if required {
            FieldSpec::required(name, PrimitiveType::String).in_file(FILE)
        } else {
            FieldSpec::optional(name, PrimitiveType::String).in_file(FILE)
        }
    }

    fn user_struct(name: &str) -> StructSpec {
        StructSpec::new(name, FILE)
            .with_field(FieldSpec::required("Id", PrimitiveType::I64))
            .with_field(FieldSpec::required("Name", PrimitiveType::String))
    }

    fn mapping(to: &str, from: &str, field: FieldSpec, override_source: bool) -> FieldMappingTable {
        let mut table = FieldMappingTable::new();
        table
            .insert_str(
                to,
                FieldMappingEntry::new(QualifiedPath::parse(from).expect("parse"), field)
                    .with_override(override_source),
            )
            .expect("insert");
        table
    }

    fn generate(
        source: &[FieldSpec],
        dest: &[FieldSpec],
        table: &FieldMappingTable,
    ) -> Result<Vec<Statement>, ConvertError> {
        let resolver = resolver();
        TypeConverter::new(&resolver).generate(source, dest, table)
    }

    fn conditionals(statements: &[Statement]) -> usize {
        walk(statements)
            .into_iter()
            .filter(|s| matches!(s, Statement::Conditional { .. }))
            .count()
    }

    fn reads(statements: &[Statement]) -> Vec<String> {
        walk(statements)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Assign {
                    value: Expr::Cast { value, .. } | Expr::Read(value) | Expr::Bytes(value),
                    ..
                } => Some(value.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_required_primitive_single_assignment() {
        let fields = vec![FieldSpec::required("Count", PrimitiveType::I32)];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");

        assert_eq!(
            statements,
            vec![Statement::assign(
                Place::output().field("Count", false),
                Expr::Cast {
                    type_name: "i32".to_string(),
                    value: Place::input().field("Count", false),
                    optional: false,
                },
            )]
        );
    }

    #[test]
    fn test_identity_schema_has_no_conditionals() {
        let fields = vec![
            FieldSpec::required("A", PrimitiveType::Bool),
            FieldSpec::required("B", PrimitiveType::I64),
            FieldSpec::required("C", PrimitiveType::Double),
            FieldSpec::required("D", TypeSpec::Struct(user_struct("User"))).in_file(FILE),
            FieldSpec::required("E", TypeSpec::list(PrimitiveType::String.into())),
        ];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");

        assert_eq!(conditionals(&statements), 0);
        assert!(!walk(&statements).iter().any(|s| matches!(
            s,
            Statement::Assign {
                value: Expr::Bool(_),
                ..
            }
        )));
    }

    #[test]
    fn test_optional_primitive_is_always_guarded() {
        let source = vec![string_field("Name", true)];
        let dest = vec![string_field("Name", false)];
        let statements =
            generate(&source, &dest, &FieldMappingTable::new()).expect("Failed to generate");

        assert_eq!(statements.len(), 1);
        let Statement::Conditional {
            condition: Condition::IsPresent(place),
            then_branch,
            else_branch,
        } = &statements[0]
        else {
            panic!("expected guarded assignment, got {:?}", statements[0]);
        };
        assert_eq!(place, &Place::input().field("Name", false));
        assert_eq!(then_branch.len(), 1);
        assert!(else_branch.is_empty());
    }

    #[test]
    fn test_missing_source_is_resolution_error() {
        let dest = vec![string_field("Missing", true)];
        let err = generate(&[], &dest, &FieldMappingTable::new()).expect_err("should fail");
        assert!(matches!(err, ConvertError::Resolution { .. }));
        assert_eq!(err.path().to_string(), "Missing");
    }

    #[test]
    fn test_mapping_only_source() {
        let source = vec![string_field("FullName", true)];
        let dest = vec![string_field("Name", true)];
        let table = mapping("Name", "FullName", string_field("FullName", true), false);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(reads(&statements), vec!["in.FullName"]);
        assert_eq!(conditionals(&statements), 0);
    }

    #[test]
    fn test_override_required_mapping_ignores_base() {
        let source = vec![string_field("Name", true), string_field("Alias", true)];
        let dest = vec![string_field("Name", true)];
        let table = mapping("Name", "Alias", string_field("Alias", true), true);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(reads(&statements), vec!["in.Alias"]);
        assert_eq!(conditionals(&statements), 0);
    }

    #[test]
    fn test_non_override_required_base_ignores_mapping() {
        let source = vec![string_field("Name", true), string_field("Alias", false)];
        let dest = vec![string_field("Name", true)];
        let table = mapping("Name", "Alias", string_field("Alias", false), false);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(reads(&statements), vec!["in.Name"]);
        assert_eq!(conditionals(&statements), 0);
    }

    #[test]
    fn test_override_optional_mapping_falls_back_to_base() {
        let source = vec![string_field("Name", true), string_field("Alias", false)];
        let dest = vec![string_field("Name", true)];
        let table = mapping("Name", "Alias", string_field("Alias", false), true);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(statements.len(), 2);
        // fallback first, unguarded for a required destination
        assert!(matches!(&statements[0], Statement::Assign { .. }));
        assert!(matches!(
            &statements[1],
            Statement::Conditional { condition: Condition::IsPresent(p), .. }
                if p.to_string() == "in.Alias?"
        ));
        assert_eq!(reads(&statements), vec!["in.Name", "in.Alias?"]);
    }

    #[test]
    fn test_non_override_optional_base_falls_back_to_mapping() {
        let source = vec![string_field("Name", false), string_field("Alias", false)];
        let dest = vec![string_field("Name", false)];
        let table = mapping("Name", "Alias", string_field("Alias", false), false);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(statements.len(), 2);
        assert_eq!(conditionals(&statements), 2);
        assert_eq!(reads(&statements), vec!["in.Alias?", "in.Name?"]);
    }

    #[test]
    fn test_enum_and_typedef_use_resolved_names() {
        let color = TypeSpec::Enum(EnumSpec::new("Color", "b.thrift"));
        let uuid = TypeSpec::Typedef(TypedefSpec::new(
            "Uuid",
            FILE,
            PrimitiveType::String.into(),
        ));
        let fields = vec![
            FieldSpec::required("Color", color),
            FieldSpec::required("Id", uuid),
        ];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");

        let names: Vec<&str> = statements
            .iter()
            .filter_map(|s| match s {
                Statement::Assign {
                    value: Expr::Cast { type_name, .. },
                    ..
                } => Some(type_name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["crate::b::Color", "crate::a::Uuid"]);
    }

    #[test]
    fn test_unknown_namespace_is_package_resolution_error() {
        let color = TypeSpec::Enum(EnumSpec::new("Color", "missing.thrift"));
        let fields = vec![FieldSpec::required("Color", color)];
        let err = generate(&fields, &fields, &FieldMappingTable::new()).expect_err("should fail");

        assert!(matches!(
            err,
            ConvertError::PackageResolution { ref schema_file, .. } if schema_file == "missing.thrift"
        ));
        assert_eq!(err.path().to_string(), "Color");
    }

    #[test]
    fn test_binary_is_direct() {
        let source = vec![FieldSpec::optional("Blob", TypeSpec::Binary)];
        let dest = vec![FieldSpec::optional("Blob", TypeSpec::Binary)];
        let statements =
            generate(&source, &dest, &FieldMappingTable::new()).expect("Failed to generate");
        assert_eq!(
            statements,
            vec![Statement::assign(
                Place::output().field("Blob", true),
                Expr::Bytes(Place::input().field("Blob", true)),
            )]
        );
    }

    #[test]
    fn test_scalar_from_struct_is_mismatch() {
        let source = vec![FieldSpec::required("Name", TypeSpec::Struct(user_struct("User")))];
        let dest = vec![string_field("Name", true)];
        let err = generate(&source, &dest, &FieldMappingTable::new()).expect_err("should fail");
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_nested_struct_from_non_struct_is_mismatch() {
        let source = vec![FieldSpec::required("Owner", PrimitiveType::String)];
        let dest = vec![FieldSpec::optional("Owner", TypeSpec::Struct(user_struct("User")))];
        let err = generate(&source, &dest, &FieldMappingTable::new()).expect_err("should fail");
        assert!(matches!(
            err,
            ConvertError::TypeMismatch { ref expected, ref found, .. }
                if expected == "struct" && found == "primitive"
        ));
        assert_eq!(err.path().to_string(), "Owner");
    }

    #[test]
    fn test_override_struct_from_required_mapping() {
        let source = vec![FieldSpec::required("User", TypeSpec::Struct(user_struct("User")))];
        let dest = vec![FieldSpec::optional("Owner", TypeSpec::Struct(user_struct("Owner")))];
        let table = mapping(
            "Owner",
            "User",
            FieldSpec::required("User", TypeSpec::Struct(user_struct("User"))),
            true,
        );

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(conditionals(&statements), 0);
        assert_eq!(
            statements[0],
            Statement::Allocate {
                target: Place::output().field("Owner", true),
                allocation: Allocation::Struct {
                    type_name: "crate::a::Owner".to_string()
                },
                size_hint: None,
            }
        );
        assert_eq!(reads(&statements), vec!["in.User.Id", "in.User.Name"]);
        assert!(matches!(
            &statements[1],
            Statement::Assign { target, .. } if target.to_string() == "out.Owner.Id"
        ));
    }

    #[test]
    fn test_optional_struct_guard_and_null() {
        let field = FieldSpec::optional("Owner", TypeSpec::Struct(user_struct("User")));
        let fields = vec![field];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");

        assert_eq!(statements.len(), 1);
        let Statement::Conditional {
            condition: Condition::IsPresent(place),
            then_branch,
            else_branch,
        } = &statements[0]
        else {
            panic!("expected guarded struct");
        };
        assert_eq!(place.to_string(), "in.Owner?");
        assert_eq!(then_branch.len(), 3);
        assert_eq!(
            else_branch,
            &vec![Statement::assign(
                Place::output().field("Owner", true),
                Expr::Null
            )]
        );
    }

    #[test]
    fn test_optional_struct_override_falls_back_to_base() {
        let source = vec![
            FieldSpec::required("Owner", TypeSpec::Struct(user_struct("User"))),
            FieldSpec::optional("User", TypeSpec::Struct(user_struct("User"))),
        ];
        let dest = vec![FieldSpec::required("Owner", TypeSpec::Struct(user_struct("Owner")))];
        let table = mapping(
            "Owner",
            "User",
            FieldSpec::optional("User", TypeSpec::Struct(user_struct("User"))),
            true,
        );

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(statements.len(), 1);
        let Statement::Conditional {
            condition: Condition::IsPresent(place),
            then_branch,
            else_branch,
        } = &statements[0]
        else {
            panic!("expected guarded struct");
        };
        assert_eq!(place.to_string(), "in.User?");
        assert_eq!(reads(then_branch), vec!["in.User.Id", "in.User.Name"]);
        assert_eq!(reads(else_branch), vec!["in.Owner.Id", "in.Owner.Name"]);
        for branch in [then_branch, else_branch] {
            assert!(matches!(
                &branch[0],
                Statement::Allocate { target, .. } if target.to_string() == "out.Owner"
            ));
        }
        assert!(
            !walk(&statements)
                .iter()
                .any(|s| matches!(s, Statement::Assign { value: Expr::Null, .. }))
        );
    }

    #[test]
    fn test_nested_mapping_is_scoped_to_struct() {
        let source_user = StructSpec::new("User", FILE)
            .with_field(FieldSpec::required("Login", PrimitiveType::String));
        let dest_user = StructSpec::new("User", FILE)
            .with_field(FieldSpec::required("Name", PrimitiveType::String));
        let source = vec![FieldSpec::required("User", TypeSpec::Struct(source_user))];
        let dest = vec![FieldSpec::required("User", TypeSpec::Struct(dest_user))];
        let table = mapping(
            "User.Name",
            "User.Login",
            FieldSpec::required("Login", PrimitiveType::String),
            false,
        );

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(reads(&statements), vec!["in.User.Login"]);
    }

    #[test]
    fn test_list_of_strings_scenario() {
        let fields = vec![
            string_field("Name", true),
            FieldSpec::required("Tags", TypeSpec::list(PrimitiveType::String.into())),
        ];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");

        assert_eq!(statements.len(), 3);
        assert!(matches!(&statements[0], Statement::Assign { .. }));
        assert_eq!(
            statements[1],
            Statement::Allocate {
                target: Place::output().field("Tags", false),
                allocation: Allocation::List {
                    element: "String".to_string(),
                    boxed: false
                },
                size_hint: Some(Place::input().field("Tags", false)),
            }
        );
        assert_eq!(
            statements[2],
            Statement::Loop {
                iterable: Place::input().field("Tags", false),
                binding: Binding::Index {
                    index: "index".to_string(),
                    value: "value".to_string()
                },
                body: vec![Statement::assign(
                    Place::output().field("Tags", false).index("index"),
                    Expr::Cast {
                        type_name: "String".to_string(),
                        value: Place::local("value", false),
                        optional: false,
                    },
                )],
            }
        );
    }

    #[test]
    fn test_list_of_struct_with_override_uses_flag() {
        let list = TypeSpec::list(TypeSpec::Struct(user_struct("User")));
        let source = vec![
            FieldSpec::required("Users", list.clone()),
            FieldSpec::optional("Members", list.clone()),
        ];
        let dest = vec![FieldSpec::required("Users", list.clone())];
        let table = mapping("Users", "Members", FieldSpec::optional("Members", list), true);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");

        // staging: select source, flag, conditional select; then alloc and loop
        assert_eq!(statements.len(), 5);
        assert_eq!(
            statements[0],
            Statement::assign(
                Place::local("source_list_users", false),
                Expr::Read(Place::input().field("Users", false)),
            )
        );
        assert_eq!(
            statements[1],
            Statement::assign(Place::local("is_overridden_users", false), Expr::Bool(false))
        );
        assert!(matches!(
            &statements[2],
            Statement::Conditional { then_branch, .. } if then_branch.len() == 2
        ));
        assert!(matches!(&statements[3], Statement::Allocate { .. }));

        let Statement::Loop { iterable, body, .. } = &statements[4] else {
            panic!("expected loop");
        };
        assert_eq!(iterable.as_local(), Some("source_list_users"));
        assert_eq!(body.len(), 1);
        let Statement::Conditional {
            condition: Condition::Flag(flag),
            then_branch,
            else_branch,
        } = &body[0]
        else {
            panic!("expected flag branch");
        };
        assert_eq!(flag, "is_overridden_users");
        assert_eq!(then_branch.len(), 3);
        assert_eq!(then_branch, else_branch);

        // the flag is set once, outside the loop
        let flag_writes = walk(&statements)
            .into_iter()
            .filter(|s| matches!(s, Statement::Assign { value: Expr::Bool(_), .. }))
            .count();
        assert_eq!(flag_writes, 2);
        assert!(
            !walk(body)
                .iter()
                .any(|s| matches!(s, Statement::Assign { value: Expr::Bool(_), .. }))
        );
    }

    #[test]
    fn test_aggregate_locals_are_unique_per_path() {
        let strings = TypeSpec::list(PrimitiveType::String.into());
        let numbers = TypeSpec::list(PrimitiveType::I32.into());
        let source_owner = StructSpec::new("Owner", FILE)
            .with_field(FieldSpec::required("Tags", numbers.clone()))
            .with_field(FieldSpec::optional("AltTags", numbers.clone()));
        let dest_owner =
            StructSpec::new("Owner", FILE).with_field(FieldSpec::required("Tags", numbers.clone()));
        let source = vec![
            FieldSpec::required("OwnerTags", strings.clone()),
            FieldSpec::optional("AltOwnerTags", strings.clone()),
            FieldSpec::required("Owner", TypeSpec::Struct(source_owner)),
        ];
        let dest = vec![
            FieldSpec::required("OwnerTags", strings.clone()),
            FieldSpec::required("Owner", TypeSpec::Struct(dest_owner)),
        ];
        let table = mapping(
            "OwnerTags",
            "AltOwnerTags",
            FieldSpec::optional("AltOwnerTags", strings),
            true,
        )
        .with(
            QualifiedPath::parse("Owner.Tags").expect("parse"),
            FieldMappingEntry::new(
                QualifiedPath::parse("Owner.AltTags").expect("parse"),
                FieldSpec::optional("AltTags", numbers),
            )
            .with_override(true),
        );

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        let mut locals: Vec<&str> = walk(&statements)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Assign {
                    target,
                    value: Expr::Read(_),
                } => target.as_local(),
                _ => None,
            })
            .collect();
        locals.dedup();
        assert_eq!(locals, vec!["source_list_owner_tags", "source_list_owner__tags"]);
        // staging, selection, allocation, then the loop for the root field
        assert!(matches!(
            &statements[3],
            Statement::Loop { iterable, .. } if iterable.as_local() == Some("source_list_owner_tags")
        ));
    }

    #[test]
    fn test_optional_list_guard() {
        let fields = vec![FieldSpec::optional(
            "Tags",
            TypeSpec::list(PrimitiveType::I32.into()),
        )];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            &statements[0],
            Statement::Conditional { then_branch, else_branch, .. }
                if then_branch.len() == 2 && else_branch.len() == 1
        ));
    }

    #[test]
    fn test_map_of_struct_recurses_with_key_path() {
        let map = TypeSpec::map(
            PrimitiveType::String.into(),
            TypeSpec::Struct(user_struct("User")),
        );
        let fields = vec![FieldSpec::required("Users", map)];
        let statements =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");

        assert!(matches!(
            &statements[0],
            Statement::Allocate { allocation: Allocation::Map { boxed: true, .. }, .. }
        ));
        let Statement::Loop { binding, body, .. } = &statements[1] else {
            panic!("expected loop");
        };
        assert!(matches!(binding, Binding::Key { key, .. } if key == "key"));
        assert!(matches!(
            &body[0],
            Statement::Allocate { target, .. } if target.to_string() == "out.Users[key]"
        ));
        assert_eq!(reads(body), vec!["value.Id", "value.Name"]);
    }

    #[test]
    fn test_map_of_struct_with_override_uses_flag() {
        let map = TypeSpec::map(
            PrimitiveType::String.into(),
            TypeSpec::Struct(user_struct("User")),
        );
        let source = vec![
            FieldSpec::required("Users", map.clone()),
            FieldSpec::optional("Members", map.clone()),
        ];
        let dest = vec![FieldSpec::required("Users", map.clone())];
        let table = mapping("Users", "Members", FieldSpec::optional("Members", map), true);

        let statements = generate(&source, &dest, &table).expect("Failed to generate");
        assert_eq!(statements.len(), 5);
        assert_eq!(
            statements[0],
            Statement::assign(
                Place::local("source_list_users", false),
                Expr::Read(Place::input().field("Users", false)),
            )
        );
        assert_eq!(
            statements[1],
            Statement::assign(Place::local("is_overridden_users", false), Expr::Bool(false))
        );
        let Statement::Conditional {
            condition: Condition::IsPresent(primary),
            then_branch: select,
            ..
        } = &statements[2]
        else {
            panic!("expected source selection");
        };
        assert_eq!(primary.to_string(), "in.Members?");
        assert_eq!(
            select[0],
            Statement::assign(
                Place::local("source_list_users", false),
                Expr::Read(Place::input().field("Members", true)),
            )
        );
        assert!(matches!(
            &statements[3],
            Statement::Allocate {
                allocation: Allocation::Map { .. },
                size_hint: Some(hint),
                ..
            } if hint.as_local() == Some("source_list_users")
        ));

        let Statement::Loop {
            iterable,
            binding,
            body,
        } = &statements[4]
        else {
            panic!("expected loop");
        };
        assert_eq!(iterable.as_local(), Some("source_list_users"));
        assert!(matches!(binding, Binding::Key { key, value } if key == "key" && value == "value"));
        assert_eq!(body.len(), 1);
        let Statement::Conditional {
            condition: Condition::Flag(flag),
            then_branch,
            else_branch,
        } = &body[0]
        else {
            panic!("expected flag branch");
        };
        assert_eq!(flag, "is_overridden_users");
        assert!(matches!(
            &then_branch[0],
            Statement::Allocate { target, .. } if target.to_string() == "out.Users[key]"
        ));
        assert_eq!(reads(then_branch), vec!["value.Id", "value.Name"]);
        assert_eq!(then_branch, else_branch);
    }

    #[test]
    fn test_map_with_non_string_key_is_unsupported() {
        let map = TypeSpec::map(PrimitiveType::I32.into(), PrimitiveType::String.into());
        let fields = vec![FieldSpec::required("Lookup", map)];
        let err = generate(&fields, &fields, &FieldMappingTable::new()).expect_err("should fail");
        assert!(matches!(err, ConvertError::UnsupportedType { .. }));
        assert_eq!(err.path().to_string(), "Lookup");
    }

    #[test]
    fn test_set_and_nested_aggregates_are_unsupported() {
        let set = vec![FieldSpec::required(
            "Ids",
            TypeSpec::set(PrimitiveType::I32.into()),
        )];
        assert!(matches!(
            generate(&set, &set, &FieldMappingTable::new()),
            Err(ConvertError::UnsupportedType { .. })
        ));

        let nested = vec![FieldSpec::required(
            "Grid",
            TypeSpec::list(TypeSpec::list(PrimitiveType::I32.into())),
        )];
        assert!(matches!(
            generate(&nested, &nested, &FieldMappingTable::new()),
            Err(ConvertError::UnsupportedType { .. })
        ));

        let dest = vec![FieldSpec::required(
            "Ids",
            TypeSpec::list(PrimitiveType::I32.into()),
        )];
        assert!(matches!(
            generate(&set, &dest, &FieldMappingTable::new()),
            Err(ConvertError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_list_from_map_is_mismatch() {
        let source = vec![FieldSpec::required(
            "Tags",
            TypeSpec::map(PrimitiveType::String.into(), PrimitiveType::String.into()),
        )];
        let dest = vec![FieldSpec::required(
            "Tags",
            TypeSpec::list(PrimitiveType::String.into()),
        )];
        let err = generate(&source, &dest, &FieldMappingTable::new()).expect_err("should fail");
        assert!(matches!(
            err,
            ConvertError::TypeMismatch { ref expected, ref found, .. }
                if expected == "list" && found == "map"
        ));
    }

    #[test]
    fn test_error_in_nested_field_reports_full_path() {
        let dest_user = user_struct("User")
            .with_field(FieldSpec::required("Email", PrimitiveType::String));
        let source = vec![FieldSpec::required("Owner", TypeSpec::Struct(user_struct("User")))];
        let dest = vec![FieldSpec::required("Owner", TypeSpec::Struct(dest_user))];

        let err = generate(&source, &dest, &FieldMappingTable::new()).expect_err("should fail");
        assert_eq!(err.path().to_string(), "Owner.Email");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let list = TypeSpec::list(TypeSpec::Struct(user_struct("User")));
        let fields = vec![
            string_field("Name", false),
            FieldSpec::optional("Users", list),
            FieldSpec::optional("Owner", TypeSpec::Struct(user_struct("User"))),
        ];
        let first = generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");
        let second =
            generate(&fields, &fields, &FieldMappingTable::new()).expect("Failed to generate");
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_generation_shares_resolver() {
        let resolver = resolver();
        let fields = vec![
            string_field("Name", true),
            FieldSpec::optional("Owner", TypeSpec::Struct(user_struct("User"))),
        ];
        let table = FieldMappingTable::new();
        let (fields, table, resolver) = (&fields, &table, &resolver);

        let results: Vec<Vec<Statement>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        generate_conversion(fields, fields, table, resolver)
                            .expect("Failed to generate")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect()
        });

        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
