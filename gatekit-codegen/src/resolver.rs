//! Namespace resolution for named types.
//!
//! Generated code refers to structs, enums and typedefs through the module
//! they live in. A [`NamespaceResolver`] maps the schema file a type was
//! declared in to that module path.

use crate::error::ResolveError;
use gatekit_schema::ir::to_snake_case;
use std::collections::HashMap;

/// Maps a schema file to the namespace its types are generated into.
///
/// Implementations must be safe to share across threads; the converter
/// only ever reads through them.
pub trait NamespaceResolver: Send + Sync {
    /// Returns the namespace (`a::b::c`) for `schema_file`.
    ///
    /// # Errors
    /// Returns `ResolveError` if the file has no namespace.
    fn resolve_namespace(&self, schema_file: &str) -> Result<String, ResolveError>;
}

/// Resolver backed by an explicit file-to-namespace table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    namespaces: HashMap<String, String>,
}

impl StaticResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a namespace, builder style.
    #[must_use]
    pub fn with(mut self, schema_file: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.insert(schema_file, namespace);
        self
    }

    /// Registers a namespace.
    pub fn insert(&mut self, schema_file: impl Into<String>, namespace: impl Into<String>) {
        self.namespaces.insert(schema_file.into(), namespace.into());
    }
}

impl NamespaceResolver for StaticResolver {
    fn resolve_namespace(&self, schema_file: &str) -> Result<String, ResolveError> {
        self.namespaces
            .get(schema_file)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownFile {
                file: schema_file.to_string(),
            })
    }
}

/// Resolver that derives a module path from the schema file's relative path.
///
/// `clients/bar/bar.thrift` under root `crate::idl` becomes
/// `crate::idl::clients::bar::bar`.
#[derive(Debug, Clone, Default)]
pub struct ModulePathResolver {
    root: String,
}

impl ModulePathResolver {
    /// Creates a resolver rooted at `root` (may be empty).
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl NamespaceResolver for ModulePathResolver {
    fn resolve_namespace(&self, schema_file: &str) -> Result<String, ResolveError> {
        if schema_file.trim().is_empty() {
            return Err(ResolveError::invalid_path(schema_file, "empty path"));
        }
        if schema_file.starts_with('/') {
            return Err(ResolveError::invalid_path(schema_file, "absolute path"));
        }

        let components: Vec<&str> = schema_file
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();

        let mut modules = Vec::with_capacity(components.len() + 1);
        if !self.root.is_empty() {
            modules.push(self.root.clone());
        }

        for (i, component) in components.iter().enumerate() {
            if *component == ".." {
                return Err(ResolveError::invalid_path(
                    schema_file,
                    "parent directory references are not allowed",
                ));
            }
            let stem = if i + 1 == components.len() {
                component.rsplit_once('.').map_or(*component, |(stem, _)| stem)
            } else {
                component
            };
            modules.push(module_name(schema_file, stem)?);
        }

        Ok(modules.join("::"))
    }
}

fn module_name(schema_file: &str, component: &str) -> Result<String, ResolveError> {
    let name: String = to_snake_case(component)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '_') {
        return Err(ResolveError::invalid_path(
            schema_file,
            format!("component '{component}' has no usable name"),
        ));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(format!("_{name}"));
    }
    Ok(name)
}
