//! Error types for code generation.

use crate::path::{PathParseError, QualifiedPath};
use thiserror::Error;

/// Error returned by a [`NamespaceResolver`](crate::resolver::NamespaceResolver).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The schema file has no known namespace.
    #[error("no namespace registered for schema file '{file}'")]
    UnknownFile {
        /// Schema file path.
        file: String,
    },

    /// The schema file path cannot be mapped to a module path.
    #[error("invalid schema file path '{file}': {reason}")]
    InvalidPath {
        /// Schema file path.
        file: String,
        /// Why the path was rejected.
        reason: String,
    },
}

impl ResolveError {
    /// Creates an invalid-path error.
    pub fn invalid_path(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

/// Error raised while generating conversion statements for a field tree.
///
/// Every variant carries the qualified destination path of the field that
/// failed, so callers can report where in the tree the problem is.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// No source field and no mapping entry for a destination field.
    #[error("no source found for destination field '{path}'")]
    Resolution {
        /// Destination field path.
        path: QualifiedPath,
    },

    /// Source and destination shapes are incompatible.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Destination field path.
        path: QualifiedPath,
        /// Shape required by the destination.
        expected: String,
        /// Shape of the selected source.
        found: String,
    },

    /// The field uses a type shape the converter does not handle.
    #[error("unsupported type at '{path}': {reason}")]
    UnsupportedType {
        /// Destination field path.
        path: QualifiedPath,
        /// Description of the unsupported shape.
        reason: String,
    },

    /// The namespace of a named type could not be resolved.
    #[error("cannot resolve namespace of '{schema_file}' at '{path}': {source}")]
    PackageResolution {
        /// Destination field path.
        path: QualifiedPath,
        /// Schema file of the named type.
        schema_file: String,
        /// Resolver failure.
        #[source]
        source: ResolveError,
    },
}

impl ConvertError {
    /// Creates a type mismatch error.
    pub fn mismatch(
        path: &QualifiedPath,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.clone(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported(path: &QualifiedPath, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Returns the destination path the error refers to.
    #[must_use]
    pub fn path(&self) -> &QualifiedPath {
        match self {
            Self::Resolution { path }
            | Self::TypeMismatch { path, .. }
            | Self::UnsupportedType { path, .. }
            | Self::PackageResolution { path, .. } => path,
        }
    }
}

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema parsing error.
    #[error("schema parse error: {0}")]
    Parse(#[from] gatekit_schema::ParseError),

    /// Schema validation error.
    #[error("schema error: {0}")]
    Schema(#[from] gatekit_schema::SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Mapping path error.
    #[error("mapping error: {0}")]
    Path(#[from] PathParseError),

    /// Namespace resolution error outside of a field conversion.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Conversion of a named conversion failed.
    #[error("conversion '{conversion}' failed: {source}")]
    Convert {
        /// Conversion name.
        conversion: String,
        /// Underlying converter error.
        #[source]
        source: ConvertError,
    },

    /// Code generation error.
    #[error("generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates a generation error with the given message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}
