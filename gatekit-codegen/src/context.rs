//! Recursion state for the type converter.

use crate::mapping::{FieldMappingEntry, FieldMappingTable};
use crate::path::QualifiedPath;
use crate::statement::Place;

/// Immutable state for one level of struct recursion.
///
/// Descending into a nested struct produces a new context instead of
/// mutating the current one, so sibling fields always observe the same
/// state. Only mapping entries below the current destination path are
/// visible.
#[derive(Debug, Clone)]
pub struct ConversionContext<'m> {
    dest_path: QualifiedPath,
    dest: Place,
    source: Place,
    depth: usize,
    table: &'m FieldMappingTable,
}

impl<'m> ConversionContext<'m> {
    /// Creates the top-level context over a whole mapping table.
    #[must_use]
    pub fn root(table: &'m FieldMappingTable) -> Self {
        Self {
            dest_path: QualifiedPath::root(),
            dest: Place::output(),
            source: Place::input(),
            depth: 0,
            table,
        }
    }

    /// Destination path of the struct being filled.
    #[must_use]
    pub fn dest_path(&self) -> &QualifiedPath {
        &self.dest_path
    }

    /// Output place of the struct being filled.
    #[must_use]
    pub fn dest(&self) -> &Place {
        &self.dest
    }

    /// Input place of the struct being read.
    #[must_use]
    pub fn source(&self) -> &Place {
        &self.source
    }

    /// Nesting depth, zero at the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of mapping entries visible at this level.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.table.under(&self.dest_path).count()
    }

    /// Returns the mapping entry for an exact destination path.
    #[must_use]
    pub fn mapping(&self, path: &QualifiedPath) -> Option<&'m FieldMappingEntry> {
        if !path.is_under(&self.dest_path) {
            return None;
        }
        self.table.get(path)
    }

    /// Returns the context for a nested struct at `dest_path`.
    #[must_use]
    pub fn descend(&self, dest_path: QualifiedPath, dest: Place, source: Place) -> Self {
        Self {
            dest_path,
            dest,
            source,
            depth: self.depth + 1,
            table: self.table,
        }
    }
}
