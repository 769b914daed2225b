//! Field mapping tables.
//!
//! A mapping table tells the converter where a destination field takes its
//! value from when the same-name source field is missing or should be
//! overridden. Keys are qualified destination paths.

use crate::path::{PathParseError, QualifiedPath, Segment};
use crate::statement::Place;
use gatekit_schema::{FieldSpec, ResolvedMapping};
use std::collections::BTreeMap;

/// One mapping from a destination path to a source field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMappingEntry {
    /// Qualified path of the source field, relative to the source root.
    pub source: QualifiedPath,
    /// Descriptor of the source field.
    pub field: FieldSpec,
    /// Optionality of the fields walked through before `field`. Missing
    /// entries count as required.
    pub parents_optional: Vec<bool>,
    /// True if the mapped source wins over the same-name source field.
    pub override_source: bool,
    /// Reserved transform name.
    pub transform: Option<String>,
    /// Reserved coercion name.
    pub coercion: Option<String>,
}

impl FieldMappingEntry {
    /// Creates a non-overriding entry.
    #[must_use]
    pub fn new(source: QualifiedPath, field: FieldSpec) -> Self {
        Self {
            source,
            field,
            parents_optional: Vec::new(),
            override_source: false,
            transform: None,
            coercion: None,
        }
    }

    /// Sets whether the mapping overrides the same-name source field.
    #[must_use]
    pub fn with_override(mut self, override_source: bool) -> Self {
        self.override_source = override_source;
        self
    }

    /// Records which intermediate source fields may be absent.
    #[must_use]
    pub fn with_parents_optional(mut self, parents_optional: Vec<bool>) -> Self {
        self.parents_optional = parents_optional;
        self
    }

    /// Returns the input place the entry reads from.
    #[must_use]
    pub fn source_place(&self) -> Place {
        let fields: Vec<&str> = self
            .source
            .segments()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Index | Segment::Key => None,
            })
            .collect();

        let mut place = Place::input();
        for (i, name) in fields.iter().enumerate() {
            let optional = if i + 1 == fields.len() {
                self.field.is_optional()
            } else {
                self.parents_optional.get(i).copied().unwrap_or(false)
            };
            place = place.field(name, optional);
        }
        place
    }
}

/// Ordered table of mapping entries keyed by destination path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMappingTable {
    entries: BTreeMap<QualifiedPath, FieldMappingEntry>,
}

impl FieldMappingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from resolved conversion mappings.
    ///
    /// # Errors
    /// Returns `PathParseError` if a target path is malformed.
    pub fn from_resolved(mappings: &[ResolvedMapping]) -> Result<Self, PathParseError> {
        let mut table = Self::new();
        for mapping in mappings {
            let entry = FieldMappingEntry::new(
                QualifiedPath::from_fields(mapping.from.iter().cloned()),
                mapping.field.clone(),
            )
            .with_parents_optional(mapping.parents_optional.clone())
            .with_override(mapping.override_source);
            table.insert_str(&mapping.to, entry)?;
        }
        Ok(table)
    }

    /// Inserts an entry, returning the previous entry for the path.
    pub fn insert(
        &mut self,
        path: QualifiedPath,
        entry: FieldMappingEntry,
    ) -> Option<FieldMappingEntry> {
        self.entries.insert(path, entry)
    }

    /// Parses `path` and inserts an entry.
    ///
    /// # Errors
    /// Returns `PathParseError` if the path is malformed.
    pub fn insert_str(
        &mut self,
        path: &str,
        entry: FieldMappingEntry,
    ) -> Result<Option<FieldMappingEntry>, PathParseError> {
        Ok(self.insert(QualifiedPath::parse(path)?, entry))
    }

    /// Adds an entry, builder style.
    #[must_use]
    pub fn with(mut self, path: QualifiedPath, entry: FieldMappingEntry) -> Self {
        self.insert(path, entry);
        self
    }

    /// Looks up the entry for a destination path.
    #[must_use]
    pub fn get(&self, path: &QualifiedPath) -> Option<&FieldMappingEntry> {
        self.entries.get(path)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedPath, &FieldMappingEntry)> {
        self.entries.iter()
    }

    /// Iterates entries strictly below `prefix`.
    pub fn under<'a>(
        &'a self,
        prefix: &'a QualifiedPath,
    ) -> impl Iterator<Item = (&'a QualifiedPath, &'a FieldMappingEntry)> {
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(path, _)| path.starts_with(prefix))
            .filter(move |(path, _)| path.is_under(prefix))
    }
}
