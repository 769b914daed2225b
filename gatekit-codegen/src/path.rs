//! Qualified destination paths.
//!
//! A [`QualifiedPath`] locates a field inside the destination tree as a
//! sequence of segments: field names, plus element markers for list indices
//! and map keys. Mapping-table keys are parsed into this form so prefix
//! checks compare whole segments rather than raw strings.

use gatekit_schema::ir::to_snake_case;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step of a qualified path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Named struct field.
    Field(String),
    /// Any element of a list.
    Index,
    /// Any value of a map.
    Key,
}

/// Error returned when a path string is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid path '{path}': {message}")]
pub struct PathParseError {
    /// Offending path text.
    pub path: String,
    /// What went wrong.
    pub message: String,
}

impl PathParseError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Location of a field within the destination tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedPath {
    segments: Vec<Segment>,
}

impl QualifiedPath {
    /// Returns the empty (root) path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Builds a path from field names.
    #[must_use]
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: fields
                .into_iter()
                .map(|f| Segment::Field(f.into()))
                .collect(),
        }
    }

    /// Parses a path such as `Owner.Addresses[index].Street`.
    ///
    /// `[key]` denotes a map value; any other bracketed text (`[2]`,
    /// `[index]`, `[]`) denotes a list element.
    ///
    /// # Errors
    /// Returns `PathParseError` on empty field names or unbalanced brackets.
    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        let mut segments = Vec::new();
        let mut rest = text.trim();

        if rest.is_empty() {
            return Ok(Self::root());
        }

        loop {
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            let name = &rest[..end];
            if name.is_empty() {
                return Err(PathParseError::new(text, "empty field name"));
            }
            segments.push(Segment::Field(name.to_string()));
            rest = &rest[end..];

            while let Some(after) = rest.strip_prefix('[') {
                let close = after
                    .find(']')
                    .ok_or_else(|| PathParseError::new(text, "unclosed '['"))?;
                let inner = after[..close].trim();
                segments.push(if inner == "key" {
                    Segment::Key
                } else {
                    Segment::Index
                });
                rest = &after[close + 1..];
            }

            if rest.is_empty() {
                break;
            }
            match rest.strip_prefix('.') {
                Some(next) => rest = next,
                None => {
                    return Err(PathParseError::new(
                        text,
                        format!("unexpected '{rest}' after element marker"),
                    ));
                }
            }
        }

        Ok(Self { segments })
    }

    /// Returns the segments of the path.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path extended by a field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        self.with(Segment::Field(name.to_string()))
    }

    /// Returns a new path extended by a list-element marker.
    #[must_use]
    pub fn index(&self) -> Self {
        self.with(Segment::Index)
    }

    /// Returns a new path extended by a map-value marker.
    #[must_use]
    pub fn key(&self) -> Self {
        self.with(Segment::Key)
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Returns true if `prefix` matches the leading segments of this path.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns true if this path lies below `prefix` (and is not equal to it).
    #[must_use]
    pub fn is_under(&self, prefix: &Self) -> bool {
        self.segments.len() > prefix.segments.len() && self.starts_with(prefix)
    }

    /// Flattens the path into a snake_case identifier fragment.
    ///
    /// Segments are joined with `__` and never contain a double underscore
    /// themselves, so distinct paths yield distinct fragments
    /// (`OwnerTags` -> `owner_tags`, `Owner.Tags` -> `owner__tags`).
    #[must_use]
    pub fn to_ident(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Field(name) => segment_ident(name),
                Segment::Index => "item".to_string(),
                Segment::Key => "entry".to_string(),
            })
            .collect::<Vec<_>>()
            .join("__")
    }
}

/// Snake-cases one field name with underscore runs collapsed.
fn segment_ident(name: &str) -> String {
    to_snake_case(name)
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Index => f.write_str("[index]")?,
                Segment::Key => f.write_str("[key]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for QualifiedPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
