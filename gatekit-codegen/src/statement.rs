//! Structured conversion statements.
//!
//! The converter emits a tree of [`Statement`]s rather than text. Places are
//! symbolic: they name the input root, the output root, or a local, followed
//! by field, index or key accesses. A renderer turns the tree into source
//! code for a particular target language.

use std::fmt;

/// Root a [`Place`] is addressed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// The value being converted.
    In,
    /// The value being built.
    Out,
    /// A generated local variable.
    Local(String),
}

/// One access step applied to a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Struct field by name.
    Field {
        /// Field name.
        name: String,
        /// True if the field may be absent.
        optional: bool,
    },
    /// List element addressed by a loop binding.
    Index(String),
    /// Map value addressed by a loop binding.
    Key(String),
}

/// A readable or writable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    /// Where the place starts.
    pub root: Root,
    /// Accesses applied from the root.
    pub accesses: Vec<Access>,
    /// True if the value at this place may be absent.
    pub optional: bool,
}

impl Place {
    /// The input root.
    #[must_use]
    pub const fn input() -> Self {
        Self {
            root: Root::In,
            accesses: Vec::new(),
            optional: false,
        }
    }

    /// The output root.
    #[must_use]
    pub const fn output() -> Self {
        Self {
            root: Root::Out,
            accesses: Vec::new(),
            optional: false,
        }
    }

    /// A named local.
    #[must_use]
    pub fn local(name: impl Into<String>, optional: bool) -> Self {
        Self {
            root: Root::Local(name.into()),
            accesses: Vec::new(),
            optional,
        }
    }

    /// Returns the place of a named field below this one.
    #[must_use]
    pub fn field(&self, name: &str, optional: bool) -> Self {
        self.with(
            Access::Field {
                name: name.to_string(),
                optional,
            },
            optional,
        )
    }

    /// Returns the list element addressed by `binding`.
    #[must_use]
    pub fn index(&self, binding: &str) -> Self {
        self.with(Access::Index(binding.to_string()), false)
    }

    /// Returns the map value addressed by `binding`.
    #[must_use]
    pub fn key(&self, binding: &str) -> Self {
        self.with(Access::Key(binding.to_string()), false)
    }

    fn with(&self, access: Access, optional: bool) -> Self {
        let mut accesses = self.accesses.clone();
        accesses.push(access);
        Self {
            root: self.root.clone(),
            accesses,
            optional,
        }
    }

    /// Returns the local name if this place is a bare local.
    #[must_use]
    pub fn as_local(&self) -> Option<&str> {
        match &self.root {
            Root::Local(name) if self.accesses.is_empty() => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Root::In => f.write_str("in")?,
            Root::Out => f.write_str("out")?,
            Root::Local(name) => f.write_str(name)?,
        }
        for access in &self.accesses {
            match access {
                Access::Field { name, .. } => write!(f, ".{name}")?,
                Access::Index(binding) | Access::Key(binding) => write!(f, "[{binding}]")?,
            }
        }
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Value-producing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Copy of the value at a place.
    Read(Place),
    /// Conversion of the value at a place to a named type.
    Cast {
        /// Target type name.
        type_name: String,
        /// Source place.
        value: Place,
        /// True if the destination holds an optional value.
        optional: bool,
    },
    /// Byte-sequence conversion of the value at a place.
    Bytes(Place),
    /// Boolean literal.
    Bool(bool),
    /// Absent value.
    Null,
}

/// Branch condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The value at the place is present.
    IsPresent(Place),
    /// A boolean local is true.
    Flag(String),
}

/// Loop variables bound on each iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// List iteration.
    Index {
        /// Element position.
        index: String,
        /// Element value.
        value: String,
    },
    /// Map iteration.
    Key {
        /// Entry key.
        key: String,
        /// Entry value.
        value: String,
    },
}

/// Storage created by an [`Statement::Allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// A default-initialized struct.
    Struct {
        /// Qualified type name.
        type_name: String,
    },
    /// A list of the given element type.
    List {
        /// Element type name.
        element: String,
        /// True if elements are struct references.
        boxed: bool,
    },
    /// A string-keyed map of the given value type.
    Map {
        /// Value type name.
        value: String,
        /// True if values are struct references.
        boxed: bool,
    },
}

/// One conversion statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `target = value`.
    Assign {
        /// Written place.
        target: Place,
        /// Assigned value.
        value: Expr,
    },
    /// Fresh storage at `target`, sized from `size_hint` when given.
    Allocate {
        /// Written place.
        target: Place,
        /// What to allocate.
        allocation: Allocation,
        /// Aggregate whose length sizes the allocation.
        size_hint: Option<Place>,
    },
    /// Two-way branch.
    Conditional {
        /// Branch condition.
        condition: Condition,
        /// Statements run when the condition holds.
        then_branch: Vec<Statement>,
        /// Statements run otherwise.
        else_branch: Vec<Statement>,
    },
    /// Iteration over a list or map.
    Loop {
        /// Iterated aggregate.
        iterable: Place,
        /// Loop variables.
        binding: Binding,
        /// Per-element statements.
        body: Vec<Statement>,
    },
}

impl Statement {
    /// Creates an assignment.
    #[must_use]
    pub const fn assign(target: Place, value: Expr) -> Self {
        Self::Assign { target, value }
    }

    /// Creates a branch without an else arm.
    #[must_use]
    pub const fn when(condition: Condition, then_branch: Vec<Statement>) -> Self {
        Self::Conditional {
            condition,
            then_branch,
            else_branch: Vec::new(),
        }
    }

    /// Returns the nested statement blocks, in order.
    #[must_use]
    pub fn children(&self) -> Vec<&[Statement]> {
        match self {
            Self::Assign { .. } | Self::Allocate { .. } => Vec::new(),
            Self::Conditional {
                then_branch,
                else_branch,
                ..
            } => vec![then_branch.as_slice(), else_branch.as_slice()],
            Self::Loop { body, .. } => vec![body.as_slice()],
        }
    }
}

/// Ordered accumulator for emitted statements.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatementSink {
    statements: Vec<Statement>,
}

impl StatementSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one statement.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Appends several statements.
    pub fn extend(&mut self, statements: impl IntoIterator<Item = Statement>) {
        self.statements.extend(statements);
    }

    /// Returns the number of top-level statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Returns the emitted statements.
    #[must_use]
    pub fn as_slice(&self) -> &[Statement] {
        &self.statements
    }

    /// Consumes the sink.
    #[must_use]
    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}

/// Flattens a statement tree in depth-first pre-order.
#[must_use]
pub fn walk(statements: &[Statement]) -> Vec<&Statement> {
    let mut out = Vec::new();
    let mut stack: Vec<&Statement> = statements.iter().rev().collect();
    while let Some(statement) = stack.pop() {
        out.push(statement);
        for block in statement.children().into_iter().rev() {
            stack.extend(block.iter().rev());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_display() {
        let place = Place::input()
            .field("Tags", true)
            .index("index")
            .field("Name", false);
        assert_eq!(place.to_string(), "in.Tags[index].Name");
        assert_eq!(Place::output().field("A", true).to_string(), "out.A?");
        assert_eq!(Place::local("value", false).as_local(), Some("value"));
        assert_eq!(Place::output().as_local(), None);
    }

    #[test]
    fn test_walk_pre_order() {
        let a = Statement::assign(Place::output().field("A", false), Expr::Null);
        let b = Statement::assign(Place::output().field("B", false), Expr::Bool(true));
        let c = Statement::assign(Place::output().field("C", false), Expr::Bool(false));
        let tree = vec![
            Statement::Conditional {
                condition: Condition::Flag("flag".to_string()),
                then_branch: vec![a.clone()],
                else_branch: vec![b.clone()],
            },
            c.clone(),
        ];

        let flat = walk(&tree);
        assert_eq!(flat.len(), 4);
        assert!(matches!(flat[0], Statement::Conditional { .. }));
        assert_eq!(flat[1], &a);
        assert_eq!(flat[2], &b);
        assert_eq!(flat[3], &c);
    }

    #[test]
    fn test_sink() {
        let mut sink = StatementSink::new();
        assert!(sink.is_empty());
        sink.push(Statement::assign(Place::output(), Expr::Null));
        sink.extend(vec![Statement::assign(Place::output(), Expr::Bool(true))]);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.into_statements().len(), 2);
    }
}
