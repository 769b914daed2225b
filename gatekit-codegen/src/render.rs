//! Rust rendering of conversion statements.
//!
//! Optional values are `Option<T>`, lists are `Vec<T>`, maps are
//! `HashMap<String, T>`. Named types are expected to implement `Default`,
//! and each source type is converted with `From`.

use crate::config::ConverterConfig;
use crate::statement::{Access, Allocation, Binding, Condition, Expr, Place, Root, Statement};
use gatekit_schema::ir::to_snake_case;
use std::collections::HashSet;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "unsafe", "use",
    "where", "while", "yield",
];

/// Renders statement trees as Rust source.
pub struct RustRenderer<'c> {
    config: &'c ConverterConfig,
}

impl<'c> RustRenderer<'c> {
    /// Creates a renderer.
    #[must_use]
    pub fn new(config: &'c ConverterConfig) -> Self {
        Self { config }
    }

    /// Renders a conversion function.
    ///
    /// # Arguments
    /// * `name` - Function name, converted to snake_case
    /// * `source_type` - Qualified source struct type
    /// * `dest_type` - Qualified destination struct type
    /// * `statements` - Body statements
    #[must_use]
    pub fn render_function(
        &self,
        name: &str,
        source_type: &str,
        dest_type: &str,
        statements: &[Statement],
    ) -> String {
        let indent = &self.config.indent;
        let input = &self.config.source_ident;
        let out = &self.config.dest_ident;

        let mut output = String::new();
        output.push_str(&format!(
            "/// Converts `{source_type}` into `{dest_type}`.\n"
        ));
        // staged locals of nested fields carry `__` path separators
        output.push_str("#[allow(non_snake_case)]\n");
        output.push_str(&format!(
            "pub fn {}({input}: &{source_type}) -> {dest_type} {{\n",
            ident(&to_snake_case(name))
        ));
        output.push_str(&format!("{indent}let mut {out} = <{dest_type}>::default();\n"));
        output.push_str(&self.render_block(statements, 1));
        output.push_str(&format!("{indent}{out}\n"));
        output.push_str("}\n");
        output
    }

    /// Renders statements at the given indentation depth.
    #[must_use]
    pub fn render_block(&self, statements: &[Statement], depth: usize) -> String {
        let mut output = String::new();
        self.write_block(statements, depth, &mut HashSet::new(), &mut output);
        output
    }

    fn write_block(
        &self,
        statements: &[Statement],
        depth: usize,
        declared: &mut HashSet<String>,
        output: &mut String,
    ) {
        let pad = self.config.indent.repeat(depth);

        for statement in statements {
            match statement {
                Statement::Assign { target, value } => {
                    let value = self.expr(target, value);
                    match target.as_local() {
                        Some(local) if declared.insert(local.to_string()) => {
                            output.push_str(&format!("{pad}let mut {local} = {value};\n"));
                        }
                        _ => {
                            output.push_str(&format!("{pad}{} = {value};\n", self.lvalue(target)));
                        }
                    }
                }
                Statement::Allocate {
                    target,
                    allocation,
                    size_hint,
                } => {
                    let value = self.allocation(allocation, size_hint.as_ref());
                    let value = if target.optional {
                        format!("Some({value})")
                    } else {
                        value
                    };
                    output.push_str(&format!("{pad}{} = {value};\n", self.lvalue(target)));
                }
                Statement::Conditional {
                    condition: Condition::IsPresent(place),
                    then_branch,
                    ..
                } if !place.optional => {
                    // A required value is always present.
                    self.write_block(then_branch, depth, declared, output);
                }
                Statement::Conditional {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let condition = match condition {
                        Condition::IsPresent(place) => format!("{}.is_some()", self.rvalue(place)),
                        Condition::Flag(name) => name.clone(),
                    };
                    output.push_str(&format!("{pad}if {condition} {{\n"));
                    self.write_block(then_branch, depth + 1, &mut declared.clone(), output);
                    if !else_branch.is_empty() {
                        output.push_str(&format!("{pad}}} else {{\n"));
                        self.write_block(else_branch, depth + 1, &mut declared.clone(), output);
                    }
                    output.push_str(&format!("{pad}}}\n"));
                }
                Statement::Loop {
                    iterable,
                    binding,
                    body,
                } => {
                    let source = self.rvalue(iterable);
                    let flatten = if iterable.optional { ".flatten()" } else { "" };
                    let header = match binding {
                        Binding::Index { index, value } => format!(
                            "for ({index}, {value}) in {source}.iter(){flatten}.enumerate() {{"
                        ),
                        Binding::Key { key, value } => {
                            format!("for ({key}, {value}) in {source}.iter(){flatten} {{")
                        }
                    };
                    output.push_str(&format!("{pad}{header}\n"));
                    self.write_block(body, depth + 1, &mut declared.clone(), output);
                    output.push_str(&format!("{pad}}}\n"));
                }
            }
        }
    }

    fn root(&self, place: &Place) -> String {
        match &place.root {
            Root::In => self.config.source_ident.clone(),
            Root::Out => self.config.dest_ident.clone(),
            Root::Local(name) => name.clone(),
        }
    }

    /// Renders a place for reading. Absent intermediate structs read as
    /// their default.
    fn rvalue(&self, place: &Place) -> String {
        let mut output = self.root(place);
        let last = place.accesses.len().saturating_sub(1);
        for (i, access) in place.accesses.iter().enumerate() {
            match access {
                Access::Field { name, optional } => {
                    output.push('.');
                    output.push_str(&ident(&to_snake_case(name)));
                    if *optional && i < last {
                        output.push_str(".clone().unwrap_or_default()");
                    }
                }
                Access::Index(binding) => output.push_str(&format!("[{binding}]")),
                Access::Key(binding) => output.push_str(&format!("[{binding}]")),
            }
        }
        output
    }

    /// Renders a place for writing. Absent intermediate values are created.
    fn lvalue(&self, place: &Place) -> String {
        let mut output = self.root(place);
        let last = place.accesses.len().saturating_sub(1);
        let mut deref = false;
        for (i, access) in place.accesses.iter().enumerate() {
            match access {
                Access::Field { name, optional } => {
                    output.push('.');
                    output.push_str(&ident(&to_snake_case(name)));
                    if *optional && i < last {
                        output.push_str(".get_or_insert_with(Default::default)");
                    }
                }
                Access::Index(binding) => output.push_str(&format!("[{binding}]")),
                Access::Key(binding) => {
                    output.push_str(&format!(".entry({binding}.clone()).or_default()"));
                    deref = i == last;
                }
            }
        }
        if deref {
            format!("*{output}")
        } else {
            output
        }
    }

    fn expr(&self, target: &Place, expr: &Expr) -> String {
        match expr {
            Expr::Read(place) => {
                let value = self.rvalue(place);
                match (place.optional, target.optional) {
                    (false, true) => format!("Some({value}.clone())"),
                    (true, false) => format!("{value}.clone().unwrap_or_default()"),
                    _ => format!("{value}.clone()"),
                }
            }
            Expr::Cast {
                type_name,
                value,
                optional,
            } => {
                let source = self.rvalue(value);
                match (*optional, value.optional) {
                    (true, true) => format!("{source}.clone().map(<{type_name}>::from)"),
                    (true, false) => format!("Some(<{type_name}>::from({source}.clone()))"),
                    (false, true) => {
                        format!("<{type_name}>::from({source}.clone().unwrap_or_default())")
                    }
                    (false, false) => format!("<{type_name}>::from({source}.clone())"),
                }
            }
            Expr::Bytes(place) => {
                let source = self.rvalue(place);
                let bytes = if place.optional {
                    format!("Vec::<u8>::from({source}.clone().unwrap_or_default())")
                } else {
                    format!("Vec::<u8>::from({source}.clone())")
                };
                if target.optional {
                    format!("Some({bytes})")
                } else {
                    bytes
                }
            }
            Expr::Bool(value) => value.to_string(),
            Expr::Null => {
                if target.optional {
                    "None".to_string()
                } else {
                    "Default::default()".to_string()
                }
            }
        }
    }

    fn allocation(&self, allocation: &Allocation, size_hint: Option<&Place>) -> String {
        let len = match size_hint {
            Some(place) if place.optional => {
                format!("{}.as_ref().map_or(0, |items| items.len())", self.rvalue(place))
            }
            Some(place) => format!("{}.len()", self.rvalue(place)),
            None => "0".to_string(),
        };
        match allocation {
            Allocation::Struct { type_name } => format!("<{type_name}>::default()"),
            Allocation::List { element, .. } => {
                format!("std::iter::repeat_with(<{element}>::default).take({len}).collect()")
            }
            Allocation::Map { .. } => format!("std::collections::HashMap::with_capacity({len})"),
        }
    }
}

/// Escapes Rust keywords as raw identifiers.
fn ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}
