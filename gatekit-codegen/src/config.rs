//! Converter and generator configuration.

use crate::error::CodegenError;
use std::collections::HashSet;

/// Identifier and output settings shared by the converter and renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Name of the input parameter in generated functions.
    pub source_ident: String,
    /// Name of the value being built.
    pub dest_ident: String,
    /// List loop position binding.
    pub index_binding: String,
    /// Map loop key binding.
    pub key_binding: String,
    /// Loop value binding.
    pub value_binding: String,
    /// Prefix for the local holding the selected aggregate source.
    pub source_list_local: String,
    /// Prefix for the local recording whether the override source was taken.
    pub override_flag_local: String,
    /// One level of indentation.
    pub indent: String,
    /// Abort on the first failing conversion instead of skipping it.
    pub fail_fast: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            source_ident: "input".to_string(),
            dest_ident: "out".to_string(),
            index_binding: "index".to_string(),
            key_binding: "key".to_string(),
            value_binding: "value".to_string(),
            source_list_local: "source_list".to_string(),
            override_flag_local: "is_overridden".to_string(),
            indent: "    ".to_string(),
            fail_fast: true,
        }
    }
}

impl ConverterConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input and output identifiers.
    #[must_use]
    pub fn with_roots(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        self.source_ident = source.into();
        self.dest_ident = dest.into();
        self
    }

    /// Sets the loop bindings.
    #[must_use]
    pub fn with_bindings(
        mut self,
        index: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.index_binding = index.into();
        self.key_binding = key.into();
        self.value_binding = value.into();
        self
    }

    /// Sets the local name prefixes.
    #[must_use]
    pub fn with_locals(
        mut self,
        source_list: impl Into<String>,
        override_flag: impl Into<String>,
    ) -> Self {
        self.source_list_local = source_list.into();
        self.override_flag_local = override_flag.into();
        self
    }

    /// Sets the indentation unit.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Checks that every identifier is usable and distinct.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` naming the offending setting.
    pub fn validate(&self) -> Result<(), CodegenError> {
        let idents = [
            ("source_ident", &self.source_ident),
            ("dest_ident", &self.dest_ident),
            ("index_binding", &self.index_binding),
            ("key_binding", &self.key_binding),
            ("value_binding", &self.value_binding),
            ("source_list_local", &self.source_list_local),
            ("override_flag_local", &self.override_flag_local),
        ];

        let mut seen = HashSet::new();
        for (setting, ident) in idents {
            if !is_identifier(ident) {
                return Err(CodegenError::generation(format!(
                    "{setting} '{ident}' is not a valid identifier"
                )));
            }
            if !seen.insert(ident.as_str()) {
                return Err(CodegenError::generation(format!(
                    "{setting} '{ident}' is used more than once"
                )));
            }
        }

        if !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(CodegenError::generation(
                "indent must contain only spaces or tabs",
            ));
        }

        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
