use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Declared type of a blueprint variable. Only affects the default JSON
/// shape used when no value is supplied and no default exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    String,
    Int,
    Bool,
    Float,
}

/// A variable declared by a blueprint: `var.NAME` resolves through this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub var_type: VarType,
    pub default: Option<Value>,
    pub sensitive: bool,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        VarDecl {
            name: name.into(),
            var_type,
            default: None,
            sensitive: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Resolved variable values plus declarations, supplied to
/// `generate_manifest` (spec §4.C). Declarations without a supplied value
/// fall back to their default; absent both, resolution fails with
/// [`CoreError::MissingVar`].
#[derive(Debug, Clone, Default)]
pub struct Environment {
    decls: HashMap<String, VarDecl>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn declare(&mut self, decl: VarDecl) -> &mut Self {
        self.decls.insert(decl.name.clone(), decl);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<&Value, CoreError> {
        if let Some(v) = self.values.get(name) {
            return Ok(v);
        }
        if let Some(decl) = self.decls.get(name) {
            if let Some(default) = &decl.default {
                return Ok(default);
            }
        }
        Err(CoreError::MissingVar(name.to_string()))
    }

    /// The Rust stand-in for the source's dynamic `var.NAME` attribute
    /// proxy: build a deferred reference to a not-yet-resolved variable.
    pub fn reference(name: impl Into<String>) -> VarRef {
        VarRef(name.into())
    }
}

/// A deferred reference to a single variable, as produced by
/// [`Environment::reference`] (a.k.a. `var::reference`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarRef(pub String);

impl VarRef {
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// One segment of a parsed [`StringTemplate`]: either literal text or a
/// `${var.NAME}` interpolation hole.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// A string containing zero or more `${var.NAME}` placeholders, resolved
/// against an [`Environment`] during manifest sealing (spec §4.C,
/// "deferred-interpolation strings"). A template with no placeholders
/// resolves to its literal text unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl StringTemplate {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut rest = raw.as_str();
        loop {
            match rest.find("${var.") {
                Some(start) => {
                    if start > 0 {
                        segments.push(Segment::Literal(rest[..start].to_string()));
                    }
                    let after = &rest[start + "${var.".len()..];
                    match after.find('}') {
                        Some(end) => {
                            segments.push(Segment::Var(after[..end].to_string()));
                            rest = &after[end + 1..];
                        }
                        None => {
                            // Unterminated placeholder: treat the remainder as
                            // literal rather than failing parse eagerly.
                            segments.push(Segment::Literal(rest[start..].to_string()));
                            rest = "";
                        }
                    }
                }
                None => {
                    if !rest.is_empty() {
                        segments.push(Segment::Literal(rest.to_string()));
                    }
                    break;
                }
            }
        }
        StringTemplate { raw, segments }
    }

    pub fn is_static(&self) -> bool {
        !self.segments.iter().any(|s| matches!(s, Segment::Var(_)))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Substitutes every `${var.NAME}` hole with its resolved value's
    /// string rendering (numbers and bools stringified, not quoted).
    pub fn resolve(&self, env: &Environment) -> Result<String, CoreError> {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Var(name) => {
                    let value = env.resolve(name)?;
                    out.push_str(&value_to_string(value));
                }
            }
        }
        Ok(out)
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl fmt::Display for StringTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for StringTemplate {
    fn from(s: &str) -> Self {
        StringTemplate::parse(s)
    }
}
impl From<String> for StringTemplate {
    fn from(s: String) -> Self {
        StringTemplate::parse(s)
    }
}

/// Re-exported as `var::reference` at the crate root for call sites that
/// want the source's `var.NAME` idiom without importing [`Environment`].
pub fn reference(name: impl Into<String>) -> VarRef {
    VarRef(name.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_template_resolves_without_environment() {
        let t = StringTemplate::parse("literal text");
        let env = Environment::new();
        assert_eq!(t.resolve(&env).unwrap(), "literal text");
        assert!(t.is_static());
    }

    #[test]
    fn template_substitutes_declared_var() {
        let t = StringTemplate::parse("prefix_${var.suffix}_tail");
        let mut env = Environment::new();
        env.set("suffix", Value::String("prod".to_string()));
        assert_eq!(t.resolve(&env).unwrap(), "prefix_prod_tail");
    }

    #[test]
    fn missing_var_is_an_error() {
        let t = StringTemplate::parse("${var.undeclared}");
        let env = Environment::new();
        assert!(matches!(t.resolve(&env), Err(CoreError::MissingVar(name)) if name == "undeclared"));
    }

    #[test]
    fn declared_default_is_used_when_unset() {
        let t = StringTemplate::parse("${var.region}");
        let mut env = Environment::new();
        env.declare(VarDecl::new("region", VarType::String).with_default(Value::String("us-east-1".into())));
        assert_eq!(t.resolve(&env).unwrap(), "us-east-1");
    }

    #[test]
    fn explicit_value_overrides_default() {
        let t = StringTemplate::parse("${var.region}");
        let mut env = Environment::new();
        env.declare(VarDecl::new("region", VarType::String).with_default(Value::String("us-east-1".into())));
        env.set("region", Value::String("eu-west-1".into()));
        assert_eq!(t.resolve(&env).unwrap(), "eu-west-1");
    }
}
