//! HOCON-style configuration documents.
//!
//! Bundle descriptors are written in a small subset of HOCON:
//!
//! ```text
//! name = "world"
//! nrOfCpus = 0.1
//! roles = [
//!   "web"
//! ]
//! components {
//!   web {
//!     endpoints {}
//!   }
//! }
//! ```
//!
//! Objects keep insertion order so the rendered text is stable, two spaces
//! of indentation per level, no trailing commas and no string escaping.

use std::fmt;

use conduct_core::error::{ConductError, Result};
use serde_json::Number;

/// A configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ConfValue>),
    Object(ConfObject),
}

impl ConfValue {
    /// A bare floating point literal. Non-finite values become `null`.
    pub fn float(value: f64) -> Self {
        Number::from_f64(value)
            .map(ConfValue::Number)
            .unwrap_or(ConfValue::Null)
    }

    /// A list of quoted strings.
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfValue::List(
            items
                .into_iter()
                .map(|s| ConfValue::String(s.into()))
                .collect(),
        )
    }

    /// Convert a JSON value, keeping its scalar type.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfValue::Null,
            serde_json::Value::Bool(b) => ConfValue::Bool(*b),
            serde_json::Value::Number(n) => ConfValue::Number(n.clone()),
            serde_json::Value::String(s) => ConfValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                ConfValue::List(items.iter().map(ConfValue::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut object = ConfObject::new();
                for (key, value) in map {
                    object.insert(key.clone(), ConfValue::from_json(value));
                }
                ConfValue::Object(object)
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ConfObject> {
        match self {
            ConfValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfValue]> {
        match self {
            ConfValue::List(items) => Some(items),
            _ => None,
        }
    }

    fn is_container(&self) -> bool {
        matches!(self, ConfValue::List(_) | ConfValue::Object(_))
    }
}

impl From<&str> for ConfValue {
    fn from(value: &str) -> Self {
        ConfValue::String(value.to_string())
    }
}

impl From<String> for ConfValue {
    fn from(value: String) -> Self {
        ConfValue::String(value)
    }
}

impl From<bool> for ConfValue {
    fn from(value: bool) -> Self {
        ConfValue::Bool(value)
    }
}

impl From<u64> for ConfValue {
    fn from(value: u64) -> Self {
        ConfValue::Number(value.into())
    }
}

impl From<i64> for ConfValue {
    fn from(value: i64) -> Self {
        ConfValue::Number(value.into())
    }
}

impl From<ConfObject> for ConfValue {
    fn from(value: ConfObject) -> Self {
        ConfValue::Object(value)
    }
}

/// An insertion-ordered object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfObject {
    entries: Vec<(String, ConfValue)>,
}

impl ConfObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfValue) -> Option<ConfValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Set a value at a dotted path, creating intermediate objects.
    ///
    /// `com.lightbend.test` becomes `com { lightbend { test = ... } }`.
    /// A path that would run through an existing scalar, or a scalar that
    /// would replace an existing object, is rejected rather than dropping
    /// either value. A scalar at the same leaf path is replaced.
    pub fn put_path(&mut self, path: &str, value: ConfValue) -> Result<()> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConductError::Format(format!(
                "invalid dotted key '{}'",
                path
            )));
        }

        let Some((leaf, parents)) = segments.split_last() else {
            return Err(ConductError::Format("empty dotted key".to_string()));
        };

        let mut node: &mut ConfObject = self;
        for (depth, segment) in parents.iter().enumerate() {
            node = match node.child_object(segment) {
                Some(child) => child,
                None => {
                    return Err(ConductError::Format(format!(
                        "key '{}' conflicts with the value at '{}'",
                        path,
                        segments[..=depth].join(".")
                    )))
                }
            };
        }

        if let Some(ConfValue::Object(existing)) = node.get(leaf) {
            if !existing.is_empty() && !matches!(value, ConfValue::Object(_)) {
                return Err(ConductError::Format(format!(
                    "key '{}' conflicts with nested keys below it",
                    path
                )));
            }
        }

        node.insert(*leaf, value);
        Ok(())
    }

    /// Get or create the object stored under `key`. `None` when the key
    /// already holds a non-object value.
    fn child_object(&mut self, key: &str) -> Option<&mut ConfObject> {
        if self.get(key).is_none() {
            self.insert(key, ConfValue::Object(ConfObject::new()));
        }
        match self.get_mut(key) {
            Some(ConfValue::Object(child)) => Some(child),
            _ => None,
        }
    }

    /// Render the object's fields as a top-level document (no enclosing
    /// braces, no trailing newline).
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        write_fields(&mut lines, self, 0);
        lines.join("\n")
    }
}

impl fmt::Display for ConfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn write_fields(lines: &mut Vec<String>, object: &ConfObject, depth: usize) {
    for (key, value) in object.iter() {
        write_field(lines, key, value, depth);
    }
}

fn write_field(lines: &mut Vec<String>, key: &str, value: &ConfValue, depth: usize) {
    let pad = indent(depth);
    match value {
        ConfValue::Object(object) if object.is_empty() => lines.push(format!("{pad}{key} {{}}")),
        ConfValue::Object(object) => {
            lines.push(format!("{pad}{key} {{"));
            write_fields(lines, object, depth + 1);
            lines.push(format!("{pad}}}"));
        }
        ConfValue::List(items) if items.is_empty() => lines.push(format!("{pad}{key} = []")),
        ConfValue::List(items) => {
            lines.push(format!("{pad}{key} = ["));
            write_elements(lines, items, depth + 1);
            lines.push(format!("{pad}]"));
        }
        scalar => lines.push(format!("{pad}{key} = {}", render_scalar(scalar))),
    }
}

fn write_elements(lines: &mut Vec<String>, items: &[ConfValue], depth: usize) {
    let pad = indent(depth);
    for item in items {
        match item {
            ConfValue::Object(object) if object.is_empty() => lines.push(format!("{pad}{{}}")),
            ConfValue::Object(object) => {
                lines.push(format!("{pad}{{"));
                write_fields(lines, object, depth + 1);
                lines.push(format!("{pad}}}"));
            }
            ConfValue::List(nested) if nested.is_empty() => lines.push(format!("{pad}[]")),
            ConfValue::List(nested) => {
                lines.push(format!("{pad}["));
                write_elements(lines, nested, depth + 1);
                lines.push(format!("{pad}]"));
            }
            scalar => lines.push(format!("{pad}{}", render_scalar(scalar))),
        }
    }
}

fn render_scalar(value: &ConfValue) -> String {
    debug_assert!(!value.is_container());
    match value {
        ConfValue::Null => "null".to_string(),
        ConfValue::Bool(b) => b.to_string(),
        ConfValue::Number(n) => n.to_string(),
        ConfValue::String(s) => format!("\"{s}\""),
        ConfValue::List(_) | ConfValue::Object(_) => String::new(),
    }
}
