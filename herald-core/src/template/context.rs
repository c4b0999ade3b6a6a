//! Render context: path lookup and value formatting

use serde_json::Value;

use crate::domain::Plugin;
use crate::error::RenderError;

/// The metadata a template is rendered against
#[derive(Debug, Clone)]
pub struct RenderContext {
    root: Value,
}

impl RenderContext {
    pub fn new(plugin: &Plugin) -> Result<Self, RenderError> {
        Ok(Self {
            root: plugin.to_context()?,
        })
    }

    /// Context over an arbitrary JSON tree
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Resolve a dotted path such as `Build.Status`
    ///
    /// Each segment is matched exactly first, then case-insensitively, so
    /// `build.status` resolves as well.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.root, |value, segment| {
            let object = value.as_object()?;
            object.get(segment).or_else(|| {
                object
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                    .map(|(_, value)| value)
            })
        })
    }
}

/// Format a value the way it appears in rendered output
///
/// Strings are emitted verbatim and `null` renders as nothing. Arrays are
/// joined with commas; objects fall back to compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Handlebars-style truthiness
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
