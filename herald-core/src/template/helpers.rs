//! Helper traits and registry
//!
//! Helpers are looked up by name while rendering, so new helpers can be added
//! without touching the substitution loop.

use serde_json::Value;

use super::context::RenderContext;
use crate::error::RenderError;

/// Inline helper, invoked as `{{ name arg1 arg2 }}`
///
/// # Example
///
/// ```rust
/// use herald_core::template::{Helper, RenderContext};
/// use herald_core::RenderError;
/// use serde_json::Value;
///
/// struct Shout;
///
/// impl Helper for Shout {
///     fn name(&self) -> &'static str {
///         "shout"
///     }
///
///     fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
///         let text = args.first().and_then(Value::as_str).unwrap_or_default();
///         Ok(format!("{}!", text.to_uppercase()))
///     }
/// }
/// ```
pub trait Helper: Send + Sync {
    /// Name used in templates. Must be unique across all helpers.
    fn name(&self) -> &'static str;

    /// Produces the helper output from already resolved arguments
    ///
    /// # Errors
    /// Returns [`RenderError::HelperArguments`] for wrong arity or types
    fn call(&self, args: &[Value], ctx: &RenderContext) -> Result<String, RenderError>;
}

/// Block helper, invoked as `{{#name args}}...{{else}}...{{/name}}`
///
/// The helper only decides which of the two bodies is rendered.
pub trait BlockHelper: Send + Sync {
    /// Name used in templates. Must be unique across all helpers.
    fn name(&self) -> &'static str;

    /// Returns `true` to render the main body, `false` for the `{{else}}` body
    fn test(&self, args: &[Value], ctx: &RenderContext) -> Result<bool, RenderError>;
}

/// Registry of inline and block helpers
pub struct HelperRegistry {
    inline: Vec<Box<dyn Helper>>,
    blocks: Vec<Box<dyn BlockHelper>>,
}

impl HelperRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            inline: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Creates a registry holding every built-in helper
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::builtins::register_builtins(&mut registry);
        registry
    }

    /// Registers an inline helper
    ///
    /// # Panics
    /// Panics if a helper with the same name is already registered
    pub fn register<H: Helper + 'static>(&mut self, helper: H) {
        self.ensure_unique(helper.name());
        self.inline.push(Box::new(helper));
    }

    /// Registers a block helper
    ///
    /// # Panics
    /// Panics if a helper with the same name is already registered
    pub fn register_block<H: BlockHelper + 'static>(&mut self, helper: H) {
        self.ensure_unique(helper.name());
        self.blocks.push(Box::new(helper));
    }

    /// Gets an inline helper by name
    pub fn get(&self, name: &str) -> Option<&dyn Helper> {
        self.inline
            .iter()
            .find(|h| h.name() == name)
            .map(|h| h.as_ref())
    }

    /// Gets a block helper by name
    pub fn get_block(&self, name: &str) -> Option<&dyn BlockHelper> {
        self.blocks
            .iter()
            .find(|h| h.name() == name)
            .map(|h| h.as_ref())
    }

    fn ensure_unique(&self, name: &str) {
        if self.get(name).is_some() || self.get_block(name).is_some() {
            panic!("Helper with name '{}' is already registered", name);
        }
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Checks that a helper received between `min` and `max` arguments
pub(crate) fn expect_arity(
    helper: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<(), RenderError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(RenderError::helper(
            helper,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ));
    }
    Ok(())
}

/// Reads an integer argument; numeric strings are accepted too
pub(crate) fn int_arg(helper: &str, value: &Value) -> Result<i64, RenderError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| RenderError::helper(helper, format!("{} is not an integer", n))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| RenderError::helper(helper, format!("'{}' is not an integer", s))),
        other => Err(RenderError::helper(
            helper,
            format!("expected an integer, got {}", other),
        )),
    }
}

/// Reads a string argument
pub(crate) fn str_arg<'a>(helper: &str, value: &'a Value) -> Result<&'a str, RenderError> {
    value
        .as_str()
        .ok_or_else(|| RenderError::helper(helper, format!("expected a string, got {}", value)))
}
