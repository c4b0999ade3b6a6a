//! Error types for configuration and rendering

use std::path::PathBuf;
use thiserror::Error;

/// Invalid plugin configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No webhook URL was configured
    #[error("missing webhook url")]
    MissingWebhook,

    /// A configured webhook URL is blank
    #[error("webhook url must not be empty")]
    EmptyWebhook,
}

/// Errors that can occur while turning a template into a message
#[derive(Debug, Error)]
pub enum RenderError {
    /// The configured template file could not be read
    #[error("failed to read template file '{}': {source}", path.display())]
    TemplateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `{{` without its closing `}}`
    #[error("unclosed tag at offset {offset}")]
    UnclosedTag { offset: usize },

    /// `{{ }}` with nothing inside
    #[error("empty tag at offset {offset}")]
    EmptyTag { offset: usize },

    /// A quoted argument without its closing quote
    #[error("unterminated string literal in tag '{tag}'")]
    UnterminatedString { tag: String },

    /// Tag contents that are not a path, literal or helper call
    #[error("invalid expression '{tag}': {reason}")]
    InvalidExpression { tag: String, reason: String },

    /// `{{/name}}` that does not close the innermost open block
    #[error("closing tag '{found}' does not match open block '{expected}'")]
    MismatchedBlock { expected: String, found: String },

    /// `{{/name}}` or `{{else}}` outside of any block
    #[error("unexpected '{tag}' outside of a block")]
    UnexpectedTag { tag: String },

    /// A block that is never closed
    #[error("block '{name}' is never closed")]
    UnclosedBlock { name: String },

    /// Helper name that is not registered
    #[error("unknown helper '{name}'")]
    UnknownHelper { name: String },

    /// Path that does not resolve against the metadata
    #[error("unknown variable '{path}'")]
    UnknownVariable { path: String },

    /// The metadata could not be converted into a render context
    #[error("failed to build render context: {0}")]
    Context(#[from] serde_json::Error),

    /// A helper was invoked with the wrong arguments
    #[error("helper '{helper}': {message}")]
    HelperArguments { helper: String, message: String },
}

impl RenderError {
    /// Create a helper argument error
    pub fn helper(helper: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HelperArguments {
            helper: helper.into(),
            message: message.into(),
        }
    }
}
