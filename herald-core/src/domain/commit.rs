//! Commit domain types

use serde::Serialize;

/// Branch assumed when the CI does not report one
pub const DEFAULT_BRANCH: &str = "master";

/// Commit that triggered the build
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Commit {
    pub sha: String,
    #[serde(rename = "Ref")]
    pub git_ref: String,
    pub branch: String,
    pub link: String,
    /// Already passed through [`preprocess_commit_message`]
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_avatar: String,
}

impl Default for Commit {
    fn default() -> Self {
        Self {
            sha: String::new(),
            git_ref: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            link: String::new(),
            message: String::new(),
            author_name: String::new(),
            author_email: String::new(),
            author_avatar: String::new(),
        }
    }
}

/// Prepares a raw commit message for embedding in a JSON string literal
///
/// Trailing newlines are dropped, then the message is quoted as a JSON string
/// and the surrounding quotes are removed again. Quotes, backslashes and
/// control characters inside the message end up escaped.
pub fn preprocess_commit_message(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('\n');
    // Serializing a &str cannot fail.
    let quoted = serde_json::to_string(trimmed).unwrap_or_default();
    trim_quotes(&quoted).to_string()
}

/// Strips one pair of matching single or double quotes
fn trim_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let last = bytes[bytes.len() - 1];
        if bytes[0] == last && (last == b'"' || last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
