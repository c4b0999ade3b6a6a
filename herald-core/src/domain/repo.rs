//! Repository domain types

use serde::Serialize;

/// Repository the build belongs to
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repo {
    /// Owner and name, e.g. `octocat/hello-world`
    pub full_name: String,
    pub link: String,
    pub namespace: String,
    pub name: String,
}
