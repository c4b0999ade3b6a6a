//! The metadata aggregate handed to the renderer

use serde::Serialize;

use super::build::Build;
use super::commit::Commit;
use super::config::Config;
use super::repo::Repo;

/// Everything known about one plugin invocation
///
/// Serializes with PascalCase keys so templates can address fields as
/// `Repo.FullName`, `Build.Status` and so on.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Plugin {
    pub config: Config,
    pub repo: Repo,
    pub commit: Commit,
    pub build: Build,
}

impl Plugin {
    /// Converts the aggregate into the JSON tree templates are resolved against
    ///
    /// # Errors
    /// Fails if a field cannot be represented as JSON, such as a template
    /// path that is not valid UTF-8
    pub fn to_context(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_uses_template_names() {
        let plugin = Plugin {
            repo: Repo {
                full_name: "octocat/hello".to_string(),
                ..Default::default()
            },
            commit: Commit {
                git_ref: "refs/heads/main".to_string(),
                ..Default::default()
            },
            build: Build {
                pull_request: "42".to_string(),
                number: 7,
                ..Default::default()
            },
            ..Default::default()
        };

        let context = plugin.to_context().unwrap();
        assert_eq!(context["Repo"]["FullName"], "octocat/hello");
        assert_eq!(context["Commit"]["Ref"], "refs/heads/main");
        assert_eq!(context["Commit"]["Branch"], "master");
        assert_eq!(context["Build"]["PR"], "42");
        assert_eq!(context["Build"]["Number"], 7);
        assert_eq!(context["Build"]["DeployTo"], "");
    }

    #[cfg(unix)]
    #[test]
    fn test_context_rejects_non_utf8_template_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut plugin = Plugin::default();
        plugin.config.template_file = Some(OsStr::from_bytes(b"card\xff.tmpl").into());

        assert!(plugin.to_context().is_err());
    }
}
