//! Message rendering
//!
//! Picks the template source for an invocation, parses it and substitutes
//! the build metadata into it.

mod builtins;
mod context;
mod default;
mod helpers;
mod layout;
mod parser;

pub use builtins::{format_duration, format_timestamp};
pub use context::{RenderContext, display_value, is_truthy};
pub use default::DEFAULT_TEMPLATE;
pub use helpers::{BlockHelper, Helper, HelperRegistry};
pub use layout::{to_strftime, to_strftime_utc};
pub use parser::{Expression, Node, Param, Template};

use serde_json::Value;
use std::fs;
use tracing::debug;

use crate::domain::{Config, Plugin};
use crate::error::RenderError;

/// Resolve the template source for this configuration
///
/// Precedence: template file, then inline message, then [`DEFAULT_TEMPLATE`].
/// A configured file that cannot be read is an error. A file that is empty
/// falls back to the default template.
pub fn select_source(config: &Config) -> Result<String, RenderError> {
    if let Some(path) = &config.template_file {
        debug!("Loading template from {}", path.display());
        let source = fs::read_to_string(path).map_err(|source| RenderError::TemplateFile {
            path: path.clone(),
            source,
        })?;
        if source.trim().is_empty() {
            debug!("Template file is empty, using default template");
            return Ok(DEFAULT_TEMPLATE.to_string());
        }
        return Ok(source);
    }

    match &config.message {
        Some(message) if !message.is_empty() => Ok(message.clone()),
        _ => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Renders templates against build metadata
pub struct Renderer {
    helpers: HelperRegistry,
}

impl Renderer {
    /// Creates a renderer with the built-in helpers
    pub fn new() -> Self {
        Self::with_helpers(HelperRegistry::with_builtins())
    }

    /// Creates a renderer with a custom helper registry
    pub fn with_helpers(helpers: HelperRegistry) -> Self {
        Self { helpers }
    }

    /// Render the message for this invocation
    ///
    /// The template source is chosen by [`select_source`].
    pub fn render(&self, plugin: &Plugin) -> Result<String, RenderError> {
        let source = select_source(&plugin.config)?;
        self.render_template(&source, plugin)
    }

    /// Render a given template source; the output is trimmed
    pub fn render_template(&self, source: &str, plugin: &Plugin) -> Result<String, RenderError> {
        let template = Template::parse(source)?;
        let context = RenderContext::new(plugin)?;
        let mut out = String::with_capacity(source.len());
        self.render_nodes(template.nodes(), &context, &mut out)?;
        Ok(out.trim().to_string())
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        context: &RenderContext,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expression(expression) => {
                    out.push_str(&self.evaluate(expression, context)?);
                }
                Node::Block {
                    expression,
                    body,
                    inverse,
                } => {
                    let helper = self.helpers.get_block(&expression.name).ok_or_else(|| {
                        RenderError::UnknownHelper {
                            name: expression.name.clone(),
                        }
                    })?;
                    let args = resolve_params(&expression.params, context)?;
                    let branch = if helper.test(&args, context)? {
                        body
                    } else {
                        inverse
                    };
                    self.render_nodes(branch, context, out)?;
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, expression: &Expression, context: &RenderContext) -> Result<String, RenderError> {
        if let Some(helper) = self.helpers.get(&expression.name) {
            let args = resolve_params(&expression.params, context)?;
            return helper.call(&args, context);
        }

        if !expression.params.is_empty() || self.helpers.get_block(&expression.name).is_some() {
            return Err(RenderError::UnknownHelper {
                name: expression.name.clone(),
            });
        }

        context
            .lookup(&expression.name)
            .map(display_value)
            .ok_or_else(|| RenderError::UnknownVariable {
                path: expression.name.clone(),
            })
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_params(params: &[Param], context: &RenderContext) -> Result<Vec<Value>, RenderError> {
    params
        .iter()
        .map(|param| match param {
            Param::Literal(value) => Ok(value.clone()),
            Param::Path(path) => {
                context
                    .lookup(path)
                    .cloned()
                    .ok_or_else(|| RenderError::UnknownVariable { path: path.clone() })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Build, Commit, Repo, preprocess_commit_message};
    use std::io::Write;

    fn plugin(status: &str) -> Plugin {
        Plugin {
            config: Config {
                webhooks: vec!["https://open.feishu.cn/open-apis/bot/v2/hook/abc".to_string()],
                ..Default::default()
            },
            repo: Repo {
                full_name: "octocat/hello-world".to_string(),
                link: "https://github.com/octocat/hello-world".to_string(),
                namespace: "octocat".to_string(),
                name: "hello-world".to_string(),
            },
            commit: Commit {
                sha: "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d".to_string(),
                git_ref: "refs/heads/main".to_string(),
                branch: "main".to_string(),
                author_name: "Mona".to_string(),
                message: preprocess_commit_message("Fix \"quoted\" bug\n\nBody line\n"),
                ..Default::default()
            },
            build: Build {
                number: 42,
                status: status.to_string(),
                link: "https://ci.example.com/octocat/hello-world/42".to_string(),
                started: 0,
                finished: 90,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_default_template_renders_valid_json() {
        let rendered = Renderer::new().render(&plugin("success")).unwrap();
        let card: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(card["msg_type"], "interactive");
        assert_eq!(card["card"]["header"]["title"]["content"], "octocat/hello-world");
        assert_eq!(
            card["card"]["elements"][0]["content"],
            "✅ Build [#42](https://ci.example.com/octocat/hello-world/42) success.\n📝 Commit by Mona on main:\nFix \"quoted\" bug\n\nBody line"
        );
        assert_eq!(
            card["card"]["elements"][1]["elements"][0]["content"],
            "@1970-01-01 00:00:00 to @1970-01-01 00:01:30."
        );
        assert!(!rendered.contains("{{"));
        assert!(!rendered.contains("Build.") && !rendered.contains("Repo.") && !rendered.contains("Commit."));
    }

    #[test]
    fn test_default_template_failure_marker() {
        let rendered = Renderer::new().render(&plugin("failure")).unwrap();
        assert!(rendered.contains("❌"));
        assert!(!rendered.contains("✅"));
        serde_json::from_str::<Value>(&rendered).unwrap();
    }

    #[test]
    fn test_status_branches_are_exclusive() {
        let source = "{{#success Build.Status}}PASS{{/success}}{{#failure Build.Status}}FAIL{{/failure}}";
        let renderer = Renderer::new();

        assert_eq!(renderer.render_template(source, &plugin("success")).unwrap(), "PASS");
        for status in ["failure", "killed", "error"] {
            assert_eq!(renderer.render_template(source, &plugin(status)).unwrap(), "FAIL");
        }
    }

    #[test]
    fn test_block_else_branch() {
        let source = "{{#if Build.Tag}}tag {{ Build.Tag }}{{else}}no tag{{/if}}";
        let renderer = Renderer::new();
        assert_eq!(renderer.render_template(source, &plugin("success")).unwrap(), "no tag");

        let mut tagged = plugin("success");
        tagged.build.tag = "v1.0.0".to_string();
        assert_eq!(renderer.render_template(source, &tagged).unwrap(), "tag v1.0.0");
    }

    #[test]
    fn test_output_is_trimmed() {
        let rendered = Renderer::new()
            .render_template("\n\n  {{ Repo.Name }}  \n", &plugin("success"))
            .unwrap();
        assert_eq!(rendered, "hello-world");
    }

    #[test]
    fn test_helpers_in_inline_message() {
        let mut plugin = plugin("failure");
        plugin.config.message = Some(
            "{{ uppercasefirst Build.Status }} after {{ duration Build.Started Build.Finished }} ({{ truncate Commit.Sha 7 }})"
                .to_string(),
        );
        let rendered = Renderer::new().render(&plugin).unwrap();
        assert_eq!(rendered, "Failure after 1m30s (7fd1a60)");
    }

    #[test]
    fn test_drone_helpers_in_template() {
        let source = r#"{{ regexReplace "^refs/heads/" Commit.Ref "" }} {{ urlencode "a b" }}"#;
        let rendered = Renderer::new().render_template(source, &plugin("success")).unwrap();
        assert_eq!(rendered, "main a+b");
    }

    #[test]
    fn test_unknown_helper_and_variable() {
        let renderer = Renderer::new();
        let plugin = plugin("success");

        assert!(matches!(
            renderer.render_template("{{ shout Repo.Name }}", &plugin),
            Err(RenderError::UnknownHelper { name }) if name == "shout"
        ));
        assert!(matches!(
            renderer.render_template("{{#nope Repo.Name}}x{{/nope}}", &plugin),
            Err(RenderError::UnknownHelper { .. })
        ));
        assert!(matches!(
            renderer.render_template("{{ Repo.Missing }}", &plugin),
            Err(RenderError::UnknownVariable { path }) if path == "Repo.Missing"
        ));
        assert!(matches!(
            renderer.render_template("{{ success }}", &plugin),
            Err(RenderError::UnknownHelper { .. })
        ));
    }

    #[test]
    fn test_malformed_template_fails() {
        let renderer = Renderer::new();
        let plugin = plugin("success");
        assert!(renderer.render_template("{{ Repo.Name", &plugin).is_err());
        assert!(renderer.render_template("{{#success Build.Status}}", &plugin).is_err());
        assert!(renderer
            .render_template("{{ datetime Build.Started }}", &plugin)
            .is_err());
    }

    #[test]
    fn test_select_source_inline_message() {
        let config = Config {
            message: Some("{{ Repo.Name }}".to_string()),
            ..Default::default()
        };
        assert_eq!(select_source(&config).unwrap(), "{{ Repo.Name }}");
    }

    #[test]
    fn test_select_source_default() {
        assert_eq!(select_source(&Config::default()).unwrap(), DEFAULT_TEMPLATE);

        let config = Config {
            message: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(select_source(&config).unwrap(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_template_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from file: {{{{ Repo.FullName }}}}").unwrap();

        let mut plugin = plugin("success");
        plugin.config.message = Some("inline".to_string());
        plugin.config.template_file = Some(file.path().to_path_buf());

        let rendered = Renderer::new().render(&plugin).unwrap();
        assert_eq!(rendered, "from file: octocat/hello-world");
    }

    #[test]
    fn test_empty_template_file_uses_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config {
            message: Some("inline".to_string()),
            template_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(select_source(&config).unwrap(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_missing_template_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            template_file: Some(dir.path().join("missing.tmpl")),
            ..Default::default()
        };
        assert!(matches!(
            select_source(&config),
            Err(RenderError::TemplateFile { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unserializable_metadata_is_reported() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"card\xff.tmpl"));
        std::fs::write(&path, "{{ Repo.FullName }}").unwrap();

        let mut plugin = plugin("success");
        plugin.config.template_file = Some(path);

        assert!(matches!(
            Renderer::new().render(&plugin),
            Err(RenderError::Context(_))
        ));
    }
}
