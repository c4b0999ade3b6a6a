//! Configuration module
//!
//! Maps CLI flags and CI environment variables onto the plugin metadata.
//! Every flag has a primary environment variable handled by clap; a few
//! also accept legacy aliases, resolved after parsing.

use anyhow::Result;
use clap::Parser;
use herald_client::{DeliveryOptions, StatusPolicy};
use herald_core::domain::{Build, Commit, Config, Plugin, Repo, preprocess_commit_message};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface
#[derive(Debug, Clone, Parser)]
#[command(name = "herald")]
#[command(version, about = "Send CI build notifications to chat webhooks", long_about = None)]
pub struct Cli {
    // =========================================================================
    // Plugin
    // =========================================================================
    /// Log request and response bodies
    #[arg(long, env = "PLUGIN_DEBUG")]
    pub debug: bool,

    /// Webhook URL; repeat or comma-separate for several
    #[arg(long = "webhook", env = "PLUGIN_WEBHOOK", value_delimiter = ',')]
    pub webhooks: Vec<String>,

    /// Inline message template
    #[arg(long, env = "PLUGIN_MESSAGE")]
    pub message: Option<String>,

    /// Template file path; wins over --message
    #[arg(long, env = "PLUGIN_TEMPLATE_FILE")]
    pub template_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "PLUGIN_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Only treat connection errors as failures, not HTTP error statuses
    #[arg(long, env = "PLUGIN_IGNORE_STATUS")]
    pub ignore_status: bool,

    // =========================================================================
    // Repository
    // =========================================================================
    /// Repository owner and name
    #[arg(long, env = "DRONE_REPO", default_value = "")]
    pub repo_fullname: String,

    /// Repository link
    #[arg(long, env = "DRONE_REPO_LINK", default_value = "")]
    pub repo_link: String,

    /// Repository namespace
    #[arg(long, env = "DRONE_REPO_NAMESPACE")]
    pub repo_namespace: Option<String>,

    /// Repository name
    #[arg(long, env = "DRONE_REPO_NAME", default_value = "")]
    pub repo_name: String,

    // =========================================================================
    // Commit
    // =========================================================================
    /// Git commit sha
    #[arg(long, env = "DRONE_COMMIT_SHA", default_value = "")]
    pub commit_sha: String,

    /// Git commit ref
    #[arg(long, env = "DRONE_COMMIT_REF", default_value = "")]
    pub commit_ref: String,

    /// Git commit branch
    #[arg(long, env = "DRONE_COMMIT_BRANCH", default_value = "master")]
    pub commit_branch: String,

    /// Git commit link
    #[arg(long, env = "DRONE_COMMIT_LINK", default_value = "")]
    pub commit_link: String,

    /// Git author name
    #[arg(long, env = "DRONE_COMMIT_AUTHOR", default_value = "")]
    pub commit_author_name: String,

    /// Git author email
    #[arg(long, env = "DRONE_COMMIT_AUTHOR_EMAIL", default_value = "")]
    pub commit_author_email: String,

    /// Git author avatar
    #[arg(long, env = "DRONE_COMMIT_AUTHOR_AVATAR", default_value = "")]
    pub commit_author_avatar: String,

    /// Commit message
    #[arg(long, env = "DRONE_COMMIT_MESSAGE", default_value = "")]
    pub commit_message: String,

    // =========================================================================
    // Build
    // =========================================================================
    /// Build tag
    #[arg(long, env = "DRONE_TAG", default_value = "")]
    pub build_tag: String,

    /// Build event
    #[arg(long, env = "DRONE_BUILD_EVENT", default_value = "push")]
    pub build_event: String,

    /// Build number
    #[arg(long, env = "DRONE_BUILD_NUMBER", default_value_t = 0)]
    pub build_number: i64,

    /// Build status
    #[arg(long, env = "DRONE_BUILD_STATUS", default_value = "success")]
    pub build_status: String,

    /// Build link
    #[arg(long, env = "DRONE_BUILD_LINK", default_value = "")]
    pub build_link: String,

    /// Build start time (unix seconds)
    #[arg(long, env = "DRONE_BUILD_STARTED", default_value_t = 0, allow_hyphen_values = true)]
    pub build_started: i64,

    /// Build finish time (unix seconds)
    #[arg(long, env = "DRONE_BUILD_FINISHED", default_value_t = 0, allow_hyphen_values = true)]
    pub build_finished: i64,

    /// Pull request number
    #[arg(long, env = "DRONE_PULL_REQUEST", default_value = "")]
    pub pull_request: String,

    /// Target deployment environment (promotion and rollback pipelines only)
    #[arg(long, env = "DRONE_DEPLOY_TO", default_value = "")]
    pub deploy_to: String,
}

impl Cli {
    /// Fills unset values from secondary environment variables
    ///
    /// - `DEBUG` for `PLUGIN_DEBUG`
    /// - `FEISHU_WEBHOOK`, `FEISHU_MESSAGE`, `FEISHU_TEMPLATE_FILE`
    /// - `DRONE_REPO_OWNER` for `DRONE_REPO_NAMESPACE`
    ///
    /// `lookup` reads a variable; `main` passes `std::env::var`.
    pub fn resolve_aliases<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if !self.debug {
            self.debug = lookup("DEBUG").is_some_and(|value| is_truthy_flag(&value));
        }
        if self.webhooks.is_empty() {
            self.webhooks = lookup("FEISHU_WEBHOOK")
                .map(|value| split_list(&value))
                .unwrap_or_default();
        }
        self.webhooks = self
            .webhooks
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if self.message.is_none() {
            self.message = lookup("FEISHU_MESSAGE");
        }
        if self.template_file.is_none() {
            self.template_file = lookup("FEISHU_TEMPLATE_FILE").map(PathBuf::from);
        }
        if self.repo_namespace.is_none() {
            self.repo_namespace = lookup("DRONE_REPO_OWNER");
        }
        self
    }

    /// Validates settings that clap cannot express
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            anyhow::bail!("timeout must be greater than 0");
        }
        Ok(())
    }

    pub fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            debug: self.debug,
            timeout: Duration::from_secs(self.timeout),
            status_policy: if self.ignore_status {
                StatusPolicy::TransportOnly
            } else {
                StatusPolicy::RequireSuccess
            },
        }
    }

    /// Builds the metadata aggregate handed to the renderer
    pub fn to_plugin(&self) -> Plugin {
        Plugin {
            config: Config {
                debug: self.debug,
                webhooks: self.webhooks.clone(),
                message: self.message.clone().filter(|m| !m.is_empty()),
                template_file: self.template_file.clone(),
            },
            repo: Repo {
                full_name: self.repo_fullname.clone(),
                link: self.repo_link.clone(),
                namespace: self.repo_namespace.clone().unwrap_or_default(),
                name: self.repo_name.clone(),
            },
            commit: Commit {
                sha: self.commit_sha.clone(),
                git_ref: self.commit_ref.clone(),
                branch: self.commit_branch.clone(),
                link: self.commit_link.clone(),
                message: preprocess_commit_message(&self.commit_message),
                author_name: self.commit_author_name.clone(),
                author_email: self.commit_author_email.clone(),
                author_avatar: self.commit_author_avatar.clone(),
            },
            build: Build {
                tag: self.build_tag.clone(),
                event: self.build_event.clone(),
                number: self.build_number,
                status: self.build_status.clone(),
                link: self.build_link.clone(),
                started: self.build_started,
                finished: self.build_finished,
                pull_request: self.pull_request.clone(),
                deploy_to: self.deploy_to.clone(),
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn is_truthy_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
