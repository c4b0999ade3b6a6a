//! Build domain types

use serde::Serialize;

/// Status reported for a passing build
pub const STATUS_SUCCESS: &str = "success";

/// Event assumed when the CI does not report one
pub const DEFAULT_EVENT: &str = "push";

/// Build being reported on
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Build {
    pub tag: String,
    pub event: String,
    pub number: i64,
    /// `success`, `failure`, `killed`, `error`, ...
    pub status: String,
    pub link: String,
    /// Unix timestamp (seconds)
    pub started: i64,
    /// Unix timestamp (seconds)
    pub finished: i64,
    #[serde(rename = "PR")]
    pub pull_request: String,
    /// Target environment of promotion and rollback pipelines
    pub deploy_to: String,
}

impl Build {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

impl Default for Build {
    fn default() -> Self {
        Self {
            tag: String::new(),
            event: DEFAULT_EVENT.to_string(),
            number: 0,
            status: STATUS_SUCCESS.to_string(),
            link: String::new(),
            started: 0,
            finished: 0,
            pull_request: String::new(),
            deploy_to: String::new(),
        }
    }
}
