//! Core domain types
//!
//! Flat metadata describing one CI build: configuration, repository, commit
//! and build facts, grouped into the [`Plugin`](plugin::Plugin) aggregate.

pub mod build;
pub mod commit;
pub mod config;
pub mod plugin;
pub mod repo;

pub use build::Build;
pub use commit::{Commit, preprocess_commit_message};
pub use config::Config;
pub use plugin::Plugin;
pub use repo::Repo;
