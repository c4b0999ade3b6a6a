//! Herald Core
//!
//! Core types and rendering for the Herald CI notifier.
//!
//! This crate contains:
//! - Domain types: build metadata gathered from the CI (Config, Repo, Commit, Build)
//! - Template engine: renders the notification message from that metadata

pub mod domain;
pub mod error;
pub mod template;

pub use domain::Plugin;
pub use error::{ConfigError, RenderError};
pub use template::{DEFAULT_TEMPLATE, Renderer};
