//! Herald CLI
//!
//! CI pipeline step that renders a build notification and posts it to one
//! or more chat webhooks.

mod config;
mod plugin;

use anyhow::Result;
use clap::Parser;
use colored::*;
use herald_client::WebhookClient;
use herald_core::Renderer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse().resolve_aliases(|name| std::env::var(name).ok());

    init_tracing(cli.debug);
    cli.validate()?;

    let plugin = cli.to_plugin();
    let client = WebhookClient::new(cli.delivery_options())?;
    let renderer = Renderer::new();

    let delivered = plugin::execute(&plugin, &renderer, &client).await?;

    println!(
        "{} {}",
        "✓".green(),
        format!("Notification sent to {} webhook(s)", delivered).bold()
    );
    Ok(())
}

/// Initialize logging
///
/// `RUST_LOG` wins; otherwise `--debug` raises the herald crates to debug.
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "herald=debug,herald_client=debug,herald_core=debug"
    } else {
        "herald=info,herald_client=info,herald_core=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
