//! Plugin execution
//!
//! Validates the configuration, renders the message and delivers it.

use herald_client::{DeliveryError, WebhookClient, WebhookTransport};
use herald_core::{ConfigError, Plugin, RenderError, Renderer};
use thiserror::Error;
use tracing::{debug, info};

/// Any failure that aborts a plugin run
#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to render message: {0}")]
    Render(#[from] RenderError),

    #[error("failed to deliver message: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Run the plugin once
///
/// # Returns
/// The number of webhooks the message was delivered to
///
/// # Errors
/// - [`PluginError::Config`] when no webhook is configured; nothing is rendered or sent
/// - [`PluginError::Render`] when the template cannot be rendered; nothing is sent
/// - [`PluginError::Delivery`] for the first endpoint that fails
pub async fn execute<T: WebhookTransport>(
    plugin: &Plugin,
    renderer: &Renderer,
    client: &WebhookClient<T>,
) -> Result<usize, PluginError> {
    plugin.config.validate()?;

    let message = renderer.render(plugin)?;
    debug!("Rendered message ({} bytes)", message.len());

    let delivered = client.send_all(&plugin.config.webhooks, &message).await?;
    info!(
        "Notified {} webhook(s) for {} build #{}",
        delivered, plugin.repo.full_name, plugin.build.number
    );

    Ok(delivered)
}
