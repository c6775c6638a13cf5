//! Wiring: store, transport and clock from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use duebell_core::{Config, SystemClock};
use duebell_notify::{Dispatcher, LogTransport, Transport, WebhookTransport};
use duebell_store::JsonFileTaskStore;

/// Pick the transport named by `transport.kind`.
pub fn build_transport(config: &Config) -> anyhow::Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.transport.kind.as_str() {
        "webhook" => {
            let url = config
                .transport
                .webhook_url
                .as_deref()
                .context("DUEBELL_WEBHOOK_URL is required for the webhook transport")?;
            Arc::new(
                WebhookTransport::new(url, &config.transport.webhook_headers)
                    .context("failed to configure webhook transport")?,
            )
        }
        "log" => Arc::new(LogTransport::new()),
        other => anyhow::bail!("unknown transport '{other}' (expected 'log' or 'webhook')"),
    };
    Ok(transport)
}

/// Build the dispatcher against the JSON file store and the wall clock.
pub fn build_dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let store = Arc::new(JsonFileTaskStore::new(&config.store.tasks_file));
    let transport = build_transport(config)?;
    info!(
        tasks_file = %config.store.tasks_file.display(),
        transport = transport.transport_name(),
        "dispatcher wired"
    );
    Dispatcher::from_config(store, transport, Arc::new(SystemClock), &config.dispatch)
        .context("failed to build dispatcher")
}
