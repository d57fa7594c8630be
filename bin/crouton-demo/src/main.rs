//! Walks the toast lifecycle against the headless runtime with debug
//! logging enabled: show, pause/resume, explicit close with a result,
//! auto-close, and the grace-delay reap.

use std::time::Duration;

use crouton_bridge::{BridgeClient, ToastConfig};
use crouton_registry::{RegistryConfig, RegistryService};
use crouton_runtime::{HeadlessRuntime, Position};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
		.init();

	let (runtime, control) = HeadlessRuntime::new();
	let handle = RegistryService::spawn(
		runtime,
		RegistryConfig {
			grace_delay_ms: 300,
			..RegistryConfig::default()
		},
	);
	let client = BridgeClient::new(handle.port());

	let greeting = match client
		.show(&ToastConfig::message("Welcome back").with_position(Position::TopRight))
		.await
	{
		Ok(toast) => toast,
		Err(err) => {
			tracing::error!(%err, "could not show greeting toast");
			return;
		}
	};
	tracing::info!(id = %greeting.id(), position = ?control.position(), "greeting shown");

	greeting.pause().await;
	tracing::info!(paused = ?greeting.is_paused().await, "holding the greeting open");
	greeting.resume().await;

	if greeting.close(Some(json!({"acknowledged": true}))).await {
		tracing::info!(id = %greeting.id(), "greeting closed with a result");
	}

	match client
		.show(&ToastConfig::html("<b>Sync finished</b>").with_option("toastTimeout", json!(200)))
		.await
	{
		Ok(toast) => {
			tokio::time::sleep(Duration::from_millis(400)).await;
			tracing::info!(id = %toast.id(), active = toast.is_active().await, "after auto-close");
		}
		Err(err) => tracing::error!(%err, "could not show sync toast"),
	}

	// Let the grace timers run out before tearing down.
	tokio::time::sleep(Duration::from_millis(500)).await;
	tracing::info!(entries = client.snapshot().await.len(), "registry state before shutdown");
	handle.shutdown().await;
}
