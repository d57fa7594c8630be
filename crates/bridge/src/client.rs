use crouton_registry::{Command, ServicePort, ShowError, ToastConfig, ToastId, ToastStatus};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::handle::ToastHandle;

/// Cloneable client for a running toast registry.
///
/// Commands addressed to unknown or already-closed toasts answer with a
/// negative or absent value; a stopped registry behaves the same way for
/// everything except `show`, which reports [`ShowError::Unavailable`].
#[derive(Clone, Debug)]
pub struct BridgeClient {
	port: ServicePort,
}

impl BridgeClient {
	/// Wraps a service port handed out by the registry.
	pub fn new(port: ServicePort) -> Self {
		Self { port }
	}

	/// Shows a toast and returns a handle for its lifetime.
	///
	/// The config crosses the boundary in serialized form; rejections from
	/// the registry or the widget runtime come back unmodified.
	pub async fn show(&self, config: &ToastConfig) -> Result<ToastHandle, ShowError> {
		let payload = serde_json::to_string(config).map_err(|err| ShowError::InvalidConfig(err.to_string()))?;
		self.show_json(&payload).await
	}

	/// Shows a toast from an already serialized config object.
	pub async fn show_json(&self, payload: &str) -> Result<ToastHandle, ShowError> {
		let (reply_tx, reply_rx) = oneshot::channel();
		self.port
			.submit(Command::Show {
				config: payload.to_owned(),
				reply: reply_tx,
			})
			.await
			.map_err(|_| ShowError::Unavailable)?;
		let id = reply_rx.await.map_err(|_| ShowError::Unavailable)??;
		Ok(ToastHandle::new(id, self.clone()))
	}

	/// Freezes the toast's auto-close timer. False when the toast is
	/// unknown, already closed, or refuses.
	pub async fn pause(&self, id: &ToastId) -> bool {
		self.ask_flag(|reply| Command::Pause { id: id.clone(), reply }).await
	}

	/// Rearms the toast's auto-close timer. Same contract as `pause`.
	pub async fn resume(&self, id: &ToastId) -> bool {
		self.ask_flag(|reply| Command::Resume { id: id.clone(), reply }).await
	}

	/// Whether the toast is paused; `None` when the registry cannot tell
	/// (unknown id, already closed, or stopped service).
	pub async fn is_paused(&self, id: &ToastId) -> Option<bool> {
		let (reply_tx, reply_rx) = oneshot::channel();
		let submitted = self
			.port
			.submit(Command::IsPaused {
				id: id.clone(),
				reply: reply_tx,
			})
			.await;
		if submitted.is_err() {
			tracing::debug!(id = %id, "isPaused: registry stopped");
			return None;
		}
		reply_rx.await.unwrap_or(None)
	}

	/// Closes the toast, handing `result` to whatever listens for its
	/// outcome. False when there was nothing left to close.
	pub async fn close(&self, id: &ToastId, result: Option<Value>) -> bool {
		self.ask_flag(|reply| Command::Close {
			id: id.clone(),
			result,
			reply,
		})
		.await
	}

	/// Whether the id maps to a toast that has not closed.
	pub async fn is_active(&self, id: &ToastId) -> bool {
		self.ask_flag(|reply| Command::IsActive { id: id.clone(), reply }).await
	}

	/// Diagnostic snapshot of the registry's live entries. Empty when the
	/// registry has stopped.
	pub async fn snapshot(&self) -> Vec<ToastStatus> {
		let (reply_tx, reply_rx) = oneshot::channel();
		if self.port.submit(Command::Snapshot { reply: reply_tx }).await.is_err() {
			return Vec::new();
		}
		reply_rx.await.unwrap_or_default()
	}

	async fn ask_flag(&self, make: impl FnOnce(oneshot::Sender<bool>) -> Command) -> bool {
		let (reply_tx, reply_rx) = oneshot::channel();
		if self.port.submit(make(reply_tx)).await.is_err() {
			tracing::debug!("registry stopped; command answers false");
			return false;
		}
		reply_rx.await.unwrap_or(false)
	}
}
