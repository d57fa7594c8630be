use crouton_registry::ToastId;
use serde_json::Value;

use crate::client::BridgeClient;

/// Capability object for one shown toast.
///
/// Holds only the assigned identifier and a client clone; every call
/// forwards across the boundary and relays the registry's answer
/// unchanged. The toast outlives the handle — dropping this does nothing.
#[derive(Clone, Debug)]
pub struct ToastHandle {
	id: ToastId,
	client: BridgeClient,
}

impl ToastHandle {
	pub(crate) fn new(id: ToastId, client: BridgeClient) -> Self {
		Self { id, client }
	}

	/// The toast's identifier.
	pub fn id(&self) -> &ToastId {
		&self.id
	}

	/// Freezes the auto-close timer.
	pub async fn pause(&self) -> bool {
		self.client.pause(&self.id).await
	}

	/// Rearms the auto-close timer.
	pub async fn resume(&self) -> bool {
		self.client.resume(&self.id).await
	}

	/// Whether the toast is paused; `None` once it is gone.
	pub async fn is_paused(&self) -> Option<bool> {
		self.client.is_paused(&self.id).await
	}

	/// Closes the toast with an optional result payload.
	pub async fn close(&self, result: Option<Value>) -> bool {
		self.client.close(&self.id, result).await
	}

	/// Whether the toast is still open.
	pub async fn is_active(&self) -> bool {
		self.client.is_active(&self.id).await
	}
}
