//! Traits implemented by toast rendering backends.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::RuntimeError;
use crate::types::{CloseNotice, Position, ShowRequest};

/// Result of a successful [`ToastRuntime::show`].
pub struct Shown {
	/// Control handle for the live toast. Owned exclusively by the
	/// registry entry; never exposed to callers.
	pub toast: Box<dyn RuntimeToast>,
	/// Fires exactly once when the toast finishes closing, whatever the
	/// cause (timeout, user dismissal, explicit close).
	pub on_close: oneshot::Receiver<CloseNotice>,
}

impl std::fmt::Debug for Shown {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Shown").finish_non_exhaustive()
	}
}

/// A toast rendering backend.
///
/// Implementations own presentation and timing; the registry owns identity
/// and lifecycle state. All methods are invoked from the registry's single
/// service task, so implementations see calls strictly in order.
#[async_trait]
pub trait ToastRuntime: Send {
	/// Whether a container able to render toasts exists in the hosting
	/// surface. `show` must not be attempted while this is false.
	fn container_mounted(&self) -> bool;

	/// Applies placement for subsequently shown toasts. Session-wide, not
	/// per-toast.
	fn set_position(&mut self, position: Position);

	/// Renders a toast and returns its control handle plus close notice.
	async fn show(&mut self, request: ShowRequest) -> Result<Shown, RuntimeError>;
}

/// Control surface for one live toast instance.
///
/// Every operation may answer [`RuntimeError::Unsupported`] when the
/// backend's handle lacks the capability; callers treat that as a refusal,
/// not a failure.
#[async_trait]
pub trait RuntimeToast: Send {
	/// Freezes the auto-close timer.
	async fn pause(&mut self) -> Result<(), RuntimeError>;

	/// Rearms the auto-close timer.
	async fn resume(&mut self) -> Result<(), RuntimeError>;

	/// Whether the auto-close timer is currently frozen.
	async fn is_paused(&mut self) -> Result<bool, RuntimeError>;

	/// Closes the toast, carrying an optional opaque result payload.
	async fn close(&mut self, result: Option<Value>) -> Result<(), RuntimeError>;
}
