use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Renderable content handed to the runtime.
///
/// Rich-content config fields are materialized into `Html` before the
/// runtime sees them; plain messages arrive as `Text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastContent {
	/// Plain text content.
	Text(String),
	/// Markup content rendered by the backend.
	Html(String),
}

impl ToastContent {
	/// Returns the raw string regardless of flavor.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Text(s) | Self::Html(s) => s,
		}
	}
}

/// Session-wide placement for subsequently shown toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Position {
	TopLeft,
	TopCenter,
	TopRight,
	BottomLeft,
	BottomCenter,
	/// Default placement. Toasts stack from the bottom-right corner.
	#[default]
	BottomRight,
}

/// Controls automatic dismissal of a shown toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoDismiss {
	/// Toast remains visible until closed or dismissed.
	Never,
	/// Toast automatically closes after the specified dwell.
	After(Duration),
}

impl AutoDismiss {
	/// Default dwell before auto-close (4 seconds).
	pub const DEFAULT: Self = Self::After(Duration::from_secs(4));
}

impl Default for AutoDismiss {
	fn default() -> Self {
		Self::DEFAULT
	}
}

/// Fully materialized request forwarded to the runtime by the registry.
///
/// `position` never appears here: it is consumed registry-side and applied
/// session-wide through [`crate::ToastRuntime::set_position`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShowRequest {
	/// Main toast content.
	pub content: ToastContent,
	/// Optional content for the action slot.
	pub action: Option<ToastContent>,
	/// Options passed through unchanged from the caller's config.
	pub extra: serde_json::Map<String, Value>,
}

impl ShowRequest {
	/// Derives the auto-close behavior from pass-through options.
	///
	/// Honors `autoClose` (bool, default true) and `toastTimeout`
	/// (milliseconds) the way the upstream toast widget reads them.
	pub fn auto_dismiss(&self) -> AutoDismiss {
		let enabled = self
			.extra
			.get("autoClose")
			.and_then(Value::as_bool)
			.unwrap_or(true);
		if !enabled {
			return AutoDismiss::Never;
		}
		match self.extra.get("toastTimeout").and_then(Value::as_u64) {
			Some(ms) => AutoDismiss::After(Duration::from_millis(ms)),
			None => AutoDismiss::DEFAULT,
		}
	}
}

/// Why a toast finished closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
	/// Dwell timer expired.
	AutoClosed,
	/// The user dismissed the toast from the rendering surface.
	Dismissed,
	/// Closed programmatically through the registry.
	Closed,
}

/// Completion notice emitted by the runtime exactly once per toast.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseNotice {
	/// What caused the closure.
	pub reason: CloseReason,
	/// Opaque payload from an explicit close, handed to whoever listens
	/// for the toast's outcome. Never interpreted by the registry.
	pub result: Option<Value>,
}
