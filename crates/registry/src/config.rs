//! Wire configuration for `show` and registry tuning knobs.

use std::time::Duration;

use crouton_runtime::{Position, ShowRequest, ToastContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ShowError;

/// Caller-supplied toast configuration as it crosses the boundary.
///
/// Field names follow the JSON interop payload (camelCase). Anything beyond
/// the known fields is captured in `extra` and passed through to the widget
/// runtime unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastConfig {
	/// Plain message content.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Rich message body. Takes precedence over `message` when both are set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message_html: Option<String>,
	/// Rich content for the action slot.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	/// Session-wide placement. Consumed by the registry and stripped
	/// before the config is forwarded; it affects every subsequently
	/// shown toast, not just this one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
	/// Options passed through unchanged to the widget runtime.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

impl ToastConfig {
	/// Config with a plain text message.
	pub fn message(message: impl Into<String>) -> Self {
		Self {
			message: Some(message.into()),
			..Self::default()
		}
	}

	/// Config with a rich message body.
	pub fn html(message_html: impl Into<String>) -> Self {
		Self {
			message_html: Some(message_html.into()),
			..Self::default()
		}
	}

	/// Sets rich content for the action slot.
	#[must_use]
	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	/// Sets session-wide placement.
	#[must_use]
	pub fn with_position(mut self, position: Position) -> Self {
		self.position = Some(position);
		self
	}

	/// Adds a pass-through option for the widget runtime.
	#[must_use]
	pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extra.insert(key.into(), value);
		self
	}

	/// Splits the config into its placement side effect and the request
	/// forwarded to the runtime, materializing rich content.
	///
	/// A config carrying neither `message` nor `messageHtml` has nothing
	/// to render and is rejected before any runtime call.
	pub fn into_request(self) -> Result<(Option<Position>, ShowRequest), ShowError> {
		let Self {
			message,
			message_html,
			action,
			position,
			extra,
		} = self;

		let content = match (message_html, message) {
			(Some(html), _) => ToastContent::Html(html),
			(None, Some(text)) => ToastContent::Text(text),
			(None, None) => {
				return Err(ShowError::InvalidConfig("config carries neither message nor messageHtml".into()));
			}
		};

		Ok((
			position,
			ShowRequest {
				content,
				action: action.map(ToastContent::Html),
				extra,
			},
		))
	}
}

/// Registry tuning knobs.
///
/// Deserializable so hosts can carry it inside their own config files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
	/// How long a closed entry lingers in the mapping before removal, in
	/// milliseconds. The window exists so commands already in flight when
	/// the toast closed still resolve against a known-closed entry
	/// instead of a missing one. The right value depends on how slow the
	/// host's boundary is; 1000 ms covers typical interop round trips.
	pub grace_delay_ms: u64,
	/// Capacity of the service command queue.
	pub command_capacity: usize,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			grace_delay_ms: 1_000,
			command_capacity: 64,
		}
	}
}

impl RegistryConfig {
	/// Grace delay as a [`Duration`].
	pub fn grace_delay(&self) -> Duration {
		Duration::from_millis(self.grace_delay_ms)
	}
}
