use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one in-flight toast.
///
/// The only capability callers ever hold. Unique for the lifetime of the
/// registry; the embedded counter makes successive ids distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(String);

impl ToastId {
	/// Returns the wire representation, e.g. `toast-7`.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ToastId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for ToastId {
	fn from(raw: String) -> Self {
		Self(raw)
	}
}

impl From<&str> for ToastId {
	fn from(raw: &str) -> Self {
		Self(raw.to_owned())
	}
}

/// Mints `toast-N` identifiers from a monotonically increasing counter.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct IdMinter(u64);

impl IdMinter {
	pub(crate) const fn new() -> Self {
		Self(0)
	}

	pub(crate) fn mint(&mut self) -> ToastId {
		self.0 += 1;
		ToastId(format!("toast-{}", self.0))
	}
}
