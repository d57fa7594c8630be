use crouton_runtime::RuntimeError;
use thiserror::Error;

/// Failure modes for `show`.
///
/// Only `show` fails with an error: commands addressed to an unknown or
/// already-closed toast are an expected race and answer with a negative or
/// absent value instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShowError {
	/// The hosting surface is missing a required piece (no toast
	/// container mounted). A setup mistake, not retried.
	#[error("toast setup error: {0}")]
	Setup(String),
	/// The configuration payload was malformed or empty. Rejected before
	/// any call reaches the widget runtime.
	#[error("invalid toast configuration: {0}")]
	InvalidConfig(String),
	/// The widget runtime refused to show the toast. Propagated to the
	/// caller unmodified; the toast was not shown.
	#[error(transparent)]
	Runtime(#[from] RuntimeError),
	/// The registry service has been shut down.
	#[error("toast registry is not available")]
	Unavailable,
}
