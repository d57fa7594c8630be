use thiserror::Error;

/// Errors surfaced by a toast rendering backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuntimeError {
	/// No toast container is mounted in the hosting surface.
	#[error("toast container is not mounted in the hosting surface")]
	ContainerMissing,
	/// The toast handle does not support the requested operation.
	#[error("toast handle does not support {0}")]
	Unsupported(&'static str),
	/// The backend refused the request.
	#[error("widget runtime rejected the request: {0}")]
	Rejected(String),
	/// The underlying toast instance is already gone.
	#[error("toast instance is gone")]
	Gone,
}
