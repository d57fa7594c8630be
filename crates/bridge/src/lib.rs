//! Caller-side toast boundary.
//!
//! [`BridgeClient`] is the host's port onto a running toast registry: it
//! serializes configs, submits commands by identifier, and relays the
//! registry's answers unchanged. [`ToastHandle`] is the capability returned
//! by `show` — it carries nothing but the assigned id and a clone of the
//! client, so dropping it never affects the toast.

mod client;
mod handle;

pub use client::BridgeClient;
pub use handle::ToastHandle;

pub use crouton_registry::{ShowError, ToastConfig, ToastId, ToastStatus};
