//! Toast lifecycle registry.
//!
//! Owns the mapping from toast identifier to live toast state, routes
//! commands crossing the host boundary to the correct underlying instance,
//! and reclaims entries for closed toasts after a grace delay so that
//! commands already in flight when a toast closed still resolve cleanly.
//!
//! The registry is a single-task actor: one `mpsc` queue carries caller
//! commands and the registry's own internal events (close notices, reap
//! timers), so every mutation of the entry map happens on one task with no
//! locks and in arrival order.

pub mod config;
pub mod error;
pub mod id;
pub mod service;

pub use config::{RegistryConfig, ToastConfig};
pub use error::ShowError;
pub use id::ToastId;
pub use service::{Command, RegistryService, ServiceHandle, ServicePort, ServiceStopped, ToastStatus};
