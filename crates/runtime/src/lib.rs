//! Widget runtime seam for toast rendering backends.
//!
//! The registry never draws anything itself; it drives an implementation of
//! [`ToastRuntime`] that owns rendering, animation, and the auto-close timer.
//! This crate defines that seam plus a renderer-free [`headless`] backend that
//! executes the full toast lifecycle (pausable dwell timer, close notices)
//! without a display, for tests and host surfaces that bring their own
//! presentation layer.

pub mod error;
pub mod headless;
pub mod runtime;
pub mod types;

pub use error::RuntimeError;
pub use headless::{HeadlessControl, HeadlessRuntime};
pub use runtime::{RuntimeToast, Shown, ToastRuntime};
pub use types::{AutoDismiss, CloseNotice, CloseReason, Position, ShowRequest, ToastContent};
