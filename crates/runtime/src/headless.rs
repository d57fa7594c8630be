//! Renderer-free toast backend.
//!
//! Executes the real toast lifecycle (pausable dwell timer, close notices,
//! capability refusals) without drawing anything. Each shown toast is one
//! spawned task owning its timer; control handles talk to it over an
//! unbounded command channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::error::RuntimeError;
use crate::runtime::{RuntimeToast, Shown, ToastRuntime};
use crate::types::{AutoDismiss, CloseNotice, CloseReason, Position, ShowRequest};

/// Operations a headless toast handle admits.
///
/// Defaults to everything; tests narrow it to model backend handles that
/// lack pause/resume/close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
	pub pause: bool,
	pub resume: bool,
	pub is_paused: bool,
	pub close: bool,
}

impl Default for Capabilities {
	fn default() -> Self {
		Self {
			pause: true,
			resume: true,
			is_paused: true,
			close: true,
		}
	}
}

enum TimerCmd {
	Pause(oneshot::Sender<()>),
	Resume(oneshot::Sender<()>),
	IsPaused(oneshot::Sender<bool>),
	Close(Option<Value>, oneshot::Sender<()>),
	Dismiss,
}

struct HeadlessState {
	mounted: bool,
	position: Position,
	capabilities: Capabilities,
	requests: Vec<ShowRequest>,
	toasts: Vec<mpsc::UnboundedSender<TimerCmd>>,
	fail_next: Option<String>,
}

/// Toast backend that runs timers but renders nothing.
pub struct HeadlessRuntime {
	state: Arc<Mutex<HeadlessState>>,
}

/// Out-of-band control over a [`HeadlessRuntime`].
///
/// Stands in for the hosting surface: mounts and unmounts the container,
/// dismisses toasts the way a user click would, and inspects what the
/// registry forwarded.
#[derive(Clone)]
pub struct HeadlessControl {
	state: Arc<Mutex<HeadlessState>>,
}

fn lock(state: &Arc<Mutex<HeadlessState>>) -> MutexGuard<'_, HeadlessState> {
	state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HeadlessRuntime {
	/// Creates a runtime with a mounted container and its control handle.
	pub fn new() -> (Self, HeadlessControl) {
		let state = Arc::new(Mutex::new(HeadlessState {
			mounted: true,
			position: Position::default(),
			capabilities: Capabilities::default(),
			requests: Vec::new(),
			toasts: Vec::new(),
			fail_next: None,
		}));
		let control = HeadlessControl {
			state: Arc::clone(&state),
		};
		(Self { state }, control)
	}
}

#[async_trait]
impl ToastRuntime for HeadlessRuntime {
	fn container_mounted(&self) -> bool {
		lock(&self.state).mounted
	}

	fn set_position(&mut self, position: Position) {
		lock(&self.state).position = position;
	}

	async fn show(&mut self, request: ShowRequest) -> Result<Shown, RuntimeError> {
		let dismiss = request.auto_dismiss();
		let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
		let capabilities = {
			let mut state = lock(&self.state);
			if !state.mounted {
				return Err(RuntimeError::ContainerMissing);
			}
			if let Some(message) = state.fail_next.take() {
				return Err(RuntimeError::Rejected(message));
			}
			state.requests.push(request.clone());
			state.toasts.push(cmd_tx.clone());
			state.capabilities
		};

		let (notice_tx, notice_rx) = oneshot::channel();
		tokio::spawn(run_toast(dismiss, cmd_rx, notice_tx));
		tracing::debug!(?dismiss, content = request.content.as_str(), "headless toast shown");

		Ok(Shown {
			toast: Box::new(HeadlessToast {
				capabilities,
				tx: cmd_tx,
			}),
			on_close: notice_rx,
		})
	}
}

impl HeadlessControl {
	/// Mounts the toast container.
	pub fn mount(&self) {
		lock(&self.state).mounted = true;
	}

	/// Unmounts the toast container. Subsequent `show` calls fail with
	/// [`RuntimeError::ContainerMissing`].
	pub fn unmount(&self) {
		lock(&self.state).mounted = false;
	}

	/// Current session-wide placement.
	pub fn position(&self) -> Position {
		lock(&self.state).position
	}

	/// Capability mask applied to subsequently shown toasts.
	pub fn set_capabilities(&self, capabilities: Capabilities) {
		lock(&self.state).capabilities = capabilities;
	}

	/// Makes the next `show` call fail with the given rejection message.
	pub fn fail_next_show(&self, message: impl Into<String>) {
		lock(&self.state).fail_next = Some(message.into());
	}

	/// Number of toasts shown so far.
	pub fn shown(&self) -> usize {
		lock(&self.state).requests.len()
	}

	/// The most recently forwarded show request.
	pub fn last_request(&self) -> Option<ShowRequest> {
		lock(&self.state).requests.last().cloned()
	}

	/// Dismisses the nth shown toast as a user interaction would.
	///
	/// Returns false if that toast's timer task has already ended.
	pub fn dismiss(&self, index: usize) -> bool {
		let sender = lock(&self.state).toasts.get(index).cloned();
		match sender {
			Some(tx) => tx.send(TimerCmd::Dismiss).is_ok(),
			None => false,
		}
	}
}

struct HeadlessToast {
	capabilities: Capabilities,
	tx: mpsc::UnboundedSender<TimerCmd>,
}

impl HeadlessToast {
	fn send(&self, cmd: TimerCmd) -> Result<(), RuntimeError> {
		self.tx.send(cmd).map_err(|_| RuntimeError::Gone)
	}
}

#[async_trait]
impl RuntimeToast for HeadlessToast {
	async fn pause(&mut self) -> Result<(), RuntimeError> {
		if !self.capabilities.pause {
			return Err(RuntimeError::Unsupported("pause"));
		}
		let (reply_tx, reply_rx) = oneshot::channel();
		self.send(TimerCmd::Pause(reply_tx))?;
		reply_rx.await.map_err(|_| RuntimeError::Gone)
	}

	async fn resume(&mut self) -> Result<(), RuntimeError> {
		if !self.capabilities.resume {
			return Err(RuntimeError::Unsupported("resume"));
		}
		let (reply_tx, reply_rx) = oneshot::channel();
		self.send(TimerCmd::Resume(reply_tx))?;
		reply_rx.await.map_err(|_| RuntimeError::Gone)
	}

	async fn is_paused(&mut self) -> Result<bool, RuntimeError> {
		if !self.capabilities.is_paused {
			return Err(RuntimeError::Unsupported("isPaused"));
		}
		let (reply_tx, reply_rx) = oneshot::channel();
		self.send(TimerCmd::IsPaused(reply_tx))?;
		reply_rx.await.map_err(|_| RuntimeError::Gone)
	}

	async fn close(&mut self, result: Option<Value>) -> Result<(), RuntimeError> {
		if !self.capabilities.close {
			return Err(RuntimeError::Unsupported("close"));
		}
		let (reply_tx, reply_rx) = oneshot::channel();
		self.send(TimerCmd::Close(result, reply_tx))?;
		reply_rx.await.map_err(|_| RuntimeError::Gone)
	}
}

/// Timer task for one toast.
///
/// Owns the dwell deadline; pause freezes the remaining dwell, resume
/// rearms it from now. Emits exactly one close notice, then exits.
async fn run_toast(dismiss: AutoDismiss, mut rx: mpsc::UnboundedReceiver<TimerCmd>, notice_tx: oneshot::Sender<CloseNotice>) {
	let mut paused = false;
	let mut deadline = match dismiss {
		AutoDismiss::After(dwell) => Some(Instant::now() + dwell),
		AutoDismiss::Never => None,
	};
	let mut remaining: Option<Duration> = None;

	let notice = loop {
		let cmd = tokio::select! {
			cmd = rx.recv() => cmd,
			() = dwell_expiry(deadline, paused) => {
				break CloseNotice {
					reason: CloseReason::AutoClosed,
					result: None,
				};
			}
		};
		match cmd {
			// Every control handle dropped without a close: the toast's
			// owner is gone, end quietly without a notice.
			None => return,
			Some(TimerCmd::Pause(reply)) => {
				if !paused {
					paused = true;
					if let Some(at) = deadline {
						remaining = Some(at.saturating_duration_since(Instant::now()));
					}
				}
				let _ = reply.send(());
			}
			Some(TimerCmd::Resume(reply)) => {
				if paused {
					paused = false;
					if let Some(rest) = remaining.take() {
						deadline = Some(Instant::now() + rest);
					}
				}
				let _ = reply.send(());
			}
			Some(TimerCmd::IsPaused(reply)) => {
				let _ = reply.send(paused);
			}
			Some(TimerCmd::Close(result, reply)) => {
				let _ = reply.send(());
				break CloseNotice {
					reason: CloseReason::Closed,
					result,
				};
			}
			Some(TimerCmd::Dismiss) => {
				break CloseNotice {
					reason: CloseReason::Dismissed,
					result: None,
				};
			}
		}
	};
	let _ = notice_tx.send(notice);
}

async fn dwell_expiry(deadline: Option<Instant>, paused: bool) {
	match deadline {
		Some(at) if !paused => tokio::time::sleep_until(at).await,
		_ => std::future::pending().await,
	}
}
