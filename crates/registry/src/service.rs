//! Single-task registry service.
//!
//! One `mpsc` queue carries both caller commands and the registry's own
//! internal events. Close notices from the runtime and grace-timer expiries
//! re-enter through the same queue, so the entry map is mutated by exactly
//! one task, in arrival order, with no locks.

use std::time::Instant;

use crouton_runtime::{RuntimeToast, Shown, ToastRuntime};
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{RegistryConfig, ToastConfig};
use crate::error::ShowError;
use crate::id::{IdMinter, ToastId};

/// Boundary commands serviced by the registry.
///
/// Each command carries a oneshot reply; lookups that miss answer with a
/// negative or absent value rather than an error, because a toast closing
/// between the caller's check and its command is an expected race.
#[derive(Debug)]
pub enum Command {
	/// Show a toast from a serialized config object. Replies with the
	/// minted identifier, the only capability the caller receives.
	Show {
		config: String,
		reply: oneshot::Sender<Result<ToastId, ShowError>>,
	},
	/// Freeze the toast's auto-close timer.
	Pause { id: ToastId, reply: oneshot::Sender<bool> },
	/// Rearm the toast's auto-close timer.
	Resume { id: ToastId, reply: oneshot::Sender<bool> },
	/// Whether the toast is paused; `None` when the id is unknown or the
	/// toast already closed, so callers can tell "not paused" from
	/// "cannot tell, toast is gone".
	IsPaused {
		id: ToastId,
		reply: oneshot::Sender<Option<bool>>,
	},
	/// Close the toast, handing the optional result payload to whatever
	/// listens for the toast's outcome.
	Close {
		id: ToastId,
		result: Option<Value>,
		reply: oneshot::Sender<bool>,
	},
	/// Whether the id maps to an entry that has not closed. Diagnostic
	/// read, no side effects.
	IsActive { id: ToastId, reply: oneshot::Sender<bool> },
	/// Diagnostic snapshot of every entry still in the mapping.
	Snapshot { reply: oneshot::Sender<Vec<ToastStatus>> },
}

/// Diagnostic snapshot row for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastStatus {
	pub id: ToastId,
	pub closed: bool,
}

enum Msg {
	Command(Command),
	/// The runtime reported the toast finished closing.
	Closed(ToastId),
	/// A grace timer elapsed; the entry can be removed.
	Reap(ToastId),
}

/// The registry service has been shut down.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("toast registry service is stopped")]
pub struct ServiceStopped;

/// Cloneable command ingress for a running registry service.
#[derive(Clone, Debug)]
pub struct ServicePort {
	tx: mpsc::Sender<Msg>,
}

impl ServicePort {
	/// Submits one command. Fails only when the service has stopped.
	pub async fn submit(&self, command: Command) -> Result<(), ServiceStopped> {
		self.tx.send(Msg::Command(command)).await.map_err(|_| ServiceStopped)
	}
}

/// A running registry: command port plus shutdown control.
pub struct ServiceHandle {
	port: ServicePort,
	cancel: CancellationToken,
	join: JoinHandle<()>,
}

impl ServiceHandle {
	/// Returns a cloneable command port for callers.
	pub fn port(&self) -> ServicePort {
		self.port.clone()
	}

	/// Stops the service loop and waits for it to finish. Outstanding
	/// grace timers die with the map.
	pub async fn shutdown(self) {
		self.cancel.cancel();
		let _ = self.join.await;
	}
}

/// One in-flight toast.
///
/// The runtime handle is owned exclusively here and never leaves the
/// service task. `closed` is monotone: once set it never reverts.
struct ToastEntry {
	toast: Box<dyn RuntimeToast>,
	closed: bool,
	closed_at: Option<Instant>,
}

impl ToastEntry {
	fn mark_closed(&mut self) {
		self.closed = true;
		self.closed_at = Some(Instant::now());
	}
}

/// Single-task owner of the toast entry map.
pub struct RegistryService {
	runtime: Box<dyn ToastRuntime>,
	config: RegistryConfig,
	entries: FxHashMap<ToastId, ToastEntry>,
	minter: IdMinter,
	tx: mpsc::Sender<Msg>,
}

impl RegistryService {
	/// Spawns the service task around a runtime backend.
	///
	/// The registry is an explicitly owned instance: it lives until the
	/// returned handle is shut down, and callers reach it only through
	/// [`ServicePort`]s handed out by the handle.
	pub fn spawn(runtime: impl ToastRuntime + 'static, config: RegistryConfig) -> ServiceHandle {
		let (tx, rx) = mpsc::channel(config.command_capacity);
		let cancel = CancellationToken::new();
		let service = Self {
			runtime: Box::new(runtime),
			config,
			entries: FxHashMap::default(),
			minter: IdMinter::new(),
			tx: tx.clone(),
		};
		let join = tokio::spawn(service.run(rx, cancel.clone()));
		ServiceHandle {
			port: ServicePort { tx },
			cancel,
			join,
		}
	}

	async fn run(mut self, mut rx: mpsc::Receiver<Msg>, cancel: CancellationToken) {
		loop {
			let msg = tokio::select! {
				biased;
				() = cancel.cancelled() => break,
				msg = rx.recv() => match msg {
					Some(msg) => msg,
					None => break,
				},
			};
			match msg {
				Msg::Command(command) => self.handle_command(command).await,
				Msg::Closed(id) => self.on_close_notice(&id),
				Msg::Reap(id) => self.reap(&id),
			}
		}
		tracing::debug!(open = self.entries.len(), "toast registry stopped");
	}

	async fn handle_command(&mut self, command: Command) {
		match command {
			Command::Show { config, reply } => {
				let _ = reply.send(self.show(&config).await);
			}
			Command::Pause { id, reply } => {
				let _ = reply.send(self.pause(&id).await);
			}
			Command::Resume { id, reply } => {
				let _ = reply.send(self.resume(&id).await);
			}
			Command::IsPaused { id, reply } => {
				let _ = reply.send(self.is_paused(&id).await);
			}
			Command::Close { id, result, reply } => {
				let _ = reply.send(self.close(&id, result).await);
			}
			Command::IsActive { id, reply } => {
				let _ = reply.send(self.is_active(&id));
			}
			Command::Snapshot { reply } => {
				let _ = reply.send(self.snapshot());
			}
		}
	}

	async fn show(&mut self, payload: &str) -> Result<ToastId, ShowError> {
		let config: ToastConfig = serde_json::from_str(payload).map_err(|err| ShowError::InvalidConfig(err.to_string()))?;
		let (position, request) = config.into_request()?;

		// Placement is session-wide state on the runtime; it applies even
		// when this particular show goes on to fail.
		if let Some(position) = position {
			self.runtime.set_position(position);
		}

		if !self.runtime.container_mounted() {
			tracing::warn!("toast container missing; the host surface never mounted one");
			return Err(ShowError::Setup("no toast container mounted in the hosting surface".into()));
		}

		let id = self.minter.mint();
		let Shown { toast, on_close } = self.runtime.show(request).await?;

		self.entries.insert(
			id.clone(),
			ToastEntry {
				toast,
				closed: false,
				closed_at: None,
			},
		);

		// Forward the runtime's close notice into our own queue so it is
		// processed in order with every other command.
		let tx = self.tx.clone();
		let notice_id = id.clone();
		tokio::spawn(async move {
			if let Ok(notice) = on_close.await {
				tracing::debug!(id = %notice_id, reason = ?notice.reason, "toast close notice");
				let _ = tx.send(Msg::Closed(notice_id)).await;
			}
		});

		tracing::debug!(id = %id, open = self.entries.len(), "toast shown");
		Ok(id)
	}

	async fn pause(&mut self, id: &ToastId) -> bool {
		let Some(entry) = self.entries.get_mut(id) else {
			tracing::debug!(id = %id, "pause: unknown toast");
			return false;
		};
		if entry.closed {
			tracing::debug!(id = %id, "pause: toast already closed");
			return false;
		}
		match entry.toast.pause().await {
			Ok(()) => true,
			Err(err) => {
				tracing::debug!(id = %id, %err, "pause refused");
				false
			}
		}
	}

	async fn resume(&mut self, id: &ToastId) -> bool {
		let Some(entry) = self.entries.get_mut(id) else {
			tracing::debug!(id = %id, "resume: unknown toast");
			return false;
		};
		if entry.closed {
			tracing::debug!(id = %id, "resume: toast already closed");
			return false;
		}
		match entry.toast.resume().await {
			Ok(()) => true,
			Err(err) => {
				tracing::debug!(id = %id, %err, "resume refused");
				false
			}
		}
	}

	async fn is_paused(&mut self, id: &ToastId) -> Option<bool> {
		let entry = self.entries.get_mut(id)?;
		if entry.closed {
			return None;
		}
		match entry.toast.is_paused().await {
			Ok(paused) => Some(paused),
			// A handle that cannot answer counts as not paused; absence
			// is reserved for unknown or closed ids.
			Err(err) => {
				tracing::debug!(id = %id, %err, "isPaused refused");
				Some(false)
			}
		}
	}

	async fn close(&mut self, id: &ToastId, result: Option<Value>) -> bool {
		let Some(entry) = self.entries.get_mut(id) else {
			tracing::debug!(id = %id, "close: unknown toast");
			return false;
		};
		if entry.closed {
			tracing::debug!(id = %id, "close: toast already closed");
			return false;
		}
		match entry.toast.close(result).await {
			Ok(()) => {
				// Marked immediately rather than from the close notice,
				// so a second close racing the notice cannot double-fire.
				entry.mark_closed();
				true
			}
			Err(err) => {
				tracing::debug!(id = %id, %err, "close refused");
				false
			}
		}
	}

	fn is_active(&self, id: &ToastId) -> bool {
		self.entries.get(id).is_some_and(|entry| !entry.closed)
	}

	fn snapshot(&self) -> Vec<ToastStatus> {
		let mut rows: Vec<ToastStatus> = self
			.entries
			.iter()
			.map(|(id, entry)| ToastStatus {
				id: id.clone(),
				closed: entry.closed,
			})
			.collect();
		rows.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
		rows
	}

	fn on_close_notice(&mut self, id: &ToastId) {
		let Some(entry) = self.entries.get_mut(id) else {
			return;
		};
		if !entry.closed {
			entry.mark_closed();
		}

		// Deferred removal tolerates commands that were already in flight
		// when the toast closed: within the grace window they observe a
		// closed entry instead of a missing one. The timer is never
		// cancelled by a command; only shutdown can lose it, and that
		// takes the whole map with it.
		let grace = self.config.grace_delay();
		let tx = self.tx.clone();
		let reap_id = id.clone();
		tokio::spawn(async move {
			tokio::time::sleep(grace).await;
			let _ = tx.send(Msg::Reap(reap_id)).await;
		});
	}

	fn reap(&mut self, id: &ToastId) {
		if let Some(entry) = self.entries.remove(id) {
			let lingered = entry.closed_at.map(|at| at.elapsed());
			tracing::debug!(id = %id, ?lingered, open = self.entries.len(), "toast entry removed");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use crouton_runtime::headless::Capabilities;
	use crouton_runtime::{HeadlessRuntime, Position, RuntimeError};
	use serde_json::json;
	use tokio::time::timeout;

	use super::*;

	fn test_config(grace_ms: u64) -> RegistryConfig {
		RegistryConfig {
			grace_delay_ms: grace_ms,
			command_capacity: 16,
		}
	}

	async fn show(port: &ServicePort, config: &ToastConfig) -> Result<ToastId, ShowError> {
		let payload = serde_json::to_string(config).unwrap();
		show_json(port, &payload).await
	}

	async fn show_json(port: &ServicePort, payload: &str) -> Result<ToastId, ShowError> {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::Show {
			config: payload.to_owned(),
			reply: tx,
		})
		.await
		.unwrap();
		rx.await.unwrap()
	}

	async fn pause(port: &ServicePort, id: &ToastId) -> bool {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::Pause { id: id.clone(), reply: tx }).await.unwrap();
		rx.await.unwrap()
	}

	async fn resume(port: &ServicePort, id: &ToastId) -> bool {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::Resume { id: id.clone(), reply: tx }).await.unwrap();
		rx.await.unwrap()
	}

	async fn is_paused(port: &ServicePort, id: &ToastId) -> Option<bool> {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::IsPaused { id: id.clone(), reply: tx }).await.unwrap();
		rx.await.unwrap()
	}

	async fn close(port: &ServicePort, id: &ToastId, result: Option<Value>) -> bool {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::Close {
			id: id.clone(),
			result,
			reply: tx,
		})
		.await
		.unwrap();
		rx.await.unwrap()
	}

	async fn is_active(port: &ServicePort, id: &ToastId) -> bool {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::IsActive { id: id.clone(), reply: tx }).await.unwrap();
		rx.await.unwrap()
	}

	async fn snapshot(port: &ServicePort) -> Vec<ToastStatus> {
		let (tx, rx) = oneshot::channel();
		port.submit(Command::Snapshot { reply: tx }).await.unwrap();
		rx.await.unwrap()
	}

	async fn wait_until_inactive(port: &ServicePort, id: &ToastId) {
		timeout(Duration::from_secs(2), async {
			while is_active(port, id).await {
				tokio::time::sleep(Duration::from_millis(5)).await;
			}
		})
		.await
		.expect("toast should close");
	}

	#[tokio::test]
	async fn show_mints_monotonic_ids_and_entries_start_active() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		let a = show(&port, &ToastConfig::message("a")).await.unwrap();
		let b = show(&port, &ToastConfig::message("b")).await.unwrap();
		assert_eq!(a.as_str(), "toast-1");
		assert_eq!(b.as_str(), "toast-2");
		assert!(is_active(&port, &a).await);
		assert!(is_active(&port, &b).await);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn commands_for_unknown_ids_are_negative() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();
		let ghost = ToastId::from("toast-999");

		assert!(!pause(&port, &ghost).await);
		assert!(!resume(&port, &ghost).await);
		assert!(!close(&port, &ghost, None).await);
		assert_eq!(is_paused(&port, &ghost).await, None);
		assert!(!is_active(&port, &ghost).await);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn close_is_idempotent_and_entry_lingers_closed() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(60_000));
		let port = handle.port();

		let id = show(&port, &ToastConfig::message("bye")).await.unwrap();
		assert!(close(&port, &id, Some(json!("result"))).await);
		assert!(!close(&port, &id, Some(json!("result"))).await);

		// Within the grace window the entry is observably closed, not gone.
		assert_eq!(snapshot(&port).await, vec![ToastStatus { id: id.clone(), closed: true }]);
		assert!(!is_active(&port, &id).await);
		assert!(!pause(&port, &id).await);
		assert_eq!(is_paused(&port, &id).await, None);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn closed_entry_is_reaped_after_grace_delay() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(40));
		let port = handle.port();

		let id = show(&port, &ToastConfig::message("brief")).await.unwrap();
		assert!(close(&port, &id, None).await);
		assert_eq!(snapshot(&port).await.len(), 1);

		tokio::time::sleep(Duration::from_millis(150)).await;
		assert!(snapshot(&port).await.is_empty());

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn auto_closed_toast_rejects_pause() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(60_000));
		let port = handle.port();

		let config = ToastConfig::message("fleeting").with_option("toastTimeout", json!(20));
		let id = show(&port, &config).await.unwrap();
		wait_until_inactive(&port, &id).await;

		assert!(!pause(&port, &id).await);
		assert!(!resume(&port, &id).await);
		assert_eq!(is_paused(&port, &id).await, None);
		// Still in the mapping, just closed.
		assert_eq!(snapshot(&port).await, vec![ToastStatus { id: id.clone(), closed: true }]);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn pause_and_resume_drive_the_runtime_timer() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		let id = show(&port, &ToastConfig::message("held")).await.unwrap();
		assert_eq!(is_paused(&port, &id).await, Some(false));
		assert!(pause(&port, &id).await);
		assert_eq!(is_paused(&port, &id).await, Some(true));
		assert!(resume(&port, &id).await);
		assert_eq!(is_paused(&port, &id).await, Some(false));

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn position_is_applied_session_wide_and_stripped() {
		let (runtime, control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		let config = ToastConfig::message("placed").with_position(Position::TopRight);
		show(&port, &config).await.unwrap();

		assert_eq!(control.position(), Position::TopRight);
		let forwarded = control.last_request().unwrap();
		assert!(!forwarded.extra.contains_key("position"));

		// Placement sticks for later toasts that do not mention it.
		show(&port, &ToastConfig::message("follows")).await.unwrap();
		assert_eq!(control.position(), Position::TopRight);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn missing_container_is_a_setup_error() {
		let (runtime, control) = HeadlessRuntime::new();
		control.unmount();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		let config = ToastConfig::message("homeless").with_position(Position::TopLeft);
		let err = show(&port, &config).await.unwrap_err();
		assert!(matches!(err, ShowError::Setup(_)));
		assert_eq!(control.shown(), 0);
		// The placement side effect landed anyway; it is runtime state,
		// not per-toast state.
		assert_eq!(control.position(), Position::TopLeft);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn malformed_config_is_rejected_before_the_runtime() {
		let (runtime, control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		let err = show_json(&port, "not json at all").await.unwrap_err();
		assert!(matches!(err, ShowError::InvalidConfig(_)));

		let err = show_json(&port, "{}").await.unwrap_err();
		assert!(matches!(err, ShowError::InvalidConfig(_)));

		assert_eq!(control.shown(), 0);
		handle.shutdown().await;
	}

	#[tokio::test]
	async fn runtime_rejection_propagates_unmodified() {
		let (runtime, control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		control.fail_next_show("quota exceeded");
		let err = show(&port, &ToastConfig::message("denied")).await.unwrap_err();
		assert_eq!(err, ShowError::Runtime(RuntimeError::Rejected("quota exceeded".into())));

		// The failed show must not leave an entry behind.
		assert!(snapshot(&port).await.is_empty());
		handle.shutdown().await;
	}

	#[tokio::test]
	async fn unsupported_operations_answer_negative_but_leave_the_toast_open() {
		let (runtime, control) = HeadlessRuntime::new();
		control.set_capabilities(Capabilities {
			pause: false,
			resume: false,
			is_paused: false,
			close: false,
		});
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();

		let id = show(&port, &ToastConfig::message("stubborn")).await.unwrap();
		assert!(!pause(&port, &id).await);
		assert!(!resume(&port, &id).await);
		assert_eq!(is_paused(&port, &id).await, Some(false));
		// A refused close must not mark the entry closed.
		assert!(!close(&port, &id, None).await);
		assert!(is_active(&port, &id).await);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn late_close_notice_does_not_resurrect_or_double_reap() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(80));
		let port = handle.port();

		let id = show(&port, &ToastConfig::message("raced")).await.unwrap();
		// Explicit close marks the entry immediately; the runtime's own
		// notice lands shortly after and must be a no-op.
		assert!(close(&port, &id, None).await);
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert_eq!(snapshot(&port).await, vec![ToastStatus { id: id.clone(), closed: true }]);

		tokio::time::sleep(Duration::from_millis(250)).await;
		assert!(snapshot(&port).await.is_empty());

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn user_dismissal_closes_the_entry() {
		let (runtime, control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(60_000));
		let port = handle.port();

		let id = show(&port, &ToastConfig::message("swiped away")).await.unwrap();
		assert!(control.dismiss(0));
		wait_until_inactive(&port, &id).await;

		assert!(!pause(&port, &id).await);
		assert!(!close(&port, &id, None).await);

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn port_reports_stopped_after_shutdown() {
		let (runtime, _control) = HeadlessRuntime::new();
		let handle = RegistryService::spawn(runtime, test_config(1_000));
		let port = handle.port();
		handle.shutdown().await;

		let (tx, _rx) = oneshot::channel();
		let err = port
			.submit(Command::IsActive {
				id: ToastId::from("toast-1"),
				reply: tx,
			})
			.await
			.unwrap_err();
		assert_eq!(err, ServiceStopped);
	}
}
