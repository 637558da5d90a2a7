//! Runs a fetch cycle on a fixed interval, one instance at a time.

use std::{
	sync::{
		atomic::{AtomicU8, Ordering},
		Arc, Mutex, MutexGuard, PoisonError,
	},
	time::Duration,
};

use schemars::JsonSchema;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::ingest::{self, Cycle, CycleSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Status {
	Stopped,
	Running,
	/// Cancellation was requested but the loop has not exited yet.
	Stopping,
}

impl Status {
	fn from_u8(value: u8) -> Self {
		match value {
			1 => Self::Running,
			2 => Self::Stopping,
			_ => Self::Stopped,
		}
	}
}

struct Task {
	handle: JoinHandle<()>,
	cancel: CancellationToken,
}

/// Owns the periodic fetch loop.
///
/// The loop runs a cycle, then sleeps for the interval, and repeats. The
/// sleep only starts once a cycle has finished, so cycles never overlap no
/// matter how long they take.
pub struct Scheduler<C> {
	cycle: Arc<C>,
	interval: Duration,
	state: Arc<AtomicU8>,
	task: Mutex<Option<Task>>,
}

impl<C: Cycle> Scheduler<C> {
	pub fn new(cycle: Arc<C>, interval: Duration) -> Self {
		Self {
			cycle,
			interval,
			state: Arc::new(AtomicU8::new(Status::Stopped as u8)),
			task: Mutex::new(None),
		}
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	fn task(&self) -> MutexGuard<'_, Option<Task>> {
		self.task.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Starts the loop, returning `false` if it is already active.
	pub fn start(&self) -> bool {
		let mut task = self.task();

		// a loop that died on its own no longer counts as running
		if task.as_ref().is_some_and(|task| task.handle.is_finished()) {
			*task = None;
			self.state.store(Status::Stopped as u8, Ordering::SeqCst);
		}

		if self
			.state
			.compare_exchange(
				Status::Stopped as u8,
				Status::Running as u8,
				Ordering::SeqCst,
				Ordering::SeqCst,
			)
			.is_err()
		{
			tracing::warn!("fetcher is already running");
			return false;
		}

		tracing::info!(interval = ?self.interval, "starting background fetcher");

		let cancel = CancellationToken::new();
		let handle = tokio::spawn(run_loop(
			self.cycle.clone(),
			self.interval,
			cancel.clone(),
		));

		*task = Some(Task { handle, cancel });
		true
	}

	/// Stops the loop and waits for it to exit, returning `false` if it was
	/// not running.
	///
	/// A sleeping loop exits immediately. A loop in the middle of a cycle
	/// finishes the record it is working on first.
	pub async fn stop(&self) -> bool {
		let task = {
			let mut task = self.task();

			// a loop that died on its own has nothing left to stop
			if task.as_ref().is_some_and(|task| task.handle.is_finished()) {
				*task = None;
				self.state.store(Status::Stopped as u8, Ordering::SeqCst);
			}

			if self
				.state
				.compare_exchange(
					Status::Running as u8,
					Status::Stopping as u8,
					Ordering::SeqCst,
					Ordering::SeqCst,
				)
				.is_err()
			{
				tracing::warn!("fetcher is not running");
				return false;
			}

			task.take()
		};

		tracing::info!("stopping background fetcher");

		if let Some(task) = task {
			task.cancel.cancel();

			if let Err(error) = task.handle.await {
				tracing::error!(%error, "background fetcher exited abnormally");
			}
		}

		self.state.store(Status::Stopped as u8, Ordering::SeqCst);
		tracing::info!("background fetcher stopped");

		true
	}

	pub fn status(&self) -> Status {
		// `stop` swaps the state and takes the task under this same lock
		let task = self.task();

		match Status::from_u8(self.state.load(Ordering::SeqCst)) {
			Status::Running if task.as_ref().map_or(true, |task| task.handle.is_finished()) => {
				Status::Stopped
			}
			status => status,
		}
	}

	/// Runs a single cycle right away, independently of the loop.
	pub async fn run_once(&self) -> Result<CycleSummary, ingest::Error> {
		self.cycle.run_cycle(&CancellationToken::new()).await
	}
}

async fn run_loop<C: Cycle>(cycle: Arc<C>, interval: Duration, cancel: CancellationToken) {
	loop {
		if let Err(error) = cycle.run_cycle(&cancel).await {
			tracing::error!(%error, "fetch cycle failed");
		}

		tokio::select! {
			() = cancel.cancelled() => break,
			() = tokio::time::sleep(interval) => {}
		}
	}
}
