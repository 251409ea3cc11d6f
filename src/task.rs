//! Small fixed-size task fan-out and detached background work.
//!
//! [`fan_out`] spawns a fixed batch of fallible operations, joins all of them, and only then
//! inspects the collected results: every slot is kept, the first failing slot in launch order
//! wins, and an outer [`CancellationToken`] is consulted once, after the join barrier.
//! Already-dispatched tasks are never preempted.

// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	config::Persistence,
	obs::{self, FlowKind, FlowOutcome},
};

/// Owned future accepted by [`fan_out`] and the detached-task helpers.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Runs every task concurrently and returns their outputs in launch order.
///
/// The join barrier completes before any result is examined, so side effects of every task
/// are visible once this returns, whether it succeeds or fails.
pub async fn fan_out<T, const N: usize>(
	tasks: [TaskFuture<T>; N],
	cancel: Option<&CancellationToken>,
) -> Result<Vec<T>>
where
	T: Send + 'static,
{
	let handles = tasks.map(tokio::spawn);
	let mut slots = Vec::with_capacity(N);

	for handle in handles {
		slots.push(handle.await);
	}

	if cancel.is_some_and(CancellationToken::is_cancelled) {
		return Err(Error::server_error("operation was cancelled."));
	}

	let mut outputs = Vec::with_capacity(N);

	for slot in slots {
		match slot {
			Ok(Ok(output)) => outputs.push(output),
			Ok(Err(err)) => return Err(err),
			Err(_) => return Err(Error::server_error("concurrent task failed to complete.")),
		}
	}

	Ok(outputs)
}

/// Identifies a detached task in logs and metrics.
#[derive(Clone, Debug)]
pub struct TaskLabel {
	/// Stable task name, e.g. `persist_access_token`.
	pub task: &'static str,
	/// Request the work belongs to.
	pub request_id: String,
	/// Client owning the request.
	pub client_id: String,
}
impl TaskLabel {
	/// Creates a label.
	pub fn new(
		task: &'static str,
		request_id: impl Into<String>,
		client_id: impl Into<String>,
	) -> Self {
		Self { task, request_id: request_id.into(), client_id: client_id.into() }
	}
}

/// Spawns best-effort work whose failure is logged and counted, never returned.
pub fn spawn_detached<F>(label: TaskLabel, fut: F)
where
	F: Future<Output = Result<()>> + Send + 'static,
{
	let span = obs::FlowSpan::new(FlowKind::Background, label.task);

	tokio::spawn(span.instrument(async move {
		if let Err(err) = fut.await {
			report_failure(&label, &err);
		}
	}));
}

/// Runs repository work according to `mode`.
///
/// [`Persistence::Detached`] hands the work to [`spawn_detached`] and returns immediately;
/// [`Persistence::Awaited`] waits for it and propagates its error.
pub async fn persist<F>(mode: Persistence, label: TaskLabel, fut: F) -> Result<()>
where
	F: Future<Output = Result<()>> + Send + 'static,
{
	match mode {
		Persistence::Detached => {
			spawn_detached(label, fut);

			Ok(())
		},
		Persistence::Awaited => fut.await,
	}
}

/// Runs cleanup work according to `mode` without ever surfacing its failure.
///
/// [`Persistence::Awaited`] only changes *when* the work completes: failures are still
/// logged and counted instead of returned.
pub async fn cleanup<F>(mode: Persistence, label: TaskLabel, fut: F)
where
	F: Future<Output = Result<()>> + Send + 'static,
{
	match mode {
		Persistence::Detached => spawn_detached(label, fut),
		Persistence::Awaited =>
			if let Err(err) = fut.await {
				report_failure(&label, &err);
			},
	}
}

fn report_failure(label: &TaskLabel, err: &Error) {
	obs::warn_background_failure(label.task, &label.request_id, &label.client_id, err);
	obs::record_background_failure(label.task);
	obs::record_flow_outcome(FlowKind::Background, FlowOutcome::Failure);
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	fn ok(value: u8) -> TaskFuture<u8> {
		Box::pin(async move { Ok(value) })
	}

	fn fail(reason: &'static str) -> TaskFuture<u8> {
		Box::pin(async move { Err(Error::server_error(reason)) })
	}

	#[tokio::test]
	async fn fan_out_returns_outputs_in_launch_order() {
		let outputs = fan_out([ok(1), ok(2)], None).await.expect("Both tasks should succeed.");

		assert_eq!(outputs, vec![1, 2]);
	}

	#[tokio::test]
	async fn fan_out_reports_first_failing_slot_after_join() {
		let finished = Arc::new(AtomicUsize::new(0));
		let counter = finished.clone();
		let slow: TaskFuture<u8> = Box::pin(async move {
			tokio::time::sleep(std::time::Duration::from_millis(20)).await;
			counter.fetch_add(1, Ordering::SeqCst);

			Ok(3)
		});
		let err = fan_out([fail("first."), fail("second."), slow], None)
			.await
			.expect_err("Failing slots should surface.");

		assert_eq!(err.reason(), "first.");
		assert_eq!(finished.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn cancellation_is_checked_after_join() {
		let cancel = CancellationToken::new();

		cancel.cancel();

		let err = fan_out([ok(1)], Some(&cancel)).await.expect_err("Cancelled batch should fail.");

		assert_eq!(err.kind(), crate::error::ErrorKind::ServerError);
	}

	#[tokio::test]
	async fn awaited_persistence_propagates_failures() {
		let label = TaskLabel::new("persist_access_token", "req-1", "client-1");
		let err = persist(Persistence::Awaited, label.clone(), async {
			Err(Error::server_error("database unreachable."))
		})
		.await
		.expect_err("Awaited persistence should propagate errors.");

		assert_eq!(err.reason(), "database unreachable.");
		assert!(
			persist(Persistence::Detached, label, async {
				Err(Error::server_error("database unreachable."))
			})
			.await
			.is_ok()
		);
	}

	#[tokio::test]
	async fn awaited_cleanup_completes_before_returning() {
		let done = Arc::new(AtomicUsize::new(0));
		let counter = done.clone();
		let label = TaskLabel::new("delete_authorize_code", "req-1", "client-1");

		cleanup(Persistence::Awaited, label.clone(), async move {
			counter.fetch_add(1, Ordering::SeqCst);

			Ok(())
		})
		.await;
		cleanup(Persistence::Awaited, label, async {
			Err(Error::server_error("database unreachable."))
		})
		.await;

		assert_eq!(done.load(Ordering::SeqCst), 1);
	}
}
