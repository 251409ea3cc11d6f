// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_issuer_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a failed background task via the global metrics recorder (when enabled).
pub fn record_background_failure(task: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_issuer_background_failure_total", "task" => task).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = task;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(FlowKind::Token, FlowOutcome::Failure);
		record_background_failure("persist_access_token");
	}
}
