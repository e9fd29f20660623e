// self
use crate::{
	credential::CredentialKind,
	obs::{StoreOp, TokenOutcome},
};

/// Records a token acquisition outcome via the global metrics recorder (when enabled).
pub fn record_token_outcome(source: CredentialKind, outcome: TokenOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"identity_todo_token_total",
			"source" => source.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (source, outcome);
	}
}

pub(crate) fn count_store_outcome(op: StoreOp, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("identity_todo_store_total", "op" => op.as_str(), "outcome" => outcome)
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_an_installed_recorder() {
		record_token_outcome(CredentialKind::Certificate, TokenOutcome::Failure);
		count_store_outcome(StoreOp::Add, "rejected");
	}
}
