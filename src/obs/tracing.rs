// self
use crate::{_prelude::*, credential::CredentialKind, obs::StoreOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// Span wrapping one token acquisition.
#[derive(Clone, Debug)]
pub struct TokenSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl TokenSpan {
	/// Creates a span tagged with the credential kind and call site.
	pub fn new(source: CredentialKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("identity_todo.token", source = source.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (source, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `trace` event for a cache lookup.
pub fn cache_event(source: CredentialKind, hit: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::trace!(source = source.as_str(), hit, "token cache lookup");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (source, hit);
	}
}

/// Emits a `debug` event for a store operation.
pub fn store_event(op: StoreOp, outcome: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(op = op.as_str(), outcome, "todo store operation");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = TokenSpan::new(CredentialKind::ClientSecret, "instrument_passes_output_through");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn events_are_noops_without_a_subscriber() {
		cache_event(CredentialKind::ManagedIdentity, false);
		store_event(StoreOp::Delete, "not_found");
	}
}
