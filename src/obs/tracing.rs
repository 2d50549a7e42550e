// self
use crate::{_prelude::*, client::FetchPhase, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used around each network call.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the call stage and target host.
	pub fn new(stage: Stage, endpoint: &Url) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"azsecret.call",
				stage = stage.as_str(),
				host = endpoint.host_str().unwrap_or_default()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, endpoint);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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

/// Emits a debug event for a state-machine transition.
pub fn record_phase(phase: FetchPhase) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(phase = phase.as_str(), "secret fetch entered a new phase");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = phase;
	}
}

/// Emits a warning for a failed call. Only the error chain is logged, never bodies or tokens.
pub fn record_call_failure(stage: Stage, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage = stage.as_str(), kind = error.kind().as_str(), "{error}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}
