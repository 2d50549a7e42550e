// self
use crate::obs::{CallOutcome, Stage};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(stage: Stage, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"azsecret_call_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[cfg(not(feature = "metrics"))]
	#[test]
	fn record_call_outcome_noop_without_metrics() {
		record_call_outcome(Stage::Secret, CallOutcome::Failure);
	}

	#[cfg(feature = "metrics")]
	#[test]
	fn record_call_outcome_increments_labeled_counter() {
		// std
		use std::sync::{
			Arc,
			atomic::{AtomicU64, Ordering},
		};
		// crates.io
		use metrics::{
			Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
		};
		use parking_lot::Mutex;

		type Registered = (String, Vec<(String, String)>, Arc<AtomicU64>);

		#[derive(Default)]
		struct CapturingRecorder {
			counters: Mutex<Vec<Registered>>,
		}
		impl Recorder for CapturingRecorder {
			fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

			fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

			fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

			fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
				let value = Arc::new(AtomicU64::new(0));
				let labels = key
					.labels()
					.map(|label| (label.key().to_owned(), label.value().to_owned()))
					.collect();

				self.counters.lock().push((key.name().to_owned(), labels, value.clone()));

				Counter::from_arc(value)
			}

			fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
				Gauge::noop()
			}

			fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
				Histogram::noop()
			}
		}

		let recorder = CapturingRecorder::default();

		metrics::with_local_recorder(&recorder, || {
			record_call_outcome(Stage::Token, CallOutcome::Attempt);
			record_call_outcome(Stage::Secret, CallOutcome::Failure);
		});

		let counters = recorder.counters.lock();
		let observed = counters
			.iter()
			.map(|(name, labels, value)| {
				(name.as_str(), labels.clone(), value.load(Ordering::Relaxed))
			})
			.collect::<Vec<_>>();
		let labels = |stage: &str, outcome: &str| {
			vec![("stage".to_owned(), stage.to_owned()), ("outcome".to_owned(), outcome.to_owned())]
		};

		assert_eq!(observed, vec![
			("azsecret_call_total", labels("token", "attempt"), 1),
			("azsecret_call_total", labels("secret", "failure"), 1),
		]);
	}
}
