//! Linear state machine sequencing one token exchange and one secret read.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SecretName, SecretValue},
	error::ErrorKind,
};

/// Data-free label for each state of a run, recorded as the run progresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchPhase {
	/// Raw input received; nothing validated yet.
	Start,
	/// Secret name validated; token exchange pending.
	TokenRequested,
	/// Token issued by the metadata service.
	TokenObtained,
	/// Secret read pending.
	SecretRequested,
	/// Terminal success.
	SecretObtained,
	/// Terminal failure.
	Failed(ErrorKind),
}
impl FetchPhase {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchPhase::Start => "start",
			FetchPhase::TokenRequested => "token_requested",
			FetchPhase::TokenObtained => "token_obtained",
			FetchPhase::SecretRequested => "secret_requested",
			FetchPhase::SecretObtained => "secret_obtained",
			FetchPhase::Failed(_) => "failed",
		}
	}

	/// Returns `true` for [`FetchPhase::SecretObtained`] and [`FetchPhase::Failed`].
	pub const fn is_terminal(self) -> bool {
		matches!(self, FetchPhase::SecretObtained | FetchPhase::Failed(_))
	}
}
impl Display for FetchPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			FetchPhase::Failed(kind) => write!(f, "failed({kind})"),
			other => f.write_str(other.as_str()),
		}
	}
}

/// State of one run. The secret read can only be entered with an [`AccessToken`] in hand.
#[derive(Debug)]
pub(crate) enum FetchState {
	Start { secret_name: String },
	TokenRequested { secret_name: SecretName },
	TokenObtained { secret_name: SecretName, token: AccessToken },
	SecretRequested { secret_name: SecretName, token: AccessToken },
	SecretObtained(SecretValue),
	Failed(Error),
}
impl FetchState {
	pub(crate) fn phase(&self) -> FetchPhase {
		match self {
			Self::Start { .. } => FetchPhase::Start,
			Self::TokenRequested { .. } => FetchPhase::TokenRequested,
			Self::TokenObtained { .. } => FetchPhase::TokenObtained,
			Self::SecretRequested { .. } => FetchPhase::SecretRequested,
			Self::SecretObtained(_) => FetchPhase::SecretObtained,
			Self::Failed(err) => FetchPhase::Failed(err.kind()),
		}
	}
}

/// Completed run: the phases visited, in order, and the terminal outcome.
#[derive(Debug)]
pub struct FetchRun {
	phases: Vec<FetchPhase>,
	outcome: Result<SecretValue>,
}
impl FetchRun {
	pub(crate) fn new(phases: Vec<FetchPhase>, outcome: Result<SecretValue>) -> Self {
		Self { phases, outcome }
	}

	/// Phases visited, starting with [`FetchPhase::Start`] and ending on a terminal phase.
	pub fn phases(&self) -> &[FetchPhase] {
		&self.phases
	}

	/// Borrows the terminal outcome.
	pub fn outcome(&self) -> Result<&SecretValue, &Error> {
		self.outcome.as_ref()
	}

	/// Consumes the run, returning the terminal outcome.
	pub fn into_result(self) -> Result<SecretValue> {
		self.outcome
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn only_obtained_and_failed_are_terminal() {
		assert!(!FetchPhase::Start.is_terminal());
		assert!(!FetchPhase::TokenRequested.is_terminal());
		assert!(!FetchPhase::SecretRequested.is_terminal());
		assert!(FetchPhase::SecretObtained.is_terminal());
		assert!(FetchPhase::Failed(ErrorKind::Timeout).is_terminal());
	}

	#[test]
	fn failed_phase_displays_its_kind() {
		assert_eq!(
			FetchPhase::Failed(ErrorKind::MalformedResponse).to_string(),
			"failed(malformed_response)"
		);
		assert_eq!(FetchPhase::TokenObtained.to_string(), "token_obtained");
	}

	#[test]
	fn failed_state_reports_error_kind() {
		let state = FetchState::Failed(Error::Cancelled { stage: crate::obs::Stage::Token });

		assert_eq!(state.phase(), FetchPhase::Failed(ErrorKind::Cancelled));
	}
}
