//! Error types shared by the token provider, the secret fetcher, and the CLI.

// self
use crate::{_prelude::*, auth::ValidationError, obs::Stage};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Network-facing variants carry the [`Stage`] that failed so callers can tell the token
/// exchange apart from the secret read without inspecting messages.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller-supplied input was rejected before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Local configuration problem (HTTP client or request construction).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Non-success HTTP status or network-level failure.
	#[error("The {stage} request failed.")]
	Transport {
		/// Call that failed.
		stage: Stage,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// The call exceeded its timeout bound.
	#[error("The {stage} request timed out after {} seconds.", timeout.as_secs())]
	Timeout {
		/// Call that timed out.
		stage: Stage,
		/// Bound that was exceeded.
		timeout: Duration,
	},
	/// HTTP success, but the body was unusable.
	#[error("The {stage} endpoint returned a malformed response.")]
	MalformedResponse {
		/// Call whose response was rejected.
		stage: Stage,
		/// Parsing or validation failure.
		#[source]
		source: MalformedResponseError,
	},
	/// The caller aborted the run.
	#[error("The {stage} request was cancelled.")]
	Cancelled {
		/// Call that was in flight (or about to start) when cancellation arrived.
		stage: Stage,
	},
}
impl Error {
	/// Returns the coarse classification of this error.
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Validation(_) => ErrorKind::Validation,
			Self::Config(_) => ErrorKind::Config,
			Self::Transport { .. } => ErrorKind::Transport,
			Self::Timeout { .. } => ErrorKind::Timeout,
			Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
			Self::Cancelled { .. } => ErrorKind::Cancelled,
		}
	}

	/// Returns the call this error belongs to, if it came from the network stages.
	pub const fn stage(&self) -> Option<Stage> {
		match self {
			Self::Transport { stage, .. }
			| Self::Timeout { stage, .. }
			| Self::MalformedResponse { stage, .. }
			| Self::Cancelled { stage } => Some(*stage),
			Self::Validation(_) | Self::Config(_) => None,
		}
	}
}

/// Coarse error classification, used for state-machine labels and exit reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Input validation failed.
	Validation,
	/// Local configuration failed.
	Config,
	/// Transport or HTTP status failure.
	Transport,
	/// Timeout bound exceeded.
	Timeout,
	/// Response body unusable.
	MalformedResponse,
	/// Cancelled by the caller.
	Cancelled,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Validation => "validation",
			ErrorKind::Config => "config",
			ErrorKind::Transport => "transport",
			ErrorKind::Timeout => "timeout",
			ErrorKind::MalformedResponse => "malformed_response",
			ErrorKind::Cancelled => "cancelled",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration failures raised while preparing a call.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL could not be parsed.
	#[error("Endpoint URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An endpoint URL cannot carry path segments (e.g. `data:` URLs).
	#[error("Endpoint URL `{url}` cannot be used as a base URL.")]
	CannotBeABase {
		/// Offending URL text.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (HTTP status, network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Server answered with a non-success status. Only the status line is kept, never the body.
	#[error("Server responded with status: {status_text}.")]
	Status {
		/// Numeric HTTP status.
		status: u16,
		/// Status line text, e.g. `403 Forbidden`.
		status_text: String,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the endpoint.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure without a structured cause.
	#[error("HTTP client error occurred while calling the endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a [`TransportError::Status`] from a response status code.
	///
	/// `reason` is the phrase the server sent on its status line; the canonical reason for
	/// `status` is used when it is absent or blank.
	pub fn status(status: oauth2::http::StatusCode, reason: Option<&str>) -> Self {
		let reason = reason.map(str::trim).filter(|r| !r.is_empty()).or(status.canonical_reason());
		let status_text = match reason {
			Some(reason) => format!("{} {reason}", status.as_u16()),
			None => status.as_u16().to_string(),
		};

		Self::Status { status: status.as_u16(), status_text }
	}

	/// Returns the HTTP status code when the failure came from a response.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// The response arrived with a success status but could not be used.
#[derive(Debug, ThisError)]
pub enum MalformedResponseError {
	/// Body is not JSON of the expected shape.
	#[error("Response body could not be decoded.")]
	Json {
		/// Structured parsing failure, including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token response decoded, but the access token was missing or empty.
	#[error("Access token is empty.")]
	EmptyAccessToken,
	/// Access token holds characters that cannot be sent in an `Authorization` header.
	#[error("Access token contains characters that are not valid in an HTTP header.")]
	InvalidAccessToken,
}
