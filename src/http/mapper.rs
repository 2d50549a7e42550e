//! Classification of transport failures into crate [`Error`] values.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::HttpClientError,
	obs::Stage,
};

/// Maps HTTP transport failures into crate [`Error`] values.
///
/// The shared timeout in [`send`](crate::http) already classifies calls that exceed their bound;
/// mappers handle everything a transport reports on its own (refused connections, DNS, TLS, or
/// a transport-level timeout that fires first).
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(&self, stage: Stage, timeout: Duration, error: HttpClientError<E>)
	-> Error;
}

/// Mapper for arbitrary transports: every transport-specific error becomes a network failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTransportErrorMapper;
impl<E> TransportErrorMapper<E> for DefaultTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, stage: Stage, _: Duration, err: HttpClientError<E>) -> Error {
		map_http_client_error(stage, err)
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		stage: Stage,
		timeout: Duration,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(stage, timeout, *inner),
			other => map_http_client_error(stage, other),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(stage: Stage, timeout: Duration, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return Error::Timeout { stage, timeout };
	}

	Error::Transport { stage, source: TransportError::from(err) }
}

fn map_http_client_error<E>(stage: Stage, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let source = match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner),
		HttpClientError::Http(inner) => return ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner),
		HttpClientError::Other(message) => TransportError::Other { message },
		other => TransportError::Other { message: format!("unhandled client error: {other}") },
	};

	Error::Transport { stage, source }
}

#[cfg(test)]
mod tests {
	// std
	use std::io::{Error as IoError, ErrorKind as IoErrorKind};
	// self
	use super::*;
	use crate::error::ErrorKind;

	#[derive(Debug, ThisError)]
	#[error("Connection refused.")]
	struct Refused;

	#[test]
	fn default_mapper_wraps_transport_errors_with_stage() {
		let err = DefaultTransportErrorMapper.map_transport_error(
			Stage::Token,
			Duration::from_secs(30),
			HttpClientError::Reqwest(Box::new(Refused)),
		);

		assert_eq!(err.kind(), ErrorKind::Transport);
		assert_eq!(err.stage(), Some(Stage::Token));

		let source = StdError::source(&err).expect("Transport errors must expose a source.");

		assert_eq!(source.to_string(), "Network error occurred while calling the endpoint.");
	}

	#[test]
	fn default_mapper_keeps_io_and_other_failures() {
		let err = <DefaultTransportErrorMapper as TransportErrorMapper<Refused>>::map_transport_error(
			&DefaultTransportErrorMapper,
			Stage::Secret,
			Duration::from_secs(30),
			HttpClientError::Io(IoError::new(IoErrorKind::ConnectionReset, "reset")),
		);

		assert!(matches!(err, Error::Transport { stage: Stage::Secret, source: TransportError::Io(_) }));

		let err = <DefaultTransportErrorMapper as TransportErrorMapper<Refused>>::map_transport_error(
			&DefaultTransportErrorMapper,
			Stage::Secret,
			Duration::from_secs(30),
			HttpClientError::Other("socket closed".into()),
		);

		assert!(matches!(
			err,
			Error::Transport { source: TransportError::Other { ref message }, .. } if message == "socket closed"
		));
	}
}
