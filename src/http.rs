//! Transport primitives shared by the token and secret calls.
//!
//! [`SecretHttpClient`] is the crate's only dependency on an HTTP stack: a single "perform
//! request, get response" capability over the `oauth2` crate's [`HttpRequest`] and
//! [`HttpResponse`] types (plain `http` 1.x values). [`send`] wraps every call with the
//! shared timeout and cancellation policy and funnels transport failures through a
//! [`TransportErrorMapper`].

mod mapper;

pub use mapper::*;
pub use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderValue, Method, StatusCode, header},
};

// self
use crate::{
	_prelude::*,
	error::{ConfigError, MalformedResponseError, TransportError},
	obs::Stage,
};

/// Boxed future returned by [`SecretHttpClient::call`].
pub type HttpFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing one request.
///
/// Implementations must be `Send + Sync + 'static` so a [`SecretClient`](crate::client::SecretClient)
/// can hold them behind an `Arc`, and the returned future must be `Send` so callers may
/// spawn the whole run onto a multi-threaded runtime. Timeouts and cancellation are applied
/// by the caller; transports only need to perform the round trip.
pub trait SecretHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Performs `request` and returns the full response, whatever its status.
	fn call(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Neither endpoint is expected to redirect, so [`ReqwestHttpClient::new`] disables redirect
/// following; a redirect surfaces as a non-success status instead of silently forwarding the
/// `Authorization` header elsewhere.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl SecretHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn call(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			// Carries hyper's `ReasonPhrase` when the server sent a non-canonical one.
			let extensions = response.extensions().clone();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;
			*response_new.extensions_mut() = extensions;

			Ok(response_new)
		})
	}
}

/// Builds a body-less GET request for `url` with the provided headers.
pub(crate) fn get_request(
	url: &Url,
	headers: &[(header::HeaderName, HeaderValue)],
) -> Result<HttpRequest> {
	let mut builder = oauth2::http::Request::builder().method(Method::GET).uri(url.as_str());

	for (name, value) in headers {
		builder = builder.header(name.clone(), value.clone());
	}

	builder.body(Vec::new()).map_err(|e| ConfigError::from(e).into())
}

/// Dispatches `request` under the shared timeout + cancellation policy.
///
/// Cancellation wins over an in-flight call and over a call that has not started yet; the
/// timeout covers the whole round trip including the body read.
pub(crate) async fn send<C, M>(
	client: &C,
	mapper: &M,
	stage: Stage,
	request: HttpRequest,
	timeout: Duration,
	cancel: &CancellationToken,
) -> Result<HttpResponse>
where
	C: ?Sized + SecretHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	if cancel.is_cancelled() {
		return Err(Error::Cancelled { stage });
	}

	let call = tokio::time::timeout(timeout, client.call(request));

	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled { stage }),
		outcome = call => match outcome {
			Ok(result) => result.map_err(|e| mapper.map_transport_error(stage, timeout, e)),
			Err(_) => Err(Error::Timeout { stage, timeout }),
		},
	}
}

/// Rejects any non-2xx response, keeping only the status line.
pub(crate) fn ensure_success(stage: Stage, response: &HttpResponse) -> Result<()> {
	let status = response.status();

	if status.is_success() {
		return Ok(());
	}

	Err(Error::Transport { stage, source: TransportError::status(status, reason_phrase(response)) })
}

/// Reason phrase from the server's status line, when the transport preserved one.
///
/// hyper only records the phrase when it differs from the canonical reason for the status.
fn reason_phrase(response: &HttpResponse) -> Option<&str> {
	#[cfg(feature = "reqwest")]
	{
		response
			.extensions()
			.get::<hyper::ext::ReasonPhrase>()
			.and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
	}
	#[cfg(not(feature = "reqwest"))]
	{
		let _ = response;

		None
	}
}

/// Decodes a JSON body, reporting the failing path on error.
pub(crate) fn decode_json<T>(body: &[u8]) -> Result<T, MalformedResponseError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| MalformedResponseError::Json { source })
}
