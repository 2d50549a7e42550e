//! Scripted, recording transport shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
// self
use azsecret::{
	client::SecretClient,
	config::ClientConfig,
	http::{
		DefaultTransportErrorMapper, HttpClientError, HttpFuture, HttpRequest, HttpResponse,
		Method, SecretHttpClient, StatusCode, header::HeaderMap,
	},
	url::Url,
};

pub type FakeSecretClient = SecretClient<RecordingHttpClient, DefaultTransportErrorMapper>;

#[derive(Debug)]
pub enum FakeTransportError {
	ConnectionRefused,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ConnectionRefused => write!(f, "Connection refused."),
		}
	}
}
impl StdError for FakeTransportError {}

/// What the fake transport does for one call.
#[derive(Debug)]
pub enum Reply {
	Respond { status: u16, body: String },
	Fail(FakeTransportError),
	Hang,
}
impl Reply {
	pub fn ok(body: impl Into<String>) -> Self {
		Self::Respond { status: 200, body: body.into() }
	}

	pub fn status(status: u16) -> Self {
		Self::Respond { status, body: "{\"error\":\"body must never surface\"}".into() }
	}
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: Method,
	pub url: Url,
	pub headers: HeaderMap,
}

/// Transport that answers from a script and records every request it receives.
#[derive(Clone, Default)]
pub struct RecordingHttpClient {
	replies: Arc<Mutex<VecDeque<Reply>>>,
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
}
impl RecordingHttpClient {
	pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Self {
		Self { replies: Arc::new(Mutex::new(replies.into_iter().collect())), ..Default::default() }
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn call_count(&self) -> usize {
		self.requests.lock().len()
	}
}
impl SecretHttpClient for RecordingHttpClient {
	type TransportError = FakeTransportError;

	fn call(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let url = Url::parse(&request.uri().to_string()).expect("Request URI should be a valid URL.");

		self.requests.lock().push(RecordedRequest {
			method: request.method().clone(),
			url,
			headers: request.headers().clone(),
		});

		let reply = self.replies.lock().pop_front();

		Box::pin(async move {
			match reply {
				Some(Reply::Respond { status, body }) => {
					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					Ok(response)
				},
				Some(Reply::Fail(err)) => Err(HttpClientError::Reqwest(Box::new(err))),
				Some(Reply::Hang) => std::future::pending().await,
				None => Err(HttpClientError::Other("no scripted reply left".into())),
			}
		})
	}
}

pub fn config(vault: &str, identity: &str) -> ClientConfig {
	ClientConfig::from_parts(vault, identity).expect("Fixture config should be valid.")
}

pub fn client(config: ClientConfig, http: &RecordingHttpClient) -> FakeSecretClient {
	SecretClient::with_http_client(config, http.clone(), DefaultTransportErrorMapper)
}
