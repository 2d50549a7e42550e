//! Client that runs the identity-exchange-then-fetch protocol.
//!
//! [`SecretClient`] owns the transport, the transport error mapper, and the run
//! configuration. The token exchange lives in [`imds`](crate::imds) and the secret read in
//! [`vault`](crate::vault); [`SecretClient::run`] sequences them through a linear state
//! machine:
//!
//! `Start → TokenRequested → TokenObtained → SecretRequested → SecretObtained`
//!
//! Any step may fall through to `Failed`, which is terminal. There is no retry edge, and a
//! failed token exchange never reaches the secret read.

mod state;

pub use state::{FetchPhase, FetchRun};

// self
use crate::{
	_prelude::*,
	auth::{SecretName, SecretValue},
	config::ClientConfig,
	http::{DefaultTransportErrorMapper, SecretHttpClient, TransportErrorMapper},
	obs,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};
use state::FetchState;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestSecretClient = SecretClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs one token exchange followed by one secret read.
pub struct SecretClient<C, M = DefaultTransportErrorMapper>
where
	C: ?Sized + SecretHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for both calls.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Target vault, identity, timeout, and endpoint overrides.
	pub config: ClientConfig,
}
impl<C, M> SecretClient<C, M>
where
	C: ?Sized + SecretHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { http_client: http_client.into(), transport_mapper: mapper.into(), config }
	}

	/// Fetches `secret_name` from the configured vault.
	///
	/// The name is validated before any network call. Exactly one token exchange and at most one
	/// secret read are performed.
	pub async fn fetch_secret(
		&self,
		secret_name: &str,
		cancel: &CancellationToken,
	) -> Result<SecretValue> {
		self.run(secret_name, cancel).await.into_result()
	}

	/// Like [`SecretClient::fetch_secret`], but also reports every phase the run visited.
	pub async fn run(&self, secret_name: &str, cancel: &CancellationToken) -> FetchRun {
		let mut state = FetchState::Start { secret_name: secret_name.to_owned() };
		let mut phases = vec![state.phase()];

		obs::record_phase(state.phase());

		let outcome = loop {
			state = match state {
				FetchState::SecretObtained(value) => break Ok(value),
				FetchState::Failed(err) => break Err(err),
				pending => self.advance(pending, cancel).await,
			};

			phases.push(state.phase());
			obs::record_phase(state.phase());
		};

		FetchRun::new(phases, outcome)
	}

	async fn advance(&self, state: FetchState, cancel: &CancellationToken) -> FetchState {
		match state {
			FetchState::Start { secret_name } => match SecretName::new(&secret_name) {
				Ok(secret_name) => FetchState::TokenRequested { secret_name },
				Err(err) => FetchState::Failed(err.into()),
			},
			FetchState::TokenRequested { secret_name } =>
				match self.acquire_token(self.config.identity.as_ref(), cancel).await {
					Ok(token) => FetchState::TokenObtained { secret_name, token },
					Err(err) => FetchState::Failed(err),
				},
			FetchState::TokenObtained { secret_name, token } =>
				FetchState::SecretRequested { secret_name, token },
			FetchState::SecretRequested { secret_name, token } => match self
				.retrieve_secret(&self.config.vault, &secret_name, &token, cancel)
				.await
			{
				Ok(value) => FetchState::SecretObtained(value),
				Err(err) => FetchState::Failed(err),
			},
			terminal @ (FetchState::SecretObtained(_) | FetchState::Failed(_)) => terminal,
		}
	}
}
#[cfg(feature = "reqwest")]
impl SecretClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by its own reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Ok(Self::with_http_client(config, ReqwestHttpClient::new()?, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for SecretClient<C, M>
where
	C: ?Sized + SecretHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SecretClient").field("config", &self.config).finish()
	}
}
