//! Identity token provider backed by the instance metadata service (IMDS).
//!
//! The metadata service exchanges the host's managed identity for a bearer token scoped to
//! the Key Vault audience. The request is a plain GET carrying the `Metadata: true` header;
//! the service rejects requests without it. A 200 alone does not prove a usable token, so an
//! empty or missing `access_token` is reported as a malformed response.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId},
	client::SecretClient,
	error::MalformedResponseError,
	http::{self, HeaderValue, SecretHttpClient, TransportErrorMapper, header::HeaderName},
	obs::{self, CallOutcome, CallSpan, Stage},
};

/// Token endpoint of the instance metadata service.
pub const TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
/// IMDS API version requested by the token exchange.
pub const TOKEN_API_VERSION: &str = "2018-02-01";
/// Audience of the requested token.
pub const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Token response issued by the metadata service.
///
/// IMDS encodes the timing fields as decimal strings; some hosts emit numbers instead, so both
/// shapes are accepted. Fields other than `access_token` are informational and never fail the
/// decode, whatever their JSON type. Only `access_token` survives past [`parse_token_response`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
struct ManagedIdentityTokenResponse {
	access_token: String,
	expires_on: Option<NumericField>,
	resource: Option<serde_json::Value>,
	token_type: Option<serde_json::Value>,
}
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
impl ManagedIdentityTokenResponse {
	fn expires_at(&self) -> Option<OffsetDateTime> {
		let seconds = self.expires_on.as_ref()?.as_i64()?;

		OffsetDateTime::from_unix_timestamp(seconds).ok()
	}

	fn resource(&self) -> Option<&str> {
		self.resource.as_ref()?.as_str()
	}

	fn token_type(&self) -> Option<&str> {
		self.token_type.as_ref()?.as_str()
	}
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
enum NumericField {
	Number(i64),
	Text(String),
	Other(serde::de::IgnoredAny),
}
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
impl NumericField {
	fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Number(value) => Some(*value),
			Self::Text(value) => value.trim().parse().ok(),
			Self::Other(_) => None,
		}
	}
}

/// Builds the token URL for `identity`; `None` selects the system-assigned identity.
pub fn token_url(endpoint: &Url, identity: Option<&ClientId>) -> Url {
	let mut url = endpoint.clone();

	{
		let mut query = url.query_pairs_mut();

		query.append_pair("api-version", TOKEN_API_VERSION).append_pair("resource", VAULT_RESOURCE);

		if let Some(identity) = identity {
			query.append_pair("client_id", identity);
		}
	}

	url
}

/// Extracts the access token from a metadata-service response body.
pub fn parse_token_response(body: &[u8]) -> Result<AccessToken, MalformedResponseError> {
	let response: ManagedIdentityTokenResponse = http::decode_json(body)?;

	if response.access_token.is_empty() {
		return Err(MalformedResponseError::EmptyAccessToken);
	}

	if HeaderValue::from_str(&response.access_token).is_err() {
		return Err(MalformedResponseError::InvalidAccessToken);
	}

	log_token_metadata(&response);

	Ok(AccessToken::new(response.access_token))
}

fn log_token_metadata(response: &ManagedIdentityTokenResponse) {
	#[cfg(feature = "tracing")]
	{
		let expires_at = response
			.expires_at()
			.and_then(|at| at.format(&time::format_description::well_known::Rfc3339).ok());

		tracing::debug!(
			resource = response.resource(),
			token_type = response.token_type(),
			expires_at = expires_at.as_deref(),
			"managed identity token issued"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = response;
	}
}

impl<C, M> SecretClient<C, M>
where
	C: ?Sized + SecretHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the managed identity for a bearer token scoped to Key Vault.
	///
	/// Performs exactly one GET against the metadata service; nothing is retried.
	pub async fn acquire_token(
		&self,
		identity: Option<&ClientId>,
		cancel: &CancellationToken,
	) -> Result<AccessToken> {
		const STAGE: Stage = Stage::Token;

		let url = token_url(&self.config.token_endpoint()?, identity);
		let span = CallSpan::new(STAGE, &url);

		obs::record_call_outcome(STAGE, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = http::get_request(&url, &[(
					HeaderName::from_static("metadata"),
					HeaderValue::from_static("true"),
				)])?;
				let response = http::send(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					STAGE,
					request,
					self.config.timeout,
					cancel,
				)
				.await?;

				http::ensure_success(STAGE, &response)?;

				parse_token_response(response.body())
					.map_err(|source| Error::MalformedResponse { stage: STAGE, source })
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(STAGE, CallOutcome::Success),
			Err(err) => {
				obs::record_call_outcome(STAGE, CallOutcome::Failure);
				obs::record_call_failure(STAGE, err);
			},
		}

		result
	}
}
