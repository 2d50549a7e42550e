//! Vault secret fetcher: reads the current version of one secret with a bearer token.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SecretName, SecretValue, VaultName},
	client::SecretClient,
	error::{ConfigError, MalformedResponseError},
	http::{self, HeaderValue, SecretHttpClient, TransportErrorMapper, header},
	obs::{self, CallOutcome, CallSpan, Stage},
};

/// DNS suffix shared by every public-cloud vault.
pub const VAULT_DNS_SUFFIX: &str = "vault.azure.net";
/// Key Vault API version requested by the secret read.
pub const SECRET_API_VERSION: &str = "2016-10-01";

/// Secret bundle returned by `GET /secrets/<name>`.
#[derive(Debug, Deserialize)]
struct SecretBundle {
	#[allow(dead_code)]
	#[serde(default)]
	id: Option<String>,
	value: String,
}

/// Appends `/secrets/<name>` and the API version to a vault base URL.
///
/// `name` is already restricted to `[A-Za-z0-9-]+`, so it always forms exactly one path segment.
pub fn secret_url(base: &Url, name: &SecretName) -> Result<Url> {
	let mut url = base.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::CannotBeABase { url: base.to_string() })?
		.pop_if_empty()
		.push("secrets")
		.push(name);
	url.query_pairs_mut().append_pair("api-version", SECRET_API_VERSION);

	Ok(url)
}

/// Extracts the secret value from a vault response body, verbatim.
pub fn parse_secret_response(body: &[u8]) -> Result<SecretValue, MalformedResponseError> {
	let bundle: SecretBundle = http::decode_json(body)?;

	Ok(SecretValue::new(bundle.value))
}

fn bearer(token: &AccessToken) -> Result<HeaderValue> {
	let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose()))
		.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

	value.set_sensitive(true);

	Ok(value)
}

impl<C, M> SecretClient<C, M>
where
	C: ?Sized + SecretHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Reads `name` from `vault` using a token obtained earlier in the same run.
	///
	/// The base URL comes from
	/// [`ClientConfig::vault_base_url`](crate::config::ClientConfig::vault_base_url). Performs
	/// exactly one GET; non-success statuses report the status line only, never the body.
	pub async fn retrieve_secret(
		&self,
		vault: &VaultName,
		name: &SecretName,
		token: &AccessToken,
		cancel: &CancellationToken,
	) -> Result<SecretValue> {
		const STAGE: Stage = Stage::Secret;

		let url = secret_url(&self.config.vault_base_url(vault)?, name)?;
		let span = CallSpan::new(STAGE, &url);

		obs::record_call_outcome(STAGE, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = http::get_request(&url, &[(header::AUTHORIZATION, bearer(token)?)])?;
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

				parse_secret_response(response.body())
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn name(value: &str) -> SecretName {
		SecretName::new(value).expect("Secret name fixture should be valid.")
	}

	#[test]
	fn secret_url_targets_named_secret() {
		let base = Url::parse("https://myvault.vault.azure.net/").expect("Fixture URL should parse.");
		let url = secret_url(&base, &name("db-password")).expect("Secret URL should build.");

		assert_eq!(
			url.as_str(),
			"https://myvault.vault.azure.net/secrets/db-password?api-version=2016-10-01"
		);
	}

	#[test]
	fn secret_url_keeps_base_path_prefix() {
		let base = Url::parse("http://127.0.0.1:8200/kv/").expect("Fixture URL should parse.");
		let url = secret_url(&base, &name("api-key")).expect("Secret URL should build.");

		assert_eq!(url.as_str(), "http://127.0.0.1:8200/kv/secrets/api-key?api-version=2016-10-01");
	}

	#[test]
	fn secret_url_rejects_opaque_bases() {
		let base = Url::parse("data:text/plain,vault").expect("Fixture URL should parse.");

		assert!(matches!(
			secret_url(&base, &name("x")),
			Err(Error::Config(ConfigError::CannotBeABase { .. }))
		));
	}

	#[test]
	fn secret_value_is_returned_verbatim() {
		let body = br#"{"id":"https://kv.vault.azure.net/secrets/foo/v1","value":"  s3cr3t\n"}"#;
		let value = parse_secret_response(body).expect("Secret response should parse.");

		assert_eq!(value.expose(), "  s3cr3t\n");
	}

	#[test]
	fn missing_value_is_malformed() {
		let err = parse_secret_response(br#"{"id":"https://kv.vault.azure.net/secrets/foo/v1"}"#)
			.expect_err("Missing value must be rejected.");

		assert!(matches!(err, MalformedResponseError::Json { .. }));
	}

	#[test]
	fn bearer_header_is_sensitive() {
		let value = bearer(&AccessToken::new("tok123")).expect("Header should build.");

		assert_eq!(value, "Bearer tok123");
		assert!(value.is_sensitive());
	}
}
