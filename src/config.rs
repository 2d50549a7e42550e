//! Explicit run configuration handed to [`SecretClient`](crate::client::SecretClient).
//!
//! Nothing in the library reads the environment; the binary resolves flags and
//! environment defaults once at startup and builds a [`ClientConfig`] from them.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, VaultName},
	error::ConfigError,
};

/// Per-call timeout applied to both the token exchange and the secret read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a run needs to know about its target vault and identity.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Vault that holds the secret.
	pub vault: VaultName,
	/// User-assigned identity to assume; `None` selects the system-assigned identity.
	pub identity: Option<ClientId>,
	/// Bound applied to each network call independently.
	pub timeout: Duration,
	/// Replacement for the metadata token endpoint.
	pub token_endpoint: Option<Url>,
	/// Replacement for the vault base URL (`https://<vault>.vault.azure.net`).
	pub vault_url: Option<Url>,
}
impl ClientConfig {
	/// Creates a configuration for `vault` using the system-assigned identity.
	pub fn new(vault: VaultName) -> Self {
		Self { vault, identity: None, timeout: DEFAULT_TIMEOUT, token_endpoint: None, vault_url: None }
	}

	/// Builds a configuration from raw strings, treating an empty identity as "system-assigned".
	pub fn from_parts(vault: &str, identity: &str) -> Result<Self> {
		let config = Self::new(VaultName::new(vault)?);
		let identity = if identity.is_empty() { None } else { Some(ClientId::new(identity)?) };

		Ok(config.with_identity(identity))
	}

	/// Sets or clears the user-assigned identity.
	pub fn with_identity(mut self, identity: impl Into<Option<ClientId>>) -> Self {
		self.identity = identity.into();

		self
	}

	/// Overrides the per-call timeout (defaults to 30 seconds).
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Points the token exchange at another endpoint.
	pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	/// Points the secret read at another vault base URL.
	pub fn with_vault_url(mut self, url: Url) -> Self {
		self.vault_url = Some(url);

		self
	}

	/// Resolves the metadata token endpoint.
	pub fn token_endpoint(&self) -> Result<Url> {
		match &self.token_endpoint {
			Some(endpoint) => Ok(endpoint.clone()),
			None => parse_url(crate::imds::TOKEN_ENDPOINT),
		}
	}

	/// Resolves the base URL of `vault`, honoring [`ClientConfig::vault_url`].
	pub fn vault_base_url(&self, vault: &VaultName) -> Result<Url> {
		match &self.vault_url {
			Some(url) => Ok(url.clone()),
			None => parse_url(&format!("https://{vault}.{}/", crate::vault::VAULT_DNS_SUFFIX)),
		}
	}
}

fn parse_url(raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { url: raw.to_owned(), source }.into())
}
