//! `azsecret`: print one Key Vault secret using the host's managed identity.

// std
use std::io::{self, Write};
// crates.io
use clap::{ArgAction, Parser};
use color_eyre::{
	Result,
	eyre::{WrapErr, eyre},
};
use tracing_subscriber::EnvFilter;
// self
use azsecret::{
	CancellationToken, auth::SecretName, client::ReqwestSecretClient, config::ClientConfig,
};

/// Retrieves a secret value stored in Azure Key Vault.
#[derive(Debug, Parser)]
#[command(name = "azsecret", version)]
struct Cli {
	/// Name of the secret (0-9, a-z, A-Z, and - only).
	#[arg(value_name = "SECRET_NAME")]
	secret_name: SecretName,
	/// Name of the Azure Key Vault.
	#[arg(short = 'k', long = "key-vault", env = "AZ_KEY_VAULT")]
	key_vault: Option<String>,
	/// Client ID of the Azure Managed Identity; the system-assigned identity is used when unset.
	#[arg(short = 'i', long = "identity", env = "AZ_MANAGED_IDENTITY")]
	identity: Option<String>,
	/// Increase log verbosity on stderr (repeatable).
	#[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
	verbose: u8,
}
impl Cli {
	fn client_config(&self) -> Result<ClientConfig> {
		let vault = self.key_vault.as_deref().map(str::trim).unwrap_or_default();

		if vault.is_empty() {
			return Err(eyre!("a key vault name is required; pass --key-vault or set AZ_KEY_VAULT"));
		}

		let identity = self.identity.as_deref().map(str::trim).unwrap_or_default();

		Ok(ClientConfig::from_parts(vault, identity)?)
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	init_tracing(cli.verbose);

	let client = ReqwestSecretClient::new(cli.client_config()?)?;
	let cancel = CancellationToken::new();
	let interrupt = cancel.clone();

	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			interrupt.cancel();
		}
	});

	let secret = client
		.fetch_secret(&cli.secret_name, &cancel)
		.await
		.wrap_err_with(|| format!("failed to retrieve secret `{}`", cli.secret_name))?;
	let mut stdout = io::stdout().lock();

	stdout.write_all(secret.expose().as_bytes())?;
	stdout.flush()?;

	Ok(())
}

fn init_tracing(verbose: u8) {
	let default_level = match verbose {
		0 => "error",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
