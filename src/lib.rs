//! Fetch one Azure Key Vault secret with the host's managed identity: a single IMDS token
//! exchange followed by a single secret read, with typed errors for both calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod imds;
pub mod obs;
pub mod vault;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		ops::Deref,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(feature = "cli")] use {clap as _, color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {color_eyre as _, httpmock as _, parking_lot as _};
