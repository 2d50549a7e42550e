//! Strongly typed identifiers validated before they reach a URL.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
				let view = value.as_ref();

				$validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = ValidationError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!(stringify!($name), "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = ValidationError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const CLIENT_ID_MAX_LEN: usize = 128;

/// Error returned when caller-supplied input fails validation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// The value was empty.
	#[error("The {kind} cannot be empty.")]
	Empty {
		/// Kind of value (vault name, secret name, client ID).
		kind: &'static str,
	},
	/// The value contains a character outside `0-9`, `a-z`, `A-Z`, and `-`.
	#[error("The {kind} must contain only 0-9, a-z, A-Z, and - (found {character:?}).")]
	InvalidCharacter {
		/// Kind of value (vault name, secret name).
		kind: &'static str,
		/// First offending character.
		character: char,
	},
	/// The value contains whitespace characters.
	#[error("The {kind} contains whitespace.")]
	ContainsWhitespace {
		/// Kind of value (client ID).
		kind: &'static str,
	},
	/// The value exceeded the allowed character count.
	#[error("The {kind} exceeds {max} characters.")]
	TooLong {
		/// Kind of value (client ID).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { VaultName, "Short name of a Key Vault; the vault lives at `https://<name>.vault.azure.net`.", "vault name", validate_label }
def_id! { SecretName, "Name of a secret stored in the vault, restricted to `[A-Za-z0-9-]+`.", "secret name", validate_label }
def_id! { ClientId, "Client identifier of a user-assigned managed identity.", "client ID", validate_client_id }

fn validate_label(kind: &'static str, view: &str) -> Result<(), ValidationError> {
	if view.is_empty() {
		return Err(ValidationError::Empty { kind });
	}
	if let Some(character) = view.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
		return Err(ValidationError::InvalidCharacter { kind, character });
	}

	Ok(())
}

fn validate_client_id(kind: &'static str, view: &str) -> Result<(), ValidationError> {
	if view.is_empty() {
		return Err(ValidationError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(ValidationError::ContainsWhitespace { kind });
	}
	if view.len() > CLIENT_ID_MAX_LEN {
		return Err(ValidationError::TooLong { kind, max: CLIENT_ID_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_names_accept_alphanumerics_and_hyphens() {
		for name in ["db-password", "A", "0", "-", "Mixed-Case-123"] {
			let secret = SecretName::new(name).expect("Secret name fixture should be valid.");

			assert_eq!(secret.as_ref(), name);
		}
	}

	#[test]
	fn secret_names_reject_everything_else() {
		assert_eq!(SecretName::new(""), Err(ValidationError::Empty { kind: "secret name" }));

		for (name, character) in [
			("db_password", '_'),
			("db password", ' '),
			("../etc", '.'),
			("a/b", '/'),
			("name?x=1", '?'),
			("café", 'é'),
			("tab\t", '\t'),
		] {
			assert_eq!(
				SecretName::new(name),
				Err(ValidationError::InvalidCharacter { kind: "secret name", character }),
				"`{name}` must be rejected."
			);
		}
	}

	#[test]
	fn validation_message_names_the_allowed_alphabet() {
		let err = SecretName::new("bad_name").expect_err("Underscore must be rejected.");

		assert_eq!(
			err.to_string(),
			"The secret name must contain only 0-9, a-z, A-Z, and - (found '_')."
		);
	}

	#[test]
	fn vault_names_cannot_inject_into_the_host() {
		assert!(VaultName::new("myvault").is_ok());
		assert!(VaultName::new("evil.example.com/").is_err());
		assert!(VaultName::new("user@host").is_err());
		assert!(VaultName::new("").is_err());
	}

	#[test]
	fn client_ids_reject_whitespace_and_oversized_values() {
		let id = ClientId::new("00000000-0000-0000-0000-000000000000")
			.expect("GUID fixture should be valid.");

		assert_eq!(format!("{id:?}"), "ClientId(00000000-0000-0000-0000-000000000000)");
		assert!(ClientId::new(" leading").is_err());
		assert!(ClientId::new("").is_err());
		assert_eq!(
			ClientId::new("x".repeat(CLIENT_ID_MAX_LEN + 1)),
			Err(ValidationError::TooLong { kind: "client ID", max: CLIENT_ID_MAX_LEN })
		);
	}

	#[test]
	fn from_str_and_try_from_share_validation() {
		assert!("db-password".parse::<SecretName>().is_ok());
		assert!(SecretName::try_from(String::from("db password")).is_err());
	}
}
