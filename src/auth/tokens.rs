//! Access/refresh token pairs and the keys they are stored under.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Storage slot for one half of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKey {
	/// Short-lived credential attached to API requests.
	AccessToken,
	/// Longer-lived credential used only to mint new access tokens.
	RefreshToken,
}
impl TokenKey {
	/// Every key a session occupies.
	pub const ALL: [TokenKey; 2] = [TokenKey::AccessToken, TokenKey::RefreshToken];

	/// Returns the stable storage label.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKey::AccessToken => "accessToken",
			TokenKey::RefreshToken => "refreshToken",
		}
	}
}
impl Display for TokenKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access and refresh token minted together by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
	/// Access token.
	#[serde(rename = "accessToken")]
	pub access: TokenSecret,
	/// Refresh token.
	#[serde(rename = "refreshToken")]
	pub refresh: TokenSecret,
}
impl SessionTokens {
	/// Pairs an access token with its refresh token.
	pub fn new(access: impl Into<TokenSecret>, refresh: impl Into<TokenSecret>) -> Self {
		Self { access: access.into(), refresh: refresh.into() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_pair_reads_backend_field_names() {
		let tokens: SessionTokens =
			serde_json::from_str("{\"accessToken\":\"T2\",\"refreshToken\":\"R2\"}")
				.expect("Token pair should deserialize.");

		assert_eq!(tokens.access.expose(), "T2");
		assert_eq!(tokens.refresh.expose(), "R2");
	}

	#[test]
	fn keys_use_storage_labels() {
		assert_eq!(TokenKey::AccessToken.to_string(), "accessToken");
		assert_eq!(
			serde_json::to_string(&TokenKey::RefreshToken).expect("Key should serialize."),
			"\"refreshToken\""
		);
	}
}
