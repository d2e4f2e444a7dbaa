//! Storage keys and the access/refresh pair issued at sign-in.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Fixed storage slot for one of the two persisted bearer tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKey {
	/// Short-lived token attached to every outgoing request.
	AccessToken,
	/// Long-lived token used only to obtain a new access token.
	RefreshToken,
}
impl TokenKey {
	/// Both keys, in teardown order.
	pub const ALL: [TokenKey; 2] = [TokenKey::AccessToken, TokenKey::RefreshToken];

	/// Returns the stable storage label for the key.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKey::AccessToken => "access_token",
			TokenKey::RefreshToken => "refresh_token",
		}
	}
}
impl Display for TokenKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token pair returned by the backend's login and registration endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access token attached to ordinary requests.
	pub access_token: TokenSecret,
	/// Refresh token exchanged for new access tokens.
	pub refresh_token: TokenSecret,
}
impl Credentials {
	/// Pairs an access token with its refresh token.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}
}
