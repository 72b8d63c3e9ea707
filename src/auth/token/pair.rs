//! Access/refresh credential pair issued by the token endpoint.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Credentials issued on login. The refresh half is optional because the backend may rotate
/// only the access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived bearer credential.
	pub access: TokenSecret,
	/// Long-lived credential exchangeable for a new access token.
	#[serde(default)]
	pub refresh: Option<TokenSecret>,
}
impl CredentialPair {
	/// Creates a pair from raw token strings.
	pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
		Self { access: TokenSecret::new(access), refresh: refresh.map(TokenSecret::new) }
	}
}

/// Body returned by the refresh endpoint.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RefreshedAccess {
	pub(crate) access: Option<TokenSecret>,
}

/// Body returned by the token-issuance endpoint.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct IssuedTokens {
	#[serde(default)]
	pub(crate) access: Option<TokenSecret>,
	#[serde(default)]
	pub(crate) refresh: Option<TokenSecret>,
}
impl IssuedTokens {
	/// An issuance without an access credential is unusable.
	pub(crate) fn into_pair(self) -> Option<CredentialPair> {
		self.access.map(|access| CredentialPair { access, refresh: self.refresh })
	}
}
