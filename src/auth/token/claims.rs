//! Local, signature-less decoding of access credential claims.
//!
//! The backend issues JWT access tokens. The client only needs the `exp` claim to decide
//! whether a credential may still be attached to a request, so the payload segment is
//! decoded without verifying the signature (the backend remains the authority).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors raised when an access credential cannot be decoded locally.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimsDecodeError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Access token is not a three-segment JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Access token payload is not valid base64url.")]
	Encoding,
	/// Payload JSON is missing `exp` or has the wrong shape.
	#[error("Access token payload is invalid: {message}.")]
	Payload {
		/// Parser message.
		message: String,
	},
	/// `exp` lies outside the representable range.
	#[error("Access token expiry is out of range.")]
	ExpiryOutOfRange,
}

/// Claims the client reads from an access credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
	/// Expiry as seconds since the Unix epoch.
	pub exp: i64,
	/// Subject user id, when the backend includes it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<u64>,
}
impl AccessClaims {
	/// Decodes the payload segment of `token`.
	pub fn decode(token: &str) -> Result<Self, ClaimsDecodeError> {
		let mut segments = token.split('.');
		let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
			(Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
			_ => return Err(ClaimsDecodeError::Malformed),
		};
		let bytes = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|_| ClaimsDecodeError::Encoding)?;

		serde_json::from_slice(&bytes)
			.map_err(|e| ClaimsDecodeError::Payload { message: e.to_string() })
	}

	/// Expiry instant.
	pub fn expires_at(&self) -> Result<OffsetDateTime, ClaimsDecodeError> {
		OffsetDateTime::from_unix_timestamp(self.exp)
			.map_err(|_| ClaimsDecodeError::ExpiryOutOfRange)
	}

	/// Returns `true` once `instant` is past the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		match self.expires_at() {
			Ok(expires_at) => expires_at < instant,
			Err(_) => true,
		}
	}
}

/// Returns `true` when `token` cannot be used at `instant`, either because it decodes to a
/// past expiry or because it cannot be decoded at all.
pub fn access_expired_at(token: &str, instant: OffsetDateTime) -> bool {
	AccessClaims::decode(token).map(|claims| claims.is_expired_at(instant)).unwrap_or(true)
}
