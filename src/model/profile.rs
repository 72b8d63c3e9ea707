//! Authenticated user's profile.

// self
use crate::_prelude::*;

/// Profile of the signed-in user; replaced wholesale on every update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Login name.
	pub username: String,
	/// Contact email.
	#[serde(default)]
	pub email: String,
	/// Contact phone number.
	#[serde(default)]
	pub phone_number: Option<String>,
	/// Given name.
	#[serde(default)]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default)]
	pub last_name: Option<String>,
}
impl UserProfile {
	/// Name shown to the payment widget: the username, then the first name, then a generic
	/// placeholder.
	pub fn display_name(&self) -> &str {
		[Some(self.username.as_str()), self.first_name.as_deref()]
			.into_iter()
			.flatten()
			.find(|name| !name.trim().is_empty())
			.unwrap_or("Passenger")
	}
}

/// Partial profile update; only present fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
	/// New email.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// New phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<String>,
	/// New given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// New family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
}
