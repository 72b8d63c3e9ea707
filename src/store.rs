//! Credential persistence contract and built-in store implementations.
//!
//! A store is a plain key-value boundary: it performs no validation and never decides whether
//! a session is usable. Its lifetime is process-wide; entries are cleared only by logout or an
//! unrecoverable refresh failure.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Storage key under which the access credential is persisted.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key under which the refresh credential is persisted.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Boxed future returned by [`TokenStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the access/refresh credential pair.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Writes whichever credential is present, preserving the other one.
	fn set_tokens(
		&self,
		access: Option<TokenSecret>,
		refresh: Option<TokenSecret>,
	) -> StoreFuture<'_, ()>;

	/// Returns the stored access credential, if any.
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Returns the stored refresh credential, if any.
	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Clears both credentials.
	fn remove_tokens(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Key-value snapshot shared by the built-in stores.
pub(crate) type Entries = BTreeMap<String, String>;

pub(crate) fn apply_tokens(
	entries: &mut Entries,
	access: Option<TokenSecret>,
	refresh: Option<TokenSecret>,
) {
	if let Some(access) = access {
		entries.insert(ACCESS_TOKEN_KEY.into(), access.expose().to_owned());
	}
	if let Some(refresh) = refresh {
		entries.insert(REFRESH_TOKEN_KEY.into(), refresh.expose().to_owned());
	}
}

pub(crate) fn read_token(entries: &Entries, key: &str) -> Option<TokenSecret> {
	entries.get(key).map(|value| TokenSecret::new(value.as_str()))
}

pub(crate) fn clear_tokens(entries: &mut Entries) {
	entries.remove(ACCESS_TOKEN_KEY);
	entries.remove(REFRESH_TOKEN_KEY);
}
