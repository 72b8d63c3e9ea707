//! File-backed [`TokenStore`] whose credentials survive client restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{
		self, ACCESS_TOKEN_KEY, Entries, REFRESH_TOKEN_KEY, StoreError, StoreFuture, TokenStore,
	},
};

/// Persists the credential entries to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Entries, StoreError> {
		if !path.exists() {
			return Ok(Entries::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(Entries::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Entries) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn set_tokens(
		&self,
		access: Option<TokenSecret>,
		refresh: Option<TokenSecret>,
	) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			store::apply_tokens(&mut guard, access, refresh);
			self.persist_locked(&guard)
		})
	}

	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(store::read_token(&self.inner.read(), ACCESS_TOKEN_KEY)) })
	}

	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(store::read_token(&self.inner.read(), REFRESH_TOKEN_KEY)) })
	}

	fn remove_tokens(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			store::clear_tokens(&mut guard);
			self.persist_locked(&guard)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"busbook_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[tokio::test]
	async fn credentials_survive_reopen() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");

		store
			.set_tokens(Some("access-1".into()), Some("refresh-1".into()))
			.await
			.expect("Failed to save credentials to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert_eq!(
			reopened.access_token().await.expect("Read should succeed."),
			Some("access-1".into())
		);
		assert_eq!(
			reopened.refresh_token().await.expect("Read should succeed."),
			Some("refresh-1".into())
		);

		reopened.remove_tokens().await.expect("Removal should succeed.");

		let cleared = FileStore::open(&path).expect("Failed to reopen cleared snapshot.");

		assert_eq!(cleared.access_token().await.expect("Read should succeed."), None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn snapshot_uses_fixed_storage_keys() {
		let path = temp_path();

		fs::write(&path, br#"{"access_token":"A","refresh_token":"R","theme":"dark"}"#)
			.expect("Failed to write snapshot fixture.");

		let store = FileStore::open(&path).expect("Failed to open snapshot fixture.");

		assert_eq!(store::read_token(&store.inner.read(), ACCESS_TOKEN_KEY), Some("A".into()));
		assert_eq!(store.inner.read().get("theme").map(String::as_str), Some("dark"));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
