//! Thread-safe in-memory [`TokenStore`] for headless sessions and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{
		self, ACCESS_TOKEN_KEY, Entries, REFRESH_TOKEN_KEY, StoreError, StoreFuture, TokenStore,
	},
};

type StoreMap = Arc<RwLock<Entries>>;

/// Store that keeps credentials in-process for the lifetime of the client.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Creates a store pre-seeded with credentials.
	pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
		let memory = Self::default();

		store::apply_tokens(
			&mut memory.0.write(),
			access.map(TokenSecret::from),
			refresh.map(TokenSecret::from),
		);

		memory
	}

	fn read_now(map: StoreMap, key: &'static str) -> Result<Option<TokenSecret>, StoreError> {
		Ok(store::read_token(&map.read(), key))
	}
}
impl TokenStore for MemoryStore {
	fn set_tokens(
		&self,
		access: Option<TokenSecret>,
		refresh: Option<TokenSecret>,
	) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			store::apply_tokens(&mut map.write(), access, refresh);

			Ok(())
		})
	}

	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Self::read_now(map, ACCESS_TOKEN_KEY) })
	}

	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Self::read_now(map, REFRESH_TOKEN_KEY) })
	}

	fn remove_tokens(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			store::clear_tokens(&mut map.write());

			Ok(())
		})
	}
}
