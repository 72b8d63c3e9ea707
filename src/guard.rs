//! Access check that gates the guarded views behind a live session.
//!
//! The check is re-run on every entry and never cached. The guard performs its own refresh
//! through [`ApiGateway::exchange_refresh`] rather than relying on request interception, so
//! no guarded content is reported renderable until the credential is known to be valid.

// self
use crate::{
	_prelude::*,
	auth::{self, TokenSecret},
	gateway::ApiGateway,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	shell::{Shell, View},
};

/// Guard progress for the latest entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GuardState {
	/// Check in progress; nothing may be rendered.
	#[default]
	Pending,
	/// Credential is valid; guarded views may render.
	Ready,
	/// Check failed; the shell was sent to the login view.
	Redirected,
}

/// Result of [`RouteGuard::enter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardDecision {
	/// Render the requested view.
	Render(View),
	/// The user was redirected to the login view.
	RedirectToLogin,
}

/// Gate in front of [`View::is_guarded`] views.
pub struct RouteGuard {
	gateway: Arc<ApiGateway>,
	shell: Arc<dyn Shell>,
	state: RwLock<GuardState>,
}
impl RouteGuard {
	/// Creates a guard in the pending state.
	pub fn new(gateway: Arc<ApiGateway>, shell: Arc<dyn Shell>) -> Self {
		Self { gateway, shell, state: Default::default() }
	}

	/// State of the latest guarded entry.
	pub fn state(&self) -> GuardState {
		*self.state.read()
	}

	/// Checks whether `view` may render.
	///
	/// Public views always render. Guarded views render only when a stored access credential
	/// is unexpired, or when an expired one is refreshed successfully. Otherwise both
	/// credentials are cleared and the shell is sent to the login view.
	pub async fn enter(&self, view: View) -> GuardDecision {
		if !view.is_guarded() {
			return GuardDecision::Render(view);
		}

		const KIND: FlowKind = FlowKind::Guard;

		let span = FlowSpan::new(KIND, "enter");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		*self.state.write() = GuardState::Pending;

		let result = span.instrument(self.check()).await;

		obs::record_result(KIND, &result);

		match result {
			Ok(()) => {
				*self.state.write() = GuardState::Ready;

				GuardDecision::Render(view)
			},
			Err(err) => {
				obs::log_failure(KIND, "enter", &err);

				if let Err(err) = self.gateway.store.remove_tokens().await {
					obs::log_failure(KIND, "remove_tokens", &err);
				}

				self.gateway.set_default_bearer(None);
				*self.state.write() = GuardState::Redirected;
				self.shell.navigate(View::Login);

				GuardDecision::RedirectToLogin
			},
		}
	}

	async fn check(&self) -> Result<(), GuardRejection> {
		let store = &self.gateway.store;
		let access = store.access_token().await?.ok_or(GuardRejection::NoSession)?;

		if !auth::access_expired_at(access.expose(), OffsetDateTime::now_utc()) {
			return Ok(());
		}

		let refresh = store.refresh_token().await?.ok_or(GuardRejection::NoRefreshToken)?;
		let fresh: TokenSecret = self.gateway.exchange_refresh(&refresh).await?;

		store.set_tokens(Some(fresh.clone()), None).await?;
		self.gateway.set_default_bearer(Some(fresh));

		Ok(())
	}
}
impl Debug for RouteGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RouteGuard").field("state", &self.state()).finish()
	}
}

#[derive(Debug, ThisError)]
enum GuardRejection {
	#[error("No access token is stored.")]
	NoSession,
	#[error("Access token expired and no refresh token is stored.")]
	NoRefreshToken,
	#[error(transparent)]
	Store(#[from] crate::store::StoreError),
	#[error(transparent)]
	Refresh(#[from] Error),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		http::{ApiRequest, ApiTransport, TransportFuture},
		shell::RecordingShell,
		store::{MemoryStore, TokenStore},
	};

	struct Offline;
	impl ApiTransport for Offline {
		fn execute(&self, _: ApiRequest) -> TransportFuture<'_> {
			Box::pin(async { Err(std::io::Error::other("offline").into()) })
		}
	}

	fn guard(store: MemoryStore) -> (RouteGuard, Arc<RecordingShell>) {
		let shell = Arc::new(RecordingShell::default());
		let gateway = ApiGateway::new(
			Url::parse("https://api.example.com/api/").expect("Base URL fixture should parse."),
			Arc::new(Offline),
			Arc::new(store),
			shell.clone(),
		);

		(RouteGuard::new(Arc::new(gateway), shell.clone()), shell)
	}

	#[tokio::test]
	async fn public_views_skip_the_check() {
		let (guard, shell) = guard(MemoryStore::default());

		assert_eq!(guard.enter(View::Destinations).await, GuardDecision::Render(View::Destinations));
		assert_eq!(guard.state(), GuardState::Pending);
		assert!(shell.navigations().is_empty());
	}

	#[tokio::test]
	async fn missing_session_redirects() {
		let (guard, shell) = guard(MemoryStore::default());

		assert_eq!(guard.enter(View::Profile).await, GuardDecision::RedirectToLogin);
		assert_eq!(guard.state(), GuardState::Redirected);
		assert_eq!(shell.current_view(), Some(View::Login));
	}

	#[tokio::test]
	async fn undecodable_token_with_unreachable_refresh_clears_credentials() {
		let store = MemoryStore::with_tokens(Some("not-a-jwt"), Some("R1"));
		let (guard, _) = guard(store.clone());

		assert_eq!(guard.enter(View::MyBookings).await, GuardDecision::RedirectToLogin);
		assert_eq!(store.access_token().await.expect("Read should succeed."), None);
		assert_eq!(store.refresh_token().await.expect("Read should succeed."), None);
	}
}
