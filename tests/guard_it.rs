mod common;

// crates.io
use serde_json::json;
// self
use busbook_client::{
	auth::TokenSecret,
	guard::{GuardDecision, GuardState},
	http::Method,
	shell::View,
	store::{MemoryStore, TokenStore},
};
use common::{FakeWidget, ScriptedTransport, WidgetScript};

fn widget() -> FakeWidget {
	FakeWidget::new(WidgetScript::Dismiss)
}

#[tokio::test]
async fn unexpired_credential_renders_without_network() {
	let h = common::harness(
		MemoryStore::with_tokens(Some(&common::fresh_jwt()), Some("R1")),
		widget(),
	);

	assert_eq!(h.app.guard.enter(View::Booking).await, GuardDecision::Render(View::Booking));
	assert_eq!(h.app.guard.state(), GuardState::Ready);
	assert!(h.transport.requests().is_empty());
	assert!(h.shell.navigations().is_empty());
}

#[tokio::test]
async fn expired_credential_is_refreshed_before_rendering() {
	let h = common::harness(
		MemoryStore::with_tokens(Some(&common::expired_jwt()), Some("R1")),
		widget(),
	);
	let fresh = common::fresh_jwt();

	h.transport.on(Method::Post, "/api/auth/token/refresh/", 200, json!({ "access": fresh }));

	assert_eq!(h.app.guard.enter(View::MyBookings).await, GuardDecision::Render(View::MyBookings));
	assert_eq!(h.app.guard.state(), GuardState::Ready);
	assert_eq!(
		h.store.access_token().await.expect("Read should succeed."),
		Some(TokenSecret::new(fresh.clone()))
	);
	assert_eq!(
		h.store.refresh_token().await.expect("Read should succeed."),
		Some(TokenSecret::new("R1"))
	);
	assert_eq!(h.app.gateway.default_bearer(), Some(TokenSecret::new(fresh)));

	let requests = h.transport.requests_to(Method::Post, "/api/auth/token/refresh/");

	assert_eq!(requests.len(), 1);
	assert_eq!(ScriptedTransport::body_of(&requests[0]), json!({ "refresh": "R1" }));
}

#[tokio::test]
async fn rejected_refresh_clears_both_credentials_and_redirects() {
	let h = common::harness(
		MemoryStore::with_tokens(Some(&common::expired_jwt()), Some("R-revoked")),
		widget(),
	);

	h.transport.on(
		Method::Post,
		"/api/auth/token/refresh/",
		401,
		json!({ "detail": "Token is blacklisted" }),
	);

	assert_eq!(h.app.guard.enter(View::Profile).await, GuardDecision::RedirectToLogin);
	assert_eq!(h.app.guard.state(), GuardState::Redirected);
	assert_eq!(h.store.access_token().await.expect("Read should succeed."), None);
	assert_eq!(h.store.refresh_token().await.expect("Read should succeed."), None);
	assert_eq!(h.app.gateway.default_bearer(), None);
	assert_eq!(h.shell.current_view(), Some(View::Login));
}

#[tokio::test]
async fn expired_credential_without_refresh_redirects_without_network() {
	let h = common::harness(MemoryStore::with_tokens(Some(&common::expired_jwt()), None), widget());

	assert_eq!(h.app.guard.enter(View::Booking).await, GuardDecision::RedirectToLogin);
	assert!(h.transport.requests().is_empty());
	assert_eq!(h.shell.current_view(), Some(View::Login));
}

#[tokio::test]
async fn check_reruns_on_every_entry() {
	let h = common::harness(
		MemoryStore::with_tokens(Some(&common::fresh_jwt()), Some("R1")),
		widget(),
	);

	assert_eq!(h.app.guard.enter(View::Profile).await, GuardDecision::Render(View::Profile));

	h.store.remove_tokens().await.expect("Removal should succeed.");

	assert_eq!(h.app.guard.enter(View::Profile).await, GuardDecision::RedirectToLogin);
	assert_eq!(h.app.guard.enter(View::About).await, GuardDecision::Render(View::About));
	assert_eq!(h.app.guard.state(), GuardState::Redirected);
}
