//! Session lifecycle: login, logout, signup, profile updates, and startup reconciliation.
//!
//! The session is derived state. Nothing here is persisted beyond the credential pair in the
//! token store; the profile is rebuilt from the backend on every start.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, token::pair::IssuedTokens},
	bookings::BookingManager,
	error::{AuthError, ValidationError},
	gateway::{self, ApiGateway, TOKEN_PATH},
	http::Method,
	model::{BookingSort, ProfilePatch, UserProfile},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	shell::{Notice, Shell, View},
};

/// Profile endpoint.
pub const PROFILE_PATH: &str = "profile/";
/// Account creation endpoint.
pub const USERS_PATH: &str = "users/";
/// Minimum signup password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication state. A session is authenticated only together with its profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
	/// No usable credentials.
	#[default]
	Anonymous,
	/// Credentials were accepted and the profile was loaded.
	Authenticated(UserProfile),
}
impl Session {
	/// Whether a user is signed in.
	pub fn is_authenticated(&self) -> bool {
		matches!(self, Self::Authenticated(_))
	}

	/// Signed-in user's profile.
	pub fn user(&self) -> Option<&UserProfile> {
		match self {
			Self::Authenticated(profile) => Some(profile),
			Self::Anonymous => None,
		}
	}
}

/// Signup draft. Cleared after the account is created.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupForm {
	/// Requested login name.
	pub username: String,
	/// Contact phone number.
	pub phone_number: String,
	/// Contact email.
	pub email: String,
	/// Chosen password.
	pub password: String,
}
impl SignupForm {
	/// Resets every field.
	pub fn clear(&mut self) {
		*self = Self::default();
	}

	fn validate(&self) -> Result<(), ValidationError> {
		if self.password.chars().count() < MIN_PASSWORD_LEN {
			return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
		}

		Ok(())
	}
}
impl Debug for SignupForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignupForm")
			.field("username", &self.username)
			.field("phone_number", &self.phone_number)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Serialize)]
struct LoginBody<'a> {
	username: &'a str,
	password: &'a str,
}

/// Owns the session and orchestrates the token store, gateway, and booking collection.
pub struct SessionController {
	gateway: Arc<ApiGateway>,
	bookings: Arc<BookingManager>,
	shell: Arc<dyn Shell>,
	session: RwLock<Session>,
	default_sort: BookingSort,
	login_guard: AsyncMutex<()>,
}
impl SessionController {
	/// Creates a controller in the anonymous state.
	pub fn new(
		gateway: Arc<ApiGateway>,
		bookings: Arc<BookingManager>,
		shell: Arc<dyn Shell>,
		default_sort: BookingSort,
	) -> Self {
		Self {
			gateway,
			bookings,
			shell,
			session: Default::default(),
			default_sort,
			login_guard: AsyncMutex::new(()),
		}
	}

	/// Current session snapshot.
	pub fn session(&self) -> Session {
		self.session.read().clone()
	}

	/// Whether a user is signed in.
	pub fn is_authenticated(&self) -> bool {
		self.session.read().is_authenticated()
	}

	/// Signed-in user's profile.
	pub fn user(&self) -> Option<UserProfile> {
		self.session.read().user().cloned()
	}

	/// Exchanges credentials for a token pair, loads the profile, refreshes the booking
	/// collection, and navigates home.
	///
	/// Every failure clears partial credential state and surfaces the same
	/// [`AuthError::InvalidCredentials`]. Overlapping calls are serialized.
	pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<UserProfile> = span
			.instrument(async move {
				let _pending = self.login_guard.lock().await;

				match self.establish(username, password).await {
					Ok(profile) => {
						self.refresh_bookings().await;
						self.shell.navigate(View::Home);

						Ok(profile)
					},
					Err(err) => {
						obs::log_failure(KIND, "login", &err);
						self.clear_credentials().await;
						*self.session.write() = Session::Anonymous;

						Err(Error::from(AuthError::InvalidCredentials))
					},
				}
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Clears credentials, the default bearer, the session, and the booking collection, then
	/// navigates to the login view. Never fails.
	pub async fn logout(&self) {
		const KIND: FlowKind = FlowKind::Logout;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.clear_credentials().await;
		*self.session.write() = Session::Anonymous;
		self.bookings.clear();
		self.shell.navigate(View::Login);
		obs::record_flow_outcome(KIND, FlowOutcome::Success);
	}

	/// Creates an account from `form`.
	///
	/// The password length is checked before any request. On `201 Created` the shell shows
	/// a success notice and moves to the login view, and the form is cleared; any other
	/// outcome shows a generic failure notice and leaves the form as is.
	pub async fn signup(&self, form: &mut SignupForm) -> Result<()> {
		const KIND: FlowKind = FlowKind::Signup;

		form.validate()?;

		let span = FlowSpan::new(KIND, "signup");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(self.gateway.send(Method::Post, USERS_PATH, &[], Some(&*form)))
			.await
			.and_then(|response| match response.status {
				201 => Ok(()),
				_ => gateway::check_status(&response)
					.and(Err(Error::Api { status: response.status, message: None })),
			});

		match &result {
			Ok(()) => {
				self.shell.notify(Notice::success("Account created successfully"));
				self.shell.navigate(View::Login);
				form.clear();
			},
			Err(err) => {
				obs::log_failure(KIND, "signup", err);
				self.shell.notify(Notice::error("Registration failed"));
			},
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Sends a partial profile update and replaces the stored profile with the response.
	///
	/// Failures notify the user and are returned so the caller can keep its form open.
	pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<UserProfile> {
		const KIND: FlowKind = FlowKind::ProfileUpdate;

		let span = FlowSpan::new(KIND, "update_profile");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<UserProfile> =
			span.instrument(self.gateway.patch(PROFILE_PATH, patch)).await;

		match &result {
			Ok(profile) => {
				*self.session.write() = Session::Authenticated(profile.clone());
				self.shell.notify(Notice::success("Profile updated successfully!"));
			},
			Err(err) => {
				obs::log_failure(KIND, "update_profile", err);
				self.shell.notify(Notice::error("Failed to update profile. Please try again."));
			},
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Rebuilds the session from stored credentials on startup.
	///
	/// Without a stored access credential the session simply stays anonymous. Otherwise the
	/// profile is fetched through the gateway (refreshing if needed); success authenticates
	/// and refreshes the booking collection, failure is handled as a logout.
	pub async fn restore(&self) -> Session {
		const KIND: FlowKind = FlowKind::Restore;

		let span = FlowSpan::new(KIND, "restore");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<Option<UserProfile>> = span
			.instrument(async move {
				let Some(access) = self.gateway.store.access_token().await? else {
					return Ok(None);
				};

				self.gateway.set_default_bearer(Some(access));

				let profile: UserProfile = self.gateway.get(PROFILE_PATH).await?;

				Ok(Some(profile))
			})
			.await;

		obs::record_result(KIND, &result);

		match result {
			Ok(Some(profile)) => {
				*self.session.write() = Session::Authenticated(profile);
				self.refresh_bookings().await;
			},
			Ok(None) => *self.session.write() = Session::Anonymous,
			Err(err) => {
				obs::log_failure(KIND, "restore", &err);
				self.logout().await;
			},
		}

		self.session()
	}

	async fn establish(&self, username: &str, password: &str) -> Result<UserProfile> {
		// Stale credentials must not be refreshed or attached to the token request.
		self.clear_credentials().await;

		let issued: IssuedTokens =
			self.gateway.post(TOKEN_PATH, &LoginBody { username, password }).await?;
		let CredentialPair { access, refresh } =
			issued.into_pair().ok_or(AuthError::MissingAccessToken)?;

		self.gateway.store.set_tokens(Some(access.clone()), refresh).await?;
		self.gateway.set_default_bearer(Some(access));

		let profile: UserProfile = self.gateway.get(PROFILE_PATH).await?;

		*self.session.write() = Session::Authenticated(profile.clone());

		Ok(profile)
	}

	async fn refresh_bookings(&self) {
		if let Err(err) = self.bookings.fetch_bookings(self.default_sort).await {
			obs::log_failure(FlowKind::Bookings, "refresh_bookings", &err);
		}
	}

	async fn clear_credentials(&self) {
		if let Err(err) = self.gateway.store.remove_tokens().await {
			obs::log_failure(FlowKind::Logout, "remove_tokens", &err);
		}

		self.gateway.set_default_bearer(None);
	}
}

impl Debug for SessionController {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionController")
			.field("session", &*self.session.read())
			.field("default_sort", &self.default_sort)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn short_passwords_are_rejected_locally() {
		let form = SignupForm { password: "12345".into(), ..Default::default() };

		assert_eq!(form.validate(), Err(ValidationError::PasswordTooShort { min: 6 }));

		let form = SignupForm { password: "123456".into(), ..Default::default() };

		assert_eq!(form.validate(), Ok(()));
	}

	#[test]
	fn signup_form_redacts_password() {
		let form = SignupForm {
			username: "alice".into(),
			password: "hunter22".into(),
			..Default::default()
		};

		assert!(!format!("{form:?}").contains("hunter22"));
	}

	#[test]
	fn authenticated_session_always_has_user() {
		let session = Session::Authenticated(UserProfile {
			username: "alice".into(),
			..Default::default()
		});

		assert!(session.is_authenticated());
		assert_eq!(session.user().map(|user| user.username.as_str()), Some("alice"));
		assert_eq!(Session::Anonymous.user(), None);
	}
}
