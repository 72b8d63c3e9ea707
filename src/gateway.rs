//! Backend gateway that attaches, checks, and refreshes the bearer credential.
//!
//! Every call except the refresh exchange itself goes through [`ApiGateway::authorize`]:
//!
//! 1. No stored access credential: the request goes out unauthenticated.
//! 2. Access credential not expired (decoded locally, no network): it is attached.
//! 3. Expired without a refresh credential: the request is never sent, both credentials are
//!    cleared, and [`AuthError::MissingRefreshToken`] is returned.
//! 4. Expired with a refresh credential: one refresh is performed. Success stores the new
//!    access credential (the refresh credential is left as is) and the original request is
//!    sent with it. Failure clears both credentials, sends the shell to the login view, and
//!    fails the request.
//!
//! Refreshes run behind a singleflight guard, so concurrent callers holding the same expired
//! credential share one exchange and its outcome.

mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{self, TokenSecret, token::pair::RefreshedAccess},
	error::{AuthError, ConfigError, TransientError},
	http::{ApiRequest, ApiResponse, ApiTransport, Method},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	shell::{Shell, View},
	store::TokenStore,
};

/// Token-issuance endpoint.
pub const TOKEN_PATH: &str = "auth/token/";
/// Refresh endpoint; never intercepted.
pub const TOKEN_REFRESH_PATH: &str = "auth/token/refresh/";

/// Query string pairs appended to an endpoint.
pub type Query<'a> = &'a [(&'a str, String)];

/// Authenticated gateway into the backend REST API.
pub struct ApiGateway {
	/// Transport used for every outbound request.
	pub http_client: Arc<dyn ApiTransport>,
	/// Credential store shared with the session controller and the route guard.
	pub store: Arc<dyn TokenStore>,
	/// Shared counters for the refresh path.
	pub refresh_metrics: Arc<RefreshMetrics>,
	shell: Arc<dyn Shell>,
	api_base: Url,
	default_bearer: RwLock<Option<TokenSecret>>,
	refresh_guard: AsyncMutex<Option<Rejection>>,
}
impl ApiGateway {
	/// Creates a gateway rooted at `api_base`, which must end with `/`.
	pub fn new(
		api_base: Url,
		http_client: Arc<dyn ApiTransport>,
		store: Arc<dyn TokenStore>,
		shell: Arc<dyn Shell>,
	) -> Self {
		Self {
			http_client,
			store,
			refresh_metrics: Default::default(),
			shell,
			api_base,
			default_bearer: Default::default(),
			refresh_guard: AsyncMutex::new(None),
		}
	}

	/// Base URL endpoints are resolved against.
	pub fn api_base(&self) -> &Url {
		&self.api_base
	}

	/// Credential most recently installed by login or refresh.
	pub fn default_bearer(&self) -> Option<TokenSecret> {
		self.default_bearer.read().clone()
	}

	/// Installs or clears the default bearer credential.
	pub fn set_default_bearer(&self, bearer: Option<TokenSecret>) {
		*self.default_bearer.write() = bearer;
	}

	/// Resolves `path` against the API base.
	pub fn endpoint(&self, path: &str) -> Result<Url> {
		let relative = path.trim_start_matches('/');

		self.api_base.join(relative).map_err(|source| {
			ConfigError::InvalidEndpoint { path: path.to_owned(), source }.into()
		})
	}

	/// Returns the credential to attach to the next request, refreshing it first when the
	/// stored one has expired.
	pub async fn authorize(&self) -> Result<Option<TokenSecret>> {
		let Some(access) = self.store.access_token().await? else {
			return Ok(None);
		};

		if !auth::access_expired_at(access.expose(), OffsetDateTime::now_utc()) {
			return Ok(Some(access));
		}

		self.refresh_access_token(&access).await.map(Some)
	}

	/// Exchanges `refresh` for a new access credential.
	///
	/// This call bypasses interception and does not touch the store; callers decide what to
	/// do with the result.
	pub async fn exchange_refresh(&self, refresh: &TokenSecret) -> Result<TokenSecret> {
		#[derive(Serialize)]
		struct RefreshBody<'a> {
			refresh: &'a str,
		}

		let url = self.endpoint(TOKEN_REFRESH_PATH)?;
		let body = encode(&RefreshBody { refresh: refresh.expose() })?;
		let response =
			self.http_client.execute(ApiRequest::new(Method::Post, url).with_body(body)).await?;
		let refreshed: RefreshedAccess = decode(&response)?;

		refreshed.access.ok_or_else(|| AuthError::MissingAccessToken.into())
	}

	/// Sends an intercepted request and returns the raw response, whatever its status.
	pub async fn send<B>(
		&self,
		method: Method,
		path: &str,
		query: Query<'_>,
		body: Option<&B>,
	) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		let mut url = self.endpoint(path)?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
		}

		let mut request = ApiRequest::new(method, url);

		if let Some(body) = body {
			request = request.with_body(encode(body)?);
		}
		if let Some(bearer) = self.authorize().await? {
			request = request.with_bearer(bearer);
		}

		Ok(self.http_client.execute(request).await?)
	}

	/// `GET path`, decoding a JSON body.
	pub async fn get<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.get_query(path, &[]).await
	}

	/// `GET path?query`, decoding a JSON body.
	pub async fn get_query<T>(&self, path: &str, query: Query<'_>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send::<()>(Method::Get, path, query, None).await?;

		decode(&response)
	}

	/// `POST path` with a JSON body, decoding a JSON response.
	pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let response = self.send(Method::Post, path, &[], Some(body)).await?;

		decode(&response)
	}

	/// `POST path` with an empty JSON object body, decoding a JSON response.
	pub async fn post_empty<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		#[derive(Serialize)]
		struct Empty {}

		self.post(path, &Empty {}).await
	}

	/// `PATCH path` with a JSON body, decoding a JSON response.
	pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let response = self.send(Method::Patch, path, &[], Some(body)).await?;

		decode(&response)
	}

	async fn refresh_access_token(&self, stale: &TokenSecret) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<TokenSecret> = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let mut last_rejection = self.refresh_guard.lock().await;

				// Another caller may have refreshed while this one waited on the guard.
				if let Some(current) = self.store.access_token().await?.filter(|current| {
					current != stale
						&& !auth::access_expired_at(current.expose(), OffsetDateTime::now_utc())
				}) {
					self.refresh_metrics.record_reuse();

					return Ok(current);
				}

				// Waiters on a rejected exchange fail the same way the caller that ran it did.
				if let Some(rejection) = last_rejection.as_ref().filter(|r| &r.stale == stale) {
					self.refresh_metrics.record_failure();

					return Err(Error::from(AuthError::RefreshRejected {
						reason: rejection.reason.clone(),
					}));
				}

				let Some(refresh) = self.store.refresh_token().await? else {
					self.refresh_metrics.record_failure();
					self.store.remove_tokens().await?;

					return Err(Error::from(AuthError::MissingRefreshToken));
				};

				match self.exchange_refresh(&refresh).await {
					Ok(access) => {
						self.store.set_tokens(Some(access.clone()), None).await?;
						self.set_default_bearer(Some(access.clone()));
						self.refresh_metrics.record_success();
						*last_rejection = None;

						Ok(access)
					},
					Err(err) => {
						self.refresh_metrics.record_failure();
						obs::log_failure(KIND, "exchange_refresh", &err);

						let reason = err.to_string();

						*last_rejection =
							Some(Rejection { stale: stale.clone(), reason: reason.clone() });
						self.store.remove_tokens().await?;
						self.set_default_bearer(None);
						self.shell.navigate(View::Login);

						Err(Error::from(AuthError::RefreshRejected { reason }))
					},
				}
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
impl Debug for ApiGateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiGateway")
			.field("api_base", &self.api_base.as_str())
			.field("default_bearer_set", &self.default_bearer.read().is_some())
			.field("refresh_metrics", &self.refresh_metrics.snapshot())
			.finish()
	}
}

struct Rejection {
	stale: TokenSecret,
	reason: String,
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	detail: Option<String>,
}

/// Maps a non-2xx response onto the error taxonomy.
pub(crate) fn check_status(response: &ApiResponse) -> Result<()> {
	if response.is_success() {
		return Ok(());
	}

	let status = response.status;
	let message = serde_json::from_slice::<ErrorBody>(&response.body)
		.ok()
		.and_then(|body| body.error.or(body.detail));

	if status >= 500 || status == 429 {
		return Err(TransientError::Backend {
			message: message.unwrap_or_else(|| format!("HTTP {status}")),
			status: Some(status),
			retry_after: response.retry_after,
		}
		.into());
	}

	Err(Error::Api { status, message })
}

/// Checks the status, then decodes the JSON body into `T`.
pub(crate) fn decode<T>(response: &ApiResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	check_status(response)?;

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		TransientError::ResponseParse { source, status: Some(response.status) }.into()
	})
}

fn encode<B>(body: &B) -> Result<Vec<u8>>
where
	B: ?Sized + Serialize,
{
	serde_json::to_vec(body).map_err(|e| ConfigError::from(e).into())
}
