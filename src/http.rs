//! Transport primitives for backend calls.
//!
//! [`ApiTransport`] is the client's only dependency on an HTTP stack. Requests and responses
//! are plain data ([`ApiRequest`], [`ApiResponse`]) so custom transports and test doubles
//! never touch reqwest types. The gateway decides which bearer to attach; transports only
//! put it on the wire.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError};

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing backend calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// component of a client context.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever status the backend answered.
	///
	/// Non-2xx statuses are not errors at this layer; only failures to obtain a response are.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the backend API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PATCH`
	Patch,
}
impl Method {
	/// Returns the method name as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Patch => "PATCH",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-neutral request description.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute endpoint URL including any query string.
	pub url: Url,
	/// Bearer credential to send as `Authorization`, if any.
	pub bearer: Option<TokenSecret>,
	/// JSON-encoded body, if any.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without credentials or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, bearer: None, body: None }
	}

	/// Attaches a JSON body.
	pub fn with_body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self
	}

	/// Attaches a bearer credential.
	pub fn with_bearer(mut self, bearer: TokenSecret) -> Self {
		self.bearer = Some(bearer);

		self
	}
}

/// Transport-neutral response.
#[derive(Clone, Debug, Default)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Builds a response from a status and JSON body.
	pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestHttpClient {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Patch => reqwest::Method::PATCH,
			};
			let mut builder =
				client.request(method, request.url).header(ACCEPT, "application/json");

			if let Some(bearer) = &request.bearer {
				builder = builder.header(AUTHORIZATION, bearer.bearer());
			}
			if let Some(body) = request.body {
				builder = builder.header(CONTENT_TYPE, "application/json").body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
