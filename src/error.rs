//! Client-level error types shared across the session, booking, and payment layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request-encoding problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary backend failure; safe to retry for idempotent reads.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Session could not be established or kept alive.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Input rejected before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Cancellation workflow refused the transition.
	#[error(transparent)]
	Cancellation(#[from] CancellationError),

	/// Backend rejected the request with a client-error status.
	#[error("Backend rejected the request with status {status}.")]
	Api {
		/// HTTP status code returned by the backend.
		status: u16,
		/// Backend-supplied `error`/`detail` message, when present.
		message: Option<String>,
	},
}
impl Error {
	/// HTTP status attached to the failure, if the backend answered at all.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			Self::Transient(TransientError::Backend { status, .. })
			| Self::Transient(TransientError::ResponseParse { status, .. }) => *status,
			_ => None,
		}
	}

	/// Backend-supplied message, if the response carried one.
	pub fn backend_message(&self) -> Option<&str> {
		match self {
			Self::Api { message, .. } => message.as_deref(),
			_ => None,
		}
	}

	/// Message safe to show to a user, falling back to `fallback` for anything the backend
	/// did not explain itself.
	pub fn user_message(&self, fallback: &str) -> String {
		match self {
			Self::Validation(err) => err.to_string(),
			Self::Auth(AuthError::InvalidCredentials) => AuthError::InvalidCredentials.to_string(),
			_ => self.backend_message().unwrap_or(fallback).to_owned(),
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint path could not be joined onto the API base URL.
	#[error("Endpoint `{path}` cannot be resolved against the API base URL.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request payload could not be encoded as JSON.
	#[error("Request body could not be encoded.")]
	RequestEncode(#[from] serde_json::Error),
	/// Client configuration failed validation.
	#[error(transparent)]
	Client(#[from] crate::config::ClientConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry for reads).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Backend returned a server error or throttled the request.
	#[error("Backend returned an unexpected response: {message}.")]
	Backend {
		/// Backend- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Backend responded with JSON that does not match the expected shape.
	#[error("Backend returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Session-establishment failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// Uniform login failure; never carries backend detail.
	#[error("Invalid credentials. Please try again.")]
	InvalidCredentials,
	/// Token endpoint answered without an access credential.
	#[error("Token endpoint response did not include an access token.")]
	MissingAccessToken,
	/// Access credential expired and no refresh credential is stored.
	#[error("Session expired and no refresh token is available.")]
	MissingRefreshToken,
	/// Refresh endpoint refused the stored refresh credential.
	#[error("Session could not be refreshed: {reason}")]
	RefreshRejected {
		/// Short description of the refresh failure.
		reason: String,
	},
}

/// Input validation failures raised before any network call.
#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ValidationError {
	/// Signup password is shorter than the minimum.
	#[error("Password must be at least {min} characters long.")]
	PasswordTooShort {
		/// Minimum accepted length.
		min: usize,
	},
	/// Payment amount is zero, negative, or not a number.
	#[error("Invalid amount. Amount must be greater than 0")]
	InvalidAmount,
	/// Email address is not plausible.
	#[error("Invalid email address")]
	InvalidEmail,
	/// Payer name is blank.
	#[error("User name is required")]
	MissingUserName,
	/// Booking draft has no bus or no travel date.
	#[error("Please fill in all required fields")]
	MissingRequiredFields,
	/// Booking draft is missing its origin or destination.
	#[error("Please select both origin and destination")]
	MissingLocations,
	/// Origin and destination are the same city.
	#[error("Origin and destination cannot be the same")]
	SameOriginAndDestination,
	/// Seat count is below one.
	#[error("At least one seat must be booked")]
	InvalidSeatCount,
	/// Travel date is today or in the past.
	#[error("Please select a future travel date")]
	TravelDateNotInFuture,
}

/// Cancellation workflow transition failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CancellationError {
	/// Another cancellation is still waiting on the backend.
	#[error("Cancellation of booking {booking_id} is already in progress.")]
	InFlight {
		/// Booking whose cancellation is pending.
		booking_id: crate::model::BookingId,
	},
	/// A cancellation cycle is already open; dismiss it first.
	#[error("Another cancellation is already open.")]
	NotIdle,
	/// Booking is not present in the loaded collection.
	#[error("Booking {booking_id} is not loaded.")]
	UnknownBooking {
		/// Requested booking.
		booking_id: crate::model::BookingId,
	},
	/// Booking is not both booked and paid.
	#[error("Booking {booking_id} cannot be cancelled.")]
	NotCancellable {
		/// Requested booking.
		booking_id: crate::model::BookingId,
	},
}
