//! Client configuration: backend location, payment widget settings, and workflow timings.

// crates.io
use url::Host;
// self
use crate::{_prelude::*, model::BookingSort};

/// Default per-attempt budget for loading the payment widget.
pub const DEFAULT_WIDGET_LOAD_ATTEMPTS: u32 = 3;
/// Default pause between widget load attempts.
pub const DEFAULT_WIDGET_LOAD_BACKOFF: StdDuration = StdDuration::from_secs(1);
/// Default delay before a resolved cancellation banner clears itself.
pub const DEFAULT_CANCELLATION_RESET_DELAY: StdDuration = StdDuration::from_secs(5);

/// Validation failures raised while building a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// API base URL failed to parse.
	#[error("API base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parse failure.
		#[source]
		source: url::ParseError,
	},
	/// API base URL cannot carry path segments (e.g. `mailto:`).
	#[error("API base URL `{url}` cannot be used as a base.")]
	CannotBeBase {
		/// Offending URL.
		url: String,
	},
	/// Plain HTTP is only accepted for loopback hosts.
	#[error("API base URL `{url}` must use HTTPS.")]
	InsecureBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Widget load attempts must be at least one.
	#[error("Widget load attempts must be at least 1.")]
	ZeroLoadAttempts,
}

/// Settings handed to the payment widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
	/// Public gateway key; checkout refuses to open the widget without it.
	pub key_id: Option<String>,
	/// Merchant name shown in the widget header.
	pub merchant_name: String,
	/// Line shown under the merchant name.
	pub description: String,
	/// Widget accent colour.
	pub theme_color: String,
	/// ISO currency code for orders.
	pub currency: String,
	/// Widget load attempts before giving up.
	pub load_attempts: u32,
	/// Pause between widget load attempts.
	pub load_backoff: StdDuration,
}
impl Default for PaymentSettings {
	fn default() -> Self {
		Self {
			key_id: None,
			merchant_name: "Bus Booking".into(),
			description: "Bus ticket booking".into(),
			theme_color: "#3399cc".into(),
			currency: "INR".into(),
			load_attempts: DEFAULT_WIDGET_LOAD_ATTEMPTS,
			load_backoff: DEFAULT_WIDGET_LOAD_BACKOFF,
		}
	}
}

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Backend base URL; always ends with `/`.
	pub api_base: Url,
	/// Payment widget settings.
	#[serde(default)]
	pub payment: PaymentSettings,
	/// Delay before a resolved cancellation clears itself.
	#[serde(default = "default_reset_delay")]
	pub cancellation_reset_delay: StdDuration,
	/// Ordering used for the initial booking load.
	#[serde(default)]
	pub default_sort: BookingSort,
}
impl ClientConfig {
	/// Starts a builder targeting `api_base`.
	pub fn builder(api_base: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder {
			api_base: api_base.into(),
			payment: PaymentSettings::default(),
			cancellation_reset_delay: DEFAULT_CANCELLATION_RESET_DELAY,
			default_sort: BookingSort::default(),
		}
	}

	/// Re-checks a configuration that was deserialized rather than built.
	pub fn validate(mut self) -> Result<Self, ClientConfigError> {
		self.api_base = normalize_base(self.api_base)?;

		if self.payment.load_attempts == 0 {
			return Err(ClientConfigError::ZeroLoadAttempts);
		}

		Ok(self)
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	api_base: String,
	payment: PaymentSettings,
	cancellation_reset_delay: StdDuration,
	default_sort: BookingSort,
}
impl ClientConfigBuilder {
	/// Sets the public payment gateway key.
	pub fn payment_key(mut self, key_id: impl Into<String>) -> Self {
		self.payment.key_id = Some(key_id.into());

		self
	}

	/// Replaces the payment settings wholesale.
	pub fn payment(mut self, payment: PaymentSettings) -> Self {
		self.payment = payment;

		self
	}

	/// Overrides the cancellation banner reset delay.
	pub fn cancellation_reset_delay(mut self, delay: StdDuration) -> Self {
		self.cancellation_reset_delay = delay;

		self
	}

	/// Overrides the initial booking ordering.
	pub fn default_sort(mut self, sort: BookingSort) -> Self {
		self.default_sort = sort;

		self
	}

	/// Validates the inputs and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let api_base = Url::parse(self.api_base.trim())
			.map_err(|source| ClientConfigError::InvalidBaseUrl { source })?;

		ClientConfig {
			api_base,
			payment: self.payment,
			cancellation_reset_delay: self.cancellation_reset_delay,
			default_sort: self.default_sort,
		}
		.validate()
	}
}

fn default_reset_delay() -> StdDuration {
	DEFAULT_CANCELLATION_RESET_DELAY
}

fn normalize_base(mut url: Url) -> Result<Url, ClientConfigError> {
	if url.cannot_be_a_base() {
		return Err(ClientConfigError::CannotBeBase { url: url.into() });
	}
	if url.scheme() != "https" && !(url.scheme() == "http" && is_loopback(&url)) {
		return Err(ClientConfigError::InsecureBaseUrl { url: url.into() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(addr)) => addr.is_loopback(),
		Some(Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}
