//! Bridge into the third-party payment widget.
//!
//! The orchestrator never talks to the backend. It validates the request, makes sure the
//! widget is loaded, opens it, and waits for the widget's single outcome. There is no
//! timeout on that wait; the user may keep the dialog open indefinitely.

pub mod loader;
pub mod widget;

pub use loader::WidgetLoader;
pub use widget::*;

// self
use crate::{
	_prelude::*,
	config::PaymentSettings,
	error::ValidationError,
	model::Amount,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Reported when no gateway key is configured.
pub const NOT_CONFIGURED_MESSAGE: &str =
	"Payment gateway is not configured. Please contact support.";
/// Reported when the widget could not be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Could not load payment gateway script.";
/// Reported when the widget refused to open.
pub const OPEN_FAILED_MESSAGE: &str = "An unexpected error occurred while setting up the payment.";

/// Inputs for one payment attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentRequest {
	/// Gateway order created by the backend.
	pub order_id: String,
	/// Amount in major units.
	pub amount: Amount,
	/// Currency override; the configured currency otherwise.
	pub currency: Option<String>,
	/// Payer email.
	pub user_email: String,
	/// Payer name.
	pub user_name: String,
}
impl PaymentRequest {
	/// Checks the request before anything is loaded or opened.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if !self.amount.is_positive() {
			return Err(ValidationError::InvalidAmount);
		}
		if !is_plausible_email(&self.user_email) {
			return Err(ValidationError::InvalidEmail);
		}
		if self.user_name.trim().is_empty() {
			return Err(ValidationError::MissingUserName);
		}

		Ok(())
	}
}

/// Loads and opens the payment widget and bridges its outcome.
pub struct PaymentOrchestrator {
	loader: WidgetLoader,
	widget: Arc<dyn PaymentWidget>,
	settings: PaymentSettings,
}
impl PaymentOrchestrator {
	/// Creates an orchestrator for `widget`.
	pub fn new(widget: Arc<dyn PaymentWidget>, settings: PaymentSettings) -> Self {
		Self {
			loader: WidgetLoader::new(widget.clone(), settings.load_attempts, settings.load_backoff),
			widget,
			settings,
		}
	}

	/// Loads the widget, sharing any in-flight load. See [`WidgetLoader::load`].
	pub async fn load_widget(&self) -> bool {
		self.loader.load().await
	}

	/// Runs one payment attempt and returns its only outcome.
	///
	/// Invalid requests fail before the widget is touched. A missing gateway key or a load
	/// failure also fail without opening the dialog.
	pub async fn initiate_payment(&self, request: PaymentRequest) -> PaymentOutcome {
		const KIND: FlowKind = FlowKind::Payment;

		if let Err(err) = request.validate() {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);

			return PaymentOutcome::failure(err.to_string());
		}

		let span = FlowSpan::new(KIND, "initiate_payment");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span.instrument(self.run(request)).await;

		match &outcome {
			PaymentOutcome::Success(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			PaymentOutcome::Failure { .. } => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		outcome
	}

	async fn run(&self, request: PaymentRequest) -> PaymentOutcome {
		let Some(key) = self.settings.key_id.clone() else {
			return PaymentOutcome::failure(NOT_CONFIGURED_MESSAGE);
		};

		if !self.loader.load().await {
			return PaymentOutcome::failure(LOAD_FAILED_MESSAGE);
		}

		let options = CheckoutOptions {
			key,
			amount: request.amount.to_minor_units(),
			currency: request.currency.unwrap_or_else(|| self.settings.currency.clone()),
			name: self.settings.merchant_name.clone(),
			description: self.settings.description.clone(),
			order_id: request.order_id,
			prefill: Prefill { name: request.user_name, email: request.user_email },
			theme: Theme { color: self.settings.theme_color.clone() },
		};
		let (resolver, outcome) = PaymentResolver::channel();

		if let Err(err) = self.widget.open(options, resolver) {
			obs::log_failure(FlowKind::Payment, "open", &err);

			return PaymentOutcome::failure(OPEN_FAILED_MESSAGE);
		}

		outcome.await.unwrap_or_else(|_| PaymentOutcome::failure(DISMISSED_MESSAGE))
	}
}
impl Debug for PaymentOrchestrator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PaymentOrchestrator")
			.field("loader", &self.loader)
			.field("key_configured", &self.settings.key_id.is_some())
			.finish()
	}
}

fn is_plausible_email(email: &str) -> bool {
	let email = email.trim();

	match email.split_once('@') {
		Some((local, domain)) =>
			!local.is_empty()
				&& !domain.is_empty()
				&& !domain.contains('@')
				&& !email.chars().any(char::is_whitespace),
		None => false,
	}
}
