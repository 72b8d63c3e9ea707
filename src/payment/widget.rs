//! Contract for the opaque third-party payment widget.

// crates.io
use tokio::sync::oneshot;
// self
use crate::_prelude::*;

/// Boxed future returned by [`PaymentWidget::load`].
pub type WidgetFuture<'a> = Pin<Box<dyn Future<Output = Result<(), WidgetError>> + 'a + Send>>;

/// Failures reported by a [`PaymentWidget`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum WidgetError {
	/// Widget assets could not be loaded.
	#[error("Payment widget failed to load: {message}.")]
	Load {
		/// Human-readable error payload.
		message: String,
	},
	/// Widget was loaded but refused to open.
	#[error("Payment widget could not be opened: {message}.")]
	Open {
		/// Human-readable error payload.
		message: String,
	},
}

/// Opaque payment widget.
///
/// The widget reports exactly one outcome per [`open`](PaymentWidget::open) through the
/// [`PaymentResolver`] it is handed; it may hold the resolver for as long as the user keeps
/// the dialog open.
pub trait PaymentWidget
where
	Self: 'static + Send + Sync,
{
	/// Loads the widget's assets. Called again after a failure.
	fn load(&self) -> WidgetFuture<'_>;

	/// Opens the checkout dialog.
	fn open(&self, options: CheckoutOptions, resolver: PaymentResolver) -> Result<(), WidgetError>;
}

/// Payer details pre-filled in the dialog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prefill {
	/// Payer name.
	pub name: String,
	/// Payer email.
	pub email: String,
}

/// Dialog styling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Theme {
	/// Accent colour.
	pub color: String,
}

/// Configuration handed to [`PaymentWidget::open`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutOptions {
	/// Public gateway key.
	pub key: String,
	/// Amount in minor units (paise).
	pub amount: u64,
	/// ISO currency code.
	pub currency: String,
	/// Merchant name.
	pub name: String,
	/// Payment description.
	pub description: String,
	/// Gateway order the payment settles.
	pub order_id: String,
	/// Payer details.
	pub prefill: Prefill,
	/// Dialog styling.
	pub theme: Theme,
}

/// Normalized proof of a successful payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
	/// Gateway payment identifier.
	#[serde(alias = "razorpay_payment_id")]
	pub payment_id: String,
	/// Gateway order identifier.
	#[serde(alias = "razorpay_order_id")]
	pub order_id: String,
	/// Signature the backend verifies.
	#[serde(alias = "razorpay_signature")]
	pub signature: String,
}

/// The single outcome of a payment attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
	/// Widget reported a completed payment.
	Success(PaymentReceipt),
	/// Validation, loading, the widget, or the user ended the attempt.
	Failure {
		/// Human-readable reason.
		message: String,
	},
}
impl PaymentOutcome {
	/// Builds a failure outcome.
	pub fn failure(message: impl Into<String>) -> Self {
		Self::Failure { message: message.into() }
	}
}

/// Message reported when the dialog is closed without paying.
pub const DISMISSED_MESSAGE: &str = "Payment was cancelled before completion.";

/// One-shot handle a widget uses to report its outcome. Consuming methods make a second
/// report impossible; dropping the handle counts as a dismissal.
#[derive(Debug)]
pub struct PaymentResolver(oneshot::Sender<PaymentOutcome>);
impl PaymentResolver {
	pub(crate) fn channel() -> (Self, oneshot::Receiver<PaymentOutcome>) {
		let (tx, rx) = oneshot::channel();

		(Self(tx), rx)
	}

	/// Reports a completed payment.
	pub fn succeed(self, receipt: PaymentReceipt) {
		self.resolve(PaymentOutcome::Success(receipt));
	}

	/// Reports a gateway failure using its description and reason codes.
	pub fn fail(self, description: Option<&str>, reason: Option<&str>) {
		let description = description.unwrap_or("An unknown error occurred.");
		let reason = reason.unwrap_or("unknown");

		self.resolve(PaymentOutcome::failure(format!(
			"Payment failed: {description} (reason: {reason})"
		)));
	}

	/// Reports that the user closed the dialog.
	pub fn dismiss(self) {
		self.resolve(PaymentOutcome::failure(DISMISSED_MESSAGE));
	}

	/// Reports `outcome` as is.
	pub fn resolve(self, outcome: PaymentOutcome) {
		// The receiver is gone only if the caller stopped waiting; nothing is left to notify.
		let _ = self.0.send(outcome);
	}
}
