//! Booking creation through payment verification.
//!
//! The chain is: validate the draft, create the booking, request a payment order, run the
//! payment widget, verify the payment, then refresh the booking collection. Nothing in the
//! chain is retried automatically. A verification failure after a successful payment is a
//! terminal state that needs manual support.

// self
use crate::{
	_prelude::*,
	bookings::BookingManager,
	error::ValidationError,
	gateway::{self, ApiGateway},
	http::Method,
	model::{Amount, Booking, BookingId, BookingSort, Bus, BusQuery, NewBooking},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	payment::{PaymentOrchestrator, PaymentOutcome, PaymentReceipt, PaymentRequest},
	session::SessionController,
	shell::{Notice, Shell, View},
};

/// Payment order endpoint.
pub const CREATE_ORDER_PATH: &str = "payments/create-order/";
/// Payment verification endpoint.
pub const VERIFY_PAYMENT_PATH: &str = "payments/verify/";
/// Payer email used when the profile has none.
pub const FALLBACK_EMAIL: &str = "user@example.com";
/// Notice shown once a booking is paid and verified.
pub const CONFIRMED_MESSAGE: &str = "Booking confirmed! Payment received.";
/// Notice shown when payment went through but verification did not.
pub const UNCONFIRMED_MESSAGE: &str =
	"Payment successful but booking failed. Please contact support.";

/// Booking wizard draft.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingDraft {
	/// Selected bus.
	pub bus: Option<Bus>,
	/// Seats to reserve.
	pub seats: u32,
	/// Departure city.
	pub start_location: String,
	/// Arrival city.
	pub drop_location: String,
	/// Calendar date of travel.
	pub travel_date: Option<Date>,
	/// Free-text notes. Kept for the form only; never sent.
	pub notes: String,
}
impl BookingDraft {
	/// Fare for the draft: seats times the selected bus's per-seat price.
	pub fn fare(&self) -> Amount {
		self.bus.as_ref().map_or(Amount::ZERO, |bus| bus.fare(self.seats))
	}

	/// Checks the draft against `today`.
	pub fn validate(&self, today: Date) -> Result<(), ValidationError> {
		validate_route(&self.start_location, &self.drop_location)?;

		let (Some(_), Some(travel_date)) = (&self.bus, self.travel_date) else {
			return Err(ValidationError::MissingRequiredFields);
		};

		if self.seats == 0 {
			return Err(ValidationError::InvalidSeatCount);
		}
		if travel_date <= today {
			return Err(ValidationError::TravelDateNotInFuture);
		}

		Ok(())
	}

	/// Validates the draft and converts it into a creation payload.
	pub fn to_new_booking(&self, today: Date) -> Result<NewBooking, ValidationError> {
		self.validate(today)?;

		match (&self.bus, self.travel_date) {
			(Some(bus), Some(travel_date)) => Ok(NewBooking {
				bus: bus.id,
				seats_booked: self.seats,
				start_location: self.start_location.trim().to_owned(),
				drop_location: self.drop_location.trim().to_owned(),
				travel_date,
			}),
			_ => Err(ValidationError::MissingRequiredFields),
		}
	}
}

/// How a checkout ended once the booking existed.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutOutcome {
	/// Payment verified; the collection was refreshed.
	Confirmed {
		/// Created booking.
		booking: Booking,
		/// Verified payment.
		receipt: PaymentReceipt,
	},
	/// The payment attempt failed or was dismissed. The booking stays unpaid.
	PaymentFailed {
		/// Created booking.
		booking: Booking,
		/// Failure reason.
		message: String,
	},
	/// Payment went through but verification failed. Needs manual support.
	PaidButUnconfirmed {
		/// Created booking.
		booking: Booking,
		/// Unverified payment.
		receipt: PaymentReceipt,
	},
}

#[derive(Serialize)]
struct OrderRequest<'a> {
	booking_id: BookingId,
	amount: Amount,
	currency: &'a str,
}

#[derive(Deserialize)]
struct OrderCreated {
	razorpay_order_id: String,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
	razorpay_payment_id: &'a str,
	razorpay_order_id: &'a str,
	razorpay_signature: &'a str,
}

/// Drives the booking wizard's search and payment steps.
pub struct Checkout {
	gateway: Arc<ApiGateway>,
	bookings: Arc<BookingManager>,
	session: Arc<SessionController>,
	payments: Arc<PaymentOrchestrator>,
	shell: Arc<dyn Shell>,
	currency: String,
	sort: BookingSort,
}
impl Checkout {
	/// Wires the checkout to the shared components.
	pub fn new(
		gateway: Arc<ApiGateway>,
		bookings: Arc<BookingManager>,
		session: Arc<SessionController>,
		payments: Arc<PaymentOrchestrator>,
		shell: Arc<dyn Shell>,
		currency: impl Into<String>,
		sort: BookingSort,
	) -> Self {
		Self { gateway, bookings, session, payments, shell, currency: currency.into(), sort }
	}

	/// Search step: lists buses serving `origin` → `destination`.
	///
	/// Invalid routes fail before any request. An empty result or a failed search is also
	/// reported to the shell.
	pub async fn search_buses(&self, origin: &str, destination: &str) -> Result<Vec<Bus>> {
		validate_route(origin, destination)?;

		match self.bookings.fetch_buses(&BusQuery::between(origin.trim(), destination.trim())).await
		{
			Ok(buses) => {
				if buses.is_empty() {
					self.shell.notify(Notice::info("No buses available for this route"));
				}

				Ok(buses)
			},
			Err(err) => {
				obs::log_failure(FlowKind::Checkout, "search_buses", &err);
				self.shell.notify(Notice::error("Failed to load buses. Please try again."));

				Err(err)
			},
		}
	}

	/// Payment step: creates the booking, pays for it, and verifies the payment.
	///
	/// Errors before the payment widget opens (validation, booking creation, order
	/// creation) are returned as `Err`; once the booking exists every ending is a
	/// [`CheckoutOutcome`].
	pub async fn checkout(&self, draft: &BookingDraft) -> Result<CheckoutOutcome> {
		const KIND: FlowKind = FlowKind::Checkout;

		let new_booking = draft.to_new_booking(OffsetDateTime::now_utc().date())?;
		let fare = draft.fare();
		let span = FlowSpan::new(KIND, "checkout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run(new_booking, fare)).await;

		match &result {
			Ok(CheckoutOutcome::Confirmed { .. }) =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
			Err(err) => {
				obs::log_failure(KIND, "checkout", err);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn run(&self, new_booking: NewBooking, fare: Amount) -> Result<CheckoutOutcome> {
		let booking = self.bookings.create_booking(&new_booking).await?;
		let order: OrderCreated = self
			.gateway
			.post(
				CREATE_ORDER_PATH,
				&OrderRequest { booking_id: booking.id, amount: fare, currency: &self.currency },
			)
			.await?;
		let user = self.session.user().unwrap_or_default();
		let user_email = if user.email.trim().is_empty() {
			FALLBACK_EMAIL.to_owned()
		} else {
			user.email.clone()
		};
		let request = PaymentRequest {
			order_id: order.razorpay_order_id,
			amount: fare,
			currency: Some(self.currency.clone()),
			user_email,
			user_name: user.display_name().to_owned(),
		};

		match self.payments.initiate_payment(request).await {
			PaymentOutcome::Success(receipt) => Ok(self.confirm(booking, receipt).await),
			PaymentOutcome::Failure { message } => {
				let notice = if message.starts_with("Payment failed") {
					message.clone()
				} else {
					format!("Payment failed: {message}")
				};

				self.shell.notify(Notice::error(notice));

				Ok(CheckoutOutcome::PaymentFailed { booking, message })
			},
		}
	}

	async fn confirm(&self, booking: Booking, receipt: PaymentReceipt) -> CheckoutOutcome {
		let verify = VerifyRequest {
			razorpay_payment_id: &receipt.payment_id,
			razorpay_order_id: &receipt.order_id,
			razorpay_signature: &receipt.signature,
		};
		let verified = self
			.gateway
			.send(Method::Post, VERIFY_PAYMENT_PATH, &[], Some(&verify))
			.await
			.and_then(|response| gateway::check_status(&response));

		if let Err(err) = verified {
			obs::log_failure(FlowKind::Checkout, "verify_payment", &err);
			self.shell.notify(Notice::error(UNCONFIRMED_MESSAGE));

			return CheckoutOutcome::PaidButUnconfirmed { booking, receipt };
		}
		let refreshed = match self.session.is_authenticated() {
			true => self.bookings.fetch_bookings(self.sort).await.map(drop),
			false => Ok(()),
		};

		if let Err(err) = refreshed {
			obs::log_failure(FlowKind::Bookings, "refresh_after_checkout", &err);
		}

		self.shell.notify(Notice::success(CONFIRMED_MESSAGE));
		self.shell.navigate(View::MyBookings);

		CheckoutOutcome::Confirmed { booking, receipt }
	}
}
impl Debug for Checkout {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Checkout")
			.field("currency", &self.currency)
			.field("sort", &self.sort)
			.finish()
	}
}

fn validate_route(origin: &str, destination: &str) -> Result<(), ValidationError> {
	let (origin, destination) = (origin.trim(), destination.trim());

	if origin.is_empty() || destination.is_empty() {
		return Err(ValidationError::MissingLocations);
	}
	if origin == destination {
		return Err(ValidationError::SameOriginAndDestination);
	}

	Ok(())
}
