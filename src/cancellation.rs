//! Booking cancellation state machine.
//!
//! ```text
//! Idle -> Selecting -> Confirming -> Resolved -> Idle
//! ```
//!
//! `Resolved` returns to `Idle` after the configured delay or on dismissal. Every transition
//! bumps an epoch counter; a pending auto-reset only fires if the epoch it captured is still
//! current, so a stale timer never clobbers a newer cycle.

// self
use crate::{
	_prelude::*,
	bookings::BookingManager,
	error::CancellationError,
	gateway::ApiGateway,
	model::{BookingId, CancellationReceipt},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Fallback shown when the backend gives no reason for a failed cancellation.
pub const CANCEL_FAILED_MESSAGE: &str = "Failed to cancel booking";

/// How a submitted cancellation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancellationOutcome {
	/// Booking was cancelled; the message quotes the refund.
	Succeeded {
		/// Banner text.
		message: String,
	},
	/// Backend refused or the call failed; the collection was not touched.
	Failed {
		/// Banner text.
		message: String,
	},
}
impl CancellationOutcome {
	/// Banner text for either case.
	pub fn message(&self) -> &str {
		match self {
			Self::Succeeded { message } | Self::Failed { message } => message,
		}
	}
}

/// Named states of the workflow; each carries only the fields valid for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CancellationState {
	/// Nothing selected.
	#[default]
	Idle,
	/// Confirmation dialog open for a booking.
	Selecting {
		/// Booking awaiting confirmation.
		booking_id: BookingId,
	},
	/// Cancellation request in flight.
	Confirming {
		/// Booking being cancelled.
		booking_id: BookingId,
	},
	/// Request finished; the banner is showing.
	Resolved {
		/// Booking the request targeted.
		booking_id: BookingId,
		/// Result banner.
		outcome: CancellationOutcome,
	},
}
impl CancellationState {
	/// Flat projection for views.
	pub fn view(&self) -> CancellationView {
		match self {
			Self::Idle => CancellationView::default(),
			Self::Selecting { booking_id } => CancellationView {
				selected_booking_id: Some(*booking_id),
				..Default::default()
			},
			Self::Confirming { booking_id } => CancellationView {
				is_cancelling: true,
				selected_booking_id: Some(*booking_id),
				..Default::default()
			},
			Self::Resolved { outcome: CancellationOutcome::Succeeded { message }, .. } =>
				CancellationView { cancel_success: Some(message.clone()), ..Default::default() },
			Self::Resolved { booking_id, outcome: CancellationOutcome::Failed { message } } =>
				CancellationView {
					selected_booking_id: Some(*booking_id),
					cancel_error: Some(message.clone()),
					..Default::default()
				},
		}
	}
}

/// Flat view of [`CancellationState`]. `is_cancelling` implies `selected_booking_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CancellationView {
	/// A cancellation request is in flight.
	pub is_cancelling: bool,
	/// Booking the dialog or banner refers to.
	pub selected_booking_id: Option<BookingId>,
	/// Failure banner.
	pub cancel_error: Option<String>,
	/// Success banner.
	pub cancel_success: Option<String>,
}

/// One informational refund band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefundBand {
	/// Percentage of the fare refunded.
	pub percent: u8,
	/// Display copy.
	pub label: &'static str,
}

/// Refund bands shown in the confirmation dialog. The backend computes the actual refund.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefundPolicy;
impl RefundPolicy {
	/// Bands from most to least generous.
	pub const BANDS: [RefundBand; 3] = [
		RefundBand { percent: 80, label: "80% refund if cancelled > 24 hours before departure" },
		RefundBand { percent: 50, label: "50% refund if cancelled 12-24 hours before" },
		RefundBand { percent: 25, label: "25% refund if cancelled < 12 hours before" },
	];

	/// Band that applies when cancelling `until_departure` ahead of travel.
	pub fn band_for(until_departure: Duration) -> RefundBand {
		if until_departure > Duration::hours(24) {
			Self::BANDS[0]
		} else if until_departure >= Duration::hours(12) {
			Self::BANDS[1]
		} else {
			Self::BANDS[2]
		}
	}
}

#[derive(Debug, Default)]
struct Machine {
	state: CancellationState,
	epoch: u64,
	// Outlives resets; only the request itself clears it.
	in_flight: Option<BookingId>,
}
impl Machine {
	fn transition(&mut self, state: CancellationState) -> u64 {
		self.state = state;
		self.epoch += 1;

		self.epoch
	}
}

struct InFlight(Arc<Mutex<Machine>>);
impl Drop for InFlight {
	fn drop(&mut self) {
		self.0.lock().in_flight = None;
	}
}

/// Cancellation workflow over the booking collection.
pub struct CancellationWorkflow {
	gateway: Arc<ApiGateway>,
	bookings: Arc<BookingManager>,
	machine: Arc<Mutex<Machine>>,
	reset_delay: StdDuration,
}
impl CancellationWorkflow {
	/// Creates an idle workflow whose banners clear after `reset_delay`.
	pub fn new(
		gateway: Arc<ApiGateway>,
		bookings: Arc<BookingManager>,
		reset_delay: StdDuration,
	) -> Self {
		Self { gateway, bookings, machine: Default::default(), reset_delay }
	}

	/// Current state.
	pub fn state(&self) -> CancellationState {
		self.machine.lock().state.clone()
	}

	/// Flat projection of the current state.
	pub fn view(&self) -> CancellationView {
		self.machine.lock().state.view()
	}

	/// Opens the confirmation dialog for `booking_id`.
	///
	/// Only valid from `Idle`, and only for a loaded booking that is booked and paid.
	pub fn start_cancellation(&self, booking_id: BookingId) -> Result<(), CancellationError> {
		let mut machine = self.machine.lock();

		if let Some(booking_id) = machine.in_flight {
			return Err(CancellationError::InFlight { booking_id });
		}
		if !matches!(machine.state, CancellationState::Idle) {
			return Err(CancellationError::NotIdle);
		}

		let booking = self
			.bookings
			.booking(booking_id)
			.ok_or(CancellationError::UnknownBooking { booking_id })?;

		if !booking.is_cancellable() {
			return Err(CancellationError::NotCancellable { booking_id });
		}

		machine.transition(CancellationState::Selecting { booking_id });

		Ok(())
	}

	/// Returns to `Idle` from any state, discarding banners. Idempotent.
	pub fn reset_cancellation(&self) {
		self.machine.lock().transition(CancellationState::Idle);
	}

	/// Submits the cancellation of `booking_id`.
	///
	/// Rejected while another cancellation is in flight, even one whose dialog was reset.
	/// On success the receipt is folded
	/// into the booking collection; on failure the collection is left alone. Either way the
	/// workflow resolves with a banner that clears itself after the reset delay. If the
	/// workflow was reset while the request was in flight, the banner is skipped.
	pub async fn cancel_booking(&self, booking_id: BookingId) -> Result<CancellationOutcome> {
		const KIND: FlowKind = FlowKind::Cancellation;

		let (epoch, in_flight) = {
			let mut machine = self.machine.lock();

			if let Some(booking_id) = machine.in_flight {
				return Err(CancellationError::InFlight { booking_id }.into());
			}

			machine.in_flight = Some(booking_id);

			(
				machine.transition(CancellationState::Confirming { booking_id }),
				InFlight(self.machine.clone()),
			)
		};
		let span = FlowSpan::new(KIND, "cancel_booking");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let path = format!("bookings/{booking_id}/cancel/");
		let result: Result<CancellationReceipt> =
			span.instrument(self.gateway.post_empty(&path)).await;

		obs::record_result(KIND, &result);
		drop(in_flight);

		let outcome = match result {
			Ok(receipt) => {
				self.bookings.apply_cancellation(booking_id, &receipt);

				CancellationOutcome::Succeeded { message: success_message(&receipt) }
			},
			Err(err) => {
				obs::log_failure(KIND, "cancel_booking", &err);

				CancellationOutcome::Failed { message: err.user_message(CANCEL_FAILED_MESSAGE) }
			},
		};

		self.resolve(epoch, booking_id, outcome.clone());

		Ok(outcome)
	}

	fn resolve(&self, epoch: u64, booking_id: BookingId, outcome: CancellationOutcome) {
		let resolved = {
			let mut machine = self.machine.lock();

			if machine.epoch != epoch {
				return;
			}

			machine.transition(CancellationState::Resolved { booking_id, outcome })
		};
		let machine = Arc::downgrade(&self.machine);
		let delay = self.reset_delay;

		tokio::spawn(async move {
			tokio::time::sleep(delay).await;

			if let Some(machine) = machine.upgrade() {
				let mut machine = machine.lock();

				if machine.epoch == resolved {
					machine.transition(CancellationState::Idle);
				}
			}
		});
	}
}
impl Debug for CancellationWorkflow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CancellationWorkflow")
			.field("state", &self.state())
			.field("reset_delay", &self.reset_delay)
			.finish()
	}
}

fn success_message(receipt: &CancellationReceipt) -> String {
	match receipt.refund_amount {
		Some(amount) => format!("Booking cancelled successfully! Refund of ₹{amount} initiated."),
		None => "Booking cancelled successfully! Refund has been initiated.".into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::model::Amount;

	#[test]
	fn views_never_cancel_without_selection() {
		let id = BookingId::new(4);
		let states = [
			CancellationState::Idle,
			CancellationState::Selecting { booking_id: id },
			CancellationState::Confirming { booking_id: id },
			CancellationState::Resolved {
				booking_id: id,
				outcome: CancellationOutcome::Failed { message: "nope".into() },
			},
		];

		for state in states {
			let view = state.view();

			assert!(!view.is_cancelling || view.selected_booking_id.is_some());
		}

		assert_eq!(
			CancellationState::Confirming { booking_id: id }.view(),
			CancellationView {
				is_cancelling: true,
				selected_booking_id: Some(id),
				cancel_error: None,
				cancel_success: None,
			}
		);
	}

	#[test]
	fn success_message_quotes_refund() {
		let receipt = CancellationReceipt {
			refund_id: Some("rf_1".into()),
			refund_amount: Some(Amount::new(250.)),
			booking: None,
		};

		assert_eq!(
			success_message(&receipt),
			"Booking cancelled successfully! Refund of ₹250 initiated."
		);
	}

	#[test]
	fn refund_bands_follow_departure_distance() {
		assert_eq!(RefundPolicy::band_for(Duration::hours(30)).percent, 80);
		assert_eq!(RefundPolicy::band_for(Duration::hours(24)).percent, 50);
		assert_eq!(RefundPolicy::band_for(Duration::hours(12)).percent, 50);
		assert_eq!(RefundPolicy::band_for(Duration::hours(10)).percent, 25);
	}

	#[test]
	fn stale_epoch_cannot_resolve() {
		let mut machine = Machine::default();
		let first =
			machine.transition(CancellationState::Confirming { booking_id: BookingId::new(1) });
		let second = machine.transition(CancellationState::Idle);

		assert_ne!(first, second);
		assert_eq!(machine.epoch, second);
	}
}
