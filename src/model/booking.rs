//! Booking records and the payloads used to create, sort, and patch them.

// self
use crate::{
	_prelude::*,
	model::{Amount, BookingId, BusId},
};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

/// Booking lifecycle status. Cancellation is a transition, never a removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
	/// Seats are reserved.
	#[default]
	Booked,
	/// Booking was cancelled and a refund was initiated.
	Cancelled,
	/// Any status this client does not model.
	#[serde(other)]
	Other,
}

/// Payment status for a booking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
	/// Booking exists but its payment has not been verified.
	#[default]
	Pending,
	/// Payment was verified by the backend.
	Completed,
	/// Any status this client does not model.
	#[serde(other)]
	Other,
}

/// Booking record as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
	/// Primary key.
	pub id: BookingId,
	/// Foreign key of the booked bus.
	pub bus: BusId,
	/// Number of reserved seats.
	pub seats_booked: u32,
	/// Departure city.
	#[serde(default)]
	pub start_location: String,
	/// Arrival city.
	#[serde(default)]
	pub drop_location: String,
	/// Calendar date of travel.
	#[serde(with = "calendar_date")]
	pub travel_date: Date,
	/// Instant the booking was created.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub booking_date: Option<OffsetDateTime>,
	/// Total amount charged.
	#[serde(default)]
	pub amount: Amount,
	/// Booking lifecycle status.
	#[serde(default)]
	pub status: BookingStatus,
	/// Payment status.
	#[serde(default)]
	pub payment_status: PaymentStatus,
	/// Gateway refund identifier once cancelled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refund_id: Option<String>,
	/// Refunded amount once cancelled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refund_amount: Option<Amount>,
}
impl Booking {
	/// Only booked, paid bookings expose the cancel action.
	pub fn is_cancellable(&self) -> bool {
		self.status == BookingStatus::Booked && self.payment_status == PaymentStatus::Completed
	}

	/// Returns `true` once the booking has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.status == BookingStatus::Cancelled
	}
}

/// Payload submitted to create a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
	/// Selected bus.
	pub bus: BusId,
	/// Seats to reserve.
	pub seats_booked: u32,
	/// Departure city.
	pub start_location: String,
	/// Arrival city.
	pub drop_location: String,
	/// Calendar date of travel.
	#[serde(with = "calendar_date")]
	pub travel_date: Date,
}

/// Partial booking returned alongside a cancellation; present fields overwrite the local
/// record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookingPatch {
	/// Updated lifecycle status.
	pub status: Option<BookingStatus>,
	/// Updated payment status.
	pub payment_status: Option<PaymentStatus>,
	/// Updated amount.
	pub amount: Option<Amount>,
	/// Refund identifier.
	pub refund_id: Option<String>,
	/// Refunded amount.
	pub refund_amount: Option<Amount>,
}
impl BookingPatch {
	/// Overwrites `booking` with every field present in the patch.
	pub fn apply(&self, booking: &mut Booking) {
		if let Some(status) = self.status {
			booking.status = status;
		}
		if let Some(payment_status) = self.payment_status {
			booking.payment_status = payment_status;
		}
		if let Some(amount) = self.amount {
			booking.amount = amount;
		}
		if let Some(refund_id) = &self.refund_id {
			booking.refund_id = Some(refund_id.clone());
		}
		if let Some(refund_amount) = self.refund_amount {
			booking.refund_amount = Some(refund_amount);
		}
	}
}

/// Body returned by the cancellation endpoint on success.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CancellationReceipt {
	/// Gateway refund identifier.
	#[serde(default)]
	pub refund_id: Option<String>,
	/// Amount refunded under the server-side refund policy.
	#[serde(default)]
	pub refund_amount: Option<Amount>,
	/// Updated booking fields.
	#[serde(default)]
	pub booking: Option<BookingPatch>,
}
impl CancellationReceipt {
	/// Folds the receipt into `booking`: the nested booking fields first, then the refund
	/// fields and the cancelled status.
	pub fn apply(&self, booking: &mut Booking) {
		if let Some(patch) = &self.booking {
			patch.apply(booking);
		}

		booking.status = BookingStatus::Cancelled;

		if let Some(refund_id) = &self.refund_id {
			booking.refund_id = Some(refund_id.clone());
		}
		if let Some(refund_amount) = self.refund_amount {
			booking.refund_amount = Some(refund_amount);
		}
	}
}

/// Server-side ordering of the booking list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingSort {
	/// Oldest bookings first.
	BookedOldestFirst,
	/// Most recent bookings first.
	#[default]
	BookedNewestFirst,
	/// Earliest travel date first.
	TravelSoonestFirst,
	/// Latest travel date first.
	TravelLatestFirst,
}
impl BookingSort {
	/// Value of the `ordering` query parameter: a field name, `-` prefixed for descending.
	pub const fn as_ordering(self) -> &'static str {
		match self {
			Self::BookedOldestFirst => "booking_date",
			Self::BookedNewestFirst => "-booking_date",
			Self::TravelSoonestFirst => "travel_date",
			Self::TravelLatestFirst => "-travel_date",
		}
	}

	/// Parses an `ordering` value back into a sort key.
	pub fn from_ordering(value: &str) -> Option<Self> {
		[
			Self::BookedOldestFirst,
			Self::BookedNewestFirst,
			Self::TravelSoonestFirst,
			Self::TravelLatestFirst,
		]
		.into_iter()
		.find(|sort| sort.as_ordering() == value)
	}
}
impl Display for BookingSort {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_ordering())
	}
}
