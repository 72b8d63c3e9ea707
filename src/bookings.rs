//! Current user's booking collection plus the bus and route reference data used to display
//! it.
//!
//! The collection is replaced wholesale on every fetch and never merged. New bookings are not
//! inserted locally; the caller refetches once payment is verified so unpaid bookings never
//! appear confirmed. Cancellation is folded in as a state transition, never a removal.

// self
use crate::{
	_prelude::*,
	gateway::ApiGateway,
	model::{
		Booking, BookingId, BookingSort, Bus, BusId, BusQuery, BusRoute, CancellationReceipt,
		CityDirectory, NewBooking,
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Booking list and creation endpoint.
pub const BOOKINGS_PATH: &str = "book/";
/// Bus search endpoint.
pub const BUSES_PATH: &str = "buses/";
/// Route catalogue endpoint.
pub const ROUTES_PATH: &str = "routes/";

/// Booking joined with its bus for display.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingDisplay {
	/// Underlying record.
	pub booking: Booking,
	/// Bus operator, or `Operator #<bus id>` when the bus is unknown.
	pub operator: String,
	/// Bus name, or `Bus #<bus id>` when the bus is unknown.
	pub bus_name: String,
}

/// Owns the in-memory booking collection and the bus directory.
#[derive(Debug)]
pub struct BookingManager {
	gateway: Arc<ApiGateway>,
	bookings: RwLock<Vec<Booking>>,
	buses: RwLock<HashMap<BusId, Bus>>,
}
impl BookingManager {
	/// Creates an empty manager.
	pub fn new(gateway: Arc<ApiGateway>) -> Self {
		Self { gateway, bookings: Default::default(), buses: Default::default() }
	}

	/// Fetches the user's bookings in `sort` order and replaces the collection with them.
	///
	/// On failure the current collection is left untouched.
	pub async fn fetch_bookings(&self, sort: BookingSort) -> Result<Vec<Booking>> {
		const KIND: FlowKind = FlowKind::Bookings;

		let span = FlowSpan::new(KIND, "fetch_bookings");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<Vec<Booking>> = span
			.instrument(async move {
				let bookings: Vec<Booking> = self
					.gateway
					.get_query(BOOKINGS_PATH, &[("ordering", sort.as_ordering().to_owned())])
					.await?;

				*self.bookings.write() = bookings.clone();

				Ok(bookings)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Snapshot of the collection in fetch order.
	pub fn bookings(&self) -> Vec<Booking> {
		self.bookings.read().clone()
	}

	/// Looks up a loaded booking.
	pub fn booking(&self, id: BookingId) -> Option<Booking> {
		self.bookings.read().iter().find(|booking| booking.id == id).cloned()
	}

	/// Submits a new booking and returns the created record without adding it locally.
	pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
		self.gateway.post(BOOKINGS_PATH, booking).await
	}

	/// Drops the collection; used by logout.
	pub fn clear(&self) {
		self.bookings.write().clear();
	}

	/// Folds a cancellation receipt into the matching booking.
	///
	/// Returns `false` when the booking is no longer loaded.
	pub fn apply_cancellation(&self, id: BookingId, receipt: &CancellationReceipt) -> bool {
		let mut bookings = self.bookings.write();

		match bookings.iter_mut().find(|booking| booking.id == id) {
			Some(booking) => {
				receipt.apply(booking);

				true
			},
			None => false,
		}
	}

	/// Searches buses and caches every result in the bus directory.
	pub async fn fetch_buses(&self, query: &BusQuery) -> Result<Vec<Bus>> {
		let buses: Vec<Bus> = self.gateway.get_query(BUSES_PATH, &query.to_pairs()).await?;
		let mut directory = self.buses.write();

		for bus in &buses {
			directory.insert(bus.id, bus.clone());
		}

		Ok(buses)
	}

	/// Cached bus record, if any search returned it.
	pub fn bus(&self, id: BusId) -> Option<Bus> {
		self.buses.read().get(&id).cloned()
	}

	/// Fetches the route catalogue.
	pub async fn fetch_routes(&self) -> Result<Vec<BusRoute>> {
		self.gateway.get(ROUTES_PATH).await
	}

	/// Distinct origin and destination cities from the route catalogue.
	pub async fn cities(&self) -> Result<CityDirectory> {
		let routes = self.fetch_routes().await?;

		Ok(CityDirectory::from_routes(&routes))
	}

	/// Joins `booking` with the bus directory, substituting placeholders for unknown buses.
	pub fn display(&self, booking: &Booking) -> BookingDisplay {
		let buses = self.buses.read();
		let (operator, bus_name) = match buses.get(&booking.bus) {
			Some(bus) => (bus.owner.clone(), bus.name.clone()),
			None => (format!("Operator #{}", booking.bus), format!("Bus #{}", booking.bus)),
		};

		BookingDisplay { booking: booking.clone(), operator, bus_name }
	}

	/// Display rows for the whole collection.
	pub fn displays(&self) -> Vec<BookingDisplay> {
		self.bookings().iter().map(|booking| self.display(booking)).collect()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		http::{ApiRequest, ApiTransport, TransportFuture},
		model::{Amount, BookingStatus, PaymentStatus},
		shell::RecordingShell,
		store::MemoryStore,
	};

	struct Offline;
	impl ApiTransport for Offline {
		fn execute(&self, _: ApiRequest) -> TransportFuture<'_> {
			Box::pin(async { Err(std::io::Error::other("offline").into()) })
		}
	}

	fn manager() -> BookingManager {
		let gateway = ApiGateway::new(
			Url::parse("https://api.example.com/api/").expect("Base URL fixture should parse."),
			Arc::new(Offline),
			Arc::new(MemoryStore::default()),
			Arc::new(RecordingShell::default()),
		);

		BookingManager::new(Arc::new(gateway))
	}

	fn booking(id: u64, bus: u64) -> Booking {
		Booking {
			id: BookingId::new(id),
			bus: BusId::new(bus),
			seats_booked: 2,
			start_location: "Pune".into(),
			drop_location: "Goa".into(),
			travel_date: macros::date!(2030 - 01 - 15),
			booking_date: None,
			amount: Amount::new(1000.),
			status: BookingStatus::Booked,
			payment_status: PaymentStatus::Completed,
			refund_id: None,
			refund_amount: None,
		}
	}

	#[test]
	fn display_falls_back_to_placeholders() {
		let manager = manager();

		manager.buses.write().insert(
			BusId::new(3),
			Bus {
				id: BusId::new(3),
				name: "Night Rider".into(),
				owner: "Konkan Travels".into(),
				seats: 40,
				price: Amount::new(500.),
				route: None,
			},
		);

		let known = manager.display(&booking(1, 3));
		let unknown = manager.display(&booking(2, 9));

		assert_eq!(known.operator, "Konkan Travels");
		assert_eq!(known.bus_name, "Night Rider");
		assert_eq!(unknown.operator, "Operator #9");
		assert_eq!(unknown.bus_name, "Bus #9");
	}

	#[test]
	fn cancellation_transitions_in_place() {
		let manager = manager();

		*manager.bookings.write() = vec![booking(1, 3), booking(2, 3)];

		let receipt = CancellationReceipt {
			refund_id: Some("rf_1".into()),
			refund_amount: Some(Amount::new(250.)),
			booking: None,
		};

		assert!(manager.apply_cancellation(BookingId::new(2), &receipt));
		assert!(!manager.apply_cancellation(BookingId::new(5), &receipt));

		let bookings = manager.bookings();

		assert_eq!(bookings.len(), 2);
		assert!(!bookings[0].is_cancelled());
		assert!(bookings[1].is_cancelled());
		assert_eq!(bookings[1].refund_id.as_deref(), Some("rf_1"));
	}

	#[tokio::test]
	async fn failed_fetch_keeps_collection() {
		let manager = manager();

		*manager.bookings.write() = vec![booking(1, 3)];

		manager
			.fetch_bookings(BookingSort::default())
			.await
			.expect_err("Offline transport should fail the fetch.");

		assert_eq!(manager.bookings().len(), 1);
	}
}
