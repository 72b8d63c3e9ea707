//! Read-only bus and route reference data.

// self
use crate::{
	_prelude::*,
	model::{Amount, BusId},
};

/// Route between two cities, with optional coordinates for map display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusRoute {
	/// Departure city.
	pub origin_city: String,
	/// Arrival city.
	pub destination_city: String,
	/// Departure latitude.
	#[serde(default)]
	pub origin_latitude: Option<f64>,
	/// Departure longitude.
	#[serde(default)]
	pub origin_longitude: Option<f64>,
	/// Arrival latitude.
	#[serde(default)]
	pub destination_latitude: Option<f64>,
	/// Arrival longitude.
	#[serde(default)]
	pub destination_longitude: Option<f64>,
}

/// A bus's route, either expanded inline or referenced by primary key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteRef {
	/// Route object embedded in the bus record.
	Expanded(BusRoute),
	/// Route primary key.
	Id(u64),
}

/// Bus record as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bus {
	/// Primary key.
	pub id: BusId,
	/// Bus display name.
	pub name: String,
	/// Operator name.
	pub owner: String,
	/// Seat capacity.
	pub seats: u32,
	/// Per-seat fare.
	pub price: Amount,
	/// Route served by this bus.
	#[serde(default)]
	pub route: Option<RouteRef>,
}
impl Bus {
	/// Route served by the bus when the backend embedded it.
	pub fn route(&self) -> Option<&BusRoute> {
		match &self.route {
			Some(RouteRef::Expanded(route)) => Some(route),
			_ => None,
		}
	}

	/// Fare for `seats` seats on this bus.
	pub fn fare(&self, seats: u32) -> Amount {
		self.price.times(seats)
	}
}

/// Filter for the bus search endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusQuery {
	/// Departure city filter.
	pub origin_city: Option<String>,
	/// Arrival city filter.
	pub destination_city: Option<String>,
}
impl BusQuery {
	/// Search for buses serving `origin` → `destination`.
	pub fn between(origin: impl Into<String>, destination: impl Into<String>) -> Self {
		Self { origin_city: Some(origin.into()), destination_city: Some(destination.into()) }
	}

	pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();

		if let Some(origin) = &self.origin_city {
			pairs.push(("origin_city", origin.clone()));
		}
		if let Some(destination) = &self.destination_city {
			pairs.push(("destination_city", destination.clone()));
		}

		pairs
	}
}

/// Distinct cities served by the route catalogue, sorted alphabetically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CityDirectory {
	/// Cities that appear as a route origin.
	pub origins: Vec<String>,
	/// Cities that appear as a route destination.
	pub destinations: Vec<String>,
}
impl CityDirectory {
	/// Collects unique origin and destination cities from `routes`.
	pub fn from_routes(routes: &[BusRoute]) -> Self {
		let origins: BTreeSet<_> = routes.iter().map(|route| route.origin_city.clone()).collect();
		let destinations: BTreeSet<_> =
			routes.iter().map(|route| route.destination_city.clone()).collect();

		Self {
			origins: origins.into_iter().collect(),
			destinations: destinations.into_iter().collect(),
		}
	}
}
