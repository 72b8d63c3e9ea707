//! Strongly typed backend identifiers.

// std
use std::num::ParseIntError;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(u64);
		impl $name {
			/// Wraps a raw backend primary key.
			pub const fn new(value: u64) -> Self {
				Self(value)
			}

			/// Returns the raw primary key.
			pub const fn get(self) -> u64 {
				self.0
			}
		}
		impl From<u64> for $name {
			fn from(value: u64) -> Self {
				Self(value)
			}
		}
		impl From<$name> for u64 {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0, f)
			}
		}
		impl FromStr for $name {
			type Err = ParseIntError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				s.trim().parse().map(Self)
			}
		}
	};
}

def_id! { BookingId, "Primary key of a booking record.", "Booking" }
def_id! { BusId, "Primary key of a bus record.", "Bus" }
