//! Monetary amounts.
//!
//! The backend serializes decimals either as JSON numbers or as strings such as `"500.00"`,
//! so amounts deserialize leniently and always serialize as numbers.

// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Amount in major currency units (e.g. rupees).
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Amount(f64);
impl Amount {
	/// Zero amount.
	pub const ZERO: Self = Self(0.);

	/// Wraps a value in major units.
	pub const fn new(value: f64) -> Self {
		Self(value)
	}

	/// Returns the value in major units.
	pub const fn value(self) -> f64 {
		self.0
	}

	/// Returns `true` for finite, strictly positive values.
	pub fn is_positive(self) -> bool {
		self.0.is_finite() && self.0 > 0.
	}

	/// Converts to the gateway's integer minor units (paise), rounding to the nearest unit.
	pub fn to_minor_units(self) -> u64 {
		if !self.is_positive() {
			return 0;
		}

		(self.0 * 100.).round() as u64
	}

	/// Multiplies a per-seat price by a seat count.
	pub fn times(self, seats: u32) -> Self {
		Self(self.0 * f64::from(seats))
	}
}
impl From<f64> for Amount {
	fn from(value: f64) -> Self {
		Self(value)
	}
}
impl Debug for Amount {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Amount({})", self.0)
	}
}
impl Display for Amount {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.0.fract() == 0. { write!(f, "{:.0}", self.0) } else { write!(f, "{:.2}", self.0) }
	}
}
impl Serialize for Amount {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(self.0)
	}
}
impl<'de> Deserialize<'de> for Amount {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Number(f64),
			Text(String),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Number(value) => Ok(Self(value)),
			Raw::Text(text) => text
				.trim()
				.parse::<f64>()
				.map(Self)
				.map_err(|_| D::Error::custom(format!("invalid decimal amount `{text}`"))),
		}
	}
}
