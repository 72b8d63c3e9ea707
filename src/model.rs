//! Backend data model: identifiers, bookings, buses and routes, and the user profile.

pub mod amount;
pub mod booking;
pub mod bus;
pub mod id;
pub mod profile;

pub use amount::*;
pub use booking::*;
pub use bus::*;
pub use id::*;
pub use profile::*;
