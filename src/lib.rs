//! Headless bus-booking client: session lifecycle with transparent token refresh, a route
//! guard, booking collection management, a cancellation state machine, and a bridge into an
//! opaque payment widget, all talking to a REST backend.

#![deny(clippy::all, unused_crate_dependencies)]
#![warn(missing_docs)]

pub mod app;
pub mod auth;
pub mod bookings;
pub mod cancellation;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod http;
pub mod model;
pub mod obs;
pub mod payment;
pub mod session;
pub mod shell;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Date, Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
