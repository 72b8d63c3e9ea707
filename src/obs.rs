//! Optional observability helpers for client flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `busbook.flow` with the `flow` and
//!   `stage` (call site) fields, plus `warn` events for failures that are handled locally
//!   instead of being returned to the caller.
//! - Enable `metrics` to increment the `busbook_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client flows observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Credential login.
	Login,
	/// Local logout.
	Logout,
	/// Startup session reconciliation.
	Restore,
	/// Account creation.
	Signup,
	/// Partial profile update.
	ProfileUpdate,
	/// Access-token refresh.
	Refresh,
	/// Guarded-view entry check.
	Guard,
	/// Booking collection and reference-data loads.
	Bookings,
	/// Booking cancellation.
	Cancellation,
	/// Payment widget bridging.
	Payment,
	/// Booking creation through payment verification.
	Checkout,
}
impl FlowKind {
	/// Every observed flow.
	pub const ALL: [FlowKind; 11] = [
		FlowKind::Login,
		FlowKind::Logout,
		FlowKind::Restore,
		FlowKind::Signup,
		FlowKind::ProfileUpdate,
		FlowKind::Refresh,
		FlowKind::Guard,
		FlowKind::Bookings,
		FlowKind::Cancellation,
		FlowKind::Payment,
		FlowKind::Checkout,
	];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Logout => "logout",
			FlowKind::Restore => "restore",
			FlowKind::Signup => "signup",
			FlowKind::ProfileUpdate => "profile_update",
			FlowKind::Refresh => "refresh",
			FlowKind::Guard => "guard",
			FlowKind::Bookings => "bookings",
			FlowKind::Cancellation => "cancellation",
			FlowKind::Payment => "payment",
			FlowKind::Checkout => "checkout",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a client flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure surfaced to the caller or the shell.
	Failure,
}
impl FlowOutcome {
	/// Every recorded outcome.
	pub const ALL: [FlowOutcome; 3] =
		[FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the terminal outcome of `result` for `kind`.
pub fn record_result<T, E>(kind: FlowKind, result: &std::result::Result<T, E>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
