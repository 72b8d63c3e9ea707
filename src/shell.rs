//! Boundary between the client core and the host UI.
//!
//! The core never renders anything. It reports navigation requests and user-facing notices
//! through [`Shell`], and the host decides how to present them.

// self
use crate::_prelude::*;

/// Client-side views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
	/// Landing page.
	Home,
	/// Login form.
	Login,
	/// Account creation form.
	Signup,
	/// Booking wizard.
	Booking,
	/// Current user's bookings.
	MyBookings,
	/// Profile editor.
	Profile,
	/// Route catalogue.
	Destinations,
	/// Static about page.
	About,
	/// Static support page.
	Support,
}
impl View {
	/// Whether the view sits behind the route guard.
	pub const fn is_guarded(self) -> bool {
		matches!(self, Self::Booking | Self::MyBookings | Self::Profile)
	}

	/// Path the view is served under.
	pub const fn path(self) -> &'static str {
		match self {
			Self::Home => "/",
			Self::Login => "/login",
			Self::Signup => "/signup",
			Self::Booking => "/booking",
			Self::MyBookings => "/my-bookings",
			Self::Profile => "/profile",
			Self::Destinations => "/destinations",
			Self::About => "/about",
			Self::Support => "/support",
		}
	}
}
impl Display for View {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.path())
	}
}

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
	/// Neutral information.
	Info,
	/// Completed action.
	Success,
	/// Failed action.
	Error,
}

/// User-facing banner text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	/// Severity.
	pub level: NoticeLevel,
	/// Display text; never a raw backend error.
	pub message: String,
}
impl Notice {
	/// Informational notice.
	pub fn info(message: impl Into<String>) -> Self {
		Self { level: NoticeLevel::Info, message: message.into() }
	}

	/// Success notice.
	pub fn success(message: impl Into<String>) -> Self {
		Self { level: NoticeLevel::Success, message: message.into() }
	}

	/// Error notice.
	pub fn error(message: impl Into<String>) -> Self {
		Self { level: NoticeLevel::Error, message: message.into() }
	}
}

/// Host UI hooks invoked by the client core.
pub trait Shell
where
	Self: Send + Sync,
{
	/// Moves the user to `view`.
	fn navigate(&self, view: View);

	/// Shows `notice` to the user.
	fn notify(&self, notice: Notice);
}

/// Event captured by [`RecordingShell`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellEvent {
	/// A navigation request.
	Navigated(View),
	/// A notice.
	Notified(Notice),
}

/// Shell that only records what it was asked to do; suited to headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingShell {
	events: Mutex<Vec<ShellEvent>>,
}
impl RecordingShell {
	/// Every event in arrival order.
	pub fn events(&self) -> Vec<ShellEvent> {
		self.events.lock().clone()
	}

	/// Most recent navigation target.
	pub fn current_view(&self) -> Option<View> {
		self.events.lock().iter().rev().find_map(|event| match event {
			ShellEvent::Navigated(view) => Some(*view),
			_ => None,
		})
	}

	/// Every navigation target in order.
	pub fn navigations(&self) -> Vec<View> {
		self.events
			.lock()
			.iter()
			.filter_map(|event| match event {
				ShellEvent::Navigated(view) => Some(*view),
				_ => None,
			})
			.collect()
	}

	/// Every notice in order.
	pub fn notices(&self) -> Vec<Notice> {
		self.events
			.lock()
			.iter()
			.filter_map(|event| match event {
				ShellEvent::Notified(notice) => Some(notice.clone()),
				_ => None,
			})
			.collect()
	}
}
impl Shell for RecordingShell {
	fn navigate(&self, view: View) {
		self.events.lock().push(ShellEvent::Navigated(view));
	}

	fn notify(&self, notice: Notice) {
		self.events.lock().push(ShellEvent::Notified(notice));
	}
}
