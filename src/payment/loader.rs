//! Cached, retrying loader shared by concurrent callers.

// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind},
	payment::PaymentWidget,
};

type SharedLoad = Shared<BoxFuture<'static, bool>>;

#[derive(Default)]
enum LoadState {
	#[default]
	Unloaded,
	Loading(SharedLoad),
	Loaded,
}

/// Loads a [`PaymentWidget`] at most once at a time.
///
/// Concurrent callers await the same in-flight load. A success is cached for the lifetime of
/// the loader; a failure (after every attempt) is forgotten so a later call starts over.
pub struct WidgetLoader {
	widget: Arc<dyn PaymentWidget>,
	attempts: u32,
	backoff: StdDuration,
	state: Mutex<LoadState>,
}
impl WidgetLoader {
	/// Creates a loader making up to `attempts` tries, `backoff` apart.
	pub fn new(widget: Arc<dyn PaymentWidget>, attempts: u32, backoff: StdDuration) -> Self {
		Self { widget, attempts: attempts.max(1), backoff, state: Default::default() }
	}

	/// Whether a previous load succeeded.
	pub fn is_loaded(&self) -> bool {
		matches!(*self.state.lock(), LoadState::Loaded)
	}

	/// Resolves `true` once the widget is loaded, or `false` after every attempt failed.
	pub async fn load(&self) -> bool {
		let load = {
			let mut state = self.state.lock();

			match &*state {
				LoadState::Loaded => return true,
				LoadState::Loading(load) => load.clone(),
				LoadState::Unloaded => {
					let load =
						attempt_all(self.widget.clone(), self.attempts, self.backoff).boxed().shared();

					*state = LoadState::Loading(load.clone());

					load
				},
			}
		};
		let loaded = load.clone().await;
		let mut state = self.state.lock();

		// Only the load this call awaited may settle the state.
		if matches!(&*state, LoadState::Loading(current) if current.ptr_eq(&load)) {
			*state = if loaded { LoadState::Loaded } else { LoadState::Unloaded };
		}

		loaded
	}
}
impl Debug for WidgetLoader {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WidgetLoader")
			.field("attempts", &self.attempts)
			.field("backoff", &self.backoff)
			.field("loaded", &self.is_loaded())
			.finish()
	}
}

async fn attempt_all(widget: Arc<dyn PaymentWidget>, attempts: u32, backoff: StdDuration) -> bool {
	for attempt in 1..=attempts {
		match widget.load().await {
			Ok(()) => return true,
			Err(err) => {
				obs::log_failure(FlowKind::Payment, "load_widget", &err);

				if attempt < attempts {
					tokio::time::sleep(backoff).await;
				}
			},
		}
	}

	false
}
