//! Client context that wires every component to one shared gateway.
//!
//! There is no global state. An embedding application builds one [`AppContext`] at startup,
//! calls [`AppContext::start`] to reconcile stored credentials, and hands the components to
//! its views.

// self
use crate::{
	_prelude::*,
	bookings::BookingManager,
	cancellation::CancellationWorkflow,
	checkout::Checkout,
	config::ClientConfig,
	gateway::ApiGateway,
	guard::RouteGuard,
	http::ApiTransport,
	payment::{PaymentOrchestrator, PaymentWidget},
	session::{Session, SessionController},
	shell::Shell,
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// All client components, sharing one gateway, token store, and shell.
#[derive(Clone, Debug)]
pub struct AppContext {
	/// Configuration the context was built from.
	pub config: ClientConfig,
	/// Authenticated gateway.
	pub gateway: Arc<ApiGateway>,
	/// Booking collection and catalogue cache.
	pub bookings: Arc<BookingManager>,
	/// Session controller.
	pub session: Arc<SessionController>,
	/// Guard for protected views.
	pub guard: Arc<RouteGuard>,
	/// Cancellation state machine.
	pub cancellation: Arc<CancellationWorkflow>,
	/// Payment widget bridge.
	pub payments: Arc<PaymentOrchestrator>,
	/// Booking wizard search and payment steps.
	pub checkout: Arc<Checkout>,
}
impl AppContext {
	/// Builds a context over a caller-supplied transport.
	pub fn with_transport(
		config: ClientConfig,
		transport: Arc<dyn ApiTransport>,
		store: Arc<dyn TokenStore>,
		shell: Arc<dyn Shell>,
		widget: Arc<dyn PaymentWidget>,
	) -> Self {
		let gateway =
			Arc::new(ApiGateway::new(config.api_base.clone(), transport, store, shell.clone()));
		let bookings = Arc::new(BookingManager::new(gateway.clone()));
		let session = Arc::new(SessionController::new(
			gateway.clone(),
			bookings.clone(),
			shell.clone(),
			config.default_sort,
		));
		let guard = Arc::new(RouteGuard::new(gateway.clone(), shell.clone()));
		let cancellation = Arc::new(CancellationWorkflow::new(
			gateway.clone(),
			bookings.clone(),
			config.cancellation_reset_delay,
		));
		let payments = Arc::new(PaymentOrchestrator::new(widget, config.payment.clone()));
		let checkout = Arc::new(Checkout::new(
			gateway.clone(),
			bookings.clone(),
			session.clone(),
			payments.clone(),
			shell,
			config.payment.currency.clone(),
			config.default_sort,
		));

		Self { config, gateway, bookings, session, guard, cancellation, payments, checkout }
	}

	/// Builds a context over the default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn new(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		shell: Arc<dyn Shell>,
		widget: Arc<dyn PaymentWidget>,
	) -> Self {
		Self::with_transport(config, Arc::new(ReqwestHttpClient::default()), store, shell, widget)
	}

	/// Reconciles stored credentials with the backend. See [`SessionController::restore`].
	pub async fn start(&self) -> Session {
		self.session.restore().await
	}
}
