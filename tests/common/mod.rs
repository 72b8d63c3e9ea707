#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
use tokio::sync::Semaphore;
use url::Url;
// self
use busbook_client::{
	app::AppContext,
	config::ClientConfig,
	http::{ApiRequest, ApiResponse, ApiTransport, Method, TransportFuture},
	payment::{
		CheckoutOptions, PaymentReceipt, PaymentResolver, PaymentWidget, WidgetError, WidgetFuture,
	},
	shell::RecordingShell,
	store::MemoryStore,
};

pub const API_BASE: &str = "https://api.example.com/api/";

/// Unsigned JWT whose `exp` lies `expires_in` from now.
pub fn jwt(expires_in: Duration) -> String {
	let exp = (OffsetDateTime::now_utc() + expires_in).unix_timestamp();
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp},\"user_id\":7}}"));

	format!("{header}.{payload}.signature")
}

pub fn fresh_jwt() -> String {
	jwt(Duration::minutes(5))
}

pub fn expired_jwt() -> String {
	jwt(Duration::seconds(-1))
}

pub fn api_base() -> Url {
	Url::parse(API_BASE).expect("API base fixture should parse.")
}

pub fn receipt() -> PaymentReceipt {
	PaymentReceipt {
		payment_id: "pay_1".into(),
		order_id: "order_1".into(),
		signature: "sig_1".into(),
	}
}

pub fn booking_json(id: u64, status: &str, payment_status: &str) -> serde_json::Value {
	serde_json::json!({
		"id": id,
		"bus": 3,
		"seats_booked": 2,
		"start_location": "Pune",
		"drop_location": "Goa",
		"travel_date": "2030-01-15",
		"booking_date": "2029-12-01T10:00:00Z",
		"amount": "900.00",
		"status": status,
		"payment_status": payment_status,
		"refund_id": null,
		"refund_amount": null
	})
}

pub fn profile_json(username: &str) -> serde_json::Value {
	serde_json::json!({
		"username": username,
		"email": format!("{username}@example.com"),
		"phone_number": "9999999999",
		"first_name": null,
		"last_name": null
	})
}

struct Route {
	method: Method,
	path: String,
	responses: VecDeque<ApiResponse>,
}

/// Transport answering from scripted per-endpoint queues and recording every request.
///
/// The last queued response of an endpoint is repeated; unscripted endpoints answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
	routes: Mutex<Vec<Route>>,
	requests: Mutex<Vec<ApiRequest>>,
	gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}
impl ScriptedTransport {
	pub fn on(&self, method: Method, path: &str, status: u16, body: serde_json::Value) -> &Self {
		let response = ApiResponse::json(status, body.to_string());
		let mut routes = self.routes.lock();

		match routes.iter_mut().find(|route| route.method == method && route.path == path) {
			Some(route) => route.responses.push_back(response),
			None => routes.push(Route {
				method,
				path: path.to_owned(),
				responses: VecDeque::from([response]),
			}),
		}

		self
	}

	/// Makes requests to `path` wait until [`release`](Self::release) is called.
	pub fn hold(&self, path: &str) {
		self.gates.lock().insert(path.to_owned(), Arc::new(Semaphore::new(0)));
	}

	/// Lets one held request to `path` through.
	pub fn release(&self, path: &str) {
		if let Some(gate) = self.gates.lock().get(path) {
			gate.add_permits(1);
		}
	}

	pub fn requests(&self) -> Vec<ApiRequest> {
		self.requests.lock().clone()
	}

	pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
		self.requests()
			.into_iter()
			.filter(|request| request.method == method && request.url.path() == path)
			.collect()
	}

	pub fn bearer_of(request: &ApiRequest) -> Option<String> {
		request.bearer.as_ref().map(|bearer| bearer.expose().to_owned())
	}

	pub fn body_of(request: &ApiRequest) -> serde_json::Value {
		request
			.body
			.as_deref()
			.map(|body| serde_json::from_slice(body).expect("Request body should be JSON."))
			.unwrap_or(serde_json::Value::Null)
	}

	fn respond(&self, request: &ApiRequest) -> ApiResponse {
		let mut routes = self.routes.lock();
		let route = routes
			.iter_mut()
			.find(|route| route.method == request.method && route.path == request.url.path());

		match route {
			Some(route) if route.responses.len() > 1 =>
				route.responses.pop_front().expect("Queue holds more than one response."),
			Some(route) => route.responses.front().cloned().expect("Route holds a response."),
			None => ApiResponse::json(404, r#"{"detail":"Not found."}"#),
		}
	}
}
impl ApiTransport for ScriptedTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let response = self.respond(&request);
		let gate = self.gates.lock().get(request.url.path()).cloned();

		self.requests.lock().push(request);

		Box::pin(async move {
			if let Some(gate) = gate {
				gate.acquire().await.expect("Gate semaphore stays open.").forget();
			}

			Ok(response)
		})
	}
}

/// What [`FakeWidget`] does with the resolver it is handed.
#[derive(Clone, Debug)]
pub enum WidgetScript {
	Succeed(PaymentReceipt),
	Fail(Option<String>, Option<String>),
	Dismiss,
	Drop,
	Refuse,
	Hold,
}

/// Payment widget double with scripted load results and dialog behavior.
pub struct FakeWidget {
	loads: Mutex<VecDeque<bool>>,
	load_calls: Mutex<u32>,
	script: Mutex<WidgetScript>,
	opened: Mutex<Vec<CheckoutOptions>>,
	held: Mutex<Option<PaymentResolver>>,
}
impl FakeWidget {
	pub fn new(script: WidgetScript) -> Self {
		Self {
			loads: Default::default(),
			load_calls: Default::default(),
			script: Mutex::new(script),
			opened: Default::default(),
			held: Default::default(),
		}
	}

	/// Scripts the next load results; once exhausted every load succeeds.
	pub fn with_loads(self, loads: impl IntoIterator<Item = bool>) -> Self {
		self.loads.lock().extend(loads);

		self
	}

	pub fn load_calls(&self) -> u32 {
		*self.load_calls.lock()
	}

	pub fn opened(&self) -> Vec<CheckoutOptions> {
		self.opened.lock().clone()
	}

	pub fn take_held(&self) -> Option<PaymentResolver> {
		self.held.lock().take()
	}
}
impl PaymentWidget for FakeWidget {
	fn load(&self) -> WidgetFuture<'_> {
		*self.load_calls.lock() += 1;

		let ok = self.loads.lock().pop_front().unwrap_or(true);

		Box::pin(async move {
			tokio::task::yield_now().await;

			if ok { Ok(()) } else { Err(WidgetError::Load { message: "script blocked".into() }) }
		})
	}

	fn open(&self, options: CheckoutOptions, resolver: PaymentResolver) -> Result<(), WidgetError> {
		self.opened.lock().push(options);

		match self.script.lock().clone() {
			WidgetScript::Succeed(receipt) => resolver.succeed(receipt),
			WidgetScript::Fail(description, reason) =>
				resolver.fail(description.as_deref(), reason.as_deref()),
			WidgetScript::Dismiss => resolver.dismiss(),
			WidgetScript::Drop => drop(resolver),
			WidgetScript::Refuse =>
				return Err(WidgetError::Open { message: "constructor missing".into() }),
			WidgetScript::Hold => *self.held.lock() = Some(resolver),
		}

		Ok(())
	}
}

pub struct Harness {
	pub app: AppContext,
	pub transport: Arc<ScriptedTransport>,
	pub store: MemoryStore,
	pub shell: Arc<RecordingShell>,
	pub widget: Arc<FakeWidget>,
}

/// Full client context over a scripted transport and an in-memory store.
pub fn harness(store: MemoryStore, widget: FakeWidget) -> Harness {
	let config = ClientConfig::builder(API_BASE)
		.payment_key("rzp_test_key")
		.build()
		.expect("Client config fixture should build.");
	let transport = Arc::new(ScriptedTransport::default());
	let shell = Arc::new(RecordingShell::default());
	let widget = Arc::new(widget);
	let app = AppContext::with_transport(
		config,
		transport.clone(),
		Arc::new(store.clone()),
		shell.clone(),
		widget.clone(),
	);

	Harness { app, transport, store, shell, widget }
}
