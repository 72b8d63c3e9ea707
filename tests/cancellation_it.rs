mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use serde_json::json;
// self
use busbook_client::{
	cancellation::{CANCEL_FAILED_MESSAGE, CancellationOutcome, CancellationState, CancellationView},
	error::{CancellationError, Error},
	http::Method,
	model::{Amount, BookingId, BookingSort, BookingStatus},
	store::MemoryStore,
};
use common::{FakeWidget, Harness, WidgetScript};

const CANCEL_PATH: &str = "/api/bookings/1/cancel/";

async fn loaded() -> Harness {
	let h = common::harness(
		MemoryStore::with_tokens(Some(&common::fresh_jwt()), Some("R1")),
		FakeWidget::new(WidgetScript::Dismiss),
	);

	h.transport.on(
		Method::Get,
		"/api/book/",
		200,
		json!([
			common::booking_json(1, "BOOKED", "completed"),
			common::booking_json(2, "BOOKED", "pending"),
			common::booking_json(3, "CANCELLED", "completed"),
		]),
	);
	h.app
		.bookings
		.fetch_bookings(BookingSort::default())
		.await
		.expect("Booking fixture should load.");

	h
}

#[tokio::test(start_paused = true)]
async fn successful_cancellation_updates_collection_and_resets_after_delay() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(
		Method::Post,
		CANCEL_PATH,
		200,
		json!({
			"refund_id": "rfnd_1",
			"refund_amount": 720,
			"booking": { "status": "CANCELLED", "payment_status": "completed" }
		}),
	);
	h.app.cancellation.start_cancellation(id).expect("Paid booking should be cancellable.");

	assert_eq!(h.app.cancellation.state(), CancellationState::Selecting { booking_id: id });

	let outcome =
		h.app.cancellation.cancel_booking(id).await.expect("Cancellation should be accepted.");

	assert_eq!(
		outcome,
		CancellationOutcome::Succeeded {
			message: "Booking cancelled successfully! Refund of ₹720 initiated.".into()
		}
	);

	let booking = h.app.bookings.booking(id).expect("Cancelled booking stays in the collection.");

	assert_eq!(booking.status, BookingStatus::Cancelled);
	assert_eq!(booking.refund_id.as_deref(), Some("rfnd_1"));
	assert_eq!(booking.refund_amount, Some(Amount::new(720.)));
	assert_eq!(h.app.bookings.bookings().len(), 3);
	assert_eq!(
		h.app.cancellation.view(),
		CancellationView {
			cancel_success: Some(outcome.message().to_owned()),
			..Default::default()
		}
	);

	tokio::time::sleep(StdDuration::from_secs(4)).await;

	assert!(matches!(h.app.cancellation.state(), CancellationState::Resolved { .. }));

	tokio::time::sleep(StdDuration::from_secs(2)).await;

	assert_eq!(h.app.cancellation.state(), CancellationState::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_cancellation_surfaces_backend_error_and_keeps_booking() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(Method::Post, CANCEL_PATH, 400, json!({ "error": "Too close to departure" }));
	h.app.cancellation.start_cancellation(id).expect("Paid booking should be cancellable.");

	let outcome =
		h.app.cancellation.cancel_booking(id).await.expect("Cancellation should be accepted.");

	assert_eq!(outcome, CancellationOutcome::Failed { message: "Too close to departure".into() });
	assert_eq!(
		h.app.bookings.booking(id).map(|booking| booking.status),
		Some(BookingStatus::Booked)
	);

	let view = h.app.cancellation.view();

	assert_eq!(view.selected_booking_id, Some(id));
	assert_eq!(view.cancel_error.as_deref(), Some("Too close to departure"));
	assert!(!view.is_cancelling);
}

#[tokio::test(start_paused = true)]
async fn failure_without_backend_message_uses_fallback() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(Method::Post, CANCEL_PATH, 500, json!({}));

	let outcome =
		h.app.cancellation.cancel_booking(id).await.expect("Cancellation should be accepted.");

	assert_eq!(outcome, CancellationOutcome::Failed { message: CANCEL_FAILED_MESSAGE.into() });
	assert_eq!(h.transport.requests_to(Method::Post, CANCEL_PATH).len(), 1);
}

#[tokio::test]
async fn start_is_refused_for_unknown_unpaid_or_cancelled_bookings() {
	let h = loaded().await;
	let workflow = &h.app.cancellation;

	assert_eq!(
		workflow.start_cancellation(BookingId::new(9)),
		Err(CancellationError::UnknownBooking { booking_id: BookingId::new(9) })
	);
	assert_eq!(
		workflow.start_cancellation(BookingId::new(2)),
		Err(CancellationError::NotCancellable { booking_id: BookingId::new(2) })
	);
	assert_eq!(
		workflow.start_cancellation(BookingId::new(3)),
		Err(CancellationError::NotCancellable { booking_id: BookingId::new(3) })
	);

	workflow.start_cancellation(BookingId::new(1)).expect("Paid booking should be cancellable.");

	assert_eq!(workflow.start_cancellation(BookingId::new(1)), Err(CancellationError::NotIdle));

	workflow.reset_cancellation();

	assert_eq!(workflow.state(), CancellationState::Idle);
}

#[tokio::test(start_paused = true)]
async fn second_submission_is_rejected_while_in_flight() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(Method::Post, CANCEL_PATH, 200, json!({ "refund_amount": "100.50" }));
	h.transport.hold(CANCEL_PATH);

	let workflow = h.app.cancellation.clone();
	let pending = tokio::spawn(async move { workflow.cancel_booking(id).await });

	while !h.app.cancellation.view().is_cancelling {
		tokio::task::yield_now().await;
	}

	let err = h
		.app
		.cancellation
		.cancel_booking(id)
		.await
		.expect_err("Concurrent submission should be rejected.");

	assert!(matches!(
		err,
		Error::Cancellation(CancellationError::InFlight { booking_id }) if booking_id == id
	));
	assert_eq!(
		h.app.cancellation.start_cancellation(id),
		Err(CancellationError::InFlight { booking_id: id })
	);

	h.transport.release(CANCEL_PATH);

	let outcome = pending
		.await
		.expect("Cancellation task should not panic.")
		.expect("First submission should be accepted.");

	assert_eq!(outcome.message(), "Booking cancelled successfully! Refund of ₹100.50 initiated.");
	assert_eq!(h.transport.requests_to(Method::Post, CANCEL_PATH).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reset_during_flight_suppresses_the_banner() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(Method::Post, CANCEL_PATH, 200, json!({ "refund_id": "rfnd_2" }));
	h.transport.hold(CANCEL_PATH);

	let workflow = h.app.cancellation.clone();
	let pending = tokio::spawn(async move { workflow.cancel_booking(id).await });

	while !h.app.cancellation.view().is_cancelling {
		tokio::task::yield_now().await;
	}

	h.app.cancellation.reset_cancellation();
	h.transport.release(CANCEL_PATH);

	let outcome = pending
		.await
		.expect("Cancellation task should not panic.")
		.expect("Submission should be accepted.");

	assert_eq!(outcome.message(), "Booking cancelled successfully! Refund has been initiated.");
	assert_eq!(h.app.cancellation.state(), CancellationState::Idle);
	assert_eq!(
		h.app.bookings.booking(id).map(|booking| booking.status),
		Some(BookingStatus::Cancelled)
	);
}

#[tokio::test(start_paused = true)]
async fn reset_does_not_release_the_in_flight_guard() {
	let h = loaded().await;
	let first = BookingId::new(1);
	let second = BookingId::new(2);

	h.transport.on(Method::Post, CANCEL_PATH, 200, json!({ "refund_id": "rfnd_3" }));
	h.transport.on(Method::Post, "/api/bookings/2/cancel/", 200, json!({}));
	h.transport.hold(CANCEL_PATH);

	let workflow = h.app.cancellation.clone();
	let pending = tokio::spawn(async move { workflow.cancel_booking(first).await });

	while !h.app.cancellation.view().is_cancelling {
		tokio::task::yield_now().await;
	}

	h.app.cancellation.reset_cancellation();

	let err = h
		.app
		.cancellation
		.cancel_booking(second)
		.await
		.expect_err("Submission should be rejected while another is pending.");

	assert!(matches!(
		err,
		Error::Cancellation(CancellationError::InFlight { booking_id }) if booking_id == first
	));
	assert_eq!(
		h.app.cancellation.start_cancellation(first),
		Err(CancellationError::InFlight { booking_id: first })
	);

	h.transport.release(CANCEL_PATH);
	pending
		.await
		.expect("Cancellation task should not panic.")
		.expect("First submission should be accepted.");

	assert!(h.transport.requests_to(Method::Post, "/api/bookings/2/cancel/").is_empty());
	assert_eq!(h.app.cancellation.state(), CancellationState::Idle);

	h.app
		.cancellation
		.cancel_booking(second)
		.await
		.expect("Submission should be accepted once the guard is released.");

	assert_eq!(h.transport.requests_to(Method::Post, "/api/bookings/2/cancel/").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn resetting_twice_equals_resetting_once() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(Method::Post, CANCEL_PATH, 400, json!({ "error": "Too late" }));
	h.app.cancellation.cancel_booking(id).await.expect("Cancellation should be accepted.");

	assert!(matches!(h.app.cancellation.state(), CancellationState::Resolved { .. }));

	h.app.cancellation.reset_cancellation();

	let once = h.app.cancellation.view();

	h.app.cancellation.reset_cancellation();

	assert_eq!(once, CancellationView::default());
	assert_eq!(h.app.cancellation.view(), once);
	assert_eq!(h.app.cancellation.state(), CancellationState::Idle);
}

#[tokio::test(start_paused = true)]
async fn stale_timer_does_not_clear_a_newer_cycle() {
	let h = loaded().await;
	let id = BookingId::new(1);

	h.transport.on(Method::Post, CANCEL_PATH, 400, json!({ "error": "Try again" }));
	h.app.cancellation.cancel_booking(id).await.expect("Cancellation should be accepted.");

	tokio::time::sleep(StdDuration::from_secs(3)).await;
	h.app.cancellation.reset_cancellation();
	h.app.cancellation.start_cancellation(id).expect("Booking is still cancellable.");
	tokio::time::sleep(StdDuration::from_secs(3)).await;

	assert_eq!(h.app.cancellation.state(), CancellationState::Selecting { booking_id: id });
}
