use std::sync::atomic::Ordering;

use storefront_checkout::domain::types::{JobState, MAX_LINE_QUANTITY};
use storefront_checkout::error::CheckoutServiceError;
use storefront_domain::id::ProductId;
use uuid::Uuid;

use crate::helpers::{Harness, checkout_input, line_item, variant};

#[tokio::test]
async fn should_enqueue_job_with_queued_status_and_wake_worker() {
    let harness = Harness::default();
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");
    let user_id = Uuid::now_v7();

    let output = harness
        .producer()
        .execute(checkout_input(user_id, vec![line_item(&key, 1)]))
        .await
        .unwrap();

    assert_eq!(harness.queue.len(), 1);
    assert!(output.order_number.starts_with("ORD-"));
    let record = harness.statuses.record(output.job_id).unwrap();
    assert_eq!(record.state, JobState::Queued);
    assert_eq!(record.user_id, user_id);
    assert_eq!(record.order_number, output.order_number);
    assert_eq!(harness.signal.count(), 1);
}

#[tokio::test]
async fn should_synthesize_full_name_from_first_and_last() {
    let harness = Harness::default();
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");

    harness
        .producer()
        .execute(checkout_input(Uuid::now_v7(), vec![line_item(&key, 1)]))
        .await
        .unwrap();

    let raw = harness.queue.entries.lock().unwrap()[0].clone();
    let entry: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(entry["payload"]["shippingAddress"]["fullName"], "Ada Buyer");
    assert!(entry["createdAt"].is_i64());
}

#[tokio::test]
async fn should_reject_empty_order_without_side_effects() {
    let harness = Harness::default();

    let result = harness
        .producer()
        .execute(checkout_input(Uuid::now_v7(), vec![]))
        .await;

    assert!(
        matches!(result, Err(CheckoutServiceError::EmptyOrder)),
        "expected EmptyOrder, got {result:?}"
    );
    assert_eq!(harness.queue.len(), 0);
    assert!(harness.statuses.records.lock().unwrap().is_empty());
    assert_eq!(harness.signal.count(), 0);
}

#[tokio::test]
async fn should_reject_more_than_fifty_items() {
    let harness = Harness::default();
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");

    let result = harness
        .producer()
        .execute(checkout_input(Uuid::now_v7(), vec![line_item(&key, 1); 51]))
        .await;

    assert!(matches!(
        result,
        Err(CheckoutServiceError::TooManyItems { max: 50 })
    ));
    assert_eq!(harness.queue.len(), 0);
}

#[tokio::test]
async fn should_reject_missing_shipping_address_and_payment_method() {
    let harness = Harness::default();
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");

    let mut input = checkout_input(Uuid::now_v7(), vec![line_item(&key, 1)]);
    input.shipping_address = None;
    let result = harness.producer().execute(input).await;
    assert!(matches!(
        result,
        Err(CheckoutServiceError::MissingShippingAddress)
    ));

    let mut input = checkout_input(Uuid::now_v7(), vec![line_item(&key, 1)]);
    input.payment_method = Some("   ".to_owned());
    let result = harness.producer().execute(input).await;
    assert!(matches!(
        result,
        Err(CheckoutServiceError::MissingPaymentMethod)
    ));

    assert_eq!(harness.queue.len(), 0);
}

#[tokio::test]
async fn should_reject_only_when_queue_exceeds_high_water_mark() {
    let harness = Harness {
        max_queue_depth: Some(2),
        ..Default::default()
    };
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");
    // Depth 0, 1 and 2 are all at or below the mark.
    for _ in 0..3 {
        harness
            .producer()
            .execute(checkout_input(Uuid::now_v7(), vec![line_item(&key, 1)]))
            .await
            .unwrap();
    }

    let result = harness
        .producer()
        .execute(checkout_input(Uuid::now_v7(), vec![line_item(&key, 1)]))
        .await;

    assert!(
        matches!(result, Err(CheckoutServiceError::QueueBusy)),
        "expected QueueBusy, got {result:?}"
    );
    assert_eq!(harness.queue.len(), 3, "queue length must be unchanged");
    assert_eq!(harness.statuses.records.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn should_reject_line_quantity_outside_bounds() {
    let harness = Harness::default();
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");

    for quantity in [0, -1, MAX_LINE_QUANTITY + 1, i32::MAX] {
        let result = harness
            .producer()
            .execute(checkout_input(
                Uuid::now_v7(),
                vec![line_item(&key, 1), line_item(&key, quantity)],
            ))
            .await;
        assert!(
            matches!(
                result,
                Err(CheckoutServiceError::InvalidQuantity {
                    max: MAX_LINE_QUANTITY
                })
            ),
            "quantity {quantity}: got {result:?}"
        );
    }
    assert_eq!(harness.queue.len(), 0);
    assert!(harness.statuses.records.lock().unwrap().is_empty());

    harness
        .producer()
        .execute(checkout_input(
            Uuid::now_v7(),
            vec![line_item(&key, MAX_LINE_QUANTITY)],
        ))
        .await
        .unwrap();
    assert_eq!(harness.queue.len(), 1);
}

#[tokio::test]
async fn should_fail_retryably_and_leave_no_status_when_push_fails() {
    let harness = Harness::default();
    harness.queue.fail_push.store(true, Ordering::SeqCst);
    let key = variant(ProductId(Uuid::now_v7()), "M", "Black");

    let result = harness
        .producer()
        .execute(checkout_input(Uuid::now_v7(), vec![line_item(&key, 1)]))
        .await;

    assert!(
        matches!(result, Err(CheckoutServiceError::QueueUnavailable(_))),
        "expected QueueUnavailable, got {result:?}"
    );
    assert_eq!(harness.queue.len(), 0);
    assert!(harness.statuses.records.lock().unwrap().is_empty());
    assert_eq!(harness.signal.count(), 0);
}
