mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::json;

use common::{body_json, TestApp};
use loopwear_api::entities::{order, product, user};
use loopwear_api::gateways::RefundOutcome;

async fn settled_order(app: &TestApp) -> (user::Model, user::Model, product::Model, order::Model) {
    let seller = app.seed_user("Seller", true).await;
    let buyer = app.seed_user("Buyer", false).await;
    let address = app.seed_address(buyer.id).await;
    let listing = app.seed_product(seller.id, "Tweed Blazer", dec!(350)).await;
    let token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "350" }],
                "total_amount": "350",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    let body = body_json(response).await;
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();
    let order_id: uuid::Uuid =
        serde_json::from_value(body["data"]["order_ids"][0].clone()).unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/verify/{transaction_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let row = order::Entity::find_by_id(order_id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    (buyer, seller, listing, row)
}

#[tokio::test]
async fn cancelling_a_paid_order_refunds_and_reverts_state() {
    let app = TestApp::new().await;
    let (buyer, seller, listing, row) = settled_order(&app).await;
    let token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/cancel", row.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The booked shipment was recalled and the payment refunded in minor units.
    assert_eq!(
        app.shipping.cancelled.lock().unwrap().as_slice(),
        &[format!("SHIP-{}", row.id)]
    );
    assert_eq!(
        app.payment.refunds.lock().unwrap().as_slice(),
        &[(row.transaction_id.clone(), 35000)]
    );

    let cancelled = order::Entity::find_by_id(row.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.payment_status, order::PaymentStatus::Canceled);
    assert_eq!(cancelled.delivery_status, order::DeliveryStatus::Cancelled);

    let listing_row = product::Entity::find_by_id(listing.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(!listing_row.sold_status);

    let seller_row = user::Entity::find_by_id(seller.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_row.balance, dec!(0));
    assert_eq!(seller_row.total_sold, 0);
}

#[tokio::test]
async fn repeated_cancellation_refunds_only_once() {
    let app = TestApp::new().await;
    let (buyer, seller, _listing, row) = settled_order(&app).await;
    let token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/cancel", row.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/cancel", row.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // One refund, one debit. The replay must not push the seller negative.
    assert_eq!(app.payment.refunds.lock().unwrap().len(), 1);
    let seller_row = user::Entity::find_by_id(seller.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_row.balance, dec!(0));
    assert_eq!(seller_row.total_sold, 0);
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let app = TestApp::new().await;
    let (buyer, seller, _listing, row) = settled_order(&app).await;
    let seller_token = app.token_for(seller.id, "user");
    let buyer_token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/delivery-status", row.id),
            Some(json!({ "status": "shipped" })),
            Some(&seller_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/cancel", row.id),
            None,
            Some(&buyer_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.payment.refunds.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_refund_aborts_the_cancellation() {
    let app = TestApp::new().await;
    let (buyer, seller, _listing, row) = settled_order(&app).await;
    let token = app.token_for(buyer.id, "user");

    app.payment.set_refund_outcome(RefundOutcome::Rejected);
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/cancel", row.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    // Nothing reverted.
    let unchanged = order::Entity::find_by_id(row.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.payment_status, order::PaymentStatus::Paid);
    let seller_row = user::Entity::find_by_id(seller.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_row.balance, dec!(350));
}

#[tokio::test]
async fn only_the_buyer_may_cancel() {
    let app = TestApp::new().await;
    let (_buyer, seller, _listing, row) = settled_order(&app).await;
    let seller_token = app.token_for(seller.id, "user");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/cancel", row.id),
            None,
            Some(&seller_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delivery_status_follows_the_state_machine() {
    let app = TestApp::new().await;
    let (_buyer, seller, _listing, row) = settled_order(&app).await;
    let token = app.token_for(seller.id, "user");

    // pending -> delivered skips shipped and is rejected.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/delivery-status", row.id),
            Some(json!({ "status": "delivered" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for step in ["shipped", "delivered"] {
        let response = app
            .request(
                Method::PUT,
                &format!("/api/v1/orders/{}/delivery-status", row.id),
                Some(json!({ "status": step })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // delivered is terminal.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/delivery-status", row.id),
            Some(json!({ "status": "shipped" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
