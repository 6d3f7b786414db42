mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;

use common::{body_json, TestApp};
use loopwear_api::entities::{cart_item, coupon, order, product, user};
use loopwear_api::gateways::SettlementStatus;

#[tokio::test]
async fn checkout_and_settlement_apply_all_effects() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Seller One", true).await;
    let buyer = app.seed_user("Buyer One", false).await;
    let address = app.seed_address(buyer.id).await;
    let listing = app.seed_product(seller.id, "Denim Jacket", dec!(499.50)).await;
    let token = app.token_for(buyer.id, "user");

    // The buyer checks out an item that is sitting in their cart.
    cart_item::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        user_id: Set(buyer.id),
        product_id: Set(listing.id),
        added_at: Set(chrono::Utc::now()),
    }
    .insert(app.state.db.as_ref())
    .await
    .expect("seed cart item");

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "499.50" }],
                "total_amount": "499.50",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();
    assert!(body["data"]["redirect_url"].as_str().unwrap().contains(&transaction_id));

    // One pending order per item, minor units forwarded to the gateway.
    let pending = order::Entity::find()
        .filter(order::Column::TransactionId.eq(transaction_id.clone()))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payment_status, order::PaymentStatus::Pending);
    assert_eq!(
        app.payment.initiated.lock().unwrap().as_slice(),
        &[(transaction_id.clone(), 49950)]
    );

    // Gateway redirect hits the unauthenticated verification endpoint.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/verify/{transaction_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["already_settled"], false);

    let settled = order::Entity::find_by_id(pending[0].id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.payment_status, order::PaymentStatus::Paid);
    assert_eq!(settled.payment_mode.as_deref(), Some("UPI"));
    assert_eq!(settled.shipment_id.as_deref(), Some(format!("SHIP-{}", settled.id).as_str()));

    let sold = product::Entity::find_by_id(listing.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(sold.sold_status);

    let seller_row = user::Entity::find_by_id(seller.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_row.balance, dec!(499.50));
    assert_eq!(seller_row.total_sold, 1);

    // Thank-you coupon for the buyer.
    let coupons = coupon::Entity::find()
        .filter(coupon::Column::AssignedTo.eq(buyer.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].discount_percent, 10);

    // The sold item vanished from the buyer's cart.
    let leftover = cart_item::Entity::find()
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert!(leftover.is_empty());

    assert_eq!(app.shipping.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn settlement_is_idempotent_across_repeat_verifications() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Seller Two", true).await;
    let buyer = app.seed_user("Buyer Two", false).await;
    let address = app.seed_address(buyer.id).await;
    let listing = app.seed_product(seller.id, "Wool Scarf", dec!(120)).await;
    let token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "120" }],
                "total_amount": "120",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    let body = body_json(response).await;
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();

    let first = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/verify/{transaction_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/verify/{transaction_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = body_json(second).await;
    assert_eq!(body["data"]["already_settled"], true);

    // Credited exactly once.
    let seller_row = user::Entity::find_by_id(seller.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_row.balance, dec!(120));
    assert_eq!(seller_row.total_sold, 1);

    let coupons = coupon::Entity::find()
        .filter(coupon::Column::AssignedTo.eq(buyer.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(coupons.len(), 1);
}

#[tokio::test]
async fn failed_gateway_initiation_writes_nothing() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Seller Three", true).await;
    let buyer = app.seed_user("Buyer Three", false).await;
    let address = app.seed_address(buyer.id).await;
    let listing = app.seed_product(seller.id, "Leather Belt", dec!(75)).await;
    let token = app.token_for(buyer.id, "user");

    app.payment.fail_next_initiation();
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "75" }],
                "total_amount": "75",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let orders = order::Entity::find().all(app.state.db.as_ref()).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn pending_gateway_status_applies_no_effects() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Seller Four", true).await;
    let buyer = app.seed_user("Buyer Four", false).await;
    let address = app.seed_address(buyer.id).await;
    let listing = app.seed_product(seller.id, "Canvas Tote", dec!(60)).await;
    let token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "60" }],
                "total_amount": "60",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    let body = body_json(response).await;
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();

    app.payment.set_status(SettlementStatus::Pending);
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/verify/{transaction_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "pending");

    let rows = order::Entity::find()
        .filter(order::Column::TransactionId.eq(transaction_id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(rows[0].payment_status, order::PaymentStatus::Pending);
}

#[tokio::test]
async fn blocked_or_unverified_buyers_are_rejected() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Seller Five", true).await;
    let buyer = app.seed_user("Buyer Five", false).await;
    let address = app.seed_address(buyer.id).await;
    let listing = app.seed_product(seller.id, "Silk Tie", dec!(45)).await;
    let token = app.token_for(buyer.id, "user");

    let mut active: user::ActiveModel = buyer.clone().into();
    active.blocked = Set(true);
    active.update(app.state.db.as_ref()).await.unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "45" }],
                "total_amount": "45",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut active: user::ActiveModel = buyer.into();
    active.blocked = Set(false);
    active.phone_verified = Set(false);
    active.update(app.state.db.as_ref()).await.unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "45" }],
                "total_amount": "45",
                "address_id": address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn address_must_belong_to_buyer() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Seller Six", true).await;
    let buyer = app.seed_user("Buyer Six", false).await;
    let stranger = app.seed_user("Stranger", false).await;
    let foreign_address = app.seed_address(stranger.id).await;
    let listing = app.seed_product(seller.id, "Corduroy Cap", dec!(30)).await;
    let token = app.token_for(buyer.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/checkout",
            Some(json!({
                "items": [{ "product_id": listing.id, "price": "30" }],
                "total_amount": "30",
                "address_id": foreign_address.id,
                "payment_mode": null,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.payment.initiated.lock().unwrap().is_empty());
}
