mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::json;

use common::{body_json, TestApp};
use loopwear_api::entities::{boost, boost_product, spotlight_product};

#[tokio::test]
async fn boost_verification_activates_and_spotlights_products() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Boost Seller", true).await;
    let p1 = app.seed_product(seller.id, "Vintage Kimono", dec!(900)).await;
    let p2 = app.seed_product(seller.id, "Band Tee", dec!(250)).await;
    let token = app.token_for(seller.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/boosts",
            Some(json!({
                "plan_days": 7,
                "price": "199",
                "product_ids": [p1.id, p2.id],
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();
    assert!(transaction_id.starts_with("BST-"));

    // Nothing persisted until the payment verifies.
    assert!(boost::Entity::find()
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .is_empty());

    let verify = json!({
        "transaction_id": transaction_id,
        "plan_days": 7,
        "price": "199",
        "product_ids": [p1.id, p2.id],
    });
    let response = app
        .request(Method::POST, "/api/v1/boosts/verify", Some(verify.clone()), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["already_settled"], false);

    let boosts = boost::Entity::find().all(app.state.db.as_ref()).await.unwrap();
    assert_eq!(boosts.len(), 1);
    assert_eq!(boosts[0].plan_days, 7);

    let spotlight = spotlight_product::Entity::find()
        .order_by_asc(spotlight_product::Column::Position)
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(spotlight.len(), 2);
    assert_eq!(spotlight[0].product_id, p1.id);
    assert_eq!(spotlight[1].product_id, p2.id);

    // Replaying the verification changes nothing.
    let response = app
        .request(Method::POST, "/api/v1/boosts/verify", Some(verify), Some(&token))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["already_settled"], true);
    assert_eq!(
        boost::Entity::find().all(app.state.db.as_ref()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn boosting_a_spotlighted_product_moves_it_to_the_tail() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Spotlight Seller", true).await;
    let p1 = app.seed_product(seller.id, "Silk Saree", dec!(1200)).await;
    let p2 = app.seed_product(seller.id, "Linen Shirt", dec!(400)).await;
    let token = app.token_for(seller.id, "user");

    for ids in [vec![p1.id, p2.id], vec![p1.id]] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/boosts",
                Some(json!({ "plan_days": 3, "price": "99", "product_ids": ids.clone() })),
                Some(&token),
            )
            .await;
        let body = body_json(response).await;
        let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();
        let response = app
            .request(
                Method::POST,
                "/api/v1/boosts/verify",
                Some(json!({
                    "transaction_id": transaction_id,
                    "plan_days": 3,
                    "price": "99",
                    "product_ids": ids,
                })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let spotlight = spotlight_product::Entity::find()
        .order_by_asc(spotlight_product::Column::Position)
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    // p1 was re-boosted, so it moved behind p2.
    assert_eq!(spotlight.len(), 2);
    assert_eq!(spotlight[0].product_id, p2.id);
    assert_eq!(spotlight[1].product_id, p1.id);
}

#[tokio::test]
async fn only_own_unsold_listings_can_be_boosted() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Owner", true).await;
    let other = app.seed_user("Other", true).await;
    let foreign = app.seed_product(other.id, "Not Yours", dec!(100)).await;
    let token = app.token_for(seller.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/boosts",
            Some(json!({ "plan_days": 7, "price": "199", "product_ids": [foreign.id] })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.payment.initiated.lock().unwrap().is_empty());
}

#[tokio::test]
async fn expiry_sweep_removes_finished_boosts_and_their_spotlight() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Sweep Seller", true).await;
    let p1 = app.seed_product(seller.id, "Puffer Jacket", dec!(800)).await;
    let token = app.token_for(seller.id, "user");

    let response = app
        .request(
            Method::POST,
            "/api/v1/boosts",
            Some(json!({ "plan_days": 1, "price": "49", "product_ids": [p1.id] })),
            Some(&token),
        )
        .await;
    let body = body_json(response).await;
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();
    app.request(
        Method::POST,
        "/api/v1/boosts/verify",
        Some(json!({
            "transaction_id": transaction_id,
            "plan_days": 1,
            "price": "49",
            "product_ids": [p1.id],
        })),
        Some(&token),
    )
    .await;

    // Not yet expired; the sweep leaves it alone.
    assert_eq!(app.state.services.boosts.expire_boosts().await.unwrap(), 0);

    // Backdate the boost past its end.
    let row = boost::Entity::find()
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let mut active: boost::ActiveModel = row.into();
    active.ends_at = sea_orm::Set(Utc::now() - Duration::hours(1));
    sea_orm::ActiveModelTrait::update(active, app.state.db.as_ref())
        .await
        .unwrap();

    assert_eq!(app.state.services.boosts.expire_boosts().await.unwrap(), 1);
    assert!(boost::Entity::find().all(app.state.db.as_ref()).await.unwrap().is_empty());
    assert!(boost_product::Entity::find()
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .is_empty());
    assert!(spotlight_product::Entity::find()
        .filter(spotlight_product::Column::ProductId.eq(p1.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .is_empty());
}
