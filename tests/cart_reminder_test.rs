mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use common::TestApp;
use loopwear_api::entities::{cart_item, notification};

#[tokio::test]
async fn stale_cart_items_trigger_one_reminder() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Cart Seller", true).await;
    let shopper = app.seed_user("Cart Shopper", false).await;
    let listing = app.seed_product(seller.id, "Pleated Skirt", dec!(150)).await;

    cart_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(shopper.id),
        product_id: Set(listing.id),
        added_at: Set(Utc::now() - Duration::days(5)),
    }
    .insert(app.state.db.as_ref())
    .await
    .unwrap();

    assert_eq!(app.state.services.carts.remind_stale_carts().await.unwrap(), 1);

    let reminders = notification::Entity::find()
        .filter(notification::Column::UserId.eq(shopper.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(app.email.sent.lock().unwrap().len(), 1);

    // An unread reminder suppresses the next sweep's nudge.
    assert_eq!(app.state.services.carts.remind_stale_carts().await.unwrap(), 0);
    let reminders = notification::Entity::find()
        .filter(notification::Column::UserId.eq(shopper.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(reminders.len(), 1);
}

#[tokio::test]
async fn fresh_cart_items_are_left_alone() {
    let app = TestApp::new().await;
    let seller = app.seed_user("Fresh Seller", true).await;
    let shopper = app.seed_user("Fresh Shopper", false).await;
    let listing = app.seed_product(seller.id, "Ankle Boots", dec!(600)).await;

    cart_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(shopper.id),
        product_id: Set(listing.id),
        added_at: Set(Utc::now()),
    }
    .insert(app.state.db.as_ref())
    .await
    .unwrap();

    assert_eq!(app.state.services.carts.remind_stale_carts().await.unwrap(), 0);
}
