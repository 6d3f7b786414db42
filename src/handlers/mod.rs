pub mod boosts;
pub mod carts;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod payments;
