pub mod address;
pub mod boost;
pub mod boost_product;
pub mod cart_item;
pub mod coupon;
pub mod notification;
pub mod order;
pub mod product;
pub mod settlement;
pub mod spotlight_product;
pub mod user;
pub mod wishlist_item;
