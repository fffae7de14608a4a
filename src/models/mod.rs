pub mod assignment;
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod courier;
pub mod customer;
pub mod order;
