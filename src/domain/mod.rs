//! Storefront rules that do not touch the database: catalog filtering and
//! sorting, the cart aggregate and the order/payment state machines.

pub mod cart;
pub mod catalog;
pub mod status;
