//! Verdant
//!
//! Checkout orchestration for the Verdant patient storefront: derived order totals,
//! a reducer-style form store, pure per-step validation and the step sequencer that
//! gates submission of a finalized order.

pub mod addresses;
pub mod cart;
pub mod confirmation;
pub mod coupons;
pub mod fixtures;
pub mod order;
pub mod prelude;
pub mod pricing;
pub mod sequencer;
pub mod state;
pub mod uuids;
pub mod validation;
