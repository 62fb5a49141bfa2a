//! Verdant checkout application layer: the order gateway, the async checkout
//! session, configuration and logging.

pub mod config;
pub mod gateway;
pub mod observability;
pub mod session;
