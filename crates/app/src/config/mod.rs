//! Configuration
//!
//! Settings come from CLI flags with environment fallbacks; a `.env` file is
//! loaded first when present.

use thiserror::Error;

use verdant::fixtures::FixtureError;

mod checkout;
mod gateway;
mod logging;

pub use checkout::CheckoutConfig;
pub use gateway::GatewayConfig;
pub use logging::{LogFormat, LoggingConfig};

/// Errors raised while turning parsed settings into runtime values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `COUPON_RATE` is not a percentage.
    #[error("invalid coupon rate: {0}")]
    CouponRate(#[from] FixtureError),

    /// `COUPON_CODE` is blank.
    #[error("coupon code cannot be empty")]
    EmptyCouponCode,

    /// `ORDER_SUBMIT_TIMEOUT_SECONDS` is zero.
    #[error("order submit timeout must be at least one second")]
    ZeroTimeout,
}
